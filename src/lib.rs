pub mod classifiers;
pub mod core;
pub mod dispatcher;
pub mod protocol;
pub mod session;
pub mod streams;
pub mod transport;
pub mod ui;
pub mod utils;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
