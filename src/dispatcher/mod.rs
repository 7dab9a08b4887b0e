//! The command loop: one request in, its effects applied, one response out.

#[allow(clippy::module_inception)]
mod dispatcher;
mod error;

pub use dispatcher::{Dispatcher, DispatcherState};
pub use error::FatalError;
