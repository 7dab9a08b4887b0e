//! The learning session: dataset, reweight cursor and the one classifier,
//! plus the model file format used by save and load.

pub mod persistence;
#[allow(clippy::module_inception)]
mod session;
mod staging;

pub use persistence::PersistenceError;
pub use session::{CursorMismatch, Session, TrainOutcome};
pub use staging::ClassificationStaging;
