pub mod attribute_class_observers;
pub mod bayes;
pub mod classifier;
mod error;
pub mod rules;
mod snapshot;

pub use classifier::Classifier;
pub use error::ClassifierError;
pub use snapshot::LearnerSnapshot;
