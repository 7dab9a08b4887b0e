use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("model context has not been set")]
    ContextNotSet,

    #[error("instance has {found} values, model expects {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("instance #{position} has class value {value}, valid range is 0..{class_count}")]
    InvalidClassValue {
        position: usize,
        value: f64,
        class_count: usize,
    },

    #[error(
        "instance #{position} has value {value} for nominal attribute '{attribute}', valid range is 0..{domain}"
    )]
    InvalidNominalValue {
        position: usize,
        attribute: String,
        value: f64,
        domain: usize,
    },

    #[error("distribution has {found} entries, expected {expected}")]
    DistributionLength { expected: usize, found: usize },

    #[error("learner '{0}' cannot be persisted")]
    NotPersistable(&'static str),
}
