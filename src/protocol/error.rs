use thiserror::Error;

/// A request the worker refuses to act on. The current command is answered
/// with a failure response and the session keeps serving.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProtocolError {
    #[error("classify expects exactly one row, got {0}")]
    ClassifyCount(usize),

    #[error("'{0}' expects at least one row")]
    EmptyBatch(&'static str),

    #[error("row {row} has {found} features, schema has {expected}")]
    FeatureCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("message declares {count} rows but carries {rows} rows and {weights} weights")]
    MissingRows {
        count: usize,
        rows: usize,
        weights: usize,
    },

    #[error(
        "reweighting {count} instances from position {cursor} overruns dataset of {dataset_len}"
    )]
    ReweightOutOfRange {
        cursor: usize,
        count: usize,
        dataset_len: usize,
    },

    #[error("malformed message: {0}")]
    Malformed(String),
}
