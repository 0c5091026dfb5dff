use thiserror::Error;

/// Errors raised while reading and normalizing the source dataset.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(&'static str),

    #[error("Parse error at line {line}, column {column}: {reason} (value: {value:?})")]
    Parse {
        line: u64,
        column: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors raised while estimating a single ARIMA candidate.
///
/// These never escape [`crate::forecast::forecast`]; the forecaster turns them into a
/// skipped candidate or, when every candidate fails, a naive fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Singular regression matrix")]
    Singular,

    #[error("AR part is not stationary")]
    NonStationary,

    #[error("MA part is not invertible")]
    NonInvertible,

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}
