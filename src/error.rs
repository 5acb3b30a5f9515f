use thiserror::Error;

pub type Result<T> = std::result::Result<T, BayesError>;

/// Errors surfaced by training, prediction, scoring and dataset loading.
#[derive(Error, Debug)]
pub enum BayesError {
    #[error("cannot fit a model on an empty dataset")]
    EmptyDataset,

    #[error("variance floor must be positive, got {0}")]
    InvalidVarFloor(f64),

    /// A row (or label array) disagrees with the established width.
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("dataset has {rows} rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}, column {column}: invalid feature value {value:?}")]
    InvalidFeature {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("line {line}: invalid integer label {value:?}")]
    InvalidLabel { line: u64, value: String },

    #[error("line {line}: record has no label column")]
    MissingLabel { line: u64 },
}
