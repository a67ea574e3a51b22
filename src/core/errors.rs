// src/core/errors.rs
use thiserror::Error;

/// Every failure aborts the whole evaluation; no variant carries a partial result.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Sample count and group size do not describe whole slides, or explicit
    /// slide ids disagree with the contiguous blocks.
    #[error("Invalid Partition: {0}")]
    InvalidPartition(String),
    /// Feature rows and info-table rows cannot be lined up.
    #[error("Index Alignment: {0}")]
    IndexAlignment(String),
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    /// Raised by a classifier, metrics or statistic collaborator. Passed through untouched.
    #[error("Upstream Failure: {0}")]
    Upstream(String),
    #[error("Internal Error: {0}")]
    InternalError(String),
    #[error("Ndarray Error: {0}")]
    NdarrayError(String),
    #[error("Config Error: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<ndarray::ShapeError> for EvalError {
    fn from(err: ndarray::ShapeError) -> Self {
        EvalError::NdarrayError(format!("ndarray ShapeError: {}", err))
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure_class() {
        let err = EvalError::InvalidPartition("21 rows, group size 5".to_string());
        assert_eq!(err.to_string(), "Invalid Partition: 21 rows, group size 5");

        let err = EvalError::IndexAlignment("row 40 missing".to_string());
        assert!(err.to_string().starts_with("Index Alignment"));
    }

    #[test]
    fn shape_errors_convert() {
        let shape_err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0; 3]).unwrap_err();
        let err: EvalError = shape_err.into();
        assert!(matches!(err, EvalError::NdarrayError(_)));
    }

    #[test]
    fn json_errors_convert() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: EvalError = json_err.into();
        assert!(matches!(err, EvalError::Config(_)));
    }
}
