// src/utils/preprocess.rs

use crate::core::{EvalError, FeatureMatrix, Result};
use ndarray::Axis;

/// Z-score every column (population standard deviation). Constant columns
/// are only centred.
pub fn standardize(x: &FeatureMatrix) -> Result<FeatureMatrix> {
    let mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| EvalError::InvalidInput("Cannot standardize an empty matrix.".to_string()))?;
    let std = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 0.0 { s } else { 1.0 });
    Ok((x - &mean) / &std)
}
