// src/algorithms/pseudo_f.rs

use crate::core::{EvalError, Result};
use crate::traits::SeparationStatistic;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Pseudo-F (Calinski-Harabasz form):
///
/// `F = (SSB / (k - 1)) / (SSW / (N - k))`
///
/// where SSB is the size-weighted squared distance of group centroids from the
/// grand mean and SSW the squared distance of each row from its own centroid.
/// For Euclidean distances this is the same number as the distance-matrix
/// (PERMANOVA) pseudo-F, computed in O(N * D) instead of O(N^2 * D).
///
/// Zero within-group dispersion gives `+inf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PseudoF;

impl SeparationStatistic for PseudoF {
    fn statistic(&self, features: ArrayView2<f64>, groups: &[usize], n_groups: usize) -> Result<f64> {
        let (n_samples, n_features) = features.dim();
        if groups.len() != n_samples {
            return Err(EvalError::IndexAlignment(format!(
                "{} feature rows but {} group labels.",
                n_samples,
                groups.len()
            )));
        }
        if n_groups < 2 {
            return Err(EvalError::InvalidInput(
                "Pseudo-F needs at least two groups.".to_string(),
            ));
        }
        if n_samples <= n_groups {
            return Err(EvalError::InvalidInput(format!(
                "Pseudo-F needs more rows ({}) than groups ({}).",
                n_samples, n_groups
            )));
        }

        let mut sums = Array2::<f64>::zeros((n_groups, n_features));
        let mut counts = vec![0usize; n_groups];
        for (row, &g) in features.rows().into_iter().zip(groups.iter()) {
            if g >= n_groups {
                return Err(EvalError::InvalidInput(format!(
                    "Group id {} is out of range for {} groups.",
                    g, n_groups
                )));
            }
            let mut acc = sums.row_mut(g);
            acc += &row;
            counts[g] += 1;
        }
        if let Some(empty) = counts.iter().position(|&c| c == 0) {
            return Err(EvalError::InvalidInput(format!("Group {} has no rows.", empty)));
        }

        let grand_mean: Array1<f64> = features
            .mean_axis(Axis(0))
            .ok_or_else(|| EvalError::InternalError("Mean of empty feature matrix.".to_string()))?;
        let mut centroids = sums;
        for (mut c, &n) in centroids.rows_mut().into_iter().zip(counts.iter()) {
            c /= n as f64;
        }

        let ss_between: f64 = centroids
            .rows()
            .into_iter()
            .zip(counts.iter())
            .map(|(c, &n)| n as f64 * (&c - &grand_mean).mapv(|v| v * v).sum())
            .sum();
        let ss_within: f64 = features
            .rows()
            .into_iter()
            .zip(groups.iter())
            .map(|(row, &g)| (&row - &centroids.row(g)).mapv(|v| v * v).sum())
            .sum();

        let df_between = (n_groups - 1) as f64;
        let df_within = (n_samples - n_groups) as f64;
        if ss_within == 0.0 && ss_between == 0.0 {
            return Err(EvalError::InvalidInput(format!(
                "All {} rows coincide; separation is undefined.",
                n_samples
            )));
        }
        if ss_within == 0.0 {
            log::warn!("pseudo-F: zero within-group dispersion over {} rows", n_samples);
            return Ok(f64::INFINITY);
        }
        Ok((ss_between / df_between) / (ss_within / df_within))
    }
}
