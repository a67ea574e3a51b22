// src/algorithms/logistic.rs

use crate::core::{EvalError, JsonConfig, PredictionMatrix, Result};
use crate::traits::ProbabilisticClassifier;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for [`SoftmaxRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftmaxConfig {
    /// Inverse regularisation strength, as in `1 / C`.
    pub l2_penalty: f64,
    /// Fraction of the safe step `1 / L` taken per iteration.
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the largest gradient entry falls below this.
    pub tol: f64,
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        SoftmaxConfig {
            l2_penalty: 1.0,
            learning_rate: 1.0,
            max_iter: 1000,
            tol: 1e-6,
        }
    }
}

impl JsonConfig for SoftmaxConfig {}

/// Multinomial logistic regression with an L2 penalty, fit by full-batch
/// gradient descent. The default per-fold classifier.
#[derive(Debug, Clone)]
pub struct SoftmaxRegression {
    config: SoftmaxConfig,
    weights: Option<Array2<f64>>,
    bias: Array1<f64>,
}

impl SoftmaxRegression {
    pub fn new(config: Option<SoftmaxConfig>) -> Self {
        SoftmaxRegression {
            config: config.unwrap_or_default(),
            weights: None,
            bias: Array1::zeros(0),
        }
    }

    pub fn config(&self) -> &SoftmaxConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }

    fn logits(&self, features: ArrayView2<f64>, weights: &Array2<f64>) -> Array2<f64> {
        features.dot(weights) + &self.bias
    }
}

impl Default for SoftmaxRegression {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Row-wise softmax, shifted by the row max for stability.
fn softmax_rows(mut logits: Array2<f64>) -> Array2<f64> {
    for mut row in logits.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    logits
}

impl ProbabilisticClassifier for SoftmaxRegression {
    fn fit(&mut self, features: ArrayView2<f64>, labels: &[usize], n_classes: usize) -> Result<()> {
        let (n_samples, n_features) = features.dim();
        if n_samples == 0 {
            return Err(EvalError::InvalidInput(
                "Cannot fit on an empty training set.".to_string(),
            ));
        }
        if labels.len() != n_samples {
            return Err(EvalError::InvalidInput(format!(
                "{} training rows but {} labels.",
                n_samples,
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(EvalError::InvalidInput(format!(
                "Label {} is out of range for {} classes.",
                bad, n_classes
            )));
        }

        let mut targets = Array2::<f64>::zeros((n_samples, n_classes));
        for (i, &label) in labels.iter().enumerate() {
            targets[[i, label]] = 1.0;
        }

        let inv_n = 1.0 / n_samples as f64;
        let penalty = self.config.l2_penalty * inv_n;
        // Curvature bound: the softmax Hessian is below 1/2 * mean(|x|^2 + 1) plus the penalty.
        let mean_sq_norm = features.iter().map(|v| v * v).sum::<f64>() * inv_n;
        let lipschitz = 0.5 * (mean_sq_norm + 1.0) + penalty;
        let step = self.config.learning_rate / lipschitz;

        let mut weights = Array2::<f64>::zeros((n_features, n_classes));
        self.bias = Array1::zeros(n_classes);

        for iter in 0..self.config.max_iter {
            let probs = softmax_rows(self.logits(features, &weights));
            let residual = probs - &targets;
            let grad_w = features.t().dot(&residual) * inv_n + &weights * penalty;
            let grad_b = residual.sum_axis(Axis(0)) * inv_n;

            let max_grad = grad_w
                .iter()
                .chain(grad_b.iter())
                .fold(0.0_f64, |m, g| m.max(g.abs()));
            if !max_grad.is_finite() {
                return Err(EvalError::Upstream(format!(
                    "Softmax regression diverged at iteration {}.",
                    iter
                )));
            }
            if max_grad < self.config.tol {
                log::trace!("softmax regression converged after {} iterations", iter);
                break;
            }
            weights.scaled_add(-step, &grad_w);
            self.bias.scaled_add(-step, &grad_b);
        }

        self.weights = Some(weights);
        Ok(())
    }

    fn predict_proba(&self, features: ArrayView2<f64>) -> Result<PredictionMatrix> {
        let weights = self.weights.as_ref().ok_or_else(|| {
            EvalError::InvalidInput("Classifier must be fit before predicting.".to_string())
        })?;
        if features.ncols() != weights.nrows() {
            return Err(EvalError::InvalidInput(format!(
                "Classifier was fit on {} features, got {}.",
                weights.nrows(),
                features.ncols()
            )));
        }
        Ok(softmax_rows(self.logits(features, weights)))
    }
}
