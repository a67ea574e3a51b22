// src/algorithms/metrics.rs

//! Reference [`ClassificationMetrics`]: argmax accuracy, balanced accuracy,
//! one-vs-rest AUROC and average precision, plus a per-class table.

use crate::core::{ClassStatsTable, EvalError, LabelEncoder, MetricReport, Result};
use crate::traits::ClassificationMetrics;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Column names of the per-class table, in order.
pub const STAT_COLUMNS: [&str; 5] = ["AUROC", "AP", "Precision", "Recall", "F1"];

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMetrics;

/// Index of the largest score; the first one wins ties.
fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

/// Groups of positions (into `order`) that share the same score.
fn tied_runs(scores: ArrayView1<f64>, order: &[usize]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        runs.push((start, end));
        start = end;
    }
    runs
}

/// Area under the ROC curve via the rank-sum statistic, ties sharing their mean rank.
/// `None` when one side has no samples.
pub fn roc_auc(scores: ArrayView1<f64>, positive: &[bool]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..positive.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut pos_rank_sum = 0.0;
    for (start, end) in tied_runs(scores, &order) {
        // 1-based ranks start+1 ..= end share their mean.
        let mean_rank = (start + end + 1) as f64 / 2.0;
        let pos_in_run = order[start..end].iter().filter(|&&i| positive[i]).count();
        pos_rank_sum += mean_rank * pos_in_run as f64;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Step-wise average precision: sum over thresholds of (recall gain) x precision.
/// `None` without positives.
pub fn average_precision(scores: ArrayView1<f64>, positive: &[bool]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    if n_pos == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..positive.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut prev_recall = 0.0;
    let mut ap = 0.0;
    for (start, end) in tied_runs(scores, &order) {
        for &i in &order[start..end] {
            if positive[i] {
                tp += 1;
            } else {
                fp += 1;
            }
        }
        let precision = tp as f64 / (tp + fp) as f64;
        let recall = tp as f64 / n_pos as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    Some(ap)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationMetrics for StandardMetrics {
    fn compute(
        &self,
        labels: &[usize],
        predictions: ArrayView2<f64>,
        class_order: &[String],
        encoder: &LabelEncoder,
    ) -> Result<MetricReport> {
        let n_classes = encoder.n_classes();
        if labels.is_empty() {
            return Err(EvalError::InvalidInput("No labels to score.".to_string()));
        }
        if predictions.dim() != (labels.len(), n_classes) {
            return Err(EvalError::IndexAlignment(format!(
                "Predictions are {:?}, expected ({}, {}).",
                predictions.dim(),
                labels.len(),
                n_classes
            )));
        }

        let predicted: Vec<usize> = predictions.rows().into_iter().map(argmax).collect();

        let mut auroc = vec![0.0; n_classes];
        let mut ap = vec![0.0; n_classes];
        let mut precision = vec![0.0; n_classes];
        let mut recall = vec![0.0; n_classes];
        let mut support = vec![0usize; n_classes];

        for class in 0..n_classes {
            let positive: Vec<bool> = labels.iter().map(|&l| l == class).collect();
            let scores = predictions.column(class);
            let name = encoder.name_of(class).unwrap_or("?");

            auroc[class] = roc_auc(scores, &positive).ok_or_else(|| {
                EvalError::InvalidInput(format!(
                    "AUROC is undefined for class '{}': it needs positive and negative samples.",
                    name
                ))
            })?;
            ap[class] = average_precision(scores, &positive).ok_or_else(|| {
                EvalError::InvalidInput(format!("Class '{}' has no samples.", name))
            })?;

            let tp = labels
                .iter()
                .zip(predicted.iter())
                .filter(|(&l, &p)| l == class && p == class)
                .count();
            let predicted_as = predicted.iter().filter(|&&p| p == class).count();
            support[class] = positive.iter().filter(|&&p| p).count();
            precision[class] = ratio(tp, predicted_as);
            recall[class] = ratio(tp, support[class]);
        }

        let correct = labels
            .iter()
            .zip(predicted.iter())
            .filter(|(l, p)| l == p)
            .count();
        let accuracy = ratio(correct, labels.len());
        let present: Vec<usize> = (0..n_classes).filter(|&c| support[c] > 0).collect();
        let balanced_accuracy =
            present.iter().map(|&c| recall[c]).sum::<f64>() / present.len() as f64;
        let macro_auroc = auroc.iter().sum::<f64>() / n_classes as f64;
        let map = ap.iter().sum::<f64>() / n_classes as f64;

        let mut values = Array2::<f64>::zeros((class_order.len(), STAT_COLUMNS.len()));
        for (row, name) in class_order.iter().enumerate() {
            let c = encoder.id_of(name).ok_or_else(|| {
                EvalError::InvalidInput(format!(
                    "Reporting class '{}' does not occur in the labels.",
                    name
                ))
            })?;
            let f1 = if precision[c] + recall[c] > 0.0 {
                2.0 * precision[c] * recall[c] / (precision[c] + recall[c])
            } else {
                0.0
            };
            for (col, v) in [auroc[c], ap[c], precision[c], recall[c], f1].into_iter().enumerate() {
                values[[row, col]] = v;
            }
        }

        let stats = ClassStatsTable::new(
            class_order.to_vec(),
            STAT_COLUMNS.iter().map(|s| s.to_string()).collect(),
            values,
        )?;

        Ok(MetricReport {
            stats,
            accuracy,
            balanced_accuracy,
            auroc: macro_auroc,
            map,
        })
    }
}
