// src/algorithms/ensemble.rs

use crate::algorithms::grouping::{GroupedSplitter, GroupingPolicy};
use crate::algorithms::metrics::StandardMetrics;
use crate::core::{
    ClassStatsTable, EnsembleReport, EvalError, FeatureMatrix, InfoTable, JsonConfig,
    LabelEncoder, MetricReport, PredictionMatrix, Result, CANONICAL_TARGETS,
};
use crate::traits::{ClassificationMetrics, ClassifierFactory, ProbabilisticClassifier};
use ndarray::{concatenate, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for the [`EnsembleEvaluator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Consecutive rows per slide (`coef`).
    pub group_size: usize,
    /// Row order of the reported per-class table.
    pub class_order: Vec<String>,
    /// Also average the prediction matrices, for heatmap rendering.
    pub keep_predictions: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            group_size: crate::algorithms::grouping::DEFAULT_GROUP_SIZE,
            class_order: CANONICAL_TARGETS.iter().map(|s| s.to_string()).collect(),
            keep_predictions: false,
        }
    }
}

impl JsonConfig for EvaluationConfig {}

/// Running mean over ensemble members.
///
/// Started from the first member, every member (the first included) enters
/// with weight `1 / n_model`. A report only comes out of [`finish`](Self::finish)
/// once exactly `n_model` members went in.
#[derive(Debug, Clone)]
pub struct EnsembleAggregate {
    n_model: usize,
    folded: usize,
    stats: ClassStatsTable,
    scalars: [f64; 4],
    predictions: Option<PredictionMatrix>,
}

impl EnsembleAggregate {
    pub fn start(
        n_model: usize,
        first: &MetricReport,
        predictions: Option<&PredictionMatrix>,
    ) -> Result<Self> {
        if n_model == 0 {
            return Err(EvalError::InvalidInput(
                "An ensemble needs at least one member.".to_string(),
            ));
        }
        let w = 1.0 / n_model as f64;
        let mut stats = first.stats.clone();
        stats.values.mapv_inplace(|v| v * w);
        Ok(EnsembleAggregate {
            n_model,
            folded: 1,
            stats,
            scalars: Self::scalars_of(first).map(|v| v * w),
            predictions: predictions.map(|p| p * w),
        })
    }

    fn scalars_of(report: &MetricReport) -> [f64; 4] {
        [
            report.accuracy,
            report.balanced_accuracy,
            report.auroc,
            report.map,
        ]
    }

    fn weight(&self) -> f64 {
        1.0 / self.n_model as f64
    }

    pub fn fold_in(&mut self, report: &MetricReport, predictions: Option<&PredictionMatrix>) -> Result<()> {
        if self.folded >= self.n_model {
            return Err(EvalError::InternalError(format!(
                "Ensemble of {} already complete.",
                self.n_model
            )));
        }
        let w = self.weight();
        self.stats.scaled_add(w, &report.stats)?;
        for (acc, v) in self.scalars.iter_mut().zip(Self::scalars_of(report)) {
            *acc += v * w;
        }
        match (self.predictions.as_mut(), predictions) {
            (Some(acc), Some(p)) => {
                if acc.dim() != p.dim() {
                    return Err(EvalError::IndexAlignment(format!(
                        "Prediction matrix {:?} does not match the ensemble's {:?}.",
                        p.dim(),
                        acc.dim()
                    )));
                }
                acc.scaled_add(w, p);
            }
            (None, None) => {}
            _ => {
                return Err(EvalError::InternalError(
                    "Predictions must be kept for every member or for none.".to_string(),
                ))
            }
        }
        self.folded += 1;
        Ok(())
    }

    pub fn finish(self, classes: Vec<String>) -> Result<EnsembleReport> {
        if self.folded != self.n_model {
            return Err(EvalError::InternalError(format!(
                "Ensemble finished after {} of {} members.",
                self.folded, self.n_model
            )));
        }
        let [accuracy, balanced_accuracy, auroc, map] = self.scalars;
        Ok(EnsembleReport {
            class_stats: self.stats,
            accuracy,
            balanced_accuracy,
            auroc,
            map,
            n_models: self.n_model,
            classes,
            predictions: self.predictions,
        })
    }
}

/// Leave-one-slide-out evaluation of an ensemble of feature matrices.
#[derive(Debug)]
pub struct EnsembleEvaluator<F: ClassifierFactory, M: ClassificationMetrics = StandardMetrics> {
    factory: F,
    metrics: M,
    config: EvaluationConfig,
}

impl<F: ClassifierFactory> EnsembleEvaluator<F, StandardMetrics> {
    pub fn new(factory: F, config: Option<EvaluationConfig>) -> Self {
        Self::with_metrics(factory, StandardMetrics, config)
    }
}

impl<F: ClassifierFactory, M: ClassificationMetrics> EnsembleEvaluator<F, M> {
    pub fn with_metrics(factory: F, metrics: M, config: Option<EvaluationConfig>) -> Self {
        EnsembleEvaluator {
            factory,
            metrics,
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Cross-validate every member and average the results.
    ///
    /// All input checks run before the first classifier is trained; any
    /// failure afterwards, including collaborator errors, aborts the whole
    /// evaluation without a partial result.
    pub fn evaluate(&self, members: &[FeatureMatrix], info: &InfoTable) -> Result<EnsembleReport> {
        if members.is_empty() {
            return Err(EvalError::InvalidInput(
                "No feature matrices to evaluate.".to_string(),
            ));
        }
        if info.is_empty() {
            return Err(EvalError::InvalidInput("Info table is empty.".to_string()));
        }

        let encoder = LabelEncoder::fit(info.compound_names());
        if encoder.n_classes() < 2 {
            return Err(EvalError::InvalidInput(format!(
                "Need at least two compounds, found {:?}.",
                encoder.classes()
            )));
        }
        let labels = encoder.transform(info.compound_names())?;
        if let Some(missing) = self.config.class_order.iter().find(|c| encoder.id_of(c).is_none()) {
            return Err(EvalError::InvalidInput(format!(
                "Reporting class '{}' does not occur in the info table {:?}.",
                missing,
                encoder.classes()
            )));
        }

        let policy = GroupingPolicy::new(self.config.group_size)?;
        let splitter = policy.splitter(info.len())?;
        if splitter.n_folds() < 2 {
            return Err(EvalError::InvalidPartition(format!(
                "{} rows in blocks of {} leave a single slide; nothing to train on.",
                info.len(),
                self.config.group_size
            )));
        }
        policy.check_slide_ids(info)?;
        check_alignment(members, info)?;

        let n_model = members.len();
        let mut aggregate: Option<EnsembleAggregate> = None;
        for (m, member) in members.iter().enumerate() {
            let x = member.select(Axis(0), info.indices());
            let predictions = self.cross_val_predict(x.view(), &labels, encoder.n_classes(), &splitter)?;
            let report =
                self.metrics
                    .compute(&labels, predictions.view(), &self.config.class_order, &encoder)?;
            log::info!(
                "member {}/{}: acc={:.4} ba={:.4} auroc={:.4} map={:.4}",
                m + 1,
                n_model,
                report.accuracy,
                report.balanced_accuracy,
                report.auroc,
                report.map
            );

            let kept = self.config.keep_predictions.then_some(&predictions);
            match aggregate.as_mut() {
                None => aggregate = Some(EnsembleAggregate::start(n_model, &report, kept)?),
                Some(acc) => acc.fold_in(&report, kept)?,
            }
        }

        let aggregate = aggregate
            .ok_or_else(|| EvalError::InternalError("No ensemble member was folded in.".to_string()))?;
        aggregate.finish(encoder.classes().to_vec())
    }

    /// Out-of-fold class probabilities, one fresh classifier per held-out slide,
    /// stacked in fold order (which is row order).
    fn cross_val_predict(
        &self,
        x: ArrayView2<f64>,
        labels: &[usize],
        n_classes: usize,
        splitter: &GroupedSplitter,
    ) -> Result<PredictionMatrix> {
        let mut blocks: Vec<PredictionMatrix> = Vec::with_capacity(splitter.n_folds());
        for fold in splitter.folds() {
            let train_x = x.select(Axis(0), &fold.train);
            let train_y: Vec<usize> = fold.train.iter().map(|&i| labels[i]).collect();
            let test_x = x.slice(ndarray::s![fold.test.clone(), ..]);

            let mut model = self.factory.build();
            model.fit(train_x.view(), &train_y, n_classes)?;
            let proba = model.predict_proba(test_x)?;
            if proba.dim() != (fold.test.len(), n_classes) {
                return Err(EvalError::Upstream(format!(
                    "Classifier returned {:?} for fold {}, expected ({}, {}).",
                    proba.dim(),
                    fold.index,
                    fold.test.len(),
                    n_classes
                )));
            }
            log::debug!("fold {}: trained on {} rows, scored rows {:?}", fold.index, fold.train.len(), fold.test);
            blocks.push(proba);
        }
        let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
        Ok(concatenate(Axis(0), &views)?)
    }
}

/// Every member has the same number of rows, and that is enough rows for every
/// index the info table refers to.
fn check_alignment(members: &[FeatureMatrix], info: &InfoTable) -> Result<()> {
    let n_rows = members[0].nrows();
    if let Some((m, other)) = members.iter().enumerate().find(|(_, x)| x.nrows() != n_rows) {
        return Err(EvalError::IndexAlignment(format!(
            "Member {} has {} rows but member 0 has {}.",
            m,
            other.nrows(),
            n_rows
        )));
    }
    if let Some(max) = info.max_index() {
        if max >= n_rows {
            return Err(EvalError::IndexAlignment(format!(
                "Info table refers to feature row {} but members only have {} rows.",
                max, n_rows
            )));
        }
    }
    Ok(())
}
