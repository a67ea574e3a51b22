// src/core/report.rs
use crate::core::{EvalError, PredictionMatrix, Result};
use ndarray::Array2;
use serde::Serialize;
use std::fmt;

/// Per-class statistics. Rows are classes in the caller's canonical order,
/// columns are named statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStatsTable {
    pub classes: Vec<String>,
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl ClassStatsTable {
    pub fn new(classes: Vec<String>, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (classes.len(), columns.len()) {
            return Err(EvalError::InvalidInput(format!(
                "Stats table is {:?} but has {} class labels and {} column labels.",
                values.dim(),
                classes.len(),
                columns.len()
            )));
        }
        Ok(ClassStatsTable {
            classes,
            columns,
            values,
        })
    }

    pub fn get(&self, class: &str, column: &str) -> Option<f64> {
        let row = self.classes.iter().position(|c| c == class)?;
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.values[[row, col]])
    }

    /// `self += other * weight`, refusing tables keyed differently.
    pub(crate) fn scaled_add(&mut self, weight: f64, other: &ClassStatsTable) -> Result<()> {
        if self.classes != other.classes || self.columns != other.columns {
            return Err(EvalError::IndexAlignment(
                "Ensemble members produced stats tables with different class or column keys."
                    .to_string(),
            ));
        }
        self.values.scaled_add(weight, &other.values);
        Ok(())
    }
}

/// What a metrics collaborator returns for one (labels, predictions) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub stats: ClassStatsTable,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub auroc: f64,
    pub map: f64,
}

/// Ensemble-averaged result of a leave-one-slide-out evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EnsembleReport {
    /// Mean per-class statistics over ensemble members.
    pub class_stats: ClassStatsTable,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub auroc: f64,
    pub map: f64,
    /// Number of members folded into the means.
    pub n_models: usize,
    /// Encoder classes, i.e. the column labels of `predictions`.
    pub classes: Vec<String>,
    /// Mean prediction matrix, kept only when requested.
    pub predictions: Option<PredictionMatrix>,
}

impl EnsembleReport {
    /// The four headline scalars in reporting order: accuracy, balanced accuracy, AUROC, mAP.
    pub fn scalars(&self) -> [f64; 4] {
        [self.accuracy, self.balanced_accuracy, self.auroc, self.map]
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for EnsembleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ensemble Evaluation ({} models):", self.n_models)?;
        writeln!(f, "  Accuracy:          {:.4}", self.accuracy)?;
        writeln!(f, "  Balanced Accuracy: {:.4}", self.balanced_accuracy)?;
        writeln!(f, "  AUROC:             {:.4}", self.auroc)?;
        writeln!(f, "  mAP:               {:.4}", self.map)?;
        writeln!(f, "  Per-class:")?;
        write!(f, "    {:<26}", "")?;
        for col in &self.class_stats.columns {
            write!(f, " {:>9}", col)?;
        }
        writeln!(f)?;
        for (class, row) in self.class_stats.classes.iter().zip(self.class_stats.values.rows()) {
            write!(f, "    {:<26}", class)?;
            for v in row.iter() {
                write!(f, " {:>9.4}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Pseudo-F scores, one per ensemble member. Never averaged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterScores {
    pub scores: Vec<f64>,
    /// Same statistic on row-permuted copies, when a baseline was requested.
    pub null_scores: Option<Vec<f64>>,
}

impl ClusterScores {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn table(values: Array2<f64>) -> ClassStatsTable {
        ClassStatsTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec!["AUROC".to_string(), "AP".to_string()],
            values,
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_name() {
        let t = table(array![[0.9, 0.8], [0.7, 0.6]]);
        assert_eq!(t.get("b", "AUROC"), Some(0.7));
        assert_eq!(t.get("c", "AUROC"), None);
        assert_eq!(t.get("a", "F1"), None);
    }

    #[test]
    fn shape_must_match_labels() {
        let err = ClassStatsTable::new(vec!["a".to_string()], vec![], array![[1.0]]).unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput(_)));
    }

    #[test]
    fn scaled_add_refuses_rekeyed_tables() {
        let mut t = table(array![[1.0, 1.0], [1.0, 1.0]]);
        let mut other = table(array![[1.0, 1.0], [1.0, 1.0]]);
        other.classes.reverse();
        assert!(matches!(
            t.scaled_add(0.5, &other),
            Err(EvalError::IndexAlignment(_))
        ));

        let other = table(array![[2.0, 4.0], [6.0, 8.0]]);
        t.scaled_add(0.5, &other).unwrap();
        assert_eq!(t.values, array![[2.0, 3.0], [4.0, 5.0]]);
    }

    #[test]
    fn report_serializes_and_displays() -> Result<()> {
        let report = EnsembleReport {
            class_stats: table(array![[0.9, 0.8], [0.7, 0.6]]),
            accuracy: 0.7,
            balanced_accuracy: 0.65,
            auroc: 0.8,
            map: 0.7,
            n_models: 2,
            classes: vec!["a".to_string(), "b".to_string()],
            predictions: None,
        };
        let json = report.to_json()?;
        assert!(json.contains("\"balanced_accuracy\": 0.65"));
        let text = report.to_string();
        assert!(text.contains("Ensemble Evaluation (2 models)"));
        assert!(text.contains("Accuracy:          0.7000"));
        Ok(())
    }
}
