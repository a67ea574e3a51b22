// src/lib.rs

//! `slide_eval` scores patch-level feature representations of whole-slide images.
//!
//! Two questions, both asked per ensemble of independently extracted feature
//! matrices:
//!
//! - How well does a linear classifier predict the compound of a held-out
//!   slide? Leave-one-slide-out cross-validation over contiguous blocks of
//!   patches, averaged over the ensemble ([`EnsembleEvaluator`]).
//! - How well do compounds separate in feature space? A pseudo-F score per
//!   member, optionally against a seeded row-permutation baseline
//!   ([`ClusterScorer`]).

// Declare the main modules of the crate
pub mod algorithms;
pub mod core;
pub mod pipeline;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{
    ClusterConfig, ClusterScorer, EnsembleEvaluator, EvaluationConfig, GroupedSplitter,
    GroupingPolicy, PseudoF, SoftmaxRegression, StandardMetrics,
};
pub use crate::core::{
    ClusterScores, CompoundVocabulary, DatasetVariant, EnsembleReport, EvalError, FeatureMatrix,
    InfoTable, LabelEncoder, PredictionMatrix, Result,
};
pub use crate::traits::{
    ClassificationMetrics, ClassifierFactory, FeatureOptions, FeatureSet, FeatureSource,
    MetadataSource, ProbabilisticClassifier, SeparationStatistic,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{slide_blobs, BlobSpec};

    #[test]
    fn evaluator_and_scorer_share_inputs() -> Result<()> {
        let (x, info) = slide_blobs(&BlobSpec {
            compounds: vec!["vehicle".to_string(), "acetaminophen".to_string()],
            slides_per_compound: 2,
            patches_per_slide: 3,
            n_features: 2,
            separation: 10.0,
            spread: 0.5,
            seed: 3,
        })?;
        let members = vec![x];

        let report = EnsembleEvaluator::new(
            SoftmaxRegression::default,
            Some(EvaluationConfig {
                group_size: 3,
                class_order: vec!["vehicle".to_string(), "acetaminophen".to_string()],
                keep_predictions: false,
            }),
        )
        .evaluate(&members, &info)?;
        assert!(report.accuracy > 0.9);

        let scores = ClusterScorer::new(None).score(&members, &info)?;
        assert!(scores.scores[0] > 1.0);
        Ok(())
    }
}
