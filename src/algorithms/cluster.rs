// src/algorithms/cluster.rs

use crate::algorithms::pseudo_f::PseudoF;
use crate::core::{
    ClusterScores, EvalError, FeatureMatrix, InfoTable, JsonConfig, LabelEncoder, Result,
    COMPOUND_COLUMN,
};
use crate::traits::SeparationStatistic;
use ndarray::Axis;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seed used by the reporting scripts for the permutation baseline.
pub const REPORTING_SEED: u64 = 24771;

/// Configuration for the [`ClusterScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Info-table column whose values define the groups.
    pub group_column: String,
    /// Also score a row-permuted copy of every member.
    pub permute_baseline: bool,
    /// Seed for the permutations. Without one, permutations differ run to run.
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            group_column: COMPOUND_COLUMN.to_string(),
            permute_baseline: false,
            seed: None,
        }
    }
}

impl JsonConfig for ClusterConfig {}

/// Scores how tightly each member's rows cluster by group.
#[derive(Debug, Clone)]
pub struct ClusterScorer<S: SeparationStatistic = PseudoF> {
    statistic: S,
    config: ClusterConfig,
}

impl ClusterScorer<PseudoF> {
    pub fn new(config: Option<ClusterConfig>) -> Self {
        Self::with_statistic(PseudoF, config)
    }
}

impl<S: SeparationStatistic> ClusterScorer<S> {
    pub fn with_statistic(statistic: S, config: Option<ClusterConfig>) -> Self {
        ClusterScorer {
            statistic,
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// One score per member, in member order, plus the permuted-copy scores
    /// when the baseline is on. Rows line up with the info table by position.
    pub fn score(&self, members: &[FeatureMatrix], info: &InfoTable) -> Result<ClusterScores> {
        if members.is_empty() {
            return Err(EvalError::InvalidInput("No feature matrices to score.".to_string()));
        }
        if info.is_empty() {
            return Err(EvalError::InvalidInput("Info table is empty.".to_string()));
        }
        let column = info.column(&self.config.group_column).ok_or_else(|| {
            EvalError::InvalidInput(format!(
                "Info table has no column '{}'.",
                self.config.group_column
            ))
        })?;
        let encoder = LabelEncoder::fit(column);
        if encoder.n_classes() < 2 {
            return Err(EvalError::InvalidInput(format!(
                "Column '{}' holds a single group; separation is undefined.",
                self.config.group_column
            )));
        }
        let groups = encoder.transform(column)?;
        if let Some((m, x)) = members.iter().enumerate().find(|(_, x)| x.nrows() != info.len()) {
            return Err(EvalError::IndexAlignment(format!(
                "Member {} has {} rows, info table has {}.",
                m,
                x.nrows(),
                info.len()
            )));
        }

        let mut scores = Vec::with_capacity(members.len());
        for (m, x) in members.iter().enumerate() {
            let f = self.statistic.statistic(x.view(), &groups, encoder.n_classes())?;
            log::info!("member {}/{}: pseudo-F={:.4}", m + 1, members.len(), f);
            scores.push(f);
        }

        let null_scores = if self.config.permute_baseline {
            let mut nulls = Vec::with_capacity(members.len());
            for (m, x) in members.iter().enumerate() {
                // Fresh generator per member: a member's null depends on its rows and the seed only.
                let mut rng = match self.config.seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                    None => ChaCha8Rng::from_entropy(),
                };
                let mut order: Vec<usize> = (0..x.nrows()).collect();
                order.shuffle(&mut rng);
                let permuted = x.select(Axis(0), &order);
                let f = self.statistic.statistic(permuted.view(), &groups, encoder.n_classes())?;
                log::info!("member {}/{}: permuted pseudo-F={:.4}", m + 1, members.len(), f);
                nulls.push(f);
            }
            Some(nulls)
        } else {
            None
        };

        Ok(ClusterScores {
            scores,
            null_scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::synthetic::{slide_blobs, BlobSpec};
    use approx::assert_relative_eq;

    fn baseline(seed: Option<u64>) -> Option<ClusterConfig> {
        Some(ClusterConfig {
            permute_baseline: true,
            seed,
            ..ClusterConfig::default()
        })
    }

    fn blobs(seed: u64) -> (FeatureMatrix, InfoTable) {
        slide_blobs(&BlobSpec {
            compounds: vec!["vehicle".to_string(), "bromobenzene".to_string()],
            slides_per_compound: 3,
            patches_per_slide: 5,
            n_features: 4,
            separation: 6.0,
            spread: 1.0,
            seed,
        })
        .unwrap()
    }

    #[test]
    fn separated_clusters_beat_their_permutation() -> Result<()> {
        let (x, info) = blobs(1);
        let out = ClusterScorer::new(baseline(Some(REPORTING_SEED))).score(&[x], &info)?;
        let nulls = out.null_scores.unwrap();
        assert_eq!(out.scores.len(), 1);
        assert!(out.scores[0] > 3.0 * nulls[0], "{} vs {}", out.scores[0], nulls[0]);
        Ok(())
    }

    #[test]
    fn seeded_baseline_is_reproducible() -> Result<()> {
        let (a, info) = blobs(2);
        let (b, _) = blobs(3);
        let scorer = ClusterScorer::new(baseline(Some(7)));
        let first = scorer.score(&[a.clone(), b.clone()], &info)?;
        let second = scorer.score(&[a, b], &info)?;
        assert_eq!(first, second);
        assert_eq!(first.null_scores.as_ref().map(|n| n.len()), Some(2));
        Ok(())
    }

    #[test]
    fn members_are_scored_independently() -> Result<()> {
        let (a, info) = blobs(4);
        let (b, _) = blobs(5);
        let scorer = ClusterScorer::new(None);
        let both = scorer.score(&[a.clone(), b.clone()], &info)?;
        let only_b = scorer.score(&[b], &info)?;
        assert!(both.null_scores.is_none());
        assert_relative_eq!(both.scores[1], only_b.scores[0]);
        Ok(())
    }

    #[test]
    fn null_score_ignores_other_members() -> Result<()> {
        let (a, info) = blobs(9);
        let (b, _) = blobs(10);
        let scorer = ClusterScorer::new(baseline(Some(REPORTING_SEED)));
        let pair = scorer.score(&[a.clone(), b.clone()], &info)?;
        let alone = scorer.score(&[b.clone()], &info)?;
        let swapped = scorer.score(&[b, a], &info)?;

        let pair_nulls = pair.null_scores.unwrap();
        assert_eq!(pair_nulls[1], alone.null_scores.unwrap()[0]);
        assert_eq!(pair_nulls[0], swapped.null_scores.unwrap()[1]);
        Ok(())
    }

    #[test]
    fn scores_other_columns() -> Result<()> {
        let (x, info) = blobs(6);
        let slides: Vec<String> = (0..info.len()).map(|i| format!("s{}", i / 5)).collect();
        let info = info.with_column("SLIDE", slides)?;
        let scorer = ClusterScorer::new(Some(ClusterConfig {
            group_column: "SLIDE".to_string(),
            ..ClusterConfig::default()
        }));
        let out = scorer.score(&[x], &info)?;
        assert!(out.scores[0].is_finite());
        Ok(())
    }

    #[test]
    fn degenerate_inputs_fail() {
        let (x, info) = blobs(8);
        let scorer = ClusterScorer::new(None);

        let single = InfoTable::sequential(vec!["vehicle".to_string(); info.len()]);
        assert!(matches!(scorer.score(&[x.clone()], &single), Err(EvalError::InvalidInput(_))));
        assert!(matches!(scorer.score(&[], &info), Err(EvalError::InvalidInput(_))));

        let short = x.slice(ndarray::s![1.., ..]).to_owned();
        assert!(matches!(scorer.score(&[short], &info), Err(EvalError::IndexAlignment(_))));

        let missing = ClusterScorer::new(Some(ClusterConfig {
            group_column: "DOSE".to_string(),
            ..ClusterConfig::default()
        }));
        assert!(matches!(missing.score(&[x], &info), Err(EvalError::InvalidInput(_))));
    }
}
