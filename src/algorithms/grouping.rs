// src/algorithms/grouping.rs

use crate::core::{EvalError, InfoTable, Result, SLIDE_COLUMN};
use std::collections::HashSet;
use std::ops::Range;

/// Patches sampled per slide at the reference patch size; `coef = budget / patch_size`.
pub const SLIDE_PATCH_BUDGET: usize = 2000;

/// Group size for features already pooled per 200px tile.
pub const DEFAULT_GROUP_SIZE: usize = 10;

/// Decides how many consecutive rows make up one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingPolicy {
    group_size: usize,
}

impl GroupingPolicy {
    pub fn new(group_size: usize) -> Result<Self> {
        if group_size == 0 {
            return Err(EvalError::InvalidPartition(
                "Group size must be at least 1.".to_string(),
            ));
        }
        Ok(GroupingPolicy { group_size })
    }

    /// Group size from the patch edge length used at extraction time.
    pub fn from_patch_size(patch_size: Option<usize>) -> Result<Self> {
        match patch_size {
            None => Self::new(DEFAULT_GROUP_SIZE),
            Some(0) => Err(EvalError::InvalidInput(
                "Patch size must be positive.".to_string(),
            )),
            Some(size) if size > SLIDE_PATCH_BUDGET => Err(EvalError::InvalidInput(format!(
                "Patch size {} exceeds the per-slide budget of {}.",
                size, SLIDE_PATCH_BUDGET
            ))),
            Some(size) => Self::new(SLIDE_PATCH_BUDGET / size),
        }
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn splitter(&self, n_samples: usize) -> Result<GroupedSplitter> {
        GroupedSplitter::new(n_samples, self.group_size)
    }

    /// When the table carries explicit slide ids, every contiguous block must
    /// hold exactly one slide and no slide may span two blocks.
    pub fn check_slide_ids(&self, info: &InfoTable) -> Result<()> {
        let Some(slide_ids) = info.slide_ids() else {
            return Ok(());
        };
        let splitter = self.splitter(slide_ids.len())?;
        let mut seen: HashSet<&str> = HashSet::with_capacity(splitter.n_folds());

        for (block, ids) in slide_ids.chunks(self.group_size).enumerate() {
            let first = ids[0].as_str();
            if let Some(other) = ids.iter().find(|id| id.as_str() != first) {
                return Err(EvalError::InvalidPartition(format!(
                    "Block {} mixes {} '{}' and '{}'; rows are not grouped by slide in blocks of {}.",
                    block, SLIDE_COLUMN, first, other, self.group_size
                )));
            }
            if !seen.insert(first) {
                return Err(EvalError::InvalidPartition(format!(
                    "{} '{}' spans more than one block of {} rows.",
                    SLIDE_COLUMN, first, self.group_size
                )));
            }
        }
        Ok(())
    }
}

/// Leave-one-slide-out splitter over contiguous blocks of `group_size` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedSplitter {
    n_samples: usize,
    group_size: usize,
}

impl GroupedSplitter {
    pub fn new(n_samples: usize, group_size: usize) -> Result<Self> {
        if group_size == 0 {
            return Err(EvalError::InvalidPartition(
                "Group size must be at least 1.".to_string(),
            ));
        }
        if n_samples % group_size != 0 {
            return Err(EvalError::InvalidPartition(format!(
                "{} samples cannot be split into whole slides of {} patches ({} left over).",
                n_samples,
                group_size,
                n_samples % group_size
            )));
        }
        Ok(GroupedSplitter {
            n_samples,
            group_size,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn n_folds(&self) -> usize {
        self.n_samples / self.group_size
    }

    /// Folds in increasing block order.
    pub fn folds(&self) -> Folds {
        Folds {
            splitter: *self,
            next: 0,
        }
    }
}

/// One held-out slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub index: usize,
    /// Every row outside the held-out block, ascending.
    pub train: Vec<usize>,
    pub test: Range<usize>,
}

impl Fold {
    pub fn test_indices(&self) -> Vec<usize> {
        self.test.clone().collect()
    }
}

#[derive(Debug, Clone)]
pub struct Folds {
    splitter: GroupedSplitter,
    next: usize,
}

impl Iterator for Folds {
    type Item = Fold;

    fn next(&mut self) -> Option<Fold> {
        if self.next >= self.splitter.n_folds() {
            return None;
        }
        let k = self.next;
        self.next += 1;

        let start = k * self.splitter.group_size;
        let end = start + self.splitter.group_size;
        let train = (0..start).chain(end..self.splitter.n_samples).collect();
        Some(Fold {
            index: k,
            train,
            test: start..end,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.splitter.n_folds() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Folds {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_rows_in_blocks_of_five() -> Result<()> {
        let splitter = GroupedSplitter::new(20, 5)?;
        let folds: Vec<Fold> = splitter.folds().collect();

        assert_eq!(folds.len(), 4);
        let tests: Vec<Range<usize>> = folds.iter().map(|f| f.test.clone()).collect();
        assert_eq!(tests, vec![0..5, 5..10, 10..15, 15..20]);
        for fold in &folds {
            assert_eq!(fold.train.len(), 15);
            assert!(fold.train.iter().all(|i| !fold.test.contains(i)));
        }
        // Leave-one-out over all other blocks, not just neighbours.
        assert_eq!(folds[1].train[..5], [0, 1, 2, 3, 4]);
        assert_eq!(folds[1].train[5..], (10..20).collect::<Vec<usize>>()[..]);
        Ok(())
    }

    #[test]
    fn test_blocks_partition_the_rows_in_order() -> Result<()> {
        for (n, coef) in [(1, 1), (6, 1), (6, 2), (6, 3), (6, 6), (30, 10), (100, 4)] {
            let splitter = GroupedSplitter::new(n, coef)?;
            assert_eq!(splitter.folds().len(), n / coef);
            let concatenated: Vec<usize> = splitter.folds().flat_map(|f| f.test_indices()).collect();
            assert_eq!(concatenated, (0..n).collect::<Vec<_>>());
            for fold in splitter.folds() {
                assert_eq!(fold.train.len() + fold.test.len(), n);
            }
        }
        Ok(())
    }

    #[test]
    fn ragged_partitions_fail_fast() {
        assert!(matches!(
            GroupedSplitter::new(21, 5),
            Err(EvalError::InvalidPartition(_))
        ));
        assert!(matches!(
            GroupedSplitter::new(10, 0),
            Err(EvalError::InvalidPartition(_))
        ));
    }

    #[test]
    fn empty_input_yields_no_folds() -> Result<()> {
        assert_eq!(GroupedSplitter::new(0, 5)?.folds().count(), 0);
        Ok(())
    }

    #[test]
    fn group_size_from_patch_size() -> Result<()> {
        assert_eq!(GroupingPolicy::from_patch_size(None)?.group_size(), 10);
        assert_eq!(GroupingPolicy::from_patch_size(Some(200))?.group_size(), 10);
        assert_eq!(GroupingPolicy::from_patch_size(Some(400))?.group_size(), 5);
        assert_eq!(GroupingPolicy::from_patch_size(Some(300))?.group_size(), 6);
        assert_eq!(GroupingPolicy::from_patch_size(Some(2000))?.group_size(), 1);
        assert!(GroupingPolicy::from_patch_size(Some(0)).is_err());
        assert!(GroupingPolicy::from_patch_size(Some(4000)).is_err());
        Ok(())
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn slide_ids_must_match_blocks() -> Result<()> {
        let policy = GroupingPolicy::new(2)?;
        let compounds = ids(&["a", "a", "b", "b"]);

        let good = InfoTable::sequential(compounds.clone()).with_slide_ids(ids(&["s0", "s0", "s1", "s1"]))?;
        policy.check_slide_ids(&good)?;

        let mixed = InfoTable::sequential(compounds.clone()).with_slide_ids(ids(&["s0", "s1", "s1", "s1"]))?;
        assert!(matches!(
            policy.check_slide_ids(&mixed),
            Err(EvalError::InvalidPartition(_))
        ));

        let split = InfoTable::sequential(compounds.clone()).with_slide_ids(ids(&["s0", "s0", "s0", "s0"]))?;
        assert!(matches!(
            policy.check_slide_ids(&split),
            Err(EvalError::InvalidPartition(_))
        ));

        // No explicit ids: contiguous blocking is taken as given.
        policy.check_slide_ids(&InfoTable::sequential(compounds))?;
        Ok(())
    }
}
