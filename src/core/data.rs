// src/core/data.rs
use crate::core::{EvalError, Result};
use ndarray::Array2;
use std::collections::BTreeMap;

/// One row per image patch, one column per feature.
/// Every member of an ensemble must share the same row count and row order.
pub type FeatureMatrix = Array2<f64>;

/// N x C class-membership scores, row-aligned with the [`InfoTable`].
pub type PredictionMatrix = Array2<f64>;

/// Name of the row-index column pointing into feature matrices.
pub const INDEX_COLUMN: &str = "INDEX";
/// Name of the compound label column.
pub const COMPOUND_COLUMN: &str = "COMPOUND_NAME";
/// Name of the optional explicit slide-id column.
pub const SLIDE_COLUMN: &str = "SLIDE_ID";

/// Per-row metadata for one evaluation.
///
/// Row `i` of the table describes the patch stored at feature row `index[i]`.
/// Rows are expected to be grouped by slide upstream; nothing here re-sorts them.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoTable {
    index: Vec<usize>,
    compound_names: Vec<String>,
    slide_ids: Option<Vec<String>>,
    extra: BTreeMap<String, Vec<String>>,
}

impl InfoTable {
    pub fn new(index: Vec<usize>, compound_names: Vec<String>) -> Result<Self> {
        if index.len() != compound_names.len() {
            return Err(EvalError::InvalidInput(format!(
                "{} column has {} rows but {} column has {}.",
                INDEX_COLUMN,
                index.len(),
                COMPOUND_COLUMN,
                compound_names.len()
            )));
        }
        Ok(InfoTable {
            index,
            compound_names,
            slide_ids: None,
            extra: BTreeMap::new(),
        })
    }

    /// Table whose row `i` refers to feature row `i`.
    pub fn sequential(compound_names: Vec<String>) -> Self {
        InfoTable {
            index: (0..compound_names.len()).collect(),
            compound_names,
            slide_ids: None,
            extra: BTreeMap::new(),
        }
    }

    /// Attach an explicit slide-id column, checked against contiguous blocks
    /// by [`GroupingPolicy`](crate::algorithms::GroupingPolicy).
    pub fn with_slide_ids(mut self, slide_ids: Vec<String>) -> Result<Self> {
        self.check_len(SLIDE_COLUMN, slide_ids.len())?;
        self.slide_ids = Some(slide_ids);
        Ok(self)
    }

    pub fn with_column(mut self, name: &str, values: Vec<String>) -> Result<Self> {
        if [INDEX_COLUMN, COMPOUND_COLUMN, SLIDE_COLUMN].contains(&name) {
            return Err(EvalError::InvalidInput(format!(
                "Column name '{}' is reserved.",
                name
            )));
        }
        self.check_len(name, values.len())?;
        self.extra.insert(name.to_string(), values);
        Ok(self)
    }

    fn check_len(&self, name: &str, len: usize) -> Result<()> {
        if len != self.len() {
            return Err(EvalError::InvalidInput(format!(
                "Column '{}' has {} rows, table has {}.",
                name,
                len,
                self.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.index
    }

    pub fn compound_names(&self) -> &[String] {
        &self.compound_names
    }

    pub fn slide_ids(&self) -> Option<&[String]> {
        self.slide_ids.as_deref()
    }

    /// Look up a string column by name. The index column is numeric and is
    /// reached through [`InfoTable::indices`] instead.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        match name {
            COMPOUND_COLUMN => Some(&self.compound_names),
            SLIDE_COLUMN => self.slide_ids.as_deref(),
            _ => self.extra.get(name).map(|v| v.as_slice()),
        }
    }

    pub fn max_index(&self) -> Option<usize> {
        self.index.iter().copied().max()
    }

    /// Feature-row indices of every patch labelled `compound`, in table order.
    pub fn rows_for(&self, compound: &str) -> Vec<usize> {
        self.index
            .iter()
            .zip(self.compound_names.iter())
            .filter(|(_, name)| name.as_str() == compound)
            .map(|(&idx, _)| idx)
            .collect()
    }

    /// Rewrite the compound column, keeping every other column as is.
    pub fn map_compounds<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let compound_names = self
            .compound_names
            .iter()
            .map(|name| f(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(InfoTable {
            compound_names,
            ..self.clone()
        })
    }
}
