// src/core/labels.rs
use crate::core::{EvalError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Dense integer ids for compound names, ordered alphabetically.
///
/// Built fresh for every evaluation call, so a class id only means something
/// next to the encoder that produced it. Anything persisted should key on
/// the class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(names: &[S]) -> Self {
        let classes: BTreeSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        LabelEncoder {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(name))
            .ok()
    }

    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.classes.get(id).map(|s| s.as_str())
    }

    pub fn transform<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|n| {
                self.id_of(n.as_ref()).ok_or_else(|| {
                    EvalError::InvalidInput(format!("Unknown class '{}'.", n.as_ref()))
                })
            })
            .collect()
    }
}
