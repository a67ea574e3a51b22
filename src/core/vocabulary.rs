// src/core/vocabulary.rs
//
// The two source datasets name the same compounds differently. Each dataset
// gets an explicit lookup table onto the canonical vocabulary, so adding a
// dataset means adding a table, not touching the evaluation engine.

use crate::core::{EvalError, InfoTable, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical class order used for reporting.
pub const CANONICAL_TARGETS: [&str; 5] = [
    "vehicle",
    "bromobenzene",
    "carbon tetrachloride",
    "naphthyl isothiocyanate",
    "acetaminophen",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetVariant {
    /// In-house study set, raw names like "CCl4" and "Corn Oil".
    Eisai,
    /// Open TG-GATEs set, already lowercase canonical-style names.
    TgGate,
}

impl DatasetVariant {
    /// Compounds shown in scatter plots for this dataset, in its own raw vocabulary.
    pub fn display_compounds(&self) -> &'static [&'static str] {
        match self {
            DatasetVariant::Eisai => &[
                "Corn Oil",
                "Bromobenzene",
                "CCl4",
                "Naphthyl isothiocyanate",
                "Methylcellulose",
                "Acetaminophen",
            ],
            DatasetVariant::TgGate => &CANONICAL_TARGETS,
        }
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DatasetVariant::Eisai => &[
                ("Corn Oil", "vehicle"),
                ("Methylcellulose", "vehicle"),
                ("Bromobenzene", "bromobenzene"),
                ("CCl4", "carbon tetrachloride"),
                ("Naphthyl isothiocyanate", "naphthyl isothiocyanate"),
                ("Acetaminophen", "acetaminophen"),
            ],
            DatasetVariant::TgGate => &[
                ("vehicle", "vehicle"),
                ("acetaminophen", "acetaminophen"),
                ("bromobenzene", "bromobenzene"),
                ("naphthyl isothiocyanate", "naphthyl isothiocyanate"),
                ("carbon tetrachloride", "carbon tetrachloride"),
            ],
        }
    }
}

/// Raw-name to canonical-name lookup for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundVocabulary {
    variant: DatasetVariant,
    map: BTreeMap<String, String>,
}

impl CompoundVocabulary {
    pub fn for_variant(variant: DatasetVariant) -> Self {
        let map = variant
            .table()
            .iter()
            .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
            .collect();
        CompoundVocabulary { variant, map }
    }

    pub fn variant(&self) -> DatasetVariant {
        self.variant
    }

    pub fn canonical(&self, raw: &str) -> Option<&str> {
        self.map.get(raw).map(|s| s.as_str())
    }

    /// Rewrite the compound column onto canonical names. Unknown names are an error.
    pub fn normalize(&self, info: &InfoTable) -> Result<InfoTable> {
        info.map_compounds(|raw| {
            self.canonical(raw).map(str::to_string).ok_or_else(|| {
                EvalError::InvalidInput(format!(
                    "Compound '{}' has no canonical name for {:?}.",
                    raw, self.variant
                ))
            })
        })
    }
}
