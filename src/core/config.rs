// src/core/config.rs
use crate::core::Result;
use serde::de::DeserializeOwned;

/// Loading for the crate's config structs. Missing fields fall back to each
/// struct's `Default` (they all carry `#[serde(default)]`).
pub trait JsonConfig: DeserializeOwned {
    fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
