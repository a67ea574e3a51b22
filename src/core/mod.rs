pub mod config;
pub mod data;
pub mod errors;
pub mod labels;
pub mod report;
pub mod vocabulary;

pub use config::JsonConfig;
pub use data::*; // Re-export common data types
pub use errors::*;
pub use labels::LabelEncoder;
pub use report::*;
pub use vocabulary::{CompoundVocabulary, DatasetVariant, CANONICAL_TARGETS};
