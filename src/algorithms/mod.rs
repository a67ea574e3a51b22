pub mod cluster;
pub mod ensemble;
pub mod grouping;
pub mod logistic;
pub mod metrics;
pub mod pseudo_f;

pub use cluster::{ClusterConfig, ClusterScorer, REPORTING_SEED};
pub use ensemble::{EnsembleAggregate, EnsembleEvaluator, EvaluationConfig};
pub use grouping::{Fold, GroupedSplitter, GroupingPolicy, DEFAULT_GROUP_SIZE, SLIDE_PATCH_BUDGET};
pub use logistic::{SoftmaxConfig, SoftmaxRegression};
pub use metrics::{StandardMetrics, STAT_COLUMNS};
pub use pseudo_f::PseudoF;
