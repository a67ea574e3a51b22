// src/traits.rs
//
// Seams to the collaborators the evaluation engine drives but does not own:
// storage loaders, the per-fold classifier, the metrics calculator and the
// separation statistic.

use crate::core::{
    DatasetVariant, FeatureMatrix, InfoTable, JsonConfig, LabelEncoder, MetricReport,
    PredictionMatrix, Result,
};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// A trainable classifier that scores every class for every row.
pub trait ProbabilisticClassifier {
    /// Train from scratch. `labels[i]` is the class id of `features.row(i)`;
    /// ids are below `n_classes` even when some class is absent from this train set.
    fn fit(&mut self, features: ArrayView2<f64>, labels: &[usize], n_classes: usize) -> Result<()>;

    /// `features.nrows() x n_classes` scores, each row summing to 1.
    fn predict_proba(&self, features: ArrayView2<f64>) -> Result<PredictionMatrix>;
}

/// Builds an untrained classifier. Called once per fold so nothing carries
/// over between folds.
pub trait ClassifierFactory {
    type Model: ProbabilisticClassifier;

    fn build(&self) -> Self::Model;
}

impl<F, M> ClassifierFactory for F
where
    F: Fn() -> M,
    M: ProbabilisticClassifier,
{
    type Model = M;

    fn build(&self) -> M {
        self()
    }
}

/// Scores one member's out-of-fold predictions.
pub trait ClassificationMetrics {
    /// `class_order` names the rows of the returned stats table; `encoder`
    /// maps those names to the column ids of `predictions`.
    fn compute(
        &self,
        labels: &[usize],
        predictions: ArrayView2<f64>,
        class_order: &[String],
        encoder: &LabelEncoder,
    ) -> Result<MetricReport>;
}

/// Between-group versus within-group separation of feature rows.
pub trait SeparationStatistic {
    /// `groups[i] < n_groups` is the group of `features.row(i)`.
    fn statistic(&self, features: ArrayView2<f64>, groups: &[usize], n_groups: usize) -> Result<f64>;
}

/// Options understood by feature loaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureOptions {
    /// Backbone layer the features were taken from.
    pub layer: usize,
    /// Checkpoint identity, e.g. a suffix like "_frozen".
    pub checkpoint: String,
    pub pretrained: bool,
    /// Patch edge length in pixels. `None` means features were already pooled per 200px tile.
    pub patch_size: Option<usize>,
    /// Number of ensemble members to load.
    pub n_model: usize,
    /// Z-score each feature column.
    pub standardize: bool,
    /// Reduce to this many components when set.
    pub compression: Option<usize>,
    /// Also load a precomputed 2-D embedding for plotting.
    pub meta_viz: bool,
    /// Concatenate members into one matrix instead of keeping them apart.
    pub concat: bool,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        FeatureOptions {
            layer: 4,
            checkpoint: "_frozen".to_string(),
            pretrained: false,
            patch_size: None,
            n_model: 5,
            standardize: true,
            compression: None,
            meta_viz: false,
            concat: false,
        }
    }
}

impl JsonConfig for FeatureOptions {}

/// What a feature loader hands back.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub members: Vec<FeatureMatrix>,
    /// 2-D projection for scatter rendering, when the loader was asked for one.
    pub embedding: Option<FeatureMatrix>,
}

pub trait FeatureSource {
    fn load(&self, options: &FeatureOptions) -> Result<FeatureSet>;
}

pub trait MetadataSource {
    /// Info table for one dataset, blocked by `group_size` patches per slide.
    /// With `normalize_names` the compound column uses canonical names.
    fn load(
        &self,
        group_size: usize,
        variant: DatasetVariant,
        normalize_names: bool,
    ) -> Result<InfoTable>;
}
