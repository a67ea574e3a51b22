// src/pipeline.rs
//
// End-to-end runs wiring loaders, the grouping policy and the engine together.

use crate::algorithms::{
    ClusterConfig, ClusterScorer, EnsembleEvaluator, EvaluationConfig, GroupingPolicy,
};
use crate::core::{
    ClusterScores, DatasetVariant, EnsembleReport, EvalError, FeatureMatrix, InfoTable, Result,
};
use crate::traits::{ClassifierFactory, FeatureOptions, FeatureSource, MetadataSource};
use crate::utils::layout::{scatter_groups, slide_ticks, ScatterGroup, SlideTick};

/// A finished leave-one-slide-out run, with what a heatmap needs next to it.
#[derive(Debug, Clone)]
pub struct ClassificationRun {
    pub report: EnsembleReport,
    pub info: InfoTable,
    pub group_size: usize,
}

impl ClassificationRun {
    pub fn heatmap_ticks(&self) -> Result<Vec<SlideTick>> {
        slide_ticks(&self.info, self.group_size)
    }
}

fn load_members<FS: FeatureSource>(features: &FS, options: &FeatureOptions) -> Result<Vec<FeatureMatrix>> {
    let set = features.load(options)?;
    if set.members.len() != options.n_model {
        log::warn!(
            "requested {} ensemble members, loader returned {}",
            options.n_model,
            set.members.len()
        );
    }
    Ok(set.members)
}

/// Load features and canonical-name metadata, then cross-validate every member.
/// The group size always comes from the patch size in `options`.
pub fn run_leave_one_slide_out<FS, MS, F>(
    features: &FS,
    metadata: &MS,
    options: &FeatureOptions,
    variant: DatasetVariant,
    factory: F,
    config: Option<EvaluationConfig>,
) -> Result<ClassificationRun>
where
    FS: FeatureSource,
    MS: MetadataSource,
    F: ClassifierFactory,
{
    let policy = GroupingPolicy::from_patch_size(options.patch_size)?;
    let members = load_members(features, options)?;
    let info = metadata.load(policy.group_size(), variant, true)?;

    let mut config = config.unwrap_or_default();
    if config.group_size != policy.group_size() {
        log::debug!(
            "group size {} replaced by {} from patch size {:?}",
            config.group_size,
            policy.group_size(),
            options.patch_size
        );
        config.group_size = policy.group_size();
    }

    log::info!(
        "leave-one-slide-out: {} members, {} rows, {} per slide, {:?}",
        members.len(),
        info.len(),
        policy.group_size(),
        variant
    );
    let report = EnsembleEvaluator::new(factory, Some(config)).evaluate(&members, &info)?;
    Ok(ClassificationRun {
        report,
        info,
        group_size: policy.group_size(),
    })
}

/// Load features and canonical-name metadata, then score cluster separation per member.
pub fn run_separation<FS, MS>(
    features: &FS,
    metadata: &MS,
    options: &FeatureOptions,
    variant: DatasetVariant,
    config: Option<ClusterConfig>,
) -> Result<ClusterScores>
where
    FS: FeatureSource,
    MS: MetadataSource,
{
    let policy = GroupingPolicy::from_patch_size(options.patch_size)?;
    let members = load_members(features, options)?;
    let info = metadata.load(policy.group_size(), variant, true)?;
    ClusterScorer::new(config).score(&members, &info)
}

/// Scatter groups for one dataset in its raw vocabulary. Uses the loader's
/// 2-D embedding when `meta_viz` or `concat` is set, member `member` otherwise.
///
/// Features are always requested compressed to two components and without
/// z-scoring, whatever `options` asks for.
pub fn prepare_scatter<FS, MS>(
    features: &FS,
    metadata: &MS,
    options: &FeatureOptions,
    variant: DatasetVariant,
    member: usize,
) -> Result<Vec<ScatterGroup>>
where
    FS: FeatureSource,
    MS: MetadataSource,
{
    let policy = GroupingPolicy::from_patch_size(options.patch_size)?;
    let options = FeatureOptions {
        compression: Some(2),
        standardize: false,
        ..options.clone()
    };
    let set = features.load(&options)?;
    let info = metadata.load(policy.group_size(), variant, false)?;

    let points = if options.meta_viz || options.concat {
        set.embedding.as_ref().ok_or_else(|| {
            EvalError::InvalidInput("Loader returned no 2-D embedding.".to_string())
        })?
    } else {
        set.members.get(member).ok_or_else(|| {
            EvalError::InvalidInput(format!(
                "Member {} requested, loader returned {}.",
                member,
                set.members.len()
            ))
        })?
    };
    scatter_groups(points, &info, variant.display_compounds())
}
