// src/utils/synthetic.rs
//
// Seeded stand-ins for extracted patch features: every compound gets its own
// Gaussian centre, every slide a small shared offset, every patch its own noise.

use crate::core::{EvalError, FeatureMatrix, InfoTable, Result};
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

#[derive(Debug, Clone, PartialEq)]
pub struct BlobSpec {
    pub compounds: Vec<String>,
    pub slides_per_compound: usize,
    pub patches_per_slide: usize,
    pub n_features: usize,
    /// Distance of each compound centre from the origin.
    pub separation: f64,
    /// Per-patch standard deviation. Slides shift by half of this.
    pub spread: f64,
    pub seed: u64,
}

/// Feature rows grouped slide by slide, with a matching sequential info table
/// (compound column plus explicit slide ids).
pub fn slide_blobs(spec: &BlobSpec) -> Result<(FeatureMatrix, InfoTable)> {
    if spec.compounds.is_empty() || spec.n_features == 0 {
        return Err(EvalError::InvalidInput(
            "Need at least one compound and one feature.".to_string(),
        ));
    }
    if !(spec.spread >= 0.0 && spec.spread.is_finite()) {
        return Err(EvalError::InvalidInput(format!(
            "Spread must be a finite, non-negative standard deviation, got {}.",
            spec.spread
        )));
    }
    let noise = Normal::new(0.0, spec.spread)
        .map_err(|e| EvalError::InvalidInput(format!("Bad spread {}: {}", spec.spread, e)))?;
    let slide_shift = Normal::new(0.0, spec.spread / 2.0)
        .map_err(|e| EvalError::InvalidInput(format!("Bad spread {}: {}", spec.spread, e)))?;
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);

    let n_rows = spec.compounds.len() * spec.slides_per_compound * spec.patches_per_slide;
    let mut x = Array2::<f64>::zeros((n_rows, spec.n_features));
    let mut compounds = Vec::with_capacity(n_rows);
    let mut slide_ids = Vec::with_capacity(n_rows);

    let mut row = 0;
    for (c, compound) in spec.compounds.iter().enumerate() {
        // Compounds sit on alternating signs of successive axes.
        let axis = (c / 2) % spec.n_features;
        let sign = if c % 2 == 0 { 1.0 } else { -1.0 };
        for s in 0..spec.slides_per_compound {
            let shift: Vec<f64> = (0..spec.n_features).map(|_| slide_shift.sample(&mut rng)).collect();
            for _ in 0..spec.patches_per_slide {
                for j in 0..spec.n_features {
                    let centre = if j == axis { sign * spec.separation / 2.0 } else { 0.0 };
                    x[[row, j]] = centre + shift[j] + noise.sample(&mut rng);
                }
                compounds.push(compound.clone());
                slide_ids.push(format!("{}-{}", compound, s));
                row += 1;
            }
        }
    }

    let info = InfoTable::sequential(compounds).with_slide_ids(slide_ids)?;
    Ok((x, info))
}
