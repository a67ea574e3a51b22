// src/utils/layout.rs
//
// Data handed to the plotting side. Nothing here draws; it only picks rows
// and labels so a renderer can stay ignorant of the grouping rules.

use crate::core::{EvalError, FeatureMatrix, InfoTable, Result};

/// One y-axis tick of the prediction heatmap: the middle row of a slide block
/// and that row's compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideTick {
    pub row: usize,
    pub label: String,
}

/// Ticks at `k * group_size + group_size / 2` for every slide block.
pub fn slide_ticks(info: &InfoTable, group_size: usize) -> Result<Vec<SlideTick>> {
    if group_size == 0 {
        return Err(EvalError::InvalidPartition(
            "Group size must be at least 1.".to_string(),
        ));
    }
    let names = info.compound_names();
    Ok((0..names.len() / group_size)
        .map(|k| {
            let row = k * group_size + group_size / 2;
            SlideTick {
                row,
                label: names[row].clone(),
            }
        })
        .collect())
}

/// Points of one compound in a 2-D embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterGroup {
    pub compound: String,
    pub points: Vec<[f64; 2]>,
}

/// For each displayed compound, in the order given, the embedding rows the
/// info table assigns to it. Compounds absent from the table yield an empty group.
pub fn scatter_groups<S: AsRef<str>>(
    embedding: &FeatureMatrix,
    info: &InfoTable,
    compounds: &[S],
) -> Result<Vec<ScatterGroup>> {
    if embedding.ncols() < 2 {
        return Err(EvalError::InvalidInput(format!(
            "Scatter needs two embedding columns, got {}.",
            embedding.ncols()
        )));
    }
    if let Some(max) = info.max_index() {
        if max >= embedding.nrows() {
            return Err(EvalError::IndexAlignment(format!(
                "Info table refers to row {} of a {}-row embedding.",
                max,
                embedding.nrows()
            )));
        }
    }
    Ok(compounds
        .iter()
        .map(|c| ScatterGroup {
            compound: c.as_ref().to_string(),
            points: info
                .rows_for(c.as_ref())
                .into_iter()
                .map(|i| [embedding[[i, 0]], embedding[[i, 1]]])
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn info() -> InfoTable {
        InfoTable::new(
            vec![3, 2, 1, 0],
            ["a", "a", "b", "b"].iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn ticks_sit_mid_block() -> Result<()> {
        let ticks = slide_ticks(&info(), 2)?;
        assert_eq!(
            ticks,
            vec![
                SlideTick { row: 1, label: "a".to_string() },
                SlideTick { row: 3, label: "b".to_string() },
            ]
        );
        assert!(slide_ticks(&info(), 0).is_err());
        Ok(())
    }

    #[test]
    fn scatter_follows_index_column() -> Result<()> {
        let emb = array![[0.0, 0.5], [1.0, 1.5], [2.0, 2.5], [3.0, 3.5]];
        let groups = scatter_groups(&emb, &info(), &["b", "a", "z"])?;
        assert_eq!(groups[0].compound, "b");
        assert_eq!(groups[0].points, vec![[1.0, 1.5], [0.0, 0.5]]);
        assert_eq!(groups[1].points, vec![[3.0, 3.5], [2.0, 2.5]]);
        assert!(groups[2].points.is_empty());
        Ok(())
    }

    #[test]
    fn scatter_checks_shape() {
        let narrow = array![[0.0], [1.0], [2.0], [3.0]];
        assert!(scatter_groups(&narrow, &info(), &["a"]).is_err());
        let short = array![[0.0, 0.0], [1.0, 1.0]];
        assert!(matches!(
            scatter_groups(&short, &info(), &["a"]),
            Err(EvalError::IndexAlignment(_))
        ));
    }
}
