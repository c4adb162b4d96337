/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::SelectError;
use crate::integerizer::IntegerCell;
use crate::tables::{MicroCategorical, VariableKind, VariableMetadata};
use log::warn;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Ordinal affinity factor between a fitted cell's category and a
/// microdata row's category, `(1 - |row_v - cell_v| / r)^k` (§4.4). `r`
/// is the full range of the variable across the microdata rows; a
/// degenerate (single-valued) range contributes no discrimination.
fn ordinal_affinity(cell_code: u32, row_code: u32, r: f64, k: f64) -> f64 {
    if r == 0f64 {
        return 1f64;
    }
    (1f64 - (cell_code as f64 - row_code as f64).abs() / r).powf(k)
}

/// Categorical affinity factor: `alpha` on a match, `1 - alpha` otherwise.
fn categorical_affinity(cell_code: u32, row_code: u32, alpha: f64) -> f64 {
    if cell_code == row_code {
        alpha
    } else {
        1f64 - alpha
    }
}

fn ordinal_range(rows: &[&crate::tables::CategoricalRow], var_idx: usize) -> f64 {
    let mut min = u32::MAX;
    let mut max = 0u32;
    for row in rows {
        let c = row.codes[var_idx];
        if c < min {
            min = c;
        }
        if c > max {
            max = c;
        }
    }
    (max - min) as f64
}

/// Builds the `(n_cells x n_rows)` affinity matrix D (§4.4).
fn build_distance_matrix(
    cells: &[IntegerCell],
    rows: &[&crate::tables::CategoricalRow],
    meta: &VariableMetadata,
    fitting_vars: &[String],
    alpha: f64,
    k: f64,
) -> Vec<Vec<f64>> {
    let mut matrix = vec![vec![1f64; rows.len()]; cells.len()];
    for (var_idx, variable) in fitting_vars.iter().enumerate() {
        let kind = meta
            .get(variable)
            .map(|info| info.kind)
            .unwrap_or(VariableKind::Categorical);
        let r = if kind == VariableKind::Ordinal {
            ordinal_range(rows, var_idx)
        } else {
            0f64
        };
        for (ci, cell) in cells.iter().enumerate() {
            let cell_code = cell.codes[var_idx];
            for (ri, row) in rows.iter().enumerate() {
                let row_code = row.codes[var_idx];
                let factor = match kind {
                    VariableKind::Ordinal => ordinal_affinity(cell_code, row_code, r, k),
                    VariableKind::Categorical => categorical_affinity(cell_code, row_code, alpha),
                };
                matrix[ci][ri] *= factor;
            }
        }
    }
    matrix
}

/// Normalizes each row of D to a probability distribution P. A zero row
/// sum flags the cell as `SelectError::DegenerateRow`.
fn normalize_rows(
    area: &str,
    matrix: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>, SelectError> {
    let mut out = Vec::with_capacity(matrix.len());
    for (ci, row) in matrix.iter().enumerate() {
        for &v in row {
            if !v.is_finite() || v < 0f64 {
                warn!(
                    "area '{}' cell {} has a non-finite or negative affinity entry ({})",
                    area, ci, v
                );
            }
        }
        let sum: f64 = row.iter().sum();
        if sum == 0f64 {
            return Err(SelectError::DegenerateRow {
                area: area.to_string(),
                cell: ci,
            });
        }
        out.push(row.iter().map(|&v| v / sum).collect());
    }
    Ok(out)
}

/// One drawn household instance: the fitted cell it fills plus the
/// microdata row chosen to stand in for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedHousehold {
    pub codes: Vec<u32>,
    pub row_idx: u64,
}

/// Draws `Σ count[g][t_i]` microdata rows for area `g` (§4.4), concatenated
/// in the order `cells` is given.
pub fn select_households(
    area: &str,
    cells: &[IntegerCell],
    categorical: &MicroCategorical,
    meta: &VariableMetadata,
    fitting_vars: &[String],
    alpha: f64,
    k: f64,
    rng: &mut impl Rng,
) -> Result<Vec<SelectedHousehold>, SelectError> {
    let rows: Vec<&crate::tables::CategoricalRow> = categorical.rows().iter().collect();
    let matrix = build_distance_matrix(cells, &rows, meta, fitting_vars, alpha, k);
    let probabilities = normalize_rows(area, &matrix)?;

    let mut selected = Vec::new();
    for (ci, cell) in cells.iter().enumerate() {
        let dist = WeightedIndex::new(&probabilities[ci]).map_err(|_| SelectError::DegenerateRow {
            area: area.to_string(),
            cell: ci,
        })?;
        for _ in 0..cell.count {
            let ri = dist.sample(rng);
            selected.push(SelectedHousehold {
                codes: cell.codes.clone(),
                row_idx: rows[ri].row_idx,
            });
        }
    }
    Ok(selected)
}
