/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::IntegerizeError;
use crate::tables::JointCell;
use rand::Rng;

/// A surviving integerized cell: the original tuple plus its rounded
/// count. Zero-count cells are dropped, per §4.3.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerCell {
    pub codes: Vec<u32>,
    pub count: u64,
}

/// Converts a real-valued fitted joint into an integer joint whose total
/// equals `round(n_houses)` exactly (§4.3).
pub fn integerize(
    area: &str,
    fitted: &[JointCell],
    n_houses: f64,
    rng: &mut impl Rng,
) -> Result<Vec<IntegerCell>, IntegerizeError> {
    let target_total = n_houses.round() as i64;

    // Step 1: stochastic rounding.
    let mut cells: Vec<IntegerCell> = Vec::with_capacity(fitted.len());
    for cell in fitted {
        let frac = cell.weight.fract();
        let u: f64 = rng.gen_range(0.0..1.0);
        let count = if u < frac {
            cell.weight.ceil()
        } else {
            cell.weight.floor()
        };
        if count > 0f64 {
            cells.push(IntegerCell {
                codes: cell.codes.clone(),
                count: count as u64,
            });
        }
    }

    let mut total: i64 = cells.iter().map(|c| c.count as i64).sum();

    // Step 2: total correction.
    if total == 0 {
        // Spec.md's S0 == 0 branch is stated in terms of floor(n_houses),
        // distinct from the round(n_houses) total used everywhere else.
        let take = n_houses.floor().max(0.0) as usize;
        if take == 0 {
            return Ok(Vec::new());
        }
        if fitted.is_empty() {
            // No survivors to fall back on: per §4.3's empty-survivors
            // example, this can never reach the target total.
            return Err(IntegerizeError::NoProgress {
                area: area.to_string(),
                direction: "increment",
            });
        }
        let mut by_weight: Vec<&JointCell> = fitted.iter().collect();
        by_weight.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap());
        cells = by_weight
            .into_iter()
            .take(take)
            .map(|c| IntegerCell {
                codes: c.codes.clone(),
                count: 1,
            })
            .collect();
        return Ok(cells);
    }

    while total < target_total {
        if cells.is_empty() {
            return Err(IntegerizeError::NoProgress {
                area: area.to_string(),
                direction: "increment",
            });
        }
        let i = rng.gen_range(0..cells.len());
        cells[i].count += 1;
        total += 1;
    }

    while total > target_total {
        if cells.is_empty() {
            return Err(IntegerizeError::NoProgress {
                area: area.to_string(),
                direction: "decrement",
            });
        }
        let i = rng.gen_range(0..cells.len());
        cells[i].count -= 1;
        total -= 1;
        if cells[i].count == 0 {
            cells.swap_remove(i);
        }
    }

    Ok(cells)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(1)
    }

    #[test]
    fn test_sum_equals_rounded_households() {
        let fitted = vec![
            JointCell {
                codes: vec![1],
                weight: 2.7,
            },
            JointCell {
                codes: vec![2],
                weight: 3.3,
            },
        ];
        let result = integerize("A", &fitted, 6.0, &mut rng()).unwrap();
        let total: u64 = result.iter().map(|c| c.count).sum();
        assert_eq!(total, 6);
    }

    /// Scenario 4 (spec.md §8): households = 1, two cells each with fitted
    /// weight 0.5 — stochastic rounding yields exactly one 1 and one 0.
    #[test]
    fn test_scenario_four_single_household_split_weight() {
        let fitted = vec![
            JointCell {
                codes: vec![1],
                weight: 0.5,
            },
            JointCell {
                codes: vec![2],
                weight: 0.5,
            },
        ];
        let result = integerize("A", &fitted, 1.0, &mut rng()).unwrap();
        let total: u64 = result.iter().map(|c| c.count).sum();
        assert_eq!(total, 1);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_integerizing_integer_joint_is_identity() {
        let fitted = vec![
            JointCell {
                codes: vec![1],
                weight: 2.0,
            },
            JointCell {
                codes: vec![2],
                weight: 3.0,
            },
        ];
        let result = integerize("A", &fitted, 5.0, &mut rng()).unwrap();
        let mut counts: Vec<u64> = result.iter().map(|c| c.count).collect();
        counts.sort();
        assert_eq!(counts, vec![2, 3]);
    }

    #[test]
    fn test_all_zero_fitted_uses_largest_original_weight() {
        // Integer-valued (zero fractional part) weights make stochastic
        // rounding deterministic: every cell rounds down to 0, forcing the
        // S0 == 0 correction branch.
        let fitted = vec![
            JointCell {
                codes: vec![1],
                weight: 0.0,
            },
            JointCell {
                codes: vec![2],
                weight: 0.0,
            },
            JointCell {
                codes: vec![3],
                weight: 0.0,
            },
        ];
        let result = integerize("A", &fitted, 2.0, &mut rng()).unwrap();
        let total: u64 = result.iter().map(|c| c.count).sum();
        assert_eq!(total, 2);
        assert!(result.iter().all(|c| c.count == 1));
    }

    #[test]
    fn test_no_progress_when_no_survivors_and_target_positive() {
        let fitted: Vec<JointCell> = vec![];
        let result = integerize("A", &fitted, 2.0, &mut rng());
        assert!(matches!(result, Err(IntegerizeError::NoProgress { .. })));
    }
}
