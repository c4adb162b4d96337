/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::{AreaId, KindError};
use std::collections::HashMap;

/// Per-area population and household totals (§3). `areas_of_interest` is
/// the set of areas with strictly positive population and household
/// counts; areas that fail this test receive no output.
#[derive(Debug, Clone, Default)]
pub struct GlobalTotals {
    order: Vec<AreaId>,
    rows: HashMap<AreaId, (f64, f64)>,
}

impl GlobalTotals {
    pub fn new() -> GlobalTotals {
        GlobalTotals {
            order: Vec::new(),
            rows: HashMap::new(),
        }
    }

    /// Records `(area, total_population, households)`. Later calls with the
    /// same area id overwrite the earlier value without changing its
    /// position in the declared order.
    pub fn insert(&mut self, area: &str, total_population: f64, households: f64) {
        if !self.rows.contains_key(area) {
            self.order.push(area.to_string());
        }
        self.rows
            .insert(area.to_string(), (total_population, households));
    }

    pub fn get(&self, area: &str) -> Result<(f64, f64), KindError> {
        self.rows
            .get(area)
            .copied()
            .ok_or_else(|| KindError::UnknownArea(area.to_string()))
    }

    pub fn households(&self, area: &str) -> Result<f64, KindError> {
        self.get(area).map(|(_, h)| h)
    }

    /// Areas in declared (insertion) order with `pop > 0 && households > 0`.
    pub fn areas_of_interest(&self) -> Vec<AreaId> {
        self.order
            .iter()
            .filter(|area| {
                let (pop, households) = self.rows[*area];
                pop > 0f64 && households > 0f64
            })
            .cloned()
            .collect()
    }
}
