/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::{AreaId, KindError};
use crate::tables::variable::VariableMetadata;
use std::collections::HashMap;

/// `M_v[g]`: the per-area category distribution for a single fitting
/// variable. Missing categories are treated as 0, per §3.
#[derive(Debug, Clone)]
pub struct MarginalTable {
    variable: String,
    rows: HashMap<AreaId, HashMap<u32, f64>>,
}

impl MarginalTable {
    pub fn new(variable: &str) -> MarginalTable {
        MarginalTable {
            variable: variable.to_string(),
            rows: HashMap::new(),
        }
    }

    /// Inserts `(area, category, total)`. `meta` validates that `category`
    /// is a declared member of this variable's domain: constructing a
    /// marginal whose keys are not a subset of `Dv` is a `KindError`.
    pub fn insert(
        &mut self,
        meta: &VariableMetadata,
        area: &str,
        category: u32,
        total: f64,
    ) -> Result<(), KindError> {
        if !meta.domain_contains(&self.variable, category) {
            return Err(KindError::UnknownCategory {
                variable: self.variable.clone(),
                code: category,
            });
        }
        self.rows
            .entry(area.to_string())
            .or_insert_with(HashMap::new)
            .insert(category, total);
        Ok(())
    }

    /// Category totals for `area`, restricted to this variable; missing
    /// categories are simply absent from the returned map (read as 0 by
    /// callers).
    pub fn project(&self, area: &str) -> Result<&HashMap<u32, f64>, KindError> {
        self.rows
            .get(area)
            .ok_or_else(|| KindError::UnknownArea(area.to_string()))
    }
}

/// The full collection of marginals across all fitting variables F, keyed
/// by variable name. `project(g)` (§4.1) returns the `variable -> (category
/// -> total)` map for area g across every declared variable.
#[derive(Debug, Clone, Default)]
pub struct Marginals {
    tables: HashMap<String, MarginalTable>,
}

impl Marginals {
    pub fn new() -> Marginals {
        Marginals {
            tables: HashMap::new(),
        }
    }

    pub fn table_mut(&mut self, variable: &str) -> &mut MarginalTable {
        self.tables
            .entry(variable.to_string())
            .or_insert_with(|| MarginalTable::new(variable))
    }

    pub fn table(&self, variable: &str) -> Option<&MarginalTable> {
        self.tables.get(variable)
    }

    /// `variable -> (category -> total)` for area `g`, restricted to the
    /// variables that have any data recorded for `g`. A variable absent
    /// for `g` entirely is treated by the fitter as an all-zero marginal
    /// (infeasible, per spec.md's resolved Open Question).
    pub fn project(&self, area: &str) -> HashMap<String, HashMap<u32, f64>> {
        let mut out = HashMap::new();
        for (variable, table) in &self.tables {
            if let Ok(row) = table.project(area) {
                out.insert(variable.clone(), row.clone());
            }
        }
        out
    }
}
