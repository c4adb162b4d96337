/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use std::collections::HashMap;

/// A single microdata sample row: a stable row index, the household it
/// belongs to, the k fitting-variable category codes for that row, and any
/// extra person-level attributes the ingestion layer chose to carry along
/// (§3: "multiple rows may share hh_id (persons within a household)").
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalRow {
    pub row_idx: u64,
    pub hh_id: String,
    pub codes: Vec<u32>,
    pub person_attrs: HashMap<String, String>,
}

/// The microdata sample rows themselves (§3). Every `(d1, …, dk)`
/// combination present in the companion `MicroJoint` is backed by one or
/// more rows here.
#[derive(Debug, Clone, Default)]
pub struct MicroCategorical {
    rows: Vec<CategoricalRow>,
    by_row_idx: HashMap<u64, usize>,
    by_hh_id: HashMap<String, Vec<usize>>,
}

impl MicroCategorical {
    pub fn new() -> MicroCategorical {
        MicroCategorical {
            rows: Vec::new(),
            by_row_idx: HashMap::new(),
            by_hh_id: HashMap::new(),
        }
    }

    pub fn push(&mut self, row: CategoricalRow) {
        let i = self.rows.len();
        self.by_row_idx.insert(row.row_idx, i);
        self.by_hh_id
            .entry(row.hh_id.clone())
            .or_insert_with(Vec::new)
            .push(i);
        self.rows.push(row);
    }

    /// All rows, in insertion order. The household selector's distance
    /// matrix is indexed positionally against this slice (§4.4's
    /// `n_rows`).
    pub fn rows(&self) -> &[CategoricalRow] {
        &self.rows
    }

    pub fn get_by_row_idx(&self, row_idx: u64) -> Option<&CategoricalRow> {
        self.by_row_idx.get(&row_idx).map(|&i| &self.rows[i])
    }

    /// Every row sharing `hh_id`, i.e. the full person roster of that
    /// household — used by the orchestrator to build `PersonRecord`s for a
    /// selected household (§4.6).
    pub fn rows_for_household(&self, hh_id: &str) -> Vec<&CategoricalRow> {
        self.by_hh_id
            .get(hh_id)
            .map(|idxs| idxs.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }
}
