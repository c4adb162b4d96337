/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

//! Loads a `PipelineTables` from a single JSON fixture file. This is a
//! convenience for the CLI binary and integration tests, not part of the
//! core data contract — real deployments are expected to populate
//! `PipelineTables` from whatever ingestion pipeline they already have
//! (raw ingestion/schema mapping are explicitly out of scope for the core).

use crate::geometry::{Point2D, Polygon};
use crate::orchestrator::PipelineTables;
use crate::tables::{
    CategoricalRow, GlobalTotals, Marginals, MicroCategorical, MicroJoint, PolygonSet,
    VariableKind, VariableMetadata,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

#[derive(thiserror::Error, Debug)]
pub enum FixtureError {
    #[error("failed to read fixture file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("fixture references unknown category {code} for variable '{variable}'")]
    UnknownCategory { variable: String, code: u32 },
    #[error("fixture references unknown area '{0}'")]
    UnknownArea(String),
}

impl From<crate::error::KindError> for FixtureError {
    fn from(e: crate::error::KindError) -> FixtureError {
        match e {
            crate::error::KindError::UnknownCategory { variable, code } => {
                FixtureError::UnknownCategory { variable, code }
            }
            crate::error::KindError::UnknownArea(area) => FixtureError::UnknownArea(area),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FixtureVariable {
    name: String,
    kind: VariableKind,
    domain: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FixtureArea {
    area_id: String,
    total_population: f64,
    households: f64,
    /// `variable -> (category -> total)`.
    marginals: HashMap<String, HashMap<u32, f64>>,
    /// Closed polygon rings, `[[ [lon, lat], ... ], ...]`.
    polygon: Vec<Vec<(f64, f64)>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FixtureMicroRow {
    row_idx: u64,
    hh_id: String,
    codes: Vec<u32>,
    #[serde(default)]
    person_attrs: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FixtureJointCell {
    codes: Vec<u32>,
    weight: f64,
}

/// The on-disk fixture format: one JSON document with the fitting-variable
/// declarations, the per-area totals/marginals/polygons, and the microdata
/// sample (joint cells plus the categorical rows behind them).
#[derive(Debug, Serialize, Deserialize)]
pub struct Fixture {
    variables: Vec<FixtureVariable>,
    fitting_order: Vec<String>,
    areas: Vec<FixtureArea>,
    joint: Vec<FixtureJointCell>,
    microdata: Vec<FixtureMicroRow>,
}

/// Reads and parses a fixture file without yet building the pipeline
/// tables — split out so tests can construct a `Fixture` in memory.
pub fn load_fixture_file(path: &str) -> Result<Fixture, FixtureError> {
    let contents = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| FixtureError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Builds a `PipelineTables` from a parsed `Fixture`.
pub fn build_pipeline_tables(fixture: Fixture) -> Result<PipelineTables, FixtureError> {
    let mut meta = VariableMetadata::new();
    for v in &fixture.variables {
        meta.declare(&v.name, v.kind, v.domain.clone());
    }

    let mut totals = GlobalTotals::new();
    let mut marginals = Marginals::new();
    let mut polygons = PolygonSet::new();

    for area in &fixture.areas {
        totals.insert(&area.area_id, area.total_population, area.households);
        for (variable, categories) in &area.marginals {
            for (&category, &total) in categories {
                marginals
                    .table_mut(variable)
                    .insert(&meta, &area.area_id, category, total)?;
            }
        }
        let parts = area
            .polygon
            .iter()
            .map(|ring| ring.iter().map(|&(x, y)| Point2D::new(x, y)).collect())
            .collect();
        polygons.insert(&area.area_id, Polygon::new(parts));
    }

    let mut joint = MicroJoint::new();
    for cell in &fixture.joint {
        joint.insert(
            &meta,
            &fixture.fitting_order,
            cell.codes.clone(),
            cell.weight,
        )?;
    }

    let mut categorical = MicroCategorical::new();
    for row in fixture.microdata {
        categorical.push(CategoricalRow {
            row_idx: row.row_idx,
            hh_id: row.hh_id,
            codes: row.codes,
            person_attrs: row.person_attrs,
        });
    }

    Ok(PipelineTables {
        meta,
        totals,
        marginals,
        joint,
        categorical,
        polygons,
    })
}

/// Convenience: reads, parses, and builds in one call.
pub fn load_pipeline_tables(path: &str) -> Result<PipelineTables, FixtureError> {
    build_pipeline_tables(load_fixture_file(path)?)
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "variables": [
                {"name": "v", "kind": "Categorical", "domain": [1, 2]}
            ],
            "fitting_order": ["v"],
            "areas": [
                {
                    "area_id": "A",
                    "total_population": 10.0,
                    "households": 2.0,
                    "marginals": {"v": {"1": 2.0, "2": 0.0}},
                    "polygon": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                }
            ],
            "joint": [
                {"codes": [1], "weight": 1.0},
                {"codes": [2], "weight": 1.0}
            ],
            "microdata": [
                {"row_idx": 0, "hh_id": "H1", "codes": [1], "person_attrs": {}},
                {"row_idx": 1, "hh_id": "H2", "codes": [2], "person_attrs": {}}
            ]
        }"#
    }

    #[test]
    fn test_build_pipeline_tables_from_fixture() {
        let fixture: Fixture = serde_json::from_str(sample_json()).unwrap();
        let tables = build_pipeline_tables(fixture).unwrap();
        assert_eq!(tables.totals.areas_of_interest(), vec!["A".to_string()]);
        assert_eq!(tables.joint.len(), 2);
        assert_eq!(tables.categorical.rows().len(), 2);
    }

    #[test]
    fn test_unknown_category_in_marginal_is_rejected() {
        let bad = sample_json().replace("\"1\": 2.0, \"2\": 0.0", "\"9\": 2.0");
        let fixture: Fixture = serde_json::from_str(&bad).unwrap();
        assert!(matches!(
            build_pipeline_tables(fixture),
            Err(FixtureError::UnknownCategory { .. })
        ));
    }
}
