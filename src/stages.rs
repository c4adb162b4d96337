/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

//! Stage-capability traits (§9): one trait per pipeline stage (Fitter,
//! Selector, Placer), plus a factory keyed on `StageKind`. There is
//! exactly one algorithm per stage today, invoked directly through its
//! boxed trait object — the traits exist to document the seam the
//! orchestrator calls through, so a second algorithm can be added later
//! without the orchestrator changing.

use crate::config::SynthecoConfig;
use crate::error::{PlaceError, SelectError};
use crate::fitter::{fit_area, FitOutcome};
use crate::geometry::{Point2D, Polygon};
use crate::integerizer::IntegerCell;
use crate::placer::place_households;
use crate::selector::{select_households, SelectedHousehold};
use crate::tables::{MicroCategorical, MicroJoint, VariableMetadata};
use rand::RngCore;
use std::collections::HashMap;

/// Fits a single area's joint distribution against its marginals (§4.2).
pub trait FitStage {
    fn fit(
        &self,
        joint: &MicroJoint,
        targets: &HashMap<String, HashMap<u32, f64>>,
        fitting_vars: &[String],
        n_houses: f64,
        config: &SynthecoConfig,
    ) -> FitOutcome;
}

/// Draws a microdata row to stand in for each integerized cell (§4.4).
pub trait SelectStage {
    #[allow(clippy::too_many_arguments)]
    fn select(
        &self,
        area: &str,
        cells: &[IntegerCell],
        categorical: &MicroCategorical,
        meta: &VariableMetadata,
        fitting_vars: &[String],
        alpha: f64,
        k: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<SelectedHousehold>, SelectError>;
}

/// Places `n` households within an area's polygon (§4.5).
pub trait PlaceStage {
    fn place(
        &self,
        area: &str,
        polygon: &Polygon,
        n: usize,
        max_rejects_multiplier: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Point2D>, PlaceError>;
}

/// The IPF fitter described in §4.2.
#[derive(Debug, Default)]
pub struct IpfFitter;

impl FitStage for IpfFitter {
    fn fit(
        &self,
        joint: &MicroJoint,
        targets: &HashMap<String, HashMap<u32, f64>>,
        fitting_vars: &[String],
        n_houses: f64,
        config: &SynthecoConfig,
    ) -> FitOutcome {
        fit_area(joint, targets, fitting_vars, n_houses, config)
    }
}

/// The distance-weighted selector described in §4.4.
#[derive(Debug, Default)]
pub struct DistanceWeightedSelector;

impl SelectStage for DistanceWeightedSelector {
    fn select(
        &self,
        area: &str,
        cells: &[IntegerCell],
        categorical: &MicroCategorical,
        meta: &VariableMetadata,
        fitting_vars: &[String],
        alpha: f64,
        k: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<SelectedHousehold>, SelectError> {
        select_households(area, cells, categorical, meta, fitting_vars, alpha, k, rng)
    }
}

/// The rejection-sampling placer described in §4.5.
#[derive(Debug, Default)]
pub struct RejectionSamplingPlacer;

impl PlaceStage for RejectionSamplingPlacer {
    fn place(
        &self,
        area: &str,
        polygon: &Polygon,
        n: usize,
        max_rejects_multiplier: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Point2D>, PlaceError> {
        place_households(area, polygon, n, max_rejects_multiplier, rng)
    }
}

/// Selects which concrete algorithm each stage factory returns. A single
/// variant today; a second algorithm would add a variant here rather than
/// touching the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageKind {
    #[default]
    Default,
}

pub fn make_fitter(kind: StageKind) -> Box<dyn FitStage> {
    match kind {
        StageKind::Default => Box::new(IpfFitter),
    }
}

pub fn make_selector(kind: StageKind) -> Box<dyn SelectStage> {
    match kind {
        StageKind::Default => Box::new(DistanceWeightedSelector),
    }
}

pub fn make_placer(kind: StageKind) -> Box<dyn PlaceStage> {
    match kind {
        StageKind::Default => Box::new(RejectionSamplingPlacer),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::{CategoricalRow, VariableKind};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_factory_returns_default_stages() {
        let fitter = make_fitter(StageKind::default());
        let selector = make_selector(StageKind::default());
        let placer = make_placer(StageKind::default());

        let mut meta = VariableMetadata::new();
        meta.declare("v", VariableKind::Categorical, vec![1, 2]);
        let vars = vec!["v".to_string()];
        let mut joint = MicroJoint::new();
        joint.insert(&meta, &vars, vec![1], 1.0).unwrap();
        joint.insert(&meta, &vars, vec![2], 1.0).unwrap();
        let mut targets = HashMap::new();
        let mut v_target = HashMap::new();
        v_target.insert(1, 2.0);
        v_target.insert(2, 0.0);
        targets.insert("v".to_string(), v_target);
        let config = SynthecoConfig::default();
        match fitter.fit(&joint, &targets, &vars, 2.0, &config) {
            FitOutcome::Converged { .. } => {}
            other => panic!("expected convergence, got {:?}", other),
        }

        let mut categorical = MicroCategorical::new();
        categorical.push(CategoricalRow {
            row_idx: 0,
            hh_id: "H1".to_string(),
            codes: vec![1],
            person_attrs: Default::default(),
        });
        let cells = vec![IntegerCell {
            codes: vec![1],
            count: 1,
        }];
        let mut rng = SmallRng::seed_from_u64(1);
        let selected = selector
            .select("A", &cells, &categorical, &meta, &vars, 0.0, 0.001, &mut rng)
            .unwrap();
        assert_eq!(selected.len(), 1);

        let polygon = Polygon::new(vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, 0.0),
        ]]);
        let points = placer.place("A", &polygon, 3, 1000, &mut rng).unwrap();
        assert_eq!(points.len(), 3);
    }
}
