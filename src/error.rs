/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use std::fmt;

/// Identifies a small area by its declared `area_id` key.
pub type AreaId = String;

/// Errors arising from malformed input tables (§4.1). These are always
/// fatal: they indicate the excluded ingestion layer handed the core a
/// table that violates its data contract.
#[derive(thiserror::Error, Debug)]
pub enum KindError {
    #[error("unknown area '{0}'")]
    UnknownArea(AreaId),
    #[error("unknown category {code} for variable '{variable}'")]
    UnknownCategory { variable: String, code: u32 },
}

/// Per-area IPF outcome (§4.2, §7).
#[derive(thiserror::Error, Debug)]
pub enum FitError {
    #[error("area '{0}' did not converge within the iteration budget")]
    NotConverged(AreaId),
}

/// Integerization failures (§4.3, §7). Always fatal: a `NoProgress` result
/// indicates a logic bug rather than a data problem.
#[derive(thiserror::Error, Debug)]
pub enum IntegerizeError {
    #[error("area '{area}' made no progress correcting the integer total ({direction})")]
    NoProgress { area: AreaId, direction: &'static str },
}

/// Household-selection failures (§4.4, §7).
#[derive(thiserror::Error, Debug)]
pub enum SelectError {
    #[error("area '{area}' has a degenerate (zero-sum) probability row for cell {cell}")]
    DegenerateRow { area: AreaId, cell: usize },
}

/// Geographic placement failures (§4.5, §7).
#[derive(thiserror::Error, Debug)]
pub enum PlaceError {
    #[error("area '{0}' polygon is too sparse to place all households within the rejection budget")]
    PolygonTooSparse(AreaId),
}

/// The stage of the pipeline in which a fatal error originated, attached to
/// `SynthecoError` for diagnostic context (§7: "aggregated error with
/// context (area id, stage)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tables,
    Fitter,
    Integerizer,
    Selector,
    Placer,
    Orchestrator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Tables => "tables",
            Stage::Fitter => "fitter",
            Stage::Integerizer => "integerizer",
            Stage::Selector => "selector",
            Stage::Placer => "placer",
            Stage::Orchestrator => "orchestrator",
        };
        write!(f, "{}", s)
    }
}

/// Top-level error surfaced by a fatal failure. Wraps one of the five error
/// kinds with the stage it occurred in, per §7's propagation policy: fatal
/// errors abort the run and surface as an aggregated error with context.
#[derive(thiserror::Error, Debug)]
#[error("{stage}: {source}")]
pub struct SynthecoError {
    pub stage: Stage,
    #[source]
    pub source: SynthecoErrorKind,
}

#[derive(thiserror::Error, Debug)]
pub enum SynthecoErrorKind {
    #[error(transparent)]
    Kind(#[from] KindError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Integerize(#[from] IntegerizeError),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Place(#[from] PlaceError),
}

impl SynthecoError {
    pub fn new(stage: Stage, source: impl Into<SynthecoErrorKind>) -> SynthecoError {
        SynthecoError {
            stage,
            source: source.into(),
        }
    }
}
