/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::config::SynthecoConfig;
use crate::error::{AreaId, FitError, Stage, SynthecoError, SynthecoErrorKind};
use crate::fitter::FitOutcome;
use crate::integerizer::{integerize, IntegerCell};
use crate::output::{HouseholdRecord, Households, PersonRecord, Persons};
use crate::selector::SelectedHousehold;
use crate::stages::{make_fitter, make_placer, make_selector, StageKind};
use crate::tables::{GlobalTotals, Marginals, MicroCategorical, MicroJoint, PolygonSet, VariableMetadata};
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Instant;

/// The read-only input tables the orchestrator partitions work over (§3,
/// §5: "Input tables ... are read-only and shared by reference").
#[derive(Debug, Clone, Default)]
pub struct PipelineTables {
    pub meta: VariableMetadata,
    pub totals: GlobalTotals,
    pub marginals: Marginals,
    pub joint: MicroJoint,
    pub categorical: MicroCategorical,
    pub polygons: PolygonSet,
}

/// Per-area outcome, accumulated into the run's `RunReport` (§7: "per-area
/// soft failures accumulate into a report").
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub areas_considered: usize,
    pub areas_emitted: usize,
    pub areas_failed: Vec<(AreaId, Stage, String)>,
    pub households_total: usize,
    pub persons_total: usize,
}

/// Combines a base seed and an area id into a per-area RNG seed (§5: "no
/// shared RNG: each worker uses a per-area RNG seeded from the area
/// identifier"), independent of scheduling order.
fn area_seed(base_seed: u64, area: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    base_seed.hash(&mut hasher);
    area.hash(&mut hasher);
    hasher.finish()
}

/// Runs `work` over `items` using a fixed-size worker pool, the same
/// Arc<Mutex<iterator>> + mpsc "next tile" idiom used throughout the
/// raster/vector tools' multithreading setup. Results are returned in
/// `items`' original order, not completion order (§5).
fn run_pool<T, R, F>(pool_size: usize, items: Vec<T>, work: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    if items.is_empty() {
        return Vec::new();
    }
    let num_workers = pool_size.max(1).min(items.len());
    let work = Arc::new(work);
    let queue = Arc::new(Mutex::new(items.into_iter().enumerate()));
    let (tx, rx) = mpsc::channel();

    for _ in 0..num_workers {
        let queue = queue.clone();
        let tx = tx.clone();
        let work = work.clone();
        thread::spawn(move || loop {
            let next = queue.lock().unwrap().next();
            match next {
                Some((idx, item)) => {
                    let result = work(item);
                    if tx.send((idx, result)).is_err() {
                        break;
                    }
                }
                None => break,
            }
        });
    }
    drop(tx);

    let mut results: Vec<(usize, R)> = rx.iter().collect();
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, r)| r).collect()
}

enum Phase1Outcome {
    Emitted {
        area: AreaId,
        selected: Vec<SelectedHousehold>,
    },
    Failed {
        area: AreaId,
        stage: Stage,
        cause: SynthecoErrorKind,
        /// §7: `IntegerizeError::NoProgress` and `KindError` abort the run
        /// unconditionally; `FitError`/`SelectError` only abort when
        /// `fail_fast` is set.
        always_fatal: bool,
    },
    Cancelled {
        area: AreaId,
    },
}

/// Runs Fitter -> Integerizer -> Selector for one area (§4.6, first pool
/// phase of §5).
fn run_phase_one(
    area: AreaId,
    tables: &Arc<PipelineTables>,
    config: &SynthecoConfig,
    cancel: &Arc<AtomicBool>,
) -> Phase1Outcome {
    if cancel.load(Ordering::Relaxed) {
        return Phase1Outcome::Cancelled { area };
    }

    let n_houses = match tables.totals.households(&area) {
        Ok(h) => h,
        Err(e) => {
            cancel.store(true, Ordering::Relaxed);
            return Phase1Outcome::Failed {
                area,
                stage: Stage::Tables,
                cause: e.into(),
                always_fatal: true,
            };
        }
    };

    let fitting_vars = tables.meta.fitting_variables();
    let targets = tables.marginals.project(&area);
    let fitter = make_fitter(StageKind::default());
    let fitted = match fitter.fit(&tables.joint, &targets, fitting_vars, n_houses, config) {
        FitOutcome::Empty => {
            return Phase1Outcome::Emitted {
                area,
                selected: Vec::new(),
            }
        }
        FitOutcome::Converged { fitted, .. } => fitted,
        FitOutcome::NotConverged { .. } => {
            if config.fail_fast {
                cancel.store(true, Ordering::Relaxed);
            }
            return Phase1Outcome::Failed {
                stage: Stage::Fitter,
                cause: FitError::NotConverged(area.clone()).into(),
                area,
                always_fatal: false,
            };
        }
    };

    let mut rng = SmallRng::seed_from_u64(area_seed(config.seed, &area));

    let cells: Vec<IntegerCell> = match integerize(&area, &fitted, n_houses, &mut rng) {
        Ok(cells) => cells,
        Err(e) => {
            // IntegerizeError::NoProgress is always fatal (§7), regardless
            // of fail_fast.
            cancel.store(true, Ordering::Relaxed);
            return Phase1Outcome::Failed {
                stage: Stage::Integerizer,
                cause: e.into(),
                area,
                always_fatal: true,
            };
        }
    };

    if cells.is_empty() {
        return Phase1Outcome::Emitted {
            area,
            selected: Vec::new(),
        };
    }

    let selector = make_selector(StageKind::default());
    let selected = match selector.select(
        &area,
        &cells,
        &tables.categorical,
        &tables.meta,
        fitting_vars,
        config.alpha,
        config.k,
        &mut rng,
    ) {
        Ok(s) => s,
        Err(e) => {
            if config.fail_fast {
                cancel.store(true, Ordering::Relaxed);
            }
            return Phase1Outcome::Failed {
                stage: Stage::Selector,
                cause: e.into(),
                area,
                always_fatal: false,
            };
        }
    };

    Phase1Outcome::Emitted { area, selected }
}

enum Phase2Outcome {
    Placed {
        area: AreaId,
        points: Vec<crate::geometry::Point2D>,
    },
    Failed {
        area: AreaId,
        stage: Stage,
        cause: SynthecoErrorKind,
        /// §7: `KindError` aborts the run unconditionally; `PlaceError`
        /// only aborts when `fail_fast` is set.
        always_fatal: bool,
    },
    Cancelled {
        area: AreaId,
    },
}

/// Runs the Placer for one area that survived phase one (second pool
/// phase of §5).
fn run_phase_two(
    area: AreaId,
    n: usize,
    tables: &Arc<PipelineTables>,
    config: &SynthecoConfig,
    cancel: &Arc<AtomicBool>,
) -> Phase2Outcome {
    if cancel.load(Ordering::Relaxed) {
        return Phase2Outcome::Cancelled { area };
    }
    let polygon = match tables.polygons.get(&area) {
        Ok(p) => p,
        Err(e) => {
            cancel.store(true, Ordering::Relaxed);
            return Phase2Outcome::Failed {
                area,
                stage: Stage::Tables,
                cause: e.into(),
                always_fatal: true,
            };
        }
    };
    let mut rng = SmallRng::seed_from_u64(area_seed(config.seed, &area).wrapping_add(1));
    let placer = make_placer(StageKind::default());
    match placer.place(&area, polygon, n, config.max_rejects_multiplier, &mut rng) {
        Ok(points) => Phase2Outcome::Placed { area, points },
        Err(e) => {
            if config.fail_fast {
                cancel.store(true, Ordering::Relaxed);
            }
            Phase2Outcome::Failed {
                stage: Stage::Placer,
                cause: e.into(),
                area,
                always_fatal: false,
            }
        }
    }
}

/// Drives the full pipeline over every area of interest (§4.6). Areas are
/// partitioned across a fixed-size worker pool in two phases, per §5:
/// Fitter->Integerizer->Selector first, then the Placer over whatever
/// phase one emitted. Assembly back into `Households`/`Persons` happens
/// single-threaded afterward, in declared area order, so hh_serial
/// assignment is deterministic and independent of `pool_size`.
pub fn run(
    tables: PipelineTables,
    config: &SynthecoConfig,
) -> Result<(Households, Persons, RunReport), SynthecoError> {
    let start = Instant::now();
    let tables = Arc::new(tables);

    let mut areas = tables.totals.areas_of_interest();
    if let Some(limit) = config.debug_limit_areas {
        areas.truncate(limit);
    }
    info!("starting run over {} areas", areas.len());

    let mut report = RunReport {
        areas_considered: areas.len(),
        ..RunReport::default()
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let pool_size = config.resolved_pool_size();

    let phase1 = {
        let tables = tables.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        run_pool(pool_size, areas, move |area| {
            run_phase_one(area, &tables, &config, &cancel)
        })
    };

    let mut phase2_input: Vec<(AreaId, Vec<SelectedHousehold>)> = Vec::new();
    for outcome in phase1 {
        match outcome {
            Phase1Outcome::Emitted { area, selected } => {
                phase2_input.push((area, selected));
            }
            Phase1Outcome::Failed {
                area,
                stage,
                cause,
                always_fatal,
            } => {
                warn!("area '{}' failed at {}: {}", area, stage, cause);
                if always_fatal || config.fail_fast {
                    return Err(SynthecoError::new(stage, cause));
                }
                report.areas_failed.push((area, stage, cause.to_string()));
            }
            Phase1Outcome::Cancelled { area } => {
                warn!("area '{}' cancelled before completing selection", area);
            }
        }
    }

    let placer_work: Vec<(AreaId, usize)> = phase2_input
        .iter()
        .map(|(area, selected)| (area.clone(), selected.len()))
        .collect();

    let phase2 = {
        let tables = tables.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        run_pool(pool_size, placer_work, move |(area, n)| {
            run_phase_two(area, n, &tables, &config, &cancel)
        })
    };

    let mut points_by_area: std::collections::HashMap<AreaId, Vec<crate::geometry::Point2D>> =
        std::collections::HashMap::new();
    for outcome in phase2 {
        match outcome {
            Phase2Outcome::Placed { area, points } => {
                points_by_area.insert(area, points);
            }
            Phase2Outcome::Failed {
                area,
                stage,
                cause,
                always_fatal,
            } => {
                warn!("area '{}' failed at {}: {}", area, stage, cause);
                if always_fatal || config.fail_fast {
                    return Err(SynthecoError::new(stage, cause));
                }
                report.areas_failed.push((area, stage, cause.to_string()));
            }
            Phase2Outcome::Cancelled { area } => {
                warn!("area '{}' cancelled before placement", area);
            }
        }
    }

    let mut households = Households::default();
    let mut persons = Persons::default();
    let mut hh_serial: u64 = 0;

    for (area, selected) in phase2_input {
        let points = match points_by_area.get(&area) {
            Some(p) => p,
            None => continue,
        };
        if points.len() != selected.len() {
            // The area failed placement (or was cancelled); already
            // recorded in the failure report above.
            continue;
        }
        report.areas_emitted += 1;
        for (household, point) in selected.iter().zip(points.iter()) {
            hh_serial += 1;
            households.records.push(HouseholdRecord {
                hh_serial,
                area: area.clone(),
                attrs: household.codes.clone(),
                lon: point.x,
                lat: point.y,
            });
            report.households_total += 1;
            for row in tables
                .categorical
                .get_by_row_idx(household.row_idx)
                .map(|r| tables.categorical.rows_for_household(&r.hh_id))
                .unwrap_or_default()
            {
                persons.records.push(PersonRecord {
                    hh_serial,
                    area: area.clone(),
                    person_attrs: row.person_attrs.clone(),
                });
                report.persons_total += 1;
            }
        }
    }

    info!(
        "run finished in {}: {} areas emitted, {} failed, {} households",
        crate::utils::get_formatted_elapsed_time(start),
        report.areas_emitted,
        report.areas_failed.len(),
        report.households_total
    );

    Ok((households, persons, report))
}
