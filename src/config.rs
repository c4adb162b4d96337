/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::Error;

/// Tuning parameters shared by every stage of the pipeline (§6). Backed by
/// a JSON config file, in the same spirit as `whitebox-common`'s
/// `Configs`/`settings.json` (but scoped to a single run rather than global
/// installation settings).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SynthecoConfig {
    /// Maximum number of IPF sweeps per area before declaring non-convergence.
    pub max_iter: usize,
    /// Convergence threshold on the maximum relative cell-weight change.
    pub rate_tolerance: f64,
    /// Minimum change in `max_rel` between sweeps to keep iterating.
    pub convergence_rate: f64,
    /// If true, any per-area fatal error aborts the whole run.
    pub fail_fast: bool,
    /// Categorical-affinity constant `alpha` used by the household selector.
    pub alpha: f64,
    /// Ordinal-affinity exponent `k` used by the household selector.
    pub k: f64,
    /// Worker pool width. 0 means "use the number of logical CPUs".
    pub pool_size: usize,
    /// Base seed combined with each area id to derive a per-area RNG.
    pub seed: u64,
    /// `max_rejects = max_rejects_multiplier * households_selected` for the placer.
    pub max_rejects_multiplier: usize,
    /// Restricts a run to the first N areas in declared order. Not part of
    /// the spec's algorithm; a debugging/testing convenience.
    pub debug_limit_areas: Option<usize>,
}

impl Default for SynthecoConfig {
    fn default() -> SynthecoConfig {
        SynthecoConfig {
            max_iter: 1000,
            rate_tolerance: 1e-6,
            convergence_rate: 1e-10,
            fail_fast: false,
            alpha: 0.0,
            k: 0.001,
            pool_size: 0,
            seed: 1,
            max_rejects_multiplier: 1000,
            debug_limit_areas: None,
        }
    }
}

impl SynthecoConfig {
    pub fn resolved_pool_size(&self) -> usize {
        if self.pool_size > 0 {
            self.pool_size
        } else {
            num_cpus::get()
        }
    }
}

/// Loads a `SynthecoConfig` from a JSON file, falling back to defaults if
/// the file does not exist or fails to parse, mirroring
/// `whitebox_common::configs::get_configs`.
pub fn load_config(path: &str) -> Result<SynthecoConfig, Error> {
    let config: SynthecoConfig = match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .unwrap_or_else(|_| SynthecoConfig::default()),
        Err(_) => SynthecoConfig::default(),
    };
    Ok(config)
}

/// Saves a `SynthecoConfig` to a JSON file, mirroring
/// `whitebox_common::configs::save_configs`.
pub fn save_config(path: &str, config: &SynthecoConfig) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(config)
        .expect("Error converting SynthecoConfig to JSON.");
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_pool_size_uses_cpus() {
        let config = SynthecoConfig::default();
        assert_eq!(config.resolved_pool_size(), num_cpus::get());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = load_config("/nonexistent/path/to/syntheco_config.json").unwrap();
        assert_eq!(config, SynthecoConfig::default());
    }
}
