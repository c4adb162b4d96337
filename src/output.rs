/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::AreaId;
use std::collections::HashMap;

/// A synthesized household instance (§4.6, §6): the fitted cell's
/// attribute tuple plus the point it was placed at.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdRecord {
    pub hh_serial: u64,
    pub area: AreaId,
    pub attrs: Vec<u32>,
    pub lon: f64,
    pub lat: f64,
}

/// A person belonging to a synthesized household, joined from
/// `MicroCategorical` by the `hh_id` of the drawn row (§4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct PersonRecord {
    pub hh_serial: u64,
    pub area: AreaId,
    pub person_attrs: HashMap<String, String>,
}

/// `(hh_serial, area_id, lon, lat)` rows — the coordinate half of the
/// output contract (§6).
#[derive(Debug, Clone, Default)]
pub struct HouseholdAssignments {
    pub rows: Vec<(u64, AreaId, f64, f64)>,
}

/// `(hh_serial, area_id, attr_v1, …)` rows (§6).
#[derive(Debug, Clone, Default)]
pub struct Households {
    pub records: Vec<HouseholdRecord>,
}

impl Households {
    pub fn assignments(&self) -> HouseholdAssignments {
        HouseholdAssignments {
            rows: self
                .records
                .iter()
                .map(|r| (r.hh_serial, r.area.clone(), r.lon, r.lat))
                .collect(),
        }
    }
}

/// `(hh_serial, area_id, person_attrs…)` rows (§6).
#[derive(Debug, Clone, Default)]
pub struct Persons {
    pub records: Vec<PersonRecord>,
}
