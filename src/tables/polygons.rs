/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::{AreaId, KindError};
use crate::geometry::Polygon;
use std::collections::HashMap;

/// `area_id -> polygon` in WGS 84 (§3, §6).
#[derive(Debug, Clone, Default)]
pub struct PolygonSet {
    polygons: HashMap<AreaId, Polygon>,
}

impl PolygonSet {
    pub fn new() -> PolygonSet {
        PolygonSet {
            polygons: HashMap::new(),
        }
    }

    pub fn insert(&mut self, area: &str, polygon: Polygon) {
        self.polygons.insert(area.to_string(), polygon);
    }

    pub fn get(&self, area: &str) -> Result<&Polygon, KindError> {
        self.polygons
            .get(area)
            .ok_or_else(|| KindError::UnknownArea(area.to_string()))
    }
}
