/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use crate::error::PlaceError;
use crate::geometry::{Point2D, Polygon};
use rand::Rng;

/// Draws one point uniformly from `polygon`'s bounding box, via rejection
/// sampling against `polygon.contains` (§4.5). Each rejected draw consumes
/// one trial from `remaining_trials`, a budget shared across the whole
/// area's placements; gives up once it is exhausted.
fn place_one(
    area: &str,
    polygon: &Polygon,
    remaining_trials: &mut usize,
    rng: &mut impl Rng,
) -> Result<Point2D, PlaceError> {
    let bb = &polygon.bounding_box;
    loop {
        if *remaining_trials == 0 {
            return Err(PlaceError::PolygonTooSparse(area.to_string()));
        }
        *remaining_trials -= 1;
        let x = rng.gen_range(bb.min_x..=bb.max_x);
        let y = rng.gen_range(bb.min_y..=bb.max_y);
        let p = Point2D::new(x, y);
        if polygon.contains(&p) {
            return Ok(p);
        }
    }
}

/// Places `n` households within `polygon` (§4.5). `max_rejects` is one hard
/// stop on total trials across the *whole* area's `n` placements, per
/// `max_rejects = max_rejects_multiplier * n` (§4.5, §6) — not reset for
/// each household.
pub fn place_households(
    area: &str,
    polygon: &Polygon,
    n: usize,
    max_rejects_multiplier: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Point2D>, PlaceError> {
    let mut remaining_trials = max_rejects_multiplier.saturating_mul(n);
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        points.push(place_one(area, polygon, &mut remaining_trials, rng)?);
    }
    Ok(points)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn unit_square() -> Polygon {
        Polygon::new(vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, 0.0),
        ]])
    }

    /// Scenario 6 (spec.md §8): unit square, 100 points, every point lands
    /// in `[0,1]^2`.
    #[test]
    fn test_scenario_six_points_within_unit_square() {
        let polygon = unit_square();
        let mut rng = SmallRng::seed_from_u64(7);
        let points = place_households("A", &polygon, 100, 1000, &mut rng).unwrap();
        assert_eq!(points.len(), 100);
        for p in &points {
            assert!(p.x >= 0.0 && p.x <= 1.0);
            assert!(p.y >= 0.0 && p.y <= 1.0);
        }
    }

    #[test]
    fn test_zero_households_is_empty() {
        let polygon = unit_square();
        let mut rng = SmallRng::seed_from_u64(1);
        let points = place_households("A", &polygon, 0, 1000, &mut rng).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_degenerate_polygon_reports_too_sparse() {
        // A "ring" with fewer than 4 points only ever contributes to the
        // bounding box (`Polygon::contains` skips it), so no draw inside
        // this box can ever land inside the polygon — every draw rejects.
        let polygon = Polygon::new(vec![vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 10.0)]]);
        let mut rng = SmallRng::seed_from_u64(1);
        let result = place_households("A", &polygon, 1, 10, &mut rng);
        assert!(matches!(result, Err(PlaceError::PolygonTooSparse(_))));
    }
}
