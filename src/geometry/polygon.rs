/*
This code is part of the syntheco population synthesis library.
License: MIT
*/

use super::{BoundingBox, Point2D};

/// Tests if a point is Left|On|Right of an infinite line, based on
/// http://geomalgorithms.com/a03-_inclusion.html.
fn is_left(p0: &Point2D, p1: &Point2D, p2: &Point2D) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Winding number test for a point in a ring. `ring` must be closed
/// (`ring[0] == ring[last]`).
fn winding_number(p: &Point2D, ring: &[Point2D]) -> i32 {
    let mut wn = 0i32;
    for i in 0..ring.len() - 1 {
        if ring[i].y <= p.y {
            if ring[i + 1].y > p.y && is_left(&ring[i], &ring[i + 1], p) > 0f64 {
                wn += 1;
            }
        } else if ring[i + 1].y <= p.y && is_left(&ring[i], &ring[i + 1], p) < 0f64 {
            wn -= 1;
        }
    }
    wn
}

/// Returns true if `p` lies exactly on one of the ring's edges (inclusive
/// endpoints). Used so that `Polygon::contains` can treat the boundary as
/// inside, unlike the plain winding-number test which excludes it.
fn on_boundary(p: &Point2D, ring: &[Point2D]) -> bool {
    for i in 0..ring.len() - 1 {
        let a = &ring[i];
        let b = &ring[i + 1];
        let cross = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if cross.abs() > std::f64::EPSILON {
            continue;
        }
        let within_x = p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x);
        let within_y = p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y);
        if within_x && within_y {
            return true;
        }
    }
    false
}

/// A possibly multipart polygon in WGS 84, stored as a list of closed rings
/// (each ring's first and last vertex coincide). No distinction is drawn
/// between outer rings and holes: containment is the union of all parts,
/// since the spec's Non-goals exclude verifying polygon topology.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub parts: Vec<Vec<Point2D>>,
    pub bounding_box: BoundingBox,
}

impl Polygon {
    pub fn new(parts: Vec<Vec<Point2D>>) -> Polygon {
        let mut bounding_box = BoundingBox::default();
        for part in &parts {
            bounding_box.expand_to(BoundingBox::from_points(part));
        }
        Polygon {
            parts,
            bounding_box,
        }
    }

    /// Boundary-inclusive point-in-polygon test, per the placer's
    /// "accept iff polygon contains it (boundary inclusive)" rule.
    pub fn contains(&self, p: &Point2D) -> bool {
        if !self.bounding_box.contains(p) {
            return false;
        }
        for part in &self.parts {
            if part.len() < 4 {
                continue;
            }
            if on_boundary(p, part) || winding_number(p, part) % 2 != 0 {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, 0.0),
        ]])
    }

    #[test]
    fn test_contains_interior() {
        let poly = unit_square();
        assert!(poly.contains(&Point2D::new(0.5, 0.5)));
    }

    #[test]
    fn test_contains_boundary() {
        let poly = unit_square();
        assert!(poly.contains(&Point2D::new(0.0, 0.5)));
        assert!(poly.contains(&Point2D::new(1.0, 1.0)));
        assert!(poly.contains(&Point2D::new(0.5, 0.0)));
    }

    #[test]
    fn test_contains_exterior() {
        let poly = unit_square();
        assert_eq!(poly.contains(&Point2D::new(1.5, 0.5)), false);
        assert_eq!(poly.contains(&Point2D::new(-0.1, 0.5)), false);
    }

    #[test]
    fn test_multipart() {
        let poly = Polygon::new(vec![
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 0.0),
                Point2D::new(1.0, 1.0),
                Point2D::new(0.0, 1.0),
                Point2D::new(0.0, 0.0),
            ],
            vec![
                Point2D::new(10.0, 10.0),
                Point2D::new(11.0, 10.0),
                Point2D::new(11.0, 11.0),
                Point2D::new(10.0, 11.0),
                Point2D::new(10.0, 10.0),
            ],
        ]);
        assert!(poly.contains(&Point2D::new(10.5, 10.5)));
        assert!(poly.contains(&Point2D::new(0.5, 0.5)));
        assert_eq!(poly.contains(&Point2D::new(5.0, 5.0)), false);
    }
}
