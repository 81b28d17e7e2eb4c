//! Crossing test between a straight-line token move and a zone rectangle.
//!
//! Everything here is pure and O(1). Edges are inclusive: a centre that lands
//! exactly on a zone edge counts as a crossing.

use crate::types::{Point, Rect, Size};

/// Does a token move from `from` to `to` (top-left corners) with the given
/// `footprint` (map units) cross or land inside `bounds`?
///
/// The test runs on the token's centre before and after the move.
pub fn intersects(bounds: &Rect, from: Point, to: Point, footprint: Size) -> bool {
    let start = from.centred(footprint);
    let end = to.centred(footprint);

    contains(bounds, end)
        || bounds
            .edges()
            .iter()
            .any(|(a, b)| segments_intersect(start, end, *a, *b))
}

/// Inclusive point-in-rectangle test. Used on its own when no pre-move
/// position is known.
pub fn contains(bounds: &Rect, point: Point) -> bool {
    point.x >= bounds.x
        && point.y >= bounds.y
        && point.x <= bounds.max_x()
        && point.y <= bounds.max_y()
}

/// Closed segment intersection, including touching endpoints and collinear
/// overlap.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Cross product of `(b - a) x (c - a)`; sign gives the turn direction.
fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// `p` is known collinear with `a`-`b`; is it within their bounding box?
fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: f32 = 50.0;

    fn zone() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 100.0)
    }

    fn one_cell() -> Size {
        Size::new(GRID, GRID)
    }

    #[test]
    fn move_into_zone_intersects() {
        assert!(intersects(
            &zone(),
            Point::new(200.0, 200.0),
            Point::new(50.0, 50.0),
            one_cell()
        ));
    }

    #[test]
    fn move_short_of_zone_misses() {
        assert!(!intersects(
            &zone(),
            Point::new(200.0, 200.0),
            Point::new(150.0, 150.0),
            one_cell()
        ));
    }

    #[test]
    fn destination_on_edge_intersects() {
        // Centre lands on (100, 50), the right edge.
        assert!(intersects(
            &zone(),
            Point::new(300.0, 25.0),
            Point::new(75.0, 25.0),
            one_cell()
        ));
    }

    #[test]
    fn move_straight_through_zone_intersects() {
        // Both endpoints outside, path passes through the middle.
        assert!(intersects(
            &zone(),
            Point::new(-200.0, 25.0),
            Point::new(300.0, 25.0),
            one_cell()
        ));
    }

    #[test]
    fn move_alongside_zone_misses() {
        assert!(!intersects(
            &zone(),
            Point::new(-200.0, 200.0),
            Point::new(300.0, 200.0),
            one_cell()
        ));
    }

    #[test]
    fn grazing_the_corner_counts() {
        // Path centre line passes exactly through (100, 0).
        assert!(intersects(
            &zone(),
            Point::new(25.0, -125.0),
            Point::new(125.0, 75.0),
            one_cell()
        ));
    }

    #[test]
    fn contains_is_inclusive() {
        let z = zone();
        assert!(contains(&z, Point::new(0.0, 0.0)));
        assert!(contains(&z, Point::new(100.0, 100.0)));
        assert!(!contains(&z, Point::new(100.1, 50.0)));
    }

    #[test]
    fn collinear_overlap_intersects() {
        assert!(segments_intersect(
            Point::new(-10.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        ));
        assert!(!segments_intersect(
            Point::new(-10.0, 0.0),
            Point::new(-5.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        ));
    }
}
