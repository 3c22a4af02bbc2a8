// Continuous-space geometry on the torus, plus steering helpers.
//
// `Torus` wraps positions into [0, width) × [0, height) and measures
// shortest displacement and distance across the seams. `bearing` is the
// heading from one point to another. `advance` integrates one movement step
// along a heading and returns the wrapped destination.
//
// These helpers are pure: they compute positions but never move anything.
// Moves always go through `EntityCollection::move_entity`, which keeps the
// spatial index in sync.
//
// Note that `bearing` uses the straight (non-wrapped) displacement. Steering
// toward something across a seam therefore points the long way round; the
// animal still reaches it because the world wraps.
//
// See also: `spatial.rs` for the distance-based queries built on `Torus`,
// `lifecycle.rs` for the animal movement that calls `advance`.

use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Dimensions of a wrapping plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Torus {
    pub width: f64,
    pub height: f64,
}

impl Torus {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Wrap one coordinate into `[0, extent)`.
    pub fn wrap_coord(value: f64, extent: f64) -> f64 {
        let wrapped = value.rem_euclid(extent);
        // rem_euclid can round up to `extent` for tiny negative inputs.
        if wrapped >= extent { 0.0 } else { wrapped }
    }

    pub fn wrap(&self, p: Point) -> Point {
        Point::new(
            Self::wrap_coord(p.x, self.width),
            Self::wrap_coord(p.y, self.height),
        )
    }

    /// Shortest absolute separation along one axis.
    pub fn axis_gap(a: f64, b: f64, extent: f64) -> f64 {
        let d = (a - b).abs() % extent;
        if d > extent / 2.0 { extent - d } else { d }
    }

    /// Shortest distance between two points across the seams.
    pub fn distance(&self, a: Point, b: Point) -> f64 {
        let dx = Self::axis_gap(a.x, b.x, self.width);
        let dy = Self::axis_gap(a.y, b.y, self.height);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Normalize an angle into [0, 2π).
pub fn normalize_angle(angle: f64) -> f64 {
    Torus::wrap_coord(angle, TAU)
}

/// Heading from `from` toward `to`, normalized into [0, 2π).
pub fn bearing(from: Point, to: Point) -> f64 {
    normalize_angle((to.y - from.y).atan2(to.x - from.x))
}

/// Destination after moving from `start` along `heading + offset` for
/// `elapsed` time units at `speed`, scaled by `scale`, wrapped onto `torus`.
pub fn advance(
    torus: &Torus,
    start: Point,
    heading: f64,
    offset: f64,
    speed: f64,
    elapsed: f64,
    scale: f64,
) -> Point {
    let angle = heading + offset;
    let step = speed * elapsed * scale;
    torus.wrap(Point::new(
        start.x + angle.cos() * step,
        start.y + angle.sin() * step,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::GameRng;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn wrap_lands_inside_world_for_any_offset() {
        let torus = Torus::new(10.0, 7.0);
        let mut rng = GameRng::new(8);
        for _ in 0..10_000 {
            let p = Point::new(rng.range_f64(0.0, 10.0), rng.range_f64(0.0, 7.0));
            let d = Point::new(rng.range_f64(-500.0, 500.0), rng.range_f64(-500.0, 500.0));
            let w = torus.wrap(Point::new(p.x + d.x, p.y + d.y));
            assert!((0.0..10.0).contains(&w.x), "x {} out of range", w.x);
            assert!((0.0..7.0).contains(&w.y), "y {} out of range", w.y);
        }
        let tiny = torus.wrap(Point::new(-1e-18, -1e-18));
        assert!(tiny.x < 10.0 && tiny.y < 7.0);
    }

    #[test]
    fn distance_takes_the_short_way_across_seams() {
        let torus = Torus::new(100.0, 50.0);
        let a = Point::new(1.0, 1.0);
        let b = Point::new(99.0, 49.0);
        let d = torus.distance(a, b);
        assert!((d - 8.0_f64.sqrt()).abs() < 1e-9, "got {d}");
        assert_eq!(torus.distance(a, b), torus.distance(b, a));
    }

    #[test]
    fn bearing_points_along_displacement() {
        let origin = Point::new(5.0, 5.0);
        assert!((bearing(origin, Point::new(6.0, 5.0)) - 0.0).abs() < 1e-12);
        assert!((bearing(origin, Point::new(5.0, 6.0)) - FRAC_PI_2).abs() < 1e-12);
        assert!((bearing(origin, Point::new(4.0, 5.0)) - PI).abs() < 1e-12);
        let down = bearing(origin, Point::new(5.0, 4.0));
        assert!((down - 3.0 * FRAC_PI_2).abs() < 1e-12, "normalized, got {down}");
    }

    #[test]
    fn advance_moves_by_speed_elapsed_scale() {
        let torus = Torus::new(20.0, 20.0);
        let p = advance(&torus, Point::new(10.0, 10.0), 0.0, 0.0, 0.5, 4.0, 0.1);
        assert!((p.x - 10.2).abs() < 1e-12);
        assert!((p.y - 10.0).abs() < 1e-12);

        let back = advance(&torus, Point::new(10.0, 10.0), 0.0, PI, 0.5, 4.0, 0.1);
        assert!((back.x - 9.8).abs() < 1e-12, "offset π reverses direction");
    }

    #[test]
    fn advance_wraps_across_the_edge() {
        let torus = Torus::new(20.0, 20.0);
        let p = advance(&torus, Point::new(19.95, 0.05), FRAC_PI_2 * 3.0, 0.0, 1.0, 1.0, 0.1);
        assert!(p.y > 19.0, "moved up across the top seam, got {}", p.y);
        assert!((0.0..20.0).contains(&p.x));
    }

    #[test]
    fn normalize_angle_folds_into_one_turn() {
        assert!((normalize_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-12);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < 1e-9);
        assert_eq!(normalize_angle(0.0), 0.0);
    }
}
