//! Narrow-phase collision tests between discs and line segments
//!
//! Pure predicates: disc vs disc, disc vs segment at an instant, and disc vs
//! segment swept along a path. The swept test is what keeps fast bodies
//! from tunneling through thin walls.

use glam::Vec2;

use super::wall::Segment;
use crate::consts::SWEEP_STEP_FRACTION;

/// Bisection passes used to tighten a swept contact
const REFINE_ITERATIONS: u32 = 8;

/// Below this squared distance two points are considered coincident
const COINCIDENT_SQ: f32 = 1e-12;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Whether a collision occurred
    pub hit: bool,
    /// Fraction along the swept path where contact starts (0 for instantaneous tests)
    pub fraction: f32,
    /// Closest point on the obstacle
    pub point: Vec2,
    /// Disc centre at the moment of contact
    pub position: Vec2,
    /// Unit normal pointing from the obstacle toward the disc
    pub normal: Vec2,
    /// Overlap depth at the moment of contact
    pub penetration: f32,
}

impl Contact {
    pub fn miss() -> Self {
        Self {
            hit: false,
            fraction: 1.0,
            point: Vec2::ZERO,
            position: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// True iff the centre distance is less than the sum of the radii
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) < reach * reach
}

/// Closest point on a segment to `p`
///
/// Degenerate segments collapse to their start point.
pub fn closest_point_on_segment(p: Vec2, segment: &Segment) -> Vec2 {
    if segment.is_degenerate() {
        return segment.start;
    }
    let line = segment.direction();
    let t = ((p - segment.start).dot(line) / segment.length_squared()).clamp(0.0, 1.0);
    segment.start + line * t
}

/// Unit normal from the wall toward a disc centre
///
/// If the centre sits exactly on the segment, the segment's perpendicular
/// is used; if the segment is also degenerate, +X.
pub fn wall_normal(center: Vec2, segment: &Segment) -> Vec2 {
    let closest = closest_point_on_segment(center, segment);
    let away = center - closest;
    if away.length_squared() > COINCIDENT_SQ {
        return away.normalize();
    }
    if segment.is_degenerate() {
        return Vec2::X;
    }
    segment.direction().perp().normalize()
}

/// Instantaneous disc vs segment test
pub fn disc_segment_contact(center: Vec2, radius: f32, segment: &Segment) -> Contact {
    let closest = closest_point_on_segment(center, segment);
    let dist = center.distance(closest);
    if dist >= radius {
        return Contact::miss();
    }
    Contact {
        hit: true,
        fraction: 0.0,
        point: closest,
        position: center,
        normal: wall_normal(center, segment),
        penetration: radius - dist,
    }
}

/// Swept disc vs segment test with the default sub-step size
pub fn swept_disc_segment(start: Vec2, end: Vec2, radius: f32, segment: &Segment) -> Contact {
    swept_disc_segment_with_step(start, end, radius, segment, SWEEP_STEP_FRACTION)
}

/// Swept disc vs segment test
///
/// The path is cut into samples no further apart than `radius * step_fraction`,
/// so no sub-step can skip over a segment thinner than the disc. Samples are
/// tested in order and the first overlap wins; a disc already overlapping at
/// `start` reports fraction 0. The first hit is then tightened by bisection
/// against the last clear sample.
///
/// A wall end that only grazes the path can fall between two samples, so a
/// clean sweep is confirmed against the point of closest approach.
pub fn swept_disc_segment_with_step(
    start: Vec2,
    end: Vec2,
    radius: f32,
    segment: &Segment,
    step_fraction: f32,
) -> Contact {
    let movement = end - start;
    let distance = movement.length();

    if !(distance > 1e-5) {
        return disc_segment_contact(start, radius, segment);
    }

    let max_step = (radius * step_fraction).max(1e-3);
    // Cap the sample count; a non-finite distance falls through to the cap
    let steps = ((distance / max_step) as usize).saturating_add(1).min(1 << 20);

    let mut last_clear = 0.0;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let contact = disc_segment_contact(start + movement * t, radius, segment);
        if contact.hit {
            if i == 0 {
                return contact;
            }
            return refine(start, movement, radius, segment, last_clear, t, contact);
        }
        last_clear = t;
    }

    let closest = closest_approach_fraction(start, movement, segment);
    let contact = disc_segment_contact(start + movement * closest, radius, segment);
    if contact.hit {
        // The overlap lies strictly between two samples
        let clear = (closest * steps as f32).floor() / steps as f32;
        return refine(start, movement, radius, segment, clear, closest, contact);
    }

    Contact::miss()
}

/// Fraction along `start + movement * s` closest to the segment
///
/// Closest points between two segments; the path must not be degenerate.
fn closest_approach_fraction(start: Vec2, movement: Vec2, segment: &Segment) -> f32 {
    let wall = segment.direction();
    let offset = start - segment.start;
    let a = movement.length_squared();
    let e = wall.length_squared();
    let c = movement.dot(offset);

    if e <= COINCIDENT_SQ {
        return (-c / a).clamp(0.0, 1.0);
    }

    let b = movement.dot(wall);
    let f = wall.dot(offset);
    let denom = a * e - b * b;
    // Parallel: any point works as a start, the wall clamp below fixes it up
    let s = if denom > COINCIDENT_SQ {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let t = (b * s + f) / e;
    if t < 0.0 {
        (-c / a).clamp(0.0, 1.0)
    } else if t > 1.0 {
        ((b - c) / a).clamp(0.0, 1.0)
    } else {
        s
    }
}

/// Bisect between a clear fraction and a hit fraction, keeping the hit side
fn refine(
    start: Vec2,
    movement: Vec2,
    radius: f32,
    segment: &Segment,
    mut clear: f32,
    mut hit_t: f32,
    mut hit: Contact,
) -> Contact {
    for _ in 0..REFINE_ITERATIONS {
        let mid = (clear + hit_t) * 0.5;
        let contact = disc_segment_contact(start + movement * mid, radius, segment);
        if contact.hit {
            hit_t = mid;
            hit = contact;
        } else {
            clear = mid;
        }
    }
    hit.fraction = hit_t;
    hit
}

/// Check if a disc has left the arena rectangle `[0, size]`
///
/// Returns the inward normal of the first violated edge and the overlap depth.
pub fn disc_bounds_contact(center: Vec2, radius: f32, size: Vec2) -> Option<(Vec2, f32)> {
    if center.x < radius {
        Some((Vec2::X, radius - center.x))
    } else if center.x > size.x - radius {
        Some((Vec2::NEG_X, center.x - (size.x - radius)))
    } else if center.y < radius {
        Some((Vec2::Y, radius - center.y))
    } else if center.y > size.y - radius {
        Some((Vec2::NEG_Y, center.y - (size.y - radius)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f32, y1: f32, x2: f32, y2: f32) -> Segment {
        Segment::new(Vec2::new(x1, y1), Vec2::new(x2, y2))
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(9.0, 0.0), 5.0));
        // Touching is not overlapping
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(0.0, 30.0), 2.0));
    }

    #[test]
    fn test_closest_point_clamps_to_ends() {
        let wall = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(closest_point_on_segment(Vec2::new(5.0, 3.0), &wall), Vec2::new(5.0, 0.0));
        assert_eq!(closest_point_on_segment(Vec2::new(-4.0, 3.0), &wall), Vec2::ZERO);
        assert_eq!(closest_point_on_segment(Vec2::new(14.0, -3.0), &wall), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_degenerate_segment_is_a_point() {
        let point = seg(3.0, 3.0, 3.0, 3.0);
        assert_eq!(closest_point_on_segment(Vec2::new(10.0, 10.0), &point), Vec2::new(3.0, 3.0));

        let contact = disc_segment_contact(Vec2::new(5.0, 3.0), 3.0, &point);
        assert!(contact.hit);
        assert!((contact.normal - Vec2::X).length() < 0.0001);
        assert!((contact.penetration - 1.0).abs() < 0.0001);

        // Centre exactly on the point still yields a unit normal
        let contact = disc_segment_contact(Vec2::new(3.0, 3.0), 3.0, &point);
        assert!(contact.hit);
        assert!((contact.normal.length() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_wall_normal_points_at_disc() {
        let wall = seg(0.0, 0.0, 10.0, 0.0);
        let n = wall_normal(Vec2::new(5.0, -4.0), &wall);
        assert!((n - Vec2::NEG_Y).length() < 0.0001);

        // Centre on the wall: perpendicular
        let n = wall_normal(Vec2::new(5.0, 0.0), &wall);
        assert!(n.dot(wall.direction()).abs() < 0.0001);
        assert!((n.length() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_instantaneous_overlap_at_existing_penetration() {
        // Disc at (150,100) sitting on a vertical wall
        let wall = seg(150.0, 90.0, 150.0, 110.0);
        let contact = disc_segment_contact(Vec2::new(150.0, 100.0), 6.0, &wall);
        assert!(contact.hit);
        assert!((contact.penetration - 6.0).abs() < 0.0001);
        assert!((contact.normal.length() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_swept_high_speed_hits_thin_wall() {
        let wall = seg(50.0, -1.0, 50.0, 1.0);
        let contact = swept_disc_segment(Vec2::ZERO, Vec2::new(100.0, 0.0), 5.0, &wall);
        assert!(contact.hit);
        assert!(contact.fraction > 0.0 && contact.fraction < 1.0);
        assert!((contact.point.x - 50.0).abs() < 0.001);
        // Refined to first touch: centre about one radius before the wall
        assert!((contact.position.x - 45.0).abs() < 0.5);
        assert!(contact.normal.x < 0.0);
    }

    #[test]
    fn test_endpoint_only_check_would_miss() {
        let wall = seg(50.0, -1.0, 50.0, 1.0);
        let start = Vec2::ZERO;
        let end = Vec2::new(100.0, 0.0);
        assert!(!disc_segment_contact(start, 5.0, &wall).hit);
        assert!(!disc_segment_contact(end, 5.0, &wall).hit);
        assert!(swept_disc_segment(start, end, 5.0, &wall).hit);
    }

    #[test]
    fn test_swept_grazing_wall_end_between_samples() {
        // Wall tip sits 4.9 from the path of a radius 5 disc; the samples
        // either side of x = 50 are both just out of reach
        let wall = seg(50.0, 4.9, 50.0, 20.0);
        let contact = swept_disc_segment(Vec2::ZERO, Vec2::new(100.0, 0.0), 5.0, &wall);
        assert!(contact.hit);
        assert!(contact.fraction > 0.0 && contact.fraction < 1.0);
        assert!((contact.point - Vec2::new(50.0, 4.9)).length() < 0.001);
        assert!(contact.position.x <= 50.0 + 0.001);
        assert!(contact.position.distance(contact.point) < 5.0);
        assert!(contact.normal.y < 0.0);
    }

    #[test]
    fn test_closest_approach_fraction() {
        let movement = Vec2::new(100.0, 0.0);
        let wall = seg(50.0, 4.9, 50.0, 20.0);
        assert!((closest_approach_fraction(Vec2::ZERO, movement, &wall) - 0.5).abs() < 0.0001);

        // Wall beyond the end of the path
        let wall = seg(130.0, 2.0, 140.0, 8.0);
        assert_eq!(closest_approach_fraction(Vec2::ZERO, movement, &wall), 1.0);

        // Degenerate wall
        let point = seg(25.0, 3.0, 25.0, 3.0);
        assert!((closest_approach_fraction(Vec2::ZERO, movement, &point) - 0.25).abs() < 0.0001);
    }

    #[test]
    fn test_swept_no_movement() {
        let wall = seg(10.0, -1.0, 10.0, 1.0);
        let contact = swept_disc_segment(Vec2::ZERO, Vec2::ZERO, 5.0, &wall);
        assert!(!contact.hit);
    }

    #[test]
    fn test_swept_misses_wall_off_path() {
        let wall = seg(5.0, 10.0, 5.0, 12.0);
        assert!(!swept_disc_segment(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0, &wall).hit);
    }

    #[test]
    fn test_swept_parallel_to_wall() {
        let wall = seg(0.0, 5.0, 10.0, 5.0);
        assert!(!swept_disc_segment(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0, &wall).hit);
    }

    #[test]
    fn test_swept_starting_inside_reports_fraction_zero() {
        let wall = seg(0.0, -10.0, 0.0, 10.0);
        let contact = swept_disc_segment(Vec2::new(1.0, 0.0), Vec2::new(60.0, 0.0), 5.0, &wall);
        assert!(contact.hit);
        assert_eq!(contact.fraction, 0.0);
        assert_eq!(contact.position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_bounds_contact() {
        let size = Vec2::new(100.0, 50.0);
        assert!(disc_bounds_contact(Vec2::new(50.0, 25.0), 5.0, size).is_none());

        let (n, depth) = disc_bounds_contact(Vec2::new(2.0, 25.0), 5.0, size).expect("left edge");
        assert_eq!(n, Vec2::X);
        assert!((depth - 3.0).abs() < 0.0001);

        let (n, _) = disc_bounds_contact(Vec2::new(50.0, 48.0), 5.0, size).expect("bottom edge");
        assert_eq!(n, Vec2::NEG_Y);
    }
}
