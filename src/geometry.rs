//! Planar geometry on millimetre coordinates: polygon containment, erosion,
//! rectangle fit tests and the clearance metric shared by validation and
//! reporting.

use crate::types::{Point, Polygon, Rect};

/// Numeric slack for containment and clearance comparisons (mm).
pub const EPSILON: f64 = 1e-6;

/// Signed shoelace area, positive for counter-clockwise polygons.
pub fn signed_area(polygon: &Polygon) -> f64 {
    polygon
        .edges()
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>()
        / 2.0
}

pub fn polygon_area(polygon: &Polygon) -> f64 {
    signed_area(polygon).abs()
}

/// Returns the polygon with counter-clockwise vertex order.
pub fn counter_clockwise(polygon: &Polygon) -> Polygon {
    if signed_area(polygon) < 0.0 {
        Polygon::new(polygon.points.iter().rev().copied().collect())
    } else {
        polygon.clone()
    }
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    point_segment_distance(p, a, b) <= EPSILON
}

/// Closed-segment intersection test, touching endpoints included.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    on_segment(a, c, d) || on_segment(b, c, d) || on_segment(c, a, b) || on_segment(d, a, b)
}

pub fn segment_distance(a: Point, b: Point, c: Point, d: Point) -> f64 {
    if segments_intersect(a, b, c, d) {
        return 0.0;
    }
    point_segment_distance(a, c, d)
        .min(point_segment_distance(b, c, d))
        .min(point_segment_distance(c, a, b))
        .min(point_segment_distance(d, a, b))
}

/// Even-odd ray casting. Points on the boundary count as contained.
pub fn polygon_contains(polygon: &Polygon, p: Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    if polygon.edges().any(|(a, b)| on_segment(p, a, b)) {
        return true;
    }

    let mut inside = false;
    for (a, b) in polygon.edges() {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// True when no two non-adjacent edges touch.
pub fn is_simple(polygon: &Polygon) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let edges: Vec<(Point, Point)> = polygon.edges().collect();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            let (a, b) = edges[i];
            let (c, d) = edges[j];
            if segments_intersect(a, b, c, d) {
                return false;
            }
        }
    }
    true
}

pub fn is_convex(polygon: &Polygon) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0;
    for i in 0..n {
        let turn = cross(
            polygon.points[i],
            polygon.points[(i + 1) % n],
            polygon.points[(i + 2) % n],
        );
        if turn.abs() <= EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    true
}

/// Liang-Barsky clip of segment `a-b` against the open interior of `rect`.
fn segment_enters_interior(a: Point, b: Point, rect: &Rect) -> bool {
    let (min_x, min_y) = (rect.x + EPSILON, rect.y + EPSILON);
    let (max_x, max_y) = (rect.max_x() - EPSILON, rect.max_y() - EPSILON);
    if min_x >= max_x || min_y >= max_y {
        return false;
    }

    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, a.x - min_x),
        (dx, max_x - a.x),
        (-dy, a.y - min_y),
        (dy, max_y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return false;
            }
        }
    }
    true
}

/// All four corners inside and no polygon edge crossing the rectangle's
/// interior (a concave polygon can contain every corner of a rectangle it
/// does not contain).
pub fn rect_fully_inside(rect: &Rect, polygon: &Polygon) -> bool {
    if !rect.corners().iter().all(|&c| polygon_contains(polygon, c)) {
        return false;
    }
    !polygon
        .edges()
        .any(|(a, b)| segment_enters_interior(a, b, rect))
}

/// Shortest distance between the rectangle outline and the polygon outline.
pub fn rect_outline_distance(rect: &Rect, polygon: &Polygon) -> f64 {
    let mut best = f64::INFINITY;
    for (a, b) in rect.edges() {
        for (c, d) in polygon.edges() {
            best = best.min(segment_distance(a, b, c, d));
        }
    }
    best
}

/// Axis gap metric between two rectangles.
///
/// With `gx`/`gy` the signed gaps between the X and Y projections:
/// both positive gives `min(gx, gy)`, one positive gives that gap, and
/// otherwise the rectangles touch or overlap and the result is `<= 0`
/// (the shallower penetration depth, negated).
pub fn clearance(a: &Rect, b: &Rect) -> f64 {
    let gx = (b.x - a.max_x()).max(a.x - b.max_x());
    let gy = (b.y - a.max_y()).max(a.y - b.max_y());
    match (gx > 0.0, gy > 0.0) {
        (true, true) => gx.min(gy),
        (true, false) => gx,
        (false, true) => gy,
        (false, false) => gx.max(gy),
    }
}

/// Result of eroding a polygon: one or more simple parts, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Erosion {
    Empty,
    Parts(Vec<Polygon>),
}

impl Erosion {
    pub fn is_empty(&self) -> bool {
        matches!(self, Erosion::Empty)
    }

    pub fn parts(&self) -> &[Polygon] {
        match self {
            Erosion::Empty => &[],
            Erosion::Parts(parts) => parts,
        }
    }
}

/// Inward offset of `polygon` by `distance`.
///
/// Convex input is clipped against each edge's inward half-plane. Concave
/// input goes through a straight-skeleton offset; parts that come back
/// degenerate or closer than `distance` to the original outline are
/// discarded.
pub fn erode_polygon(polygon: &Polygon, distance: f64) -> Erosion {
    let ccw = counter_clockwise(polygon);
    if ccw.len() < 3 || polygon_area(&ccw) <= EPSILON {
        return Erosion::Empty;
    }
    if distance <= 0.0 {
        return Erosion::Parts(vec![ccw]);
    }

    let parts = if is_convex(&ccw) {
        erode_convex(&ccw, distance).into_iter().collect()
    } else {
        erode_concave(&ccw, distance)
    };

    if parts.is_empty() {
        Erosion::Empty
    } else {
        Erosion::Parts(parts)
    }
}

fn erode_convex(polygon: &Polygon, distance: f64) -> Option<Polygon> {
    let mut clipped = polygon.points.clone();
    for (a, b) in polygon.edges() {
        let len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        if len <= EPSILON {
            continue;
        }
        // Inward normal of a counter-clockwise edge points left.
        let (nx, ny) = (-(b.y - a.y) / len, (b.x - a.x) / len);
        let depth = |p: Point| (p.x - a.x) * nx + (p.y - a.y) * ny - distance;
        clipped = clip_half_plane(&clipped, depth);
        if clipped.len() < 3 {
            return None;
        }
    }

    let eroded = Polygon::new(clipped);
    (polygon_area(&eroded) > EPSILON).then_some(eroded)
}

/// Sutherland-Hodgman step keeping points where `depth(p) >= 0`.
fn clip_half_plane(points: &[Point], depth: impl Fn(Point) -> f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(points.len() + 1);
    let n = points.len();
    for i in 0..n {
        let cur = points[i];
        let next = points[(i + 1) % n];
        let (dc, dn) = (depth(cur), depth(next));
        if dc >= 0.0 {
            out.push(cur);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            let t = dc / (dc - dn);
            out.push(Point::new(
                cur.x + t * (next.x - cur.x),
                cur.y + t * (next.y - cur.y),
            ));
        }
    }
    out.dedup_by(|a, b| (a.x - b.x).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON);
    out
}

fn erode_concave(polygon: &Polygon, distance: f64) -> Vec<Polygon> {
    let exterior: Vec<(f64, f64)> = polygon.points.iter().map(|p| (p.x, p.y)).collect();
    let input = geo_types::Polygon::new(geo_types::LineString::from(exterior), vec![]);
    let buffered = geo_buffer::buffer_polygon(&input, -distance);

    buffered
        .0
        .iter()
        .filter_map(|part| {
            let mut points: Vec<Point> = part
                .exterior()
                .points()
                .map(|p| Point::new(p.x(), p.y()))
                .collect();
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            let candidate = counter_clockwise(&Polygon::new(points));
            is_valid_offset(&candidate, polygon, distance).then_some(candidate)
        })
        .collect()
}

fn is_valid_offset(candidate: &Polygon, original: &Polygon, distance: f64) -> bool {
    const TOLERANCE: f64 = 1e-3;
    candidate.len() >= 3
        && polygon_area(candidate) > EPSILON
        && is_simple(candidate)
        && candidate.points.iter().all(|&p| {
            polygon_contains(original, p)
                && original
                    .edges()
                    .all(|(a, b)| point_segment_distance(p, a, b) >= distance - TOLERANCE)
        })
}
