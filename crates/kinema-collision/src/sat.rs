//! Separating-axis narrow phase.
//!
//! - circle–circle: analytic
//! - polygon–circle: deepest face, else the closest boundary point
//! - polygon–polygon: minimum-overlap face axis, then the incident edge is
//!   clipped against the reference face's side planes

use kinema_geometry::ConvexProxy;
use kinema_math::Vec2;

use crate::narrow::{Manifold, NarrowPhase};

/// Two clipped points closer in depth than this are averaged.
const FLAT_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Default, Clone)]
pub struct SatNarrowPhase;

impl SatNarrowPhase {
    pub fn new() -> Self {
        Self
    }
}

impl NarrowPhase for SatNarrowPhase {
    fn collide(&self, a: &ConvexProxy, b: &ConvexProxy) -> Option<Manifold> {
        match (a.is_circle(), b.is_circle()) {
            (true, true) => circle_circle(a.vertices[0], a.radius, b.vertices[0], b.radius),
            (false, true) => polygon_circle(&a.vertices, b.vertices[0], b.radius),
            (true, false) => polygon_circle(&b.vertices, a.vertices[0], a.radius).map(Manifold::flipped),
            (false, false) => polygon_polygon(&a.vertices, &b.vertices),
        }
    }

    fn name(&self) -> &str {
        "sat"
    }
}

fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Manifold> {
    let d = cb - ca;
    let dist = d.length();
    if dist > ra + rb {
        return None;
    }
    let normal = if dist > f32::EPSILON { d / dist } else { Vec2::Y };
    Some(Manifold {
        normal,
        depth: ra + rb - dist,
        point_a: ca + normal * ra,
        point_b: cb - normal * rb,
    })
}

/// Outward normal of edge `i → i+1` of a counter-clockwise polygon.
fn edge_normal(poly: &[Vec2], i: usize) -> Vec2 {
    let e = poly[(i + 1) % poly.len()] - poly[i];
    Vec2::new(e.y, -e.x).normalize_or_zero()
}

/// Polygon `poly` (first) against circle (second).
fn polygon_circle(poly: &[Vec2], center: Vec2, radius: f32) -> Option<Manifold> {
    let n = poly.len();
    let mut best_face = 0;
    let mut best_sep = f32::NEG_INFINITY;
    for i in 0..n {
        let s = edge_normal(poly, i).dot(center - poly[i]);
        if s > radius {
            return None;
        }
        if s > best_sep {
            best_sep = s;
            best_face = i;
        }
    }

    if best_sep <= 0.0 {
        // Centre inside: push out through the least-penetrated face.
        let normal = edge_normal(poly, best_face);
        return Some(Manifold {
            normal,
            depth: radius - best_sep,
            point_a: center - normal * best_sep,
            point_b: center - normal * radius,
        });
    }

    let mut closest = poly[0];
    let mut best = f32::INFINITY;
    for i in 0..n {
        let (p, q) = (poly[i], poly[(i + 1) % n]);
        let e = q - p;
        let t = ((center - p).dot(e) / e.length_squared().max(f32::EPSILON)).clamp(0.0, 1.0);
        let c = p + e * t;
        let d2 = (center - c).length_squared();
        if d2 < best {
            best = d2;
            closest = c;
        }
    }

    let dist = best.sqrt();
    if dist > radius {
        return None;
    }
    let normal = if dist > f32::EPSILON {
        (center - closest) / dist
    } else {
        edge_normal(poly, best_face)
    };
    Some(Manifold {
        normal,
        depth: radius - dist,
        point_a: closest,
        point_b: center - normal * radius,
    })
}

/// Largest separation of `other` along the face normals of `poly`.
fn max_separation(poly: &[Vec2], other: &[Vec2]) -> (usize, f32) {
    let mut face = 0;
    let mut best = f32::NEG_INFINITY;
    for i in 0..poly.len() {
        let n = edge_normal(poly, i);
        let s = other
            .iter()
            .map(|v| n.dot(*v - poly[i]))
            .fold(f32::INFINITY, f32::min);
        if s > best {
            best = s;
            face = i;
        }
    }
    (face, best)
}

fn polygon_polygon(a: &[Vec2], b: &[Vec2]) -> Option<Manifold> {
    let (face_a, sep_a) = max_separation(a, b);
    if sep_a > 0.0 {
        return None;
    }
    let (face_b, sep_b) = max_separation(b, a);
    if sep_b > 0.0 {
        return None;
    }

    // Prefer A as reference unless B is clearly better, for frame coherence.
    let flip = sep_b > sep_a + 0.1 * FLAT_TOLERANCE;
    let (reference, incident, face) = if flip { (b, a, face_b) } else { (a, b, face_a) };

    let ref_normal = edge_normal(reference, face);
    let v1 = reference[face];
    let v2 = reference[(face + 1) % reference.len()];

    let inc_face = (0..incident.len())
        .min_by(|&i, &j| {
            edge_normal(incident, i)
                .dot(ref_normal)
                .total_cmp(&edge_normal(incident, j).dot(ref_normal))
        })
        .unwrap_or(0);
    let mut segment = [incident[inc_face], incident[(inc_face + 1) % incident.len()]];

    let tangent = (v2 - v1).normalize_or_zero();
    segment = clip(segment, -tangent, -tangent.dot(v1))?;
    segment = clip(segment, tangent, tangent.dot(v2))?;

    let depths = segment.map(|p| -ref_normal.dot(p - v1));
    let mut points: Vec<(Vec2, f32)> = segment
        .iter()
        .zip(depths)
        .filter(|(_, d)| *d >= 0.0)
        .map(|(p, d)| (*p, d))
        .collect();
    if points.is_empty() {
        return None;
    }
    points.sort_by(|x, y| y.1.total_cmp(&x.1));

    let (incident_point, depth) = if points.len() == 2 && (points[0].1 - points[1].1).abs() < FLAT_TOLERANCE {
        ((points[0].0 + points[1].0) * 0.5, points[0].1)
    } else {
        points[0]
    };
    let on_reference = incident_point + ref_normal * depth;

    let m = Manifold {
        normal: ref_normal,
        depth,
        point_a: on_reference,
        point_b: incident_point,
    };
    Some(if flip { m.flipped() } else { m })
}

/// Keeps the part of `segment` with `n · p <= offset`.
fn clip(segment: [Vec2; 2], n: Vec2, offset: f32) -> Option<[Vec2; 2]> {
    let d0 = n.dot(segment[0]) - offset;
    let d1 = n.dot(segment[1]) - offset;
    match (d0 <= 0.0, d1 <= 0.0) {
        (true, true) => Some(segment),
        (false, false) => None,
        _ => {
            let t = d0 / (d0 - d1);
            let cut = segment[0] + (segment[1] - segment[0]) * t;
            Some(if d0 <= 0.0 { [segment[0], cut] } else { [cut, segment[1]] })
        }
    }
}
