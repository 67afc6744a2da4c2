//! GJK distance and EPA penetration narrow phase.
//!
//! GJK runs on the proxies' un-inflated cores over the Minkowski difference
//! `B - A`. Separated cores within the summed radii give a rounded contact;
//! overlapping cores are handed to EPA, which expands the final simplex
//! towards the boundary face of `B - A` closest to the origin.

use kinema_geometry::ConvexProxy;
use kinema_math::{cross, Vec2};

use crate::narrow::{Manifold, NarrowPhase};
use crate::sat::SatNarrowPhase;

const GJK_MAX_ITERATIONS: usize = 32;
const EPA_MAX_ITERATIONS: usize = 64;
const EPA_TOLERANCE: f32 = 1e-4;
const OVERLAP_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct SimplexVertex {
    /// Support point on A.
    a: Vec2,
    /// Support point on B.
    b: Vec2,
    /// `b - a`.
    w: Vec2,
    /// Barycentric weight of this vertex in the closest point.
    u: f32,
}

fn support(pa: &ConvexProxy, pb: &ConvexProxy, dir: Vec2) -> SimplexVertex {
    let a = pa.support_core(-dir);
    let b = pb.support_core(dir);
    SimplexVertex { a, b, w: b - a, u: 1.0 }
}

/// Closest features of two convex cores.
#[derive(Debug, Clone)]
pub struct GjkOutput {
    /// Closest point on A's core.
    pub point_a: Vec2,
    /// Closest point on B's core.
    pub point_b: Vec2,
    /// Core-to-core distance; zero when the cores overlap.
    pub distance: f32,
    pub overlap: bool,
    simplex: Vec<SimplexVertex>,
}

impl GjkOutput {
    /// Gap between the inflated shapes; negative when they overlap.
    pub fn gap(&self, a: &ConvexProxy, b: &ConvexProxy) -> f32 {
        self.distance - a.radius - b.radius
    }

    /// Unit direction from A to B, if the cores are apart.
    pub fn normal(&self) -> Option<Vec2> {
        let d = self.point_b - self.point_a;
        (self.distance > OVERLAP_EPSILON).then(|| d / self.distance)
    }
}

/// GJK closest-point query between two proxies' cores.
pub fn distance(pa: &ConvexProxy, pb: &ConvexProxy) -> GjkOutput {
    let start = pb.center() - pa.center();
    let start = if start.length_squared() > OVERLAP_EPSILON { start } else { Vec2::X };
    let mut simplex = vec![support(pa, pb, start)];

    for _ in 0..GJK_MAX_ITERATIONS {
        reduce(&mut simplex);
        if simplex.len() == 3 {
            return finish(simplex, true);
        }

        let v = closest(&simplex);
        if v.length_squared() < OVERLAP_EPSILON * OVERLAP_EPSILON {
            return finish(simplex, true);
        }

        let next = support(pa, pb, -v);
        // No progress towards the origin: `v` is the closest point.
        if v.length_squared() - next.w.dot(v) <= 1e-6 * v.length_squared().max(1.0) {
            break;
        }
        if simplex.iter().any(|s| (s.w - next.w).length_squared() < OVERLAP_EPSILON) {
            break;
        }
        simplex.push(next);
    }

    reduce(&mut simplex);
    let overlap = simplex.len() == 3;
    finish(simplex, overlap)
}

fn closest(simplex: &[SimplexVertex]) -> Vec2 {
    simplex.iter().map(|s| s.w * s.u).sum()
}

fn finish(simplex: Vec<SimplexVertex>, overlap: bool) -> GjkOutput {
    let point_a: Vec2 = simplex.iter().map(|s| s.a * s.u).sum();
    let point_b: Vec2 = simplex.iter().map(|s| s.b * s.u).sum();
    let distance = if overlap { 0.0 } else { (point_b - point_a).length() };
    GjkOutput {
        point_a,
        point_b,
        distance,
        overlap,
        simplex,
    }
}

/// Shrinks the simplex to the feature closest to the origin and sets weights.
fn reduce(simplex: &mut Vec<SimplexVertex>) {
    match simplex.len() {
        1 => simplex[0].u = 1.0,
        2 => reduce_segment(simplex),
        3 => reduce_triangle(simplex),
        _ => {}
    }
}

fn reduce_segment(simplex: &mut Vec<SimplexVertex>) {
    let (w1, w2) = (simplex[0].w, simplex[1].w);
    let e12 = w2 - w1;
    let d12_2 = -w1.dot(e12);
    if d12_2 <= 0.0 {
        simplex.truncate(1);
        simplex[0].u = 1.0;
        return;
    }
    let d12_1 = w2.dot(e12);
    if d12_1 <= 0.0 {
        simplex.remove(0);
        simplex[0].u = 1.0;
        return;
    }
    let inv = 1.0 / (d12_1 + d12_2);
    simplex[0].u = d12_1 * inv;
    simplex[1].u = d12_2 * inv;
}

fn reduce_triangle(simplex: &mut Vec<SimplexVertex>) {
    let (w1, w2, w3) = (simplex[0].w, simplex[1].w, simplex[2].w);

    let e12 = w2 - w1;
    let d12_1 = w2.dot(e12);
    let d12_2 = -w1.dot(e12);

    let e13 = w3 - w1;
    let d13_1 = w3.dot(e13);
    let d13_2 = -w1.dot(e13);

    let e23 = w3 - w2;
    let d23_1 = w3.dot(e23);
    let d23_2 = -w2.dot(e23);

    let n123 = cross(e12, e13);
    let d123_1 = n123 * cross(w2, w3);
    let d123_2 = n123 * cross(w3, w1);
    let d123_3 = n123 * cross(w1, w2);

    let keep = |simplex: &mut Vec<SimplexVertex>, picks: &[(usize, f32)]| {
        let kept: Vec<SimplexVertex> = picks
            .iter()
            .map(|&(i, u)| SimplexVertex { u, ..simplex[i] })
            .collect();
        *simplex = kept;
    };

    if d12_2 <= 0.0 && d13_2 <= 0.0 {
        keep(simplex, &[(0, 1.0)]);
    } else if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
        let inv = 1.0 / (d12_1 + d12_2);
        keep(simplex, &[(0, d12_1 * inv), (1, d12_2 * inv)]);
    } else if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
        let inv = 1.0 / (d13_1 + d13_2);
        keep(simplex, &[(0, d13_1 * inv), (2, d13_2 * inv)]);
    } else if d12_1 <= 0.0 && d23_2 <= 0.0 {
        keep(simplex, &[(1, 1.0)]);
    } else if d13_1 <= 0.0 && d23_1 <= 0.0 {
        keep(simplex, &[(2, 1.0)]);
    } else if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
        let inv = 1.0 / (d23_1 + d23_2);
        keep(simplex, &[(1, d23_1 * inv), (2, d23_2 * inv)]);
    } else {
        let sum = d123_1 + d123_2 + d123_3;
        if sum.abs() < f32::EPSILON {
            // Degenerate triangle: fall back to its first edge.
            simplex.truncate(2);
            reduce_segment(simplex);
            return;
        }
        let inv = 1.0 / sum;
        keep(simplex, &[(0, d123_1 * inv), (1, d123_2 * inv), (2, d123_3 * inv)]);
    }
}

/// Penetration of overlapping cores: `(normal A→B, core depth, point on A, point on B)`.
fn epa(pa: &ConvexProxy, pb: &ConvexProxy, mut poly: Vec<SimplexVertex>) -> Option<(Vec2, f32, Vec2, Vec2)> {
    // Blow a degenerate simplex up to a triangle.
    for dir in [Vec2::X, Vec2::Y, -Vec2::X, -Vec2::Y, Vec2::ONE, -Vec2::ONE] {
        if poly.len() >= 3 {
            break;
        }
        let s = support(pa, pb, dir);
        if poly.iter().all(|p| (p.w - s.w).length_squared() > OVERLAP_EPSILON) {
            poly.push(s);
        }
    }
    if poly.len() < 3 {
        return None;
    }
    poly.truncate(3);

    let area = cross(poly[1].w - poly[0].w, poly[2].w - poly[0].w);
    if area.abs() < OVERLAP_EPSILON {
        return None;
    }
    if area < 0.0 {
        poly.swap(1, 2);
    }

    let (mut edge, mut normal, mut dist) = closest_edge(&poly);
    if dist < -EPA_TOLERANCE {
        // Touching only: the blown-up triangle does not enclose the origin.
        return None;
    }
    for _ in 0..EPA_MAX_ITERATIONS {
        let s = support(pa, pb, normal);
        if s.w.dot(normal) - dist < EPA_TOLERANCE {
            break;
        }
        if poly.iter().any(|p| (p.w - s.w).length_squared() < OVERLAP_EPSILON) {
            break;
        }
        poly.insert(edge + 1, s);
        (edge, normal, dist) = closest_edge(&poly);
    }
    let (i, j) = (edge, (edge + 1) % poly.len());
    let e = poly[j].w - poly[i].w;
    let t = ((normal * dist - poly[i].w).dot(e) / e.length_squared().max(f32::EPSILON)).clamp(0.0, 1.0);
    let point_a = poly[i].a + (poly[j].a - poly[i].a) * t;
    let point_b = poly[i].b + (poly[j].b - poly[i].b) * t;

    // The closest face of B - A has outward normal `n`; B escapes along `-n`.
    Some((-normal, dist.max(0.0), point_a, point_b))
}

fn closest_edge(poly: &[SimplexVertex]) -> (usize, Vec2, f32) {
    let mut best = (0, Vec2::ZERO, f32::INFINITY);
    for i in 0..poly.len() {
        let j = (i + 1) % poly.len();
        let e = poly[j].w - poly[i].w;
        let n = Vec2::new(e.y, -e.x).normalize_or_zero();
        let d = n.dot(poly[i].w);
        if d < best.2 {
            best = (i, n, d);
        }
    }
    best
}

#[derive(Debug, Default, Clone)]
pub struct GjkEpaNarrowPhase;

impl GjkEpaNarrowPhase {
    pub fn new() -> Self {
        Self
    }
}

impl NarrowPhase for GjkEpaNarrowPhase {
    fn collide(&self, a: &ConvexProxy, b: &ConvexProxy) -> Option<Manifold> {
        let out = distance(a, b);
        let radii = a.radius + b.radius;

        if let Some(normal) = out.normal() {
            if out.distance > radii {
                return None;
            }
            return Some(Manifold {
                normal,
                depth: radii - out.distance,
                point_a: out.point_a + normal * a.radius,
                point_b: out.point_b - normal * b.radius,
            });
        }

        match epa(a, b, out.simplex) {
            Some((normal, depth, pa, pb)) => Some(Manifold {
                normal,
                depth: depth + radii,
                point_a: pa + normal * a.radius,
                point_b: pb - normal * b.radius,
            }),
            // Degenerate polytope (touching cores, coincident points):
            // the separating-axis test resolves these directly.
            None => SatNarrowPhase.collide(a, b),
        }
    }

    fn name(&self) -> &str {
        "gjk-epa"
    }
}
