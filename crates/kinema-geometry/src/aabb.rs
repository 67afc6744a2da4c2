//! Axis-aligned bounding boxes.

use kinema_math::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box given by its min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all `points`. Empty input yields a degenerate box at the origin.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::new(Vec2::ZERO, Vec2::ZERO);
        };
        iter.fold(Self::new(first, first), |acc, p| Self::new(acc.min.min(p), acc.max.max(p)))
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }

    /// Bounding box of the capsule swept by a disc of `radius` from `a` to `b`.
    pub fn of_capsule(a: Vec2, b: Vec2, radius: f32) -> Aabb {
        Aabb::new(a.min(b), a.max(b)).expanded(radius)
    }

    /// Exact capsule-vs-box test.
    ///
    /// If the segment crosses the box they overlap; otherwise the closest
    /// feature pair is an endpoint against the box or a box corner against
    /// the segment.
    pub fn test_capsule(&self, a: Vec2, b: Vec2, radius: f32) -> bool {
        if !Aabb::of_capsule(a, b, radius).overlaps(self) {
            return false;
        }
        if self.intersects_segment(a, b) {
            return true;
        }

        let r2 = radius * radius;
        if self.distance_squared(a) <= r2 || self.distance_squared(b) <= r2 {
            return true;
        }
        self.corners()
            .iter()
            .any(|&c| segment_point_distance_squared(a, b, c) <= r2)
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// Squared distance from `p` to the box (zero inside).
    pub fn distance_squared(&self, p: Vec2) -> f32 {
        let q = p.clamp(self.min, self.max);
        (p - q).length_squared()
    }

    /// Slab test for the segment `a → b`.
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        let d = b - a;
        let mut t0 = 0.0f32;
        let mut t1 = 1.0f32;

        for axis in 0..2 {
            let (start, dir, lo, hi) = (a[axis], d[axis], self.min[axis], self.max[axis]);
            if dir.abs() < f32::EPSILON {
                if start < lo || start > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let (mut near, mut far) = ((lo - start) * inv, (hi - start) * inv);
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = t0.max(near);
            t1 = t1.min(far);
            if t0 > t1 {
                return false;
            }
        }
        true
    }
}

/// Squared distance from `p` to the segment `a → b`.
pub fn segment_point_distance_squared(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > f32::EPSILON {
        ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (a + ab * t - p).length_squared()
}

/// Squared distance between segments `a0 → a1` and `b0 → b1`.
pub fn segment_segment_distance_squared(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> f32 {
    if segments_cross(a0, a1, b0, b1) {
        return 0.0;
    }
    segment_point_distance_squared(a0, a1, b0)
        .min(segment_point_distance_squared(a0, a1, b1))
        .min(segment_point_distance_squared(b0, b1, a0))
        .min(segment_point_distance_squared(b0, b1, a1))
}

fn segments_cross(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool {
    let d1 = (a1 - a0).perp_dot(b0 - a0);
    let d2 = (a1 - a0).perp_dot(b1 - a0);
    let d3 = (b1 - b0).perp_dot(a0 - b0);
    let d4 = (b1 - b0).perp_dot(a1 - b0);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}
