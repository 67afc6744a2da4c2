//! Oriented bounding boxes and the mesh OBB tree.
//!
//! The tree is built once per mesh: each node fits an OBB to the vertices of
//! its triangles along the principal axes of their covariance, then splits
//! the triangles by centroid along one of those axes. Leaves hold exactly one
//! triangle. Nodes live in a flat arena; children are arena indices.
//! After the split pass every branch box is widened to enclose its
//! children's boxes, so a box that misses a query prunes its whole subtree.

use std::collections::VecDeque;

use kinema_math::{symmetric_eigen_2x2, Affine2, Vec2};
use kinema_types::KinemaResult;
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;

/// Oriented box: centre, orthonormal axes, and half extents along those axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obb {
    pub center: Vec2,
    pub axes: [Vec2; 2],
    pub half: Vec2,
}

impl Obb {
    /// Fits a box to `points` along the principal axes of their covariance.
    pub fn fit(points: &[Vec2]) -> KinemaResult<Obb> {
        let n = points.len().max(1) as f32;
        let mean = points.iter().copied().sum::<Vec2>() / n;

        let (mut cxx, mut cxy, mut cyy) = (0.0f32, 0.0f32, 0.0f32);
        for p in points {
            let d = *p - mean;
            cxx += d.x * d.x;
            cxy += d.x * d.y;
            cyy += d.y * d.y;
        }
        let eigen = symmetric_eigen_2x2(cxx / n, cxy / n, cyy / n)?;
        Ok(Obb::along(eigen.vectors, points))
    }

    /// Tightest box with the given orthonormal `axes` enclosing `points`.
    pub fn along(axes: [Vec2; 2], points: &[Vec2]) -> Obb {
        if points.is_empty() {
            return Obb {
                center: Vec2::ZERO,
                axes,
                half: Vec2::ZERO,
            };
        }

        let mut lo = Vec2::splat(f32::INFINITY);
        let mut hi = Vec2::splat(f32::NEG_INFINITY);
        for p in points {
            let q = Vec2::new(p.dot(axes[0]), p.dot(axes[1]));
            lo = lo.min(q);
            hi = hi.max(q);
        }

        let mid = (lo + hi) * 0.5;
        Obb {
            center: axes[0] * mid.x + axes[1] * mid.y,
            axes,
            half: (hi - lo) * 0.5,
        }
    }

    /// Box covering `aabb` (given in world space) expressed in the frame
    /// whose world transform is `transform`.
    pub fn from_world_aabb(aabb: &Aabb, transform: &Affine2) -> Obb {
        let inv = transform.inverse();
        Obb {
            center: inv.transform_point2(aabb.center()),
            axes: [
                inv.transform_vector2(Vec2::X),
                inv.transform_vector2(Vec2::Y),
            ],
            half: aabb.half_extents(),
        }
    }

    pub fn corners(&self) -> [Vec2; 4] {
        let ex = self.axes[0] * self.half.x;
        let ey = self.axes[1] * self.half.y;
        [
            self.center - ex - ey,
            self.center + ex - ey,
            self.center + ex + ey,
            self.center - ex + ey,
        ]
    }

    /// Separating-axis test between two boxes expressed in the same frame.
    ///
    /// Checks both boxes' axes: the other box's corners are projected into
    /// each box's own frame in turn.
    pub fn overlaps(&self, other: &Obb) -> bool {
        !separated_in_frame(self, other) && !separated_in_frame(other, self)
    }

    /// Bounding box of this OBB in the world, given the frame's transform.
    pub fn world_aabb(&self, transform: &Affine2) -> Aabb {
        Aabb::from_points(self.corners().iter().map(|&c| transform.transform_point2(c)))
    }
}

fn separated_in_frame(frame: &Obb, other: &Obb) -> bool {
    let corners = other.corners();
    for (k, axis) in frame.axes.iter().enumerate() {
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for c in &corners {
            let d = (*c - frame.center).dot(*axis);
            lo = lo.min(d);
            hi = hi.max(d);
        }
        if lo > frame.half[k] || hi < -frame.half[k] {
            return true;
        }
    }
    false
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObbChildren {
    Leaf { triangle: usize },
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObbNode {
    pub obb: Obb,
    pub children: ObbChildren,
}

/// Bounding-volume hierarchy of oriented boxes over a triangle soup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObbTree {
    nodes: Vec<ObbNode>,
}

impl ObbTree {
    /// Builds the tree breadth-first until every leaf holds one triangle.
    pub fn build(triangles: &[[Vec2; 3]]) -> KinemaResult<ObbTree> {
        let mut nodes: Vec<ObbNode> = Vec::with_capacity(triangles.len() * 2);
        if triangles.is_empty() {
            return Ok(ObbTree { nodes });
        }

        let centroids: Vec<Vec2> = triangles
            .iter()
            .map(|t| (t[0] + t[1] + t[2]) / 3.0)
            .collect();

        let mut queue: VecDeque<(usize, Vec<usize>)> = VecDeque::new();
        nodes.push(placeholder());
        queue.push_back((0, (0..triangles.len()).collect()));

        while let Some((slot, members)) = queue.pop_front() {
            let points: Vec<Vec2> = members.iter().flat_map(|&i| triangles[i]).collect();
            let obb = Obb::fit(&points)?;

            if members.len() == 1 {
                nodes[slot] = ObbNode {
                    obb,
                    children: ObbChildren::Leaf { triangle: members[0] },
                };
                continue;
            }

            let (left, right) = split(&obb, &members, &centroids);
            let (l, r) = (nodes.len(), nodes.len() + 1);
            nodes.push(placeholder());
            nodes.push(placeholder());
            nodes[slot] = ObbNode {
                obb,
                children: ObbChildren::Branch { left: l, right: r },
            };
            queue.push_back((l, left));
            queue.push_back((r, right));
        }

        // Children always sit after their parent in the arena, so a reverse
        // sweep grows every branch over its final children.
        for index in (0..nodes.len()).rev() {
            if let ObbChildren::Branch { left, right } = nodes[index].children {
                let mut corners = nodes[left].obb.corners().to_vec();
                corners.extend(nodes[right].obb.corners());
                corners.extend(nodes[index].obb.corners());
                nodes[index].obb = Obb::along(nodes[index].obb.axes, &corners);
            }
        }

        Ok(ObbTree { nodes })
    }

    pub fn nodes(&self) -> &[ObbNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Triangles whose leaf boxes may overlap `world_aabb` when the mesh
    /// sits at `transform`. Never misses an overlapping leaf; may include
    /// leaves that only overlap conservatively.
    pub fn query(&self, world_aabb: &Aabb, transform: &Affine2) -> Vec<usize> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() {
            return hits;
        }

        let region = Obb::from_world_aabb(world_aabb, transform);
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.obb.overlaps(&region) {
                continue;
            }
            match node.children {
                ObbChildren::Leaf { triangle } => hits.push(triangle),
                ObbChildren::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        hits
    }

    /// Leaf boxes keyed by triangle index, for inspection and tests.
    pub fn leaves(&self) -> impl Iterator<Item = (usize, &Obb)> {
        self.nodes.iter().filter_map(|n| match n.children {
            ObbChildren::Leaf { triangle } => Some((triangle, &n.obb)),
            ObbChildren::Branch { .. } => None,
        })
    }
}

fn placeholder() -> ObbNode {
    ObbNode {
        obb: Obb {
            center: Vec2::ZERO,
            axes: [Vec2::X, Vec2::Y],
            half: Vec2::ZERO,
        },
        children: ObbChildren::Leaf { triangle: 0 },
    }
}

/// Partitions by centroid side along the longer box axis, then the shorter.
/// When neither axis separates anything (coincident centroids), falls back
/// to halving the set ordered along the longer axis.
fn split(obb: &Obb, members: &[usize], centroids: &[Vec2]) -> (Vec<usize>, Vec<usize>) {
    let order = if obb.half.x >= obb.half.y { [0, 1] } else { [1, 0] };

    for &k in &order {
        let axis = obb.axes[k];
        let (left, right): (Vec<usize>, Vec<usize>) = members
            .iter()
            .partition(|&&i| (centroids[i] - obb.center).dot(axis) < 0.0);
        if !left.is_empty() && !right.is_empty() {
            return (left, right);
        }
    }

    let axis = obb.axes[order[0]];
    let mut sorted = members.to_vec();
    sorted.sort_by(|&a, &b| centroids[a].dot(axis).total_cmp(&centroids[b].dot(axis)));
    let right = sorted.split_off(sorted.len() / 2);
    (sorted, right)
}
