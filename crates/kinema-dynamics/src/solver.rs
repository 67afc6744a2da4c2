//! Island constraint solver.
//!
//! Force formulation of a velocity-level step. For an island with Jacobian
//! `J`, inverse mass `M⁻¹`, external forces `F` and row targets `t`:
//!
//! ```text
//! A = J M⁻¹ Jᵀ
//! b = t / dt − J (v / dt + M⁻¹ F)
//! solve A λ = b  subject to  min ≤ λ ≤ max
//! v ← v + dt M⁻¹ (F + Jᵀ λ),  x ← x + v dt
//! ```
//!
//! Friction bounds depend on the normal force, so islands with friction
//! rows are solved twice: the first pass bounds friction by the cached
//! normal force, the second by the first pass's result.

use std::collections::BTreeMap;

use kinema_collision::PairsRegistry;
use kinema_math::{CsrMatrix, LinearSolver, Vec2};
use kinema_types::{BodyId, JointId, PairId};
use tracing::trace;

use crate::body::Body;
use crate::constraint::{dot3, Constraint, ConstraintKind, Frame, Jacobian, StepContext};
use crate::island::Island;
use crate::joint::Joint;

/// Where a row's multipliers are cached between steps.
#[derive(Debug, Clone, Copy)]
enum RowSource {
    Joint { joint: JointId, index: usize },
    Normal(PairId),
    Friction(PairId),
}

struct Row {
    /// Island slot of each side, `None` for static bodies and the world.
    a: Option<usize>,
    b: Option<usize>,
    jacobian: Jacobian,
    rhs: f32,
    min: f32,
    max: f32,
    seed: [f32; 2],
    source: RowSource,
    /// Row index of the paired normal row.
    normal_row: Option<usize>,
    constraint: Constraint,
}

/// Counters from one island solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    pub rows: usize,
    pub friction_rows: usize,
    pub passes: u32,
}

pub struct ConstraintSolver {
    linear: Box<dyn LinearSolver>,
}

impl ConstraintSolver {
    pub fn new(linear: Box<dyn LinearSolver>) -> Self {
        Self { linear }
    }

    pub fn linear_solver(&self) -> &dyn LinearSolver {
        self.linear.as_ref()
    }

    /// Solves the island's rows and integrates its bodies over `ctx.dt`.
    pub fn solve(
        &self,
        island: &Island,
        bodies: &mut BTreeMap<BodyId, Body>,
        joints: &mut BTreeMap<JointId, Joint>,
        registry: &mut PairsRegistry,
        ctx: &StepContext,
        warm_starting: bool,
    ) -> SolveStats {
        let slots: BTreeMap<BodyId, usize> = island.bodies.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut constraints = Vec::new();
        for &joint_id in &island.joints {
            let Some(joint) = joints.get(&joint_id) else { continue };
            for (index, c) in joint.constraints.iter().enumerate() {
                constraints.push((c.clone(), RowSource::Joint { joint: joint_id, index }, None));
            }
        }
        for &pair in &island.contacts {
            let Some(contact) = registry.contact(pair) else { continue };
            if contact.is_virtual {
                continue;
            }
            let info = &contact.info;
            let point = 0.5 * (info.point_a + info.point_b);
            let normal_index = constraints.len();
            constraints.push((
                Constraint {
                    body_a: info.body_a,
                    body_b: Some(info.body_b),
                    kind: ConstraintKind::Contact {
                        point,
                        normal: info.normal,
                        depth: info.depth,
                        restitution: contact.restitution,
                    },
                    cache: contact.normal_cache,
                },
                RowSource::Normal(pair),
                None,
            ));
            if contact.has_friction() {
                constraints.push((
                    Constraint {
                        body_a: info.body_a,
                        body_b: Some(info.body_b),
                        kind: ConstraintKind::Friction {
                            point,
                            normal: info.normal,
                            coefficient: contact.friction,
                        },
                        cache: contact.friction_cache,
                    },
                    RowSource::Friction(pair),
                    Some(normal_index),
                ));
            }
        }

        let rows = build_rows(constraints, &slots, bodies, ctx, warm_starting);
        let mut stats = SolveStats {
            rows: rows.len(),
            friction_rows: rows.iter().filter(|r| r.constraint.is_friction()).count(),
            passes: 0,
        };

        let lambda = if rows.is_empty() {
            Vec::new()
        } else {
            let a = assemble(&rows, &island.bodies, bodies);
            let b: Vec<f32> = rows.iter().map(|r| r.rhs).collect();
            let first = self.pass(&rows, &a, &b, 0, |row| row.normal_row.map(|n| rows[n].seed[0]));
            stats.passes = 1;

            if stats.friction_rows > 0 {
                stats.passes = 2;
                let second = self.pass(&rows, &a, &b, 1, |row| row.normal_row.map(|n| first[n]));
                store_caches(&rows, &first, &second, joints, registry);
                second
            } else {
                store_caches(&rows, &first, &first, joints, registry);
                first
            }
        };

        integrate(&rows, &lambda, &island.bodies, bodies, ctx.dt);

        trace!(
            island = island.id.0,
            bodies = island.bodies.len(),
            rows = stats.rows,
            friction_rows = stats.friction_rows,
            solver = self.linear.name(),
            "island solved"
        );
        stats
    }

    /// One bounded solve. `normal_force` yields the normal force bounding a
    /// friction row.
    fn pass(
        &self,
        rows: &[Row],
        a: &CsrMatrix,
        b: &[f32],
        slot: usize,
        normal_force: impl Fn(&Row) -> Option<f32>,
    ) -> Vec<f32> {
        let mut out: Vec<f32> = rows.iter().map(|r| r.seed[slot]).collect();
        let (min, max): (Vec<f32>, Vec<f32>) = rows
            .iter()
            .map(|r| match normal_force(r) {
                Some(n) => r.constraint.friction_bounds(n),
                None => (r.min, r.max),
            })
            .unzip();
        self.linear.solve(&mut out, a, b, &min, &max);
        out
    }
}

fn frame_of(bodies: &BTreeMap<BodyId, Body>, id: Option<BodyId>) -> Frame {
    id.and_then(|id| bodies.get(&id)).map(Frame::of).unwrap_or(Frame::WORLD)
}

/// `M⁻¹ F` of a body as `[ax, ay, alpha]`.
fn acceleration(bodies: &BTreeMap<BodyId, Body>, id: Option<BodyId>) -> [f32; 3] {
    match id.and_then(|id| bodies.get(&id)) {
        Some(body) if !body.is_static() => {
            let f = body.force();
            [f.x * body.inv_mass(), f.y * body.inv_mass(), body.torque() * body.inv_inertia()]
        }
        _ => [0.0; 3],
    }
}

fn build_rows(
    constraints: Vec<(Constraint, RowSource, Option<usize>)>,
    slots: &BTreeMap<BodyId, usize>,
    bodies: &BTreeMap<BodyId, Body>,
    ctx: &StepContext,
    warm_starting: bool,
) -> Vec<Row> {
    let mut rows = Vec::with_capacity(constraints.len());
    let mut remap = vec![None; constraints.len()];

    for (i, (constraint, source, normal)) in constraints.into_iter().enumerate() {
        let a = slots.get(&constraint.body_a).copied();
        let b = constraint.body_b.and_then(|id| slots.get(&id).copied());
        if a.is_none() && b.is_none() {
            continue;
        }

        let fa = frame_of(bodies, Some(constraint.body_a));
        let fb = frame_of(bodies, constraint.body_b);
        let jacobian = constraint.jacobian(&fa, &fb);
        let target = constraint.push_factor(&fa, &fb, ctx);
        let (min, max) = constraint.clamping(&fa, &fb, ctx);

        let aa = acceleration(bodies, Some(constraint.body_a));
        let ab = acceleration(bodies, constraint.body_b);
        let rhs = (target - jacobian.velocity(&fa, &fb)) / ctx.dt - dot3(&jacobian.a, aa) - dot3(&jacobian.b, ab);

        remap[i] = Some(rows.len());
        rows.push(Row {
            a,
            b,
            jacobian,
            rhs,
            min,
            max,
            seed: if warm_starting { constraint.cache } else { [0.0; 2] },
            source,
            normal_row: normal.and_then(|n| remap[n]),
            constraint,
        });
    }

    rows
}

/// `A = J M⁻¹ Jᵀ` over the island's dynamic bodies.
fn assemble(rows: &[Row], island: &[BodyId], bodies: &BTreeMap<BodyId, Body>) -> CsrMatrix {
    let mut touching: Vec<Vec<(usize, [f32; 3])>> = vec![Vec::new(); island.len()];
    for (i, row) in rows.iter().enumerate() {
        if let Some(s) = row.a {
            touching[s].push((i, row.jacobian.a));
        }
        if let Some(s) = row.b {
            touching[s].push((i, row.jacobian.b));
        }
    }

    let mut triplets = Vec::new();
    for (slot, entries) in touching.iter().enumerate() {
        let Some(body) = bodies.get(&island[slot]) else { continue };
        let inv = [body.inv_mass(), body.inv_mass(), body.inv_inertia()];
        for &(i, ji) in entries {
            let weighted = [ji[0] * inv[0], ji[1] * inv[1], ji[2] * inv[2]];
            for &(j, jj) in entries {
                triplets.push((i, j, dot3(&weighted, jj)));
            }
        }
    }

    CsrMatrix::from_triplets(rows.len(), rows.len(), &triplets)
}

fn store_caches(
    rows: &[Row],
    first: &[f32],
    second: &[f32],
    joints: &mut BTreeMap<JointId, Joint>,
    registry: &mut PairsRegistry,
) {
    for (i, row) in rows.iter().enumerate() {
        let cache = [first[i], second[i]];
        match row.source {
            RowSource::Joint { joint, index } => {
                if let Some(c) = joints.get_mut(&joint).and_then(|j| j.constraints.get_mut(index)) {
                    c.cache = cache;
                }
            }
            RowSource::Normal(pair) => {
                if let Some(contact) = registry.contact_mut(pair) {
                    contact.normal_cache = cache;
                }
            }
            RowSource::Friction(pair) => {
                if let Some(contact) = registry.contact_mut(pair) {
                    contact.friction_cache = cache;
                }
            }
        }
    }
}

/// Semi-implicit Euler over the island's bodies.
fn integrate(rows: &[Row], lambda: &[f32], island: &[BodyId], bodies: &mut BTreeMap<BodyId, Body>, dt: f32) {
    let mut reaction = vec![[0.0f32; 3]; island.len()];
    for (row, &l) in rows.iter().zip(lambda) {
        if let Some(s) = row.a {
            for k in 0..3 {
                reaction[s][k] += row.jacobian.a[k] * l;
            }
        }
        if let Some(s) = row.b {
            for k in 0..3 {
                reaction[s][k] += row.jacobian.b[k] * l;
            }
        }
    }

    for (slot, id) in island.iter().enumerate() {
        let Some(body) = bodies.get_mut(id) else { continue };
        if body.is_static() {
            continue;
        }
        let r = reaction[slot];
        let force = body.force() + Vec2::new(r[0], r[1]);
        let torque = body.torque() + r[2];

        body.velocity += force * (body.inv_mass() * dt);
        body.omega += torque * body.inv_inertia() * dt;
        body.position += body.velocity * dt;
        body.angle += body.omega * dt;
        body.update_transform();
    }
}
