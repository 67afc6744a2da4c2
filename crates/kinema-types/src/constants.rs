//! Simulation constants and defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f32 = 9.8;

/// Default simulation timestep (seconds). 1/60th of a second.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Default projected Gauss-Seidel sweeps per solve.
pub const DEFAULT_SOLVER_ITERATIONS: u32 = 10;

/// Default maximum number of bodies a world accepts.
pub const DEFAULT_MAX_BODIES: usize = 1000;

/// Collision mask matching every other mask.
pub const MASK_ALL: u32 = 0xffff_ffff;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f32 = 1.0e-6;

/// Area below which a triangle or polygon is considered degenerate.
pub const DEGENERATE_AREA_THRESHOLD: f32 = 1.0e-10;
