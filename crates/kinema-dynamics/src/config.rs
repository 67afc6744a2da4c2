//! World configuration.
//!
//! Parameters that control the step loop: gravity, solver stabilization,
//! sleeping, continuous collision and the pluggable pipeline strategies.
//! Settings load from TOML and are validated before a world is built.

use std::fmt;
use std::str::FromStr;

use kinema_collision::{Material, ToiSettings};
use kinema_math::Vec2;
use kinema_types::{KinemaError, KinemaResult};
use serde::{Deserialize, Serialize};

/// Broad phase used by the collision detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BroadPhaseKind {
    Naive,
    #[default]
    #[serde(alias = "sap")]
    SweepAndPrune,
}

/// Narrow phase used by the collision detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NarrowPhaseKind {
    #[default]
    Sat,
    GjkEpa,
}

/// How bodies are grouped into independently solved islands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IslandGeneratorKind {
    #[default]
    #[serde(alias = "local")]
    PerConnectedComponent,
    #[serde(alias = "sole")]
    SingleIsland,
}

macro_rules! strategy_names {
    ($ty:ty, $what:literal, { $($variant:path => [$name:literal $(, $alias:literal)*]),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($variant => f.write_str($name),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = KinemaError;

            fn from_str(s: &str) -> KinemaResult<Self> {
                match s {
                    $($name $(| $alias)* => Ok($variant),)+
                    other => Err(KinemaError::InvalidConfig(format!(
                        concat!("unknown ", $what, " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

strategy_names!(BroadPhaseKind, "broad phase", {
    BroadPhaseKind::Naive => ["naive"],
    BroadPhaseKind::SweepAndPrune => ["sweep-and-prune", "sap"],
});

strategy_names!(NarrowPhaseKind, "narrow phase", {
    NarrowPhaseKind::Sat => ["sat"],
    NarrowPhaseKind::GjkEpa => ["gjk-epa"],
});

strategy_names!(IslandGeneratorKind, "island generator", {
    IslandGeneratorKind::PerConnectedComponent => ["per-connected-component", "local"],
    IslandGeneratorKind::SingleIsland => ["single-island", "sole"],
});

/// Configuration for a simulation world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Gravitational acceleration applied to every body with finite mass.
    pub gravity: Vec2,

    /// Projected Gauss-Seidel sweeps per solve.
    pub solver_iterations: u32,

    /// Fraction of joint drift corrected per step (0.0–1.0).
    pub constraint_push_factor: f32,

    /// Fraction of contact penetration beyond the slop corrected per step.
    pub contact_push_factor: f32,

    /// Force bound of joint constraints.
    pub constraint_max_force: f32,

    /// Penetration tolerated without positional correction.
    pub contact_slop: f32,

    /// Approach speed below which contacts do not bounce.
    pub restitution_threshold: f32,

    /// Seed each solve with the previous step's multipliers.
    pub warm_starting: bool,

    pub sleeping_velocity_threshold: f32,
    pub sleeping_angular_velocity_threshold: f32,

    /// Seconds a body must stay below both thresholds before sleeping.
    pub fall_asleep_timer: f32,

    /// Impact fractions below this count as "no impact".
    pub toi_epsilon: f32,
    pub toi_max_iterations: u32,

    /// Overlap the impact search aims for.
    pub toi_penetration_depth: f32,

    /// Upper bound on detect-and-advance passes per step, at least 1.
    pub toi_substeps: u32,

    pub max_bodies: usize,

    pub broad_phase: BroadPhaseKind,
    pub narrow_phase: NarrowPhaseKind,
    pub island_generator: IslandGeneratorKind,

    /// Material of colliders that do not specify one.
    pub default_material: Material,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -kinema_types::constants::GRAVITY),
            solver_iterations: kinema_types::constants::DEFAULT_SOLVER_ITERATIONS,
            constraint_push_factor: 0.6,
            contact_push_factor: 0.6,
            constraint_max_force: 1.0e6,
            contact_slop: 0.005,
            restitution_threshold: 1.0,
            warm_starting: true,
            sleeping_velocity_threshold: 0.01,
            sleeping_angular_velocity_threshold: 0.01,
            fall_asleep_timer: 0.5,
            toi_epsilon: 1.0e-3,
            toi_max_iterations: 32,
            toi_penetration_depth: 0.01,
            toi_substeps: 8,
            max_bodies: kinema_types::constants::DEFAULT_MAX_BODIES,
            broad_phase: BroadPhaseKind::default(),
            narrow_phase: NarrowPhaseKind::default(),
            island_generator: IslandGeneratorKind::default(),
            default_material: Material::default(),
        }
    }
}

impl WorldSettings {
    /// Creates settings for debugging (few sweeps, naive pipeline).
    pub fn debug() -> Self {
        Self {
            solver_iterations: 3,
            toi_substeps: 2,
            broad_phase: BroadPhaseKind::Naive,
            island_generator: IslandGeneratorKind::SingleIsland,
            ..Default::default()
        }
    }

    /// Creates high-quality settings (more sweeps, tighter contacts).
    pub fn high_quality() -> Self {
        Self {
            solver_iterations: 30,
            contact_slop: 0.001,
            toi_max_iterations: 64,
            toi_penetration_depth: 0.005,
            toi_substeps: 16,
            narrow_phase: NarrowPhaseKind::GjkEpa,
            ..Default::default()
        }
    }

    /// Parses TOML. Missing keys take their defaults; the result is validated.
    pub fn from_toml_str(text: &str) -> KinemaResult<Self> {
        let settings: WorldSettings =
            toml::from_str(text).map_err(|e| KinemaError::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> KinemaResult<String> {
        toml::to_string(self).map_err(|e| KinemaError::Serialization(e.to_string()))
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> KinemaResult<()> {
        fn invalid(msg: String) -> KinemaResult<()> {
            Err(KinemaError::InvalidConfig(msg))
        }

        if !self.gravity.is_finite() {
            return invalid(format!("gravity must be finite, got {:?}", self.gravity));
        }
        if self.solver_iterations == 0 {
            return invalid("solver_iterations must be at least 1".into());
        }
        for (name, value) in [
            ("constraint_push_factor", self.constraint_push_factor),
            ("contact_push_factor", self.contact_push_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        for (name, value) in [
            ("constraint_max_force", self.constraint_max_force),
            ("contact_slop", self.contact_slop),
            ("restitution_threshold", self.restitution_threshold),
            ("sleeping_velocity_threshold", self.sleeping_velocity_threshold),
            ("sleeping_angular_velocity_threshold", self.sleeping_angular_velocity_threshold),
            ("fall_asleep_timer", self.fall_asleep_timer),
            ("toi_epsilon", self.toi_epsilon),
            ("toi_penetration_depth", self.toi_penetration_depth),
        ] {
            if value.is_nan() || value < 0.0 {
                return invalid(format!("{name} must be non-negative, got {value}"));
            }
        }
        let m = &self.default_material;
        if m.friction < 0.0 || m.restitution < 0.0 || m.damping < 0.0 || m.angular_damping < 0.0 {
            return invalid(format!("default_material coefficients must be non-negative, got {m:?}"));
        }
        if self.toi_max_iterations == 0 {
            return invalid("toi_max_iterations must be at least 1".into());
        }
        if self.toi_substeps == 0 {
            return invalid("toi_substeps must be at least 1".into());
        }
        if self.max_bodies == 0 {
            return invalid("max_bodies must be at least 1".into());
        }
        Ok(())
    }

    /// Time-of-impact parameters for the collision detector.
    pub fn toi(&self) -> ToiSettings {
        ToiSettings {
            epsilon: self.toi_epsilon,
            max_iterations: self.toi_max_iterations,
            target_depth: self.toi_penetration_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_parse_with_aliases() {
        assert_eq!("sap".parse::<BroadPhaseKind>().unwrap(), BroadPhaseKind::SweepAndPrune);
        assert_eq!("local".parse::<IslandGeneratorKind>().unwrap(), IslandGeneratorKind::PerConnectedComponent);
        assert_eq!("sole".parse::<IslandGeneratorKind>().unwrap(), IslandGeneratorKind::SingleIsland);
        assert_eq!(NarrowPhaseKind::GjkEpa.to_string(), "gjk-epa");
        assert!(matches!("octree".parse::<BroadPhaseKind>(), Err(KinemaError::InvalidConfig(_))));
    }
}
