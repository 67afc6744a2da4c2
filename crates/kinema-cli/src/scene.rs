//! TOML scene descriptions.
//!
//! ```toml
//! [settings]
//! gravity = [0.0, -9.8]
//!
//! [[bodies]]
//! static = true
//! position = [0.0, -0.5]
//! shape = { type = "rect", width = 20.0, height = 1.0 }
//!
//! [[bodies]]
//! position = [0.0, 3.0]
//! shape = { type = "circle", radius = 0.5 }
//! material = { friction = 0.2, restitution = 0.8 }
//!
//! [[joints]]
//! type = "distance"
//! body_a = 0
//! body_b = 1
//! ```
//!
//! Joints name bodies by their index in `bodies`, which is also the id the
//! body receives in the freshly built world.

use std::path::Path;

use kinema_collision::Material;
use kinema_dynamics::{BodyDef, ColliderDef, JointDef, World, WorldSettings};
use kinema_geometry::{MeshShape, Polygon, Shape};
use kinema_math::Vec2;
use kinema_types::constants::MASK_ALL;
use kinema_types::{BodyId, KinemaError, KinemaResult};
use serde::{Deserialize, Serialize};

/// Collision shape of a scene body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShapeDef {
    Circle {
        radius: f32,
    },
    Rect {
        width: f32,
        height: f32,
    },
    Polygon {
        points: Vec<Vec2>,
    },
    Mesh {
        triangles: Vec<[Vec2; 3]>,
        /// Recentre the triangles on their centroid.
        #[serde(default)]
        centered: bool,
    },
}

impl ShapeDef {
    pub fn build(&self) -> KinemaResult<Shape> {
        Ok(match self {
            ShapeDef::Circle { radius } => Shape::circle(*radius),
            ShapeDef::Rect { width, height } => Shape::rect(*width, *height),
            ShapeDef::Polygon { points } => Shape::Polygon(Polygon::new(points.clone())?),
            ShapeDef::Mesh { triangles, centered } => {
                let mesh = if *centered {
                    MeshShape::centered(triangles.clone())?
                } else {
                    MeshShape::new(triangles.clone())?
                };
                Shape::Mesh(mesh)
            }
        })
    }
}

fn default_mask() -> u32 {
    MASK_ALL
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBody {
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub mass: Option<f32>,
    /// Derived from the shape and mass when omitted.
    #[serde(default)]
    pub inertia: Option<f32>,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub velocity: Vec2,
    #[serde(default)]
    pub omega: f32,
    #[serde(default)]
    pub continuous: bool,
    #[serde(default)]
    pub shape: Option<ShapeDef>,
    /// `None` takes the world's default material.
    #[serde(default)]
    pub material: Option<Material>,
    #[serde(default = "default_mask")]
    pub mask: u32,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
}

impl SceneBody {
    fn body_def(&self, shape: Option<&Shape>) -> BodyDef {
        let def = if self.is_static {
            BodyDef::fixed()
        } else {
            let mass = self.mass.unwrap_or(1.0);
            let inertia = self
                .inertia
                .or_else(|| shape.map(|s| s.inertia(mass)))
                .unwrap_or(1.0);
            BodyDef::dynamic(mass, inertia)
        };
        BodyDef {
            position: self.position,
            angle: self.angle,
            velocity: self.velocity,
            omega: self.omega,
            continuous: self.continuous,
            ..def
        }
    }
}

/// Settings, bodies and joints of one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub settings: WorldSettings,
    pub bodies: Vec<SceneBody>,
    pub joints: Vec<JointDef>,
}

impl Scene {
    pub fn from_toml_str(content: &str) -> KinemaResult<Self> {
        toml::from_str(content).map_err(|e| KinemaError::Serialization(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> KinemaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Builds a world holding every body, collider and joint of the scene.
    pub fn build(&self) -> KinemaResult<World> {
        let mut world = World::new(self.settings.clone())?;

        for (index, body) in self.bodies.iter().enumerate() {
            let shape = body.shape.as_ref().map(ShapeDef::build).transpose()?;
            let id = world.create_body(body.body_def(shape.as_ref()))?;
            if id != BodyId(index as u32) {
                return Err(KinemaError::InvariantViolation(format!(
                    "scene body {index} was created as {id}"
                )));
            }

            if let Some(shape) = shape {
                let mut collider = ColliderDef::new(id, shape)
                    .with_mask(body.mask)
                    .with_virtual(body.is_virtual);
                collider.material = body.material;
                world.add_collider(collider)?;
            }
        }

        for joint in &self.joints {
            world.add_joint(joint.clone())?;
        }

        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PENDULUM: &str = r#"
        [settings]
        gravity = [0.0, -10.0]
        solver_iterations = 20

        [[bodies]]
        static = true

        [[bodies]]
        position = [1.0, 0.0]
        shape = { type = "circle", radius = 0.1 }
        material = { friction = 0.2 }

        [[joints]]
        type = "distance"
        body_a = 0
        body_b = 1
    "#;

    #[test]
    fn pendulum_scene_builds() {
        let scene = Scene::from_toml_str(PENDULUM).unwrap();
        assert_eq!(scene.settings.solver_iterations, 20);
        assert_eq!(scene.bodies.len(), 2);
        assert!(scene.bodies[0].is_static);
        assert_eq!(scene.bodies[1].mask, MASK_ALL);

        let world = scene.build().unwrap();
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.joints().count(), 1);
        assert!(world.body(BodyId(0)).unwrap().is_static());

        // Solid disc: m r² / 2
        let bob = world.body(BodyId(1)).unwrap();
        assert!((bob.inertia() - 0.005).abs() < 1e-6);
        assert!(bob.collider().is_some());
    }

    #[test]
    fn polygon_and_mesh_shapes_parse() {
        let scene = Scene::from_toml_str(
            r#"
            [[bodies]]
            shape = { type = "polygon", points = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] }

            [[bodies]]
            static = true

            [bodies.shape]
            type = "mesh"
            centered = true
            triangles = [
                [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]],
                [[2.0, 0.0], [2.0, 2.0], [0.0, 2.0]],
            ]
            "#,
        )
        .unwrap();

        assert!(matches!(scene.bodies[0].shape, Some(ShapeDef::Polygon { .. })));
        let world = scene.build().unwrap();
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn bundled_scene_builds() {
        let scene = Scene::from_toml_str(include_str!("../../../scenes/pendulum.toml")).unwrap();
        let world = scene.build().unwrap();
        assert_eq!(world.body_count(), 5);
        assert!(world.body(BodyId(4)).unwrap().is_continuous());
        assert!(world.body(BodyId(1)).unwrap().collider().is_none());
    }

    #[test]
    fn joint_on_missing_body_fails() {
        let scene = Scene::from_toml_str(
            r#"
            [[bodies]]

            [[joints]]
            type = "weld"
            body_a = 0
            body_b = 3
            "#,
        )
        .unwrap();

        assert!(matches!(scene.build(), Err(KinemaError::UnknownBody(BodyId(3)))));
    }

    #[test]
    fn malformed_scene_is_a_serialization_error() {
        let err = Scene::from_toml_str("[[bodies]]\nshape = { type = \"hexagon\" }").unwrap_err();
        assert!(matches!(err, KinemaError::Serialization(_)));
    }
}
