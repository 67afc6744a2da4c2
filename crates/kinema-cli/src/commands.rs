//! CLI command implementations.

use std::time::Instant;

use kinema_dynamics::{World, WorldSettings};
use kinema_math::Vec2;
use kinema_telemetry::TracingSink;
use serde::Serialize;
use tracing::info;

use crate::scene::Scene;

/// Final state of one body.
#[derive(Debug, Serialize)]
pub struct BodySummary {
    pub id: u32,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub omega: f32,
    pub sleeping: bool,
}

/// JSON report of a finished run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub dt: f32,
    pub time: f64,
    pub contacts: usize,
    pub islands: usize,
    pub sleeping: usize,
    pub bodies: Vec<BodySummary>,
}

impl RunSummary {
    pub fn of(world: &World, dt: f32) -> Self {
        let bodies: Vec<BodySummary> = world
            .bodies()
            .map(|b| BodySummary {
                id: b.id().0,
                position: b.position,
                angle: b.angle,
                velocity: b.velocity,
                omega: b.omega,
                sleeping: b.is_sleeping(),
            })
            .collect();

        Self {
            steps: world.frame(),
            dt,
            time: world.time(),
            contacts: world.contacts().count(),
            islands: world.islands().len(),
            sleeping: bodies.iter().filter(|b| b.sleeping).count(),
            bodies,
        }
    }
}

/// Run a scene and report the final body states.
pub fn simulate(
    scene_path: &str,
    steps: u64,
    dt: f32,
    output_path: Option<&str>,
    log_events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(format!("dt must be positive, got {dt}").into());
    }

    let scene = Scene::load(scene_path)?;
    let mut world = scene.build()?;
    if log_events {
        world.add_sink(Box::new(TracingSink::new(tracing::Level::INFO)));
    }

    info!(
        scene = scene_path,
        bodies = world.body_count(),
        joints = world.joints().count(),
        steps,
        dt,
        "simulation started"
    );

    let start = Instant::now();
    for _ in 0..steps {
        world.step(dt);
    }
    let elapsed = start.elapsed();
    world.finalize();

    let summary = RunSummary::of(&world, dt);
    info!(
        wall_ms = elapsed.as_secs_f64() * 1000.0,
        contacts = summary.contacts,
        sleeping = summary.sleeping,
        "simulation finished"
    );

    let json = serde_json::to_string_pretty(&summary)?;
    match output_path {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Summary written to: {path}");
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// Validate a scene, or a bare settings file.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content)?;

    if ["settings", "bodies", "joints"].iter().any(|k| table.contains_key(*k)) {
        let scene = Scene::from_toml_str(&content)?;
        let world = scene.build()?;
        println!(
            "Scene is valid ({} bodies, {} joints).",
            world.body_count(),
            world.joints().count()
        );
    } else {
        let settings = WorldSettings::from_toml_str(&content)?;
        println!(
            "Settings are valid ({} broad phase, {} narrow phase, {} islands).",
            settings.broad_phase, settings.narrow_phase, settings.island_generator
        );
    }

    Ok(())
}
