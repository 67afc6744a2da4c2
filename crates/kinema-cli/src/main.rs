//! Kinema CLI: run and validate scenes.

use clap::{Parser, Subcommand};
use kinema_types::constants::DEFAULT_DT;
use tracing_subscriber::EnvFilter;

mod commands;
mod scene;

#[derive(Parser)]
#[command(name = "kinema")]
#[command(version, about = "Kinema: 2D rigid body simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scene for a number of steps.
    Simulate {
        /// Path to the scene (TOML).
        #[arg(short, long)]
        scene: String,

        /// Number of steps to run.
        #[arg(short = 'n', long, default_value_t = 600)]
        steps: u64,

        /// Step length in seconds.
        #[arg(long, default_value_t = DEFAULT_DT)]
        dt: f32,

        /// Write the JSON summary here instead of stdout.
        #[arg(short, long)]
        output: Option<String>,

        /// Log every world event.
        #[arg(long)]
        events: bool,
    },

    /// Validate a settings or scene file.
    Validate {
        /// Path to the file (TOML).
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            scene,
            steps,
            dt,
            output,
            events,
        } => commands::simulate(&scene, steps, dt, output.as_deref(), events),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
