//! racoustic CLI - builds a scene from a TOML description and renders it
//! through the spatialiser engine.

mod commands;
mod scene;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "racoustic")]
#[command(author, version, about = "Geometric room-acoustics spatialiser CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene's sources through the engine to a stereo WAV file
    Render(commands::render::RenderArgs),

    /// List available audio output devices
    Devices(commands::devices::DevicesArgs),

    /// Summarise a scene description without rendering it
    SceneInfo(commands::scene_info::SceneInfoArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    tracing::debug!(command = ?std::mem::discriminant(&cli.command), "dispatching command");

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::SceneInfo(args) => commands::scene_info::run(args),
    }
}
