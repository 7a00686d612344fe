//! Summarise a scene description without rendering it.

use clap::Args;
use std::path::PathBuf;

use crate::scene::SceneDescription;

/// Print a scene's source, wall, and reverb configuration.
#[derive(Args)]
pub struct SceneInfoArgs {
    /// Path to the scene TOML file
    pub scene: PathBuf,
}

/// Run the `scene-info` command.
pub fn run(args: SceneInfoArgs) -> anyhow::Result<()> {
    let scene = SceneDescription::load(&args.scene)?;

    println!("Scene:          {}", args.scene.display());
    println!("Sample rate:    {} Hz", scene.engine.sample_rate);
    println!("Block size:     {} frames", scene.engine.frames_per_callback);
    println!("Bands:          {:?}", scene.engine.band_table_hz);
    println!(
        "Reflection/diffraction orders: {}/{}/{}",
        scene.engine.max_reflection_order,
        scene.engine.max_shadow_diffraction_order,
        scene.engine.max_specular_diffraction_order
    );
    println!(
        "Listener:       ({:.2}, {:.2}, {:.2})",
        scene.listener_position[0], scene.listener_position[1], scene.listener_position[2]
    );

    println!("\nSources: {}", scene.sources.len());
    for (i, source) in scene.sources.iter().enumerate() {
        println!(
            "  [{i}] ({:.2}, {:.2}, {:.2})",
            source.position[0], source.position[1], source.position[2]
        );
    }

    println!("\nWalls: {}", scene.walls.len());
    for (i, wall) in scene.walls.iter().enumerate() {
        println!(
            "  [{i}] absorption: {:?}",
            wall.absorption
        );
    }

    match &scene.reverb {
        Some(reverb) => {
            println!("\nLate reverb:");
            println!("  Volume:     {:.1} m^3", reverb.volume_m3);
            println!("  Dimensions: {:?} m", reverb.room_dimensions_m);
            println!("  Matrix:     {}", reverb.matrix);
            println!("  FDN channels: {}", scene.engine.fdn_channel_count);
        }
        None => println!("\nLate reverb: disabled"),
    }

    Ok(())
}
