//! Render a scene's sources through the engine and write the interleaved
//! stereo result to a WAV file. No effect chains or presets here, just a
//! scene and a signal.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use racoustic_engine::Context;
use racoustic_math::Quat;

use crate::scene::{vec3, SceneDescription};

/// Render a scene to a stereo WAV file.
#[derive(Args)]
pub struct RenderArgs {
    /// Path to the scene TOML file
    pub scene: PathBuf,

    /// Output stereo WAV file
    pub output: PathBuf,

    /// Mono WAV file to feed to every source (mixed down if stereo).
    /// Without this, a single-sample impulse is fed to source 0 so the
    /// output is the scene's impulse response.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Render length in seconds when no `--input` is given
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// How long to let the IEM background thread settle on the initial
    /// geometry before the first block is rendered, in milliseconds
    #[arg(long, default_value = "50")]
    warmup_ms: u64,
}

/// Run the `render` command.
pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let scene = SceneDescription::load(&args.scene)?;
    let sample_rate = scene.engine.sample_rate;
    let frames_per_callback = scene.engine.frames_per_callback;

    println!("Loading scene {}...", args.scene.display());
    println!(
        "  {} source(s), {} wall(s), {} Hz, {} frames/block",
        scene.sources.len(),
        scene.walls.len(),
        sample_rate,
        frames_per_callback
    );

    let mut ctx = Context::init(scene.engine.clone())
        .map_err(|err| anyhow::anyhow!("invalid engine configuration: {err}"))?;

    for wall in &scene.walls {
        let vertices = [
            vec3(wall.vertices[0]),
            vec3(wall.vertices[1]),
            vec3(wall.vertices[2]),
        ];
        if ctx.init_wall(vertices, &wall.absorption).is_none() {
            anyhow::bail!("wall rejected: absorption band count must match the engine's band table");
        }
    }
    ctx.update_planes_and_edges();

    let source_ids: Vec<_> = scene
        .sources
        .iter()
        .map(|source| {
            let id = ctx.init_source();
            ctx.update_source(id, vec3(source.position), Quat::IDENTITY);
            id
        })
        .collect();
    if source_ids.is_empty() {
        anyhow::bail!("scene has no sources");
    }

    ctx.update_listener(vec3(scene.listener_position), Quat::IDENTITY);

    if let Some(reverb) = &scene.reverb {
        let ok = ctx.init_late_reverb(
            reverb.volume_m3,
            &reverb.room_dimensions_m,
            reverb.feedback_matrix(),
        );
        if !ok {
            anyhow::bail!("late reverb rejected: room_dimensions_m must not be empty");
        }
    }

    // Let the IEM background thread publish the initial direct/reflected
    // paths before the first block is rendered.
    std::thread::sleep(Duration::from_millis(args.warmup_ms));

    let per_source_input = match &args.input {
        Some(path) => read_mono(path)?,
        None => {
            let mut impulse = vec![0.0f32; (args.duration * sample_rate) as usize];
            if let Some(first) = impulse.first_mut() {
                *first = 1.0;
            }
            impulse
        }
    };
    let total_frames = per_source_input.len();

    println!(
        "Rendering {:.2}s ({} frames)...",
        total_frames as f32 / sample_rate,
        total_frames
    );

    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut output = Vec::with_capacity(2 * total_frames);
    let mut cursor = 0;
    while cursor < total_frames {
        let end = (cursor + frames_per_callback).min(total_frames);
        let mut block = vec![0.0f32; frames_per_callback];
        block[..end - cursor].copy_from_slice(&per_source_input[cursor..end]);

        for &id in &source_ids {
            ctx.submit_audio(id, &block);
        }
        if !ctx.process_output() {
            tracing::warn!(cursor, "process_output dropped a non-finite block");
        }
        if let Some(buf) = ctx.get_output_buffer() {
            output.extend_from_slice(&buf[..2 * (end - cursor)]);
        } else {
            output.extend(std::iter::repeat(0.0f32).take(2 * (end - cursor)));
        }

        pb.set_position(end as u64);
        cursor = end;
    }
    pb.finish_with_message("done");

    write_stereo_wav(&args.output, &output, sample_rate as u32)?;
    println!("Wrote {} frames to {}", total_frames, args.output.display());

    Ok(())
}

fn read_mono(path: &std::path::Path) -> anyhow::Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max))
                .collect::<Result<_, _>>()?
        }
    };

    if channels <= 1 {
        return Ok(samples);
    }
    Ok(samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect())
}

fn write_stereo_wav(path: &std::path::Path, interleaved: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
