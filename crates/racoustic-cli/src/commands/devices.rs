//! Audio output device enumeration, for picking a `--output-device` value
//! before a real-time host is wired up. This engine itself never opens a
//! device; rendering always goes to a WAV file (see [`crate::commands::render`]).

use clap::Args;
use cpal::traits::{DeviceTrait, HostTrait};

/// List the host's available audio output devices.
#[derive(Args)]
pub struct DevicesArgs {
    /// Print every supported output configuration per device, not just the default
    #[arg(long)]
    verbose: bool,
}

/// Run the `devices` command.
pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices: Vec<_> = host.output_devices()?.collect();

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    let default_name = host
        .default_output_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    println!("Available Output Devices");
    println!("=========================\n");

    for (idx, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
        let marker = if name == default_name { " (default)" } else { "" };
        println!("  [{idx}] {name}{marker}");

        if args.verbose {
            if let Ok(config) = device.default_output_config() {
                println!(
                    "        {} channel(s), {} Hz, {:?}",
                    config.channels(),
                    config.sample_rate(),
                    config.sample_format()
                );
            }
        }
    }

    println!("\nTotal: {} device(s)", devices.len());
    Ok(())
}
