//! Generate a default configuration file
//!
//! Writes a JSON config with all default parameters

use color_distill::DistillConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_config.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} config/distill.json", args[0]);
        process::exit(1);
    }

    let output_path = Path::new(&args[1]);

    if let Some(parent) = output_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            process::exit(1);
        }
    }

    let config = DistillConfig::default();

    match config.to_json_file(output_path) {
        Ok(_) => {
            eprintln!("Configuration saved to {}", output_path.display());
            eprintln!();
            eprintln!("Config summary:");
            eprintln!(
                "  Quantizer: {} colors, {}-bit histogram",
                config.quantizer.color_count, config.quantizer.index_bits
            );
            eprintln!(
                "  Palette: {:?} mode, {:?} distance, quality {}",
                config.palette.mode, config.palette.distance, config.palette.quality
            );
            eprintln!(
                "  Bounds: hue {:.0}-{:.0}, chroma {:.0}-{:.0}, lightness {:.0}-{:.0}",
                config.palette.hue.min,
                config.palette.hue.max,
                config.palette.chroma.min,
                config.palette.chroma.max,
                config.palette.lightness.min,
                config.palette.lightness.max
            );
        }
        Err(e) => {
            eprintln!("Error saving config: {}", e);
            process::exit(1);
        }
    }
}
