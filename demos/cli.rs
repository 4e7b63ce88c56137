//! Command-line interface for color_distill
//!
//! Quantizes an image file and prints its palette report as JSON, or
//! generates a palette of distinct colors.

use color_distill::{
    generate_palette, quantize_with, DistillConfig, DistillError, ImageStats, QuantizationResult,
};
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut config = DistillConfig::default();
    let mut color_count = None;
    let mut generate_count = None;
    let mut image_path_arg = None;

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--colors" => {
                color_count = Some(parse_count(&args, i));
                i += 1;
            }
            "--generate" => {
                generate_count = Some(parse_count(&args, i));
                i += 1;
            }
            "--config" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("Error: --config requires a path");
                    process::exit(1);
                };
                config = match DistillConfig::from_json_file(Path::new(path)) {
                    Ok(config) => config,
                    Err(error) => fail(&error),
                };
                i += 1;
            }
            "--help" | "-h" => {
                print_help(&args[0]);
                process::exit(0);
            }
            arg if !arg.starts_with("--") => {
                if image_path_arg.is_none() {
                    image_path_arg = Some(arg.to_string());
                } else {
                    eprintln!("Error: Multiple image paths provided");
                    process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                eprintln!("Use --help for usage information");
                process::exit(1);
            }
        }
        i += 1;
    }

    if let Some(count) = generate_count {
        match generate_palette(count, &config.palette) {
            Ok(palette) => {
                print_json(&palette);
                eprintln!();
                eprintln!("Generated {} colors in {} iterations", palette.colors.len(), palette.iterations);
                for hex in palette.hex_codes() {
                    eprintln!("  {}", hex);
                }
            }
            Err(error) => fail(&error),
        }
        return;
    }

    let image_path_str = match image_path_arg {
        Some(path) => path,
        None => {
            print_help(&args[0]);
            process::exit(1);
        }
    };
    let image_path = Path::new(&image_path_str);

    if !image_path.exists() {
        eprintln!("Error: File '{}' does not exist", image_path.display());
        process::exit(1);
    }

    let image = match image::open(image_path) {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
            eprintln!("Error: Failed to decode '{}': {}", image_path.display(), e);
            process::exit(1);
        }
    };

    // The quantizer reads B, G, R, X
    let bgra: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[2], p[1], p[0], p[3]])
        .collect();

    if let Some(count) = color_count {
        config.quantizer.color_count = count;
    }

    match quantize_with(&bgra, &config.quantizer) {
        Ok(result) => {
            let name = image_path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("image");
            print_result(name, &result);
        }
        Err(error) => fail(&error),
    }
}

fn parse_count(args: &[String], i: usize) -> usize {
    match args.get(i + 1).map(|value| value.parse::<usize>()) {
        Some(Ok(count)) => count,
        _ => {
            eprintln!("Error: {} requires a positive number", args[i]);
            process::exit(1);
        }
    }
}

fn fail(error: &DistillError) -> ! {
    eprintln!("Failed: {}", error);
    if error.is_recoverable() {
        eprintln!("Suggestion: {}", error.user_message());
    }
    process::exit(1);
}

fn print_help(program_name: &str) {
    eprintln!("Usage: {} [OPTIONS] <image_path>", program_name);
    eprintln!("       {} [OPTIONS] --generate <N>", program_name);
    eprintln!();
    eprintln!("Reduce an image to its representative colors, or generate distinct colors.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --colors <N>     Palette size for quantization (1-256, default 16)");
    eprintln!("  --generate <N>   Generate N perceptually distinct colors");
    eprintln!("  --config <FILE>  Load settings from a JSON config file");
    eprintln!("  --help, -h       Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} photo.png", program_name);
    eprintln!("  {} --colors 8 photo.jpg", program_name);
    eprintln!("  {} --config distill.json --generate 12", program_name);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            process::exit(1);
        }
    }
}

fn print_result(name: &str, result: &QuantizationResult) {
    // JSON to stdout for programmatic use
    print_json(&ImageStats::from_result(name, result));

    // Summary to stderr for human reading
    eprintln!();
    eprintln!("Quantization Summary:");
    eprintln!("  Pixels: {}", result.pixel_count);
    eprintln!("  Colors: {} (requested boxes filled: {})", result.len(), result.achieved_count);
    for (color, count) in result.entries().into_iter().take(8) {
        eprintln!(
            "  {}  {:>6.2}%",
            color.to_hex(),
            count as f64 * 100.0 / result.pixel_count as f64
        );
    }
}
