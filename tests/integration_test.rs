//! Integration tests for quantization and palette generation
//!
//! These tests exercise the public API end to end:
//! - Wu quantization of synthetic BGRA buffers
//! - Nearest-color quantization and image statistics
//! - Palette generation in both refinement modes
//! - Configuration files
//! - Error handling for invalid input

use std::thread;
use std::time::Duration;

use color_distill::{
    generate_palette, quantize, Bounds, CancellationToken, Color, ColorQuantizer, DistanceMetric,
    DistillConfig, DistillError, GenerationMode, ImageStats, LabColor, LinearQuantizer,
    PaletteConfig, PaletteGenerator, SamplePool, WuQuantizer,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bgra(colors: &[(u8, u8, u8)]) -> Vec<u8> {
    colors.iter().flat_map(|&(r, g, b)| [b, g, r, 255]).collect()
}

// ============================================================================
// Wu Quantizer
// ============================================================================

#[test]
fn test_uniform_image_yields_single_entry() {
    let image = bgra(&[(10, 20, 30); 16]);
    let result = quantize(&image, 8).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.counts.get(&Color::new(10, 20, 30)), Some(&16));
}

#[test]
fn test_gray_ramp_partitions_contiguously() {
    let grays: Vec<(u8, u8, u8)> = (0..=255u8).map(|v| (v, v, v)).collect();
    let result = quantize(&bgra(&grays), 8).unwrap();

    assert!(result.len() <= 8);
    assert_eq!(result.total(), 256);

    let mut entries = result.entries();
    entries.sort_by_key(|(color, _)| color.r);

    // Each box holds a run of consecutive levels and reports their mean
    let mut start = 0usize;
    for (color, count) in entries {
        assert_eq!(color.r, color.g);
        assert_eq!(color.g, color.b);
        let expected_mean = (2 * start + count - 1) / 2;
        assert_eq!(color.r as usize, expected_mean);
        start += count;
    }
    assert_eq!(start, 256);
}

#[test]
fn test_distinct_colors_fill_palette() {
    let colors = [
        (255, 0, 0),
        (0, 255, 0),
        (0, 0, 255),
        (255, 255, 0),
        (0, 255, 255),
        (255, 0, 255),
    ];
    let pixels: Vec<(u8, u8, u8)> = colors.iter().cycle().take(60).copied().collect();
    let result = quantize(&bgra(&pixels), 6).unwrap();

    assert_eq!(result.len(), 6);
    for (r, g, b) in colors {
        assert_eq!(result.counts.get(&Color::new(r, g, b)), Some(&10));
    }
}

#[test]
fn test_coarse_histogram_merges_nearby_colors() {
    let image = bgra(&[(0, 0, 0), (1, 1, 1), (2, 2, 2), (3, 3, 3)]);
    let quantizer = WuQuantizer::with_index_bits(1).unwrap();
    let result = quantizer.quantize(&image, 4).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.counts.get(&Color::new(1, 1, 1)), Some(&4));
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_quantize_rejects_bad_input() {
    assert!(matches!(quantize(&[], 8), Err(DistillError::EmptyImage)));
    assert!(matches!(
        quantize(&[0; 5], 8),
        Err(DistillError::MisalignedImage { length: 5 })
    ));

    let image = bgra(&[(1, 2, 3)]);
    for count in [0, 257] {
        match quantize(&image, count) {
            Err(DistillError::InvalidParameter { parameter, .. }) => assert_eq!(parameter, "color_count"),
            other => panic!("Expected InvalidParameter, got: {:?}", other),
        }
    }
}

#[test]
fn test_errors_have_user_messages() {
    let err = quantize(&[], 8).unwrap_err();
    assert!(err.user_message().contains("BGRA"));
    assert!(!err.is_recoverable());
}

// ============================================================================
// Linear Quantizer and Statistics
// ============================================================================

#[test]
fn test_linear_quantizer_matches_nearest_color() {
    let palette = vec![Color::new(255, 0, 0), Color::new(0, 0, 255)];
    let quantizer = LinearQuantizer::with_palette(palette).unwrap();
    let image = bgra(&[(200, 40, 40), (30, 30, 220), (180, 10, 60)]);

    let result = quantizer.quantize(&image, 2).unwrap();
    assert_eq!(result.counts.get(&Color::new(255, 0, 0)), Some(&2));
    assert_eq!(result.counts.get(&Color::new(0, 0, 255)), Some(&1));
}

#[test]
fn test_image_stats_from_quantization() {
    let mut pixels = vec![(250, 250, 250); 3];
    pixels.push((5, 5, 5));
    let result = quantize(&bgra(&pixels), 4).unwrap();
    let stats = ImageStats::from_result("synthetic", &result);

    assert_eq!(stats.name, "synthetic");
    assert_eq!(stats.colors[0].name, "#FAFAFA");
    assert!((stats.colors[0].factor - 75.0).abs() < 1e-9);
    let total: f64 = stats.colors.iter().map(|c| c.factor).sum();
    assert!((total - 100.0).abs() < 1e-9);
}

// ============================================================================
// Palette Generation
// ============================================================================

#[test]
fn test_force_mode_quality_one() {
    let config = PaletteConfig {
        mode: GenerationMode::Force,
        quality: 1,
        seed: Some(2024),
        ..PaletteConfig::default()
    };
    let palette = generate_palette(5, &config).unwrap();

    assert_eq!(palette.colors.len(), 5);
    assert!(palette.iterations <= 20);
    assert!(palette.lab.iter().all(LabColor::is_valid_rgb));
}

#[test]
fn test_kmeans_respects_bounds() {
    let config = PaletteConfig {
        hue: Bounds::new(180.0, 300.0),
        chroma: Bounds::new(20.0, 70.0),
        lightness: Bounds::new(30.0, 80.0),
        quality: 20,
        seed: Some(7),
        ..PaletteConfig::default()
    };
    let palette = generate_palette(6, &config).unwrap();

    assert_eq!(palette.colors.len(), 6);
    for lab in &palette.lab {
        assert!(config.within_bounds(lab), "{:?} is outside the bounds", lab);
    }
}

#[test]
fn test_kmeans_lab_lattice_with_compromise_distance() {
    let config = PaletteConfig {
        pool: SamplePool::LabLattice { fine: false },
        distance: DistanceMetric::Compromise,
        quality: 3,
        seed: Some(1),
        ..PaletteConfig::default()
    };
    let palette = generate_palette(4, &config).unwrap();
    assert_eq!(palette.colors.len(), 4);
}

#[test]
fn test_palette_is_contrast_ordered() {
    let config = PaletteConfig { quality: 10, seed: Some(3), ..PaletteConfig::default() };
    let palette = generate_palette(5, &config).unwrap();

    // Each next color is the farthest remaining one from its predecessor
    for i in 1..palette.lab.len() {
        let chosen = palette.lab[i - 1].distance_squared(&palette.lab[i]);
        for later in &palette.lab[i..] {
            assert!(palette.lab[i - 1].distance_squared(later) <= chosen + 1e-9);
        }
    }
}

#[test]
fn test_custom_predicate() {
    let config = PaletteConfig {
        mode: GenerationMode::Force,
        quality: 2,
        ..PaletteConfig::default()
    };
    let generator = PaletteGenerator::new(config).unwrap();
    let mut rng = StdRng::seed_from_u64(77);
    let light = |lab: &LabColor| lab.l >= 60.0;

    let palette = generator.generate(4, &light, &mut rng).unwrap();
    assert!(palette.lab.iter().all(|lab| lab.l >= 60.0));
}

#[test]
fn test_unsatisfiable_predicate() {
    let generator = PaletteGenerator::new(PaletteConfig {
        mode: GenerationMode::Force,
        ..PaletteConfig::default()
    })
    .unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let result = generator.generate(2, &|_: &LabColor| false, &mut rng);

    let err = result.unwrap_err();
    assert!(matches!(err, DistillError::UnsatisfiablePredicate { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_cancellation_from_another_thread() {
    let config = PaletteConfig {
        mode: GenerationMode::Force,
        quality: 1_000_000,
        distance: DistanceMetric::Cmc,
        ..PaletteConfig::default()
    };
    let token = CancellationToken::new();
    let generator = PaletteGenerator::new(config).unwrap().with_cancellation(token.clone());

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        token.cancel();
    });

    let mut rng = StdRng::seed_from_u64(10);
    let palette = generator.generate(8, &|_: &LabColor| true, &mut rng).unwrap();
    canceller.join().unwrap();

    assert!(palette.cancelled);
    assert!(palette.iterations < 20_000_000);
    assert_eq!(palette.colors.len(), 8);
    assert!(palette.lab.iter().all(LabColor::is_valid_rgb));
}

// ============================================================================
// Configuration Files
// ============================================================================

#[test]
fn test_config_file_drives_generation() {
    let path = std::env::temp_dir().join(format!("color_distill_it_{}.json", std::process::id()));
    let config = DistillConfig {
        palette: PaletteConfig {
            mode: GenerationMode::Force,
            quality: 1,
            seed: Some(12),
            ..PaletteConfig::default()
        },
        ..DistillConfig::default()
    };
    config.to_json_file(&path).unwrap();
    let loaded = DistillConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let first = generate_palette(3, &loaded.palette).unwrap();
    let second = generate_palette(3, &config.palette).unwrap();
    assert_eq!(first.colors, second.colors);
}

#[test]
fn test_invalid_config_file_rejected() {
    let path = std::env::temp_dir().join(format!("color_distill_bad_{}.json", std::process::id()));
    std::fs::write(&path, r#"{"quantizer": {"color_count": 999, "index_bits": 7}}"#).unwrap();
    let result = DistillConfig::from_json_file(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(DistillError::InvalidParameter { .. })));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_counts_sum_to_pixel_count(
        pixels in prop::collection::vec(any::<[u8; 4]>(), 1..300),
        color_count in 1usize..=256,
    ) {
        let image: Vec<u8> = pixels.iter().flatten().copied().collect();
        let result = quantize(&image, color_count).unwrap();

        prop_assert_eq!(result.total(), pixels.len());
        prop_assert!(!result.is_empty());
        prop_assert!(result.len() <= color_count);
        prop_assert!(result.achieved_count <= color_count);
    }

    #[test]
    fn prop_rgb_lab_roundtrip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let color = Color::new(r, g, b);
        let back = color.to_lab().to_rgb();

        prop_assert!((back.r as i16 - r as i16).abs() <= 1);
        prop_assert!((back.g as i16 - g as i16).abs() <= 1);
        prop_assert!((back.b as i16 - b as i16).abs() <= 1);
    }
}
