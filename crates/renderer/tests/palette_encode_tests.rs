//! Palette and raster encoding tests against the overlay catalog presets.

use std::io::Write;

use overlay_common::{OverlayCatalog, RasterField};
use renderer::palette::sample_value;
use renderer::{build_palette, encode, LayerOptions, Palette, PALETTE_SIZE};
use tempfile::NamedTempFile;
use test_utils::{
    assert_approx_eq, bounds, create_cloud_cover_grid, create_precipitation_grid,
    create_ramp_grid, geo_bounds, grayscale_scale, overlays, raster,
};

fn preset_palette(id: &str) -> Palette {
    let catalog = OverlayCatalog::builtin().unwrap();
    let definition = catalog.require(id).unwrap();
    let scale = definition.color_scale().unwrap();
    build_palette(
        &scale,
        definition.min_value,
        definition.max_value,
        definition.opacity,
    )
}

// ============================================================================
// Catalog palettes
// ============================================================================

#[test]
fn test_total_prec_palette_ends() {
    let palette = preset_palette(overlays::TOTAL_PREC);
    assert_eq!(palette.as_bytes().len(), PALETTE_SIZE * 4);
    // Dry cells are fully transparent.
    assert_eq!(palette.color(0).to_array(), [30, 60, 255, 0]);
    // 255 * 0.6 truncates to 153.
    assert_eq!(palette.color(255).to_array(), [240, 130, 40, 153]);
}

#[test]
fn test_total_cloud_is_clear_below_twenty_percent() {
    let palette = preset_palette(overlays::TOTAL_CLOUD);
    // Entry 51 samples exactly 20%.
    assert_approx_eq!(sample_value(51, 0.0, 100.0), 20.0, 1e-9);
    for i in 0..=51u8 {
        assert_eq!(palette.color(i).a, 0, "entry {} should be clear", i);
    }
    assert_eq!(palette.color(255).to_array(), [255, 255, 255, 153]);
}

#[test]
fn test_wind_speed_palette_is_opaque() {
    let palette = preset_palette(overlays::WIND_SPEED);
    assert_eq!(palette.color(0).to_array(), [50, 136, 189, 255]);
    assert_eq!(palette.color(255).to_array(), [213, 62, 79, 255]);
    assert!((0..=255u8).all(|i| palette.color(i).a == 255));
}

#[test]
fn test_radar_hides_trace_precipitation() {
    let palette = preset_palette(overlays::RADAR);
    assert_eq!(palette.color(0).a, 0);
    // Entries up to 0.1 mm/h interpolate between two transparent stops.
    for i in 0..=3u8 {
        assert!(sample_value(i as usize, 0.0, 6.4) < 0.1);
        assert_eq!(palette.color(i).a, 0);
    }
    assert!(palette.color(8).a > 0);
}

#[test]
fn test_every_builtin_overlay_builds() {
    let catalog = OverlayCatalog::builtin().unwrap();
    for definition in &catalog.overlays {
        let options = LayerOptions::from_definition(definition).unwrap();
        let palette = build_palette(
            options.color_scale.as_ref(),
            options.min_value,
            options.max_value,
            options.opacity,
        );
        assert_eq!((palette.width(), palette.height()), (256, 1), "{}", definition.id);
    }
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_precipitation_encoding_against_preset_range() {
    let field = raster(
        6,
        1,
        vec![0.0, 3.2, 6.4, 100.0, -1.0, f32::NAN],
        geo_bounds(bounds::ITALY),
    );
    let encoded = encode(&field, 0.0, 6.4);
    assert_eq!(encoded.as_bytes(), &[0, 128, 255, 255, 0, 0]);
}

#[test]
fn test_two_by_two_grid_through_grayscale() {
    let field = raster(2, 2, vec![0.0, 10.0, 20.0, 30.0], geo_bounds(bounds::EQUATORIAL));
    let encoded = encode(&field, 0.0, 30.0);
    assert_eq!(encoded.as_bytes(), &[0, 85, 170, 255]);

    let palette = build_palette(&grayscale_scale(), 0.0, 255.0, 1.0);
    let colors: Vec<[u8; 4]> = encoded
        .as_bytes()
        .iter()
        .map(|&i| palette.color(i).to_array())
        .collect();
    assert_eq!(
        colors,
        vec![
            [0, 0, 0, 255],
            [85, 85, 85, 255],
            [170, 170, 170, 255],
            [255, 255, 255, 255]
        ]
    );
}

#[test]
fn test_ramp_encoding_is_monotonic() {
    let field = RasterField::new(
        64,
        4,
        create_ramp_grid(64, 4, 0.0, 6.4),
        geo_bounds(bounds::ITALY),
    )
    .unwrap();
    let encoded = encode(&field, 0.0, 6.4);
    let first_row = &encoded.as_bytes()[..64];
    assert_eq!(first_row[0], 0);
    assert_eq!(first_row[63], 255);
    assert!(first_row.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_cloud_cover_rows_through_preset() {
    let field = raster(4, 5, create_cloud_cover_grid(4, 5), geo_bounds(bounds::ITALY));
    assert_eq!(field.get(0, 0), Some(100.0));
    assert_eq!(field.get(3, 4), Some(0.0));

    let encoded = encode(&field, 0.0, 100.0);
    let column: Vec<u8> = (0..5).map(|row| encoded.as_bytes()[row * 4]).collect();
    assert_eq!(column, vec![255, 191, 128, 64, 0]);

    // Overcast north is the top of the scale, clear south is invisible.
    let palette = preset_palette(overlays::TOTAL_CLOUD);
    assert_eq!(palette.color(column[0]).to_array(), [255, 255, 255, 153]);
    assert_eq!(palette.color(column[4]).a, 0);
    assert!(column.windows(2).all(|w| palette.color(w[0]).a >= palette.color(w[1]).a));
}

#[test]
fn test_sparse_precipitation_through_preset() {
    let samples = create_precipitation_grid(32, 32, 7);
    assert_eq!(samples, create_precipitation_grid(32, 32, 7));
    let field = raster(32, 32, samples.clone(), geo_bounds(bounds::ITALY));
    let encoded = encode(&field, 0.0, 6.4);
    let palette = preset_palette(overlays::TOTAL_PREC);

    let mut wet = 0;
    for (&rate, &index) in samples.iter().zip(encoded.as_bytes()) {
        let alpha = palette.color(index).a;
        if rate == 0.0 {
            assert_eq!(alpha, 0, "dry cells stay transparent");
        } else if rate >= 0.2 {
            wet += 1;
            assert_eq!(alpha, 153, "rain at {} mm/h is drawn", rate);
        }
    }
    assert!(wet > 0 && wet < samples.len() / 2);
}

// ============================================================================
// Catalog files
// ============================================================================

#[test]
fn test_catalog_file_drives_layer_options() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r##"
draw_order: [snow]
overlays:
  - id: snow
    title: Snow Depth
    units: cm
    min_value: 0
    max_value: 50
    opacity: 0.5
    gradient:
      stops:
        - {{ value: 0, color: "#ffffff00" }}
        - {{ value: 50, color: "#0000ffff" }}
"##
    )
    .unwrap();

    let catalog = OverlayCatalog::from_file(file.path()).unwrap();
    assert_eq!(catalog.draw_order, vec!["snow"]);

    let options = LayerOptions::from_definition(catalog.require("snow").unwrap()).unwrap();
    let palette = build_palette(
        options.color_scale.as_ref(),
        options.min_value,
        options.max_value,
        options.opacity,
    );
    assert_eq!(palette.color(0).to_array(), [255, 255, 255, 0]);
    assert_eq!(palette.color(255).to_array(), [0, 0, 255, 127]);
}
