//! Palette lookup tables for single-channel overlays.
//!
//! The palette carries all color: entry `i` is the color scale evaluated at
//! `min + i/255 * (max - min)`, with the scale's alpha multiplied by the
//! overlay opacity and truncated to a byte. The encoded raster only indexes
//! into it.

use overlay_common::{ColorScale, Rgba};
use tracing::{error, warn};

/// Number of palette entries.
pub const PALETTE_SIZE: usize = 256;

/// A 256x1 RGBA lookup table, 4 bytes per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    rgba: Vec<u8>,
}

impl Palette {
    /// Raw texture bytes, `PALETTE_SIZE * 4` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    /// Entry `index` as a color.
    pub fn color(&self, index: u8) -> Rgba {
        let i = index as usize * 4;
        Rgba::new(self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3])
    }

    pub fn width(&self) -> u32 {
        PALETTE_SIZE as u32
    }

    pub fn height(&self) -> u32 {
        1
    }
}

/// The value fed to the color scale for palette entry `index`.
///
/// Entry 0 is exactly `min` and entry 255 exactly `max`.
pub fn sample_value(index: usize, min: f64, max: f64) -> f64 {
    if index + 1 >= PALETTE_SIZE {
        return max;
    }
    min + index as f64 / (PALETTE_SIZE - 1) as f64 * (max - min)
}

/// Sample `scale` at 256 evenly spaced values over `[min, max]`.
///
/// `min == max` is a configuration error: it is logged and the palette is
/// still built, every entry holding the color at `min`.
pub fn build_palette(scale: &dyn ColorScale, min: f64, max: f64, opacity: f32) -> Palette {
    if min == max {
        error!(
            min_value = min,
            max_value = max,
            "max_value is equal to min_value, palette is degenerate"
        );
    }
    let opacity = if (0.0..=1.0).contains(&opacity) {
        opacity
    } else {
        warn!(opacity, "Overlay opacity outside [0, 1], clamping");
        if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        }
    };

    let mut rgba = Vec::with_capacity(PALETTE_SIZE * 4);
    for i in 0..PALETTE_SIZE {
        let color = scale.sample(sample_value(i, min, max));
        // Truncates: alpha 128 at opacity 0.6 is 76.
        let alpha = (color.a as f32 * opacity).clamp(0.0, 255.0) as u8;
        rgba.extend_from_slice(&[color.r, color.g, color.b, alpha]);
    }

    Palette { rgba }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::{FnScale, GradientScale};
    use std::sync::Mutex;

    #[test]
    fn test_sample_values_hit_both_ends() {
        assert_eq!(sample_value(0, -3.5, 12.25), -3.5);
        assert_eq!(sample_value(255, -3.5, 12.25), 12.25);
        for i in 0..PALETTE_SIZE {
            let v = sample_value(i, 0.0, 6.4);
            assert!((0.0..=6.4).contains(&v));
        }
    }

    #[test]
    fn test_scale_is_sampled_in_range() {
        let seen = Mutex::new(Vec::new());
        let scale = FnScale::new((0.0, 30.0), |v| {
            seen.lock().unwrap().push(v);
            Rgba::opaque(0, 0, 0)
        });
        build_palette(&scale, 0.0, 30.0, 1.0);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), PALETTE_SIZE);
        assert_eq!(seen[0], 0.0);
        assert_eq!(seen[255], 30.0);
        assert!(seen.iter().all(|v| (0.0..=30.0).contains(v)));
    }

    #[test]
    fn test_opacity_scales_alpha_only() {
        let scale = GradientScale::uniform(
            &[Rgba::new(10, 20, 30, 255), Rgba::new(10, 20, 30, 255)],
            0.0,
            1.0,
        )
        .unwrap();
        let palette = build_palette(&scale, 0.0, 1.0, 0.6);
        assert_eq!(palette.color(0), Rgba::new(10, 20, 30, 153));
        assert_eq!(palette.color(255), Rgba::new(10, 20, 30, 153));
    }

    #[test]
    fn test_scaled_alpha_truncates() {
        let half = FnScale::new((0.0, 1.0), |_| Rgba::new(0, 0, 0, 128));
        assert_eq!(build_palette(&half, 0.0, 1.0, 0.6).color(0).a, 76);
        assert_eq!(build_palette(&half, 0.0, 1.0, 0.5).color(0).a, 64);

        let opaque = FnScale::new((0.0, 1.0), |_| Rgba::opaque(0, 0, 0));
        assert_eq!(build_palette(&opaque, 0.0, 1.0, 0.5).color(0).a, 127);
    }

    #[test]
    fn test_deterministic() {
        let scale = GradientScale::uniform(
            &[Rgba::TRANSPARENT, Rgba::opaque(255, 128, 0)],
            0.0,
            6.4,
        )
        .unwrap();
        let a = build_palette(&scale, 0.0, 6.4, 0.6);
        let b = build_palette(&scale, 0.0, 6.4, 0.6);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes().len(), PALETTE_SIZE * 4);
    }

    #[test]
    fn test_degenerate_range_still_builds() {
        let scale = GradientScale::uniform(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)], 0.0, 10.0)
            .unwrap();
        let palette = build_palette(&scale, 5.0, 5.0, 1.0);
        assert!(palette.as_bytes().chunks(4).all(|c| c == [128, 128, 128, 255]));
    }

    #[test]
    fn test_out_of_range_opacity_is_clamped() {
        let scale = FnScale::new((0.0, 1.0), |_| Rgba::opaque(1, 2, 3));
        let palette = build_palette(&scale, 0.0, 1.0, 3.0);
        assert_eq!(palette.color(7).a, 255);
    }
}
