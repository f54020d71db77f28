//! Color scales: the capability that turns a physical value into a color.

use crate::error::{OverlayError, OverlayResult};
use crate::style::{GradientConfig, Interpolation, OutOfRangeBehavior, Rgba};

/// Maps a scalar value to a straight-alpha color.
///
/// Implementations may be non-uniform or discontinuous internally, but must
/// be sample-able at any point of their domain.
pub trait ColorScale: Send + Sync {
    /// Color at `value`.
    fn sample(&self, value: f64) -> Rgba;

    /// The value range the scale is defined over, as `(low, high)`.
    fn domain(&self) -> (f64, f64);
}

/// Piecewise gradient over stops at arbitrary (ascending) positions.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientScale {
    stops: Vec<(f64, Rgba)>,
    interpolation: Interpolation,
    out_of_range: OutOfRangeBehavior,
}

impl GradientScale {
    /// Build a scale from `(value, color)` stops in strictly ascending order.
    pub fn new(stops: Vec<(f64, Rgba)>) -> OverlayResult<Self> {
        if stops.len() < 2 {
            return Err(OverlayError::ConfigError(
                "Gradient must have at least 2 color stops".to_string(),
            ));
        }
        if stops.iter().any(|(v, _)| !v.is_finite()) {
            return Err(OverlayError::ConfigError(
                "Color stop values must be finite".to_string(),
            ));
        }
        if stops.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(OverlayError::ConfigError(
                "Color stops must be in ascending value order".to_string(),
            ));
        }
        Ok(Self {
            stops,
            interpolation: Interpolation::Linear,
            out_of_range: OutOfRangeBehavior::Clamp,
        })
    }

    /// Spread `colors` evenly over `[min, max]`.
    pub fn uniform(colors: &[Rgba], min: f64, max: f64) -> OverlayResult<Self> {
        if colors.len() < 2 {
            return Err(OverlayError::ConfigError(
                "Gradient must have at least 2 colors".to_string(),
            ));
        }
        let last = (colors.len() - 1) as f64;
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (min + (max - min) * i as f64 / last, *c))
            .collect();
        Self::new(stops)
    }

    /// Build a scale from a gradient configuration block.
    pub fn from_config(config: &GradientConfig) -> OverlayResult<Self> {
        config.validate().map_err(OverlayError::ConfigError)?;
        let stops = config
            .stops
            .iter()
            .map(|s| (s.value, s.color.to_rgba()))
            .collect();
        Ok(Self::new(stops)?
            .with_interpolation(config.interpolation)
            .with_out_of_range(config.out_of_range))
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_out_of_range(mut self, out_of_range: OutOfRangeBehavior) -> Self {
        self.out_of_range = out_of_range;
        self
    }

    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    fn first(&self) -> (f64, Rgba) {
        self.stops[0]
    }

    fn last(&self) -> (f64, Rgba) {
        self.stops[self.stops.len() - 1]
    }
}

impl ColorScale for GradientScale {
    fn sample(&self, value: f64) -> Rgba {
        if value.is_nan() {
            return Rgba::TRANSPARENT;
        }

        let (low_value, low_color) = self.first();
        let (high_value, high_color) = self.last();

        if value < low_value || value > high_value {
            return match self.out_of_range {
                OutOfRangeBehavior::Transparent => Rgba::TRANSPARENT,
                OutOfRangeBehavior::Clamp if value < low_value => low_color,
                OutOfRangeBehavior::Clamp => high_color,
            };
        }

        // First stop at or above the value; the previous one brackets it.
        let upper = self
            .stops
            .iter()
            .position(|(v, _)| value <= *v)
            .unwrap_or(self.stops.len() - 1)
            .max(1);
        let (v0, c0) = self.stops[upper - 1];
        let (v1, c1) = self.stops[upper];
        let t = (value - v0) / (v1 - v0);

        match self.interpolation {
            Interpolation::Linear => c0.lerp(c1, t),
            Interpolation::Step if t < 0.5 => c0,
            Interpolation::Step => c1,
        }
    }

    fn domain(&self) -> (f64, f64) {
        (self.first().0, self.last().0)
    }
}

/// A color scale backed by a plain function.
pub struct FnScale<F> {
    domain: (f64, f64),
    f: F,
}

impl<F> FnScale<F>
where
    F: Fn(f64) -> Rgba + Send + Sync,
{
    pub fn new(domain: (f64, f64), f: F) -> Self {
        Self { domain, f }
    }
}

impl<F> ColorScale for FnScale<F>
where
    F: Fn(f64) -> Rgba + Send + Sync,
{
    fn sample(&self, value: f64) -> Rgba {
        (self.f)(value)
    }

    fn domain(&self) -> (f64, f64) {
        self.domain
    }
}
