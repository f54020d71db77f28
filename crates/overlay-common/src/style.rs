//! Color configuration for weather overlays.
//!
//! This module defines the JSON/YAML schema used to describe continuous
//! color gradients: ordered color stops, how to interpolate between them and
//! what to do with values outside the stop range.

use serde::{Deserialize, Serialize};

/// An 8-bit straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear interpolation of all four channels, rounded to the nearest byte.
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Lowercase `#rrggbbaa` representation.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Color representation supporting multiple formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Hex string ("#RRGGBB" or "#RRGGBBAA") or a named color
    Text(String),
}

impl Color {
    /// Convert to RGBA.
    ///
    /// Unparseable text falls back to opaque black.
    pub fn to_rgba(&self) -> Rgba {
        match self {
            Color::Rgba { r, g, b, a } => Rgba::new(*r, *g, *b, *a),
            Color::Array(arr) => Rgba::new(
                arr.first().copied().unwrap_or(0),
                arr.get(1).copied().unwrap_or(0),
                arr.get(2).copied().unwrap_or(0),
                arr.get(3).copied().unwrap_or(255),
            ),
            Color::Text(s) if s.starts_with('#') => {
                parse_hex_color(s).unwrap_or(Rgba::opaque(0, 0, 0))
            }
            Color::Text(name) => named_color(name),
        }
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Color::Rgba {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(s: &str) -> Option<Rgba> {
    let s = s.trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();

    match s.len() {
        6 => Some(Rgba::new(channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some(Rgba::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

fn named_color(name: &str) -> Rgba {
    match name.to_lowercase().as_str() {
        "transparent" => Rgba::TRANSPARENT,
        "white" => Rgba::opaque(255, 255, 255),
        "red" => Rgba::opaque(255, 0, 0),
        "green" => Rgba::opaque(0, 255, 0),
        "blue" => Rgba::opaque(0, 0, 255),
        "yellow" => Rgba::opaque(255, 255, 0),
        "cyan" => Rgba::opaque(0, 255, 255),
        "magenta" => Rgba::opaque(255, 0, 255),
        "orange" => Rgba::opaque(255, 165, 0),
        "purple" => Rgba::opaque(128, 0, 128),
        "gray" | "grey" => Rgba::opaque(128, 128, 128),
        _ => Rgba::opaque(0, 0, 0),
    }
}

/// Continuous gradient color mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Color stops defining the gradient
    pub stops: Vec<ColorStop>,

    /// How to interpolate between stops
    #[serde(default)]
    pub interpolation: Interpolation,

    /// How to handle values outside the defined range
    #[serde(default)]
    pub out_of_range: OutOfRangeBehavior,
}

impl GradientConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.stops.len() < 2 {
            return Err("Gradient must have at least 2 color stops".to_string());
        }

        if self.stops.iter().any(|s| !s.value.is_finite()) {
            return Err("Color stop values must be finite".to_string());
        }

        // Check stops are in ascending order
        for i in 1..self.stops.len() {
            if self.stops[i].value <= self.stops[i - 1].value {
                return Err("Color stops must be in ascending value order".to_string());
            }
        }

        Ok(())
    }
}

/// A color stop in a gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorStop {
    /// The data value at this stop
    pub value: f64,

    /// The color at this stop
    pub color: Color,

    /// Optional label for legend
    #[serde(default)]
    pub label: Option<String>,
}

/// Interpolation method between color stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

/// Behavior for values outside the gradient range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangeBehavior {
    #[default]
    Clamp,
    Transparent,
}
