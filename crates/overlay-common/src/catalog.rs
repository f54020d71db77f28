//! Overlay catalog loader.
//!
//! The catalog is the single source of truth for which raster overlays exist,
//! their value ranges, default opacity, color gradients and the order in which
//! they stack on the map. A built-in catalog ships with the crate; a different
//! one can be selected through the `OVERLAY_CATALOG` environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{OverlayError, OverlayResult};
use crate::scale::GradientScale;
use crate::style::GradientConfig;

/// Environment variable naming a catalog file to load instead of the built-in one.
pub const CATALOG_ENV: &str = "OVERLAY_CATALOG";

const BUILTIN_CATALOG: &str = include_str!("../config/overlays.yaml");

/// All configured overlays plus their stacking order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayCatalog {
    /// Layer names from bottom to top. Names not listed stack below all others.
    #[serde(default)]
    pub draw_order: Vec<String>,

    pub overlays: Vec<OverlayDefinition>,
}

/// One raster overlay preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayDefinition {
    /// Identifier used for lookups (e.g., "radar")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Unit label for display
    #[serde(default)]
    pub units: Option<String>,

    /// Value mapped to palette entry 0
    pub min_value: f64,

    /// Value mapped to palette entry 255
    pub max_value: f64,

    /// Overall overlay opacity in [0, 1]
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    pub gradient: GradientConfig,
}

fn default_opacity() -> f32 {
    1.0
}

impl OverlayDefinition {
    pub fn validate(&self) -> Result<(), String> {
        if !self.min_value.is_finite() || !self.max_value.is_finite() {
            return Err("min_value and max_value must be finite".to_string());
        }
        if self.min_value == self.max_value {
            return Err(format!(
                "min_value and max_value must differ (both {})",
                self.min_value
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!("opacity {} outside [0, 1]", self.opacity));
        }
        self.gradient.validate()
    }

    /// Build the color scale described by this overlay.
    pub fn color_scale(&self) -> OverlayResult<GradientScale> {
        GradientScale::from_config(&self.gradient)
    }
}

impl OverlayCatalog {
    /// The catalog compiled into the crate.
    pub fn builtin() -> OverlayResult<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Load the catalog named by `OVERLAY_CATALOG`, or the built-in one if unset.
    pub fn from_env() -> OverlayResult<Self> {
        match std::env::var(CATALOG_ENV) {
            Ok(path) if !path.is_empty() => {
                info!(path = %path, "Loading overlay catalog from {}", CATALOG_ENV);
                Self::from_file(path)
            }
            _ => {
                debug!("Using built-in overlay catalog");
                Self::builtin()
            }
        }
    }

    /// Load and validate a catalog from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a catalog from a YAML string.
    pub fn from_yaml(yaml: &str) -> OverlayResult<Self> {
        let catalog: OverlayCatalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validate every overlay and reject duplicate ids.
    pub fn validate(&self) -> OverlayResult<()> {
        for (i, overlay) in self.overlays.iter().enumerate() {
            overlay
                .validate()
                .map_err(|e| OverlayError::ConfigError(format!("{}: {}", overlay.id, e)))?;
            if self.overlays[..i].iter().any(|o| o.id == overlay.id) {
                return Err(OverlayError::ConfigError(format!(
                    "duplicate overlay id '{}'",
                    overlay.id
                )));
            }
        }
        Ok(())
    }

    /// Find an overlay by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&OverlayDefinition> {
        self.overlays.iter().find(|o| o.id.eq_ignore_ascii_case(id))
    }

    /// Find an overlay by id, failing with `OverlayNotFound`.
    pub fn require(&self, id: &str) -> OverlayResult<&OverlayDefinition> {
        self.get(id)
            .ok_or_else(|| OverlayError::OverlayNotFound(id.to_string()))
    }

    /// Stacking rank of a layer name: its index in `draw_order`, or -1 when absent.
    pub fn draw_rank(&self, name: &str) -> i64 {
        self.draw_order
            .iter()
            .position(|n| n == name)
            .map_or(-1, |i| i as i64)
    }
}
