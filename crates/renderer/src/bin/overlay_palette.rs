//! Palette inspection tool.
//!
//! Prints the 256-entry palette of a catalog overlay, as a table or as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use overlay_common::OverlayCatalog;
use renderer::palette::{build_palette, sample_value, PALETTE_SIZE};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "overlay-palette")]
#[command(about = "Print the color palette of a weather overlay")]
struct Args {
    /// Overlay id from the catalog (e.g., "radar")
    #[arg(short, long)]
    overlay: Option<String>,

    /// Catalog file; the built-in catalog is used when absent
    #[arg(short, long, env = "OVERLAY_CATALOG")]
    catalog: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Serialize)]
struct PaletteEntry {
    index: usize,
    value: f64,
    rgba: [u8; 4],
    hex: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let catalog = match &args.catalog {
        Some(path) => OverlayCatalog::from_file(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => OverlayCatalog::builtin()?,
    };

    let Some(id) = args.overlay else {
        for overlay in &catalog.overlays {
            println!(
                "{:<12} {:<14} [{}, {}] opacity {}",
                overlay.id, overlay.title, overlay.min_value, overlay.max_value, overlay.opacity
            );
        }
        return Ok(());
    };

    let definition = catalog.require(&id)?;
    let scale = definition.color_scale()?;
    let palette = build_palette(
        &scale,
        definition.min_value,
        definition.max_value,
        definition.opacity,
    );
    info!(overlay = %definition.id, "Built palette");

    let entries: Vec<PaletteEntry> = (0..PALETTE_SIZE)
        .map(|index| {
            let color = palette.color(index as u8);
            PaletteEntry {
                index,
                value: sample_value(index, definition.min_value, definition.max_value),
                rgba: color.to_array(),
                hex: color.to_hex(),
            }
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => {
            let units = definition.units.as_deref().unwrap_or("");
            println!("{} ({})", definition.title, units);
            for e in &entries {
                println!(
                    "{:>3}  {:>10.4}  {}  {:>3} {:>3} {:>3} {:>3}",
                    e.index, e.value, e.hex, e.rgba[0], e.rgba[1], e.rgba[2], e.rgba[3]
                );
            }
        }
    }

    Ok(())
}
