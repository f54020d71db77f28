//! Rendering context abstraction.
//!
//! A [`GpuContext`] is anything that can hold a shading program, 2D textures
//! and an indexed triangle mesh, draw them onto a surface and give the
//! resources back on demand. Contexts are obtained through
//! [`ContextProbes`], an ordered list of backends tried until one succeeds.

use std::fmt;
use std::sync::Arc;

use overlay_common::{OverlayError, OverlayResult};
use tracing::{debug, error};

use crate::compositor::{Shader, Uniforms};

/// Handle to a program created by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Handle to a texture created by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Handle to a mesh created by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Texel layout of an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// One byte per texel, read back as the alpha channel.
    Alpha8,
    /// Four bytes per texel, straight alpha.
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::Alpha8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// Texture upload parameters. Sampling is nearest with clamp-to-edge on both axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    /// Check that `data` holds exactly one texel per position.
    pub fn validate(&self, data: &[u8]) -> OverlayResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(OverlayError::InvalidUpload {
                label: self.label.clone(),
                message: format!("empty texture {}x{}", self.width, self.height),
            });
        }
        let expected =
            self.width as usize * self.height as usize * self.format.bytes_per_texel();
        if data.len() != expected {
            return Err(OverlayError::InvalidUpload {
                label: self.label.clone(),
                message: format!("expected {} bytes, got {}", expected, data.len()),
            });
        }
        Ok(())
    }
}

/// One mesh vertex: a base-grid position and its texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
}

/// Everything needed for one indexed triangle draw.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub program: ProgramId,
    pub mesh: MeshId,
    /// Texture units in binding order.
    pub textures: Vec<TextureId>,
    pub uniforms: Uniforms,
}

/// A read-back RGBA surface, straight alpha, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A fully transparent frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// RGBA at canvas pixel (x, y), origin top-left.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Number of live resources held by a context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub programs: usize,
    pub textures: usize,
    pub meshes: usize,
}

/// A rendering surface with its GPU-side resources.
pub trait GpuContext {
    /// Backend name, for diagnostics.
    fn backend(&self) -> &str;

    /// Current surface size in pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Match the surface to the display size.
    fn resize(&mut self, width: u32, height: u32);

    fn create_program(&mut self, shader: Arc<dyn Shader>) -> OverlayResult<ProgramId>;

    fn create_texture(&mut self, desc: &TextureDesc, data: &[u8]) -> OverlayResult<TextureId>;

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) -> OverlayResult<MeshId>;

    fn destroy_program(&mut self, id: ProgramId);

    fn destroy_texture(&mut self, id: TextureId);

    fn destroy_mesh(&mut self, id: MeshId);

    /// Fill the whole surface with `color` (straight-alpha RGBA in [0, 1]).
    fn clear(&mut self, color: [f32; 4]);

    /// Issue one draw, blending with straight alpha over the current surface.
    fn draw(&mut self, call: &DrawCall) -> OverlayResult<()>;

    /// Copy of the current surface, if the backend supports read-back.
    fn read_pixels(&self) -> Option<Frame>;

    /// Live resources held by this context.
    fn resource_counts(&self) -> ResourceCounts;

    /// Release the context and everything it still holds, immediately.
    fn lose_context(&mut self);

    fn is_lost(&self) -> bool;
}

/// One way of obtaining a rendering context.
pub trait ContextProbe {
    /// Name used in diagnostics (e.g., "software").
    fn name(&self) -> &str;

    /// Try to create a context for a surface of `size`; `None` if unavailable.
    fn probe(&self, size: (u32, u32)) -> Option<Box<dyn GpuContext>>;
}

/// Context backends in priority order.
#[derive(Default)]
pub struct ContextProbes {
    probes: Vec<Box<dyn ContextProbe>>,
}

impl fmt::Debug for ContextProbes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.probes.iter().map(|p| p.name()))
            .finish()
    }
}

impl ContextProbes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a probe with lower priority than those already present.
    pub fn with(mut self, probe: impl ContextProbe + 'static) -> Self {
        self.push(Box::new(probe));
        self
    }

    pub fn push(&mut self, probe: Box<dyn ContextProbe>) {
        self.probes.push(probe);
    }

    /// The first context any probe yields, trying them in order.
    pub fn acquire(&self, size: (u32, u32)) -> OverlayResult<Box<dyn GpuContext>> {
        let mut tried = Vec::with_capacity(self.probes.len());
        for probe in &self.probes {
            match probe.probe(size) {
                Some(context) => {
                    debug!(backend = probe.name(), width = size.0, height = size.1, "Acquired rendering context");
                    return Ok(context);
                }
                None => {
                    debug!(backend = probe.name(), "Rendering context not available");
                    tried.push(probe.name().to_string());
                }
            }
        }
        error!(tried = ?tried, "No rendering context could be created");
        Err(OverlayError::ContextUnavailable { tried })
    }
}
