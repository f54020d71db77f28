//! The two-stage shading model that turns an encoded raster into color.
//!
//! The vertex stage moves the geo-registered quad into clip space with the
//! per-frame [`ViewTransform`](crate::view::ViewTransform) matrix. The
//! fragment stage reads the raster intensity, looks it up in the palette and
//! applies the lens mask to the resulting alpha.

use std::fmt;

use nalgebra::{Matrix4, Vector4};
use overlay_common::GeoBounds;
use projection::to_pixel;

use crate::gpu::{Frame, Vertex};
use crate::lens::{mask_multiplier, LensState};

/// Texture unit holding the encoded raster.
pub const RASTER_UNIT: usize = 0;
/// Texture unit holding the palette.
pub const PALETTE_UNIT: usize = 1;

/// Quad triangle indices: (0, 2, 3) and (0, 1, 2).
pub const QUAD_INDICES: [u16; 6] = [0, 2, 3, 0, 1, 2];

/// Per-draw shader inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub matrix: Matrix4<f64>,
    /// Lens as seen by this draw; `enabled` already folds in the layer's lens pass.
    pub lens: LensState,
}

/// Vertex stage result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub position: Vector4<f64>,
    pub texcoord: [f32; 2],
}

/// Fragment stage input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Window coordinate, origin bottom-left, pixel centers at +0.5.
    pub frag_coord: [f32; 2],
    /// Interpolated texture coordinate.
    pub texcoord: [f32; 2],
}

/// Bound textures as seen from a fragment stage.
pub trait TextureUnits {
    /// RGBA in [0, 1] of the texture bound to `unit` at `uv`.
    fn sample(&self, unit: usize, uv: [f32; 2]) -> [f32; 4];
}

/// A shading program.
pub trait Shader: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn vertex(&self, vertex: &Vertex, uniforms: &Uniforms) -> VertexOutput;

    fn fragment(
        &self,
        fragment: &Fragment,
        textures: &dyn TextureUnits,
        uniforms: &Uniforms,
    ) -> [f32; 4];
}

/// Raster intensity through palette lookup, masked by the lens.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteOverlayShader;

impl Shader for PaletteOverlayShader {
    fn name(&self) -> &str {
        "palette-overlay"
    }

    fn vertex(&self, vertex: &Vertex, uniforms: &Uniforms) -> VertexOutput {
        let [x, y, z] = vertex.position;
        VertexOutput {
            position: uniforms.matrix * Vector4::new(x as f64, y as f64, z as f64, 1.0),
            texcoord: vertex.texcoord,
        }
    }

    fn fragment(
        &self,
        fragment: &Fragment,
        textures: &dyn TextureUnits,
        uniforms: &Uniforms,
    ) -> [f32; 4] {
        let v = textures.sample(RASTER_UNIT, fragment.texcoord)[3];
        let mut color = textures.sample(PALETTE_UNIT, [v, 0.5]);
        let [fx, fy] = fragment.frag_coord;
        color[3] *= mask_multiplier(&uniforms.lens, fx, fy);
        color
    }
}

/// The geo-registered quad for `bounds` in base pixel coordinates.
///
/// Corners in order: north-west, north-east, south-east, south-west, with
/// texture coordinates (0,0), (1,0), (1,1), (0,1). Texture row 0 is the
/// northern edge of the raster.
pub fn build_quad(bounds: &GeoBounds) -> [Vertex; 4] {
    let nw = to_pixel(bounds.north_west);
    let se = to_pixel(bounds.south_east);
    let corner = |x: f64, y: f64, u: f32, v: f32| Vertex {
        position: [x as f32, y as f32, 0.0],
        texcoord: [u, v],
    };
    [
        corner(nw.x, nw.y, 0.0, 0.0),
        corner(se.x, nw.y, 1.0, 0.0),
        corner(se.x, se.y, 1.0, 1.0),
        corner(nw.x, se.y, 0.0, 1.0),
    ]
}

/// Straight-alpha "over": `src` composited on top of `dst`, both in [0, 1].
pub fn blend_over(dst: [f32; 4], src: [f32; 4]) -> [f32; 4] {
    let sa = src[3].clamp(0.0, 1.0);
    let da = dst[3].clamp(0.0, 1.0);
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mut out = [0.0; 4];
    for c in 0..3 {
        out[c] = (src[c] * sa + dst[c] * da * (1.0 - sa)) / out_a;
    }
    out[3] = out_a;
    out
}

pub(crate) fn to_unit(px: &[u8]) -> [f32; 4] {
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
        px[3] as f32 / 255.0,
    ]
}

pub(crate) fn to_bytes(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Composite layer frames bottom to top, first frame lowest.
///
/// Returns `None` when there are no frames or their sizes differ.
pub fn stack_frames(frames: &[Frame]) -> Option<Frame> {
    let first = frames.first()?;
    if frames
        .iter()
        .any(|f| f.width != first.width || f.height != first.height)
    {
        return None;
    }

    let mut out = first.clone();
    for frame in &frames[1..] {
        for (dst, src) in out
            .pixels
            .chunks_exact_mut(4)
            .zip(frame.pixels.chunks_exact(4))
        {
            let blended = blend_over(to_unit(dst), to_unit(src));
            dst.copy_from_slice(&to_bytes(blended));
        }
    }
    Some(out)
}
