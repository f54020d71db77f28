//! CPU implementation of [`GpuContext`].
//!
//! Runs the shading model on the CPU:
//!
//!  - triangles are rasterized at pixel centers with a top-left fill rule, so
//!    pixels on a shared edge are shaded once;
//!  - textures are sampled nearest with clamp-to-edge;
//!  - fragments are blended with straight-alpha "over";
//!  - the surface is 8-bit RGBA, window origin bottom-left.
//!
//! Every context created by one [`SoftwareProbe`] reports into a shared
//! [`GpuLedger`], which is how tests observe leaks and draw calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nalgebra::Vector4;
use overlay_common::{OverlayError, OverlayResult};
use tracing::{debug, trace};

use crate::compositor::{blend_over, to_bytes, to_unit, Fragment, Shader, TextureUnits};
use crate::gpu::{
    ContextProbe, DrawCall, Frame, GpuContext, MeshId, ProgramId, ResourceCounts, TextureDesc,
    TextureFormat, TextureId, Vertex,
};

/// Backend name reported by the software probe and contexts.
pub const SOFTWARE_BACKEND: &str = "software";

/// Counters shared by every context of one probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuStats {
    pub contexts_created: usize,
    pub contexts_live: usize,
    pub programs: usize,
    pub textures: usize,
    pub meshes: usize,
    pub texture_uploads: usize,
    pub draw_calls: usize,
    pub clears: usize,
}

impl GpuStats {
    /// Live resources over all contexts.
    pub fn live_resources(&self) -> usize {
        self.programs + self.textures + self.meshes
    }
}

/// Handle to shared [`GpuStats`].
#[derive(Debug, Clone, Default)]
pub struct GpuLedger {
    inner: Arc<Mutex<GpuStats>>,
}

impl GpuLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> GpuStats {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record<F: FnOnce(&mut GpuStats)>(&self, f: F) {
        let mut stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut stats);
    }
}

/// Probe yielding [`SoftwareContext`]s.
#[derive(Debug, Clone)]
pub struct SoftwareProbe {
    ledger: GpuLedger,
    available: bool,
}

impl Default for SoftwareProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareProbe {
    pub fn new() -> Self {
        Self {
            ledger: GpuLedger::new(),
            available: true,
        }
    }

    /// A probe that never yields a context.
    pub fn unavailable() -> Self {
        Self {
            ledger: GpuLedger::new(),
            available: false,
        }
    }

    pub fn ledger(&self) -> GpuLedger {
        self.ledger.clone()
    }
}

impl ContextProbe for SoftwareProbe {
    fn name(&self) -> &str {
        SOFTWARE_BACKEND
    }

    fn probe(&self, size: (u32, u32)) -> Option<Box<dyn GpuContext>> {
        if !self.available {
            return None;
        }
        Some(Box::new(SoftwareContext::new(size, self.ledger.clone())))
    }
}

#[derive(Debug, Clone)]
struct Texture {
    width: u32,
    height: u32,
    format: TextureFormat,
    data: Vec<u8>,
}

impl Texture {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        // Float-to-int `as` saturates, so NaN and negatives land on texel 0.
        let x = ((uv[0] * self.width as f32).floor() as u32).min(self.width - 1) as usize;
        let y = ((uv[1] * self.height as f32).floor() as u32).min(self.height - 1) as usize;
        let i = y * self.width as usize + x;
        match self.format {
            TextureFormat::Alpha8 => [0.0, 0.0, 0.0, self.data[i] as f32 / 255.0],
            TextureFormat::Rgba8 => to_unit(&self.data[i * 4..i * 4 + 4]),
        }
    }
}

#[derive(Debug, Clone)]
struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
}

struct BoundTextures<'a> {
    units: Vec<&'a Texture>,
}

impl TextureUnits for BoundTextures<'_> {
    fn sample(&self, unit: usize, uv: [f32; 2]) -> [f32; 4] {
        match self.units.get(unit) {
            Some(texture) => texture.sample(uv),
            None => [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// A vertex after the vertex stage, in window coordinates.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    texcoord: [f32; 2],
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Top or left edge of a counter-clockwise triangle in y-up coordinates.
fn is_top_left(a: &ScreenVertex, b: &ScreenVertex) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dy < 0.0 || (dy == 0.0 && dx < 0.0)
}

fn covers(w: f32, top_left: bool) -> bool {
    w > 0.0 || (w == 0.0 && top_left)
}

/// Rendering context backed by system memory.
pub struct SoftwareContext {
    width: u32,
    height: u32,
    /// RGBA rows, bottom row first.
    color: Vec<u8>,
    programs: HashMap<u32, Arc<dyn Shader>>,
    textures: HashMap<u32, Texture>,
    meshes: HashMap<u32, Mesh>,
    next_id: u32,
    ledger: GpuLedger,
    lost: bool,
}

impl SoftwareContext {
    pub fn new(size: (u32, u32), ledger: GpuLedger) -> Self {
        ledger.record(|s| {
            s.contexts_created += 1;
            s.contexts_live += 1;
        });
        debug!(width = size.0, height = size.1, "Created software context");
        Self {
            width: size.0,
            height: size.1,
            color: vec![0; size.0 as usize * size.1 as usize * 4],
            programs: HashMap::new(),
            textures: HashMap::new(),
            meshes: HashMap::new(),
            next_id: 1,
            ledger,
            lost: false,
        }
    }

    fn ensure_live(&self) -> OverlayResult<()> {
        if self.lost {
            Err(OverlayError::ContextLost)
        } else {
            Ok(())
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn to_screen(&self, clip: Vector4<f64>, texcoord: [f32; 2]) -> Option<ScreenVertex> {
        if clip.w <= 0.0 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let x = ((ndc_x + 1.0) * 0.5 * self.width as f64) as f32;
        let y = ((ndc_y + 1.0) * 0.5 * self.height as f64) as f32;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some(ScreenVertex { x, y, texcoord })
    }

    fn blend_pixel(&mut self, px: usize, py: usize, src: [f32; 4]) {
        let i = (py * self.width as usize + px) * 4;
        let dst = to_unit(&self.color[i..i + 4]);
        self.color[i..i + 4].copy_from_slice(&to_bytes(blend_over(dst, src)));
    }

    fn rasterize(
        &mut self,
        tri: [ScreenVertex; 3],
        shader: &dyn Shader,
        textures: &BoundTextures<'_>,
        call: &DrawCall,
    ) {
        let [v0, mut v1, mut v2] = tri;
        let mut area = edge(&v0, &v1, v2.x, v2.y);
        if area == 0.0 {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut v1, &mut v2);
            area = -area;
        }

        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as usize;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as usize;
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil().max(0.0) as usize).min(self.width as usize);
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil().max(0.0) as usize).min(self.height as usize);

        let tl0 = is_top_left(&v1, &v2);
        let tl1 = is_top_left(&v2, &v0);
        let tl2 = is_top_left(&v0, &v1);

        let mut shaded = Vec::new();
        for py in min_y..max_y {
            let fy = py as f32 + 0.5;
            for px in min_x..max_x {
                let fx = px as f32 + 0.5;
                let w0 = edge(&v1, &v2, fx, fy);
                let w1 = edge(&v2, &v0, fx, fy);
                let w2 = edge(&v0, &v1, fx, fy);
                if !(covers(w0, tl0) && covers(w1, tl1) && covers(w2, tl2)) {
                    continue;
                }
                let (l0, l1, l2) = (w0 / area, w1 / area, w2 / area);
                let texcoord = [
                    l0 * v0.texcoord[0] + l1 * v1.texcoord[0] + l2 * v2.texcoord[0],
                    l0 * v0.texcoord[1] + l1 * v1.texcoord[1] + l2 * v2.texcoord[1],
                ];
                let fragment = Fragment {
                    frag_coord: [fx, fy],
                    texcoord,
                };
                shaded.push((px, py, shader.fragment(&fragment, textures, &call.uniforms)));
            }
        }
        for (px, py, color) in shaded {
            self.blend_pixel(px, py, color);
        }
    }

    fn release_all(&mut self) {
        let (programs, textures, meshes) =
            (self.programs.len(), self.textures.len(), self.meshes.len());
        self.programs.clear();
        self.textures.clear();
        self.meshes.clear();
        self.ledger.record(|s| {
            s.programs -= programs;
            s.textures -= textures;
            s.meshes -= meshes;
            s.contexts_live -= 1;
        });
    }
}

impl GpuContext for SoftwareContext {
    fn backend(&self) -> &str {
        SOFTWARE_BACKEND
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        trace!(width, height, "Resizing software surface");
        self.width = width;
        self.height = height;
        self.color = vec![0; width as usize * height as usize * 4];
    }

    fn create_program(&mut self, shader: Arc<dyn Shader>) -> OverlayResult<ProgramId> {
        self.ensure_live()?;
        let id = self.allocate_id();
        debug!(program = shader.name(), id, "Created program");
        self.programs.insert(id, shader);
        self.ledger.record(|s| s.programs += 1);
        Ok(ProgramId(id))
    }

    fn create_texture(&mut self, desc: &TextureDesc, data: &[u8]) -> OverlayResult<TextureId> {
        self.ensure_live()?;
        desc.validate(data)?;
        let id = self.allocate_id();
        self.textures.insert(
            id,
            Texture {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                data: data.to_vec(),
            },
        );
        self.ledger.record(|s| {
            s.textures += 1;
            s.texture_uploads += 1;
        });
        debug!(label = %desc.label, width = desc.width, height = desc.height, id, "Uploaded texture");
        Ok(TextureId(id))
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) -> OverlayResult<MeshId> {
        self.ensure_live()?;
        if indices.len() % 3 != 0 {
            return Err(OverlayError::GpuError(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(OverlayError::GpuError(format!(
                "index {} out of range for {} vertices",
                bad,
                vertices.len()
            )));
        }
        let id = self.allocate_id();
        self.meshes.insert(
            id,
            Mesh {
                vertices: vertices.to_vec(),
                indices: indices.to_vec(),
            },
        );
        self.ledger.record(|s| s.meshes += 1);
        Ok(MeshId(id))
    }

    fn destroy_program(&mut self, id: ProgramId) {
        if self.programs.remove(&id.0).is_some() {
            self.ledger.record(|s| s.programs -= 1);
        }
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id.0).is_some() {
            self.ledger.record(|s| s.textures -= 1);
        }
    }

    fn destroy_mesh(&mut self, id: MeshId) {
        if self.meshes.remove(&id.0).is_some() {
            self.ledger.record(|s| s.meshes -= 1);
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        if self.lost {
            return;
        }
        let bytes = to_bytes(color);
        for px in self.color.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
        self.ledger.record(|s| s.clears += 1);
    }

    fn draw(&mut self, call: &DrawCall) -> OverlayResult<()> {
        self.ensure_live()?;
        let shader = self
            .programs
            .get(&call.program.0)
            .cloned()
            .ok_or_else(|| OverlayError::GpuError(format!("unknown program {}", call.program.0)))?;
        let mesh = self
            .meshes
            .get(&call.mesh.0)
            .cloned()
            .ok_or_else(|| OverlayError::GpuError(format!("unknown mesh {}", call.mesh.0)))?;
        let units = call
            .textures
            .iter()
            .map(|id| {
                self.textures
                    .get(&id.0)
                    .cloned()
                    .ok_or_else(|| OverlayError::GpuError(format!("unknown texture {}", id.0)))
            })
            .collect::<OverlayResult<Vec<_>>>()?;
        self.ledger.record(|s| s.draw_calls += 1);

        let screen: Vec<Option<ScreenVertex>> = mesh
            .vertices
            .iter()
            .map(|v| {
                let out = shader.vertex(v, &call.uniforms);
                self.to_screen(out.position, out.texcoord)
            })
            .collect();

        let bound = BoundTextures {
            units: units.iter().collect(),
        };
        for tri in mesh.indices.chunks_exact(3) {
            let corners = (
                screen[tri[0] as usize],
                screen[tri[1] as usize],
                screen[tri[2] as usize],
            );
            if let (Some(a), Some(b), Some(c)) = corners {
                self.rasterize([a, b, c], shader.as_ref(), &bound, call);
            }
        }
        Ok(())
    }

    fn read_pixels(&self) -> Option<Frame> {
        if self.lost {
            return None;
        }
        let row_len = self.width as usize * 4;
        let mut pixels = Vec::with_capacity(self.color.len());
        if row_len > 0 {
            for row in self.color.chunks_exact(row_len).rev() {
                pixels.extend_from_slice(row);
            }
        }
        Some(Frame {
            width: self.width,
            height: self.height,
            pixels,
        })
    }

    fn resource_counts(&self) -> ResourceCounts {
        ResourceCounts {
            programs: self.programs.len(),
            textures: self.textures.len(),
            meshes: self.meshes.len(),
        }
    }

    fn lose_context(&mut self) {
        if self.lost {
            return;
        }
        self.release_all();
        self.color.clear();
        self.lost = true;
        debug!("Software context lost");
    }

    fn is_lost(&self) -> bool {
        self.lost
    }
}

impl Drop for SoftwareContext {
    fn drop(&mut self) {
        self.lose_context();
    }
}
