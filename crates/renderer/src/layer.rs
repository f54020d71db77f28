//! Overlay layer lifecycle.
//!
//! ```text
//! Unmounted --mount--> Initialized --build--> Resourced --redraw--> Rendering
//!     ^                                                                 |
//!     +---------------------------- unmount ----------------------------+
//! ```
//!
//! A layer owns its raster, palette and quad resources on one rendering
//! context. Option changes rebuild the palette only. Unmount releases every
//! resource and the context itself.

use std::fmt;
use std::sync::Arc;

use overlay_common::{
    ColorScale, FnScale, GeoBounds, OverlayDefinition, OverlayError, OverlayResult, RasterField,
    Rgba,
};
use tracing::{debug, info, warn};

use crate::compositor::{build_quad, PaletteOverlayShader, Uniforms, QUAD_INDICES};
use crate::encode::encode;
use crate::events::{EventBus, LayerEvent, ListenerId};
use crate::gpu::{
    ContextProbes, DrawCall, Frame, GpuContext, MeshId, ProgramId, ResourceCounts, TextureDesc,
    TextureFormat, TextureId, Vertex,
};
use crate::lens::SharedLens;
use crate::palette::{build_palette, PALETTE_SIZE};
use crate::view::{MapViewport, ViewTransform};

/// Color and range settings of a layer.
#[derive(Clone)]
pub struct LayerOptions {
    pub color_scale: Arc<dyn ColorScale>,
    pub min_value: f64,
    pub max_value: f64,
    /// Multiplies the color scale's alpha, in [0, 1].
    pub opacity: f32,
}

impl fmt::Debug for LayerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerOptions")
            .field("color_scale_domain", &self.color_scale.domain())
            .field("min_value", &self.min_value)
            .field("max_value", &self.max_value)
            .field("opacity", &self.opacity)
            .finish()
    }
}

impl Default for LayerOptions {
    /// Transparent black to opaque white over [0, 1].
    fn default() -> Self {
        let white = Rgba::opaque(255, 255, 255);
        Self {
            color_scale: Arc::new(FnScale::new((0.0, 1.0), move |v| {
                Rgba::TRANSPARENT.lerp(white, v)
            })),
            min_value: 0.0,
            max_value: 1.0,
            opacity: 1.0,
        }
    }
}

impl LayerOptions {
    pub fn new(color_scale: Arc<dyn ColorScale>, min_value: f64, max_value: f64) -> Self {
        Self {
            color_scale,
            min_value,
            max_value,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Options for a catalog overlay.
    pub fn from_definition(definition: &OverlayDefinition) -> OverlayResult<Self> {
        Ok(Self {
            color_scale: Arc::new(definition.color_scale()?),
            min_value: definition.min_value,
            max_value: definition.max_value,
            opacity: definition.opacity,
        })
    }
}

/// Where a layer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Unmounted,
    /// Context acquired, no resources yet.
    Initialized,
    /// Resources built, nothing drawn yet.
    Resourced,
    Rendering,
}

/// Result of a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    Drawn,
    /// Nothing to draw with yet; no GPU call was made.
    Skipped,
}

#[derive(Debug, Clone, Copy)]
struct LayerResources {
    program: ProgramId,
    mesh: MeshId,
    raster: TextureId,
    palette: TextureId,
}

/// One weather overlay drawn on its own surface.
pub struct OverlayLayer {
    name: String,
    raster: RasterField,
    quad: [Vertex; 4],
    options: LayerOptions,
    lens: SharedLens,
    lens_pass: bool,
    context: Option<Box<dyn GpuContext>>,
    resources: Option<LayerResources>,
    /// Range the uploaded raster was encoded against.
    encoded_range: Option<(f64, f64)>,
    state: LayerState,
    events: EventBus,
    redraw_requested: bool,
}

impl fmt::Debug for OverlayLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayLayer")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("options", &self.options)
            .field("lens_pass", &self.lens_pass)
            .finish()
    }
}

impl OverlayLayer {
    pub fn new(
        name: impl Into<String>,
        raster: RasterField,
        options: LayerOptions,
        lens: SharedLens,
    ) -> Self {
        let quad = build_quad(raster.bounds());
        Self {
            name: name.into(),
            raster,
            quad,
            options,
            lens,
            lens_pass: false,
            context: None,
            resources: None,
            encoded_range: None,
            state: LayerState::Unmounted,
            events: EventBus::new(),
            redraw_requested: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn options(&self) -> &LayerOptions {
        &self.options
    }

    pub fn raster(&self) -> &RasterField {
        &self.raster
    }

    pub fn bounds(&self) -> &GeoBounds {
        self.raster.bounds()
    }

    pub fn quad(&self) -> &[Vertex; 4] {
        &self.quad
    }

    /// Whether this layer applies the lens on its next draw.
    pub fn lens_pass(&self) -> bool {
        self.lens_pass
    }

    pub fn lens(&self) -> &SharedLens {
        &self.lens
    }

    /// The value range the resident raster was encoded against, if built.
    pub fn encoded_range(&self) -> Option<(f64, f64)> {
        self.encoded_range
    }

    /// Acquire a context (reusing the current one) and build all resources.
    ///
    /// Resources from an earlier mount are released first, so repeated
    /// mounts never accumulate GPU objects.
    pub fn mount(&mut self, probes: &ContextProbes, size: (u32, u32)) -> OverlayResult<()> {
        self.release_resources();
        if self.context.as_ref().map_or(true, |c| c.is_lost()) {
            self.context = None;
            self.state = LayerState::Unmounted;
            self.context = Some(probes.acquire(size)?);
        }
        self.state = LayerState::Initialized;

        let resources = self.build_resources()?;
        self.resources = Some(resources);
        self.encoded_range = Some((self.options.min_value, self.options.max_value));
        self.lens_pass = self.lens.snapshot().enabled;
        self.state = LayerState::Resourced;

        info!(
            layer = %self.name,
            width = self.raster.width(),
            height = self.raster.height(),
            "Mounted overlay layer"
        );
        Ok(())
    }

    fn build_resources(&mut self) -> OverlayResult<LayerResources> {
        let Some(context) = self.context.as_mut() else {
            return Err(OverlayError::ContextLost);
        };

        let program = context.create_program(Arc::new(PaletteOverlayShader))?;
        let mut created = Created {
            program: Some(program),
            ..Created::default()
        };

        let built = (|| -> OverlayResult<LayerResources> {
            let mesh = context.create_mesh(&self.quad, &QUAD_INDICES)?;
            created.mesh = Some(mesh);

            let palette = build_palette(
                self.options.color_scale.as_ref(),
                self.options.min_value,
                self.options.max_value,
                self.options.opacity,
            );
            let palette = context.create_texture(&palette_desc(), palette.as_bytes())?;
            created.palette = Some(palette);

            let encoded = encode(&self.raster, self.options.min_value, self.options.max_value);
            let raster_desc = TextureDesc {
                label: format!("{}-raster", self.name),
                width: encoded.width(),
                height: encoded.height(),
                format: TextureFormat::Alpha8,
            };
            let raster = context.create_texture(&raster_desc, encoded.as_bytes())?;
            created.raster = Some(raster);

            debug!(layer = %self.name, "Built overlay resources");
            Ok(LayerResources {
                program,
                mesh,
                raster,
                palette,
            })
        })();

        if built.is_err() {
            created.release(&mut **context);
        }
        built
    }

    /// Draw the layer for the viewport's current state.
    ///
    /// Before resources exist (or without a usable context) this is a no-op
    /// and makes no GPU call.
    pub fn redraw(&mut self, viewport: &dyn MapViewport) -> OverlayResult<RedrawOutcome> {
        let (Some(context), Some(resources)) = (self.context.as_mut(), self.resources) else {
            return Ok(RedrawOutcome::Skipped);
        };
        if context.is_lost() {
            return Ok(RedrawOutcome::Skipped);
        }

        let (width, height) = viewport.canvas_size();
        context.resize(width, height);
        context.clear([0.0, 0.0, 0.0, 0.0]);

        let lens = self.lens.snapshot().with_enabled(self.lens_pass);
        let call = DrawCall {
            program: resources.program,
            mesh: resources.mesh,
            textures: vec![resources.raster, resources.palette],
            uniforms: Uniforms {
                matrix: *ViewTransform::for_viewport(viewport).matrix(),
                lens,
            },
        };
        context.draw(&call)?;

        self.state = LayerState::Rendering;
        self.redraw_requested = false;
        Ok(RedrawOutcome::Drawn)
    }

    /// Replace the options and rebuild the palette. The resident raster is kept.
    pub fn set_options(&mut self, options: LayerOptions) -> OverlayResult<()> {
        self.options = options;
        let (Some(context), Some(resources)) = (self.context.as_mut(), self.resources.as_mut())
        else {
            return Ok(());
        };

        let palette = build_palette(
            self.options.color_scale.as_ref(),
            self.options.min_value,
            self.options.max_value,
            self.options.opacity,
        );
        let texture = context.create_texture(&palette_desc(), palette.as_bytes())?;
        context.destroy_texture(resources.palette);
        resources.palette = texture;
        self.redraw_requested = true;
        debug!(layer = %self.name, "Rebuilt palette");
        Ok(())
    }

    /// Release every resource and the context. Safe in any state.
    pub fn unmount(&mut self) {
        let was = self.state;
        self.release_resources();
        if let Some(mut context) = self.context.take() {
            context.lose_context();
        }
        self.events.clear();
        self.redraw_requested = false;
        self.state = LayerState::Unmounted;
        if was != LayerState::Unmounted {
            info!(layer = %self.name, "Unmounted overlay layer");
        }
    }

    fn release_resources(&mut self) {
        self.encoded_range = None;
        let Some(resources) = self.resources.take() else {
            return;
        };
        if let Some(context) = self.context.as_mut() {
            context.destroy_program(resources.program);
            context.destroy_mesh(resources.mesh);
            context.destroy_texture(resources.raster);
            context.destroy_texture(resources.palette);
        }
    }

    pub fn on<F>(&mut self, event: LayerEvent, listener: F) -> ListenerId
    where
        F: FnMut(LayerEvent) + Send + 'static,
    {
        self.events.on(event, listener)
    }

    pub fn off(&mut self, event: LayerEvent, id: ListenerId) -> OverlayResult<bool> {
        self.events.off(event, id)
    }

    /// Deliver `event` to this layer, then to its listeners.
    pub fn emit(&mut self, event: LayerEvent) {
        match event {
            LayerEvent::Update => {
                self.lens_pass = self.lens.snapshot().enabled;
                self.redraw_requested = true;
            }
        }
        self.events.emit(event);
    }

    /// Whether a redraw was requested since the last draw; clears the request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// The layer's current surface, if it has a context.
    pub fn read_pixels(&self) -> Option<Frame> {
        self.context.as_ref().and_then(|c| c.read_pixels())
    }

    /// Live resources on this layer's context.
    pub fn resource_counts(&self) -> ResourceCounts {
        self.context
            .as_ref()
            .map(|c| c.resource_counts())
            .unwrap_or_default()
    }
}

impl Drop for OverlayLayer {
    fn drop(&mut self) {
        if self.state != LayerState::Unmounted {
            warn!(layer = %self.name, "Overlay layer dropped while mounted, releasing");
            self.unmount();
        }
    }
}

fn palette_desc() -> TextureDesc {
    TextureDesc {
        label: "palette".to_string(),
        width: PALETTE_SIZE as u32,
        height: 1,
        format: TextureFormat::Rgba8,
    }
}

/// Resources created so far by a build that may fail halfway.
#[derive(Default)]
struct Created {
    program: Option<ProgramId>,
    mesh: Option<MeshId>,
    palette: Option<TextureId>,
    raster: Option<TextureId>,
}

impl Created {
    fn release(self, context: &mut dyn GpuContext) {
        if let Some(id) = self.program {
            context.destroy_program(id);
        }
        if let Some(id) = self.mesh {
            context.destroy_mesh(id);
        }
        for id in [self.palette, self.raster].into_iter().flatten() {
            context.destroy_texture(id);
        }
    }
}
