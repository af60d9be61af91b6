//! App builder and engine context.
//!
//! [`App`] configures the window and starts the event loop; the `setup`
//! closure passed to [`App::run`] receives the live [`Context`] once the
//! GPU is ready, loads assets, and spawns the initial entities. After that
//! the engine drives itself: everything per-frame happens through entity
//! [`Behavior`](crate::entity::Behavior)s.
//!
//! ## Example
//!
//! ```ignore
//! use varde::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .with_title("my game")
//!         .with_size(640, 480)
//!         .run(|ctx| {
//!             let tex = ctx.create_texture_rgba("dot", 1, 1, &[255; 4]).unwrap();
//!             ctx.spawn(Entity::new(Sprite::new(tex), Vec2::new(320.0, 240.0)));
//!         });
//! }
//! ```

use winit::event_loop::EventLoop;

use crate::entity::{Entity, EntityId, EntityStore, tick};
use crate::error::EngineError;
use crate::input::InputState;
use crate::math::{Bounds, Vec2, Vec4, sprite_transform};
use crate::quadtree::Quadtree;
use crate::render::Sprite;
use crate::render::batch::SpriteBatch;
use crate::render::gpu::GpuContext;
use crate::render::pipeline::SpriteRenderer;
use crate::render::texture::{TextureHandle, TextureRegistry};
use crate::time::Time;
use crate::window::WinitApp;

#[cfg(feature = "text")]
use crate::render::font::{FontHandle, FontStore, draw_text};

/// The live engine: GPU resources, the entity store, both spatial indexes,
/// and per-frame state. Created by [`App::run`] once the window exists.
pub struct Context {
    gpu: GpuContext,
    renderer: SpriteRenderer,
    registry: TextureRegistry,
    batch: SpriteBatch,
    store: EntityStore,
    /// Spatial index settled during the previous frame (what behaviors query).
    index: Quadtree,
    /// Index being populated for the next frame.
    building: Quadtree,
    input: InputState,
    time: Time,
    clear_color: [f64; 4],
    debug_overlay: bool,
    #[cfg(feature = "text")]
    fonts: FontStore,
    #[cfg(feature = "text")]
    overlay: Option<(FontHandle, String)>,
}

impl Context {
    pub(crate) fn new(gpu: GpuContext, clear_color: [f64; 4]) -> Self {
        let renderer = SpriteRenderer::new(&gpu);
        let registry = TextureRegistry::new(&gpu);

        // The index covers the startup viewport; the world region is fixed
        // for the session even if the window resizes.
        let (width, height) = gpu.surface_size();
        let world = Bounds::new(Vec2::ZERO, Vec2::new(width as f32, height as f32));

        Self {
            gpu,
            renderer,
            registry,
            batch: SpriteBatch::new(),
            store: EntityStore::new(),
            index: Quadtree::new(world),
            building: Quadtree::new(world),
            input: InputState::new(),
            time: Time::new(),
            clear_color,
            debug_overlay: false,
            #[cfg(feature = "text")]
            fonts: FontStore::new(),
            #[cfg(feature = "text")]
            overlay: None,
        }
    }

    // ── Assets ───────────────────────────────────────────────────────

    /// Decode compressed image bytes and register them as a texture.
    pub fn load_texture(&mut self, bytes: &[u8]) -> Result<TextureHandle, EngineError> {
        self.registry.load_bytes(&self.gpu, bytes)
    }

    /// Register raw RGBA8 pixels as a texture.
    pub fn create_texture_rgba(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureHandle, EngineError> {
        self.registry.create_rgba(&self.gpu, label, width, height, pixels)
    }

    /// Rasterize a TTF/OTF font at the given pixel size.
    #[cfg(feature = "text")]
    pub fn load_font(&mut self, bytes: &[u8], pixel_size: f32) -> Result<FontHandle, EngineError> {
        self.fonts.load(&self.gpu, &mut self.registry, bytes, pixel_size)
    }

    // ── World ────────────────────────────────────────────────────────

    /// Append an entity to the store. Its behavior runs starting next frame.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        self.store.spawn(entity)
    }

    pub fn entities(&self) -> &EntityStore {
        &self.store
    }

    /// The fixed region covered by the spatial index.
    pub fn world_bounds(&self) -> Bounds {
        self.index.bounds()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub(crate) fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Draw translucent boxes over every entity's hitbox and every leaf
    /// cell of the spatial index.
    pub fn set_debug_overlay(&mut self, on: bool) {
        self.debug_overlay = on;
    }

    /// A line of text drawn near the top-left corner every frame until
    /// replaced. Useful as a debug HUD.
    #[cfg(feature = "text")]
    pub fn set_overlay_text(&mut self, font: FontHandle, text: impl Into<String>) {
        self.overlay = Some((font, text.into()));
    }

    #[cfg(feature = "text")]
    pub fn clear_overlay_text(&mut self) {
        self.overlay = None;
    }

    // ── Frame loop ───────────────────────────────────────────────────

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        let (width, height) = self.gpu.surface_size();
        self.renderer.update_projection(&self.gpu, width, height);
    }

    pub(crate) fn reconfigure_surface(&mut self) {
        let (width, height) = self.gpu.surface_size();
        self.gpu.resize(width, height);
    }

    /// Run one frame: advance the clock, tick every entity, draw the
    /// overlay, render, then swap the spatial indexes.
    pub(crate) fn frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.time.update();
        let dt = self.time.delta();

        tick(
            &mut self.store,
            &self.index,
            &mut self.building,
            &mut self.batch,
            &self.input,
            dt,
        );

        if self.debug_overlay {
            for (_, entity) in self.store.iter() {
                let hitbox = entity.bounds.to_world(entity.position);
                push_box(&mut self.batch, hitbox, Vec4::new(1.0, 0.2, 0.2, 0.25));
            }
            self.index.for_each_leaf(|cell| {
                push_box(&mut self.batch, cell, Vec4::new(0.2, 1.0, 0.2, 0.08));
            });
        }

        #[cfg(feature = "text")]
        if let Some((font, text)) = &self.overlay {
            let font = self.fonts.get(*font);
            let origin = Vec2::new(32.0, 32.0);
            draw_text(&mut self.batch, font, origin, 1.0, text, Vec4::ONE);
        }

        self.renderer
            .render_frame(&self.gpu, &mut self.registry, &mut self.batch, self.clear_color)?;

        // Queries are done for this frame: promote the freshly built index
        // and recycle the old one's storage.
        std::mem::swap(&mut self.index, &mut self.building);
        self.building.clear();

        self.input.end_frame();
        Ok(())
    }
}

/// Push a translucent filled quad covering a world-space box.
fn push_box(batch: &mut SpriteBatch, bounds: Bounds, color: Vec4) {
    batch.push(&Sprite {
        texture: TextureHandle::WHITE,
        transform: sprite_transform(bounds.center(), bounds.size() / 2.0),
        color,
        flags: 0,
    });
}

/// Configures and launches the engine.
pub struct App {
    title: String,
    size: (u32, u32),
    clear_color: [f64; 4],
}

impl App {
    pub fn new() -> Self {
        Self {
            title: String::from("varde"),
            size: (640, 480),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the window (and world-region) size in logical pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Set the background clear color.
    pub fn with_clear_color(mut self, color: [f64; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Open the window, initialize the GPU, run `setup`, then drive the
    /// frame loop until the window closes. Does not return; initialization
    /// failure logs a diagnostic and exits with a nonzero status.
    pub fn run(self, setup: impl FnOnce(&mut Context) + 'static) -> ! {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let event_loop = EventLoop::new().expect("failed to create event loop");
        event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

        let mut app = WinitApp {
            title: self.title,
            size: self.size,
            clear_color: self.clear_color,
            setup: Some(Box::new(setup)),
            window: None,
            context: None,
            init_failed: false,
        };

        event_loop.run_app(&mut app).expect("event loop error");

        std::process::exit(if app.init_failed { 1 } else { 0 })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
