//! Window management via winit.
//!
//! Implements [`winit::application::ApplicationHandler`] to drive the event
//! loop: window creation, input forwarding into the engine's
//! [`InputState`](crate::input::InputState), resize, and the per-frame
//! sequence (poll happens inside winit; each redraw runs one full engine
//! frame and immediately requests the next).

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::app::Context;
use crate::render::gpu::GpuContext;

/// The application state that winit drives.
pub(crate) struct WinitApp {
    pub title: String,
    pub size: (u32, u32),
    pub clear_color: [f64; 4],
    pub setup: Option<Box<dyn FnOnce(&mut Context)>>,
    pub window: Option<Arc<Window>>,
    pub context: Option<Context>,
    pub init_failed: bool,
}

impl ApplicationHandler for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(self.size.0 as f64, self.size.1 as f64));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("window creation failed: {err}");
                self.init_failed = true;
                event_loop.exit();
                return;
            }
        };

        let gpu = match GpuContext::new(window.clone()) {
            Ok(gpu) => gpu,
            Err(err) => {
                log::error!("GPU initialization failed: {err}");
                self.init_failed = true;
                event_loop.exit();
                return;
            }
        };

        let mut context = Context::new(gpu, self.clear_color);
        if let Some(setup) = self.setup.take() {
            setup(&mut context);
        }

        self.context = Some(context);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(context) = self.context.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                context.resize(size.width, size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => context.input_mut().press(key),
                        ElementState::Released => context.input_mut().release(key),
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                match context.frame() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        context.reconfigure_surface();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of GPU memory");
                        event_loop.exit();
                    }
                    Err(err) => {
                        log::warn!("surface error: {err:?}");
                    }
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}
