//! Application event loop.
//!
//! [`App`] drives the viewer through winit's [`ApplicationHandler`]:
//!
//! 1. `resumed` creates the window and builds the [`Viewer`] (GPU context and
//!    scene) asynchronously: blocking on tokio natively, through `spawn_local`
//!    and an [`AppEvent::Initialized`] round trip on the web.
//! 2. Once initialized, one load per atlas slot is started. Each result comes
//!    back as an [`AppEvent::Atlas`] and is composited in arrival order.
//! 3. Every `RedrawRequested` advances the camera, re-uploads the atlas if it
//!    changed, draws and presents. Frames are only requested while something
//!    changes: camera input or inertia, a new image, a resize.

use std::{iter, sync::Arc};

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    atlas::Atlas,
    config::ViewerConfig,
    context::Context,
    render::{Scene, encode_frame},
    resources::{self, AtlasEvent},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Events posted to the winit loop from async tasks.
#[derive(Debug)]
pub enum AppEvent {
    Initialized(Box<Viewer>),
    /// Building the viewer failed. The event loop shuts down.
    InitFailed(String),
    Atlas(AtlasEvent),
}

impl From<anyhow::Result<Viewer>> for AppEvent {
    fn from(result: anyhow::Result<Viewer>) -> Self {
        match result {
            Ok(viewer) => Self::Initialized(Box::new(viewer)),
            Err(e) => Self::InitFailed(format!("{e:#}")),
        }
    }
}

impl From<AtlasEvent> for AppEvent {
    fn from(event: AtlasEvent) -> Self {
        Self::Atlas(event)
    }
}

/// The GPU context plus the scene it draws.
#[derive(Debug)]
pub struct Viewer {
    pub ctx: Context,
    pub scene: Scene,
    is_surface_configured: bool,
}

impl Viewer {
    pub async fn new(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        let scene = Scene::new(
            &ctx.device,
            &ctx.queue,
            ctx.config.format,
            &ctx.camera.bind_group_layout,
            Atlas::new(config.layout),
            config.backdrop,
        )?;
        Ok(Self {
            ctx,
            scene,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.ctx.camera.update(&self.ctx.queue);
        if let Err(e) = self.scene.sync_atlas(&self.ctx.queue) {
            log::error!("Atlas upload failed: {e:#}");
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        encode_frame(
            &mut encoder,
            &view,
            &self.ctx.depth_texture.view,
            self.ctx.clear_colour,
            &self.scene,
            &self.ctx.camera.bind_group,
        );
        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        // Keep drawing until the orbit's inertia has worn off.
        if self.ctx.camera.camera.is_moving() {
            self.ctx.window.request_redraw();
        }
        Ok(())
    }
}

pub struct App {
    config: ViewerConfig,
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    viewer: Option<Viewer>,
    // Set on the first `resumed`; initialization may still be in flight.
    started: bool,
}

impl App {
    pub fn new(event_loop: &EventLoop<AppEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()
                .context("failed to start the async runtime")?,
            proxy: event_loop.create_proxy(),
            viewer: None,
            started: false,
        })
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Arc<Window>> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let (width, height) = self.config.window_size;
            window_attributes = window_attributes
                .with_title("atlas-cube")
                .with_inner_size(winit::dpi::PhysicalSize::new(width, height));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let id = &self.config.canvas_id;
            let browser = web_sys::window().context("no global window")?;
            let canvas = browser
                .document()
                .and_then(|document| document.get_element_by_id(id))
                .with_context(|| format!("no element with id \"{id}\" in the page"))?
                .dyn_into::<web_sys::HtmlCanvasElement>()
                .map_err(|_| anyhow::anyhow!("element \"{id}\" is not a canvas"))?;

            // The canvas fills the browser viewport.
            let viewport = viewport_size(
                browser.inner_width().ok().and_then(|w| w.as_f64()),
                browser.inner_height().ok().and_then(|h| h.as_f64()),
            );
            match viewport {
                Some(size) => {
                    canvas.set_width(size.width as u32);
                    canvas.set_height(size.height as u32);
                    window_attributes = window_attributes.with_inner_size(size);
                }
                None => log::warn!("Browser reports no viewport size, keeping the canvas size"),
            }
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        Ok(Arc::new(event_loop.create_window(window_attributes)?))
    }

    fn on_init_failed(&self, event_loop: &ActiveEventLoop, error: &str) {
        log::error!("App initialization failed: {error}");
        event_loop.exit();
    }

    fn on_initialized(&mut self, mut viewer: Viewer) {
        let size = viewer.ctx.window.inner_size();
        viewer.resize(size.width, size.height);

        #[cfg(not(target_arch = "wasm32"))]
        resources::spawn_atlas_loads(&self.config, self.proxy.clone(), &self.async_runtime);
        #[cfg(target_arch = "wasm32")]
        resources::spawn_atlas_loads(&self.config, self.proxy.clone());

        viewer.ctx.window.request_redraw();
        self.viewer = Some(viewer);
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(e) => {
                log::error!("Cannot create the window: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let config = self.config.clone();
        let init_future = async move { Viewer::new(window, &config).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let event = AppEvent::from(self.async_runtime.block_on(init_future));
            self.user_event(event_loop, event);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = AppEvent::from(init_future.await);
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the viewer was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(viewer) => self.on_initialized(*viewer),
            AppEvent::InitFailed(error) => self.on_init_failed(event_loop, &error),
            AppEvent::Atlas(event) => match &mut self.viewer {
                Some(viewer) => {
                    resources::apply_atlas_event(&mut viewer.scene.atlas, event);
                    viewer.ctx.window.request_redraw();
                }
                None => log::warn!(
                    "Dropping image for slot {} that arrived before the viewer",
                    event.slot()
                ),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let viewer = match &mut self.viewer {
            Some(viewer) => viewer,
            None => return,
        };

        if viewer.ctx.camera.handle_window_events(&event) {
            viewer.ctx.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                viewer.resize(size.width, size.height);
                viewer.ctx.window.request_redraw();
            }
            WindowEvent::RedrawRequested => match viewer.render() {
                Ok(()) => {}
                // Reconfigure the surface if it's lost or outdated
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = viewer.ctx.window.inner_size();
                    viewer.resize(size.width, size.height);
                    viewer.ctx.window.request_redraw();
                }
                Err(e) => log::error!("Unable to render {}", e),
            },
            _ => {}
        }
    }
}

/// Logical size for a canvas filling a browser viewport of `width`x`height`
/// CSS pixels, or `None` when the browser did not report a usable size.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn viewport_size(
    width: Option<f64>,
    height: Option<f64>,
) -> Option<winit::dpi::LogicalSize<f64>> {
    match (width, height) {
        (Some(w), Some(h)) if w.is_finite() && h.is_finite() && w >= 1.0 && h >= 1.0 => {
            Some(winit::dpi::LogicalSize::new(w.floor(), h.floor()))
        }
        _ => None,
    }
}

/// Install the platform logger: `env_logger` natively (default level `info`,
/// `RUST_LOG` overrides), the browser console plus a panic hook on the web.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    init_logging();

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_init_shuts_the_loop_down() {
        let result: anyhow::Result<Viewer> =
            Err(anyhow::anyhow!("no adapter").context("failed to set up the GPU"));
        match AppEvent::from(result) {
            AppEvent::InitFailed(message) => {
                assert!(message.contains("failed to set up the GPU"), "{message}");
                assert!(message.contains("no adapter"), "{message}");
            }
            other => panic!("expected InitFailed, got {other:?}"),
        }
    }

    #[test]
    fn canvas_takes_the_viewport_size() {
        let size = viewport_size(Some(1440.0), Some(900.5)).unwrap();
        assert_eq!((size.width, size.height), (1440.0, 900.0));
    }

    #[test]
    fn unusable_viewport_keeps_the_canvas() {
        assert!(viewport_size(None, Some(900.0)).is_none());
        assert!(viewport_size(Some(0.0), Some(900.0)).is_none());
        assert!(viewport_size(Some(f64::NAN), Some(900.0)).is_none());
    }
}
