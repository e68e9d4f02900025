//! Standalone window showing the Earth-in-glass scene, backed by winit.
//!
//! ```no_run
//! # use earthglass::{Options, Viewer};
//! Viewer::builder()
//!     .with_options(Options::preset("lite").unwrap())
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    error::EarthGlassError,
    frame::FrameClock,
    options::Options,
    renderer::SceneRenderer,
    scene::assembler::{SceneAssembler, SceneRuntime},
    texture::{TextureLoader, ThreadedTextureLoader},
};

/// Log the smoothed frame rate this often, in frames.
const FPS_LOG_INTERVAL: u64 = 600;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            options: None,
            title: "Earth in Glass".into(),
        }
    }

    /// Override the default (`night_lights`) options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window that assembles and animates the scene.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`EarthGlassError::Viewer`] if the event loop cannot start
    /// or the scene fails to initialize.
    pub fn run(self) -> Result<(), EarthGlassError> {
        let event_loop = EventLoop::new()
            .map_err(|e| EarthGlassError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            running: None,
            clock: FrameClock::new(),
            frames: 0,
            options: self.options,
            title: self.title,
            failure: None,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| EarthGlassError::Viewer(e.to_string()))?;
        app.failure.map_or(Ok(()), Err)
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Everything that exists once the window is up.
struct Running {
    renderer: SceneRenderer,
    loader: ThreadedTextureLoader,
    runtime: Option<SceneRuntime>,
}

struct ViewerApp {
    window: Option<Arc<Window>>,
    running: Option<Running>,
    clock: FrameClock,
    frames: u64,
    options: Options,
    title: String,
    /// First fatal error, returned from [`Viewer::run`].
    failure: Option<EarthGlassError>,
}

impl ViewerApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EarthGlassError) {
        log::error!("{error}");
        if let Some(running) = &mut self.running {
            if let Some(runtime) = running.runtime.take() {
                runtime.dispose(&mut running.renderer);
            }
        }
        let _ = self.failure.get_or_insert(error);
        event_loop.exit();
    }

    fn start(
        &self,
        window: &Arc<Window>,
    ) -> Result<Running, EarthGlassError> {
        let inner = window.inner_size();
        let mut renderer = pollster::block_on(SceneRenderer::new(
            window.clone(),
            (inner.width.max(1), inner.height.max(1)),
            &self.options.camera,
        ))?;
        let mut loader = ThreadedTextureLoader::new();
        let runtime = SceneAssembler::new(self.options.clone())
            .assemble(&mut renderer, &mut loader)?;
        Ok(Running {
            renderer,
            loader,
            runtime: Some(runtime),
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };
        let tick = self.clock.tick();
        for (id, result) in running.loader.poll() {
            running.renderer.resolve_texture(id, result);
        }
        running.renderer.tick(tick);

        if let Err(e) = running.renderer.prepare() {
            self.fail(event_loop, e);
            return;
        }

        match running.renderer.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                running.renderer.reconfigure();
            }
            Err(e) => log::error!("render error: {e:?}"),
        }

        self.frames += 1;
        if self.frames == FPS_LOG_INTERVAL {
            self.frames = 0;
            log::debug!("{:.1} fps", self.clock.fps());
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            let logical_w = (f64::from(mon_size.width) / scale * 0.75) as u32;
            let logical_h = (f64::from(mon_size.height) / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    logical_w, logical_h,
                ))
        } else {
            Window::default_attributes().with_title(&self.title)
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, EarthGlassError::Viewer(e.to_string()));
                return;
            }
        };

        match self.start(&window) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(running) = &mut self.running {
                    if let Some(runtime) = running.runtime.take() {
                        runtime.dispose(&mut running.renderer);
                    }
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(running) = &mut self.running {
                    running.renderer.resize(size.width, size.height);
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(window), Some(running)) =
                    (&self.window, &mut self.running)
                {
                    let inner = window.inner_size();
                    running.renderer.resize(inner.width, inner.height);
                }
            }

            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => (),
        }
    }
}
