//! Window and event loop.
//!
//! The [`App`] creates the window and the GPU state once the event loop is
//! running and then drives one frame per redraw:
//! 1. tick the timer and refresh the frame statistics in the caption
//! 2. update the next frame resource
//! 3. acquire a back buffer, draw into it and present
//!
//! While the window is unfocused or minimized the application is paused: the
//! timer is stopped and no redraws are requested.

use std::sync::Arc;

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::AppConfig,
    context::GpuContext,
    render::{Renderer, RendererConfig},
    scene::Scene,
    swap_chain::SwapChain,
    timer::{FrameStats, GameTimer, format_caption},
};

const MIN_CLIENT_SIZE: u32 = 200;

#[derive(Debug, Default)]
struct MouseState {
    pressed: Option<MouseButton>,
    last: Option<PhysicalPosition<f64>>,
}

impl MouseState {
    /// Track the drag button. Only releasing that button ends the drag.
    fn on_button(&mut self, button: MouseButton, pressed: bool) {
        match (button, pressed) {
            (MouseButton::Left | MouseButton::Right, true) => self.pressed = Some(button),
            (_, false) if self.pressed == Some(button) => self.pressed = None,
            _ => (),
        }
    }
}

#[derive(Debug)]
struct AppState {
    // Dropped first: flushes the queue while the device is still alive.
    renderer: Renderer,
    swap_chain: SwapChain,
    window: Arc<Window>,
    title: String,
    timer: GameTimer,
    stats: FrameStats,
    mouse: MouseState,
    focused: bool,
    minimized: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &AppConfig) -> anyhow::Result<Self> {
        let instance = GpuContext::mk_instance();
        let surface = instance
            .create_surface(window.clone())
            .context("Cannot create a surface for the window")?;
        let ctx = GpuContext::new(instance, Some(&surface)).await?;

        let size = window.inner_size();
        let swap_chain = SwapChain::new(surface, &ctx.adapter, &ctx.device, size.width, size.height)?;
        let (width, height) = swap_chain.size();

        let scene = Scene::build(config.demo, config.frame_resources)?;
        let renderer = Renderer::new(
            &ctx,
            scene,
            RendererConfig {
                format: swap_chain.format(),
                width,
                height,
                frame_resources: config.frame_resources,
                msaa: config.msaa,
                wireframe: config.wireframe,
            },
        )?;

        Ok(Self {
            renderer,
            swap_chain,
            window,
            title: config.title.clone(),
            timer: GameTimer::new(),
            stats: FrameStats::new(),
            mouse: MouseState::default(),
            focused: true,
            minimized: false,
        })
    }

    fn is_paused(&self) -> bool {
        !self.focused || self.minimized
    }

    fn set_paused(&mut self, focused: bool, minimized: bool) {
        let was_paused = self.is_paused();
        self.focused = focused;
        self.minimized = minimized;
        match (was_paused, self.is_paused()) {
            (false, true) => {
                log::info!("Paused");
                self.timer.stop();
            }
            (true, false) => {
                log::info!("Resumed");
                self.timer.start();
                self.window.request_redraw();
            }
            _ => (),
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        if width == 0 || height == 0 {
            self.set_paused(self.focused, true);
            return Ok(());
        }
        self.renderer.resize(width, height)?;
        self.swap_chain.resize(width, height);
        self.set_paused(self.focused, false);
        Ok(())
    }

    fn on_mouse_move(&mut self, position: PhysicalPosition<f64>) {
        if let (Some(button), Some(last)) = (self.mouse.pressed, self.mouse.last) {
            let dx = (position.x - last.x) as f32;
            let dy = (position.y - last.y) as f32;
            match button {
                MouseButton::Left => self.renderer.camera.rotate(dx, dy),
                MouseButton::Right => self.renderer.camera.zoom(dx, dy),
                _ => (),
            }
        }
        self.mouse.last = Some(position);
    }

    fn on_key_released(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::F2 => {
                let enabled = !self.renderer.msaa_enabled();
                self.renderer.set_msaa(enabled)?;
            }
            _ => (),
        }
        Ok(())
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        self.timer.tick();
        if let Some((fps, mspf)) = self.stats.record(self.timer.total_time()) {
            self.window.set_title(&format_caption(&self.title, fps, mspf));
        }

        self.renderer.update(&self.timer)?;

        let Some(output) = self.swap_chain.acquire()? else {
            return Ok(());
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.render_frame(&view)?;
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

pub struct App {
    config: AppConfig,
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
        Ok(Self {
            config,
            async_runtime,
            state: None,
            error: None,
        })
    }

    /// Stop the event loop and keep the error for [`run`].
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_min_inner_size(PhysicalSize::new(MIN_CLIENT_SIZE, MIN_CLIENT_SIZE));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow::Error::new(e).context("Cannot create the window")),
        };

        match self.async_runtime.block_on(AppState::new(window, &self.config)) {
            Ok(mut state) => {
                state.timer.reset();
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e.context("App initialization failed")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::Focused(focused) => {
                state.set_paused(focused, state.minimized);
                Ok(())
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Released,
                        ..
                    },
                ..
            } => state.on_key_released(key, event_loop),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                state.mouse.on_button(button, button_state.is_pressed());
                Ok(())
            }
            WindowEvent::CursorMoved { position, .. } => {
                state.on_mouse_move(position);
                Ok(())
            }
            WindowEvent::RedrawRequested if !state.is_paused() => state.redraw(),
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match &self.state {
            Some(state) if !state.is_paused() => {
                event_loop.set_control_flow(ControlFlow::Poll);
                state.window.request_redraw();
            }
            _ => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Flushes the queue before the device goes away.
        self.state = None;
    }
}

/// Open the window and run until it is closed.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };
    config.validate()?;
    log::info!("Starting the {} demo", config.demo);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
