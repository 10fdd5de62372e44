//! Application event loop around the frame driver.
//!
//! [`run`] owns the winit lifecycle: it creates the window and GPU context,
//! invokes the user's scene constructor once, then drives one
//! update-compose-draw traversal per redraw and submits the recorded
//! commands. Async work (texture loads, anything else spawned from the
//! constructor) lands back on the loop as [`SceneProxy::mutate`] closures,
//! which are applied between frames so their effects show up in the next
//! traversal, never mid-frame.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::scene_graph::Scene,
    frame::FrameDriver,
    render::{self, CommandList},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Builds the scene once the GPU context exists.
///
/// The constructor may compile programs, upload meshes, and kick off async
/// loads through the [`SceneProxy`] it is handed.
pub type SceneConstructor = Box<dyn FnOnce(&mut Context, SceneProxy) -> anyhow::Result<Scene>>;

pub(crate) type MutFn = Box<dyn FnOnce(&mut Context, &mut Scene) + Send>;

pub(crate) enum SceneEvent {
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<AppState>),
    Mut(MutFn),
    Exit,
}

impl std::fmt::Debug for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Mut(_) => f.write_str("Mut(|&mut Context, &mut Scene| -> {...})"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// Cloneable handle for feeding mutations back into the running loop.
#[derive(Clone)]
pub struct SceneProxy {
    proxy: EventLoopProxy<SceneEvent>,
}

impl SceneProxy {
    /// Queue a closure that runs on the main thread between frames.
    pub fn mutate(&self, f: impl FnOnce(&mut Context, &mut Scene) + Send + 'static) {
        if self.proxy.send_event(SceneEvent::Mut(Box::new(f))).is_err() {
            log::warn!("scene mutation arrived after the event loop closed");
        }
    }

    /// Ask the loop to shut down.
    pub fn exit(&self) {
        let _ = self.proxy.send_event(SceneEvent::Exit);
    }
}

/// Everything alive once initialization finished.
pub(crate) struct AppState {
    ctx: Context,
    scene: Scene,
    driver: FrameDriver,
    commands: CommandList,
    is_surface_configured: bool,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.is_surface_configured = true;
            self.ctx.resize(width, height);
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<SceneEvent>,
    state: Option<AppState>,
    // We use Option to `take()` the constructor after use.
    constructor: Option<SceneConstructor>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<SceneEvent>, constructor: SceneConstructor) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            constructor: Some(constructor),
            last_time: Instant::now(),
        })
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => panic!("App initialization failed. Cannot create a window: {}", e),
        };

        let constructor = match self.constructor.take() {
            Some(constructor) => constructor,
            None => return,
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut ctx = match self.async_runtime.block_on(Context::new(window)) {
                Ok(ctx) => ctx,
                Err(e) => panic!(
                    "App initialization failed. Cannot create the main context: {}",
                    e
                ),
            };
            let scene_proxy = SceneProxy {
                proxy: self.proxy.clone(),
            };
            // Spawns issued by the constructor need a reactor to land on.
            let _guard = self.async_runtime.enter();
            let scene = match constructor(&mut ctx, scene_proxy) {
                Ok(scene) => scene,
                Err(e) => panic!("App initialization failed. Scene constructor errored: {}", e),
            };
            self.state = Some(AppState {
                ctx,
                scene,
                driver: FrameDriver::new(),
                commands: CommandList::new(),
                is_surface_configured: false,
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let mut ctx = match Context::new(window).await {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        log::error!("Cannot create the main context: {}", e);
                        return;
                    }
                };
                let scene_proxy = SceneProxy {
                    proxy: proxy.clone(),
                };
                match constructor(&mut ctx, scene_proxy) {
                    Ok(scene) => {
                        let state = AppState {
                            ctx,
                            scene,
                            driver: FrameDriver::new(),
                            commands: CommandList::new(),
                            is_surface_configured: false,
                        };
                        assert!(
                            proxy
                                .send_event(SceneEvent::Initialized(Box::new(state)))
                                .is_ok()
                        );
                    }
                    Err(e) => log::error!("Scene constructor errored: {}", e),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            SceneEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(*state);
                let state = match &mut self.state {
                    Some(state) => state,
                    None => return,
                };
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
            }
            SceneEvent::Mut(mutation) => {
                if let Some(state) = &mut self.state {
                    mutation(&mut state.ctx, &mut state.scene);
                }
            }
            SceneEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                state.ctx.window.request_redraw();

                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                // Rendering requires the surface to be configured
                if !state.is_surface_configured {
                    return;
                }

                let projection = state.ctx.projection.calc_matrix();
                let view = state.ctx.camera.calc_matrix();
                state
                    .driver
                    .frame(&mut state.scene, dt, projection, view, &mut state.commands);

                match render::submit(&state.ctx, &state.commands) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and drive `constructor`'s scene until the window closes.
pub fn run(constructor: SceneConstructor) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, constructor)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
