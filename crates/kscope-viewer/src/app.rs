// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level application wiring and event loop handler.

use crate::{
    core::UiState,
    render_port::WinitRenderPort,
    ui_effects::{self, UiEffectsRunner},
    ui_state::{self, UiEvent},
    viewer_state::ViewerState,
    viewport::Viewport,
    Args,
};
use anyhow::{Context, Result};
use egui_winit::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes},
};
use egui_winit::State as EguiWinitState;
use kscope_app_core::{
    config::ConfigService,
    config_port::ConfigPort,
    toast::{ToastKind, ToastScope, ToastService},
};
use kscope_client::{BlockSession, HttpBackend};
use kscope_config_fs::FsConfigStore;
use kscope_trace::BlockCoord;
use kscope_voxel::ColorAssigner;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub struct App {
    pub viewports: Vec<Viewport>,
    pub egui_ctx: egui::Context,
    pub config: Option<Box<dyn ConfigPort>>,
    pub ui_runner: ui_effects::RealEffectsRunner,
    pub toasts: ToastService,
    pub session: BlockSession<HttpBackend>,
    pub ui: UiState,
    pub viewer: ViewerState,
    shutdown_requested: bool,
}

impl App {
    pub fn new(args: &Args) -> Result<Self> {
        let mut toasts = ToastService::new(32);
        let config = match FsConfigStore::new() {
            Ok(store) => Some(Box::new(ConfigService::new(store)) as Box<dyn ConfigPort>),
            Err(err) => {
                warn!(error = %err, "config store unavailable");
                toasts.push(
                    ToastKind::Warn,
                    ToastScope::Global,
                    "Config store unavailable",
                    Some(String::from("Preferences won't persist this session")),
                    Duration::from_secs(6),
                    Instant::now(),
                );
                None
            }
        };
        let prefs = config
            .as_ref()
            .and_then(|c| c.load_prefs())
            .unwrap_or_default();

        let server = args
            .server
            .clone()
            .unwrap_or_else(|| prefs.server.base_url.clone());
        let backend = HttpBackend::new(server.clone())
            .with_context(|| format!("building HTTP client for {server}"))?;
        info!(server = %server, "using trace server");

        let mut viewer = ViewerState::new(server.clone(), ColorAssigner::new());
        viewer.apply_prefs(&prefs);

        let mut app = Self {
            viewports: Vec::new(),
            egui_ctx: egui::Context::default(),
            config,
            ui_runner: ui_effects::RealEffectsRunner,
            toasts,
            session: BlockSession::new(backend),
            ui: UiState::new(server),
            viewer,
            shutdown_requested: false,
        };
        app.apply_ui_event(UiEvent::RefreshCatalog);
        let start = args
            .block
            .or_else(|| prefs.last_block.map(|[x, y, z]| BlockCoord::new(x, y, z)));
        if let Some(block) = start {
            app.apply_ui_event(UiEvent::SelectBlock(block));
        }
        Ok(app)
    }

    pub fn apply_ui_event(&mut self, ev: UiEvent) {
        let shutdown = matches!(ev, UiEvent::ShutdownRequested);
        let (next, effects) = ui_state::reduce(&self.ui, ev);
        self.ui = next;
        let followups = self.ui_runner.run(
            effects,
            &mut self.session,
            self.config.as_deref(),
            &mut self.viewer,
        );
        if shutdown {
            self.shutdown_requested = true;
        }
        for ev in followups {
            self.apply_ui_event(ev);
        }
    }

    fn create_viewport(&self, event_loop: &ActiveEventLoop) -> Result<Viewport> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title("KernelScope")
                    .with_visible(true),
            )
            .context("creating window")?;
        let window: &'static Window = Box::leak(Box::new(window));
        let gpu = pollster::block_on(crate::gpu::Gpu::new(window))?;
        let egui_state = EguiWinitState::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            event_loop,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            egui_wgpu::RendererOptions::default(),
        );
        let render_port = WinitRenderPort::new(window);
        Ok(Viewport {
            window,
            gpu,
            egui_state,
            egui_renderer,
            render_port,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.viewports.is_empty() {
            return;
        }
        match self.create_viewport(event_loop) {
            Ok(mut vp) => {
                vp.gpu.set_vsync(self.viewer.vsync);
                self.viewports.push(vp);
            }
            Err(err) => {
                error!("viewer startup failed: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: egui_winit::winit::window::WindowId,
        event: WindowEvent,
    ) {
        self.handle_window_event(window_id, event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewports.is_empty() {
            return;
        }
        if self.shutdown_requested {
            if let Some(cfg) = &self.config {
                cfg.save_prefs(&self.viewer.export_prefs());
            }
            event_loop.exit();
            return;
        }
        self.frame();
    }
}
