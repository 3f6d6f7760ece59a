// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-frame tick: fetch results, input work, egui and the render pass.

use crate::{
    app::App,
    core::Screen,
    ports::BlockPort,
    render,
    ui::{
        draw_error_screen, draw_grid_screen, draw_loading_screen, draw_overlay, draw_view_hud,
        SceneLabel,
    },
    ui_state::UiEvent,
    viewer_state::DEFERRED_BUDGET,
    viewport::Viewport,
};
use kscope_app_core::{render_port::RenderPort, toast::ToastScope};
use kscope_client::SessionUpdate;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Fetch results applied per frame.
const MAX_UPDATES: usize = 16;

impl App {
    fn drain_session(&mut self, now: Instant) {
        for update in BlockPort::drain_updates(&mut self.session, MAX_UPDATES) {
            match update {
                SessionUpdate::BlockLoaded(data) => {
                    let block = data.block;
                    if self.ui.block != Some(block) {
                        debug!(%block, "ignoring block the UI no longer wants");
                        continue;
                    }
                    self.viewer.load_block(*data);
                    self.toasts.clear_scope(ToastScope::Block);
                    self.apply_ui_event(UiEvent::BlockLoaded(block));
                }
                SessionUpdate::BlockFailed { block, error } => {
                    warn!(%block, %error, "block fetch failed");
                    self.toasts
                        .error(format!("Block {block} failed"), error.to_string(), now);
                    self.apply_ui_event(UiEvent::BlockFailed {
                        block,
                        message: error.to_string(),
                    });
                }
                SessionUpdate::Catalog(Ok(catalog)) => {
                    debug!(blocks = catalog.len(), "catalog loaded");
                    self.viewer.catalog = Some(catalog);
                    self.apply_ui_event(UiEvent::CatalogLoaded);
                }
                SessionUpdate::Catalog(Err(error)) => {
                    warn!(%error, "catalog fetch failed");
                    self.toasts
                        .error("Could not list blocks", error.to_string(), now);
                    self.apply_ui_event(UiEvent::CatalogFailed(error.to_string()));
                }
            }
        }
    }

    fn scene_labels(&self, vp: &Viewport) -> Vec<SceneLabel> {
        let aspect = vp.aspect();
        self.viewer
            .scene
            .grids()
            .iter()
            .filter_map(|placed| {
                let ndc = self
                    .viewer
                    .camera
                    .project(placed.label_position(), aspect)?;
                Some(SceneLabel {
                    pos: vp.ndc_to_points(ndc),
                    text: placed.grid.label.clone(),
                    color: placed.grid.base_color,
                })
            })
            .collect()
    }

    pub fn frame(&mut self) {
        let now = Instant::now();
        self.viewer.last_frame = now;
        self.drain_session(now);

        let Some(vp) = self.viewports.first_mut() else {
            return;
        };
        let win = vp.window;
        let raw_input = vp.egui_state.take_egui_input(win);
        let aspect = vp.aspect();

        if self.ui.screen == Screen::View {
            let over_ui = self.egui_ctx.is_pointer_over_area();
            let hit = match self.viewer.pointer {
                Some(px) if !over_ui => self.viewer.pick(vp.to_ndc(px), aspect),
                _ => None,
            };
            self.viewer.pointer_hit(hit);
        }
        self.viewer.pump(DEFERRED_BUDGET);
        if self.viewer.has_pending_work() {
            trace!("deferred work carried to next frame");
        }

        let view_proj = self.viewer.camera.view_proj(aspect);
        let labels = match self.viewports.first() {
            Some(vp) if self.ui.screen == Screen::View => self.scene_labels(vp),
            _ => Vec::new(),
        };

        self.toasts.retain_visible(now);
        let toasts = self.toasts.visible(now);
        let vsync_before = self.viewer.vsync;
        let screen = self.ui.screen.clone();
        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            match &screen {
                Screen::Grid => draw_grid_screen(ctx, self),
                Screen::Loading(block) => draw_loading_screen(ctx, *block),
                Screen::View => draw_view_hud(ctx, self, &labels),
                Screen::Error(msg) => draw_error_screen(ctx, self, msg),
            }
            draw_overlay(ctx, self, &toasts);
        });

        let Some(vp) = self.viewports.first_mut() else {
            return;
        };
        vp.egui_state
            .handle_platform_output(win, full_output.platform_output);
        if self.viewer.vsync != vsync_before {
            vp.gpu.set_vsync(self.viewer.vsync);
        }
        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        #[allow(clippy::cast_possible_truncation)]
        let screen_desc = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [vp.gpu.config.width, vp.gpu.config.height],
            pixels_per_point: win.scale_factor() as f32,
        };
        let out = render::render_frame(
            vp,
            &self.viewer,
            view_proj,
            &paint_jobs,
            full_output.textures_delta,
            &screen_desc,
        );
        self.viewer.perf.push(out.frame_ms);
        vp.render_port.request_redraw();
    }
}
