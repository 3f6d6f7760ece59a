// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stateless egui render helpers for the viewer screens and overlays.

use crate::{
    app::App,
    core::{Focus, ViewerOverlay},
    ui_state::UiEvent,
    viewer_state::Urgent,
};
use egui::{self, Color32, Context, RichText};
use kscope_app_core::toast::{ToastKind, ToastRender};
use kscope_trace::{AxisFilter, BlockCoord, OtherEntry};
use kscope_voxel::Rgb;

/// Tensor label projected to screen space.
pub struct SceneLabel {
    pub pos: egui::Pos2,
    pub text: String,
    pub color: Rgb,
}

const fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

const fn toast_color(kind: ToastKind) -> Color32 {
    match kind {
        ToastKind::Info => Color32::LIGHT_BLUE,
        ToastKind::Warn => Color32::GOLD,
        ToastKind::Error => Color32::LIGHT_RED,
    }
}

fn axis_slider(ui: &mut egui::Ui, label: &str, value: &mut i64, max: u32) {
    ui.add(
        egui::Slider::new(value, -1..=i64::from(max))
            .text(label)
            .custom_formatter(|v, _| if v < 0.0 { "all".into() } else { format!("{v:.0}") }),
    );
}

pub fn draw_grid_screen(ctx: &Context, app: &mut App) {
    let mut picked: Option<BlockCoord> = None;
    let mut filter = app.ui.filter;
    let mut refresh = false;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading("KernelScope");
        ui.label(format!("Server: {}", app.ui.server_url));
        ui.horizontal(|ui| {
            if ui.button("Refresh blocks").clicked() {
                refresh = true;
            }
            if ui.button("Settings").clicked() {
                app.apply_ui_event(UiEvent::OpenSettings);
            }
            if ui.button("Exit").clicked() {
                app.apply_ui_event(UiEvent::ExitClicked);
            }
        });
        if let Some(err) = &app.ui.catalog_error {
            ui.colored_label(Color32::LIGHT_RED, err);
        }
        ui.separator();

        let Some(catalog) = &app.viewer.catalog else {
            ui.label("Loading block catalog...");
            return;
        };
        if catalog.is_empty() {
            ui.label("The server reported no traced blocks.");
            return;
        }
        let [mx, my, mz] = catalog.extents();
        let AxisFilter([fx, fy, fz]) = &mut filter;
        axis_slider(ui, "x", fx, mx);
        axis_slider(ui, "y", fy, my);
        axis_slider(ui, "z", fz, mz);
        ui.separator();

        let slots = catalog.visible_blocks(filter);
        egui::ScrollArea::vertical().show(ui, |ui| {
            let mut z_seen = None;
            for row in slots.chunk_by(|a, b| a.coord.z == b.coord.z && a.coord.y == b.coord.y) {
                let z = row.first().map(|s| s.coord.z);
                if z != z_seen {
                    if let Some(z) = z {
                        ui.label(RichText::new(format!("z = {z}")).strong());
                    }
                    z_seen = z;
                }
                ui.horizontal(|ui| {
                    for slot in row {
                        let text = slot.ops.map_or_else(
                            || format!("{}\n-", slot.coord),
                            |ops| format!("{}\n{ops} ops", slot.coord),
                        );
                        let button = egui::Button::new(text).min_size(egui::vec2(72.0, 40.0));
                        if ui.add_enabled(slot.ops.is_some(), button).clicked() {
                            picked = Some(slot.coord);
                        }
                    }
                });
            }
        });
    });
    if filter != app.ui.filter {
        app.apply_ui_event(UiEvent::FilterChanged(filter));
    }
    if refresh {
        app.apply_ui_event(UiEvent::RefreshCatalog);
    }
    if let Some(block) = picked {
        app.apply_ui_event(UiEvent::SelectBlock(block));
    }
}

pub fn draw_loading_screen(ctx: &Context, block: BlockCoord) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.heading(format!("Loading block ({block})..."));
            ui.spinner();
        });
    });
}

pub fn draw_error_screen(ctx: &Context, app: &mut App, msg: &str) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.heading("Error");
            ui.label(msg);
            ui.add_space(12.0);
            if let Some(block) = app.ui.block {
                if ui.button("Retry").clicked() {
                    app.apply_ui_event(UiEvent::SelectBlock(block));
                }
            }
            if ui.button("Back to blocks").clicked() {
                app.apply_ui_event(UiEvent::BackToGrid);
            }
        });
    });
}

fn other_value_text(entry: &OtherEntry) -> String {
    serde_json::to_string(&entry.update.data).unwrap_or_else(|_| entry.update.data.to_string())
}

fn draw_source_panel(ctx: &Context, app: &App, work: &mut Vec<Urgent>) {
    let Some(open) = &app.viewer.open else {
        return;
    };
    let cursor = app.viewer.cursor_line();
    let lines = app.viewer.navigator.lines();
    let focused = app.ui.focus == Focus::Source;
    egui::SidePanel::left("source")
        .resizable(true)
        .default_width(420.0)
        .show(ctx, |ui| {
            let title = if focused { "Source (arrows step)" } else { "Source" };
            ui.heading(title);
            ui.separator();
            egui::ScrollArea::both().show(ui, |ui| {
                for (idx, text) in open.trace.source().lines().iter().enumerate() {
                    let line = idx + 1;
                    let interesting = lines.contains(line);
                    let mut rich = RichText::new(format!("{line:>4}  {text}")).monospace();
                    if interesting {
                        rich = rich.color(Color32::LIGHT_GREEN);
                    }
                    let resp = ui.selectable_label(line == cursor, rich);
                    if line == cursor && focused {
                        resp.scroll_to_me(None);
                    }
                    if resp.clicked() && interesting {
                        work.push(Urgent::JumpTo(line));
                    }
                }
            });
        });
}

fn draw_variables_panel(ctx: &Context, app: &App, work: &mut Vec<Urgent>) {
    egui::SidePanel::right("variables")
        .resizable(true)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.heading(format!("Line {}", app.viewer.cursor_line()));
            ui.separator();
            ui.label(RichText::new("Tensors").strong());
            if app.viewer.snapshot.tensors.is_empty() {
                ui.label("(none)");
            }
            for placed in app.viewer.scene.grids() {
                let grid = &placed.grid;
                let shape = grid.shape;
                ui.horizontal(|ui| {
                    ui.colored_label(color32(grid.base_color), &grid.name);
                    ui.label(format!("{}x{}x{}", shape.rows, shape.cols, shape.depths));
                    if ui.small_button("Focus").clicked() {
                        work.push(Urgent::FocusTensor(grid.name.clone()));
                    }
                });
                if shape.depths > 1 {
                    ui.horizontal(|ui| {
                        let mut slicing = grid.slice.is_some();
                        let mut slice = grid.slice.unwrap_or(0);
                        let toggled = ui.checkbox(&mut slicing, "Slice").changed();
                        let moved = slicing
                            && ui
                                .add(egui::Slider::new(&mut slice, 0..=shape.depths - 1))
                                .changed();
                        if toggled || moved {
                            work.push(Urgent::SetSlice {
                                name: grid.name.clone(),
                                slice: slicing.then_some(slice),
                            });
                        }
                    });
                }
            }
            ui.separator();
            ui.label(RichText::new("Other variables").strong());
            if app.viewer.snapshot.others.is_empty() {
                ui.label("(none)");
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for entry in &app.viewer.snapshot.others {
                    ui.label(
                        RichText::new(format!("{} = {}", entry.name, other_value_text(entry)))
                            .monospace(),
                    );
                }
            });
        });
}

fn draw_toasts(ctx: &Context, toasts: &[ToastRender]) {
    egui::Area::new("toasts".into())
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
        .show(ctx, |ui| {
            for t in toasts {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.colored_label(toast_color(t.kind), &t.title);
                    if let Some(body) = &t.body {
                        ui.label(body);
                    }
                    ui.add(egui::ProgressBar::new(t.progress).desired_height(2.0));
                });
            }
        });
}

fn draw_settings(ctx: &Context, app: &mut App) {
    let mut open = true;
    let mut save = false;
    egui::Window::new("Viewer Settings")
        .open(&mut open)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.checkbox(&mut app.viewer.show_labels, "Tensor labels");
            ui.checkbox(&mut app.viewer.show_outlines, "Voxel outlines");
            ui.checkbox(&mut app.viewer.show_perf, "Frame time overlay");
            ui.checkbox(&mut app.viewer.vsync, "Enable VSync");
            ui.add_space(8.0);
            if ui.button("Save").clicked() {
                save = true;
            }
        });
    if save {
        app.apply_ui_event(UiEvent::SavePrefs);
    } else if !open {
        app.apply_ui_event(UiEvent::CloseOverlay);
    }
}

/// Draw whichever overlay is open; shared by every screen.
pub fn draw_overlay(ctx: &Context, app: &mut App, toasts: &[ToastRender]) {
    draw_toasts(ctx, toasts);
    if app.ui.overlay == ViewerOverlay::Settings {
        draw_settings(ctx, app);
    }
}

pub fn draw_view_hud(ctx: &Context, app: &mut App, labels: &[SceneLabel]) {
    let mut work = Vec::new();
    let mut back = false;
    let mut settings = false;
    let mut toggle_focus = false;

    egui::TopBottomPanel::top("block_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("< Blocks").clicked() {
                back = true;
            }
            if let Some(block) = app.viewer.open_block() {
                ui.label(RichText::new(format!("Block ({block})")).strong());
            }
            ui.separator();
            let focus = match app.ui.focus {
                Focus::Source => "Focus: source",
                Focus::Scene => "Focus: scene",
            };
            if ui.button(focus).on_hover_text("Tab").clicked() {
                toggle_focus = true;
            }
            if ui.button("Reset view").clicked() {
                work.push(Urgent::ResetView);
            }
            if ui.button("Settings").clicked() {
                settings = true;
            }
        });
    });

    draw_source_panel(ctx, app, &mut work);
    draw_variables_panel(ctx, app, &mut work);

    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("scene_labels"),
    ));
    if app.viewer.show_labels {
        for label in labels {
            painter.text(
                label.pos,
                egui::Align2::CENTER_BOTTOM,
                &label.text,
                egui::FontId::proportional(14.0),
                color32(label.color),
            );
        }
    }

    if let Some(hover) = app.viewer.hover.current() {
        egui::Area::new("hover".into())
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -12.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(hover.to_string()).monospace());
                });
            });
    }

    if app.viewer.show_perf {
        egui::Area::new("perf".into())
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
            .show(ctx, |ui| {
                ui.label(format!(
                    "FPS: {:.1} ({:.2} ms avg) | voxels {}",
                    app.viewer.perf.fps(),
                    app.viewer.perf.avg_ms(),
                    app.viewer.scene.cell_count()
                ));
            });
    }

    for w in work {
        app.viewer.enqueue(w);
    }
    if toggle_focus {
        app.apply_ui_event(UiEvent::ToggleFocus);
    }
    if settings {
        app.apply_ui_event(UiEvent::OpenSettings);
    }
    if back {
        app.apply_ui_event(UiEvent::BackToGrid);
    }
}
