// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render helper: uploads voxel instances and draws the scene + egui.

use crate::{
    gpu::{Globals, Instance},
    viewer_state::ViewerState,
    viewport::Viewport,
};
use egui_wgpu::wgpu;
use glam::Mat4;
use kscope_voxel::{Rgb, VoxelInstance, VOXEL_SIZE};
use tracing::{error, warn};

/// Outlines sit a hair outside the faces so they survive the depth test.
const OUTLINE_SCALE: f32 = 1.002;
const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.08,
    b: 0.1,
    a: 1.0,
};

pub struct RenderOutputs {
    pub frame_ms: f32,
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_rgba(color: Rgb) -> [f32; 4] {
    let [r, g, b] = color.to_f32();
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), 1.0]
}

/// Split scene voxels into filled cubes and outlines.
///
/// The hovered voxel keeps its outline even when outlines are switched off.
pub fn build_instances(voxels: &[VoxelInstance], outlines: bool) -> (Vec<Instance>, Vec<Instance>) {
    let fills = voxels
        .iter()
        .map(|v| Instance {
            center: v.center.to_array(),
            size: VOXEL_SIZE,
            color: linear_rgba(v.color),
        })
        .collect();
    let edges = voxels
        .iter()
        .filter(|v| outlines || v.outline == Rgb::HOVER_OUTLINE)
        .map(|v| Instance {
            center: v.center.to_array(),
            size: VOXEL_SIZE * OUTLINE_SCALE,
            color: linear_rgba(v.outline),
        })
        .collect();
    (fills, edges)
}

#[allow(clippy::cast_possible_truncation)]
const fn count_u32(n: usize) -> u32 {
    n as u32
}

/// Render the scene and UI. Returns frame timing.
pub fn render_frame(
    vp: &mut Viewport,
    viewer: &ViewerState,
    view_proj: Mat4,
    paint_jobs: &[egui::epaint::ClippedPrimitive],
    textures_delta: egui::TexturesDelta,
    screen_desc: &egui_wgpu::ScreenDescriptor,
) -> RenderOutputs {
    let gpu = &mut vp.gpu;

    let globals = Globals {
        view_proj: view_proj.to_cols_array_2d(),
        light_dir: [0.3, 0.8, 0.5],
        _pad: 0.0,
    };
    gpu.queue
        .write_buffer(&gpu.globals_buf, 0, bytemuck::bytes_of(&globals));

    let voxels = viewer.scene.instances(viewer.hover.current());
    let (fills, edges) = build_instances(&voxels, viewer.show_outlines);
    gpu.voxels.write(&gpu.device, &gpu.queue, &fills);
    gpu.outlines.write(&gpu.device, &gpu.queue, &edges);

    let frame = match gpu.surface.get_current_texture() {
        Ok(f) => f,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            gpu.resize(egui_winit::winit::dpi::PhysicalSize::new(
                gpu.config.width,
                gpu.config.height,
            ));
            match gpu.surface.get_current_texture() {
                Ok(f) => f,
                Err(err) => {
                    warn!(error = %err, "surface unavailable after reconfigure");
                    return RenderOutputs { frame_ms: 0.0 };
                }
            }
        }
        Err(err) => {
            error!(error = %err, "could not acquire surface texture");
            return RenderOutputs { frame_ms: 0.0 };
        }
    };
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let (color_view, resolve_view) = gpu
        .msaa_view
        .as_ref()
        .map_or((&view, None), |msaa| (msaa, Some(&view)));

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("main-encoder"),
        });

    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("voxels"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: resolve_view,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gpu.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        rpass.set_bind_group(0, &gpu.bind_group, &[]);
        if !fills.is_empty() {
            rpass.set_pipeline(&gpu.pipelines.voxel);
            rpass.set_vertex_buffer(0, gpu.cube.vbuf.slice(..));
            rpass.set_vertex_buffer(1, gpu.voxels.buf.slice(..));
            rpass.set_index_buffer(gpu.cube.ibuf.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..gpu.cube.count, 0, 0..count_u32(fills.len()));
        }
        if !edges.is_empty() {
            rpass.set_pipeline(&gpu.pipelines.outline);
            rpass.set_vertex_buffer(0, gpu.cube_edges.vbuf.slice(..));
            rpass.set_vertex_buffer(1, gpu.outlines.buf.slice(..));
            rpass.set_index_buffer(gpu.cube_edges.ibuf.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..gpu.cube_edges.count, 0, 0..count_u32(edges.len()));
        }
    }

    let cmd_main = encoder.finish();

    let egui_renderer = &mut vp.egui_renderer;
    let cmd_ui = {
        let mut egui_encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui-encoder"),
            });

        for (id, delta) in textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }
        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut egui_encoder,
            paint_jobs,
            screen_desc,
        );
        {
            let rpass = egui_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let mut rpass = rpass.forget_lifetime();
            egui_renderer.render(&mut rpass, paint_jobs, screen_desc);
        }
        for id in textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        egui_encoder.finish()
    };

    gpu.queue.submit([cmd_main, cmd_ui]);
    frame.present();

    let frame_ms = viewer.last_frame.elapsed().as_secs_f32() * 1000.0;
    RenderOutputs { frame_ms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn voxel(outline: Rgb) -> VoxelInstance {
        VoxelInstance {
            center: Vec3::ZERO,
            color: Rgb::WHITE,
            outline,
            highlighted: false,
        }
    }

    #[test]
    fn hovered_outline_survives_outline_toggle() {
        let voxels = [voxel(Rgb::BLACK), voxel(Rgb::HOVER_OUTLINE)];
        let (fills, edges) = build_instances(&voxels, false);
        assert_eq!(fills.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].color, [1.0, 1.0, 0.0, 1.0]);
        let (_, edges) = build_instances(&voxels, true);
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn srgb_endpoints_are_fixed() {
        assert!(srgb_to_linear(0.0).abs() < f32::EPSILON);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
    }
}
