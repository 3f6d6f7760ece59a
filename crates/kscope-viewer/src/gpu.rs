// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GPU setup and resources for the voxel renderer.

use anyhow::{Context, Result};
use egui_wgpu::wgpu;
use egui_winit::winit::dpi::PhysicalSize;
use egui_winit::winit::window::Window;
use wgpu::util::DeviceExt;

const INITIAL_INSTANCES: usize = 4096;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

/// One voxel (or one voxel outline) on the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub center: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub _pad: f32,
}

pub struct Mesh {
    pub vbuf: wgpu::Buffer,
    pub ibuf: wgpu::Buffer,
    pub count: u32,
}

/// Growable per-instance vertex buffer.
pub struct InstanceBuffer {
    pub buf: wgpu::Buffer,
    capacity: usize,
    label: &'static str,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        Self {
            buf: create_instance_buffer(device, label, capacity),
            capacity,
            label,
        }
    }

    /// Upload `data`, reallocating when it no longer fits.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[Instance]) {
        if data.len() > self.capacity {
            self.capacity = data.len().next_power_of_two();
            self.buf = create_instance_buffer(device, self.label, self.capacity);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buf, 0, bytemuck::cast_slice(data));
        }
    }
}

pub struct Pipelines {
    pub voxel: wgpu::RenderPipeline,
    pub outline: wgpu::RenderPipeline,
}

pub struct Gpu {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pmode_fast: wgpu::PresentMode,
    pub pmode_vsync: wgpu::PresentMode,
    pub sample_count: u32,
    pub max_tex: u32,
    pub msaa_view: Option<wgpu::TextureView>,
    pub depth: wgpu::TextureView,
    pub cube: Mesh,
    pub cube_edges: Mesh,
    pub globals_buf: wgpu::Buffer,
    pub voxels: InstanceBuffer,
    pub outlines: InstanceBuffer,
    pub bind_group: wgpu::BindGroup,
    pub pipelines: Pipelines,
}

impl Gpu {
    pub async fn new(window: &'static Window) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kscope-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(limits.clone()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .context("requesting GPU device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let pmode_fast = caps
            .present_modes
            .iter()
            .copied()
            .find(|m| {
                matches!(
                    m,
                    wgpu::PresentMode::Immediate | wgpu::PresentMode::AutoNoVsync
                )
            })
            .unwrap_or(wgpu::PresentMode::Fifo);
        let pmode_vsync = caps
            .present_modes
            .iter()
            .copied()
            .find(|m| matches!(m, wgpu::PresentMode::Fifo))
            .unwrap_or(pmode_fast);
        let max_dim = limits.max_texture_dimension_2d;
        let sample_count = 4;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.min(max_dim).max(1),
            height: size.height.min(max_dim).max(1),
            present_mode: pmode_vsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth = create_depth(&device, config.width, config.height, sample_count);
        let msaa_view = create_msaa(
            &device,
            config.format,
            config.width,
            config.height,
            sample_count,
        );

        let cube = unit_cube(&device);
        let cube_edges = unit_cube_edges(&device);

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let voxels = InstanceBuffer::new(&device, "voxel_instances", INITIAL_INSTANCES);
        let outlines = InstanceBuffer::new(&device, "outline_instances", INITIAL_INSTANCES);

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bg"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("shader_voxels.wgsl"));
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let voxel = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            PipelineSpec {
                label: "voxel_pipeline",
                fragment: "fs_lit",
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
                format,
                sample_count,
            },
        );
        let outline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            PipelineSpec {
                label: "outline_pipeline",
                fragment: "fs_flat",
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                format,
                sample_count,
            },
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pmode_fast,
            pmode_vsync,
            sample_count,
            max_tex: max_dim,
            msaa_view,
            depth,
            cube,
            cube_edges,
            globals_buf,
            voxels,
            outlines,
            bind_group,
            pipelines: Pipelines { voxel, outline },
        })
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width.min(self.max_tex);
        self.config.height = size.height.min(self.max_tex);
        self.surface.configure(&self.device, &self.config);
        self.depth = create_depth(
            &self.device,
            self.config.width,
            self.config.height,
            self.sample_count,
        );
        self.msaa_view = create_msaa(
            &self.device,
            self.config.format,
            self.config.width,
            self.config.height,
            self.sample_count,
        );
    }

    pub fn set_vsync(&mut self, on: bool) {
        let mode = if on {
            self.pmode_vsync
        } else {
            self.pmode_fast
        };
        if self.config.present_mode != mode {
            self.config.present_mode = mode;
            self.surface.configure(&self.device, &self.config);
        }
    }
}

// Helpers ------------------------------------------------------------

struct PipelineSpec {
    label: &'static str,
    fragment: &'static str,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
    format: wgpu::TextureFormat,
    sample_count: u32,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    spec: PipelineSpec,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Instance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x3,
                        3 => Float32,
                        4 => Float32x4
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(spec.fragment),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: spec.format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            cull_mode: spec.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: spec.sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

fn create_instance_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (std::mem::size_of::<Instance>() * capacity.max(1)) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth(device: &wgpu::Device, w: u32, h: u32, sample_count: u32) -> wgpu::TextureView {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width: w.max(1),
            height: h.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_msaa(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    w: u32,
    h: u32,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_color"),
        size: wgpu::Extent3d {
            width: w.max(1),
            height: h.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(tex.create_view(&wgpu::TextureViewDescriptor::default()))
}

/// Face-normal cube, unit edge length, centered on the origin.
pub fn cube_geometry() -> (Vec<Vertex>, Vec<u16>) {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    let mut verts = Vec::with_capacity(24);
    let mut idx = Vec::with_capacity(36);
    for (n, u, v) in FACES {
        let n = glam::Vec3::from_array(n);
        let u = glam::Vec3::from_array(u);
        let v = glam::Vec3::from_array(v);
        let base = u16::try_from(verts.len()).unwrap_or(u16::MAX);
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            verts.push(Vertex {
                pos: (n * 0.5 + u * su + v * sv).to_array(),
                normal: n.to_array(),
            });
        }
        idx.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (verts, idx)
}

/// The twelve cube edges as a line list over the eight corners.
pub fn cube_edge_geometry() -> (Vec<Vertex>, Vec<u16>) {
    let verts = (0..8u8)
        .map(|i| Vertex {
            pos: [
                if i & 1 == 0 { -0.5 } else { 0.5 },
                if i & 2 == 0 { -0.5 } else { 0.5 },
                if i & 4 == 0 { -0.5 } else { 0.5 },
            ],
            normal: [0.0, 0.0, 0.0],
        })
        .collect();
    let mut idx = Vec::with_capacity(24);
    for a in 0..8u16 {
        for bit in [1u16, 2, 4] {
            if a & bit == 0 {
                idx.extend_from_slice(&[a, a | bit]);
            }
        }
    }
    (verts, idx)
}

#[allow(clippy::cast_possible_truncation)]
fn upload_mesh(device: &wgpu::Device, label: &str, verts: &[Vertex], idx: &[u16]) -> Mesh {
    let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(verts),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let ibuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(idx),
        usage: wgpu::BufferUsages::INDEX,
    });
    Mesh {
        vbuf,
        ibuf,
        count: idx.len() as u32,
    }
}

fn unit_cube(device: &wgpu::Device) -> Mesh {
    let (verts, idx) = cube_geometry();
    upload_mesh(device, "cube", &verts, &idx)
}

fn unit_cube_edges(device: &wgpu::Device) -> Mesh {
    let (verts, idx) = cube_edge_geometry();
    upload_mesh(device, "cube_edges", &verts, &idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_faces_wind_outward() {
        let (verts, idx) = cube_geometry();
        assert_eq!(verts.len(), 24);
        assert_eq!(idx.len(), 36);
        for tri in idx.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(verts[i as usize].pos));
            let n = Vec3::from_array(verts[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0, "triangle {tri:?} faces inward");
        }
    }

    #[test]
    fn edges_cover_twelve_unit_segments() {
        let (verts, idx) = cube_edge_geometry();
        assert_eq!(idx.len(), 24);
        for pair in idx.chunks(2) {
            let a = Vec3::from_array(verts[pair[0] as usize].pos);
            let b = Vec3::from_array(verts[pair[1] as usize].pos);
            assert!(((a - b).length() - 1.0).abs() < 1e-6);
        }
    }
}
