// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Window, GPU and egui state for the single viewer window.

use crate::{gpu::Gpu, render_port::WinitRenderPort};
use egui_wgpu::Renderer;
use egui_winit::winit::window::Window;
use egui_winit::State as EguiWinitState;
use glam::Vec2;

pub struct Viewport {
    pub window: &'static Window,
    pub gpu: Gpu,
    pub egui_state: EguiWinitState,
    pub egui_renderer: Renderer,
    pub render_port: WinitRenderPort,
}

impl Viewport {
    /// Surface size in physical pixels.
    #[allow(clippy::cast_precision_loss)]
    pub fn size_px(&self) -> Vec2 {
        Vec2::new(
            self.gpu.config.width.max(1) as f32,
            self.gpu.config.height.max(1) as f32,
        )
    }

    pub fn aspect(&self) -> f32 {
        let size = self.size_px();
        size.x / size.y
    }

    /// Physical pixel position to normalized device coordinates (+Y up).
    pub fn to_ndc(&self, px: Vec2) -> Vec2 {
        pixel_to_ndc(px, self.size_px())
    }

    /// NDC back to egui points.
    #[allow(clippy::cast_possible_truncation)]
    pub fn ndc_to_points(&self, ndc: Vec2) -> egui::Pos2 {
        let ppp = self.window.scale_factor() as f32;
        let px = ndc_to_pixel(ndc, self.size_px());
        egui::pos2(px.x / ppp, px.y / ppp)
    }
}

pub fn pixel_to_ndc(px: Vec2, size: Vec2) -> Vec2 {
    let ndc = (px / size) * 2.0 - Vec2::ONE;
    Vec2::new(ndc.x, -ndc.y)
}

pub fn ndc_to_pixel(ndc: Vec2, size: Vec2) -> Vec2 {
    Vec2::new((ndc.x * 0.5 + 0.5) * size.x, (-ndc.y * 0.5 + 0.5) * size.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn corners_map_to_ndc_extremes() {
        let size = Vec2::new(800.0, 600.0);
        let tl = pixel_to_ndc(Vec2::ZERO, size);
        assert_relative_eq!(tl.x, -1.0);
        assert_relative_eq!(tl.y, 1.0);
        let center = pixel_to_ndc(size / 2.0, size);
        assert_relative_eq!(center.length(), 0.0);
        let back = ndc_to_pixel(pixel_to_ndc(Vec2::new(200.0, 450.0), size), size);
        assert_relative_eq!(back.x, 200.0, epsilon = 1e-3);
        assert_relative_eq!(back.y, 450.0, epsilon = 1e-3);
    }
}
