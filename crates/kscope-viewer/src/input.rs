// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Input handling: map winit events into urgent viewer work and UI events.

use egui_winit::winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};
use glam::Vec2;
use kscope_trace::NavKey;
use kscope_voxel::{CameraInput, CameraKey};

use crate::{
    core::{Focus, Screen, UiState},
    ui_state::UiEvent,
    viewer_state::{Urgent, ViewerState},
};

/// Pixels of scroll per wheel notch when the platform reports lines.
const LINE_PX: f32 = 100.0;

#[derive(Default)]
pub struct InputOutcome {
    pub ui_event: Option<UiEvent>,
}

/// What egui already claimed this frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct EguiClaims {
    pub keyboard: bool,
    pub pointer: bool,
}

pub const fn camera_key(code: KeyCode) -> Option<CameraKey> {
    Some(match code {
        KeyCode::KeyW => CameraKey::W,
        KeyCode::KeyS => CameraKey::S,
        KeyCode::KeyA => CameraKey::A,
        KeyCode::KeyD => CameraKey::D,
        KeyCode::KeyO => CameraKey::O,
        KeyCode::KeyP => CameraKey::P,
        KeyCode::ArrowUp => CameraKey::ArrowUp,
        KeyCode::ArrowDown => CameraKey::ArrowDown,
        KeyCode::ArrowLeft => CameraKey::ArrowLeft,
        KeyCode::ArrowRight => CameraKey::ArrowRight,
        _ => return None,
    })
}

pub const fn nav_key(code: KeyCode) -> Option<NavKey> {
    match code {
        KeyCode::ArrowDown | KeyCode::ArrowRight => Some(NavKey::Forward),
        KeyCode::ArrowUp | KeyCode::ArrowLeft => Some(NavKey::Backward),
        _ => None,
    }
}

const fn is_arrow(code: KeyCode) -> bool {
    matches!(
        code,
        KeyCode::ArrowUp | KeyCode::ArrowDown | KeyCode::ArrowLeft | KeyCode::ArrowRight
    )
}

/// Route a key press. Arrows follow focus; letters always drive the camera.
pub fn route_key(code: KeyCode, focus: Focus) -> Option<Urgent> {
    if is_arrow(code) && focus == Focus::Source {
        return nav_key(code).map(Urgent::Nav);
    }
    if code == KeyCode::KeyR {
        return Some(Urgent::ResetView);
    }
    camera_key(code).map(|k| Urgent::Camera(CameraInput::Key(k)))
}

/// Browser-style wheel delta: positive scrolls down (zooms out).
#[allow(clippy::cast_possible_truncation)]
pub fn wheel_delta(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_PX,
        MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
    }
}

#[allow(clippy::cast_possible_truncation)]
pub fn handle_window_event(
    event: &WindowEvent,
    viewer: &mut ViewerState,
    ui: &UiState,
    claims: EguiClaims,
) -> InputOutcome {
    let mut out = InputOutcome::default();
    let in_view = ui.screen == Screen::View;
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            if event.state != ElementState::Pressed || claims.keyboard {
                return out;
            }
            let PhysicalKey::Code(code) = event.physical_key else {
                return out;
            };
            match code {
                KeyCode::Escape => out.ui_event = Some(UiEvent::CloseOverlay),
                KeyCode::Tab if in_view => out.ui_event = Some(UiEvent::ToggleFocus),
                _ if in_view => {
                    if let Some(work) = route_key(code, ui.focus) {
                        viewer.enqueue(work);
                    }
                }
                _ => {}
            }
        }
        WindowEvent::CursorMoved { position, .. } => {
            let at = Vec2::new(position.x as f32, position.y as f32);
            viewer.pointer = Some(at);
            if viewer.drag_active {
                viewer.enqueue(Urgent::Camera(CameraInput::DragMove(at)));
            }
        }
        WindowEvent::CursorLeft { .. } => {
            viewer.pointer = None;
            viewer.pointer_hit(None);
        }
        WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } => match state {
            ElementState::Pressed if in_view && !claims.pointer => {
                if let Some(at) = viewer.pointer {
                    viewer.drag_active = true;
                    viewer.enqueue(Urgent::Camera(CameraInput::DragStart(at)));
                }
            }
            ElementState::Released if viewer.drag_active => {
                viewer.drag_active = false;
                viewer.enqueue(Urgent::Camera(CameraInput::DragEnd));
            }
            _ => {}
        },
        WindowEvent::MouseWheel { delta, .. } if in_view && !claims.pointer => {
            viewer.enqueue(Urgent::Camera(CameraInput::Wheel(wheel_delta(delta))));
        }
        _ => {}
    }
    out
}
