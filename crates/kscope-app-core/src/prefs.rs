// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved viewer preferences (server, camera, HUD).

use serde::{Deserialize, Serialize};

/// Server used when neither prefs nor flags name one.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Saved preferences for the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerPrefs {
    /// Trace server connection.
    pub server: ServerPrefs,
    /// Camera pose at last exit.
    pub camera: CameraPrefs,
    /// HUD toggles.
    pub hud: HudPrefs,
    /// Block that was open at last exit, as `[x, y, z]`.
    pub last_block: Option<[u32; 3]>,
}

/// Where traces come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerPrefs {
    /// Base URL of the trace server.
    pub base_url: String,
}

impl Default for ServerPrefs {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER.to_owned(),
        }
    }
}

/// Camera position and angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPrefs {
    /// World-space position.
    pub pos: [f32; 3],
    /// Yaw in radians.
    pub yaw: f32,
    /// Pitch in radians.
    pub pitch: f32,
}

impl Default for CameraPrefs {
    fn default() -> Self {
        Self {
            pos: [0.0, 0.0, 100.0],
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

/// HUD and overlay toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudPrefs {
    /// Draw tensor labels above grids.
    pub show_labels: bool,
    /// Draw voxel edges.
    pub show_outlines: bool,
    /// Show the frame-time overlay.
    pub show_perf: bool,
    /// Present in vsync mode.
    pub vsync: bool,
}

impl Default for HudPrefs {
    fn default() -> Self {
        Self {
            show_labels: true,
            show_outlines: true,
            show_perf: false,
            vsync: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: ViewerPrefs =
            serde_json::from_str(r#"{ "hud": { "show_perf": true } }"#).unwrap();
        assert_eq!(prefs.server.base_url, DEFAULT_SERVER);
        assert!(prefs.hud.show_perf);
        assert!(prefs.hud.show_labels);
        assert_eq!(prefs.camera.pos, [0.0, 0.0, 100.0]);
        assert_eq!(prefs.last_block, None);
    }
}
