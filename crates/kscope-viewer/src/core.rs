// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain-level UI state for the viewer (screens, overlays, keyboard focus).

use kscope_trace::{AxisFilter, BlockCoord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Launch-grid block picker.
    Grid,
    /// Waiting for a block's source and trace.
    Loading(BlockCoord),
    /// Source, variables and voxel scene for the open block.
    View,
    /// Block-level failure.
    Error(String),
}

/// Which panel receives the arrow keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Source,
    Scene,
}

impl Focus {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Source => Self::Scene,
            Self::Scene => Self::Source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerOverlay {
    None,
    Settings,
}

#[derive(Clone, Debug)]
pub struct UiState {
    pub screen: Screen,
    pub overlay: ViewerOverlay,
    pub focus: Focus,
    pub filter: AxisFilter,
    pub server_url: String,
    pub block: Option<BlockCoord>,
    pub catalog_error: Option<String>,
}

impl UiState {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            screen: Screen::Grid,
            overlay: ViewerOverlay::None,
            focus: Focus::Source,
            filter: AxisFilter::ALL,
            server_url: server_url.into(),
            block: None,
            catalog_error: None,
        }
    }
}
