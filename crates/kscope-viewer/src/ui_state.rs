// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure state transitions for the viewer UI (screens, overlays, block selection).

use crate::core::{Screen, UiState, ViewerOverlay};
use kscope_trace::{AxisFilter, BlockCoord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SelectBlock(BlockCoord),
    BlockLoaded(BlockCoord),
    BlockFailed { block: BlockCoord, message: String },
    BackToGrid,
    RefreshCatalog,
    CatalogLoaded,
    CatalogFailed(String),
    FilterChanged(AxisFilter),
    ToggleFocus,
    OpenSettings,
    CloseOverlay,
    SavePrefs,
    ExitClicked,
    ShutdownRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    FetchBlock(BlockCoord),
    DropBlock,
    FetchCatalog,
    SavePrefs,
    QuitApp,
}

pub fn reduce(ui: &UiState, ev: UiEvent) -> (UiState, Vec<UiEffect>) {
    let mut next = ui.clone();
    let mut fx = Vec::new();
    match ev {
        UiEvent::SelectBlock(block) => {
            next.block = Some(block);
            next.screen = Screen::Loading(block);
            next.overlay = ViewerOverlay::None;
            fx.push(UiEffect::FetchBlock(block));
        }
        UiEvent::BlockLoaded(block) => {
            // A late arrival for a block the user already left changes nothing.
            if next.screen == Screen::Loading(block) {
                next.screen = Screen::View;
            }
        }
        UiEvent::BlockFailed { block, message } => {
            if next.block == Some(block) {
                next.screen = Screen::Error(format!("Block {block}: {message}"));
            }
        }
        UiEvent::BackToGrid => {
            next.screen = Screen::Grid;
            next.block = None;
            next.overlay = ViewerOverlay::None;
            fx.push(UiEffect::DropBlock);
        }
        UiEvent::RefreshCatalog => {
            next.catalog_error = None;
            fx.push(UiEffect::FetchCatalog);
        }
        UiEvent::CatalogLoaded => next.catalog_error = None,
        UiEvent::CatalogFailed(msg) => next.catalog_error = Some(msg),
        UiEvent::FilterChanged(filter) => next.filter = filter,
        UiEvent::ToggleFocus => next.focus = next.focus.toggled(),
        UiEvent::OpenSettings => next.overlay = ViewerOverlay::Settings,
        UiEvent::CloseOverlay => next.overlay = ViewerOverlay::None,
        UiEvent::SavePrefs => {
            fx.push(UiEffect::SavePrefs);
            next.overlay = ViewerOverlay::None;
        }
        UiEvent::ExitClicked => fx.push(UiEffect::QuitApp),
        UiEvent::ShutdownRequested => {
            // handled by App; no state change needed here
        }
    }
    (next, fx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Focus;

    const B: BlockCoord = BlockCoord::new(1, 0, 2);

    #[test]
    fn selecting_a_block_starts_loading_and_fetches() {
        let ui = UiState::new("http://localhost:5000");
        let (ui2, fx) = reduce(&ui, UiEvent::SelectBlock(B));
        assert_eq!(ui2.screen, Screen::Loading(B));
        assert_eq!(ui2.block, Some(B));
        assert_eq!(fx, vec![UiEffect::FetchBlock(B)]);
    }

    #[test]
    fn load_for_another_block_is_ignored() {
        let ui = UiState::new("");
        let (ui2, _) = reduce(&ui, UiEvent::SelectBlock(B));
        let (ui3, _) = reduce(&ui2, UiEvent::BlockLoaded(BlockCoord::new(0, 0, 0)));
        assert_eq!(ui3.screen, Screen::Loading(B));
        let (ui4, _) = reduce(&ui3, UiEvent::BlockLoaded(B));
        assert_eq!(ui4.screen, Screen::View);
    }

    #[test]
    fn failure_shows_error_screen_for_live_block() {
        let ui = UiState::new("");
        let (ui2, _) = reduce(&ui, UiEvent::SelectBlock(B));
        let (ui3, _) = reduce(
            &ui2,
            UiEvent::BlockFailed {
                block: B,
                message: "HTTP 500".into(),
            },
        );
        assert!(matches!(ui3.screen, Screen::Error(ref m) if m.contains("HTTP 500")));
    }

    #[test]
    fn back_to_grid_drops_block_scope() {
        let ui = UiState::new("");
        let (ui2, _) = reduce(&ui, UiEvent::SelectBlock(B));
        let (ui3, fx) = reduce(&ui2, UiEvent::BackToGrid);
        assert_eq!(ui3.screen, Screen::Grid);
        assert!(ui3.block.is_none());
        assert_eq!(fx, vec![UiEffect::DropBlock]);
    }

    #[test]
    fn tab_toggles_focus() {
        let ui = UiState::new("");
        assert_eq!(ui.focus, Focus::Source);
        let (ui2, _) = reduce(&ui, UiEvent::ToggleFocus);
        assert_eq!(ui2.focus, Focus::Scene);
        let (ui3, _) = reduce(&ui2, UiEvent::ToggleFocus);
        assert_eq!(ui3.focus, Focus::Source);
    }

    #[test]
    fn save_prefs_effect_closes_overlay() {
        let ui = UiState::new("");
        let (ui2, _) = reduce(&ui, UiEvent::OpenSettings);
        assert_eq!(ui2.overlay, ViewerOverlay::Settings);
        let (ui3, fx) = reduce(&ui2, UiEvent::SavePrefs);
        assert_eq!(ui3.overlay, ViewerOverlay::None);
        assert_eq!(fx, vec![UiEffect::SavePrefs]);
    }
}
