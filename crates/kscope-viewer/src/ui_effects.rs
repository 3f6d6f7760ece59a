// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Effect runner for UiEffect -> concrete ports; includes a simple fake for tests.

use kscope_app_core::config_port::ConfigPort;
use tracing::info;

use crate::ports::BlockPort;
use crate::ui_state::{UiEffect, UiEvent};
use crate::viewer_state::ViewerState;

pub trait UiEffectsRunner {
    /// Run effects, possibly emitting follow-up events.
    fn run(
        &mut self,
        effects: Vec<UiEffect>,
        blocks: &mut dyn BlockPort,
        config: Option<&dyn ConfigPort>,
        viewer: &mut ViewerState,
    ) -> Vec<UiEvent>;
}

pub struct RealEffectsRunner;

impl UiEffectsRunner for RealEffectsRunner {
    fn run(
        &mut self,
        effects: Vec<UiEffect>,
        blocks: &mut dyn BlockPort,
        config: Option<&dyn ConfigPort>,
        viewer: &mut ViewerState,
    ) -> Vec<UiEvent> {
        let mut followups = Vec::new();
        for eff in effects {
            match eff {
                UiEffect::FetchBlock(block) => {
                    // The old block's scene goes away as soon as its scope ends.
                    viewer.clear_block();
                    blocks.select_block(block);
                }
                UiEffect::DropBlock => {
                    viewer.clear_block();
                    blocks.deselect();
                }
                UiEffect::FetchCatalog => blocks.request_catalog(),
                UiEffect::SavePrefs => {
                    if let Some(cfg) = config {
                        cfg.save_prefs(&viewer.export_prefs());
                        info!("viewer prefs saved");
                    }
                }
                UiEffect::QuitApp => followups.push(UiEvent::ShutdownRequested),
            }
        }
        followups
    }
}

/// Test fake: records effects without touching any port.
#[cfg(test)]
#[derive(Default)]
pub struct FakeEffectsRunner {
    pub calls: Vec<UiEffect>,
}

#[cfg(test)]
impl UiEffectsRunner for FakeEffectsRunner {
    fn run(
        &mut self,
        effects: Vec<UiEffect>,
        _blocks: &mut dyn BlockPort,
        _config: Option<&dyn ConfigPort>,
        _viewer: &mut ViewerState,
    ) -> Vec<UiEvent> {
        let mut followups = Vec::new();
        for eff in effects {
            if eff == UiEffect::QuitApp {
                followups.push(UiEvent::ShutdownRequested);
            }
            self.calls.push(eff);
        }
        followups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UiState;
    use crate::ui_state::reduce;
    use kscope_app_core::config::{ConfigService, MemoryConfigStore};
    use kscope_client::SessionUpdate;
    use kscope_trace::BlockCoord;
    use kscope_voxel::ColorAssigner;

    #[derive(Default)]
    struct RecordingPort {
        selected: Vec<BlockCoord>,
        deselects: usize,
        catalogs: usize,
    }

    impl BlockPort for RecordingPort {
        fn select_block(&mut self, block: BlockCoord) {
            self.selected.push(block);
        }
        fn deselect(&mut self) {
            self.deselects += 1;
        }
        fn request_catalog(&mut self) {
            self.catalogs += 1;
        }
        fn drain_updates(&mut self, _max: usize) -> Vec<SessionUpdate> {
            Vec::new()
        }
    }

    fn viewer() -> ViewerState {
        ViewerState::new("http://localhost:5000", ColorAssigner::with_seed(1))
    }

    #[test]
    fn real_runner_drives_block_port() {
        let mut port = RecordingPort::default();
        let mut v = viewer();
        let block = BlockCoord::new(3, 1, 0);
        let (ui, fx) = reduce(&UiState::new(""), UiEvent::SelectBlock(block));
        RealEffectsRunner.run(fx, &mut port, None, &mut v);
        let (_, fx) = reduce(&ui, UiEvent::BackToGrid);
        RealEffectsRunner.run(fx, &mut port, None, &mut v);
        assert_eq!(port.selected, vec![block]);
        assert_eq!(port.deselects, 1);
    }

    #[test]
    fn save_prefs_writes_through_config_port() {
        let svc = ConfigService::new(MemoryConfigStore::new());
        let mut port = RecordingPort::default();
        let mut v = viewer();
        v.show_perf = true;
        let cfg: &dyn ConfigPort = &svc;
        RealEffectsRunner.run(vec![UiEffect::SavePrefs], &mut port, Some(cfg), &mut v);
        let saved = svc.load_prefs().unwrap();
        assert!(saved.hud.show_perf);
    }

    #[test]
    fn quit_becomes_shutdown_followup() {
        let mut fake = FakeEffectsRunner::default();
        let mut port = RecordingPort::default();
        let mut v = viewer();
        let (_, fx) = reduce(&UiState::new(""), UiEvent::ExitClicked);
        let followups = fake.run(fx, &mut port, None, &mut v);
        assert_eq!(followups, vec![UiEvent::ShutdownRequested]);
        assert_eq!(fake.calls, vec![UiEffect::QuitApp]);
        assert_eq!(port.catalogs, 0);
    }
}
