// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewer runtime state (open block, cursor, snapshot, scene, camera, hover, prefs).
//!
//! Input is applied through the urgent lane of an [`UpdateQueue`]; snapshot
//! recomputation and hover publication go through the deferred lane and run
//! after input within a per-frame budget.

use std::collections::HashMap;
use std::time::Instant;

use glam::{Vec2, Vec3};
use kscope_app_core::prefs::{CameraPrefs, HudPrefs, ServerPrefs, ViewerPrefs};
use kscope_app_core::sched::UpdateQueue;
use kscope_client::BlockData;
use kscope_trace::{
    classify, BlockCatalog, BlockCoord, Classified, CursorNavigator, NavKey, ResolvedTrace,
};
use kscope_voxel::{
    CameraController, CameraInput, CameraPose, ColorAssigner, HoverInspector, HoverRecord,
    HoverTracker, Scene,
};
use tracing::{debug, info};

use crate::perf::PerfStats;

/// Deferred items run per frame once input is drained.
pub const DEFERRED_BUDGET: usize = 4;

/// Input-driven work; always applied in full before anything deferred.
#[derive(Debug, Clone, PartialEq)]
pub enum Urgent {
    Camera(CameraInput),
    Nav(NavKey),
    JumpTo(usize),
    SetSlice { name: String, slice: Option<usize> },
    FocusTensor(String),
    ResetView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredKey {
    Snapshot,
    Hover,
}

/// Background work; only the latest item per [`DeferredKey`] survives.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    Snapshot,
    Hover(Option<HoverRecord>),
}

pub struct OpenBlock {
    pub block: BlockCoord,
    pub trace: ResolvedTrace,
}

pub struct ViewerState {
    pub server_url: String,
    pub catalog: Option<BlockCatalog>,
    pub open: Option<OpenBlock>,
    pub navigator: CursorNavigator,
    pub snapshot: Classified,
    pub scene: Scene,
    pub colors: ColorAssigner,
    pub slices: HashMap<String, usize>,
    pub camera: CameraController,
    pub hover: HoverInspector,
    tracker: HoverTracker,
    queue: UpdateQueue<DeferredKey, Urgent, Deferred>,
    /// Pointer position in physical pixels, `None` when outside the window.
    pub pointer: Option<Vec2>,
    /// Left button held over the scene.
    pub drag_active: bool,
    pub perf: PerfStats,
    pub last_frame: Instant,
    pub show_labels: bool,
    pub show_outlines: bool,
    pub show_perf: bool,
    pub vsync: bool,
}

impl ViewerState {
    pub fn new(server_url: impl Into<String>, colors: ColorAssigner) -> Self {
        let hud = HudPrefs::default();
        Self {
            server_url: server_url.into(),
            catalog: None,
            open: None,
            navigator: CursorNavigator::new(),
            snapshot: Classified::default(),
            scene: Scene::default(),
            colors,
            slices: HashMap::new(),
            camera: CameraController::default(),
            hover: HoverInspector::new(),
            tracker: HoverTracker::new(),
            queue: UpdateQueue::new(),
            pointer: None,
            drag_active: false,
            perf: PerfStats::default(),
            last_frame: Instant::now(),
            show_labels: hud.show_labels,
            show_outlines: hud.show_outlines,
            show_perf: hud.show_perf,
            vsync: hud.vsync,
        }
    }

    pub fn enqueue(&mut self, work: Urgent) {
        self.queue.push_urgent(work);
    }

    /// Replace the open block; the cursor lands on its first interesting line.
    pub fn load_block(&mut self, data: BlockData) {
        let lines = data.interesting_lines();
        let cursor = self.navigator.load(lines);
        info!(
            block = %data.block,
            events = data.trace.trace().len(),
            unresolved = data.trace.unresolved_count(),
            ?cursor,
            "block opened"
        );
        self.slices.clear();
        self.hover.clear();
        self.tracker.reset();
        self.open = Some(OpenBlock {
            block: data.block,
            trace: data.trace,
        });
        self.queue.cancel_deferred(&DeferredKey::Hover);
        self.queue.push_deferred(DeferredKey::Snapshot, Deferred::Snapshot);
    }

    /// Tear down everything tied to the open block.
    pub fn clear_block(&mut self) {
        if let Some(open) = self.open.take() {
            debug!(block = %open.block, "block closed");
        }
        self.navigator.reset();
        self.snapshot = Classified::default();
        self.scene = Scene::default();
        self.slices.clear();
        self.hover.clear();
        self.tracker.reset();
        self.queue.cancel_deferred(&DeferredKey::Snapshot);
        self.queue.cancel_deferred(&DeferredKey::Hover);
    }

    pub fn open_block(&self) -> Option<BlockCoord> {
        self.open.as_ref().map(|o| o.block)
    }

    /// Cursor line used for replay; line 1 before anything is loaded.
    pub fn cursor_line(&self) -> usize {
        self.navigator.line().unwrap_or(1)
    }

    /// Queue the cell under the pointer for publication.
    pub fn pointer_hit(&mut self, hit: Option<HoverRecord>) {
        self.queue.push_deferred(DeferredKey::Hover, Deferred::Hover(hit));
    }

    /// Cell under `ndc` in the current scene.
    pub fn pick(&self, ndc: Vec2, aspect: f32) -> Option<HoverRecord> {
        let ray = self.camera.pick_ray(ndc, aspect);
        self.scene
            .pick(&ray)
            .and_then(|hit| self.scene.hover_record(hit))
    }

    /// Drain one frame of work. Returns `true` when anything visible changed.
    pub fn pump(&mut self, budget: usize) -> bool {
        let mut changed = false;
        for work in self.queue.take_urgent() {
            changed |= self.apply_urgent(work);
        }
        for work in self.queue.take_deferred(budget) {
            changed |= self.run_deferred(work);
        }
        changed
    }

    pub fn has_pending_work(&self) -> bool {
        !self.queue.is_idle()
    }

    fn apply_urgent(&mut self, work: Urgent) -> bool {
        match work {
            Urgent::Camera(input) => self.camera.handle(input),
            Urgent::Nav(key) => {
                let moved = self.navigator.handle(key);
                self.cursor_moved(moved)
            }
            Urgent::JumpTo(line) => {
                let moved = self.navigator.jump_to(line);
                self.cursor_moved(moved)
            }
            Urgent::SetSlice { name, slice } => {
                let prev = match slice {
                    Some(s) => self.slices.insert(name, s),
                    None => self.slices.remove(&name),
                };
                if prev != slice {
                    self.queue.push_deferred(DeferredKey::Snapshot, Deferred::Snapshot);
                }
                prev != slice
            }
            Urgent::FocusTensor(name) => match self.scene.focus_point(&name) {
                Some(target) => {
                    self.camera.focus_on(target);
                    true
                }
                None => false,
            },
            Urgent::ResetView => {
                self.camera.reset_view();
                true
            }
        }
    }

    fn cursor_moved(&mut self, moved: bool) -> bool {
        if moved {
            debug!(line = self.cursor_line(), "cursor moved");
            self.queue.push_deferred(DeferredKey::Snapshot, Deferred::Snapshot);
        }
        moved
    }

    fn run_deferred(&mut self, work: Deferred) -> bool {
        match work {
            Deferred::Snapshot => {
                self.recompute_snapshot();
                true
            }
            Deferred::Hover(hit) => {
                let transitions = self.tracker.update(hit);
                let changed = !transitions.is_empty();
                for t in transitions {
                    self.hover.apply(t);
                }
                changed
            }
        }
    }

    fn recompute_snapshot(&mut self) {
        let Some(open) = &self.open else {
            return;
        };
        let line = self.cursor_line();
        let state = open.trace.state_at(line);
        self.snapshot = classify(&state);
        self.scene = Scene::build(&self.snapshot, &mut self.colors, &self.slices);
        debug!(
            line,
            tensors = self.snapshot.tensors.len(),
            others = self.snapshot.others.len(),
            voxels = self.scene.cell_count(),
            "snapshot recomputed"
        );
    }

    pub fn apply_prefs(&mut self, prefs: &ViewerPrefs) {
        let cam = &prefs.camera;
        if cam.pos.iter().all(|p| p.is_finite()) && cam.yaw.is_finite() && cam.pitch.is_finite()
        {
            self.camera.set_pose(CameraPose {
                position: Vec3::from_array(cam.pos),
                yaw: cam.yaw,
                pitch: cam.pitch,
            });
        }
        let hud = &prefs.hud;
        self.show_labels = hud.show_labels;
        self.show_outlines = hud.show_outlines;
        self.show_perf = hud.show_perf;
        self.vsync = hud.vsync;
    }

    pub fn export_prefs(&self) -> ViewerPrefs {
        let pose = self.camera.pose();
        ViewerPrefs {
            server: ServerPrefs {
                base_url: self.server_url.clone(),
            },
            camera: CameraPrefs {
                pos: pose.position.to_array(),
                yaw: pose.yaw,
                pitch: pose.pitch,
            },
            hud: HudPrefs {
                show_labels: self.show_labels,
                show_outlines: self.show_outlines,
                show_perf: self.show_perf,
                vsync: self.vsync,
            },
            last_block: self.open_block().map(|b| [b.x, b.y, b.z]),
        }
    }
}
