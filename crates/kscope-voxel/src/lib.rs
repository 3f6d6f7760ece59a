// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tensor voxelization and interaction for KernelScope.
//!
//! Classified tensors from `kscope-trace` become [`VoxelGrid`]s, which a
//! [`Scene`] places side by side. The camera and hover modules are pure state:
//! the viewer feeds them input and reads back poses and hover records, so all
//! of it is testable without a window.

pub mod camera;
pub mod color;
pub mod hover;
pub mod scene;
pub mod voxel;

pub use camera::{CameraController, CameraInput, CameraKey, CameraPose};
pub use color::{hsl_to_rgb, ColorAssigner, Rgb};
pub use hover::{
    ray_box, HoverInspector, HoverRecord, HoverTracker, HoverTransition, Ray, VoxelHit,
};
pub use scene::{tensor_offset, PlacedGrid, Scene, VoxelInstance, TENSOR_SPACING, VOXEL_SIZE};
pub use voxel::{flatten, GridShape, HighlightSet, VoxelCell, VoxelGrid, VoxelGridBuilder};
