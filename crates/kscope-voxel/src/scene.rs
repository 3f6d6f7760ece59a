// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene layout: every tensor of a snapshot placed side by side along X.

use std::collections::HashMap;

use glam::Vec3;
use kscope_trace::Classified;
use tracing::debug;

use crate::color::{ColorAssigner, Rgb};
use crate::hover::{ray_box, HoverRecord, Ray, VoxelHit};
use crate::voxel::{VoxelCell, VoxelGrid, VoxelGridBuilder};

/// Distance between neighbouring tensor origins.
pub const TENSOR_SPACING: f32 = 50.0;
/// Rendered edge length of one voxel.
pub const VOXEL_SIZE: f32 = 0.9;

/// X offset of tensor `index` out of `count`, centering the row on the origin.
#[allow(clippy::cast_precision_loss)]
pub fn tensor_offset(index: usize, count: usize) -> f32 {
    let n = count.max(1) as f32;
    (index as f32).mul_add(TENSOR_SPACING, -(n - 1.0) * TENSOR_SPACING / 2.0)
}

/// A grid and where it sits.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGrid {
    /// The voxelized tensor.
    pub grid: VoxelGrid,
    /// World-space origin of the grid.
    pub origin: Vec3,
}

impl PlacedGrid {
    /// World position of the label.
    pub fn label_position(&self) -> Vec3 {
        self.origin + self.grid.label_offset()
    }

    /// World position of a cell center.
    pub fn cell_position(&self, cell: &VoxelCell) -> Vec3 {
        self.origin + cell.position
    }
}

/// One voxel ready for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelInstance {
    /// World-space center.
    pub center: Vec3,
    /// Fill color.
    pub color: Rgb,
    /// Outline color (yellow when hovered).
    pub outline: Rgb,
    /// In the highlight set.
    pub highlighted: bool,
}

/// All tensors of one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    grids: Vec<PlacedGrid>,
}

impl Scene {
    /// Lay out the tensors of `classified`.
    ///
    /// `slices` selects a depth slice per variable name; names absent from the
    /// map render every depth.
    pub fn build(
        classified: &Classified,
        colors: &mut ColorAssigner,
        slices: &HashMap<String, usize>,
    ) -> Self {
        let count = classified.tensors.len();
        let grids = classified
            .tensors
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let base = colors.color_for(&entry.name);
                let grid = VoxelGridBuilder::from_entry(entry, base)
                    .slice(slices.get(&entry.name).copied())
                    .build();
                PlacedGrid {
                    grid,
                    origin: Vec3::new(tensor_offset(idx, count), 0.0, 0.0),
                }
            })
            .collect::<Vec<_>>();
        debug!(
            tensors = grids.len(),
            cells = grids.iter().map(|g| g.grid.cells.len()).sum::<usize>(),
            "scene rebuilt"
        );
        Self { grids }
    }

    /// Placed grids in layout order.
    pub fn grids(&self) -> &[PlacedGrid] {
        &self.grids
    }

    /// Grid for `name`.
    pub fn grid(&self, name: &str) -> Option<&PlacedGrid> {
        self.grids.iter().find(|g| g.grid.name == name)
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Total rendered voxels.
    pub fn cell_count(&self) -> usize {
        self.grids.iter().map(|g| g.grid.cells.len()).sum()
    }

    /// Where the camera should aim to inspect `name`.
    pub fn focus_point(&self, name: &str) -> Option<Vec3> {
        self.grid(name).map(|g| g.origin)
    }

    /// Nearest voxel along `ray`.
    pub fn pick(&self, ray: &Ray) -> Option<VoxelHit> {
        let mut best: Option<VoxelHit> = None;
        for (gi, placed) in self.grids.iter().enumerate() {
            for (ci, cell) in placed.grid.cells.iter().enumerate() {
                let Some(t) = ray_box(ray, placed.cell_position(cell), VOXEL_SIZE) else {
                    continue;
                };
                if best.is_none_or(|b| t < b.distance) {
                    best = Some(VoxelHit {
                        grid: gi,
                        cell: ci,
                        distance: t,
                    });
                }
            }
        }
        best
    }

    /// Hover record for a pick result.
    pub fn hover_record(&self, hit: VoxelHit) -> Option<HoverRecord> {
        let placed = self.grids.get(hit.grid)?;
        let cell = placed.grid.cells.get(hit.cell)?;
        Some(HoverRecord {
            var_name: placed.grid.name.clone(),
            coord: cell.coord,
            value: cell.value,
        })
    }

    /// Flattened instances; the cell matching `hovered` gets the hover outline.
    pub fn instances(&self, hovered: Option<&HoverRecord>) -> Vec<VoxelInstance> {
        let mut out = Vec::with_capacity(self.cell_count());
        for placed in &self.grids {
            let hovered_here = hovered
                .filter(|h| h.var_name == placed.grid.name)
                .map(|h| h.coord);
            for cell in &placed.grid.cells {
                let is_hovered = hovered_here == Some(cell.coord);
                out.push(VoxelInstance {
                    center: placed.cell_position(cell),
                    color: cell.color,
                    outline: if is_hovered {
                        Rgb::HOVER_OUTLINE
                    } else {
                        Rgb::BLACK
                    },
                    highlighted: cell.highlighted,
                });
            }
        }
        out
    }
}
