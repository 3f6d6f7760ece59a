// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Voxel grids: one colored cell per tensor element.
//!
//! Data is flattened row-major and cell `(i, j, k)` reads index
//! `i * cols * depths + j * depths + k`. Nothing in here fails; degenerate data
//! produces an empty or flat grid that still carries its label.

use std::collections::HashSet;

use glam::Vec3;
use kscope_trace::TensorEntry;
use serde_json::Value;
use tracing::{debug, warn};

use crate::color::Rgb;

/// How many cells a grid may declare per flattened value before its dims are
/// treated as mismatched.
pub const MAX_CELLS_PER_VALUE: usize = 4;

/// Grid extents derived from one to three valid dims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    /// First axis for rank 2 and 3; always 1 for rank 1.
    pub rows: usize,
    /// Second axis for rank 2 and 3; the only axis for rank 1.
    pub cols: usize,
    /// Third axis; 1 below rank 3.
    pub depths: usize,
}

impl GridShape {
    /// Map valid dims onto the grid axes; missing axes are 1.
    pub fn from_dims(dims: &[usize]) -> Self {
        let axis = |v: Option<&usize>| v.copied().unwrap_or(1).max(1);
        match dims {
            [] => Self::new(1, 1, 1),
            [c] => Self::new(1, (*c).max(1), 1),
            [r, c, rest @ ..] => Self::new((*r).max(1), (*c).max(1), axis(rest.first())),
        }
    }

    /// Explicit extents.
    pub const fn new(rows: usize, cols: usize, depths: usize) -> Self {
        Self { rows, cols, depths }
    }

    /// Number of cells, saturating at `usize::MAX`.
    pub const fn len(&self) -> usize {
        self.rows.saturating_mul(self.cols).saturating_mul(self.depths)
    }

    /// Number of cells, or `None` when the product overflows.
    pub const fn checked_len(&self) -> Option<usize> {
        match self.rows.checked_mul(self.cols) {
            Some(plane) => plane.checked_mul(self.depths),
            None => None,
        }
    }

    /// Always false; every axis is at least 1.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major flat index of `(i, j, k)`.
    pub const fn flat_index(&self, i: usize, j: usize, k: usize) -> usize {
        i * self.cols * self.depths + j * self.depths + k
    }

    /// Inverse of [`GridShape::flat_index`].
    pub const fn coords(&self, idx: usize) -> [usize; 3] {
        let plane = self.cols.saturating_mul(self.depths);
        [idx / plane, (idx % plane) / self.depths, idx % self.depths]
    }

    /// True when `(i, j, k)` lies inside the grid.
    pub const fn contains(&self, [i, j, k]: [usize; 3]) -> bool {
        i < self.rows && j < self.cols && k < self.depths
    }

    /// Local position of a cell, centered on the grid.
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, [i, j, k]: [usize; 3]) -> Vec3 {
        Vec3::new(
            j as f32 - self.cols as f32 / 2.0,
            -(i as f32) + self.rows as f32 / 2.0,
            k as f32 - self.depths as f32 / 2.0,
        )
    }
}

/// Flatten nested arrays depth-first into numeric leaves.
///
/// Numbers pass through, booleans become 0/1, and every other leaf (null,
/// strings, objects) becomes `None`. A non-array value yields an empty vector.
pub fn flatten(data: &Value) -> Vec<Option<f64>> {
    fn walk(v: &Value, out: &mut Vec<Option<f64>>) {
        match v {
            Value::Array(items) => items.iter().for_each(|item| walk(item, out)),
            Value::Number(n) => out.push(n.as_f64()),
            Value::Bool(b) => out.push(Some(if *b { 1.0 } else { 0.0 })),
            _ => out.push(None),
        }
    }
    let mut out = Vec::new();
    if data.is_array() {
        walk(data, &mut out);
    }
    out
}

/// Highlighted coordinates mapped onto grid axes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet(HashSet<[usize; 3]>);

impl HighlightSet {
    /// Map raw coordinate tuples for a tensor of the given rank.
    ///
    /// Tuples are truncated to `rank` and padded with 0; rank 1 addresses the
    /// column axis and rank 2 the row and column axes, matching
    /// [`GridShape::from_dims`]. Tuples with negative entries are ignored.
    pub fn from_coords(coords: &[Vec<i64>], rank: usize) -> Self {
        let mut set = HashSet::with_capacity(coords.len());
        for tuple in coords {
            let mut t = [0usize; 3];
            let mut ok = true;
            for (slot, raw) in t.iter_mut().zip(tuple.iter().take(rank.min(3))) {
                match usize::try_from(*raw) {
                    Ok(v) => *slot = v,
                    Err(_) => ok = false,
                }
            }
            if !ok {
                continue;
            }
            let mapped = match rank {
                0 | 1 => [0, t[0], 0],
                2 => [t[0], t[1], 0],
                _ => t,
            };
            set.insert(mapped);
        }
        Self(set)
    }

    /// True when `coord` is highlighted.
    pub fn contains(&self, coord: [usize; 3]) -> bool {
        self.0.contains(&coord)
    }

    /// Number of distinct highlighted cells.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One rendered tensor element.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelCell {
    /// `(i, j, k)` within the grid shape.
    pub coord: [usize; 3],
    /// Numeric value before coloring; `None` when missing or non-numeric.
    pub value: Option<f64>,
    /// Fill color.
    pub color: Rgb,
    /// Whether the cell is in the highlight set.
    pub highlighted: bool,
    /// Position relative to the grid origin.
    pub position: Vec3,
}

/// A voxelized tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    /// Variable name.
    pub name: String,
    /// Text shown above the grid.
    pub label: String,
    /// Grid extents.
    pub shape: GridShape,
    /// Variable base color.
    pub base_color: Rgb,
    /// Cells in row-major order (only the selected slice in slice mode).
    pub cells: Vec<VoxelCell>,
    /// Min/max over present values, if any.
    pub range: Option<(f64, f64)>,
    /// Selected depth slice, if slicing.
    pub slice: Option<usize>,
}

impl VoxelGrid {
    /// Cell at `coord`, if rendered.
    pub fn cell(&self, coord: [usize; 3]) -> Option<&VoxelCell> {
        if self.slice.is_none() && self.cells.len() == self.shape.len() {
            return self
                .shape
                .contains(coord)
                .then(|| &self.cells[self.shape.flat_index(coord[0], coord[1], coord[2])]);
        }
        self.cells.iter().find(|c| c.coord == coord)
    }

    /// True when no cells were produced.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Label anchor relative to the grid origin.
    #[allow(clippy::cast_precision_loss)]
    pub fn label_offset(&self) -> Vec3 {
        Vec3::new(0.0, self.shape.rows as f32 / 2.0 + 2.0, 0.0)
    }
}

/// Builder for one [`VoxelGrid`].
#[derive(Debug, Clone)]
pub struct VoxelGridBuilder<'a> {
    name: String,
    data: &'a Value,
    dims: Vec<usize>,
    base: Rgb,
    highlights: Option<&'a [Vec<i64>]>,
    slice: Option<usize>,
}

impl<'a> VoxelGridBuilder<'a> {
    /// Start a grid for `name` with the given data and valid dims.
    pub fn new(name: impl Into<String>, data: &'a Value, dims: &[usize], base: Rgb) -> Self {
        Self {
            name: name.into(),
            data,
            dims: dims.to_vec(),
            base,
            highlights: None,
            slice: None,
        }
    }

    /// Start from a classified tensor, carrying its highlight set.
    pub fn from_entry(entry: &'a TensorEntry, base: Rgb) -> Self {
        Self::new(entry.name.clone(), &entry.update.data, &entry.dims, base)
            .highlights(entry.update.highlighted_coords.as_deref())
    }

    /// Coordinates to render at full base color.
    pub fn highlights(mut self, coords: Option<&'a [Vec<i64>]>) -> Self {
        self.highlights = coords;
        self
    }

    /// Keep only one depth slice (ignored for grids with a single depth).
    pub fn slice(mut self, slice: Option<usize>) -> Self {
        self.slice = slice;
        self
    }

    /// Produce the grid.
    pub fn build(self) -> VoxelGrid {
        let shape = GridShape::from_dims(&self.dims);
        let slice = self
            .slice
            .filter(|_| shape.depths > 1)
            .map(|s| s.min(shape.depths - 1));
        let label = slice.map_or_else(
            || self.name.clone(),
            |s| format!("{} (Slice {}/{})", self.name, s + 1, shape.depths),
        );

        let flat = flatten(self.data);
        let range = value_range(&flat);
        let mut grid = VoxelGrid {
            name: self.name,
            label,
            shape,
            base_color: self.base,
            cells: Vec::new(),
            range,
            slice,
        };
        if flat.is_empty() {
            debug!(name = %grid.name, "tensor has no array data; rendering empty grid");
            return grid;
        }
        let fits = shape
            .checked_len()
            .is_some_and(|n| n <= flat.len().saturating_mul(MAX_CELLS_PER_VALUE));
        if !fits {
            warn!(
                name = %grid.name,
                dims = ?self.dims,
                values = flat.len(),
                "tensor dims do not match its data; rendering empty grid"
            );
            return grid;
        }

        let highlights = self
            .highlights
            .map(|c| HighlightSet::from_coords(c, self.dims.len()))
            .unwrap_or_default();

        grid.cells.reserve(slice.map_or(shape.len(), |_| shape.rows * shape.cols));
        for i in 0..shape.rows {
            for j in 0..shape.cols {
                for k in 0..shape.depths {
                    if slice.is_some_and(|s| s != k) {
                        continue;
                    }
                    let coord = [i, j, k];
                    let value = flat.get(shape.flat_index(i, j, k)).copied().flatten();
                    let highlighted = highlights.contains(coord);
                    let color = if highlighted {
                        self.base
                    } else {
                        self.base.mix_from_white(intensity(value.unwrap_or(0.0), range))
                    };
                    grid.cells.push(VoxelCell {
                        coord,
                        value,
                        color,
                        highlighted,
                        position: shape.position(coord),
                    });
                }
            }
        }
        grid
    }
}

fn value_range(flat: &[Option<f64>]) -> Option<(f64, f64)> {
    flat.iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Normalized intensity of `v` in `range`; 0.5 when the range is degenerate.
pub fn intensity(v: f64, range: Option<(f64, f64)>) -> f64 {
    match range {
        Some((lo, hi)) if hi > lo => ((v - lo) / (hi - lo)).clamp(0.0, 1.0),
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: Rgb = Rgb::new(0, 0, 255);

    #[test]
    fn shape_from_dims() {
        assert_eq!(GridShape::from_dims(&[4]), GridShape::new(1, 4, 1));
        assert_eq!(GridShape::from_dims(&[2, 3]), GridShape::new(2, 3, 1));
        assert_eq!(GridShape::from_dims(&[2, 3, 4]), GridShape::new(2, 3, 4));
    }

    #[test]
    fn flatten_handles_mixed_leaves() {
        let flat = flatten(&json!([[1, null], [true, "x"], [[2.5]]]));
        assert_eq!(flat, vec![Some(1.0), None, Some(1.0), None, Some(2.5)]);
        assert!(flatten(&json!(3)).is_empty());
    }

    #[test]
    fn intensity_ramp_and_degenerate_range() {
        let data = json!([0, 5, 10]);
        let grid = VoxelGridBuilder::new("t", &data, &[3], BASE).build();
        assert_eq!(grid.range, Some((0.0, 10.0)));
        assert_eq!(grid.cells[0].color, Rgb::WHITE);
        assert_eq!(grid.cells[2].color, BASE);
        assert_eq!(grid.cells[1].color, BASE.mix_from_white(0.5));

        let flat = json!([7, 7]);
        let grid = VoxelGridBuilder::new("c", &flat, &[2], BASE).build();
        assert!(grid.cells.iter().all(|c| c.color == BASE.mix_from_white(0.5)));
    }

    #[test]
    fn missing_values_keep_position_and_color_as_zero() {
        let data = json!([null, 4, 8]);
        let grid = VoxelGridBuilder::new("n", &data, &[3], BASE).build();
        assert_eq!(grid.cells.len(), 3);
        assert_eq!(grid.cells[0].value, None);
        assert_eq!(grid.range, Some((4.0, 8.0)));
        // 0 is below the range and clamps to white.
        assert_eq!(grid.cells[0].color, Rgb::WHITE);
    }

    #[test]
    fn highlights_override_intensity() {
        let data = json!([[0, 0], [0, 9]]);
        let coords = vec![vec![0, 1], vec![-1, 0]];
        let grid = VoxelGridBuilder::new("h", &data, &[2, 2], BASE)
            .highlights(Some(coords.as_slice()))
            .build();
        let hi = grid.cell([0, 1, 0]).unwrap();
        assert!(hi.highlighted);
        assert_eq!(hi.color, BASE);
        assert!(!grid.cell([0, 0, 0]).unwrap().highlighted);
        assert_eq!(grid.cells.iter().filter(|c| c.highlighted).count(), 1);
    }

    #[test]
    fn rank_one_highlight_maps_to_columns() {
        let set = HighlightSet::from_coords(&[vec![2, 9, 9]], 1);
        assert!(set.contains([0, 2, 0]));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn non_array_data_gives_labeled_empty_grid() {
        let data = json!("oops");
        let grid = VoxelGridBuilder::new("bad", &data, &[3], BASE).build();
        assert!(grid.is_empty());
        assert_eq!(grid.label, "bad");
        let empty = json!([]);
        assert!(VoxelGridBuilder::new("e", &empty, &[2], BASE).build().is_empty());
    }

    #[test]
    fn overflowing_dims_give_labeled_empty_grid() {
        let data = json!([1, 2, 3]);
        let dims = [1 << 40, 1 << 40, 1 << 20];
        assert_eq!(GridShape::from_dims(&dims).checked_len(), None);
        assert_eq!(GridShape::from_dims(&dims).len(), usize::MAX);
        let grid = VoxelGridBuilder::new("huge", &data, &dims, BASE).build();
        assert!(grid.is_empty());
        assert_eq!(grid.label, "huge");
        assert_eq!(grid.range, Some((1.0, 3.0)));
        assert_eq!(grid.cell([0, 0, 0]), None);
    }

    #[test]
    fn dims_far_larger_than_data_give_empty_grid() {
        let data = json!([1, 2]);
        let grid = VoxelGridBuilder::new("wide", &data, &[200_000, 200_000], BASE).build();
        assert!(grid.is_empty());
        assert_eq!(grid.label, "wide");
        assert_eq!(grid.shape, GridShape::new(200_000, 200_000, 1));

        // A few missing trailing values still render as a full grid.
        let short = json!([1, 2, 3]);
        let grid = VoxelGridBuilder::new("short", &short, &[2, 2], BASE).build();
        assert_eq!(grid.cells.len(), 4);
        assert_eq!(grid.cell([1, 1, 0]).map(|c| c.value), Some(None));
    }

    #[test]
    fn slice_mode_keeps_one_depth_and_labels_it() {
        let data = json!([[[1, 2, 3], [4, 5, 6]]]);
        let grid = VoxelGridBuilder::new("s", &data, &[1, 2, 3], BASE)
            .slice(Some(9))
            .build();
        assert_eq!(grid.slice, Some(2));
        assert_eq!(grid.label, "s (Slice 3/3)");
        let values: Vec<_> = grid.cells.iter().map(|c| c.value).collect();
        assert_eq!(values, [Some(3.0), Some(6.0)]);
        assert_eq!(grid.cell([0, 1, 2]).map(|c| c.value), Some(Some(6.0)));
    }

    #[test]
    fn slice_is_ignored_for_flat_grids() {
        let data = json!([1, 2]);
        let grid = VoxelGridBuilder::new("f", &data, &[2], BASE).slice(Some(0)).build();
        assert_eq!(grid.slice, None);
        assert_eq!(grid.label, "f");
    }

    #[test]
    fn positions_are_centered() {
        let shape = GridShape::new(2, 3, 1);
        assert_eq!(shape.position([0, 0, 0]), Vec3::new(-1.5, 1.0, -0.5));
        assert_eq!(shape.position([1, 2, 0]), Vec3::new(0.5, 0.0, -0.5));
    }
}
