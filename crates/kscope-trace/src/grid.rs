// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Block catalog: which `(x, y, z)` program instances have recorded traces.
//!
//! The catalog comes from `GET /api/data`, keyed `"<x>_<y>_<z>"`. The selection
//! grid shows every coordinate up to the per-axis maximum; coordinates without a
//! catalog entry appear as placeholders.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::TraceError;

/// One program instance in the launch grid.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockCoord {
    /// X index.
    pub x: u32,
    /// Y index.
    pub y: u32,
    /// Z index.
    pub z: u32,
}

impl BlockCoord {
    /// Construct a coordinate.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Parse a catalog key such as `"1_0_2"`.
    pub fn from_key(key: &str) -> Result<Self, TraceError> {
        parse_triplet(key, '_')
    }

    /// Catalog key form, `"x_y_z"`.
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.x, self.y, self.z)
    }
}

fn parse_triplet(raw: &str, sep: char) -> Result<BlockCoord, TraceError> {
    let bad = || TraceError::InvalidBlock(raw.to_owned());
    let mut parts = raw.trim().split(sep).map(|p| p.trim().parse::<u32>());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Ok(BlockCoord { x, y, z }),
        _ => Err(bad()),
    }
}

impl fmt::Display for BlockCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for BlockCoord {
    type Err = TraceError;

    /// Parses the `"x,y,z"` form used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_triplet(s, ',')
    }
}

/// Per-axis filter; `-1` (or any negative value) shows every value on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisFilter(pub [i64; 3]);

impl Default for AxisFilter {
    fn default() -> Self {
        Self::ALL
    }
}

impl AxisFilter {
    /// No filtering on any axis.
    pub const ALL: Self = Self([-1, -1, -1]);

    /// Build from optional per-axis values.
    pub fn from_options(x: Option<u32>, y: Option<u32>, z: Option<u32>) -> Self {
        let axis = |v: Option<u32>| v.map_or(-1, i64::from);
        Self([axis(x), axis(y), axis(z)])
    }

    fn admits(self, axis: usize, value: u32) -> bool {
        let want = self.0[axis];
        want < 0 || want == i64::from(value)
    }

    /// True when `coord` passes every axis.
    pub fn matches(self, coord: BlockCoord) -> bool {
        self.admits(0, coord.x) && self.admits(1, coord.y) && self.admits(2, coord.z)
    }
}

/// One cell of the selection grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSlot {
    /// Grid coordinate.
    pub coord: BlockCoord,
    /// Recorded operation count, or `None` for a placeholder.
    pub ops: Option<usize>,
}

/// Blocks with recorded traces and their operation counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockCatalog {
    blocks: BTreeMap<BlockCoord, usize>,
}

impl BlockCatalog {
    /// Decode a `/api/data` body.
    ///
    /// Fails only when `ops.visualization_data` is missing; malformed keys are
    /// skipped with a warning.
    pub fn from_json(body: &Value) -> Result<Self, TraceError> {
        let data = body
            .get("ops")
            .and_then(|ops| ops.get("visualization_data"))
            .and_then(Value::as_object)
            .ok_or(TraceError::MissingCatalog)?;

        let mut blocks = BTreeMap::new();
        for (key, ops) in data {
            match BlockCoord::from_key(key) {
                Ok(coord) => {
                    let count = ops.as_array().map_or(0, Vec::len);
                    blocks.insert(coord, count);
                }
                Err(err) => warn!(%key, error = %err, "skipping malformed block key"),
            }
        }
        Ok(Self { blocks })
    }

    /// Insert or replace one block.
    pub fn insert(&mut self, coord: BlockCoord, ops: usize) {
        self.blocks.insert(coord, ops);
    }

    /// Operation count for `coord`, if recorded.
    pub fn ops(&self, coord: BlockCoord) -> Option<usize> {
        self.blocks.get(&coord).copied()
    }

    /// Recorded blocks in coordinate order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockCoord, usize)> + '_ {
        self.blocks.iter().map(|(c, n)| (*c, *n))
    }

    /// Number of recorded blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Per-axis maximum over recorded blocks; `[0, 0, 0]` when empty.
    pub fn extents(&self) -> [u32; 3] {
        self.blocks.keys().fold([0, 0, 0], |[mx, my, mz], c| {
            [mx.max(c.x), my.max(c.y), mz.max(c.z)]
        })
    }

    /// Every grid coordinate up to [`BlockCatalog::extents`] that passes
    /// `filter`, enumerated z-major then y then x.
    pub fn visible_blocks(&self, filter: AxisFilter) -> Vec<GridSlot> {
        if self.is_empty() {
            return Vec::new();
        }
        let [mx, my, mz] = self.extents();
        let mut out = Vec::new();
        for z in 0..=mz {
            for y in 0..=my {
                for x in 0..=mx {
                    let coord = BlockCoord::new(x, y, z);
                    if filter.matches(coord) {
                        out.push(GridSlot {
                            coord,
                            ops: self.ops(coord),
                        });
                    }
                }
            }
        }
        out
    }
}
