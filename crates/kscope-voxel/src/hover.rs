// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pointer picking and the hovered-cell record.

use std::fmt;

use glam::Vec3;
use serde::Serialize;

/// A world-space ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    /// Build a ray, normalizing `dir`.
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    /// Point at distance `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Slab test against an axis-aligned cube of edge `size` centered on `center`.
///
/// Returns the entry distance, or `None` when the ray misses or the box is
/// behind the origin. A ray starting inside the box reports distance 0.
pub fn ray_box(ray: &Ray, center: Vec3, size: f32) -> Option<f32> {
    let half = Vec3::splat(size * 0.5);
    let min = center - half;
    let max = center + half;
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.dir[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t0, t1) = {
            let a = (min[axis] - o) * inv;
            let b = (max[axis] - o) * inv;
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }
    if t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

/// Nearest voxel under a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelHit {
    /// Index of the grid within the scene.
    pub grid: usize,
    /// Index of the cell within the grid's cell list.
    pub cell: usize,
    /// Distance along the ray.
    pub distance: f32,
}

/// What the hover tooltip shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverRecord {
    /// Variable name.
    pub var_name: String,
    /// `(i, j, k)` within the tensor.
    pub coord: [usize; 3],
    /// Cell value; `None` renders as `N/A`.
    pub value: Option<f64>,
}

impl fmt::Display for HoverRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [i, j, k] = self.coord;
        write!(f, "{} [{i}, {j}, {k}] = ", self.var_name)?;
        match self.value {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("N/A"),
        }
    }
}

/// Holds the currently published hover record.
///
/// `enter` always replaces the record; `leave` clears it only when it names
/// the same cell, so a late leave from a previous cell cannot erase a newer
/// enter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverInspector {
    current: Option<HoverRecord>,
}

impl HoverInspector {
    /// Inspector with nothing hovered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `record`.
    pub fn enter(&mut self, record: HoverRecord) {
        self.current = Some(record);
    }

    /// Clear if `record` is the one published. Returns `true` when cleared.
    pub fn leave(&mut self, record: &HoverRecord) -> bool {
        let same = self
            .current
            .as_ref()
            .is_some_and(|cur| cur.var_name == record.var_name && cur.coord == record.coord);
        if same {
            self.current = None;
        }
        same
    }

    /// Drop whatever is published (scene rebuilt, block changed).
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Published record.
    pub fn current(&self) -> Option<&HoverRecord> {
        self.current.as_ref()
    }

    /// Apply one transition.
    pub fn apply(&mut self, transition: HoverTransition) {
        match transition {
            HoverTransition::Enter(rec) => self.enter(rec),
            HoverTransition::Leave(rec) => {
                self.leave(&rec);
            }
        }
    }
}

/// Pointer enter/leave derived from successive pick results.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverTransition {
    /// Pointer moved onto a cell.
    Enter(HoverRecord),
    /// Pointer moved off a cell.
    Leave(HoverRecord),
}

/// Turns per-frame pick results into enter/leave events.
#[derive(Debug, Clone, Default)]
pub struct HoverTracker {
    last: Option<HoverRecord>,
}

impl HoverTracker {
    /// Tracker with nothing under the pointer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the cell under the pointer this frame.
    ///
    /// Moving between cells yields `Leave(old)` followed by `Enter(new)`.
    pub fn update(&mut self, hit: Option<HoverRecord>) -> Vec<HoverTransition> {
        let same_cell = match (&self.last, &hit) {
            (Some(a), Some(b)) => a.var_name == b.var_name && a.coord == b.coord,
            (None, None) => true,
            _ => false,
        };
        if same_cell {
            // Value may change under a stationary pointer after a replay.
            if let (Some(last), Some(now)) = (&self.last, &hit) {
                if last.value != now.value {
                    self.last = hit.clone();
                    return hit.map(HoverTransition::Enter).into_iter().collect();
                }
            }
            return Vec::new();
        }
        let mut out = Vec::with_capacity(2);
        if let Some(old) = self.last.take() {
            out.push(HoverTransition::Leave(old));
        }
        if let Some(new) = hit.clone() {
            out.push(HoverTransition::Enter(new));
        }
        self.last = hit;
        out
    }

    /// Forget the last cell without emitting a leave.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, i: usize, value: Option<f64>) -> HoverRecord {
        HoverRecord {
            var_name: name.into(),
            coord: [i, 0, 0],
            value,
        }
    }

    #[test]
    fn ray_hits_box_in_front() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        let t = ray_box(&ray, Vec3::ZERO, 0.9).unwrap();
        assert!((t - 9.55).abs() < 1e-4);
    }

    #[test]
    fn ray_misses_offset_and_behind() {
        let ray = Ray::new(Vec3::new(2.0, 0.0, 10.0), -Vec3::Z);
        assert!(ray_box(&ray, Vec3::ZERO, 0.9).is_none());
        let away = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(ray_box(&away, Vec3::ZERO, 0.9).is_none());
    }

    #[test]
    fn display_uses_na_for_missing() {
        assert_eq!(rec("t", 1, None).to_string(), "t [1, 0, 0] = N/A");
        assert_eq!(rec("t", 0, Some(2.5)).to_string(), "t [0, 0, 0] = 2.5");
    }

    #[test]
    fn stale_leave_does_not_clear_newer_enter() {
        let mut hover = HoverInspector::new();
        hover.enter(rec("a", 0, Some(1.0)));
        hover.enter(rec("a", 1, Some(2.0)));
        assert!(!hover.leave(&rec("a", 0, Some(1.0))));
        assert_eq!(hover.current().map(|r| r.coord), Some([1, 0, 0]));
        assert!(hover.leave(&rec("a", 1, Some(2.0))));
        assert!(hover.current().is_none());
    }

    #[test]
    fn tracker_emits_leave_then_enter() {
        let mut tracker = HoverTracker::new();
        assert_eq!(
            tracker.update(Some(rec("a", 0, None))),
            vec![HoverTransition::Enter(rec("a", 0, None))]
        );
        assert!(tracker.update(Some(rec("a", 0, None))).is_empty());
        assert_eq!(
            tracker.update(Some(rec("a", 1, None))),
            vec![
                HoverTransition::Leave(rec("a", 0, None)),
                HoverTransition::Enter(rec("a", 1, None)),
            ]
        );
        assert_eq!(
            tracker.update(None),
            vec![HoverTransition::Leave(rec("a", 1, None))]
        );
        assert!(tracker.update(None).is_empty());
    }

    #[test]
    fn tracker_republishes_changed_value() {
        let mut tracker = HoverTracker::new();
        tracker.update(Some(rec("a", 0, Some(1.0))));
        assert_eq!(
            tracker.update(Some(rec("a", 0, Some(4.0)))),
            vec![HoverTransition::Enter(rec("a", 0, Some(4.0)))]
        );
    }
}
