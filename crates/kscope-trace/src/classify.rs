// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Split a variable snapshot into voxel-renderable tensors and everything else.

use crate::event::VariableUpdate;
use crate::replay::VariableState;

/// True when `dims` describe a renderable tensor: one to three positive axes.
pub fn is_tensor_shape(dims: &[i64]) -> bool {
    let valid = dims.iter().filter(|&&d| d > 0).count();
    (1..=3).contains(&valid)
}

/// A variable rendered as a voxel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorEntry {
    /// Variable name.
    pub name: String,
    /// Update as of the cursor.
    pub update: VariableUpdate,
    /// Positive dims, one to three entries.
    pub dims: Vec<usize>,
}

/// A variable rendered as text.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherEntry {
    /// Variable name.
    pub name: String,
    /// Update as of the cursor.
    pub update: VariableUpdate,
}

/// Snapshot partitioned by renderability; both lists are sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    /// Entries with one to three valid dims.
    pub tensors: Vec<TensorEntry>,
    /// Scalars and anything of rank zero or above three.
    pub others: Vec<OtherEntry>,
}

impl Classified {
    /// Look up a tensor by name.
    pub fn tensor(&self, name: &str) -> Option<&TensorEntry> {
        self.tensors.iter().find(|t| t.name == name)
    }

    /// True when the snapshot was empty.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty() && self.others.is_empty()
    }
}

/// Partition `state` into tensor and other entries.
pub fn classify(state: &VariableState) -> Classified {
    let mut out = Classified::default();
    for (name, update) in state {
        if is_tensor_shape(&update.dims) {
            out.tensors.push(TensorEntry {
                name: name.clone(),
                dims: update.valid_dims(),
                update: update.clone(),
            });
        } else {
            out.others.push(OtherEntry {
                name: name.clone(),
                update: update.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn negative_and_zero_axes_are_ignored() {
        assert!(is_tensor_shape(&[-1, 4, 0]));
        assert!(!is_tensor_shape(&[-1, -1, -1]));
        assert!(!is_tensor_shape(&[]));
    }

    #[test]
    fn classify_sorts_by_name_and_keeps_valid_dims() {
        let mut state = VariableState::new();
        state.insert("z".into(), VariableUpdate::tensor(json!([1, 2]), vec![2, -1, -1]));
        state.insert("a".into(), VariableUpdate::scalar(3));
        state.insert("m".into(), VariableUpdate::tensor(json!([[1], [2]]), vec![2, 1]));
        let c = classify(&state);
        let names: Vec<_> = c.tensors.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["m", "z"]);
        assert_eq!(c.tensor("z").map(|t| t.dims.clone()), Some(vec![2]));
        assert_eq!(c.others.len(), 1);
        assert_eq!(c.others[0].name, "a");
    }
}
