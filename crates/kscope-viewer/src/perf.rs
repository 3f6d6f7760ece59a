// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tiny rolling frame time tracker.

use std::collections::VecDeque;

const MAX_SAMPLES: usize = 240;

#[derive(Clone, Debug)]
pub struct PerfStats {
    frame_ms: VecDeque<f32>,
}

impl Default for PerfStats {
    fn default() -> Self {
        Self {
            frame_ms: VecDeque::with_capacity(MAX_SAMPLES),
        }
    }
}

impl PerfStats {
    pub fn push(&mut self, frame: f32) {
        if self.frame_ms.len() == MAX_SAMPLES {
            self.frame_ms.pop_front();
        }
        self.frame_ms.push_back(frame);
    }

    pub fn fps(&self) -> f32 {
        self.frame_ms
            .back()
            .filter(|ms| **ms > 0.0)
            .map_or(0.0, |ms| 1000.0 / ms)
    }

    /// Mean frame time over the window.
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_ms(&self) -> f32 {
        if self.frame_ms.is_empty() {
            return 0.0;
        }
        self.frame_ms.iter().sum::<f32>() / self.frame_ms.len() as f32
    }
}
