// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-variable base colors and value-to-color interpolation.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Pure white; the zero-intensity end of every ramp.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Voxel outline when not hovered.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Voxel outline when hovered.
    pub const HOVER_OUTLINE: Self = Self::new(255, 255, 0);

    /// Construct from components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Interpolate from white (`intensity == 0`) to `self` (`intensity == 1`).
    ///
    /// Each channel is `255 - (255 - base) * intensity`; `intensity` is clamped.
    #[must_use]
    pub fn mix_from_white(self, intensity: f64) -> Self {
        let t = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let ch = |base: u8| to_u8(255.0 - (255.0 - f64::from(base)) * t);
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    /// Linear `[0, 1]` components for GPU upload.
    pub fn to_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    /// `#rrggbb` form.
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };
    if t < 1.0 / 6.0 {
        (q - p).mul_add(6.0 * t, p)
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        (q - p).mul_add((2.0 / 3.0 - t) * 6.0, p)
    } else {
        p
    }
}

/// Convert HSL (all components in `[0, 1]`) to 8-bit RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    if s <= 0.0 {
        let v = to_u8(l * 255.0);
        return Rgb::new(v, v, v);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0f64.mul_add(l, -q);
    Rgb::new(
        to_u8(hue_to_channel(p, q, h + 1.0 / 3.0) * 255.0),
        to_u8(hue_to_channel(p, q, h) * 255.0),
        to_u8(hue_to_channel(p, q, h - 1.0 / 3.0) * 255.0),
    )
}

/// Session-scoped memo of variable name to base color.
///
/// The first request for a name draws a random hue with saturation in
/// `[0.7, 1.0]` and lightness in `[0.4, 0.6]`; later requests return the same
/// color. Entries are never evicted, so the cache grows with the number of
/// distinct variable names seen in a session.
#[derive(Debug)]
pub struct ColorAssigner {
    cache: HashMap<String, Rgb>,
    rng: StdRng,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorAssigner {
    /// Assigner seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic assigner for tests and reproducible screenshots.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            cache: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Base color for `name`, drawing one on first use.
    pub fn color_for(&mut self, name: &str) -> Rgb {
        if let Some(c) = self.cache.get(name) {
            return *c;
        }
        let hue = self.rng.gen::<f64>();
        let sat = self.rng.gen_range(0.7..=1.0);
        let light = self.rng.gen_range(0.4..=0.6);
        let color = hsl_to_rgb(hue, sat, light);
        self.cache.insert(name.to_owned(), color);
        color
    }

    /// Previously assigned color, without drawing.
    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.cache.get(name).copied()
    }

    /// Number of assigned names.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when nothing has been assigned.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(0.3, 0.0, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn mix_endpoints() {
        let base = Rgb::new(200, 40, 0);
        assert_eq!(base.mix_from_white(0.0), Rgb::WHITE);
        assert_eq!(base.mix_from_white(1.0), base);
        assert_eq!(base.mix_from_white(0.5), Rgb::new(228, 148, 128));
        assert_eq!(base.mix_from_white(7.0), base);
    }

    #[test]
    fn same_name_same_color() {
        let mut colors = ColorAssigner::with_seed(7);
        let a = colors.color_for("acc");
        let _ = colors.color_for("x");
        assert_eq!(colors.color_for("acc"), a);
        assert_eq!(colors.get("acc"), Some(a));
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn seeded_assigners_agree() {
        let mut a = ColorAssigner::with_seed(42);
        let mut b = ColorAssigner::with_seed(42);
        for name in ["p", "q", "r"] {
            assert_eq!(a.color_for(name), b.color_for(name));
        }
    }

    #[test]
    fn drawn_colors_are_saturated() {
        let mut colors = ColorAssigner::with_seed(1);
        for i in 0..64 {
            let c = colors.color_for(&format!("v{i}"));
            let max = c.r.max(c.g).max(c.b);
            let min = c.r.min(c.g).min(c.b);
            // s >= 0.7 and l in [0.4, 0.6] keep the channel spread wide.
            assert!(max - min >= 100, "{c:?}");
        }
    }
}
