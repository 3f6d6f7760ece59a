// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Redraw requests without a windowing dependency.

/// Minimal redraw port; implementations forward to the window's
/// `request_redraw`.
pub trait RenderPort {
    /// Ask for another frame.
    fn request_redraw(&self);
}
