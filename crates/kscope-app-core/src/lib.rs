// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for KernelScope tools (config, prefs, toasts,
//! frame scheduling). Keeps UI adapters thin and framework-agnostic.

pub mod config;
pub mod config_port;
pub mod prefs;
pub mod render_port;
pub mod sched;
pub mod toast;
