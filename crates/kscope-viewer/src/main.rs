// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! kscope-viewer: step through kernel traces and inspect tensors as voxel grids.
//! Main parses flags, installs logging and wires App into winit.

use anyhow::{Context, Result};
use clap::Parser;
use egui_winit::winit::event_loop::EventLoop;
use kscope_trace::BlockCoord;
use tracing_subscriber::EnvFilter;

mod app;
mod app_events;
mod app_frame;
mod core;
mod gpu;
mod input;
mod perf;
mod ports;
mod render;
mod render_port;
mod ui;
mod ui_effects;
mod ui_state;
mod viewer_state;
mod viewport;

/// Command-line overrides; anything omitted falls back to saved prefs.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Trace server base URL.
    #[arg(long, env = "KSCOPE_SERVER")]
    pub server: Option<String>,
    /// Open this block on startup, as `x,y,z`.
    #[arg(long)]
    pub block: Option<BlockCoord>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();
    let args = Args::parse();
    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut app = app::App::new(&args)?;
    event_loop.run_app(&mut app).context("running event loop")?;
    Ok(())
}
