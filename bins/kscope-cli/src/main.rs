// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! KernelScope CLI
//!
//! Lists traced blocks and replays a block's variable state at a source line,
//! using the same transport and replay code as the viewer.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use kscope_app_core::prefs::DEFAULT_SERVER;
use kscope_client::{load_block, load_catalog, HttpBackend};
use kscope_trace::{classify, AxisFilter, BlockCatalog, BlockCoord, ResolvedTrace};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Trace server base URL
    #[clap(long, env = "KSCOPE_SERVER", default_value = DEFAULT_SERVER)]
    server: String,
    /// Command to execute
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// List blocks that have a recorded trace
    Blocks {
        /// Only blocks with this x
        #[clap(long)]
        x: Option<u32>,
        /// Only blocks with this y
        #[clap(long)]
        y: Option<u32>,
        /// Only blocks with this z
        #[clap(long)]
        z: Option<u32>,
    },
    /// Print the lines a block's trace touches
    Lines {
        /// Block as `x,y,z`
        #[clap(long)]
        block: BlockCoord,
    },
    /// Replay a block up to a source line and print every variable
    State {
        /// Block as `x,y,z`
        #[clap(long)]
        block: BlockCoord,
        /// 1-based source line
        #[clap(long)]
        line: usize,
        /// Emit the raw snapshot as JSON
        #[clap(long)]
        json: bool,
    },
}

fn write_blocks(out: &mut impl Write, catalog: &BlockCatalog, filter: AxisFilter) -> io::Result<()> {
    let mut shown = 0usize;
    for (coord, ops) in catalog.blocks().filter(|(c, _)| filter.matches(*c)) {
        writeln!(out, "{coord}\t{ops} ops")?;
        shown += 1;
    }
    if shown == 0 {
        writeln!(out, "no traced blocks")?;
    }
    Ok(())
}

fn write_lines(out: &mut impl Write, trace: &ResolvedTrace) -> io::Result<()> {
    let source = trace.source();
    for &line in trace.interesting_lines().as_slice() {
        writeln!(out, "{line:>5}  {}", source.line(line).unwrap_or_default())?;
    }
    Ok(())
}

fn write_state(out: &mut impl Write, trace: &ResolvedTrace, line: usize) -> io::Result<()> {
    let snapshot = classify(&trace.state_at(line));
    if snapshot.is_empty() {
        return writeln!(out, "no variables recorded at or before line {line}");
    }
    for t in &snapshot.tensors {
        let shape: Vec<String> = t.dims.iter().map(ToString::to_string).collect();
        writeln!(out, "{} [{}]", t.name, shape.join("x"))?;
    }
    for o in &snapshot.others {
        writeln!(out, "{} = {}", o.name, o.update.data)?;
    }
    Ok(())
}

fn check_line(trace: &ResolvedTrace, line: usize) -> Result<()> {
    let len = trace.source().len();
    if line == 0 || line > len {
        bail!("line {line} is outside the kernel source (1..={len})");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    debug!(server = %args.server, "kscope-cli starting");
    let backend = HttpBackend::new(args.server.clone())
        .with_context(|| format!("building HTTP client for {}", args.server))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.cmd {
        Command::Blocks { x, y, z } => {
            let catalog = load_catalog(&backend)
                .await
                .context("fetching block catalog")?;
            write_blocks(&mut out, &catalog, AxisFilter::from_options(x, y, z))?;
        }
        Command::Lines { block } => {
            let data = load_block(&backend, block)
                .await
                .with_context(|| format!("fetching block {block}"))?;
            write_lines(&mut out, &data.trace)?;
        }
        Command::State { block, line, json } => {
            let data = load_block(&backend, block)
                .await
                .with_context(|| format!("fetching block {block}"))?;
            check_line(&data.trace, line)?;
            if json {
                let state = data.trace.state_at(line);
                serde_json::to_writer_pretty(&mut out, &state)?;
                writeln!(out)?;
            } else {
                write_state(&mut out, &data.trace, line)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kscope_trace::{SourceIndex, Trace, TraceEvent, VariableUpdate};
    use serde_json::json;

    fn sample() -> ResolvedTrace {
        let source = SourceIndex::new(["def k():", "    acc = zeros()", "    n = 4"]);
        let trace: Trace = [
            TraceEvent::new("acc = zeros()").with_var(
                "acc",
                VariableUpdate::tensor(json!([[0, 0], [0, 0]]), vec![2, 2]),
            ),
            TraceEvent::new("n = 4").with_var("n", VariableUpdate::scalar(4)),
        ]
        .into_iter()
        .collect();
        ResolvedTrace::new(trace, source)
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn lines_print_with_source_text() {
        let trace = sample();
        let text = render(|out| write_lines(out, &trace));
        assert_eq!(text, "    2      acc = zeros()\n    3      n = 4\n");
    }

    #[test]
    fn state_splits_tensors_and_scalars() {
        let trace = sample();
        let text = render(|out| write_state(out, &trace, 3));
        assert_eq!(text, "acc [2x2]\nn = 4\n");
        let early = render(|out| write_state(out, &trace, 1));
        assert!(early.starts_with("no variables"));
    }

    #[test]
    fn out_of_range_line_is_rejected() {
        let trace = sample();
        assert!(check_line(&trace, 0).is_err());
        assert!(check_line(&trace, 4).is_err());
        assert!(check_line(&trace, 3).is_ok());
    }

    #[test]
    fn blocks_skip_placeholders() {
        let mut catalog = BlockCatalog::default();
        catalog.insert(BlockCoord::new(0, 0, 0), 3);
        catalog.insert(BlockCoord::new(2, 0, 0), 1);
        let text = render(|out| write_blocks(out, &catalog, AxisFilter::ALL));
        assert_eq!(text, "0,0,0\t3 ops\n2,0,0\t1 ops\n");
    }

    #[test]
    fn blocks_list_sparse_far_coordinates() {
        let mut catalog = BlockCatalog::default();
        catalog.insert(BlockCoord::new(0, 0, 0), 2);
        catalog.insert(BlockCoord::new(100_000, 100_000, 1), 5);
        let text = render(|out| write_blocks(out, &catalog, AxisFilter::ALL));
        assert_eq!(text, "0,0,0\t2 ops\n100000,100000,1\t5 ops\n");
        let only_z1 = AxisFilter::from_options(None, None, Some(1));
        let text = render(|out| write_blocks(out, &catalog, only_z1));
        assert_eq!(text, "100000,100000,1\t5 ops\n");
        let none = AxisFilter::from_options(Some(7), None, None);
        assert_eq!(render(|out| write_blocks(out, &catalog, none)), "no traced blocks
");
    }
}
