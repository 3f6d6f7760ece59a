// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::time::Duration;

use serde_json::{json, Value};

use kscope_client::{load_block, BlockSession, SessionUpdate, TraceBackend, TransportError};
use kscope_trace::BlockCoord;

const SLOW: BlockCoord = BlockCoord::new(0, 0, 0);
const FAST: BlockCoord = BlockCoord::new(1, 0, 0);
const BROKEN: BlockCoord = BlockCoord::new(9, 9, 9);

/// In-process server: block (0,0,0) answers after a delay, (9,9,9) fails.
struct FakeBackend {
    delay: Duration,
}

impl TraceBackend for FakeBackend {
    async fn fetch_source(&self) -> Result<String, TransportError> {
        Ok("a = x\nb = a * 2\n".to_owned())
    }

    async fn fetch_trace(&self, block: BlockCoord) -> Result<Value, TransportError> {
        if block == BROKEN {
            return Err(TransportError::Status {
                endpoint: "/process_blocks",
                status: 500,
            });
        }
        if block == SLOW {
            tokio::time::sleep(self.delay).await;
        }
        Ok(json!({
            "results": [
                { "source_line": "a = x", "changed_vars": { "a": { "data": block.x } } },
                { "source_line": "b = a * 2", "changed_vars": { "b": { "data": block.x * 2 } } }
            ]
        }))
    }

    async fn fetch_catalog(&self) -> Result<Value, TransportError> {
        Ok(json!({ "ops": { "visualization_data": { "0_0_0": [{}], "1_0_0": [] } } }))
    }
}

fn session(delay_ms: u64) -> BlockSession<FakeBackend> {
    BlockSession::new(FakeBackend {
        delay: Duration::from_millis(delay_ms),
    })
}

#[test]
fn stale_block_result_is_discarded() {
    let mut s = session(150);
    s.select_block(SLOW);
    s.select_block(FAST);

    match s.wait_for(Duration::from_secs(5)) {
        Some(SessionUpdate::BlockLoaded(data)) => assert_eq!(data.block, FAST),
        other => panic!("expected FAST block, got {other:?}"),
    }

    // Give the slow fetch time to land; it must be filtered out.
    assert!(s.wait_for(Duration::from_millis(600)).is_none());
    assert_eq!(s.discarded(), 1);
    assert_eq!(s.selected(), Some(FAST));
}

#[test]
fn deselect_drops_in_flight_result() {
    let mut s = session(50);
    s.select_block(SLOW);
    s.deselect();
    assert!(s.wait_for(Duration::from_millis(500)).is_none());
    assert_eq!(s.discarded(), 1);
    assert!(s.selected().is_none());
}

#[test]
fn failures_are_reported_for_live_block() {
    let mut s = session(0);
    s.select_block(BROKEN);
    match s.wait_for(Duration::from_secs(5)) {
        Some(SessionUpdate::BlockFailed { block, error }) => {
            assert_eq!(block, BROKEN);
            assert!(matches!(error, TransportError::Status { status: 500, .. }));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn catalog_is_not_block_scoped() {
    let mut s = session(0);
    s.request_catalog();
    s.select_block(FAST);
    let mut got_catalog = false;
    let mut got_block = false;
    for _ in 0..2 {
        match s.wait_for(Duration::from_secs(5)) {
            Some(SessionUpdate::Catalog(Ok(catalog))) => {
                assert_eq!(catalog.len(), 2);
                got_catalog = true;
            }
            Some(SessionUpdate::BlockLoaded(_)) => got_block = true,
            other => panic!("unexpected update {other:?}"),
        }
    }
    assert!(got_catalog && got_block);
}

#[tokio::test]
async fn loaded_block_replays() {
    let backend = FakeBackend {
        delay: Duration::ZERO,
    };
    let data = load_block(&backend, FAST).await.unwrap();
    assert_eq!(data.interesting_lines().as_slice(), &[1, 2]);
    let state = data.trace.state_at(1);
    assert_eq!(state["a"].data, json!(1));
    assert!(!state.contains_key("b"));
    assert_eq!(data.trace.state_at(2)["b"].data, json!(2));
}
