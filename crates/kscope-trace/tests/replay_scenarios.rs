// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use serde_json::json;

use kscope_trace::{
    classify, compute_state, CursorNavigator, InterestingLines, NavKey, ResolvedTrace,
    SourceIndex, Trace, TraceEvent, VariableUpdate,
};

fn scalar_event(line: &str, name: &str, v: i64) -> TraceEvent {
    TraceEvent::new(line).with_var(name, VariableUpdate::scalar(v))
}

#[test]
fn end_to_end_three_line_kernel() {
    let source = SourceIndex::new(["a=1", "b=2", "c=a+b"]);
    let body = json!({
        "results": [
            { "source_line": "a=1", "changed_vars": { "a": { "data": 1 } } },
            { "source_line": "b=2", "changed_vars": { "b": { "data": 2 } } },
            { "source_line": "c=a+b", "changed_vars": { "c": { "data": 3 } } }
        ]
    });
    let trace = Trace::from_response(&body).unwrap();

    let state = compute_state(&trace, &source, 2);
    assert_eq!(state.len(), 2);
    assert_eq!(state["a"].data, json!(1));
    assert_eq!(state["b"].data, json!(2));

    let full = compute_state(&trace, &source, 3);
    assert_eq!(full["c"].data, json!(3));
}

#[test]
fn execution_order_beats_line_proximity() {
    // Lines are numbered so that "v = 1" is line 10 and "v = 2" is line 5.
    let mut lines = vec![String::new(); 10];
    lines[4] = "v = 2".into();
    lines[9] = "v = 1".into();
    let source = SourceIndex::new(lines);

    let trace: Trace = [scalar_event("v = 1", "v", 1), scalar_event("v = 2", "v", 2)]
        .into_iter()
        .collect();
    let state = compute_state(&trace, &source, 10);
    assert_eq!(state["v"].data, json!(2));

    // Only the line-5 event is visible before line 10.
    let early = compute_state(&trace, &source, 5);
    assert_eq!(early["v"].data, json!(2));
}

#[test]
fn navigator_walks_lines_and_saturates() {
    let source = SourceIndex::new(["x = 0", "y = x", "z = y", "w = z"]);
    let trace: Trace = [
        scalar_event("z = y", "z", 0),
        scalar_event("x = 0", "x", 0),
        scalar_event("z = y", "z", 1),
        scalar_event("w = z", "w", 1),
    ]
    .into_iter()
    .collect();
    let lines = InterestingLines::from_trace(&trace, &source);
    assert_eq!(lines.as_slice(), &[3, 1, 4]);

    let mut nav = CursorNavigator::new();
    nav.load(lines);
    assert_eq!(nav.line(), Some(3));

    assert!(!nav.handle(NavKey::Backward));
    assert_eq!(nav.line(), Some(3));

    assert!(nav.handle(NavKey::Forward));
    assert!(nav.handle(NavKey::Forward));
    assert_eq!(nav.line(), Some(4));
    assert!(!nav.handle(NavKey::Forward));
    assert_eq!(nav.line(), Some(4));

    assert!(nav.handle(NavKey::Backward));
    assert_eq!(nav.line(), Some(1));
}

#[test]
fn classification_boundaries() {
    let mut state = kscope_trace::VariableState::new();
    state.insert("one".into(), VariableUpdate::tensor(json!([0, 0, 0, 0]), vec![4]));
    state.insert("none".into(), VariableUpdate::tensor(json!(0), vec![0, 0, 0, 0]));
    state.insert("three".into(), VariableUpdate::tensor(json!([]), vec![2, 3, 4]));
    state.insert("four".into(), VariableUpdate::tensor(json!([]), vec![2, 3, 4, 5]));

    let c = classify(&state);
    let tensors: Vec<_> = c.tensors.iter().map(|t| t.name.as_str()).collect();
    let others: Vec<_> = c.others.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(tensors, ["one", "three"]);
    assert_eq!(others, ["four", "none"]);
}

#[test]
fn tensor_updates_survive_replay_with_highlights() {
    let source = SourceIndex::from_text("acc = zeros(2, 2)\nacc[1][0] = 5\n");
    let body = json!({
        "results": [
            { "source_line": "acc = zeros(2, 2)", "changed_vars": {
                "acc": { "data": [[0, 0], [0, 0]], "dims": [2, 2, -1] } } },
            { "source_line": "acc[1][0] = 5", "changed_vars": {
                "acc": { "data": [[0, 0], [5, 0]], "dims": [2, 2, -1],
                         "highlighted_coords": [[1, 0]] } } }
        ]
    });
    let resolved = ResolvedTrace::new(Trace::from_response(&body).unwrap(), source);
    let before = resolved.state_at(1);
    assert!(before["acc"].highlighted_coords.is_none());

    let after = resolved.state_at(2);
    let entry = classify(&after).tensors.remove(0);
    assert_eq!(entry.dims, vec![2, 2]);
    assert_eq!(entry.update.highlighted_coords, Some(vec![vec![1, 0]]));
}
