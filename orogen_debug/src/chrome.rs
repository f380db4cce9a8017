// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format export.
//!
//! Converts recorded events into the JSON array format `chrome://tracing`
//! and Perfetto accept. Pass events lack wall-clock timestamps, so the
//! exporter assigns each event a monotonically increasing microsecond
//! tick; durations are therefore event counts, not time.

use std::io::{self, Write};

use orogen_core::trace::PhaseKind;
use serde_json::json;

use crate::recorder::RecordedEvent;

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Layout => "layout",
        PhaseKind::Paint => "paint",
        PhaseKind::Pick => "pick",
    }
}

/// Writes recorded events as a Chrome Trace Event Format JSON array.
pub fn export_chrome_trace<W: Write>(events: &[RecordedEvent], writer: &mut W) -> io::Result<()> {
    let mut entries = Vec::new();
    for (tick, event) in events.iter().enumerate() {
        let ts = tick as u64;
        let entry = match event {
            RecordedEvent::PhaseBegin(e) => json!({
                "name": phase_name(e.phase),
                "ph": "B",
                "ts": ts,
                "pid": 1,
                "tid": 1,
                "args": { "pass": e.pass_index },
            }),
            RecordedEvent::PhaseEnd(e) => json!({
                "name": phase_name(e.phase),
                "ph": "E",
                "ts": ts,
                "pid": 1,
                "tid": 1,
                "args": { "pass": e.pass_index, "nodes": e.nodes_visited },
            }),
            RecordedEvent::PickResult(e) => json!({
                "name": "pick-result",
                "ph": "i",
                "ts": ts,
                "pid": 1,
                "tid": 1,
                "s": "t",
                "args": { "pass": e.pass_index, "hit": e.hit_slot },
            }),
            RecordedEvent::NodeCache(e) => json!({
                "name": format!("cache:{:?}", e.event),
                "ph": "i",
                "ts": ts,
                "pid": 1,
                "tid": 1,
                "s": "t",
                "args": { "pass": e.pass_index, "slot": e.slot },
            }),
            RecordedEvent::NodePainted(e) => json!({
                "name": if e.pick { "pick-paint" } else { "paint" },
                "ph": "i",
                "ts": ts,
                "pid": 1,
                "tid": 1,
                "s": "t",
                "args": { "pass": e.pass_index, "slot": e.slot },
            }),
        };
        entries.push(entry);
    }
    serde_json::to_writer(&mut *writer, &entries).map_err(io::Error::other)?;
    writeln!(writer)
}
