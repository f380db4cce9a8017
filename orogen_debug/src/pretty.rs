// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output and scene-tree dumps.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).
//! [`dump_tree`] renders a subtree snapshot with per-actor state, useful
//! when chasing map-state or allocation bugs.

use std::io::Write;

use orogen_core::actor::{ActorId, SceneTree};
use orogen_core::trace::{
    CacheEvent, NodeCacheEvent, NodePaintedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    PickResultEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Layout => "layout",
        PhaseKind::Paint => "paint",
        PhaseKind::Pick => "pick",
    }
}

fn cache_name(event: CacheEvent) -> &'static str {
    match event {
        CacheEvent::Fill => "fill",
        CacheEvent::Reuse => "reuse",
        CacheEvent::Bypass => "bypass",
        CacheEvent::Fallback => "fallback",
        CacheEvent::Release => "release",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[{}:begin] pass={}",
            phase_name(e.phase),
            e.pass_index
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[{}:end] pass={} nodes={}",
            phase_name(e.phase),
            e.pass_index,
            e.nodes_visited
        );
    }

    fn on_pick_result(&mut self, e: &PickResultEvent) {
        match e.hit_slot {
            Some(slot) => {
                let _ = writeln!(self.writer, "[pick:hit] pass={} slot={slot}", e.pass_index);
            }
            None => {
                let _ = writeln!(self.writer, "[pick:miss] pass={}", e.pass_index);
            }
        }
    }

    fn on_node_cache(&mut self, e: &NodeCacheEvent) {
        let _ = writeln!(
            self.writer,
            "[cache:{}] pass={} slot={}",
            cache_name(e.event),
            e.pass_index,
            e.slot
        );
    }

    fn on_node_painted(&mut self, e: &NodePaintedEvent) {
        let kind = if e.pick { "pick-paint" } else { "paint" };
        let _ = writeln!(
            self.writer,
            "[{kind}] pass={} slot={}",
            e.pass_index,
            e.slot
        );
    }
}

/// Renders the subtree rooted at `root` as an indented listing with
/// per-actor flags, opacity, and allocation.
#[must_use]
pub fn dump_tree(tree: &SceneTree, root: ActorId) -> String {
    let mut out = String::new();
    dump_actor(tree, root, 0, &mut out);
    out
}

fn dump_actor(tree: &SceneTree, id: ActorId, depth: usize, out: &mut String) {
    use std::fmt::Write as _;

    let flags = tree.flags(id);
    let alloc = tree.allocation(id);
    let mut state = String::new();
    for (set, tag) in [
        (flags.visible, 'v'),
        (flags.realized, 'r'),
        (flags.mapped, 'm'),
        (flags.reactive, 'i'),
        (flags.toplevel, 't'),
    ] {
        state.push(if set { tag } else { '-' });
    }
    let _ = writeln!(
        out,
        "{:indent$}{id:?} [{state}] opacity={} alloc=({:.1},{:.1} {:.1}x{:.1})",
        "",
        tree.opacity(id),
        alloc.x0,
        alloc.y0,
        alloc.width(),
        alloc.height(),
        indent = depth * 2,
    );
    for child in tree.children(id) {
        dump_actor(tree, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_shows_hierarchy_and_flags() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let child = tree.create_actor();
        tree.add_child(stage, child);
        tree.set_opacity(child, 128);

        let dump = dump_tree(&tree, stage);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[vrm-t]"), "stage flags: {}", lines[0]);
        assert!(lines[1].starts_with("  "), "children are indented");
        assert!(lines[1].contains("opacity=128"));
    }

    #[test]
    fn sink_formats_one_line_per_event() {
        let mut buffer = Vec::new();
        {
            let mut sink = PrettyPrintSink::with_writer(&mut buffer);
            sink.on_phase_begin(&PhaseBeginEvent {
                pass_index: 3,
                phase: PhaseKind::Paint,
            });
            sink.on_node_cache(&NodeCacheEvent {
                pass_index: 3,
                slot: 7,
                event: CacheEvent::Reuse,
            });
        }
        let text = String::from_utf8(buffer).expect("output is utf-8");
        assert_eq!(text, "[paint:begin] pass=3\n[cache:reuse] pass=3 slot=7\n");
    }
}
