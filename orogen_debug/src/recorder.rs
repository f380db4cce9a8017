// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory trace recording.

use orogen_core::trace::{
    NodeCacheEvent, NodePaintedEvent, PhaseBeginEvent, PhaseEndEvent, PickResultEvent, TraceSink,
};

/// One recorded trace event, in arrival order.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A pass began.
    PhaseBegin(PhaseBeginEvent),
    /// A pass ended.
    PhaseEnd(PhaseEndEvent),
    /// A pick render resolved.
    PickResult(PickResultEvent),
    /// A redirected node's cache changed state.
    NodeCache(NodeCacheEvent),
    /// A node's content was painted.
    NodePainted(NodePaintedEvent),
}

/// A [`TraceSink`] that appends every event to a vector.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in arrival order.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Clears the recording.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.events.push(RecordedEvent::PhaseBegin(*e));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.events.push(RecordedEvent::PhaseEnd(*e));
    }

    fn on_pick_result(&mut self, e: &PickResultEvent) {
        self.events.push(RecordedEvent::PickResult(*e));
    }

    fn on_node_cache(&mut self, e: &NodeCacheEvent) {
        self.events.push(RecordedEvent::NodeCache(*e));
    }

    fn on_node_painted(&mut self, e: &NodePaintedEvent) {
        self.events.push(RecordedEvent::NodePainted(*e));
    }
}

#[cfg(test)]
mod tests {
    use orogen_core::trace::{PhaseKind, Tracer};

    use super::*;

    #[test]
    fn records_in_arrival_order() {
        let mut sink = RecorderSink::new();
        let mut tracer = Tracer::new(&mut sink);
        tracer.phase_begin(&PhaseBeginEvent {
            pass_index: 0,
            phase: PhaseKind::Paint,
        });
        tracer.phase_end(&PhaseEndEvent {
            pass_index: 0,
            phase: PhaseKind::Paint,
            nodes_visited: 2,
        });
        drop(tracer);

        assert_eq!(sink.events().len(), 2);
        assert!(matches!(sink.events()[0], RecordedEvent::PhaseBegin(_)));
        assert!(matches!(
            sink.events()[1],
            RecordedEvent::PhaseEnd(PhaseEndEvent {
                nodes_visited: 2,
                ..
            })
        ));
    }
}
