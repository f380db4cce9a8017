// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the layout and paint passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! pass instrumentation calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates per-node paint and cache events
//!   plus the corresponding `TraceSink` methods.

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which pass over the tree is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// The allocation (layout) pass.
    Layout,
    /// The normal paint pass.
    Paint,
    /// A pick (hit-test) render pass.
    Pick,
}

/// What happened to a node's offscreen redirect cache during a paint.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// The cache was created or repainted.
    Fill,
    /// The cached texture was recomposited without repainting the subtree.
    Reuse,
    /// Redirection was skipped (policy or overlap check declined it).
    Bypass,
    /// Offscreen allocation failed; painted directly as a fallback.
    Fallback,
    /// The cache was released (node destroyed or policy changed).
    Release,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Which pass is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Which pass is ending.
    pub phase: PhaseKind,
    /// Number of nodes visited by the pass.
    pub nodes_visited: u32,
}

/// Emitted when a pick render resolves a query point.
#[derive(Clone, Copy, Debug)]
pub struct PickResultEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// The slot index of the hit node, if any.
    pub hit_slot: Option<u32>,
}

/// A per-node cache record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct NodeCacheEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Slot index of the redirected node.
    pub slot: u32,
    /// What happened to its cache.
    pub event: CacheEvent,
}

/// Emitted when a node's own content is painted.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct NodePaintedEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Slot index of the painted node.
    pub slot: u32,
    /// Whether this was a pick (silhouette) paint.
    pub pick: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the traversal engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a pass.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a pick render resolves.
    fn on_pick_result(&mut self, e: &PickResultEvent) {
        _ = e;
    }

    /// Called per redirected node (requires the `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_node_cache(&mut self, e: &NodeCacheEvent) {
        _ = e;
    }

    /// Called per painted node (requires the `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_node_painted(&mut self, e: &NodePaintedEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PickResultEvent`].
    #[inline]
    pub fn pick_result(&mut self, e: &PickResultEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pick_result(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`NodeCacheEvent`].
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn node_cache(&mut self, e: &NodeCacheEvent) {
        if let Some(s) = &mut self.sink {
            s.on_node_cache(e);
        }
    }

    /// Emits a [`NodePaintedEvent`].
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn node_painted(&mut self, e: &NodePaintedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_node_painted(e);
        }
    }
}
