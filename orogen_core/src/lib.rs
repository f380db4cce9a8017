// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree, layout engine, and matrix math for retained-mode
//! compositing.
//!
//! `orogen_core` provides the foundational data structures for a
//! retained-mode tree of paintable nodes that is incrementally laid out and
//! incrementally repainted. It is `no_std` compatible (with `alloc`) and
//! uses array-based struct-of-arrays storage with index handles for
//! cache-friendly traversal.
//!
//! # Architecture
//!
//! The crate is organized around a frame loop that turns queued mutations
//! into incremental passes over the tree:
//!
//! ```text
//!   mutations ──► dirty channels (coalesced)
//!                      │
//!                      ▼
//!   SceneTree::layout_root() ──► allocation boxes
//!                      │
//!                      ▼
//!   SceneTree::take_frame_damage() ──► FrameDamage ──► paint engine
//!                                                      (orogen_render)
//! ```
//!
//! **[`actor`]** — Struct-of-arrays scene tree with generational handles.
//! Layout inputs, paint properties, and the show/hide/realize/map state
//! machine are set by the caller; allocation boxes are computed by the
//! layout pass.
//!
//! **[`dirty`]** — Multi-channel dirty tracking via `understory_dirty`.
//! Property mutations automatically mark the appropriate channel; LAYOUT
//! and DAMAGE bubble to ancestors, TOPOLOGY is structural.
//!
//! **[`matrix`]** — Column-major 4×4 single-precision matrix used to build
//! the model-view and projection stacks, plus a memoized-inverse wrapper.
//!
//! **[`id_pool`]** — Reusable dense-integer id allocator, used by the pick
//! render path to encode node identity as a color.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types
//! for pass instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! **[`handoff`]** (feature `std`) — Bounded worker-to-main-thread task
//! queue; the only sanctioned way for background work to reach the tree.
//!
//! # Threading
//!
//! The tree is single-threaded by design: all mutation, layout, and paint
//! traversal happen on the thread that owns the
//! [`SceneTree`](actor::SceneTree). There is no internal locking;
//! cross-thread results are marshaled through [`handoff`].
//!
//! # Crate features
//!
//! - `std` (disabled by default): enables [`handoff`] and `std` support in
//!   dependencies.
//! - `trace` (disabled by default): enables `Tracer` method bodies (one
//!   branch per call site).
//! - `trace-rich` (disabled by default, implies `trace`): gates per-node
//!   paint and cache events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod actor;
pub mod dirty;
#[cfg(feature = "std")]
pub mod handoff;
pub mod id_pool;
pub mod matrix;
pub mod trace;
