// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint traversal, pipeline state, and pick rendering for orogen.
//!
//! `orogen_render` turns a laid-out [`SceneTree`] into draw calls against
//! an abstract GPU backend:
//!
//! ```text
//!   SceneTree ──► PaintEngine::paint() ──► Gpu draw calls
//!        │              │
//!        │              └── offscreen redirect caches (group opacity)
//!        │
//!        └────► PaintEngine::pick() ──► id colors ──► readback ──► ActorId
//! ```
//!
//! **[`pipeline`]** — Copy-on-write bundles of draw state (color, blend,
//! texture layers, shader snippets, uniforms).
//!
//! **[`gpu`]** — The [`Gpu`](gpu::Gpu) collaborator trait platform
//! backends implement: transform/clip stacks, primitive draws, offscreen
//! targets, pixel readback.
//!
//! **[`paint`]** — The traversal engine: back-to-front painting with
//! mirrored transform/clip stacks, offscreen-redirect caching, and the
//! color-coded pick pass.
//!
//! **[`painter`]** — Per-node paint delegates and attached effects.
//!
//! **[`stacks`]** — The engine-side transform/clip stack types.
//!
//! [`SceneTree`]: orogen_core::actor::SceneTree
//!
//! # Crate features
//!
//! - `std` (disabled by default): enables `std` in `orogen_core`.
//! - `trace` / `trace-rich`: forwarded to `orogen_core`'s pass
//!   instrumentation.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod gpu;
mod offscreen;
pub mod paint;
pub mod painter;
mod pick;
pub mod pipeline;
pub mod stacks;

pub use gpu::{Gpu, GpuError, TargetId};
pub use paint::{PaintEngine, PickMode};
pub use painter::{ActorPaint, Effect};
pub use pipeline::{BlendMode, Color, Filter, Pipeline, Snippet, SnippetHook, TextureLayer, UniformValue};
