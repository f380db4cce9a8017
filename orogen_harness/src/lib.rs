// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic test doubles for the orogen compositor stack.
//!
//! [`SoftGpu`] is a software implementation of the
//! [`Gpu`](orogen_render::gpu::Gpu) contract with real offscreen targets
//! and pixel readback; [`PaintCounter`]/[`CountingRectPaint`] make per-node
//! paint counts assertable. Together they let the end-to-end traversal
//! properties (cache fill vs. reuse, pick resolution, degraded fallbacks)
//! run as ordinary unit tests, without a GPU or a window system.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod counting;
mod soft_gpu;

pub use counting::{CountingRectPaint, PaintCounter};
pub use soft_gpu::{SoftGpu, Texture};
