// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The GPU/draw collaborator contract.
//!
//! Orogen does not talk to a GPU directly. Platform backends implement
//! [`Gpu`] and provide:
//!
//! - **Transform and clip stacks** — push/pop state applied to subsequent
//!   draws. The paint engine mirrors its own stacks 1:1 onto these, so a
//!   backend may simply track the top-of-stack.
//! - **Primitive draws** — solid and offscreen-textured rectangles taking a
//!   [`Pipeline`] handle. This is the "draw triangles with a given pipeline
//!   state" primitive the traversal is built on.
//! - **Offscreen targets** — creation, a target stack for redirected
//!   subtree painting, pixel readback for pick resolution, and a feature
//!   query so the engine can degrade to direct painting where offscreen
//!   rendering is unavailable.
//!
//! # Frame loop pseudocode
//!
//! A typical host wires the pieces together like this:
//!
//! ```rust,ignore
//! fn on_frame(tree: &mut SceneTree, engine: &mut PaintEngine, gpu: &mut MyGpu) {
//!     queue.drain(tree);                    // worker-thread results
//!     engine.paint(tree, gpu, stage, viewport, &projection, &mut Tracer::none());
//!     gpu.present();
//! }
//! ```

use kurbo::Rect;
use orogen_core::actor::ClipShape;
use orogen_core::matrix::Matrix;

use crate::pipeline::{Color, Pipeline};

/// A handle to a GPU-managed offscreen target (a framebuffer plus its
/// backing texture). Assigned by the [`Gpu`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

/// Recoverable GPU-side failures.
///
/// These are resource-exhaustion conditions, not contract violations: the
/// paint engine reacts by falling back to direct painting for the affected
/// node this pass and retrying on the next one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GpuError {
    /// The backend cannot render offscreen at all.
    #[error("offscreen targets are not supported by this backend")]
    OffscreenUnsupported,
    /// Allocating an offscreen target failed (usually transient memory
    /// pressure).
    #[error("failed to allocate a {width}x{height} offscreen target")]
    OffscreenAllocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
}

/// The draw contract a platform backend implements.
///
/// All coordinates are in the space established by the transform stack;
/// draws are affected by every clip currently pushed.
pub trait Gpu {
    /// Returns whether offscreen targets are available.
    fn supports_offscreen(&self) -> bool;

    /// Creates an offscreen target of the given pixel size.
    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<TargetId, GpuError>;

    /// Releases an offscreen target and its texture.
    fn release_offscreen(&mut self, target: TargetId);

    /// Pushes `target` as the destination for subsequent draws.
    ///
    /// Entering a target starts with fresh (empty) transform and clip
    /// stacks, like binding a framebuffer with an identity model-view;
    /// popping restores the stacks of the outer target.
    fn push_target(&mut self, target: TargetId);

    /// Pops the current target, restoring the previous destination.
    fn pop_target(&mut self);

    /// Fills the current target with `color`, ignoring transforms and
    /// clips.
    fn clear(&mut self, color: Color);

    /// Pushes `matrix`, post-multiplied onto the current transform.
    fn push_transform(&mut self, matrix: &Matrix);

    /// Pops the most recently pushed transform.
    fn pop_transform(&mut self);

    /// Pushes a clip shape, intersected with the current clip.
    fn push_clip(&mut self, clip: &ClipShape);

    /// Pops the most recently pushed clip.
    fn pop_clip(&mut self);

    /// Draws a rectangle with the given pipeline state.
    fn draw_rect(&mut self, pipeline: &Pipeline, rect: Rect);

    /// Draws `rect` textured with the contents of an offscreen target,
    /// modulated by the pipeline color.
    fn draw_offscreen(&mut self, pipeline: &Pipeline, source: TargetId, rect: Rect);

    /// Reads back one pixel of an offscreen target as RGBA.
    fn read_pixel(&mut self, target: TargetId, x: u32, y: u32) -> [u8; 4];
}
