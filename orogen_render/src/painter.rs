// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node paint delegates and attached effects.
//!
//! The tree stores *what* an actor presents (an opaque surface); the paint
//! engine stores *how* it is drawn. An [`ActorPaint`] delegate renders the
//! actor's own content; an [`Effect`] decorates the paint with pipeline
//! mutations and pre/post hooks. Both are render-side state, registered on
//! the [`PaintEngine`](crate::paint::PaintEngine) and released when the
//! actor is destroyed.

use kurbo::Rect;

use crate::gpu::Gpu;
use crate::pipeline::Pipeline;

/// Renders an actor's own content.
///
/// `bounds` is the actor's content box in local coordinates (origin at
/// zero, allocation size). `pipeline` already carries the paint opacity in
/// its color alpha and the actor's content surface (if any) as a texture
/// layer; simple painters can draw with it unchanged.
pub trait ActorPaint {
    /// Paints the actor's content.
    fn paint(&mut self, gpu: &mut dyn Gpu, bounds: Rect, pipeline: &Pipeline);

    /// Paints the actor's pick silhouette.
    ///
    /// `pipeline` carries the flat id color; the default fills the whole
    /// content box, which matches hit-testing against the allocation.
    /// Override for non-rectangular hit shapes.
    fn pick_paint(&mut self, gpu: &mut dyn Gpu, bounds: Rect, pipeline: &Pipeline) {
        gpu.draw_rect(pipeline, bounds);
    }
}

/// A paint decorator attached to an actor.
///
/// Effects run in normal paint mode only; pick renders raw silhouettes.
/// Hooks run in attachment order before the paint and in reverse order
/// after it.
pub trait Effect {
    /// Adjusts the pipeline the actor's content will be painted with.
    fn setup_pipeline(&mut self, pipeline: &mut Pipeline) {
        _ = pipeline;
    }

    /// Called before the actor's content is painted. Returning `false`
    /// skips painting the content (children still paint).
    fn pre_paint(&mut self, gpu: &mut dyn Gpu, bounds: Rect) -> bool {
        _ = (gpu, bounds);
        true
    }

    /// Called after the actor's content and children have painted.
    fn post_paint(&mut self, gpu: &mut dyn Gpu, bounds: Rect) {
        _ = (gpu, bounds);
    }
}
