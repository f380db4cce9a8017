// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint-counting delegates.
//!
//! Cache fill versus cache reuse is externally observable as a paint-count
//! difference per node: reusing a valid offscreen cache issues zero paint
//! calls to the cached subtree, filling it issues exactly one. These
//! painters make that count assertable.

use alloc::rc::Rc;
use core::cell::Cell;

use kurbo::Rect;
use orogen_render::gpu::Gpu;
use orogen_render::painter::ActorPaint;
use orogen_render::pipeline::{Color, Pipeline};

/// A shared paint counter, cloned between the test and its painter.
#[derive(Clone, Debug, Default)]
pub struct PaintCounter {
    count: Rc<Cell<u32>>,
}

impl PaintCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of paints observed so far.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.count.get()
    }

    fn bump(&self) {
        self.count.set(self.count.get() + 1);
    }
}

/// Paints the content box in a solid color and counts every paint call.
#[derive(Clone, Debug)]
pub struct CountingRectPaint {
    counter: PaintCounter,
    color: Color,
}

impl CountingRectPaint {
    /// Creates a painter drawing `color`, reporting into `counter`.
    #[must_use]
    pub fn new(counter: PaintCounter, color: Color) -> Self {
        Self { counter, color }
    }
}

impl ActorPaint for CountingRectPaint {
    fn paint(&mut self, gpu: &mut dyn Gpu, bounds: Rect, pipeline: &Pipeline) {
        self.counter.bump();
        // Keep the paint opacity the engine put into the pipeline alpha.
        let alpha = pipeline.color().a;
        let mut own = pipeline.clone();
        own.set_color(Color::rgba(self.color.r, self.color.g, self.color.b, self.color.a).with_opacity(alpha));
        gpu.draw_rect(&own, bounds);
    }
}
