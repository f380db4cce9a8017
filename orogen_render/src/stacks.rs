// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine-side transform and clip stacks.
//!
//! The paint traversal maintains these mirrors of the GPU-side stacks so it
//! can read accumulated state (e.g. the world scale for cache-resolution
//! checks) without querying the backend. Pushes and pops are strictly
//! paired with the tree recursion, so sibling subtrees never observe each
//! other's state.
//!
//! Popping an empty stack is a programming error: fatal in debug builds,
//! a logged no-op in release builds, since continuing with a corrupted
//! stack would cascade into wrong rendering for unrelated subtrees.

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use orogen_core::actor::ClipShape;
use orogen_core::matrix::Matrix;

/// A stack of accumulated transforms.
///
/// The top of the stack is the product of every pushed matrix, i.e. the
/// current local-to-root transform.
#[derive(Debug)]
pub struct TransformStack {
    stack: Vec<Matrix>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    /// Creates a stack holding only the identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: alloc::vec![Matrix::IDENTITY],
        }
    }

    /// Returns the accumulated transform.
    #[must_use]
    pub fn top(&self) -> &Matrix {
        // The base identity entry is never popped.
        self.stack.last().unwrap_or(&Matrix::IDENTITY)
    }

    /// Pushes `local`, post-multiplied onto the accumulated transform.
    pub fn push(&mut self, local: &Matrix) {
        let top = *self.top();
        self.stack.push(Matrix::multiply(&top, local));
    }

    /// Pops the most recent push.
    pub fn pop(&mut self) {
        debug_assert!(self.stack.len() > 1, "TransformStack::pop on empty stack");
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            log::warn!("TransformStack::pop on empty stack ignored");
        }
    }

    /// Returns the current nesting depth (0 at the root).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Extracts the world x/y scale factors from the accumulated
    /// transform (the lengths of the first two basis columns).
    #[must_use]
    pub fn world_scale(&self) -> (f32, f32) {
        let c = &self.top().cols;
        let sx = (c[0][0] * c[0][0] + c[0][1] * c[0][1] + c[0][2] * c[0][2]).sqrt();
        let sy = (c[1][0] * c[1][0] + c[1][1] * c[1][1] + c[1][2] * c[1][2]).sqrt();
        (sx, sy)
    }
}

/// A stack of active clip shapes.
#[derive(Debug, Default)]
pub struct ClipStack {
    stack: Vec<ClipShape>,
}

impl ClipStack {
    /// Creates an empty clip stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a clip shape.
    pub fn push(&mut self, clip: ClipShape) {
        self.stack.push(clip);
    }

    /// Pops the most recent clip.
    pub fn pop(&mut self) {
        debug_assert!(!self.stack.is_empty(), "ClipStack::pop on empty stack");
        if self.stack.pop().is_none() {
            log::warn!("ClipStack::pop on empty stack ignored");
        }
    }

    /// Returns the number of active clips.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_accumulates_and_pop_restores() {
        let mut stack = TransformStack::new();
        assert!(stack.top().is_identity());

        stack.push(&Matrix::from_translation(10.0, 0.0, 0.0));
        stack.push(&Matrix::from_translation(0.0, 5.0, 0.0));
        let (x, y) = stack.top().transform_point_2d(0.0, 0.0);
        assert_eq!((x, y), (10.0, 5.0));

        stack.pop();
        let (x, y) = stack.top().transform_point_2d(0.0, 0.0);
        assert_eq!((x, y), (10.0, 0.0));

        stack.pop();
        assert!(stack.top().is_identity());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn world_scale_reads_accumulated_scale() {
        let mut stack = TransformStack::new();
        stack.push(&Matrix::from_scale(2.0, 3.0, 1.0));
        stack.push(&Matrix::from_scale(0.5, 1.0, 1.0));
        let (sx, sy) = stack.world_scale();
        assert!((sx - 1.0).abs() < 1.0e-5);
        assert!((sy - 3.0).abs() < 1.0e-5);
    }

    #[test]
    fn world_scale_is_rotation_invariant() {
        let mut stack = TransformStack::new();
        let mut m = Matrix::from_scale(2.0, 2.0, 1.0);
        m.rotate(45.0, 0.0, 0.0, 1.0);
        stack.push(&m);
        let (sx, sy) = stack.world_scale();
        assert!((sx - 2.0).abs() < 1.0e-4);
        assert!((sy - 2.0).abs() < 1.0e-4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "pop on empty stack")]
    fn transform_underflow_is_fatal_in_debug() {
        let mut stack = TransformStack::new();
        stack.pop();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "pop on empty stack")]
    fn clip_underflow_is_fatal_in_debug() {
        let mut stack = ClipStack::new();
        stack.pop();
    }

    #[test]
    fn clip_stack_tracks_depth() {
        let mut stack = ClipStack::new();
        stack.push(ClipShape::Rect(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(stack.depth(), 1);
        stack.pop();
        assert_eq!(stack.depth(), 0);
    }
}
