// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Actor and surface identity types.

use core::fmt;

/// Sentinel value indicating "no actor" or "no surface" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to an actor in a [`SceneTree`](super::SceneTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an actor is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter, must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl ActorId {
    /// Returns the raw slot index (for diagnostics and render-side tables).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({}@gen{})", self.idx, self.generation)
    }
}

/// An opaque reference to a content surface.
///
/// Surfaces are created and managed externally (by an imaging pipeline or
/// GPU backend). An actor with `Some(SurfaceId)` as its content presents
/// that surface inside its allocation; `None` means the actor only groups
/// children (and optionally paints through an attached painter).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}
