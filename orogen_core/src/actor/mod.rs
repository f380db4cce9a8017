// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree data model.
//!
//! An *actor* is a node in the retained-mode paint/layout tree. Each actor
//! has:
//!
//! - An identity ([`ActorId`]) — a generational handle that becomes stale
//!   when the actor is destroyed, preventing use-after-free bugs at the API
//!   level.
//! - Topology — parent, first-child, and sibling links forming an ordered
//!   tree; insertion order is paint order.
//! - **Layout inputs** set by the caller: fixed position, explicit size,
//!   content size, margins, alignment hints, and an optional
//!   [`LayoutPolicy`] for its children.
//! - **Layout outputs** produced by the allocation pass: the allocation box
//!   in parent coordinates and its validity window.
//! - **Paint state**: opacity, clip, content surface, offscreen-redirect
//!   policy, and local transform additions (translation, pivot-relative
//!   rotation and scale).
//! - **Lifecycle state**: the visible flag and the derived realized/mapped
//!   states (see [`lifecycle`](self) transitions on [`SceneTree`]).
//!
//! Actors are stored in struct-of-arrays layout with index-based handles
//! for cache-friendly traversal. There is no global default tree; every
//! stage owns one.
//!
//! # Dirty tracking
//!
//! Property mutations automatically mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)). LAYOUT and DAMAGE bubble to ancestors
//! through the dependency graph; [`SceneTree::layout_root`] and
//! [`SceneTree::take_frame_damage`] drain them once per pass.

mod clip;
mod damage;
mod id;
mod layout;
mod lifecycle;
mod store;
mod traverse;

pub use clip::ClipShape;
pub use damage::FrameDamage;
pub use id::{ActorId, INVALID, SurfaceId};
pub use layout::{
    ActorAlign, BinLayout, ChildAllocation, FixedLayout, LayoutHints, LayoutPolicy, Margins,
    SizeRequest,
};
pub use store::{ActorFlags, RedirectPolicy, SceneTree};
pub use traverse::{Children, RawChildren};
