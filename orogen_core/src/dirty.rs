// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Orogen uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! coalesce invalidation requests between passes. Each channel represents an
//! independent category of change.
//!
//! # Propagation semantics
//!
//! Both propagating channels bubble *upward*: the dependency graph carries a
//! parent-depends-on-child edge for each attachment, so marking a node with
//! [`EagerPolicy`](understory_dirty::EagerPolicy) reaches every ancestor.
//!
//! - [`LAYOUT`] — A size request or layout-affecting property changed.
//!   Ancestors are affected because a container's preferred size depends on
//!   its children's. Drained by
//!   [`SceneTree::layout_root`](crate::actor::SceneTree::layout_root), which
//!   runs a single allocation pass no matter how many requests accumulated.
//! - [`DAMAGE`] — A node's subtree will render differently than last frame.
//!   Ancestors are affected because any offscreen cache holding an image of
//!   the subtree is now stale. Drained by the paint engine at the start of a
//!   paint pass to decide cache validity. Mutations that do not change what
//!   a node's *own* subtree looks like in local coordinates (opacity, local
//!   transform) start the mark at the node's parent, which is what lets a
//!   redirected group's cache survive an opacity-only change.
//! - [`TOPOLOGY`] — Structural change (add/remove child, create/destroy,
//!   sibling reorder). Local-only; drained together with DAMAGE so painters
//!   can rebuild any order-dependent state.

use understory_dirty::Channel;

/// Size request or layout input changed — the next layout pass must re-run.
pub const LAYOUT: Channel = Channel::new(0);

/// Rendered output of the subtree changed — offscreen caches along the
/// ancestor chain are stale.
pub const DAMAGE: Channel = Channel::new(1);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(2);
