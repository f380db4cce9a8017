// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame damage drain.
//!
//! Mutations between passes mark dirty channels (see [`crate::dirty`]);
//! [`SceneTree::take_frame_damage`] drains them once per paint pass into a
//! [`FrameDamage`], coalescing any number of requests into one recompute.
//!
//! `FrameDamage` uses raw slot indices (`u32`) rather than [`ActorId`]
//! handles so the paint engine can index its per-slot side tables (caches,
//! pick ids, painters) directly, following the store's `*_at()` accessor
//! scheme.
//!
//! [`ActorId`]: super::ActorId

use alloc::vec::Vec;

use super::store::SceneTree;
use crate::dirty;

/// The set of changes drained by a single
/// [`SceneTree::take_frame_damage`] call.
#[derive(Clone, Debug, Default)]
pub struct FrameDamage {
    /// Slots whose subtree renders differently than last frame; any
    /// offscreen cache held *by* these slots is stale.
    pub damaged: Vec<u32>,
    /// Whether tree topology changed since the last drain.
    pub topology_changed: bool,
    /// Slots added since the last drain.
    pub added: Vec<u32>,
    /// Slots retired since the last drain; render-side state for them must
    /// be released.
    pub removed: Vec<u32>,
}

impl FrameDamage {
    /// Clears all lists.
    pub fn clear(&mut self) {
        self.damaged.clear();
        self.topology_changed = false;
        self.added.clear();
        self.removed.clear();
    }

    /// Returns whether the frame carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.damaged.is_empty()
            && !self.topology_changed
            && self.added.is_empty()
            && self.removed.is_empty()
    }
}

impl SceneTree {
    /// Drains the damage and topology channels, returning the coalesced
    /// change set for this frame.
    pub fn take_frame_damage(&mut self) -> FrameDamage {
        let mut damage = FrameDamage::default();
        self.take_frame_damage_into(&mut damage);
        damage
    }

    /// Like [`take_frame_damage`](Self::take_frame_damage), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn take_frame_damage_into(&mut self, damage: &mut FrameDamage) {
        damage.clear();

        damage.damaged = self
            .dirty
            .drain(dirty::DAMAGE)
            .affected()
            .deterministic()
            .run()
            .collect();

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        damage.topology_changed = !topology.is_empty();

        core::mem::swap(&mut self.pending_added, &mut damage.added);
        core::mem::swap(&mut self.pending_removed, &mut damage.removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_change_damages_ancestors_not_self() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let group = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(stage, group);
        tree.add_child(group, child);
        let _ = tree.take_frame_damage();

        tree.set_opacity(group, 127);
        let damage = tree.take_frame_damage();
        assert!(
            !damage.damaged.contains(&group.index()),
            "the changed node's own cache stays valid"
        );
        assert!(damage.damaged.contains(&stage.index()));
        assert!(!damage.damaged.contains(&child.index()));
    }

    #[test]
    fn queue_redraw_damages_self_and_ancestors() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let group = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(stage, group);
        tree.add_child(group, child);
        let _ = tree.take_frame_damage();

        tree.queue_redraw(child);
        let damage = tree.take_frame_damage();
        assert!(damage.damaged.contains(&child.index()));
        assert!(damage.damaged.contains(&group.index()));
        assert!(damage.damaged.contains(&stage.index()));
    }

    #[test]
    fn repeated_requests_coalesce() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let actor = tree.create_actor();
        tree.add_child(stage, actor);
        let _ = tree.take_frame_damage();

        tree.queue_redraw(actor);
        tree.queue_redraw(actor);
        tree.queue_redraw(actor);
        let damage = tree.take_frame_damage();
        let hits = damage.damaged.iter().filter(|&&i| i == actor.index()).count();
        assert_eq!(hits, 1, "N requests drain as one entry");

        // Nothing left after the drain.
        let damage = tree.take_frame_damage();
        assert!(damage.is_empty());
    }

    #[test]
    fn content_change_damages_the_node_itself() {
        use crate::actor::SurfaceId;

        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let actor = tree.create_actor();
        tree.add_child(stage, actor);
        let _ = tree.take_frame_damage();

        tree.set_content(actor, Some(SurfaceId(3)));
        let damage = tree.take_frame_damage();
        assert!(damage.damaged.contains(&actor.index()));
        assert!(damage.damaged.contains(&stage.index()));
    }

    #[test]
    fn lifecycle_lists_flow_through_damage() {
        let mut tree = SceneTree::new();
        let a = tree.create_actor();

        let damage = tree.take_frame_damage();
        assert!(damage.added.contains(&a.index()));
        assert!(damage.removed.is_empty());

        tree.destroy_actor(a);
        let damage = tree.take_frame_damage();
        assert!(damage.added.is_empty());
        assert!(damage.removed.contains(&a.index()));
    }

    #[test]
    fn topology_changes_are_flagged() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let child = tree.create_actor();
        let _ = tree.take_frame_damage();

        tree.add_child(parent, child);
        let damage = tree.take_frame_damage();
        assert!(damage.topology_changed);

        let damage = tree.take_frame_damage();
        assert!(!damage.topology_changed);
    }
}
