// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Show/hide, realize, and map state transitions.
//!
//! Each actor is in one of `{unrealized, realized-unmapped, mapped}`, with
//! the visibility flag as an orthogonal input gating the transition into
//! `mapped`. The derived rules:
//!
//! - realized implies the parent (if any) is realized;
//! - mapped implies the parent (if any) is mapped *and* the actor itself is
//!   visible; toplevels anchor the chain and map when shown;
//! - visibility is not recursive: hiding a container never touches the
//!   children's visible flags, it only removes them from the mapped set.
//!
//! `show`/`hide` mutate only the local flag and then re-derive the mapped
//! set for the affected subtree. Attaching a visible actor to a mapped
//! chain realizes and maps it in one step; detaching unmaps without
//! unrealizing. Destruction is bottom-up: children are destroyed and
//! detached before the parent's slot is retired.

use understory_dirty::EagerPolicy;

use crate::dirty;

use super::id::{ActorId, INVALID};
use super::store::SceneTree;

impl SceneTree {
    /// Makes the actor visible.
    ///
    /// Any explicit visibility call (this or [`hide`](Self::hide)) clears
    /// the show-on-set-parent default, so a later attach no longer forces
    /// the actor visible.
    pub fn show(&mut self, id: ActorId) {
        self.validate(id);
        let idx = id.idx;
        self.flags[idx as usize].show_on_set_parent = false;
        if !self.flags[idx as usize].visible {
            self.flags[idx as usize].visible = true;
            self.damage_from_parent(idx);
            self.dirty.mark_with(idx, dirty::LAYOUT, &EagerPolicy);
            self.update_map_state(idx);
        }
    }

    /// Makes the actor invisible.
    ///
    /// Children keep their own visible flags; they merely leave the mapped
    /// set because their ancestor chain is no longer fully visible.
    pub fn hide(&mut self, id: ActorId) {
        self.validate(id);
        let idx = id.idx;
        self.flags[idx as usize].show_on_set_parent = false;
        if self.flags[idx as usize].visible {
            self.flags[idx as usize].visible = false;
            self.damage_from_parent(idx);
            self.dirty.mark_with(idx, dirty::LAYOUT, &EagerPolicy);
            self.update_map_state(idx);
        }
    }

    /// Acquires backend resources for the actor.
    ///
    /// Realizes unrealized ancestors first (a realized actor implies a
    /// realized parent) but never recurses into children; descendants are
    /// realized independently as part of the mapping walk.
    pub fn realize(&mut self, id: ActorId) {
        self.validate(id);
        self.realize_chain(id.idx);
    }

    /// Releases backend resources for the actor and its descendants.
    ///
    /// A mapped actor cannot be unrealized; the call logs a warning and
    /// does nothing. Children are unrealized first, since a realized child
    /// under an unrealized parent would violate the chain invariant.
    pub fn unrealize(&mut self, id: ActorId) {
        self.validate(id);
        if self.flags[id.idx as usize].mapped {
            log::warn!("unrealize: {id:?} is mapped; hide or detach it first");
            return;
        }
        self.unrealize_at(id.idx);
    }

    /// Destroys the actor and its whole subtree.
    ///
    /// Children are destroyed first, bottom-up; each leaves the mapped and
    /// realized states and is detached, so the parent's child list is empty
    /// before the parent's own slot is retired. Retired slots appear in the
    /// next [`take_frame_damage`](Self::take_frame_damage) `removed` list so
    /// render-side state (offscreen caches, pick ids) can be released.
    pub fn destroy_actor(&mut self, id: ActorId) {
        self.validate(id);
        self.destroy_at(id.idx);
    }

    // -- Internal walks --

    fn realize_chain(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if p != INVALID && !self.flags[p as usize].realized {
            self.realize_chain(p);
        }
        self.flags[idx as usize].realized = true;
    }

    fn unrealize_at(&mut self, idx: u32) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.unrealize_at(child);
            child = next;
        }
        self.flags[idx as usize].realized = false;
    }

    /// Re-derives the mapped state for the subtree rooted at `idx` after a
    /// visibility or topology change.
    pub(crate) fn update_map_state(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let parent_mapped = p != INVALID && self.flags[p as usize].mapped;
        let f = self.flags[idx as usize];
        let should_map = f.visible && (parent_mapped || (f.toplevel && p == INVALID));
        self.set_mapped_recursive(idx, should_map);
    }

    pub(crate) fn set_mapped_recursive(&mut self, idx: u32, should_map: bool) {
        let f = self.flags[idx as usize];
        if should_map && !f.mapped {
            // Realize-then-map as one step. The parent is already mapped
            // (hence realized), so setting the flag keeps the chain
            // invariant.
            self.flags[idx as usize].realized = true;
            self.flags[idx as usize].mapped = true;
            self.damage_from_parent(idx);

            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                let next = self.next_sibling[child as usize];
                if self.flags[child as usize].visible {
                    self.set_mapped_recursive(child, true);
                }
                child = next;
            }
        } else if !should_map && f.mapped {
            self.flags[idx as usize].mapped = false;
            self.damage_from_parent(idx);

            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                let next = self.next_sibling[child as usize];
                self.set_mapped_recursive(child, false);
                child = next;
            }
        }
    }

    fn destroy_at(&mut self, idx: u32) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.destroy_at(child);
            child = next;
        }

        self.set_mapped_recursive(idx, false);
        self.flags[idx as usize].realized = false;

        let p = self.parent[idx as usize];
        if p != INVALID {
            self.unlink_from_parent(idx);
            self.dirty.remove_dependency(p, idx, dirty::LAYOUT);
            self.dirty.remove_dependency(p, idx, dirty::DAMAGE);
            self.dirty.mark(p, dirty::TOPOLOGY);
            self.dirty.mark_with(p, dirty::LAYOUT, &EagerPolicy);
            self.dirty.mark_with(p, dirty::DAMAGE, &EagerPolicy);
        }

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        // Drop the boxed policy now rather than when the slot is reused.
        self.layout[idx as usize] = None;
        self.free_list.push(idx);
        self.pending_removed.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::super::store::SceneTree;

    /// Builds `stage (shown) -> group -> actor` and returns the handles.
    fn shown_stage_tree() -> (SceneTree, super::ActorId, super::ActorId, super::ActorId) {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let group = tree.create_actor();
        let actor = tree.create_actor();
        tree.add_child(group, actor);
        tree.add_child(stage, group);
        (tree, stage, group, actor)
    }

    #[test]
    fn toplevel_maps_when_shown() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        assert!(!tree.is_visible(stage));
        assert!(!tree.is_mapped(stage));

        tree.show(stage);
        assert!(tree.is_visible(stage));
        assert!(tree.is_realized(stage));
        assert!(tree.is_mapped(stage));

        tree.hide(stage);
        assert!(!tree.is_mapped(stage));
        // Hiding unmaps but does not unrealize.
        assert!(tree.is_realized(stage));
    }

    #[test]
    fn attach_to_mapped_chain_realizes_and_maps() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);

        let actor = tree.create_actor();
        assert!(!tree.is_realized(actor));
        tree.add_child(stage, actor);
        // unrealized -> realized-unmapped -> mapped as one atomic step.
        assert!(tree.is_realized(actor));
        assert!(tree.is_mapped(actor));
    }

    #[test]
    fn detach_unmaps_but_keeps_realized() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let actor = tree.create_actor();
        tree.add_child(stage, actor);
        assert!(tree.is_mapped(actor));

        tree.remove_child(actor);
        assert!(!tree.is_mapped(actor));
        assert!(tree.is_realized(actor));
    }

    #[test]
    fn visibility_is_not_recursive() {
        // The literal scenario: stage, hidden group, shown actor.
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);
        let group = tree.create_actor();
        let actor = tree.create_actor();
        tree.hide(group);
        tree.show(actor);
        tree.add_child(group, actor);
        tree.add_child(stage, group);

        assert!(tree.is_visible(actor), "actor keeps its own visible flag");
        assert!(!tree.is_mapped(actor), "hidden ancestor blocks mapping");

        tree.show(group);
        assert!(tree.is_visible(actor));
        assert!(tree.is_mapped(actor));
    }

    #[test]
    fn showing_root_alone_does_not_map_through_hidden_group() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        let group = tree.create_actor();
        let actor = tree.create_actor();
        tree.hide(group);
        tree.show(actor);
        tree.add_child(group, actor);
        tree.add_child(stage, group);

        tree.show(stage);
        assert!(tree.is_mapped(stage));
        assert!(!tree.is_mapped(group));
        assert!(!tree.is_mapped(actor));
    }

    #[test]
    fn hiding_actor_directly_keeps_it_unmapped_when_group_shows() {
        let (mut tree, _stage, group, actor) = shown_stage_tree();
        tree.hide(group);
        tree.hide(actor);
        tree.show(group);
        assert!(tree.is_mapped(group));
        assert!(!tree.is_visible(actor));
        assert!(!tree.is_mapped(actor));
    }

    #[test]
    fn hide_container_preserves_child_flags() {
        let (mut tree, _stage, group, actor) = shown_stage_tree();
        assert!(tree.is_mapped(actor));

        tree.hide(group);
        // The child's own flag is untouched; only its mapped state changes.
        assert!(tree.is_visible(actor));
        assert!(!tree.is_mapped(actor));

        tree.show(group);
        assert!(tree.is_mapped(actor));
    }

    #[test]
    fn show_on_set_parent_default_and_explicit_override() {
        let mut tree = SceneTree::new();
        let stage = tree.create_toplevel();
        tree.show(stage);

        // Newly created, default-visible: attaching leaves it visible.
        let a = tree.create_actor();
        tree.add_child(stage, a);
        assert!(tree.is_visible(a));
        assert!(tree.is_mapped(a));

        // Explicitly hidden before attach: attaching must not show it.
        let b = tree.create_actor();
        tree.hide(b);
        tree.add_child(stage, b);
        assert!(!tree.is_visible(b));
        assert!(!tree.is_mapped(b));
    }

    #[test]
    fn realize_walks_up_not_down() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let child = tree.create_actor();
        let grandchild = tree.create_actor();
        tree.add_child(parent, child);
        tree.add_child(child, grandchild);

        tree.realize(child);
        assert!(tree.is_realized(parent), "ancestors are realized");
        assert!(tree.is_realized(child));
        assert!(
            !tree.is_realized(grandchild),
            "realize must not propagate to children"
        );
    }

    #[test]
    fn unrealize_recurses_into_children() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(parent, child);
        tree.realize(child);

        tree.unrealize(parent);
        assert!(!tree.is_realized(parent));
        assert!(!tree.is_realized(child));
    }

    #[test]
    fn destroy_cascades_bottom_up() {
        let (mut tree, stage, group, actor) = shown_stage_tree();
        assert!(tree.is_mapped(actor));

        tree.destroy_actor(group);

        assert!(!tree.is_alive(group));
        assert!(!tree.is_alive(actor));
        assert_eq!(tree.child_count(stage), 0);

        let damage = tree.take_frame_damage();
        let removed: Vec<u32> = damage.removed;
        assert!(removed.contains(&group.index()));
        assert!(removed.contains(&actor.index()));
    }

    #[test]
    fn mapped_ancestry_is_the_event_path() {
        let (mut tree, stage, group, actor) = shown_stage_tree();
        assert_eq!(
            tree.mapped_ancestry(actor),
            alloc::vec![stage, group, actor]
        );

        tree.hide(group);
        assert!(
            tree.mapped_ancestry(actor).is_empty(),
            "unmapped actors have no event path"
        );
    }

    #[test]
    fn destroy_detached_subtree() {
        let mut tree = SceneTree::new();
        let root = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(root, child);

        tree.destroy_actor(root);
        assert!(!tree.is_alive(root));
        assert!(!tree.is_alive(child));
    }
}
