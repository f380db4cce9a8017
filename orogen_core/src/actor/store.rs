// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays actor storage with allocation, topology, and property
//! management.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::matrix::{InverseCache, Matrix};

use super::clip::ClipShape;
use super::id::{ActorId, INVALID, SurfaceId};
use super::layout::{LayoutHints, LayoutPolicy, Margins, RequestMemo};
use super::traverse::{Children, RawChildren};

/// Per-actor boolean flags.
///
/// `visible` is the caller-controlled intent; `mapped` and `realized` are
/// derived state maintained by the lifecycle walk. The flags are read
/// through [`SceneTree`] accessors and mutated only through lifecycle
/// methods, never directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorFlags {
    /// Whether the actor wants to be shown. Not recursive: a visible child
    /// of a hidden parent stays unmapped.
    pub visible: bool,
    /// Whether backend resources for this actor have been acquired.
    pub realized: bool,
    /// Whether the actor is actually being drawn: realized, visible, and on
    /// a visible-and-mapped ancestor chain rooted at a shown toplevel.
    pub mapped: bool,
    /// Whether the actor participates in reactive picking.
    pub reactive: bool,
    /// Whether this actor anchors a mapped chain (a stage).
    pub toplevel: bool,
    /// Whether painting clips children to the allocation box.
    pub clip_to_allocation: bool,
    pub(crate) show_on_set_parent: bool,
}

impl ActorFlags {
    pub(crate) const fn new(toplevel: bool) -> Self {
        Self {
            // Toplevels start hidden and must be shown explicitly; bare
            // actors default to visible so that attaching them to a mapped
            // parent shows them (show-on-set-parent).
            visible: !toplevel,
            realized: false,
            mapped: false,
            reactive: false,
            toplevel,
            clip_to_allocation: false,
            show_on_set_parent: !toplevel,
        }
    }
}

/// When to redirect a subtree's painting into an offscreen cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RedirectPolicy {
    /// Never redirect; always paint directly into the current target.
    Never,
    /// Always paint through the offscreen cache.
    Always,
    /// Redirect only when the paint opacity is below 255 *and* the subtree
    /// has overlapping children. Non-overlapping children blend the same
    /// per-child as they would as a flattened group, so redirection is
    /// skipped as an optimization.
    #[default]
    AutomaticForOpacity,
}

/// Struct-of-arrays storage for all actors of one compositor context.
///
/// Actors are addressed by [`ActorId`] handles. Internally, each actor
/// occupies a slot in parallel arrays. Destroyed actors are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// There is no process-wide default tree: every stage owns its own
/// `SceneTree`, and tests construct one per test.
#[derive(Debug)]
pub struct SceneTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Flags and paint properties --
    pub(crate) flags: Vec<ActorFlags>,
    pub(crate) opacity: Vec<u8>,
    pub(crate) redirect: Vec<RedirectPolicy>,
    pub(crate) overlaps_override: Vec<Option<bool>>,
    pub(crate) clip: Vec<Option<ClipShape>>,
    pub(crate) content: Vec<Option<SurfaceId>>,

    // -- Geometry (layout inputs) --
    pub(crate) fixed_position: Vec<Option<Point>>,
    pub(crate) explicit_size: Vec<Option<Size>>,
    pub(crate) content_size: Vec<Option<Size>>,
    pub(crate) margins: Vec<Margins>,
    pub(crate) hints: Vec<LayoutHints>,
    pub(crate) layout: Vec<Option<Box<dyn LayoutPolicy>>>,

    // -- Geometry (layout outputs) --
    pub(crate) allocation: Vec<Rect>,
    pub(crate) allocation_valid: Vec<bool>,
    pub(crate) request_memo: Vec<RequestMemo>,
    pub(crate) last_layout: Option<(u32, Size)>,

    // -- Local transform additions --
    pub(crate) translation: Vec<Vec2>,
    pub(crate) rotation_z: Vec<f32>,
    pub(crate) scale: Vec<(f32, f32)>,
    pub(crate) pivot: Vec<(f32, f32)>,

    // -- Derived-transform memo --
    pub(crate) world_inverse: Vec<InverseCache>,

    // -- Allocation of slots --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Creates an empty scene tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            flags: Vec::new(),
            opacity: Vec::new(),
            redirect: Vec::new(),
            overlaps_override: Vec::new(),
            clip: Vec::new(),
            content: Vec::new(),
            fixed_position: Vec::new(),
            explicit_size: Vec::new(),
            content_size: Vec::new(),
            margins: Vec::new(),
            hints: Vec::new(),
            layout: Vec::new(),
            allocation: Vec::new(),
            allocation_valid: Vec::new(),
            request_memo: Vec::new(),
            last_layout: None,
            translation: Vec::new(),
            rotation_z: Vec::new(),
            scale: Vec::new(),
            pivot: Vec::new(),
            world_inverse: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Slot allocation --

    /// Creates a new detached actor and returns its handle.
    ///
    /// The actor starts visible, unrealized, unmapped, fully opaque, with no
    /// parent, no content, and the default redirect policy.
    pub fn create_actor(&mut self) -> ActorId {
        self.create_with_flags(ActorFlags::new(false))
    }

    /// Creates a new toplevel actor (a stage root).
    ///
    /// Toplevels anchor the mapped chain: they become mapped when shown, and
    /// their descendants can only be mapped underneath a mapped toplevel.
    /// Unlike bare actors they start hidden and must be shown explicitly.
    pub fn create_toplevel(&mut self) -> ActorId {
        self.create_with_flags(ActorFlags::new(true))
    }

    fn create_with_flags(&mut self, flags: ActorFlags) -> ActorId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.flags[i] = flags;
            self.opacity[i] = 255;
            self.redirect[i] = RedirectPolicy::default();
            self.overlaps_override[i] = None;
            self.clip[i] = None;
            self.content[i] = None;
            self.fixed_position[i] = None;
            self.explicit_size[i] = None;
            self.content_size[i] = None;
            self.margins[i] = Margins::ZERO;
            self.hints[i] = LayoutHints::default();
            self.layout[i] = None;
            self.allocation[i] = Rect::ZERO;
            self.allocation_valid[i] = false;
            self.request_memo[i] = RequestMemo::default();
            self.translation[i] = Vec2::ZERO;
            self.rotation_z[i] = 0.0;
            self.scale[i] = (1.0, 1.0);
            self.pivot[i] = (0.0, 0.0);
            self.world_inverse[i] = InverseCache::default();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.flags.push(flags);
            self.opacity.push(255);
            self.redirect.push(RedirectPolicy::default());
            self.overlaps_override.push(None);
            self.clip.push(None);
            self.content.push(None);
            self.fixed_position.push(None);
            self.explicit_size.push(None);
            self.content_size.push(None);
            self.margins.push(Margins::ZERO);
            self.hints.push(LayoutHints::default());
            self.layout.push(None);
            self.allocation.push(Rect::ZERO);
            self.allocation_valid.push(false);
            self.request_memo.push(RequestMemo::default());
            self.translation.push(Vec2::ZERO);
            self.rotation_z.push(0.0);
            self.scale.push((1.0, 1.0));
            self.pivot.push((0.0, 0.0));
            self.world_inverse.push(InverseCache::default());
            self.generation.push(0);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        ActorId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns whether the given handle refers to a live actor.
    #[must_use]
    pub fn is_alive(&self, id: ActorId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology --

    /// Adds `child` as the last child of `parent` (topmost in paint order).
    ///
    /// If the child still has its show-on-set-parent default (no explicit
    /// `show`/`hide` call since creation), attaching makes it visible. When
    /// the parent chain is visible and mapped and the child is visible, the
    /// child's subtree is realized and mapped as part of this call.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: ActorId, child: ActorId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.link_last(p, c);

        // Ancestor-propagating edges: the parent's preferred size and any
        // cached subtree image now depend on this child.
        let _ = self.dirty.add_dependency(p, c, dirty::LAYOUT);
        let _ = self.dirty.add_dependency(p, c, dirty::DAMAGE);

        if self.flags[c as usize].show_on_set_parent {
            self.flags[c as usize].visible = true;
        }

        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark_with(p, dirty::LAYOUT, &EagerPolicy);
        self.dirty.mark_with(p, dirty::DAMAGE, &EagerPolicy);
        self.update_map_state(c);
    }

    /// Removes `child` from its current parent.
    ///
    /// The child's subtree leaves the mapped set but stays realized; its
    /// allocation becomes invalid until the next layout under a new parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the actor has no parent.
    pub fn remove_child(&mut self, child: ActorId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "actor has no parent");

        let p = self.parent[c as usize];
        self.set_mapped_recursive(c, false);
        self.unlink_from_parent(c);
        self.allocation_valid[c as usize] = false;

        self.dirty.remove_dependency(p, c, dirty::LAYOUT);
        self.dirty.remove_dependency(p, c, dirty::DAMAGE);

        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark_with(p, dirty::LAYOUT, &EagerPolicy);
        self.dirty.mark_with(p, dirty::DAMAGE, &EagerPolicy);
    }

    /// Moves `child` to be a child of `new_parent`, detaching it first if
    /// needed.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: ActorId, new_parent: ActorId) {
        self.validate(child);
        self.validate(new_parent);

        if self.parent[child.idx as usize] != INVALID {
            self.remove_child(child);
        }
        self.add_child(new_parent, child);
    }

    /// Inserts `child` before `sibling` in the sibling (paint) order.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or
    /// `sibling` has no parent.
    pub fn insert_before(&mut self, child: ActorId, sibling: ActorId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(p, c, dirty::LAYOUT);
        let _ = self.dirty.add_dependency(p, c, dirty::DAMAGE);

        if self.flags[c as usize].show_on_set_parent {
            self.flags[c as usize].visible = true;
        }

        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark_with(p, dirty::LAYOUT, &EagerPolicy);
        self.dirty.mark_with(p, dirty::DAMAGE, &EagerPolicy);
        self.update_map_state(c);
    }

    /// Moves `child` directly above `sibling` in the paint order, or to the
    /// top if `sibling` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, the actors are not siblings, or `child`
    /// has no parent.
    pub fn set_child_above_sibling(&mut self, child: ActorId, sibling: Option<ActorId>) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "actor has no parent");

        if let Some(sibling) = sibling {
            self.validate(sibling);
            assert!(
                self.parent[sibling.idx as usize] == p,
                "actors are not siblings"
            );
            if sibling.idx == c {
                return;
            }
            self.unlink_sibling(c);
            // Splice after `sibling`.
            let s = sibling.idx;
            let next = self.next_sibling[s as usize];
            self.next_sibling[s as usize] = c;
            self.prev_sibling[c as usize] = s;
            self.next_sibling[c as usize] = next;
            if next != INVALID {
                self.prev_sibling[next as usize] = c;
            }
        } else {
            if self.next_sibling[c as usize] == INVALID {
                return;
            }
            self.unlink_sibling(c);
            self.link_last(p, c);
        }

        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark_with(p, dirty::DAMAGE, &EagerPolicy);
    }

    /// Returns the parent of an actor, if any.
    #[must_use]
    pub fn parent(&self, id: ActorId) -> Option<ActorId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| ActorId {
            idx: p,
            generation: self.generation[p as usize],
        })
    }

    /// Returns an iterator over the direct children of an actor, bottom to
    /// top in paint order.
    #[must_use]
    pub fn children(&self, id: ActorId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn child_count(&self, id: ActorId) -> usize {
        self.children(id).count()
    }

    // -- Property setters (auto-mark dirty) --

    /// Sets the actor's opacity (0 = fully transparent, 255 = opaque).
    ///
    /// Damages ancestors only: an offscreen cache held by this actor stays
    /// valid, because the cached image is recomposited with the new opacity.
    pub fn set_opacity(&mut self, id: ActorId, opacity: u8) {
        self.validate(id);
        if self.opacity[id.idx as usize] != opacity {
            self.opacity[id.idx as usize] = opacity;
            self.damage_from_parent(id.idx);
        }
    }

    /// Sets the z-rotation in degrees, applied about the pivot point.
    pub fn set_rotation(&mut self, id: ActorId, degrees: f32) {
        self.validate(id);
        if self.rotation_z[id.idx as usize] != degrees {
            self.rotation_z[id.idx as usize] = degrees;
            self.damage_from_parent(id.idx);
        }
    }

    /// Sets the scale factors, applied about the pivot point.
    pub fn set_scale(&mut self, id: ActorId, sx: f32, sy: f32) {
        self.validate(id);
        if self.scale[id.idx as usize] != (sx, sy) {
            self.scale[id.idx as usize] = (sx, sy);
            self.damage_from_parent(id.idx);
        }
    }

    /// Sets the pivot point as a fraction of the allocation (0,0 = top
    /// left, 1,1 = bottom right).
    pub fn set_pivot(&mut self, id: ActorId, px: f32, py: f32) {
        self.validate(id);
        if self.pivot[id.idx as usize] != (px, py) {
            self.pivot[id.idx as usize] = (px, py);
            self.damage_from_parent(id.idx);
        }
    }

    /// Sets an extra translation applied after the allocation origin.
    pub fn set_translation(&mut self, id: ActorId, translation: Vec2) {
        self.validate(id);
        if self.translation[id.idx as usize] != translation {
            self.translation[id.idx as usize] = translation;
            self.damage_from_parent(id.idx);
        }
    }

    /// Sets the clip shape, in actor-local coordinates.
    pub fn set_clip(&mut self, id: ActorId, clip: Option<ClipShape>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.dirty.mark_with(id.idx, dirty::DAMAGE, &EagerPolicy);
    }

    /// Sets whether painting clips children to the allocation box.
    pub fn set_clip_to_allocation(&mut self, id: ActorId, clip: bool) {
        self.validate(id);
        if self.flags[id.idx as usize].clip_to_allocation != clip {
            self.flags[id.idx as usize].clip_to_allocation = clip;
            self.dirty.mark_with(id.idx, dirty::DAMAGE, &EagerPolicy);
        }
    }

    /// Sets the content surface presented inside the allocation.
    ///
    /// This is the asset-delivery entry point: a decode worker hands its
    /// result to the main thread, which calls this if the actor is still
    /// alive. The actor's subtree is damaged, so the next paint repaints it.
    pub fn set_content(&mut self, id: ActorId, content: Option<SurfaceId>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
        self.dirty.mark_with(id.idx, dirty::DAMAGE, &EagerPolicy);
    }

    /// Sets the offscreen-redirect policy.
    pub fn set_redirect(&mut self, id: ActorId, policy: RedirectPolicy) {
        self.validate(id);
        if self.redirect[id.idx as usize] != policy {
            self.redirect[id.idx as usize] = policy;
            self.dirty.mark_with(id.idx, dirty::DAMAGE, &EagerPolicy);
        }
    }

    /// Overrides the computed child-overlap predicate, or restores the
    /// computed value with `None`.
    pub fn set_overlaps_override(&mut self, id: ActorId, overlaps: Option<bool>) {
        self.validate(id);
        self.overlaps_override[id.idx as usize] = overlaps;
    }

    /// Sets whether the actor is a reactive pick target.
    pub fn set_reactive(&mut self, id: ActorId, reactive: bool) {
        self.validate(id);
        self.flags[id.idx as usize].reactive = reactive;
    }

    /// Requests a repaint of the actor's subtree.
    ///
    /// Repeated requests before the next paint pass coalesce. Every
    /// offscreen cache containing this subtree (its own and any
    /// ancestor's) is invalidated.
    pub fn queue_redraw(&mut self, id: ActorId) {
        self.validate(id);
        self.dirty.mark_with(id.idx, dirty::DAMAGE, &EagerPolicy);
    }

    // -- Read accessors (handle-validated) --

    /// Returns the actor's flags.
    #[must_use]
    pub fn flags(&self, id: ActorId) -> ActorFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns whether the actor's visibility flag is set.
    #[must_use]
    pub fn is_visible(&self, id: ActorId) -> bool {
        self.flags(id).visible
    }

    /// Returns whether the actor is mapped (actually being drawn).
    #[must_use]
    pub fn is_mapped(&self, id: ActorId) -> bool {
        self.flags(id).mapped
    }

    /// Returns whether the actor is realized.
    #[must_use]
    pub fn is_realized(&self, id: ActorId) -> bool {
        self.flags(id).realized
    }

    /// Returns the actor's own opacity.
    #[must_use]
    pub fn opacity(&self, id: ActorId) -> u8 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the allocation box computed by the last layout pass.
    ///
    /// Only meaningful while the allocation is valid, i.e. between a layout
    /// pass and the next invalidating mutation.
    #[must_use]
    pub fn allocation(&self, id: ActorId) -> Rect {
        self.validate(id);
        self.allocation[id.idx as usize]
    }

    /// Returns whether the allocation box is current.
    #[must_use]
    pub fn allocation_valid(&self, id: ActorId) -> bool {
        self.validate(id);
        self.allocation_valid[id.idx as usize]
    }

    /// Returns the content surface, if any.
    #[must_use]
    pub fn content(&self, id: ActorId) -> Option<SurfaceId> {
        self.validate(id);
        self.content[id.idx as usize]
    }

    /// Returns the offscreen-redirect policy.
    #[must_use]
    pub fn redirect(&self, id: ActorId) -> RedirectPolicy {
        self.validate(id);
        self.redirect[id.idx as usize]
    }

    /// Returns the clip shape, if any.
    #[must_use]
    pub fn clip(&self, id: ActorId) -> Option<ClipShape> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns whether the subtree's direct children overlap.
    ///
    /// Uses the explicit override when set, else tests every pair of
    /// visible children's allocation boxes. Meaningful after a layout pass.
    #[must_use]
    pub fn has_overlaps(&self, id: ActorId) -> bool {
        self.validate(id);
        self.has_overlaps_at(id.idx)
    }

    // -- Transform composition --

    /// Returns the actor's local transform relative to its parent.
    ///
    /// Composed as: translation to the allocation origin (plus any extra
    /// translation), then pivot-relative rotation and scale.
    #[must_use]
    pub fn local_matrix(&self, id: ActorId) -> Matrix {
        self.validate(id);
        self.local_matrix_at(id.idx)
    }

    /// Returns the actor's accumulated transform relative to the stage.
    #[must_use]
    pub fn world_matrix(&self, id: ActorId) -> Matrix {
        self.validate(id);
        let mut chain = Vec::new();
        let mut idx = id.idx;
        while idx != INVALID {
            chain.push(idx);
            idx = self.parent[idx as usize];
        }

        let mut world = Matrix::IDENTITY;
        for &node in chain.iter().rev() {
            world = Matrix::multiply(&world, &self.local_matrix_at(node));
        }
        world
    }

    /// Maps a point in stage coordinates into the actor's local space.
    ///
    /// Returns `None` when the accumulated transform is singular (e.g. a
    /// zero scale anywhere on the ancestor chain). The world-transform
    /// inverse is memoized per actor and recomputed only when the world
    /// transform actually changed.
    #[must_use]
    pub fn transform_stage_point(&mut self, id: ActorId, point: Point) -> Option<Point> {
        let world = self.world_matrix(id);
        let memo = &mut self.world_inverse[id.idx as usize];
        if memo.matrix() != world {
            memo.set(world);
        }
        let inverse = memo.inverse()?;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "stage coordinates fit comfortably in f32"
        )]
        let (x, y) = inverse.transform_point_2d(point.x as f32, point.y as f32);
        Some(Point::new(f64::from(x), f64::from(y)))
    }

    /// Returns the chain of actors from the root down to `id` inclusive,
    /// or an empty vector when `id` is not mapped.
    ///
    /// This is the path the input dispatcher forwards key and pointer
    /// events along (capture from the root, bubble back up).
    #[must_use]
    pub fn mapped_ancestry(&self, id: ActorId) -> Vec<ActorId> {
        self.validate(id);
        if !self.flags[id.idx as usize].mapped {
            return Vec::new();
        }
        let mut chain = Vec::new();
        let mut idx = id.idx;
        while idx != INVALID {
            chain.push(ActorId {
                idx,
                generation: self.generation[idx as usize],
            });
            idx = self.parent[idx as usize];
        }
        chain.reverse();
        chain
    }

    // -- Raw-index accessors for render traversals --
    //
    // These accept raw slot indices (as found in `FrameDamage` or a paint
    // recursion) rather than `ActorId` handles, skipping generation
    // validation. Only use with indices observed during the current pass.

    /// Returns the number of slots (the high-water mark).
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.len
    }

    /// Returns the handle currently occupying raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> ActorId {
        assert!(idx < self.len, "slot index {idx} out of range");
        ActorId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the flags at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn flags_at(&self, idx: u32) -> ActorFlags {
        assert!(idx < self.len, "slot index {idx} out of range");
        self.flags[idx as usize]
    }

    /// Returns the opacity at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn opacity_at(&self, idx: u32) -> u8 {
        assert!(idx < self.len, "slot index {idx} out of range");
        self.opacity[idx as usize]
    }

    /// Returns the allocation at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn allocation_at(&self, idx: u32) -> Rect {
        assert!(idx < self.len, "slot index {idx} out of range");
        self.allocation[idx as usize]
    }

    /// Returns the redirect policy at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn redirect_at(&self, idx: u32) -> RedirectPolicy {
        assert!(idx < self.len, "slot index {idx} out of range");
        self.redirect[idx as usize]
    }

    /// Returns the clip shape at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn clip_at(&self, idx: u32) -> Option<ClipShape> {
        assert!(idx < self.len, "slot index {idx} out of range");
        self.clip[idx as usize]
    }

    /// Returns the content surface at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn content_at(&self, idx: u32) -> Option<SurfaceId> {
        assert!(idx < self.len, "slot index {idx} out of range");
        self.content[idx as usize]
    }

    /// Returns an iterator over raw child slot indices at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn children_at(&self, idx: u32) -> RawChildren<'_> {
        assert!(idx < self.len, "slot index {idx} out of range");
        RawChildren::new(self, self.first_child[idx as usize])
    }

    /// Returns the local transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn local_matrix_at(&self, idx: u32) -> Matrix {
        assert!(idx < self.len, "slot index {idx} out of range");
        let i = idx as usize;
        let alloc = self.allocation[i];
        let translation = self.translation[i];
        #[expect(
            clippy::cast_possible_truncation,
            reason = "allocation coordinates fit comfortably in f32"
        )]
        let (ox, oy) = (
            (alloc.x0 + translation.x) as f32,
            (alloc.y0 + translation.y) as f32,
        );

        let mut m = Matrix::from_translation(ox, oy, 0.0);

        let rotation = self.rotation_z[i];
        let (sx, sy) = self.scale[i];
        if rotation != 0.0 || (sx, sy) != (1.0, 1.0) {
            let (pfx, pfy) = self.pivot[i];
            #[expect(
                clippy::cast_possible_truncation,
                reason = "allocation coordinates fit comfortably in f32"
            )]
            let (px, py) = (
                (alloc.width() as f32) * pfx,
                (alloc.height() as f32) * pfy,
            );
            m.translate(px, py, 0.0);
            if rotation != 0.0 {
                m.rotate(rotation, 0.0, 0.0, 1.0);
            }
            if (sx, sy) != (1.0, 1.0) {
                m.scale(sx, sy, 1.0);
            }
            m.translate(-px, -py, 0.0);
        }
        m
    }

    /// Returns whether the children at raw slot `idx` overlap.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= slot_count()`.
    #[must_use]
    pub fn has_overlaps_at(&self, idx: u32) -> bool {
        assert!(idx < self.len, "slot index {idx} out of range");
        if let Some(overlaps) = self.overlaps_override[idx as usize] {
            return overlaps;
        }

        let mut boxes: Vec<Rect> = Vec::new();
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            if self.flags[child as usize].visible {
                let b = self.allocation[child as usize];
                for other in &boxes {
                    if rects_overlap(*other, b) {
                        return true;
                    }
                }
                boxes.push(b);
            }
            child = self.next_sibling[child as usize];
        }
        false
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ActorId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ActorId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Marks DAMAGE starting at the parent, leaving the actor's own
    /// offscreen cache valid.
    pub(crate) fn damage_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if p != INVALID {
            self.dirty.mark_with(p, dirty::DAMAGE, &EagerPolicy);
        }
    }

    /// Links `c` as the last child of `p`.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from the sibling list without clearing its parent.
    fn unlink_sibling(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Removes `idx` from its parent's child list.
    pub(crate) fn unlink_from_parent(&mut self, idx: u32) {
        self.unlink_sibling(idx);
        self.parent[idx as usize] = INVALID;
    }
}

pub(crate) fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    #[cfg(not(feature = "std"))]
    use kurbo::common::FloatFuncs as _;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut tree = SceneTree::new();
        let id = tree.create_actor();
        assert!(tree.is_alive(id));
        tree.destroy_actor(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = SceneTree::new();
        let id1 = tree.create_actor();
        tree.destroy_actor(id1);
        let id2 = tree.create_actor();
        // id2 reuses the same slot but has a different generation.
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn add_child_and_query() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let child1 = tree.create_actor();
        let child2 = tree.create_actor();

        tree.add_child(parent, child1);
        tree.add_child(parent, child2);

        assert_eq!(tree.parent(child1), Some(parent));
        assert_eq!(tree.parent(child2), Some(parent));

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn remove_child_detaches() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let child = tree.create_actor();

        tree.add_child(parent, child);
        tree.remove_child(child);
        assert_eq!(tree.parent(child), None);
        assert!(tree.children(parent).next().is_none());
    }

    #[test]
    fn insert_before_orders_siblings() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let a = tree.create_actor();
        let b = tree.create_actor();
        let c = tree.create_actor();

        tree.add_child(parent, a);
        tree.add_child(parent, c);
        tree.insert_before(b, c);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn set_child_above_sibling_reorders() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let a = tree.create_actor();
        let b = tree.create_actor();
        let c = tree.create_actor();
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);

        tree.set_child_above_sibling(a, None);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![b, c, a]);

        tree.set_child_above_sibling(b, Some(c));
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![c, b, a]);
    }

    #[test]
    fn reparent_moves_subtree() {
        let mut tree = SceneTree::new();
        let p1 = tree.create_actor();
        let p2 = tree.create_actor();
        let child = tree.create_actor();

        tree.add_child(p1, child);
        tree.reparent(child, p2);
        assert_eq!(tree.parent(child), Some(p2));
        assert!(tree.children(p1).next().is_none());
    }

    #[test]
    #[should_panic(expected = "stale ActorId")]
    fn stale_handle_panics_on_accessor() {
        let mut tree = SceneTree::new();
        let id = tree.create_actor();
        tree.destroy_actor(id);
        let _ = tree.opacity(id);
    }

    #[test]
    #[should_panic(expected = "stale ActorId")]
    fn stale_handle_panics_on_setter() {
        let mut tree = SceneTree::new();
        let id = tree.create_actor();
        tree.destroy_actor(id);
        tree.set_opacity(id, 0);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_parent_panics() {
        let mut tree = SceneTree::new();
        let p1 = tree.create_actor();
        let p2 = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(p1, child);
        tree.add_child(p2, child);
    }

    #[test]
    fn local_matrix_places_allocation_origin() {
        let mut tree = SceneTree::new();
        let id = tree.create_actor();
        tree.allocation[id.idx as usize] = Rect::new(10.0, 20.0, 110.0, 70.0);
        let m = tree.local_matrix(id);
        let (x, y) = m.transform_point_2d(0.0, 0.0);
        assert_eq!((x, y), (10.0, 20.0));
    }

    #[test]
    fn pivot_scale_keeps_center_fixed() {
        let mut tree = SceneTree::new();
        let id = tree.create_actor();
        tree.allocation[id.idx as usize] = Rect::new(0.0, 0.0, 100.0, 100.0);
        tree.set_pivot(id, 0.5, 0.5);
        tree.set_scale(id, 2.0, 2.0);
        let m = tree.local_matrix(id);
        // The pivot (allocation center) must not move under scaling.
        let (cx, cy) = m.transform_point_2d(50.0, 50.0);
        assert!((cx - 50.0).abs() < 1.0e-4);
        assert!((cy - 50.0).abs() < 1.0e-4);
        // A corner moves away from the pivot.
        let (x, y) = m.transform_point_2d(0.0, 0.0);
        assert!((x + 50.0).abs() < 1.0e-4);
        assert!((y + 50.0).abs() < 1.0e-4);
    }

    #[test]
    fn world_matrix_composes_ancestors() {
        let mut tree = SceneTree::new();
        let root = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(root, child);
        tree.allocation[root.idx as usize] = Rect::new(5.0, 5.0, 105.0, 105.0);
        tree.allocation[child.idx as usize] = Rect::new(10.0, 0.0, 50.0, 40.0);

        let world = tree.world_matrix(child);
        let (x, y) = world.transform_point_2d(0.0, 0.0);
        assert_eq!((x, y), (15.0, 5.0));
    }

    #[test]
    fn transform_stage_point_inverts_world() {
        let mut tree = SceneTree::new();
        let root = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(root, child);
        tree.allocation[root.idx as usize] = Rect::new(0.0, 0.0, 200.0, 200.0);
        tree.allocation[child.idx as usize] = Rect::new(30.0, 40.0, 130.0, 140.0);

        let local = tree
            .transform_stage_point(child, Point::new(35.0, 47.0))
            .expect("world transform is invertible");
        assert!((local.x - 5.0).abs() < 1.0e-3);
        assert!((local.y - 7.0).abs() < 1.0e-3);
    }

    #[test]
    fn transform_stage_point_detects_singular_transform() {
        let mut tree = SceneTree::new();
        let id = tree.create_actor();
        tree.set_scale(id, 0.0, 1.0);
        assert!(tree.transform_stage_point(id, Point::ZERO).is_none());
    }

    #[test]
    fn overlap_computation_and_override() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let a = tree.create_actor();
        let b = tree.create_actor();
        tree.add_child(parent, a);
        tree.add_child(parent, b);

        tree.allocation[a.idx as usize] = Rect::new(0.0, 0.0, 50.0, 50.0);
        tree.allocation[b.idx as usize] = Rect::new(60.0, 0.0, 110.0, 50.0);
        assert!(!tree.has_overlaps(parent));

        tree.allocation[b.idx as usize] = Rect::new(40.0, 0.0, 90.0, 50.0);
        assert!(tree.has_overlaps(parent));

        tree.set_overlaps_override(parent, Some(false));
        assert!(!tree.has_overlaps(parent));
        tree.set_overlaps_override(parent, None);
        assert!(tree.has_overlaps(parent));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let mut tree = SceneTree::new();
        let parent = tree.create_actor();
        let a = tree.create_actor();
        let b = tree.create_actor();
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.allocation[a.idx as usize] = Rect::new(0.0, 0.0, 50.0, 50.0);
        tree.allocation[b.idx as usize] = Rect::new(50.0, 0.0, 100.0, 50.0);
        assert!(!tree.has_overlaps(parent));
    }
}
