// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-phase layout: preferred-size queries and allocation.
//!
//! The contract has two phases per actor:
//!
//! 1. **Query** — [`preferred_width`](SceneTree::preferred_width) /
//!    [`preferred_height`](SceneTree::preferred_height) return a
//!    [`SizeRequest`] for a candidate cross-axis size. Queries are
//!    idempotent and side-effect-free: repeated calls with the same input
//!    return the same pair, served from a per-actor memo that invalidating
//!    mutations clear.
//! 2. **Assign** — [`allocate`](SceneTree::allocate) gives the actor a final
//!    box (in parent coordinates), adjusts it for margins and alignment,
//!    and recurses parent-before-children: the actor's [`LayoutPolicy`]
//!    computes each child's box from the child's own preferred-size
//!    queries, and the engine assigns them.
//!
//! Allocation is stable: running the pass twice with no intervening
//! mutation produces bit-identical boxes, which the offscreen-redirect
//! cache validity check relies on. [`layout_root`](SceneTree::layout_root)
//! coalesces any number of queued relayout requests into one pass.
//!
//! Actors without a policy use fixed positioning: children are placed at
//! their fixed position with their natural size ([`FixedLayout`] is the
//! same behavior as an explicit policy). [`BinLayout`] hands every child
//! the full content box and lets per-child alignment place it.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use understory_dirty::EagerPolicy;

use crate::dirty;

use super::id::{ActorId, INVALID};
use super::store::SceneTree;

/// A minimum/natural size pair returned by preferred-size queries.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SizeRequest {
    /// The smallest size the actor can usefully be given.
    pub minimum: f64,
    /// The size the actor would take given unlimited space.
    pub natural: f64,
}

impl SizeRequest {
    /// A zero request.
    pub const ZERO: Self = Self {
        minimum: 0.0,
        natural: 0.0,
    };

    fn sanitize(mut self) -> Self {
        if self.minimum < 0.0 || self.natural < 0.0 {
            log::warn!(
                "negative size request (min {}, natural {}) clamped to zero",
                self.minimum,
                self.natural
            );
            self.minimum = self.minimum.max(0.0);
            self.natural = self.natural.max(0.0);
        }
        if self.natural < self.minimum {
            self.natural = self.minimum;
        }
        self
    }
}

/// Alignment of an actor inside a larger assigned box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActorAlign {
    /// Stretch to fill the whole box.
    #[default]
    Fill,
    /// Snap to the leading edge at natural size.
    Start,
    /// Center at natural size.
    Center,
    /// Snap to the trailing edge at natural size.
    End,
}

/// Per-actor alignment and expansion inputs consumed by the allocation
/// algorithm and by layout policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayoutHints {
    /// Horizontal alignment within the assigned box.
    pub x_align: ActorAlign,
    /// Vertical alignment within the assigned box.
    pub y_align: ActorAlign,
    /// Whether the actor wants extra horizontal space from its policy.
    pub x_expand: bool,
    /// Whether the actor wants extra vertical space from its policy.
    pub y_expand: bool,
}

/// Margins around an actor, inside the box its parent assigns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margins {
    /// Left margin.
    pub left: f64,
    /// Right margin.
    pub right: f64,
    /// Top margin.
    pub top: f64,
    /// Bottom margin.
    pub bottom: f64,
}

impl Margins {
    /// No margins.
    pub const ZERO: Self = Self {
        left: 0.0,
        right: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    /// Uniform margins on all four sides.
    #[must_use]
    pub const fn uniform(m: f64) -> Self {
        Self {
            left: m,
            right: m,
            top: m,
            bottom: m,
        }
    }
}

/// A box assignment for one child, produced by a [`LayoutPolicy`].
#[derive(Clone, Copy, Debug)]
pub struct ChildAllocation {
    /// The child being assigned.
    pub child: ActorId,
    /// Its box, in the parent's coordinate space.
    pub rect: Rect,
}

/// A layout manager for one actor's children.
///
/// Policies read the tree (including child preferred sizes) and produce box
/// assignments; the engine writes them and recurses. Implementations must
/// be deterministic for allocation stability.
pub trait LayoutPolicy: core::fmt::Debug {
    /// Returns the actor's preferred width for an optional candidate height.
    fn preferred_width(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        for_height: Option<f64>,
    ) -> SizeRequest;

    /// Returns the actor's preferred height for an optional candidate width.
    fn preferred_height(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        for_width: Option<f64>,
    ) -> SizeRequest;

    /// Computes a box for each child given the actor's content box
    /// (origin at zero, the actor's allocated size).
    fn allocate_children(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        content: Rect,
    ) -> Vec<ChildAllocation>;
}

/// Memoized preferred-size answers, keyed on the cross-axis input.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RequestMemo {
    width: Option<(Option<f64>, SizeRequest)>,
    height: Option<(Option<f64>, SizeRequest)>,
}

impl RequestMemo {
    pub(crate) fn clear(&mut self) {
        self.width = None;
        self.height = None;
    }
}

impl SceneTree {
    // -- Layout inputs --

    /// Sets or clears the layout policy governing the actor's children.
    pub fn set_layout(&mut self, id: ActorId, policy: Option<Box<dyn LayoutPolicy>>) {
        self.validate(id);
        self.layout[id.idx as usize] = policy;
        self.queue_relayout(id);
    }

    /// Sets the fixed position used by fixed positioning (no policy or
    /// [`FixedLayout`]).
    pub fn set_fixed_position(&mut self, id: ActorId, position: Option<Point>) {
        self.validate(id);
        if self.fixed_position[id.idx as usize] != position {
            self.fixed_position[id.idx as usize] = position;
            self.queue_relayout(id);
        }
    }

    /// Overrides the preferred size with an explicit request, or clears the
    /// override. Negative components are clamped to zero with a warning.
    pub fn set_size(&mut self, id: ActorId, size: Option<Size>) {
        self.validate(id);
        let size = size.map(|s| {
            if s.width < 0.0 || s.height < 0.0 {
                log::warn!("set_size: negative size request {s:?} clamped to zero");
                Size::new(s.width.max(0.0), s.height.max(0.0))
            } else {
                s
            }
        });
        if self.explicit_size[id.idx as usize] != size {
            self.explicit_size[id.idx as usize] = size;
            self.queue_relayout(id);
        }
    }

    /// Sets the natural size of the actor's content payload.
    pub fn set_content_size(&mut self, id: ActorId, size: Option<Size>) {
        self.validate(id);
        if self.content_size[id.idx as usize] != size {
            self.content_size[id.idx as usize] = size;
            self.queue_relayout(id);
        }
    }

    /// Sets the actor's margins.
    pub fn set_margins(&mut self, id: ActorId, margins: Margins) {
        self.validate(id);
        if self.margins[id.idx as usize] != margins {
            self.margins[id.idx as usize] = margins;
            self.queue_relayout(id);
        }
    }

    /// Sets the actor's alignment and expansion hints.
    pub fn set_hints(&mut self, id: ActorId, hints: LayoutHints) {
        self.validate(id);
        if self.hints[id.idx as usize] != hints {
            self.hints[id.idx as usize] = hints;
            self.queue_relayout(id);
        }
    }

    /// Returns the actor's alignment and expansion hints.
    #[must_use]
    pub fn hints(&self, id: ActorId) -> LayoutHints {
        self.validate(id);
        self.hints[id.idx as usize]
    }

    /// Returns the actor's margins.
    #[must_use]
    pub fn margins(&self, id: ActorId) -> Margins {
        self.validate(id);
        self.margins[id.idx as usize]
    }

    /// Returns the actor's fixed position, if set.
    #[must_use]
    pub fn fixed_position(&self, id: ActorId) -> Option<Point> {
        self.validate(id);
        self.fixed_position[id.idx as usize]
    }

    /// Requests a relayout of the actor and everything whose size depends
    /// on it. Repeated requests before the next pass coalesce.
    pub fn queue_relayout(&mut self, id: ActorId) {
        self.validate(id);
        self.allocation_valid[id.idx as usize] = false;
        self.dirty.mark_with(id.idx, dirty::LAYOUT, &EagerPolicy);
    }

    // -- Phase 1: preferred-size queries --

    /// Returns the preferred width for an optional candidate height.
    ///
    /// Idempotent: repeated queries with the same input return the same
    /// pair. The answer includes the actor's horizontal margins.
    pub fn preferred_width(&mut self, id: ActorId, for_height: Option<f64>) -> SizeRequest {
        self.validate(id);
        self.preferred_width_at(id.idx, for_height)
    }

    /// Returns the preferred height for an optional candidate width.
    pub fn preferred_height(&mut self, id: ActorId, for_width: Option<f64>) -> SizeRequest {
        self.validate(id);
        self.preferred_height_at(id.idx, for_width)
    }

    pub(crate) fn preferred_width_at(&mut self, idx: u32, for_height: Option<f64>) -> SizeRequest {
        let i = idx as usize;
        if let Some((key, memo)) = self.request_memo[i].width
            && key == for_height
        {
            return memo;
        }

        let base = if let Some(size) = self.explicit_size[i] {
            SizeRequest {
                minimum: size.width,
                natural: size.width,
            }
        } else if let Some(policy) = self.layout[i].take() {
            let id = self.id_at(idx);
            let request = policy.preferred_width(self, id, for_height);
            self.layout[i] = Some(policy);
            request
        } else if let Some(size) = self.content_size[i] {
            SizeRequest {
                minimum: 0.0,
                natural: size.width,
            }
        } else {
            self.fixed_extent(idx, true)
        };

        let m = self.margins[i];
        let mut request = base.sanitize();
        request.minimum += m.left + m.right;
        request.natural += m.left + m.right;

        self.request_memo[i].width = Some((for_height, request));
        request
    }

    pub(crate) fn preferred_height_at(&mut self, idx: u32, for_width: Option<f64>) -> SizeRequest {
        let i = idx as usize;
        if let Some((key, memo)) = self.request_memo[i].height
            && key == for_width
        {
            return memo;
        }

        let base = if let Some(size) = self.explicit_size[i] {
            SizeRequest {
                minimum: size.height,
                natural: size.height,
            }
        } else if let Some(policy) = self.layout[i].take() {
            let id = self.id_at(idx);
            let request = policy.preferred_height(self, id, for_width);
            self.layout[i] = Some(policy);
            request
        } else if let Some(size) = self.content_size[i] {
            SizeRequest {
                minimum: 0.0,
                natural: size.height,
            }
        } else {
            self.fixed_extent(idx, false)
        };

        let m = self.margins[i];
        let mut request = base.sanitize();
        request.minimum += m.top + m.bottom;
        request.natural += m.top + m.bottom;

        self.request_memo[i].height = Some((for_width, request));
        request
    }

    /// Natural extent of fixed-positioned children along one axis.
    fn fixed_extent(&mut self, idx: u32, horizontal: bool) -> SizeRequest {
        let mut extent = 0.0_f64;
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            if self.flags[child as usize].visible {
                let origin = self.fixed_position[child as usize].unwrap_or(Point::ZERO);
                let reach = if horizontal {
                    origin.x + self.preferred_width_at(child, None).natural
                } else {
                    origin.y + self.preferred_height_at(child, None).natural
                };
                extent = extent.max(reach);
            }
            child = next;
        }
        SizeRequest {
            minimum: extent,
            natural: extent,
        }
    }

    // -- Phase 2: allocation --

    /// Assigns a final box (in parent coordinates) to the actor and lays
    /// out its whole subtree, parent before children.
    pub fn allocate(&mut self, id: ActorId, rect: Rect) {
        self.validate(id);
        self.allocate_at(id.idx, rect);
    }

    /// Runs a full layout pass over `root` if one is needed.
    ///
    /// Drains the coalesced relayout requests; when any are pending (or the
    /// root has never been allocated), clears the affected preferred-size
    /// memos and allocates the subtree from `available`. Returns whether a
    /// pass ran.
    pub fn layout_root(&mut self, root: ActorId, available: Size) -> bool {
        self.validate(root);
        let pending: Vec<u32> = self
            .dirty
            .drain(dirty::LAYOUT)
            .affected()
            .deterministic()
            .run()
            .collect();

        let root_box = Rect::from_origin_size(Point::ZERO, available);
        let stale_root = !self.allocation_valid[root.idx as usize]
            || self.last_layout != Some((root.idx, available));
        if pending.is_empty() && !stale_root {
            return false;
        }
        self.last_layout = Some((root.idx, available));

        for idx in pending {
            if (idx as usize) < self.request_memo.len() {
                self.request_memo[idx as usize].clear();
            }
        }

        self.allocate_at(root.idx, root_box);
        true
    }

    pub(crate) fn allocate_at(&mut self, idx: u32, assigned: Rect) {
        let adjusted = self.adjust_allocation(idx, assigned);

        let i = idx as usize;
        let old = self.allocation[i];
        let was_valid = self.allocation_valid[i];
        self.allocation[i] = adjusted;
        self.allocation_valid[i] = true;

        let size_changed =
            !was_valid || old.width() != adjusted.width() || old.height() != adjusted.height();
        let origin_changed = old.x0 != adjusted.x0 || old.y0 != adjusted.y0;
        if size_changed {
            // The subtree renders differently at the new size, so the
            // actor's own cache is stale too.
            self.dirty.mark_with(idx, dirty::DAMAGE, &EagerPolicy);
        } else if origin_changed {
            self.damage_from_parent(idx);
        }

        let content = Rect::new(0.0, 0.0, adjusted.width(), adjusted.height());
        if let Some(policy) = self.layout[i].take() {
            let id = self.id_at(idx);
            let assignments = policy.allocate_children(self, id, content);
            self.layout[i] = Some(policy);
            for assignment in assignments {
                self.validate(assignment.child);
                self.allocate_at(assignment.child.idx, assignment.rect);
            }
        } else {
            let fixed = FixedLayout;
            let id = self.id_at(idx);
            for assignment in fixed.allocate_children(self, id, content) {
                self.allocate_at(assignment.child.idx, assignment.rect);
            }
        }
    }

    /// Shrinks the assigned box by margins and applies alignment when the
    /// actor does not fill its box.
    fn adjust_allocation(&mut self, idx: u32, assigned: Rect) -> Rect {
        let i = idx as usize;
        let m = self.margins[i];
        let mut r = Rect::new(
            assigned.x0 + m.left,
            assigned.y0 + m.top,
            (assigned.x1 - m.right).max(assigned.x0 + m.left),
            (assigned.y1 - m.bottom).max(assigned.y0 + m.top),
        );

        let hints = self.hints[i];
        if hints.x_align != ActorAlign::Fill {
            let natural = (self.preferred_width_at(idx, None).natural - m.left - m.right).max(0.0);
            if natural < r.width() {
                r = match hints.x_align {
                    ActorAlign::Start => Rect::new(r.x0, r.y0, r.x0 + natural, r.y1),
                    ActorAlign::Center => {
                        let x0 = r.x0 + (r.width() - natural) / 2.0;
                        Rect::new(x0, r.y0, x0 + natural, r.y1)
                    }
                    ActorAlign::End => Rect::new(r.x1 - natural, r.y0, r.x1, r.y1),
                    ActorAlign::Fill => r,
                };
            }
        }
        if hints.y_align != ActorAlign::Fill {
            let natural =
                (self.preferred_height_at(idx, Some(r.width())).natural - m.top - m.bottom)
                    .max(0.0);
            if natural < r.height() {
                r = match hints.y_align {
                    ActorAlign::Start => Rect::new(r.x0, r.y0, r.x1, r.y0 + natural),
                    ActorAlign::Center => {
                        let y0 = r.y0 + (r.height() - natural) / 2.0;
                        Rect::new(r.x0, y0, r.x1, y0 + natural)
                    }
                    ActorAlign::End => Rect::new(r.x0, r.y1 - natural, r.x1, r.y1),
                    ActorAlign::Fill => r,
                };
            }
        }
        r
    }
}

/// Fixed positioning: each child is placed at its fixed position (default
/// the origin) with its natural size.
///
/// This is also the behavior of an actor with no policy set.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedLayout;

impl LayoutPolicy for FixedLayout {
    fn preferred_width(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        _for_height: Option<f64>,
    ) -> SizeRequest {
        tree.fixed_extent(id.idx, true)
    }

    fn preferred_height(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        _for_width: Option<f64>,
    ) -> SizeRequest {
        tree.fixed_extent(id.idx, false)
    }

    fn allocate_children(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        _content: Rect,
    ) -> Vec<ChildAllocation> {
        let mut out = Vec::new();
        let mut child = tree.first_child[id.idx as usize];
        while child != INVALID {
            let next = tree.next_sibling[child as usize];
            let origin = tree.fixed_position[child as usize].unwrap_or(Point::ZERO);
            let width = tree.preferred_width_at(child, None).natural;
            let height = tree.preferred_height_at(child, Some(width)).natural;
            out.push(ChildAllocation {
                child: tree.id_at(child),
                rect: Rect::from_origin_size(origin, Size::new(width, height)),
            });
            child = next;
        }
        out
    }
}

/// Single-box layout: every child is handed the full content box, and the
/// child's own alignment hints place it within.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinLayout;

impl LayoutPolicy for BinLayout {
    fn preferred_width(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        for_height: Option<f64>,
    ) -> SizeRequest {
        let mut request = SizeRequest::ZERO;
        let mut child = tree.first_child[id.idx as usize];
        while child != INVALID {
            let next = tree.next_sibling[child as usize];
            if tree.flags[child as usize].visible {
                let r = tree.preferred_width_at(child, for_height);
                request.minimum = request.minimum.max(r.minimum);
                request.natural = request.natural.max(r.natural);
            }
            child = next;
        }
        request
    }

    fn preferred_height(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        for_width: Option<f64>,
    ) -> SizeRequest {
        let mut request = SizeRequest::ZERO;
        let mut child = tree.first_child[id.idx as usize];
        while child != INVALID {
            let next = tree.next_sibling[child as usize];
            if tree.flags[child as usize].visible {
                let r = tree.preferred_height_at(child, for_width);
                request.minimum = request.minimum.max(r.minimum);
                request.natural = request.natural.max(r.natural);
            }
            child = next;
        }
        request
    }

    fn allocate_children(
        &self,
        tree: &mut SceneTree,
        id: ActorId,
        content: Rect,
    ) -> Vec<ChildAllocation> {
        let mut out = Vec::new();
        let mut child = tree.first_child[id.idx as usize];
        while child != INVALID {
            let next = tree.next_sibling[child as usize];
            out.push(ChildAllocation {
                child: tree.id_at(child),
                rect: content,
            });
            child = next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use kurbo::{Point, Rect, Size};

    use super::super::store::SceneTree;
    use super::*;

    fn shown_stage(tree: &mut SceneTree) -> ActorId {
        let stage = tree.create_toplevel();
        tree.show(stage);
        stage
    }

    #[test]
    fn preferred_size_uses_content_size() {
        let mut tree = SceneTree::new();
        let a = tree.create_actor();
        tree.set_content_size(a, Some(Size::new(120.0, 40.0)));

        let w = tree.preferred_width(a, None);
        assert_eq!(w.minimum, 0.0);
        assert_eq!(w.natural, 120.0);
        let h = tree.preferred_height(a, Some(120.0));
        assert_eq!(h.natural, 40.0);
    }

    #[test]
    fn explicit_size_overrides_content() {
        let mut tree = SceneTree::new();
        let a = tree.create_actor();
        tree.set_content_size(a, Some(Size::new(120.0, 40.0)));
        tree.set_size(a, Some(Size::new(64.0, 64.0)));

        let w = tree.preferred_width(a, None);
        assert_eq!(w.minimum, 64.0);
        assert_eq!(w.natural, 64.0);
    }

    #[test]
    fn negative_size_request_is_clamped() {
        let mut tree = SceneTree::new();
        let a = tree.create_actor();
        tree.set_size(a, Some(Size::new(-5.0, 10.0)));
        let w = tree.preferred_width(a, None);
        assert_eq!(w.natural, 0.0);
    }

    #[test]
    fn queries_are_idempotent() {
        let mut tree = SceneTree::new();
        let bin = tree.create_actor();
        tree.set_layout(bin, Some(Box::new(BinLayout)));
        let child = tree.create_actor();
        tree.set_content_size(child, Some(Size::new(50.0, 20.0)));
        tree.add_child(bin, child);

        let first = tree.preferred_width(bin, None);
        let second = tree.preferred_width(bin, None);
        assert_eq!(first, second);
        assert_eq!(first.natural, 50.0);
    }

    #[test]
    fn memo_invalidates_on_content_change() {
        let mut tree = SceneTree::new();
        let stage = {
            let s = shown_stage(&mut tree);
            tree.set_layout(s, Some(Box::new(BinLayout)));
            s
        };
        let child = tree.create_actor();
        tree.set_content_size(child, Some(Size::new(50.0, 20.0)));
        tree.add_child(stage, child);
        assert!(tree.layout_root(stage, Size::new(200.0, 200.0)));

        tree.set_content_size(child, Some(Size::new(80.0, 20.0)));
        assert!(tree.layout_root(stage, Size::new(200.0, 200.0)));
        assert_eq!(tree.preferred_width(child, None).natural, 80.0);
    }

    #[test]
    fn margins_are_added_to_requests_and_deflate_boxes() {
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        tree.set_layout(stage, Some(Box::new(BinLayout)));
        let child = tree.create_actor();
        tree.set_content_size(child, Some(Size::new(50.0, 20.0)));
        tree.set_margins(child, Margins::uniform(10.0));
        tree.add_child(stage, child);

        assert_eq!(tree.preferred_width(stage, None).natural, 70.0);

        tree.layout_root(stage, Size::new(200.0, 100.0));
        assert_eq!(tree.allocation(child), Rect::new(10.0, 10.0, 190.0, 90.0));
    }

    #[test]
    fn alignment_positions_within_the_box() {
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        tree.set_layout(stage, Some(Box::new(BinLayout)));
        let child = tree.create_actor();
        tree.set_content_size(child, Some(Size::new(40.0, 40.0)));
        tree.set_hints(
            child,
            LayoutHints {
                x_align: ActorAlign::Center,
                y_align: ActorAlign::End,
                ..LayoutHints::default()
            },
        );
        tree.add_child(stage, child);

        tree.layout_root(stage, Size::new(100.0, 100.0));
        assert_eq!(tree.allocation(child), Rect::new(30.0, 60.0, 70.0, 100.0));
    }

    #[test]
    fn fill_alignment_takes_the_whole_box() {
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        tree.set_layout(stage, Some(Box::new(BinLayout)));
        let child = tree.create_actor();
        tree.set_content_size(child, Some(Size::new(40.0, 40.0)));
        tree.add_child(stage, child);

        tree.layout_root(stage, Size::new(100.0, 80.0));
        assert_eq!(tree.allocation(child), Rect::new(0.0, 0.0, 100.0, 80.0));
    }

    #[test]
    fn fixed_positioning_is_the_default() {
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        let a = tree.create_actor();
        let b = tree.create_actor();
        tree.set_fixed_position(a, Some(Point::new(10.0, 20.0)));
        tree.set_content_size(a, Some(Size::new(30.0, 30.0)));
        tree.set_fixed_position(b, Some(Point::new(100.0, 0.0)));
        tree.set_content_size(b, Some(Size::new(16.0, 8.0)));
        tree.add_child(stage, a);
        tree.add_child(stage, b);

        tree.layout_root(stage, Size::new(300.0, 300.0));
        assert_eq!(tree.allocation(a), Rect::new(10.0, 20.0, 40.0, 50.0));
        assert_eq!(tree.allocation(b), Rect::new(100.0, 0.0, 116.0, 8.0));
    }

    #[test]
    fn allocation_is_stable_across_passes() {
        // Running the pass twice with no intervening mutation must produce
        // bit-identical allocation boxes for every node.
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        tree.set_layout(stage, Some(Box::new(BinLayout)));
        let group = tree.create_actor();
        let a = tree.create_actor();
        let b = tree.create_actor();
        tree.set_content_size(a, Some(Size::new(33.3, 17.7)));
        tree.set_margins(a, Margins::uniform(3.25));
        tree.set_hints(
            a,
            LayoutHints {
                x_align: ActorAlign::Center,
                y_align: ActorAlign::Center,
                ..LayoutHints::default()
            },
        );
        tree.set_fixed_position(b, Some(Point::new(7.9, 11.3)));
        tree.set_content_size(b, Some(Size::new(5.1, 6.2)));
        tree.add_child(stage, group);
        tree.add_child(group, a);
        tree.add_child(group, b);

        tree.layout_root(stage, Size::new(640.0, 480.0));
        let first: Vec<Rect> = [stage, group, a, b]
            .iter()
            .map(|&id| tree.allocation(id))
            .collect();

        // Force a second full pass with no mutation in between.
        tree.queue_relayout(stage);
        tree.layout_root(stage, Size::new(640.0, 480.0));
        let second: Vec<Rect> = [stage, group, a, b]
            .iter()
            .map(|&id| tree.allocation(id))
            .collect();

        assert_eq!(first, second, "allocations must be bit-identical");
    }

    #[test]
    fn layout_root_coalesces_requests() {
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        let child = tree.create_actor();
        tree.add_child(stage, child);

        tree.queue_relayout(child);
        tree.queue_relayout(child);
        tree.queue_relayout(stage);
        assert!(tree.layout_root(stage, Size::new(100.0, 100.0)));
        // All requests were satisfied by the single pass.
        assert!(!tree.layout_root(stage, Size::new(100.0, 100.0)));
    }

    #[test]
    fn new_size_forces_a_pass() {
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        assert!(tree.layout_root(stage, Size::new(100.0, 100.0)));
        assert!(tree.layout_root(stage, Size::new(200.0, 100.0)));
        assert_eq!(
            tree.allocation(stage),
            Rect::new(0.0, 0.0, 200.0, 100.0)
        );
    }

    #[test]
    fn allocation_validity_window() {
        let mut tree = SceneTree::new();
        let stage = shown_stage(&mut tree);
        let child = tree.create_actor();
        tree.add_child(stage, child);
        assert!(!tree.allocation_valid(child));

        tree.layout_root(stage, Size::new(100.0, 100.0));
        assert!(tree.allocation_valid(child));

        tree.set_content_size(child, Some(Size::new(10.0, 10.0)));
        assert!(!tree.allocation_valid(child));
    }
}
