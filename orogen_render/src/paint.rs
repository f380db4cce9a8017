// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositor traversal engine: paint and pick passes.
//!
//! [`PaintEngine::paint`] draws every mapped, non-zero-opacity node of a
//! tree in back-to-front order. The traversal keeps an explicit transform
//! stack and clip stack whose pushes and pops exactly mirror the GPU-side
//! stacks, so sibling subtrees never observe each other's state.
//!
//! Before descending into a node's children, the engine decides whether to
//! paint directly or to redirect the subtree into the node's offscreen
//! cache and composite the cached texture with the node's paint opacity
//! (see [`RedirectPolicy`] and [`crate::offscreen`]). Reusing a valid cache
//! issues zero paint calls to the cached subtree; filling it issues exactly
//! one per node. When the backend cannot provide an offscreen target the
//! engine falls back to direct painting and retries next pass.
//!
//! [`PaintEngine::pick`] is the parallel hit-testing traversal: eligible
//! nodes paint flat id colors into a throwaway offscreen buffer, the pixel
//! under the query point is read back, and the decoded id resolves through
//! the engine's [`IdPool`] to an actor. Picking never touches the caches
//! the normal paint uses.

use alloc::boxed::Box;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Size};
use orogen_core::actor::{ActorId, ClipShape, FrameDamage, RedirectPolicy, SceneTree};
use orogen_core::id_pool::IdPool;
use orogen_core::matrix::Matrix;
#[cfg(feature = "trace-rich")]
use orogen_core::trace::{CacheEvent, NodeCacheEvent, NodePaintedEvent};
use orogen_core::trace::{
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, PickResultEvent, Tracer,
};

use crate::gpu::Gpu;
use crate::offscreen::{NodeCache, cache_pixel_size};
use crate::painter::{ActorPaint, Effect};
use crate::pick::{MAX_PICK_ID, PICK_BACKGROUND, decode_pick_pixel, encode_pick_color};
use crate::pipeline::{Color, Filter, Pipeline, TextureLayer};
use crate::stacks::{ClipStack, TransformStack};

/// Which nodes participate in a pick render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickMode {
    /// Only nodes marked reactive (input dispatch).
    Reactive,
    /// Every paintable node (tests and tools).
    All,
}

/// The traversal engine for one compositor context.
///
/// Owns all render-side per-node state: paint delegates, effects, offscreen
/// caches, and the pick id pool. One engine instance serves one tree; there
/// is no global engine.
#[derive(Default)]
pub struct PaintEngine {
    painters: Vec<Option<Box<dyn ActorPaint>>>,
    effects: Vec<Vec<Box<dyn Effect>>>,
    caches: Vec<Option<NodeCache>>,
    pick_ids: Vec<Option<u32>>,
    pick_pool: IdPool<ActorId>,
    transforms: TransformStack,
    clips: ClipStack,
    pass_index: u64,
    nodes_visited: u32,
}

impl core::fmt::Debug for PaintEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaintEngine")
            .field("slots", &self.caches.len())
            .field("pass_index", &self.pass_index)
            .finish_non_exhaustive()
    }
}

impl PaintEngine {
    /// Creates an engine with no registered render state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transforms: TransformStack::new(),
            clips: ClipStack::new(),
            ..Self::default()
        }
    }

    /// Registers (or clears) the paint delegate for an actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_painter(
        &mut self,
        tree: &SceneTree,
        id: ActorId,
        painter: Option<Box<dyn ActorPaint>>,
    ) {
        assert!(tree.is_alive(id), "stale handle: {id:?}");
        self.grow_tables(id.index() + 1);
        self.painters[id.index() as usize] = painter;
    }

    /// Attaches a paint effect to an actor. Effects run in attachment
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn add_effect(&mut self, tree: &SceneTree, id: ActorId, effect: Box<dyn Effect>) {
        assert!(tree.is_alive(id), "stale handle: {id:?}");
        self.grow_tables(id.index() + 1);
        self.effects[id.index() as usize].push(effect);
    }

    /// Removes all effects from an actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn clear_effects(&mut self, tree: &SceneTree, id: ActorId) {
        assert!(tree.is_alive(id), "stale handle: {id:?}");
        if (id.index() as usize) < self.effects.len() {
            self.effects[id.index() as usize].clear();
        }
    }

    /// Runs a full frame: layout if needed, damage drain, then the paint
    /// traversal from `root` into the backend's current target.
    ///
    /// `projection` is the base (camera/projection) transform pushed before
    /// the root; `viewport` is the size the root is laid out against.
    pub fn paint(
        &mut self,
        tree: &mut SceneTree,
        gpu: &mut dyn Gpu,
        root: ActorId,
        viewport: Size,
        projection: &Matrix,
        tracer: &mut Tracer<'_>,
    ) {
        assert!(tree.is_alive(root), "stale handle: {root:?}");

        // A relayout request pending from earlier mutations is satisfied
        // here, so the paint below always sees current allocations.
        tracer.phase_begin(&PhaseBeginEvent {
            pass_index: self.pass_index,
            phase: PhaseKind::Layout,
        });
        tree.layout_root(root, viewport);
        tracer.phase_end(&PhaseEndEvent {
            pass_index: self.pass_index,
            phase: PhaseKind::Layout,
            nodes_visited: tree.slot_count(),
        });

        let damage = tree.take_frame_damage();
        self.apply_damage(gpu, &damage, tree.slot_count(), tracer);

        self.nodes_visited = 0;
        tracer.phase_begin(&PhaseBeginEvent {
            pass_index: self.pass_index,
            phase: PhaseKind::Paint,
        });

        gpu.push_transform(projection);
        self.transforms.push(projection);
        self.paint_node(tree, gpu, root.index(), 255, tracer);
        self.transforms.pop();
        gpu.pop_transform();

        tracer.phase_end(&PhaseEndEvent {
            pass_index: self.pass_index,
            phase: PhaseKind::Paint,
            nodes_visited: self.nodes_visited,
        });
        self.pass_index += 1;
    }

    /// Resolves the topmost eligible actor at `point` (stage coordinates)
    /// by rendering node identities as colors and reading back one pixel.
    ///
    /// Returns `None` for empty space, when offscreen rendering is
    /// unavailable, or when the decoded id no longer maps to a live actor
    /// (each case logs a diagnosable warning where it indicates a bug).
    /// The caches used by the normal paint pass are never touched.
    pub fn pick(
        &mut self,
        tree: &mut SceneTree,
        gpu: &mut dyn Gpu,
        root: ActorId,
        viewport: Size,
        projection: &Matrix,
        point: Point,
        mode: PickMode,
        tracer: &mut Tracer<'_>,
    ) -> Option<ActorId> {
        assert!(tree.is_alive(root), "stale handle: {root:?}");

        tree.layout_root(root, viewport);
        self.grow_tables(tree.slot_count());

        if !gpu.supports_offscreen() {
            log::warn!("pick requires offscreen readback, which this backend does not support");
            return None;
        }

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "viewport sizes are non-negative and far below u32::MAX"
        )]
        let (width, height) = (
            (viewport.width.ceil() as u32).max(1),
            (viewport.height.ceil() as u32).max(1),
        );
        let target = match gpu.create_offscreen(width, height) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("pick buffer allocation failed: {e}");
                return None;
            }
        };

        self.nodes_visited = 0;
        tracer.phase_begin(&PhaseBeginEvent {
            pass_index: self.pass_index,
            phase: PhaseKind::Pick,
        });

        gpu.push_target(target);
        gpu.clear(PICK_BACKGROUND);
        gpu.push_transform(projection);
        let saved = core::mem::replace(&mut self.transforms, TransformStack::new());
        self.transforms.push(projection);
        self.pick_node(tree, gpu, root.index(), mode, tracer);
        self.transforms = saved;
        gpu.pop_transform();

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "the query point is clamped into the buffer first"
        )]
        let (px, py) = (
            (point.x.max(0.0) as u32).min(width - 1),
            (point.y.max(0.0) as u32).min(height - 1),
        );
        let pixel = gpu.read_pixel(target, px, py);
        gpu.pop_target();
        gpu.release_offscreen(target);

        let hit = decode_pick_pixel(pixel)
            .and_then(|id| self.pick_pool.lookup(id).copied())
            .filter(|&actor| tree.is_alive(actor));

        tracer.phase_end(&PhaseEndEvent {
            pass_index: self.pass_index,
            phase: PhaseKind::Pick,
            nodes_visited: self.nodes_visited,
        });
        tracer.pick_result(&PickResultEvent {
            pass_index: self.pass_index,
            hit_slot: hit.map(ActorId::index),
        });
        self.pass_index += 1;
        hit
    }

    // -- Normal paint traversal --

    fn paint_node(
        &mut self,
        tree: &SceneTree,
        gpu: &mut dyn Gpu,
        idx: u32,
        parent_opacity: u8,
        tracer: &mut Tracer<'_>,
    ) {
        let flags = tree.flags_at(idx);
        if !flags.mapped {
            return;
        }
        let paint_opacity = mul_opacity(parent_opacity, tree.opacity_at(idx));
        if paint_opacity == 0 {
            return;
        }

        let local = tree.local_matrix_at(idx);
        self.transforms.push(&local);
        gpu.push_transform(&local);

        let alloc = tree.allocation_at(idx);
        let bounds = Rect::new(0.0, 0.0, alloc.width(), alloc.height());
        let clip_count = self.push_clips(tree, gpu, idx, bounds);

        let policy = tree.redirect_at(idx);
        let redirect = wants_redirect(policy, paint_opacity, || tree.has_overlaps_at(idx));

        if redirect && gpu.supports_offscreen() {
            self.paint_redirected(tree, gpu, idx, paint_opacity, bounds, tracer);
        } else {
            if redirect {
                log::warn!("offscreen rendering unsupported; painting slot {idx} directly");
                #[cfg(feature = "trace-rich")]
                tracer.node_cache(&NodeCacheEvent {
                    pass_index: self.pass_index,
                    slot: idx,
                    event: CacheEvent::Fallback,
                });
            }
            if policy == RedirectPolicy::Never
                && let Some(cache) = self.caches[idx as usize].take()
            {
                gpu.release_offscreen(cache.target);
                #[cfg(feature = "trace-rich")]
                tracer.node_cache(&NodeCacheEvent {
                    pass_index: self.pass_index,
                    slot: idx,
                    event: CacheEvent::Release,
                });
            }
            #[cfg(feature = "trace-rich")]
            if !redirect && policy == RedirectPolicy::AutomaticForOpacity {
                tracer.node_cache(&NodeCacheEvent {
                    pass_index: self.pass_index,
                    slot: idx,
                    event: CacheEvent::Bypass,
                });
            }
            self.paint_content_and_children(tree, gpu, idx, paint_opacity, bounds, tracer);
        }

        self.pop_clips(gpu, clip_count);
        gpu.pop_transform();
        self.transforms.pop();
    }

    fn paint_redirected(
        &mut self,
        tree: &SceneTree,
        gpu: &mut dyn Gpu,
        idx: u32,
        paint_opacity: u8,
        bounds: Rect,
        tracer: &mut Tracer<'_>,
    ) {
        let scale = self.transforms.world_scale();
        let (width, height) = cache_pixel_size(bounds.width(), bounds.height(), scale);

        let reusable = self.caches[idx as usize]
            .is_some_and(|cache| cache.reusable(width, height, scale));

        let target = if reusable {
            #[cfg(feature = "trace-rich")]
            tracer.node_cache(&NodeCacheEvent {
                pass_index: self.pass_index,
                slot: idx,
                event: CacheEvent::Reuse,
            });
            match self.caches[idx as usize] {
                Some(cache) => cache.target,
                None => return,
            }
        } else {
            // Reuse a same-size target, else (re)allocate.
            let existing = match self.caches[idx as usize] {
                Some(cache) if cache.width == width && cache.height == height => {
                    Some(cache.target)
                }
                Some(cache) => {
                    gpu.release_offscreen(cache.target);
                    self.caches[idx as usize] = None;
                    None
                }
                None => None,
            };
            let target = match existing {
                Some(target) => target,
                None => match gpu.create_offscreen(width, height) {
                    Ok(target) => target,
                    Err(e) => {
                        // Recoverable degradation: paint directly this
                        // pass and retry on the next one.
                        log::warn!("{e}; painting slot {idx} directly");
                        #[cfg(feature = "trace-rich")]
                        tracer.node_cache(&NodeCacheEvent {
                            pass_index: self.pass_index,
                            slot: idx,
                            event: CacheEvent::Fallback,
                        });
                        self.paint_content_and_children(
                            tree,
                            gpu,
                            idx,
                            paint_opacity,
                            bounds,
                            tracer,
                        );
                        return;
                    }
                },
            };

            // Fill: the subtree paints at full opacity in its own local
            // space, scaled to the cache resolution; the group opacity is
            // applied when compositing the texture.
            gpu.push_target(target);
            gpu.clear(Color::TRANSPARENT);
            let cache_transform = Matrix::from_scale(scale.0, scale.1, 1.0);
            gpu.push_transform(&cache_transform);
            let saved = core::mem::replace(&mut self.transforms, TransformStack::new());
            self.transforms.push(&cache_transform);

            self.paint_content_and_children(tree, gpu, idx, 255, bounds, tracer);

            self.transforms = saved;
            gpu.pop_transform();
            gpu.pop_target();

            self.caches[idx as usize] = Some(NodeCache {
                target,
                width,
                height,
                world_scale: scale,
                valid: true,
            });
            #[cfg(feature = "trace-rich")]
            tracer.node_cache(&NodeCacheEvent {
                pass_index: self.pass_index,
                slot: idx,
                event: CacheEvent::Fill,
            });
            target
        };

        let mut pipeline = Pipeline::new();
        pipeline.set_color(Color::WHITE.with_opacity(paint_opacity));
        gpu.draw_offscreen(&pipeline, target, bounds);
    }

    fn paint_content_and_children(
        &mut self,
        tree: &SceneTree,
        gpu: &mut dyn Gpu,
        idx: u32,
        paint_opacity: u8,
        bounds: Rect,
        tracer: &mut Tracer<'_>,
    ) {
        self.nodes_visited += 1;

        let mut pipeline = Pipeline::new();
        pipeline.set_color(Color::WHITE.with_opacity(paint_opacity));
        if let Some(surface) = tree.content_at(idx) {
            pipeline.add_layer(TextureLayer {
                surface,
                filter: Filter::default(),
            });
        }

        let mut effects = core::mem::take(&mut self.effects[idx as usize]);
        for effect in effects.iter_mut() {
            effect.setup_pipeline(&mut pipeline);
        }
        let mut paint_content = true;
        for effect in effects.iter_mut() {
            paint_content &= effect.pre_paint(gpu, bounds);
        }

        if paint_content {
            let mut painter = self.painters[idx as usize].take();
            if let Some(p) = painter.as_mut() {
                p.paint(gpu, bounds, &pipeline);
                self.trace_painted(tracer, idx, false);
            } else if !pipeline.layers().is_empty() {
                gpu.draw_rect(&pipeline, bounds);
                self.trace_painted(tracer, idx, false);
            }
            self.painters[idx as usize] = painter;
        }

        for child in tree.children_at(idx) {
            self.paint_node(tree, gpu, child, paint_opacity, tracer);
        }

        for effect in effects.iter_mut().rev() {
            effect.post_paint(gpu, bounds);
        }
        self.effects[idx as usize] = effects;
    }

    // -- Pick traversal --

    fn pick_node(
        &mut self,
        tree: &SceneTree,
        gpu: &mut dyn Gpu,
        idx: u32,
        mode: PickMode,
        tracer: &mut Tracer<'_>,
    ) {
        let flags = tree.flags_at(idx);
        if !flags.mapped {
            return;
        }
        // Opacity is deliberately ignored: a visually transparent actor is
        // still an input target.

        let local = tree.local_matrix_at(idx);
        self.transforms.push(&local);
        gpu.push_transform(&local);

        let alloc = tree.allocation_at(idx);
        let bounds = Rect::new(0.0, 0.0, alloc.width(), alloc.height());
        let clip_count = self.push_clips(tree, gpu, idx, bounds);

        let eligible = match mode {
            PickMode::All => true,
            PickMode::Reactive => flags.reactive,
        };
        if eligible
            && let Some(pick_id) = self.ensure_pick_id(tree, idx)
        {
            self.nodes_visited += 1;
            let mut pipeline = Pipeline::new();
            pipeline.set_color(encode_pick_color(pick_id));

            let mut painter = self.painters[idx as usize].take();
            if let Some(p) = painter.as_mut() {
                p.pick_paint(gpu, bounds, &pipeline);
            } else {
                gpu.draw_rect(&pipeline, bounds);
            }
            self.painters[idx as usize] = painter;
            self.trace_painted(tracer, idx, true);
        }

        for child in tree.children_at(idx) {
            self.pick_node(tree, gpu, child, mode, tracer);
        }

        self.pop_clips(gpu, clip_count);
        gpu.pop_transform();
        self.transforms.pop();
    }

    // -- Shared helpers --

    fn push_clips(&mut self, tree: &SceneTree, gpu: &mut dyn Gpu, idx: u32, bounds: Rect) -> u32 {
        let mut count = 0;
        if tree.flags_at(idx).clip_to_allocation {
            let shape = ClipShape::Rect(bounds);
            self.clips.push(shape);
            gpu.push_clip(&shape);
            count += 1;
        }
        if let Some(shape) = tree.clip_at(idx) {
            self.clips.push(shape);
            gpu.push_clip(&shape);
            count += 1;
        }
        count
    }

    fn pop_clips(&mut self, gpu: &mut dyn Gpu, count: u32) {
        for _ in 0..count {
            self.clips.pop();
            gpu.pop_clip();
        }
    }

    fn ensure_pick_id(&mut self, tree: &SceneTree, idx: u32) -> Option<u32> {
        if let Some(id) = self.pick_ids[idx as usize] {
            return Some(id);
        }
        let id = self.pick_pool.add(tree.id_at(idx));
        if id >= MAX_PICK_ID {
            self.pick_pool.remove(id);
            log::warn!("pick id space exhausted; slot {idx} will not be pickable");
            return None;
        }
        self.pick_ids[idx as usize] = Some(id);
        Some(id)
    }

    /// Grows side tables, releases render state for removed slots, and
    /// invalidates caches along the damaged set.
    fn apply_damage(
        &mut self,
        gpu: &mut dyn Gpu,
        damage: &FrameDamage,
        slot_count: u32,
        tracer: &mut Tracer<'_>,
    ) {
        #[cfg(not(feature = "trace-rich"))]
        let _ = &tracer;
        self.grow_tables(slot_count);

        for &idx in &damage.removed {
            let i = idx as usize;
            if let Some(cache) = self.caches[i].take() {
                gpu.release_offscreen(cache.target);
                #[cfg(feature = "trace-rich")]
                tracer.node_cache(&NodeCacheEvent {
                    pass_index: self.pass_index,
                    slot: idx,
                    event: CacheEvent::Release,
                });
            }
            if let Some(pick_id) = self.pick_ids[i].take() {
                self.pick_pool.remove(pick_id);
            }
            self.painters[i] = None;
            self.effects[i].clear();
        }

        // Invalidate eagerly rather than during traversal: a damaged node
        // may be unmapped this pass, and its cache must not survive as
        // "valid" into a later pass.
        for &idx in &damage.damaged {
            if let Some(cache) = self.caches[idx as usize].as_mut() {
                cache.valid = false;
            }
        }
    }

    fn grow_tables(&mut self, slot_count: u32) {
        let n = slot_count as usize;
        if self.painters.len() < n {
            self.painters.resize_with(n, || None);
            self.effects.resize_with(n, Vec::new);
            self.caches.resize(n, None);
            self.pick_ids.resize(n, None);
        }
    }

    #[cfg(feature = "trace-rich")]
    fn trace_painted(&mut self, tracer: &mut Tracer<'_>, idx: u32, pick: bool) {
        tracer.node_painted(&NodePaintedEvent {
            pass_index: self.pass_index,
            slot: idx,
            pick,
        });
    }

    #[cfg(not(feature = "trace-rich"))]
    fn trace_painted(&mut self, _tracer: &mut Tracer<'_>, _idx: u32, _pick: bool) {}
}

/// Multiplies two 0-255 opacities.
fn mul_opacity(a: u8, b: u8) -> u8 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the product of two 8-bit opacities divided by 255 fits in u8"
    )]
    let out = ((u16::from(a) * u16::from(b)) / 255) as u8;
    out
}

/// The offscreen-redirect decision for one node.
///
/// `AutomaticForOpacity` redirects only when the accumulated paint opacity
/// is below 255 *and* the subtree overlaps itself: non-overlapping children
/// blend the same per-child as they would as a flattened group.
fn wants_redirect(
    policy: RedirectPolicy,
    paint_opacity: u8,
    has_overlaps: impl FnOnce() -> bool,
) -> bool {
    match policy {
        RedirectPolicy::Never => false,
        RedirectPolicy::Always => true,
        RedirectPolicy::AutomaticForOpacity => paint_opacity < 255 && has_overlaps(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_multiplication() {
        assert_eq!(mul_opacity(255, 255), 255);
        assert_eq!(mul_opacity(255, 127), 127);
        assert_eq!(mul_opacity(127, 127), 63);
        assert_eq!(mul_opacity(0, 255), 0);
    }

    #[test]
    fn redirect_decision_matrix() {
        use RedirectPolicy::*;
        assert!(!wants_redirect(Never, 100, || true));
        assert!(wants_redirect(Always, 255, || false));
        assert!(wants_redirect(AutomaticForOpacity, 100, || true));
        assert!(
            !wants_redirect(AutomaticForOpacity, 255, || true),
            "full opacity never redirects automatically"
        );
        assert!(
            !wants_redirect(AutomaticForOpacity, 100, || false),
            "non-overlapping children skip redirection"
        );
    }

    #[test]
    fn overlap_predicate_is_lazy() {
        // The (possibly quadratic) overlap check must not run unless the
        // opacity test already passed.
        let called = core::cell::Cell::new(false);
        let _ = wants_redirect(RedirectPolicy::AutomaticForOpacity, 255, || {
            called.set(true);
            true
        });
        assert!(!called.get());
    }
}
