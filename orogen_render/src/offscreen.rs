// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node offscreen redirect caches.
//!
//! A redirected node paints its subtree into an offscreen target once and
//! recomposites that texture on later frames. The cache is reusable iff:
//!
//! (a) the subtree issued no repaint request since the fill (tracked by the
//!     DAMAGE channel — the node itself appears in the damaged set when any
//!     descendant's rendering changed);
//! (b) the redirect policy still selects redirection for this paint;
//! (c) the world scale has not changed in a way that would alter
//!     anti-aliasing at the cached resolution (the cache stores the fill
//!     scale and is refilled when it drifts).
//!
//! An opacity-only change on the redirected node touches none of these, so
//! the cached texture is recomposited with the new opacity for free.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::gpu::TargetId;

/// Cached offscreen state for one redirected node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NodeCache {
    /// The offscreen target holding the subtree image.
    pub(crate) target: TargetId,
    /// Pixel width of the target.
    pub(crate) width: u32,
    /// Pixel height of the target.
    pub(crate) height: u32,
    /// World scale at fill time.
    pub(crate) world_scale: (f32, f32),
    /// Cleared when the subtree is damaged; set after a fill.
    pub(crate) valid: bool,
}

impl NodeCache {
    /// Returns whether the cache can be recomposited as-is for the given
    /// pixel size and world scale.
    pub(crate) fn reusable(&self, width: u32, height: u32, world_scale: (f32, f32)) -> bool {
        self.valid
            && self.width == width
            && self.height == height
            && scale_close(self.world_scale.0, world_scale.0)
            && scale_close(self.world_scale.1, world_scale.1)
    }
}

/// Scale comparison with a small tolerance: sub-0.1% drift cannot change
/// the rasterization of the cached texture.
fn scale_close(a: f32, b: f32) -> bool {
    (a - b).abs() <= a.abs().max(b.abs()) * 1.0e-3
}

/// Computes the cache pixel size for a local-space size under a world
/// scale. Zero-sized allocations still get a 1×1 target so composition and
/// readback stay well-defined.
pub(crate) fn cache_pixel_size(width: f64, height: f64, world_scale: (f32, f32)) -> (u32, u32) {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "allocation sizes are non-negative and far below u32::MAX"
    )]
    let px = |logical: f64, scale: f32| -> u32 {
        ((logical * f64::from(scale)).ceil() as u32).max(1)
    };
    (px(width, world_scale.0), px(height, world_scale.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_requires_validity_size_and_scale() {
        let cache = NodeCache {
            target: TargetId(1),
            width: 100,
            height: 50,
            world_scale: (1.0, 1.0),
            valid: true,
        };
        assert!(cache.reusable(100, 50, (1.0, 1.0)));
        assert!(!cache.reusable(101, 50, (1.0, 1.0)), "size mismatch");
        assert!(!cache.reusable(100, 50, (2.0, 1.0)), "scale change");

        let invalid = NodeCache {
            valid: false,
            ..cache
        };
        assert!(!invalid.reusable(100, 50, (1.0, 1.0)));
    }

    #[test]
    fn tiny_scale_drift_is_tolerated() {
        let cache = NodeCache {
            target: TargetId(1),
            width: 100,
            height: 50,
            world_scale: (1.0, 1.0),
            valid: true,
        };
        assert!(cache.reusable(100, 50, (1.0 + 1.0e-6, 1.0)));
    }

    #[test]
    fn pixel_size_rounds_up_and_never_hits_zero() {
        assert_eq!(cache_pixel_size(100.3, 50.0, (1.0, 1.0)), (101, 50));
        assert_eq!(cache_pixel_size(100.0, 50.0, (1.5, 2.0)), (150, 100));
        assert_eq!(cache_pixel_size(0.0, 0.0, (1.0, 1.0)), (1, 1));
    }
}
