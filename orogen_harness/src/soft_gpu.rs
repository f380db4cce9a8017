// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic software implementation of the [`Gpu`] contract.
//!
//! `SoftGpu` rasterizes by mapping pixel centers back through the inverse
//! of the accumulated transform and testing them against the drawn
//! rectangle and every active clip. It is pixel-exact for the flat-color
//! draws picking depends on and close enough for blending assertions, but
//! it makes no attempt at being fast — it exists so traversal behavior
//! (paint counts, cache reuse, readback) can be asserted without a real
//! GPU.
//!
//! Failure injection: [`set_offscreen_supported`](SoftGpu::set_offscreen_supported)
//! and [`fail_next_offscreen`](SoftGpu::fail_next_offscreen) exercise the
//! engine's degraded-fallback paths.

#![expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "software rasterization converts between pixel and geometry units throughout"
)]

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Shape};
use orogen_core::actor::{ClipShape, SurfaceId};
use orogen_core::matrix::Matrix;
use orogen_render::gpu::{Gpu, GpuError, TargetId};
use orogen_render::pipeline::{Color, Pipeline};

/// A plain RGBA8 pixel buffer.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA pixels.
    pub pixels: Vec<[u8; 4]>,
}

impl Texture {
    /// Creates a texture filled with `fill`.
    #[must_use]
    pub fn filled(width: u32, height: u32, fill: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![[fill.r, fill.g, fill.b, fill.a]; (width * height) as usize],
        }
    }

    /// Returns the pixel at `(x, y)`, or transparent black out of range.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize]
        } else {
            [0, 0, 0, 0]
        }
    }

    fn sample_nearest(&self, u: f64, v: f64) -> [u8; 4] {
        let x = ((u * f64::from(self.width)) as i64).clamp(0, i64::from(self.width) - 1);
        let y = ((v * f64::from(self.height)) as i64).clamp(0, i64::from(self.height) - 1);
        self.pixels[(y as u32 * self.width + x as u32) as usize]
    }
}

/// An active clip: the shape plus the inverse of the transform that was
/// current when it was pushed, so device points can be tested in the
/// shape's own space.
#[derive(Debug)]
struct ClipEntry {
    shape: ClipShape,
    inverse: Option<Matrix>,
}

/// Stack state for one bound target; entering an offscreen target starts
/// with fresh stacks per the [`Gpu`] contract.
#[derive(Debug)]
struct Frame {
    target: Option<TargetId>,
    transforms: Vec<Matrix>,
    clips: Vec<ClipEntry>,
}

impl Frame {
    fn new(target: Option<TargetId>) -> Self {
        Self {
            target,
            transforms: vec![Matrix::IDENTITY],
            clips: Vec::new(),
        }
    }

    fn current_transform(&self) -> Matrix {
        *self.transforms.last().unwrap_or(&Matrix::IDENTITY)
    }
}

/// The software GPU.
#[derive(Debug)]
pub struct SoftGpu {
    onscreen: Texture,
    targets: HashMap<u32, Texture>,
    surfaces: HashMap<u32, Texture>,
    next_target: u32,
    frames: Vec<Frame>,
    offscreen_supported: bool,
    fail_allocations: u32,
    draw_calls: u32,
}

impl SoftGpu {
    /// Creates a software GPU with an onscreen buffer of the given size,
    /// cleared to transparent black.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            onscreen: Texture::filled(width, height, Color::TRANSPARENT),
            targets: HashMap::new(),
            surfaces: HashMap::new(),
            next_target: 0,
            frames: vec![Frame::new(None)],
            offscreen_supported: true,
            fail_allocations: 0,
            draw_calls: 0,
        }
    }

    /// Toggles the offscreen feature bit reported to the engine.
    pub fn set_offscreen_supported(&mut self, supported: bool) {
        self.offscreen_supported = supported;
    }

    /// Makes the next `count` offscreen allocations fail, simulating
    /// transient driver memory pressure.
    pub fn fail_next_offscreen(&mut self, count: u32) {
        self.fail_allocations = count;
    }

    /// Registers the pixel contents for a surface id.
    pub fn upload_surface(&mut self, surface: SurfaceId, texture: Texture) {
        self.surfaces.insert(surface.0, texture);
    }

    /// Registers a `width`×`height` surface filled with a solid color.
    pub fn upload_solid_surface(&mut self, surface: SurfaceId, width: u32, height: u32, color: Color) {
        self.upload_surface(surface, Texture::filled(width, height, color));
    }

    /// Returns the onscreen buffer.
    #[must_use]
    pub fn onscreen(&self) -> &Texture {
        &self.onscreen
    }

    /// Returns how many offscreen targets are currently allocated.
    #[must_use]
    pub fn live_offscreen_count(&self) -> usize {
        self.targets.len()
    }

    /// Returns the number of primitive draw calls issued so far.
    #[must_use]
    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    fn frame(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    fn clip_admits(&self, device: Point) -> bool {
        for clip in &self.frame().clips {
            let Some(inverse) = clip.inverse else {
                // Degenerate transform at push time clips everything out.
                return false;
            };
            let (lx, ly) = inverse.transform_point_2d(device.x as f32, device.y as f32);
            let local = Point::new(f64::from(lx), f64::from(ly));
            let inside = match clip.shape {
                ClipShape::Rect(r) => r.contains(local),
                ClipShape::RoundedRect(r) => r.contains(local),
            };
            if !inside {
                return false;
            }
        }
        true
    }

    /// Rasterizes `rect` under the current transform/clips into the bound
    /// target. `source` is sampled in rect-normalized coordinates and
    /// modulated by `tint`; `None` paints the tint flat.
    fn rasterize(&mut self, rect: Rect, source: Option<Texture>, tint: Color) {
        self.draw_calls += 1;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }

        let transform = self.frame().current_transform();
        let Some(inverse) = transform.invert() else {
            return;
        };

        // Device-space bounding box of the transformed rectangle.
        let corners = [
            transform.transform_point_2d(rect.x0 as f32, rect.y0 as f32),
            transform.transform_point_2d(rect.x1 as f32, rect.y0 as f32),
            transform.transform_point_2d(rect.x0 as f32, rect.y1 as f32),
            transform.transform_point_2d(rect.x1 as f32, rect.y1 as f32),
        ];
        let (width, height) = match self.frame().target {
            None => (self.onscreen.width, self.onscreen.height),
            Some(id) => {
                let tex = self
                    .targets
                    .get(&id.0)
                    .expect("draw against a released target");
                (tex.width, tex.height)
            }
        };
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);
        let x0 = (min_x.floor().max(0.0)) as u32;
        let y0 = (min_y.floor().max(0.0)) as u32;
        let x1 = (max_x.ceil().min(width as f32)) as u32;
        let y1 = (max_y.ceil().min(height as f32)) as u32;

        let mut shaded: Vec<(u32, u32, [u8; 4])> = Vec::new();
        for py in y0..y1 {
            for px in x0..x1 {
                let device = Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
                let (lx, ly) = inverse.transform_point_2d(device.x as f32, device.y as f32);
                let (lx, ly) = (f64::from(lx), f64::from(ly));
                if lx < rect.x0 || lx >= rect.x1 || ly < rect.y0 || ly >= rect.y1 {
                    continue;
                }
                if !self.clip_admits(device) {
                    continue;
                }
                let src = match &source {
                    None => [tint.r, tint.g, tint.b, tint.a],
                    Some(texture) => {
                        let texel = texture.sample_nearest(
                            (lx - rect.x0) / rect.width(),
                            (ly - rect.y0) / rect.height(),
                        );
                        modulate(texel, tint)
                    }
                };
                shaded.push((px, py, src));
            }
        }

        let texture = match self.frame().target {
            None => &mut self.onscreen,
            Some(id) => self
                .targets
                .get_mut(&id.0)
                .expect("draw against a released target"),
        };
        for (px, py, src) in shaded {
            let slot = &mut texture.pixels[(py * texture.width + px) as usize];
            *slot = blend_source_over(*slot, src);
        }
    }
}

impl Gpu for SoftGpu {
    fn supports_offscreen(&self) -> bool {
        self.offscreen_supported
    }

    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<TargetId, GpuError> {
        if !self.offscreen_supported {
            return Err(GpuError::OffscreenUnsupported);
        }
        if self.fail_allocations > 0 {
            self.fail_allocations -= 1;
            return Err(GpuError::OffscreenAllocation { width, height });
        }
        let id = self.next_target;
        self.next_target += 1;
        self.targets
            .insert(id, Texture::filled(width, height, Color::TRANSPARENT));
        Ok(TargetId(id))
    }

    fn release_offscreen(&mut self, target: TargetId) {
        if self.targets.remove(&target.0).is_none() {
            log::warn!("release of unknown offscreen target {target:?}");
        }
    }

    fn push_target(&mut self, target: TargetId) {
        self.frames.push(Frame::new(Some(target)));
    }

    fn pop_target(&mut self) {
        debug_assert!(self.frames.len() > 1, "pop_target without push_target");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn clear(&mut self, color: Color) {
        let fill = [color.r, color.g, color.b, color.a];
        let texture = match self.frame().target {
            None => &mut self.onscreen,
            Some(id) => self
                .targets
                .get_mut(&id.0)
                .expect("clear against a released target"),
        };
        texture.pixels.fill(fill);
    }

    fn push_transform(&mut self, matrix: &Matrix) {
        let top = self.frame().current_transform();
        self.frame_mut()
            .transforms
            .push(Matrix::multiply(&top, matrix));
    }

    fn pop_transform(&mut self) {
        let frame = self.frame_mut();
        debug_assert!(frame.transforms.len() > 1, "pop_transform without push");
        if frame.transforms.len() > 1 {
            frame.transforms.pop();
        }
    }

    fn push_clip(&mut self, clip: &ClipShape) {
        let inverse = self.frame().current_transform().invert();
        self.frame_mut().clips.push(ClipEntry {
            shape: *clip,
            inverse,
        });
    }

    fn pop_clip(&mut self) {
        let frame = self.frame_mut();
        debug_assert!(!frame.clips.is_empty(), "pop_clip without push");
        frame.clips.pop();
    }

    fn draw_rect(&mut self, pipeline: &Pipeline, rect: Rect) {
        let tint = pipeline.color();
        let source = pipeline.layers().first().map(|layer| {
            self.surfaces
                .get(&layer.surface.0)
                .cloned()
                .unwrap_or_else(|| {
                    log::warn!("draw with unregistered surface {:?}", layer.surface);
                    Texture::filled(1, 1, Color::WHITE)
                })
        });
        self.rasterize(rect, source, tint);
    }

    fn draw_offscreen(&mut self, pipeline: &Pipeline, source: TargetId, rect: Rect) {
        let Some(texture) = self.targets.get(&source.0).cloned() else {
            log::warn!("draw from unknown offscreen target {source:?}");
            return;
        };
        self.rasterize(rect, Some(texture), pipeline.color());
    }

    fn read_pixel(&mut self, target: TargetId, x: u32, y: u32) -> [u8; 4] {
        match self.targets.get(&target.0) {
            Some(texture) => texture.pixel(x, y),
            None => {
                log::warn!("readback from unknown offscreen target {target:?}");
                [0, 0, 0, 0]
            }
        }
    }
}

fn modulate(texel: [u8; 4], tint: Color) -> [u8; 4] {
    let mul = |a: u8, b: u8| ((u16::from(a) * u16::from(b)) / 255) as u8;
    [
        mul(texel[0], tint.r),
        mul(texel[1], tint.g),
        mul(texel[2], tint.b),
        mul(texel[3], tint.a),
    ]
}

fn blend_source_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let alpha = u16::from(src[3]);
    if alpha == 255 {
        return src;
    }
    let inv = 255 - alpha;
    let mix = |s: u8, d: u8| ((u16::from(s) * alpha + u16::from(d) * inv) / 255) as u8;
    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        // Classic saturating alpha accumulation.
        (alpha + (u16::from(dst[3]) * inv) / 255).min(255) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(pipeline_color: Color) -> Pipeline {
        let mut p = Pipeline::new();
        p.set_color(pipeline_color);
        p
    }

    #[test]
    fn flat_rect_lands_on_pixels() {
        let mut gpu = SoftGpu::new(16, 16);
        gpu.draw_rect(&solid(Color::rgba(255, 0, 0, 255)), Rect::new(2.0, 3.0, 6.0, 7.0));
        assert_eq!(gpu.onscreen().pixel(2, 3), [255, 0, 0, 255]);
        assert_eq!(gpu.onscreen().pixel(5, 6), [255, 0, 0, 255]);
        assert_eq!(gpu.onscreen().pixel(6, 7), [0, 0, 0, 0], "exclusive edges");
        assert_eq!(gpu.onscreen().pixel(1, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn transform_offsets_the_draw() {
        let mut gpu = SoftGpu::new(16, 16);
        gpu.push_transform(&Matrix::from_translation(4.0, 2.0, 0.0));
        gpu.draw_rect(&solid(Color::WHITE), Rect::new(0.0, 0.0, 2.0, 2.0));
        gpu.pop_transform();
        assert_eq!(gpu.onscreen().pixel(4, 2), [255, 255, 255, 255]);
        assert_eq!(gpu.onscreen().pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn clip_masks_pixels_outside() {
        let mut gpu = SoftGpu::new(16, 16);
        gpu.push_clip(&ClipShape::Rect(Rect::new(0.0, 0.0, 4.0, 16.0)));
        gpu.draw_rect(&solid(Color::WHITE), Rect::new(0.0, 0.0, 16.0, 16.0));
        gpu.pop_clip();
        assert_eq!(gpu.onscreen().pixel(3, 8), [255, 255, 255, 255]);
        assert_eq!(gpu.onscreen().pixel(4, 8), [0, 0, 0, 0]);
    }

    #[test]
    fn offscreen_round_trip_and_composite() {
        let mut gpu = SoftGpu::new(8, 8);
        let target = gpu.create_offscreen(4, 4).expect("allocation succeeds");
        gpu.push_target(target);
        gpu.clear(Color::TRANSPARENT);
        gpu.draw_rect(&solid(Color::rgba(0, 255, 0, 255)), Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(gpu.read_pixel(target, 1, 1), [0, 255, 0, 255]);
        gpu.pop_target();

        gpu.draw_offscreen(&Pipeline::new(), target, Rect::new(2.0, 2.0, 6.0, 6.0));
        assert_eq!(gpu.onscreen().pixel(3, 3), [0, 255, 0, 255]);
        assert_eq!(gpu.onscreen().pixel(1, 1), [0, 0, 0, 0]);

        gpu.release_offscreen(target);
        assert_eq!(gpu.live_offscreen_count(), 0);
    }

    #[test]
    fn alpha_blends_over_existing_pixels() {
        let mut gpu = SoftGpu::new(4, 4);
        gpu.clear(Color::WHITE);
        gpu.draw_rect(&solid(Color::rgba(0, 0, 0, 128)), Rect::new(0.0, 0.0, 4.0, 4.0));
        let [r, g, b, _] = gpu.onscreen().pixel(0, 0);
        // Half black over white sits near mid-gray.
        assert!((125..=130).contains(&r), "r = {r}");
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn surface_layers_are_sampled() {
        let mut gpu = SoftGpu::new(8, 8);
        gpu.upload_solid_surface(SurfaceId(9), 2, 2, Color::rgba(10, 20, 30, 255));
        let mut pipeline = Pipeline::new();
        pipeline.add_layer(orogen_render::pipeline::TextureLayer {
            surface: SurfaceId(9),
            filter: orogen_render::pipeline::Filter::Nearest,
        });
        gpu.draw_rect(&pipeline, Rect::new(0.0, 0.0, 8.0, 8.0));
        assert_eq!(gpu.onscreen().pixel(4, 4), [10, 20, 30, 255]);
    }

    #[test]
    fn failure_injection() {
        let mut gpu = SoftGpu::new(4, 4);
        gpu.fail_next_offscreen(1);
        assert_eq!(
            gpu.create_offscreen(2, 2),
            Err(GpuError::OffscreenAllocation {
                width: 2,
                height: 2
            })
        );
        assert!(gpu.create_offscreen(2, 2).is_ok());

        gpu.set_offscreen_supported(false);
        assert_eq!(gpu.create_offscreen(2, 2), Err(GpuError::OffscreenUnsupported));
    }
}
