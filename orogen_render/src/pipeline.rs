// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy-on-write GPU draw-state bundles.
//!
//! A [`Pipeline`] is an immutable-by-convention bundle of draw state: color,
//! blend mode, texture layers, opaque shader snippet strings, and named
//! uniform values. Cloning is cheap (the state is shared), and any mutation
//! copies the shared state first, so customizing a clone for one node can
//! never disturb a template another node still holds.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use orogen_core::actor::SurfaceId;
use orogen_core::matrix::Matrix;

/// An 8-bit RGBA color, non-premultiplied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
    /// Alpha component.
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Creates a color from components.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this color with its alpha scaled by `opacity / 255`.
    #[must_use]
    pub const fn with_opacity(self, opacity: u8) -> Self {
        let a = ((self.a as u16 * opacity as u16) / 255) as u8;
        Self { a, ..self }
    }
}

/// Blend mode for compositing a draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    SourceOver,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
}

/// Texture sampling filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Bilinear sampling.
    #[default]
    Linear,
}

/// One texture layer of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureLayer {
    /// The sampled surface.
    pub surface: SurfaceId,
    /// Sampling filter.
    pub filter: Filter,
}

/// Where a shader snippet hooks into the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SnippetHook {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

/// An opaque shader snippet attached to a pipeline.
///
/// The source text is passed through to the GPU collaborator without
/// interpretation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snippet {
    /// Which stage the snippet hooks.
    pub hook: SnippetHook,
    /// The snippet source text.
    pub source: String,
}

/// A named uniform value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    /// A single float.
    Float(f32),
    /// A single integer.
    Int(i32),
    /// A 2-component vector.
    Vec2([f32; 2]),
    /// A 4-component vector.
    Vec4([f32; 4]),
    /// A 4×4 matrix.
    Matrix(Matrix),
}

#[derive(Clone, Debug, PartialEq)]
struct PipelineState {
    color: Color,
    blend: BlendMode,
    layers: Vec<TextureLayer>,
    snippets: Vec<Snippet>,
    uniforms: Vec<(String, UniformValue)>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            blend: BlendMode::SourceOver,
            layers: Vec::new(),
            snippets: Vec::new(),
            uniforms: Vec::new(),
        }
    }
}

/// A copy-on-write bundle of GPU draw state.
///
/// The default pipeline paints opaque white with source-over blending and
/// no texture layers.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    state: Arc<PipelineState>,
}

impl Pipeline {
    /// Creates the default pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether two handles share the same underlying state.
    ///
    /// Freshly cloned pipelines share until one of them is mutated.
    #[must_use]
    pub fn shares_state_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    // -- Accessors --

    /// Returns the pipeline color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.state.color
    }

    /// Returns the blend mode.
    #[must_use]
    pub fn blend_mode(&self) -> BlendMode {
        self.state.blend
    }

    /// Returns the texture layers, bottom first.
    #[must_use]
    pub fn layers(&self) -> &[TextureLayer] {
        &self.state.layers
    }

    /// Returns the attached shader snippets, in attachment order.
    #[must_use]
    pub fn snippets(&self) -> &[Snippet] {
        &self.state.snippets
    }

    /// Returns the value of a named uniform, if set.
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.state
            .uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns all uniforms in insertion order.
    #[must_use]
    pub fn uniforms(&self) -> &[(String, UniformValue)] {
        &self.state.uniforms
    }

    // -- Mutators (copy-on-write) --

    /// Sets the pipeline color.
    pub fn set_color(&mut self, color: Color) {
        Arc::make_mut(&mut self.state).color = color;
    }

    /// Sets the blend mode.
    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        Arc::make_mut(&mut self.state).blend = blend;
    }

    /// Appends a texture layer on top of the existing ones.
    pub fn add_layer(&mut self, layer: TextureLayer) {
        Arc::make_mut(&mut self.state).layers.push(layer);
    }

    /// Removes all texture layers.
    pub fn clear_layers(&mut self) {
        if !self.state.layers.is_empty() {
            Arc::make_mut(&mut self.state).layers.clear();
        }
    }

    /// Attaches a shader snippet.
    pub fn add_snippet(&mut self, snippet: Snippet) {
        Arc::make_mut(&mut self.state).snippets.push(snippet);
    }

    /// Sets a named uniform, replacing any previous value under that name.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let state = Arc::make_mut(&mut self.state);
        if let Some(slot) = state.uniforms.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            state.uniforms.push((String::from(name), value));
        }
    }
}
