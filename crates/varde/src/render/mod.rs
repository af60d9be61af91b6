//! Rendering: GPU context, instanced sprite batching, texture registry,
//! and (behind the `text` feature) glyph rendering.
//!
//! The renderer draws exactly one thing: textured unit quads, many at a
//! time. Every visible object — sprite, debug box, glyph — is one instance
//! in a [`SpriteBatch`](batch::SpriteBatch) flushed as a single instanced
//! draw call per filled segment.

pub mod batch;
pub mod gpu;
pub mod pipeline;
pub mod texture;

#[cfg(feature = "text")]
pub mod font;

use crate::math::{Mat4, Vec4};
use texture::TextureHandle;

/// Instance flag: sample the texture's red channel as glyph coverage
/// instead of treating it as an RGBA image.
pub const SPRITE_TEXT: u32 = 1 << 0;

/// One drawable quad: a texture reference, a model transform, a tint, and
/// render flags. Rebuilt from entity state every frame; never persisted.
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub texture: TextureHandle,
    pub transform: Mat4,
    pub color: Vec4,
    pub flags: u32,
}

impl Sprite {
    /// An untinted sprite with an identity transform; the frame loop fills
    /// the transform in from entity state before submission.
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            transform: Mat4::IDENTITY,
            color: Vec4::ONE,
            flags: 0,
        }
    }

    /// Set the tint color (builder pattern).
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}
