//! # Font — Glyph Rasterization and Text Drawing
//!
//! Uses [fontdue](https://docs.rs/fontdue) to rasterize a TTF/OTF face once
//! at load time. Each printable ASCII glyph (32..=126) becomes its own
//! single-channel coverage texture registered in the shared
//! [`TextureRegistry`](super::texture::TextureRegistry), so glyph quads flow
//! through the ordinary instanced sprite batch — a string of text and a
//! screenful of sprites can still share one draw call. The
//! [`SPRITE_TEXT`](super::SPRITE_TEXT) instance flag tells the shader to
//! read the red channel as alpha and tint with the instance color.
//!
//! Metrics (bearings, advance, line height) are kept in pixel units at the
//! loaded size; [`draw_text`] lays glyphs on a baseline cursor and scales
//! uniformly.

use crate::error::EngineError;
use crate::math::{Vec2, Vec4, sprite_transform};

use super::batch::SpriteBatch;
use super::gpu::GpuContext;
use super::texture::{TextureHandle, TextureRegistry};
use super::{SPRITE_TEXT, Sprite};

/// First and last rasterized character codes (printable ASCII).
const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 126;

/// Handle to a loaded font in the [`FontStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(usize);

/// One rasterized glyph: its coverage texture (absent for whitespace) and
/// metrics in pixels at the loaded size.
#[derive(Debug, Clone, Copy)]
struct Glyph {
    texture: Option<TextureHandle>,
    width: f32,
    height: f32,
    /// Horizontal offset from the cursor to the bitmap's left edge.
    xmin: f32,
    /// Vertical offset from the baseline to the bitmap's bottom edge, Y-up
    /// (fontdue's convention; negative for descenders).
    ymin: f32,
    advance: f32,
}

/// A rasterized font face.
pub struct Font {
    glyphs: Vec<Glyph>,
    line_height: f32,
}

impl Font {
    fn glyph(&self, ch: char) -> Option<&Glyph> {
        let code = ch as u32;
        if !(FIRST_CHAR as u32..=LAST_CHAR as u32).contains(&code) {
            return None;
        }
        Some(&self.glyphs[(code - FIRST_CHAR as u32) as usize])
    }

    /// Baseline-to-baseline distance in pixels at the loaded size.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }
}

/// Resource owning all loaded fonts.
pub struct FontStore {
    fonts: Vec<Font>,
}

impl FontStore {
    pub(crate) fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parse font bytes and rasterize the printable ASCII range at
    /// `pixel_size`, registering each glyph's coverage bitmap as a texture.
    ///
    /// Fails if the face doesn't parse or the texture registry fills up
    /// mid-font.
    pub fn load(
        &mut self,
        gpu: &GpuContext,
        registry: &mut TextureRegistry,
        bytes: &[u8],
        pixel_size: f32,
    ) -> Result<FontHandle, EngineError> {
        let face = fontdue::Font::from_bytes(
            bytes,
            fontdue::FontSettings {
                scale: pixel_size,
                ..Default::default()
            },
        )
        .map_err(EngineError::Font)?;

        let line_height = face
            .horizontal_line_metrics(pixel_size)
            .map(|m| m.new_line_size)
            .unwrap_or(pixel_size * 1.2);

        let mut glyphs = Vec::with_capacity((LAST_CHAR - FIRST_CHAR + 1) as usize);
        for code in FIRST_CHAR..=LAST_CHAR {
            let ch = code as char;
            let (metrics, coverage) = face.rasterize(ch, pixel_size);

            let texture = if metrics.width == 0 || metrics.height == 0 {
                None
            } else {
                Some(registry.create_r8(
                    gpu,
                    "glyph",
                    metrics.width as u32,
                    metrics.height as u32,
                    &coverage,
                )?)
            };

            glyphs.push(Glyph {
                texture,
                width: metrics.width as f32,
                height: metrics.height as f32,
                xmin: metrics.xmin as f32,
                ymin: metrics.ymin as f32,
                advance: metrics.advance_width,
            });
        }

        let handle = FontHandle(self.fonts.len());
        self.fonts.push(Font { glyphs, line_height });
        log::info!("loaded font at {pixel_size}px ({} glyph textures)", registry.len());
        Ok(handle)
    }

    /// # Panics
    ///
    /// Panics if the handle did not come from this store.
    pub fn get(&self, handle: FontHandle) -> &Font {
        &self.fonts[handle.0]
    }
}

/// Push one flagged sprite per visible glyph of `text` into the batch.
///
/// `origin` is the baseline position of the first character, in pixels;
/// `scale` multiplies the loaded pixel size. Newlines advance the baseline
/// by the font's line height. Characters outside the rasterized range are
/// skipped.
pub fn draw_text(
    batch: &mut SpriteBatch,
    font: &Font,
    origin: Vec2,
    scale: f32,
    text: &str,
    color: Vec4,
) {
    let mut cursor = origin;

    for ch in text.chars() {
        if ch == '\n' {
            cursor.x = origin.x;
            cursor.y += font.line_height * scale;
            continue;
        }

        let Some(glyph) = font.glyph(ch) else { continue };

        if let Some(texture) = glyph.texture {
            // Quad center from the baseline cursor: fontdue's ymin is Y-up
            // relative to the baseline, our screen space is Y-down.
            let center = Vec2::new(
                cursor.x + (glyph.xmin + glyph.width / 2.0) * scale,
                cursor.y - (glyph.ymin + glyph.height / 2.0) * scale,
            );
            let half = Vec2::new(glyph.width / 2.0, glyph.height / 2.0) * scale;

            batch.push(&Sprite {
                texture,
                transform: sprite_transform(center, half),
                color,
                flags: SPRITE_TEXT,
            });
        }

        cursor.x += glyph.advance * scale;
    }
}
