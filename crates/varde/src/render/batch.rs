//! # Batch — Accumulate Per-Instance Sprite Data
//!
//! The CPU side of the instanced renderer. Sprites are pushed one at a time
//! during the entity pass; the batch packs each into a fixed-capacity
//! segment of [`InstanceData`] plus a parallel array of texture indices —
//! the exact layouts the shader's storage buffers expect.
//!
//! ## Why One Draw Call per Segment Works
//!
//! A classic sprite batcher must break the batch every time the texture
//! changes, because only one texture is bound at a time. Here every
//! instance carries an *index* into a texture binding array instead, so a
//! segment full of sprites with 50 different textures is still exactly one
//! instanced draw. The only thing that ends a segment is running out of
//! room.
//!
//! ## Flush Semantics
//!
//! Capacity is a compile-time constant ([`BATCH_CAPACITY`]); the arrays
//! never grow. The push that fills the last slot seals the segment
//! immediately, and the next push starts a fresh one — sprites are never
//! dropped, and submission order is preserved across the boundary (sprite
//! N and N+1 straddling a seal still draw in order, just in two calls).
//! [`SpriteBatch::drain_segments`] seals any partial tail and hands the
//! segments to the GPU pass in order.
//!
//! Sealing is separated from drawing because wgpu executes buffer writes
//! and encoded draws together at queue submission — a mid-pass "draw right
//! now" cannot exist. Sealing pins down the flush boundary and ordering at
//! submission time; the render pass then issues one instanced draw per
//! sealed segment.

use bytemuck::{Pod, Zeroable};

use super::Sprite;

/// Instances per batch segment. Filling a segment seals it (an implicit
/// flush); the array is never grown.
pub const BATCH_CAPACITY: usize = 1024;

/// Per-instance data mirrored into the instance storage buffer.
///
/// Layout matches the WGSL `Instance` struct: the trailing pad brings the
/// size to 96 bytes, the storage-buffer array stride for a struct with a
/// `mat4x4<f32>`, a `vec4<f32>`, and a `u32`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct InstanceData {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub flags: u32,
    pub _pad: [u32; 3],
}

impl InstanceData {
    fn from_sprite(sprite: &Sprite) -> Self {
        Self {
            transform: sprite.transform.to_cols_array_2d(),
            color: sprite.color.to_array(),
            flags: sprite.flags,
            _pad: [0; 3],
        }
    }
}

/// One sealed flush: up to [`BATCH_CAPACITY`] instances and their texture
/// indices, drawn with a single instanced call.
pub struct BatchSegment {
    pub(crate) instances: Vec<InstanceData>,
    pub(crate) textures: Vec<u32>,
}

impl BatchSegment {
    /// Number of instances in this flush.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Accumulates sprite submissions for the current frame.
pub struct SpriteBatch {
    instances: Vec<InstanceData>,
    textures: Vec<u32>,
    sealed: Vec<BatchSegment>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(BATCH_CAPACITY),
            textures: Vec::with_capacity(BATCH_CAPACITY),
            sealed: Vec::new(),
        }
    }

    /// Append one sprite. Seals the segment as a side effect when it
    /// reaches capacity.
    pub fn push(&mut self, sprite: &Sprite) {
        debug_assert!(self.instances.len() < BATCH_CAPACITY);
        self.instances.push(InstanceData::from_sprite(sprite));
        self.textures.push(sprite.texture.index());

        if self.instances.len() == BATCH_CAPACITY {
            self.seal();
        }
    }

    fn seal(&mut self) {
        self.sealed.push(BatchSegment {
            instances: std::mem::take(&mut self.instances),
            textures: std::mem::take(&mut self.textures),
        });
        self.instances.reserve(BATCH_CAPACITY);
        self.textures.reserve(BATCH_CAPACITY);
    }

    /// Seal the partial tail (if any) and take all segments, in submission
    /// order. Leaves the batch empty for the next frame.
    pub fn drain_segments(&mut self) -> Vec<BatchSegment> {
        if !self.instances.is_empty() {
            self.seal();
        }
        std::mem::take(&mut self.sealed)
    }

    /// Instances submitted since the last seal.
    pub fn pending(&self) -> usize {
        self.instances.len()
    }

    /// Segments sealed since the last drain.
    pub fn sealed_count(&self) -> usize {
        self.sealed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.sealed.is_empty()
    }
}

impl Default for SpriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::texture::TextureHandle;

    fn sprite(texture_index: u32) -> Sprite {
        Sprite::new(TextureHandle::from_index(texture_index))
    }

    #[test]
    fn instance_data_matches_shader_stride() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 96);
        assert_eq!(std::mem::align_of::<InstanceData>(), 4);
    }

    #[test]
    fn filling_to_capacity_seals_exactly_once() {
        let mut batch = SpriteBatch::new();
        for _ in 0..BATCH_CAPACITY {
            batch.push(&sprite(0));
        }
        assert_eq!(batch.sealed_count(), 1);
        assert_eq!(batch.pending(), 0);

        let segments = batch.drain_segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), BATCH_CAPACITY);
    }

    #[test]
    fn overflow_by_one_leaves_one_pending() {
        let mut batch = SpriteBatch::new();
        for _ in 0..BATCH_CAPACITY + 1 {
            batch.push(&sprite(0));
        }
        assert_eq!(batch.sealed_count(), 1);
        assert_eq!(batch.pending(), 1);

        let segments = batch.drain_segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), BATCH_CAPACITY);
        assert_eq!(segments[1].len(), 1);
    }

    #[test]
    fn submission_order_survives_the_seal_boundary() {
        let mut batch = SpriteBatch::new();
        let total = BATCH_CAPACITY + 10;
        for i in 0..total {
            batch.push(&sprite(i as u32));
        }

        let segments = batch.drain_segments();
        let order: Vec<u32> = segments.iter().flat_map(|s| s.textures.iter().copied()).collect();
        let expected: Vec<u32> = (0..total as u32).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn drain_resets_the_batch() {
        let mut batch = SpriteBatch::new();
        batch.push(&sprite(7));
        let segments = batch.drain_segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 1);
        assert!(batch.is_empty());
        assert!(batch.drain_segments().is_empty());
    }

    #[test]
    fn instance_captures_sprite_fields() {
        use crate::math::{Mat4, Vec4};
        use crate::render::SPRITE_TEXT;

        let s = Sprite {
            texture: TextureHandle::from_index(3),
            transform: Mat4::from_scale(glam::Vec3::new(2.0, 4.0, 1.0)),
            color: Vec4::new(0.5, 0.25, 1.0, 1.0),
            flags: SPRITE_TEXT,
        };
        let mut batch = SpriteBatch::new();
        batch.push(&s);
        let segments = batch.drain_segments();
        let inst = &segments[0].instances[0];
        assert_eq!(inst.transform[0][0], 2.0);
        assert_eq!(inst.transform[1][1], 4.0);
        assert_eq!(inst.color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(inst.flags, SPRITE_TEXT);
        assert_eq!(segments[0].textures[0], 3);
    }
}
