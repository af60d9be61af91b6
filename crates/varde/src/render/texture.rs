//! # Texture Registry — A Fixed Table the Shader Indexes Directly
//!
//! Every texture the engine ever samples lives in one table of at most
//! [`MAX_TEXTURES`] entries, mirrored on the GPU as
//! `binding_array<texture_2d<f32>, 256>`. A [`TextureHandle`] is the slot
//! index, carried per instance through the batch — the wgpu equivalent of a
//! GL bindless handle. This is what lets sprites with different textures
//! share one instanced draw call: the fragment shader picks the texture by
//! the instance's index instead of whatever happens to be bound.
//!
//! ## The Handle Pattern
//!
//! Users never hold a `wgpu::Texture`. [`TextureRegistry::load_bytes`]
//! returns a `Copy`able [`TextureHandle`] newtype; the registry owns the
//! GPU resources and the handle is meaningless arithmetic-free identity.
//! Slot 0 is always a 1x1 white texture — untextured sprites sample it and
//! come out as their tint color, so there is no separate "solid color" path
//! in the shader.
//!
//! ## Capacity and Failure
//!
//! The table is fixed-size because the shader's binding array is. Loading
//! into a full table is a reported failure
//! ([`EngineError::RegistryFull`]), never silent truncation. A failed load
//! (full table, undecodable bytes) leaves the registry exactly as it was;
//! any GPU objects created before the failure are released by RAII rather
//! than leaked.
//!
//! ## Teardown
//!
//! Dropping the registry drops every view and texture, which wgpu releases
//! before the device goes away — the equivalent of making each handle
//! non-resident and deleting the underlying texture objects in one sweep.

use crate::error::EngineError;
use crate::math::Vec2;

use super::gpu::GpuContext;

/// Capacity of the registry and of the shader-side binding array.
pub const MAX_TEXTURES: usize = 256;

/// Index of a texture in the [`TextureRegistry`] and in the shader's
/// binding array. Obtained from the registry; not an arithmetic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    /// The built-in 1x1 white texture at slot 0.
    pub const WHITE: TextureHandle = TextureHandle(0);

    pub(crate) fn from_index(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> u32 {
        self.0
    }
}

struct TextureEntry {
    // The texture keeps its view alive; held so teardown order is explicit.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Owns every sampled texture and the bind group exposing them as one
/// binding array.
pub struct TextureRegistry {
    entries: Vec<TextureEntry>,
    /// Rebuilt lazily after any entry is added.
    bind_group: Option<wgpu::BindGroup>,
}

impl TextureRegistry {
    /// Create the registry with the white texture occupying slot 0.
    pub(crate) fn new(gpu: &GpuContext) -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            bind_group: None,
        };
        registry
            .add(
                gpu,
                "white 1x1",
                1,
                1,
                &[255u8, 255, 255, 255],
                wgpu::TextureFormat::Rgba8UnormSrgb,
            )
            .expect("registry can always hold the built-in white texture");
        registry
    }

    /// Decode compressed image bytes (PNG/JPEG) and register the pixels.
    ///
    /// Fails without modifying the registry if the table is full or the
    /// bytes don't decode.
    pub fn load_bytes(&mut self, gpu: &GpuContext, bytes: &[u8]) -> Result<TextureHandle, EngineError> {
        if self.entries.len() >= MAX_TEXTURES {
            return Err(EngineError::RegistryFull { capacity: MAX_TEXTURES });
        }

        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        self.add(
            gpu,
            "loaded image",
            width,
            height,
            &decoded.into_raw(),
            wgpu::TextureFormat::Rgba8UnormSrgb,
        )
    }

    /// Register raw RGBA8 pixels (procedural textures).
    pub fn create_rgba(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureHandle, EngineError> {
        self.add(gpu, label, width, height, pixels, wgpu::TextureFormat::Rgba8UnormSrgb)
    }

    /// Register a single-channel coverage bitmap (glyphs). Sampled through
    /// the red channel by the text path in the shader.
    #[cfg(feature = "text")]
    pub(crate) fn create_r8(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        coverage: &[u8],
    ) -> Result<TextureHandle, EngineError> {
        self.add(gpu, label, width, height, coverage, wgpu::TextureFormat::R8Unorm)
    }

    fn add(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
        format: wgpu::TextureFormat,
    ) -> Result<TextureHandle, EngineError> {
        if self.entries.len() >= MAX_TEXTURES {
            return Err(EngineError::RegistryFull { capacity: MAX_TEXTURES });
        }

        use wgpu::util::DeviceExt;
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let handle = TextureHandle(self.entries.len() as u32);
        self.entries.push(TextureEntry {
            _texture: texture,
            view,
            width,
            height,
        });
        self.bind_group = None;

        Ok(handle)
    }

    /// Number of occupied slots (including the built-in white texture).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pixel dimensions of a registered texture.
    ///
    /// # Panics
    ///
    /// Panics if the handle did not come from this registry.
    pub fn size_of(&self, handle: TextureHandle) -> Vec2 {
        let entry = &self.entries[handle.0 as usize];
        Vec2::new(entry.width as f32, entry.height as f32)
    }

    /// The binding-array bind group, rebuilt if any texture was added since
    /// the last call. Unused array slots alias the white texture's view.
    pub(crate) fn bind_group(
        &mut self,
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) -> &wgpu::BindGroup {
        if self.bind_group.is_none() {
            let views: Vec<&wgpu::TextureView> = (0..MAX_TEXTURES)
                .map(|i| {
                    let entry = self.entries.get(i).unwrap_or(&self.entries[0]);
                    &entry.view
                })
                .collect();

            self.bind_group = Some(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("texture registry bind group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureViewArray(&views),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            }));
        }

        self.bind_group.as_ref().unwrap()
    }
}
