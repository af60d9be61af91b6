//! # Sprite Renderer — One Instanced Draw Call per Flush
//!
//! GPU half of the batcher. The geometry is a single unit quad (4 vertices,
//! triangle strip); everything that varies per sprite arrives through two
//! storage buffers,
//! written once per frame and bound with dynamic offsets:
//!
//! ```text
//! group 0: camera            uniform   mat4x4 (orthographic projection)
//! group 1: instances         storage   [Instance; 1024] per segment  ─┐ dynamic
//!          instance_textures storage   [u32; 1024]      per segment  ─┘ offsets
//! group 2: textures          binding_array<texture_2d, 256> + sampler
//! ```
//!
//! Each sealed [`BatchSegment`](super::batch::BatchSegment) occupies one
//! segment-sized region of the storage buffers; only the segment's live
//! instance count is written (stale capacity slots are neither uploaded nor
//! drawn), and one `draw(0..4, 0..count)` is recorded per segment, in
//! submission order. The buffers grow in whole segments on the rare frame
//! that seals more of them than ever before.
//!
//! Alpha blending is on and there is no depth buffer: submission order is
//! paint order, which the batch preserves.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::math::screen_projection;

use super::batch::{BATCH_CAPACITY, InstanceData, SpriteBatch};
use super::gpu::GpuContext;
use super::texture::{MAX_TEXTURES, TextureRegistry};

/// Byte span one segment occupies in the instance storage buffer.
/// 1024 × 96 B — a multiple of the 256-byte dynamic-offset alignment.
const INSTANCE_SEGMENT_BYTES: u64 = (BATCH_CAPACITY * std::mem::size_of::<InstanceData>()) as u64;

/// Byte span one segment occupies in the texture-index storage buffer.
const TEXTURE_SEGMENT_BYTES: u64 = (BATCH_CAPACITY * std::mem::size_of::<u32>()) as u64;

const INITIAL_SEGMENTS: usize = 4;

/// Per-vertex data of the shared unit quad.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

impl QuadVertex {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Unit quad in strip order; with the y-down projection, v = 0 is the top
/// edge of the sprite.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 1.0] },
];

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// GPU resources for the instanced sprite pipeline.
pub struct SpriteRenderer {
    pipeline: wgpu::RenderPipeline,
    textures_layout: wgpu::BindGroupLayout,
    instances_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    texture_index_buffer: wgpu::Buffer,
    instances_bind_group: wgpu::BindGroup,
    /// How many segments the storage buffers currently hold.
    segment_capacity: usize,
}

impl SpriteRenderer {
    pub(crate) fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        // Group 0: camera uniform.
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // Group 1: per-instance storage buffers, one segment visible at a
        // time through dynamic offsets.
        let instances_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("instance bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(INSTANCE_SEGMENT_BYTES),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(TEXTURE_SEGMENT_BYTES),
                    },
                    count: None,
                },
            ],
        });

        // Group 2: the texture binding array + shared sampler.
        let textures_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture array bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: Some(std::num::NonZeroU32::new(MAX_TEXTURES as u32).unwrap()),
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite pipeline layout"),
            bind_group_layouts: &[&camera_layout, &instances_layout, &textures_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // 2D sprites are double-sided
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (width, height) = gpu.surface_size();
        let camera_uniform = CameraUniform {
            view_proj: screen_projection(width as f32, height as f32).to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniform buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("unit quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let (instance_buffer, texture_index_buffer, instances_bind_group) =
            Self::create_segment_buffers(device, &instances_layout, INITIAL_SEGMENTS);

        Self {
            pipeline,
            textures_layout,
            instances_layout,
            sampler,
            camera_buffer,
            camera_bind_group,
            quad_buffer,
            instance_buffer,
            texture_index_buffer,
            instances_bind_group,
            segment_capacity: INITIAL_SEGMENTS,
        }
    }

    fn create_segment_buffers(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        segments: usize,
    ) -> (wgpu::Buffer, wgpu::Buffer, wgpu::BindGroup) {
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance storage buffer"),
            size: segments as u64 * INSTANCE_SEGMENT_BYTES,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let texture_index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance texture storage buffer"),
            size: segments as u64 * TEXTURE_SEGMENT_BYTES,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("instance bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &instance_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(INSTANCE_SEGMENT_BYTES),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &texture_index_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(TEXTURE_SEGMENT_BYTES),
                    }),
                },
            ],
        });

        (instance_buffer, texture_index_buffer, bind_group)
    }

    /// Grow the storage buffers to hold at least `segments` segments.
    fn ensure_segment_capacity(&mut self, gpu: &GpuContext, segments: usize) {
        if segments <= self.segment_capacity {
            return;
        }
        let new_capacity = segments.next_power_of_two();
        log::debug!("growing instance buffers to {new_capacity} segments");
        let (instance_buffer, texture_index_buffer, bind_group) =
            Self::create_segment_buffers(&gpu.device, &self.instances_layout, new_capacity);
        self.instance_buffer = instance_buffer;
        self.texture_index_buffer = texture_index_buffer;
        self.instances_bind_group = bind_group;
        self.segment_capacity = new_capacity;
    }

    /// Refresh the camera uniform for a new viewport size.
    pub(crate) fn update_projection(&self, gpu: &GpuContext, width: u32, height: u32) {
        let camera = CameraUniform {
            view_proj: screen_projection(width as f32, height as f32).to_cols_array_2d(),
        };
        gpu.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));
    }

    /// Draw the frame: upload every sealed segment, clear the surface, and
    /// issue one instanced draw per segment in submission order.
    pub(crate) fn render_frame(
        &mut self,
        gpu: &GpuContext,
        registry: &mut TextureRegistry,
        batch: &mut SpriteBatch,
        clear_color: [f64; 4],
    ) -> Result<(), wgpu::SurfaceError> {
        let segments = batch.drain_segments();
        self.ensure_segment_capacity(gpu, segments.len());

        // Upload only each segment's live instances; stale tail slots in a
        // partially filled segment are never read by its draw.
        for (i, segment) in segments.iter().enumerate() {
            gpu.queue.write_buffer(
                &self.instance_buffer,
                i as u64 * INSTANCE_SEGMENT_BYTES,
                bytemuck::cast_slice(&segment.instances),
            );
            gpu.queue.write_buffer(
                &self.texture_index_buffer,
                i as u64 * TEXTURE_SEGMENT_BYTES,
                bytemuck::cast_slice(&segment.textures),
            );
        }

        let textures_bind_group = registry.bind_group(gpu, &self.textures_layout, &self.sampler);

        let output = gpu.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("varde frame encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color[0],
                            g: clear_color[1],
                            b: clear_color[2],
                            a: clear_color[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !segments.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.camera_bind_group, &[]);
                pass.set_bind_group(2, textures_bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_buffer.slice(..));

                for (i, segment) in segments.iter().enumerate() {
                    let offsets = [
                        (i as u64 * INSTANCE_SEGMENT_BYTES) as u32,
                        (i as u64 * TEXTURE_SEGMENT_BYTES) as u32,
                    ];
                    pass.set_bind_group(1, &self.instances_bind_group, &offsets);
                    pass.draw(0..4, 0..segment.len() as u32);
                }
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
