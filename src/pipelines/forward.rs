//! Forward Blinn-Phong renderer.
//!
//! Draw calls are recorded while the scene is walked and replayed in a single render
//! pass on [`ShaderProgram::present`]. Per-draw transforms live in one uniform buffer
//! addressed through dynamic offsets, so a frame costs one buffer write for the draws
//! and one for the camera and lights.
//!
//! Bind groups:
//! - group 0: [`FrameUniform`] (camera and lights)
//! - group 1: [`DrawUniform`] with a dynamic offset
//! - group 2: base colour, specular and normal maps with their samplers

use std::{
    collections::HashMap,
    iter,
    rc::{Rc, Weak},
};

use cgmath::Matrix4;

use crate::{
    camera::Camera,
    context::GpuContext,
    data_structures::{
        light::LightSet,
        material::{Material, SharedMaterial},
        mesh::{Mesh, ModelVertex},
        texture::{DefaultTextures, GpuTexture},
    },
    error::FrameError,
    pipelines::{
        PipelineTargets, mk_render_pipeline,
        uniforms::{DrawUniform, FrameUniform, align_to},
    },
    render::ShaderProgram,
};

const INITIAL_DRAW_CAPACITY: usize = 64;

struct DrawCall {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
    material: wgpu::BindGroup,
}

pub struct ForwardShader {
    ctx: GpuContext,
    pipeline: wgpu::RenderPipeline,

    frame: FrameUniform,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    draw_layout: wgpu::BindGroupLayout,
    draw_stride: u64,
    draw_capacity: usize,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    next_draw: DrawUniform,
    draws: Vec<DrawUniform>,

    material_layout: wgpu::BindGroupLayout,
    materials: HashMap<usize, (Weak<Material>, wgpu::BindGroup)>,
    default_material: wgpu::BindGroup,
    next_material: wgpu::BindGroup,
    defaults: DefaultTextures,

    calls: Vec<DrawCall>,
    active: bool,
}

impl ForwardShader {
    /// Builds the pipeline with the bundled shader.
    pub fn new(ctx: GpuContext) -> Self {
        Self::with_source(ctx, include_str!("forward.wgsl"))
    }

    /// Builds the pipeline from WGSL source with `vs_main` and `fs_main` entry points.
    pub fn with_source(ctx: GpuContext, source: &str) -> Self {
        let device = &ctx.device;

        let frame = FrameUniform::default();
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("frame_bind_group_layout"),
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
            label: Some("frame_bind_group"),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniform>() as u64
                    ),
                },
                count: None,
            }],
            label: Some("draw_bind_group_layout"),
        });
        let draw_stride = align_to(
            std::mem::size_of::<DrawUniform>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (draw_buffer, draw_bind_group) =
            create_draw_buffer(device, &draw_layout, draw_stride, INITIAL_DRAW_CAPACITY);

        let material_layout = material_bind_group_layout(device);

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[Some(&frame_layout), Some(&draw_layout), Some(&material_layout)],
            immediate_size: 0,
        });
        let pipeline = mk_render_pipeline(
            device,
            &render_pipeline_layout,
            PipelineTargets {
                label: "Forward Pipeline",
                colour_format: ctx.config.format,
                blend: Some(wgpu::BlendState::REPLACE),
                depth_format: Some(GpuTexture::DEPTH_FORMAT),
                cull_mode: Some(wgpu::Face::Back),
            },
            &[ModelVertex::desc()],
            wgpu::ShaderModuleDescriptor {
                label: Some("Forward Shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            },
        );

        let defaults = DefaultTextures::default();
        let default_material = create_material_bind_group(
            &ctx,
            &material_layout,
            &defaults,
            &Material::default(),
        );

        Self {
            pipeline,
            frame,
            frame_buffer,
            frame_bind_group,
            draw_layout,
            draw_stride,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            draw_buffer,
            draw_bind_group,
            next_draw: DrawUniform::default(),
            draws: Vec::new(),
            material_layout,
            materials: HashMap::new(),
            next_material: default_material.clone(),
            default_material,
            defaults,
            calls: Vec::new(),
            active: false,
            ctx,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    fn material_bind_group(&mut self, material: &SharedMaterial) -> wgpu::BindGroup {
        let key = Rc::as_ptr(material) as usize;
        if let Some((weak, group)) = self.materials.get(&key)
            && weak
                .upgrade()
                .is_some_and(|cached| Rc::ptr_eq(&cached, material))
        {
            return group.clone();
        }
        let group =
            create_material_bind_group(&self.ctx, &self.material_layout, &self.defaults, material);
        self.materials
            .insert(key, (Rc::downgrade(material), group.clone()));
        group
    }

    fn ensure_draw_capacity(&mut self, draws: usize) {
        if draws <= self.draw_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        log::debug!("Growing draw uniform buffer to {} entries", capacity);
        let (buffer, group) =
            create_draw_buffer(&self.ctx.device, &self.draw_layout, self.draw_stride, capacity);
        self.draw_buffer = buffer;
        self.draw_bind_group = group;
        self.draw_capacity = capacity;
    }

    fn write_uniforms(&mut self) {
        self.ctx
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&self.frame));
        if self.draws.is_empty() {
            return;
        }
        let stride = self.draw_stride as usize;
        let mut staging = vec![0u8; stride * self.draws.len()];
        for (chunk, draw) in staging.chunks_mut(stride).zip(&self.draws) {
            let bytes = bytemuck::bytes_of(draw);
            chunk[..bytes.len()].copy_from_slice(bytes);
        }
        self.ctx.queue.write_buffer(&self.draw_buffer, 0, &staging);
    }
}

impl ShaderProgram for ForwardShader {
    fn activate(&mut self) -> Result<(), FrameError> {
        self.active = true;
        self.calls.clear();
        self.draws.clear();
        self.next_draw = DrawUniform::default();
        self.next_material = self.default_material.clone();
        Ok(())
    }

    fn set_world_transform(&mut self, camera: &Camera) -> Result<(), FrameError> {
        if !self.active {
            return Err(FrameError::MissingProgram);
        }
        self.frame.set_camera(camera);
        Ok(())
    }

    fn set_model_transform(&mut self, transform: Matrix4<f32>) -> Result<(), FrameError> {
        if !self.active {
            return Err(FrameError::MissingProgram);
        }
        self.next_draw.set_transform(transform);
        Ok(())
    }

    fn set_material(&mut self, material: Option<&SharedMaterial>) -> Result<(), FrameError> {
        if !self.active {
            return Err(FrameError::MissingProgram);
        }
        self.next_draw.set_material(material.map(|m| m.as_ref()));
        self.next_material = match material {
            Some(material) => self.material_bind_group(material),
            None => self.default_material.clone(),
        };
        Ok(())
    }

    fn set_lights(&mut self, lights: &LightSet<'_>) -> Result<(), FrameError> {
        if !self.active {
            return Err(FrameError::MissingProgram);
        }
        self.frame.set_lights(lights);
        Ok(())
    }

    fn draw(&mut self, mesh: &Mesh) -> Result<(), FrameError> {
        if !self.active {
            return Err(FrameError::MissingProgram);
        }
        if mesh.indices().is_empty() {
            return Err(FrameError::UnreadyMesh(mesh.name.clone()));
        }
        // The next draw's slot must be addressable by a dynamic offset.
        let end = (self.draws.len() as u64 + 1) * self.draw_stride;
        if end > self.ctx.device.limits().max_buffer_size
            || end - self.draw_stride > u64::from(wgpu::DynamicOffset::MAX)
        {
            return Err(FrameError::UnresolvedUniform("draw"));
        }
        let buffers = mesh.buffers(&self.ctx.device);
        self.draws.push(self.next_draw);
        self.calls.push(DrawCall {
            vertex_buffer: buffers.vertex_buffer.clone(),
            index_buffer: buffers.index_buffer.clone(),
            num_elements: buffers.num_elements,
            material: self.next_material.clone(),
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), FrameError> {
        if !self.active {
            return Err(FrameError::MissingProgram);
        }
        self.active = false;
        self.materials
            .retain(|_, (weak, _)| weak.strong_count() > 0);

        self.ensure_draw_capacity(self.draws.len());
        self.write_uniforms();

        let (output, suboptimal) = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output) => (output, false),
            wgpu::CurrentSurfaceTexture::Suboptimal(output) => (output, true),
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => {
                log::debug!("Surface not ready, dropping {} draws", self.calls.len());
                self.calls.clear();
                return Ok(());
            }
            wgpu::CurrentSurfaceTexture::Outdated => {
                self.calls.clear();
                self.ctx.reconfigure();
                return Err(FrameError::Surface("outdated"));
            }
            wgpu::CurrentSurfaceTexture::Lost => {
                self.calls.clear();
                self.ctx.reconfigure();
                return Err(FrameError::Surface("lost"));
            }
            wgpu::CurrentSurfaceTexture::Validation => {
                self.calls.clear();
                return Err(FrameError::Surface("validation failed"));
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (i, call) in self.calls.iter().enumerate() {
                let offset = (i as u64 * self.draw_stride) as wgpu::DynamicOffset;
                render_pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                render_pass.set_bind_group(2, &call.material, &[]);
                render_pass.set_vertex_buffer(0, call.vertex_buffer.slice(..));
                render_pass.set_index_buffer(call.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..call.num_elements, 0, 0..1);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        self.calls.clear();
        if suboptimal {
            self.ctx.reconfigure();
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }
}

fn create_draw_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Draw Uniform Buffer"),
        size: stride * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
            }),
        }],
        label: Some("draw_bind_group"),
    });
    (buffer, group)
}

fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
            texture_entry(4),
            sampler_entry(5),
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// Uploads the material's maps if needed and binds them, substituting defaults for
/// empty maps.
fn create_material_bind_group(
    ctx: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    defaults: &DefaultTextures,
    material: &Material,
) -> wgpu::BindGroup {
    let (device, queue) = (&ctx.device, &ctx.queue);
    let base = material
        .base_colour_map
        .as_deref()
        .unwrap_or(&defaults.white)
        .gpu(device, queue);
    let specular = material
        .specular_map
        .as_deref()
        .unwrap_or(&defaults.white)
        .gpu(device, queue);
    let normal = material
        .normal_map
        .as_deref()
        .unwrap_or(&defaults.flat_normal)
        .gpu(device, queue);

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&base.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&base.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&specular.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(&specular.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(&normal.view),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::Sampler(&normal.sampler),
            },
        ],
        label: Some(&format!("{:?} material bind group", material.name)),
    })
}
