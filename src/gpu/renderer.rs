// ============================================================================
// MODEL RENDERER — draws the model shaded (display) or as UVs (picking)
// ============================================================================

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::context::{GpuContext, GpuError};
use super::mesh::GpuMesh;
use super::picking::{PickError, PickTarget};
use super::texture::CanvasTexture;
use crate::camera::OrbitCamera;
use crate::canvas::Canvas;
use crate::model::Mesh;
use crate::stroke::InputEvent;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const DISPLAY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const UV_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Background of the shaded view.
const CLEAR_COLOR: wgpu::Color = wgpu::Color::WHITE;
const LIGHT_POS: [f32; 4] = [-1.0, 1.0, 4.0, 1.0];
const LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const AMBIENT: f32 = 0.35;

// ============================================================================
// UNIFORM TYPES
// ============================================================================

/// Camera + light, shared by both pipelines at group 0.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub light_pos: [f32; 4],
    /// rgb = light color, a = ambient strength
    pub light_color: [f32; 4],
}

impl SceneUniforms {
    pub fn new(camera: &OrbitCamera, aspect: f32) -> Self {
        let view_proj: Mat4 = camera.projection_matrix(aspect) * camera.view_matrix();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: camera.model_matrix().to_cols_array_2d(),
            light_pos: LIGHT_POS,
            light_color: [LIGHT_COLOR[0], LIGHT_COLOR[1], LIGHT_COLOR[2], AMBIENT],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Lit and textured with the canvas, for display.
    Shaded,
    /// Texture coordinates as color, for the surface picker.
    UvPick,
}

// ============================================================================
// MODEL RENDERER
// ============================================================================

pub struct ModelRenderer {
    shaded_pipeline: wgpu::RenderPipeline,
    uv_pipeline: wgpu::RenderPipeline,
    pub canvas_bgl: wgpu::BindGroupLayout,
    pub canvas_sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

impl ModelRenderer {
    pub fn new(device: &wgpu::Device) -> Self {
        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
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
        });
        let canvas_bgl = CanvasTexture::bind_group_layout(device);
        let canvas_sampler = CanvasTexture::create_sampler(device);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shaded_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::MESH_SHADER.into()),
        });
        let uv_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("uv_pick_shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::UV_PICK_SHADER.into()),
        });

        let shaded_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&scene_bgl, &canvas_bgl],
            push_constant_ranges: &[],
        });
        let uv_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("uv_pick_pipeline_layout"),
            bind_group_layouts: &[&scene_bgl],
            push_constant_ranges: &[],
        });

        let shaded_pipeline = Self::create_pipeline(
            device,
            "mesh_pipeline",
            &shaded_layout,
            &shaded_shader,
            ("vs_main", "fs_main"),
            DISPLAY_FORMAT,
        );
        let uv_pipeline = Self::create_pipeline(
            device,
            "uv_pick_pipeline",
            &uv_layout,
            &uv_shader,
            ("vs_uv", "fs_uv"),
            UV_FORMAT,
        );

        Self {
            shaded_pipeline,
            uv_pipeline,
            canvas_bgl,
            canvas_sampler,
            uniform_buffer,
            uniform_bind_group,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::PipelineLayout,
        module: &wgpu::ShaderModule,
        (vs, fs): (&str, &str),
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: vs,
                buffers: &[GpuMesh::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: fs,
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // UV values must land unmodified; no blending on either pass
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // OBJ winding is not reliable
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &SceneUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Record one pass drawing `mesh` into the given color + depth target.
    /// `canvas` is required for `RenderMode::Shaded` and ignored otherwise.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        mode: RenderMode,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        mesh: &GpuMesh,
        canvas: Option<&CanvasTexture>,
    ) {
        let (clear, label) = match mode {
            RenderMode::Shaded => (CLEAR_COLOR, "model_shaded_pass"),
            // alpha 0 marks "no geometry" for the picker
            RenderMode::UvPick => (wgpu::Color::TRANSPARENT, "model_uv_pass"),
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        match mode {
            RenderMode::Shaded => {
                let Some(canvas) = canvas else {
                    return;
                };
                pass.set_pipeline(&self.shaded_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                canvas.bind(&mut pass, 1);
            }
            RenderMode::UvPick => {
                pass.set_pipeline(&self.uv_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            }
        }
        mesh.draw(&mut pass);
    }
}

// ============================================================================
// OFFSCREEN TARGET (color + depth)
// ============================================================================

pub struct OffscreenTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            width,
            height,
        }
    }
}

/// `bytes_per_row` for copies out of a texture must be 256-aligned.
pub(crate) fn aligned_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Copy a region of `texture` into a (cached) staging buffer and block
/// until it is mapped.  Returns tightly packed rows, top row first.
pub(crate) fn readback_region(
    ctx: &GpuContext,
    texture: &wgpu::Texture,
    origin: (u32, u32),
    size: (u32, u32),
    bytes_per_pixel: u32,
    cached_staging: &mut Option<(wgpu::Buffer, u64)>,
) -> Result<Vec<u8>, wgpu::BufferAsyncError> {
    let (region_w, region_h) = size;
    let bytes_per_row = aligned_bytes_per_row(region_w, bytes_per_pixel);
    let buffer_size = (bytes_per_row * region_h) as u64;

    // Reuse the staging buffer when it is large enough
    if !matches!(cached_staging, Some((_, sz)) if *sz >= buffer_size) {
        *cached_staging = None;
    }
    let (staging, _) = cached_staging.get_or_insert_with(|| {
        let buf = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        (buf, buffer_size)
    });
    let staging: &wgpu::Buffer = staging;

    let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: origin.0,
                y: origin.1,
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(region_h),
            },
        },
        wgpu::Extent3d {
            width: region_w,
            height: region_h,
            depth_or_array_layers: 1,
        },
    );
    ctx.submit_one(encoder);

    let slice = staging.slice(..buffer_size);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.wait_idle();
    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        // callback dropped without firing: the map never completed
        Err(_) => return Err(wgpu::BufferAsyncError),
    }

    let mapped = slice.get_mapped_range();
    let actual_row = (region_w * bytes_per_pixel) as usize;
    let mut result = Vec::with_capacity(actual_row * region_h as usize);
    for y in 0..region_h as usize {
        let start = y * bytes_per_row as usize;
        result.extend_from_slice(&mapped[start..start + actual_row]);
    }
    drop(mapped);
    staging.unmap();

    Ok(result)
}

/// Views larger than the device limit render at the limit; picks outside
/// the target then read as misses.
fn clamp_view_size(ctx: &GpuContext, width: u32, height: u32) -> (u32, u32) {
    let max = ctx.max_texture_dim.max(1);
    (width.clamp(1, max), height.clamp(1, max))
}

fn create_canvas_texture(
    ctx: &GpuContext,
    renderer: &ModelRenderer,
    canvas: &Canvas,
) -> Result<CanvasTexture, GpuError> {
    let (width, height) = (canvas.width(), canvas.height());
    if !ctx.supports_size(width, height) {
        return Err(GpuError::TextureTooLarge {
            width,
            height,
            max: ctx.max_texture_dim,
        });
    }
    Ok(CanvasTexture::new(
        &ctx.device,
        ctx.queue.clone(),
        &renderer.canvas_bgl,
        &renderer.canvas_sampler,
        canvas,
    ))
}

// ============================================================================
// SCENE VIEW — everything the main view needs on the GPU
// ============================================================================

/// Owns the device, the model, the canvas texture and the two offscreen
/// targets (display and UV pick) of the main view.  Both targets always
/// share the view's size.
pub struct SceneView {
    pub(crate) ctx: GpuContext,
    pub(crate) renderer: ModelRenderer,
    pub(crate) mesh: GpuMesh,
    canvas_tex: CanvasTexture,
    display: OffscreenTarget,
    pub(crate) pick: PickTarget,
    camera: OrbitCamera,
    /// Bumped whenever camera or viewport change; the UV pass is cached
    /// per generation.
    pub(crate) generation: u64,
    display_staging: Option<(wgpu::Buffer, u64)>,
}

impl SceneView {
    /// Fails if the canvas does not fit in a device texture, or if the
    /// pick target cannot be created or read back; 3D painting is
    /// impossible without either.
    pub fn new(
        ctx: GpuContext,
        mesh: &Mesh,
        canvas: &Canvas,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuError> {
        let (width, height) = clamp_view_size(&ctx, width, height);
        let renderer = ModelRenderer::new(&ctx.device);
        let canvas_tex = create_canvas_texture(&ctx, &renderer, canvas)?;
        let gpu_mesh = GpuMesh::new(&ctx.device, mesh);
        let display = OffscreenTarget::new(&ctx.device, "display_target", width, height, DISPLAY_FORMAT);
        let pick = PickTarget::new(&ctx, width, height)?;

        Ok(Self {
            ctx,
            renderer,
            mesh: gpu_mesh,
            canvas_tex,
            display,
            pick,
            camera: OrbitCamera::default(),
            generation: 0,
            display_staging: None,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }

    pub fn size(&self) -> (u32, u32) {
        (self.display.width, self.display.height)
    }

    /// Match the view's framebuffer size.  No-op if unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), PickError> {
        let (width, height) = clamp_view_size(&self.ctx, width, height);
        if (width, height) == self.size() {
            return Ok(());
        }
        self.pick = PickTarget::new(&self.ctx, width, height)?;
        self.display = OffscreenTarget::new(&self.ctx.device, "display_target", width, height, DISPLAY_FORMAT);
        self.generation += 1;
        crate::log_info!("[GPU] main view resized to {}x{}", width, height);
        Ok(())
    }

    /// Direct camera access; any cached UV pass is invalidated.
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        self.generation += 1;
        &mut self.camera
    }

    /// Forward a camera event.  Returns `true` if the view changed.
    pub fn handle_camera_event(&mut self, event: &InputEvent) -> bool {
        let changed = self.camera.handle(event);
        if changed {
            self.generation += 1;
        }
        changed
    }

    pub fn scroll(&mut self, delta_y: f32) -> bool {
        let changed = self.camera.scroll(delta_y);
        if changed {
            self.generation += 1;
        }
        changed
    }

    /// GPU copy of the canvas, as a sync target.
    pub fn canvas_texture_mut(&mut self) -> &mut CanvasTexture {
        &mut self.canvas_tex
    }

    /// Rebuild the canvas texture for a canvas of a different size.  On
    /// error the current texture stays in place.
    pub fn recreate_canvas_texture(&mut self, canvas: &Canvas) -> Result<(), GpuError> {
        self.canvas_tex = create_canvas_texture(&self.ctx, &self.renderer, canvas)?;
        Ok(())
    }

    pub fn max_texture_dim(&self) -> u32 {
        self.ctx.max_texture_dim
    }

    pub(crate) fn uniforms(&self) -> SceneUniforms {
        let (w, h) = self.size();
        SceneUniforms::new(&self.camera, w as f32 / h as f32)
    }

    /// Render the shaded model and read it back as RGBA8, top row first.
    /// `None` if the read-back failed.
    pub fn render_display(&mut self) -> Option<Vec<u8>> {
        self.renderer.write_uniforms(&self.ctx.queue, &self.uniforms());
        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("display_encoder"),
        });
        self.renderer.encode(
            &mut encoder,
            RenderMode::Shaded,
            &self.display.color_view,
            &self.display.depth_view,
            &self.mesh,
            Some(&self.canvas_tex),
        );
        self.ctx.submit_one(encoder);

        let (w, h) = self.size();
        match readback_region(&self.ctx, &self.display.color, (0, 0), (w, h), 4, &mut self.display_staging) {
            Ok(pixels) => Some(pixels),
            Err(e) => {
                crate::log_err!("[GPU] display read-back failed: {:?}", e);
                None
            }
        }
    }
}
