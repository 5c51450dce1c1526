// ============================================================================
// CANVAS TEXTURE — GPU copy of the canvas sampled by the model shader
// ============================================================================

use std::sync::Arc;

use crate::canvas::Canvas;
use crate::sync::TextureSink;

/// GPU-side texture holding the canvas pixels.
///
/// Uploads are always full-size: `queue.write_texture` over the whole
/// texture, rows in canvas order (row 0 = V 0).
pub struct CanvasTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
    queue: Arc<wgpu::Queue>,
}

impl CanvasTexture {
    /// Bind group layout: texture at binding 0, sampler at binding 1.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("canvas_tex_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Repeat-mode sampler; magnification stays nearest so painted pixels
    /// read as pixels on the model.
    pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("canvas_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }

    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        canvas: &Canvas,
    ) -> Self {
        let width = canvas.width();
        let height = canvas.height();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("CanvasTexture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("CanvasTexture bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let tex = Self {
            texture,
            view,
            bind_group,
            width,
            height,
            queue,
        };
        tex.upload_full(&canvas.to_rgba8());
        tex
    }

    /// Replace the whole texture with packed RGBA8 `data`.
    pub fn upload_full(&self, data: &[u8]) {
        debug_assert_eq!(data.len(), (self.width * self.height * 4) as usize);

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Bind for rendering at `group`.
    pub fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, group: u32) {
        pass.set_bind_group(group, &self.bind_group, &[]);
    }

    pub fn matches(&self, canvas: &Canvas) -> bool {
        self.width == canvas.width() && self.height == canvas.height()
    }
}

impl TextureSink for CanvasTexture {
    fn replace_all(&mut self, canvas: &Canvas) {
        if !self.matches(canvas) {
            crate::log_err!(
                "[GPU] canvas {}x{} does not match texture {}x{}, upload skipped",
                canvas.width(),
                canvas.height(),
                self.width,
                self.height
            );
            return;
        }
        self.upload_full(&canvas.to_rgba8());
    }
}
