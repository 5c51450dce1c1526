// ============================================================================
// GPU PICKING — UV pass target and single-texel read-back
// ============================================================================

use super::context::GpuContext;
use super::renderer::{OffscreenTarget, RenderMode, SceneView, UV_FORMAT, readback_region};
use crate::coords::{ScreenPoint, Uv};
use crate::picker::{SurfacePicker, decode_uv_texel, texel_coords};

/// Bytes per Rgba32Float texel.
const UV_TEXEL_BYTES: u32 = 16;

#[derive(Debug)]
pub enum PickError {
    /// The view is larger than the device can render to.
    UnsupportedSize { width: u32, height: u32 },
    /// Mapping the read-back buffer failed.
    Readback(String),
}

impl std::fmt::Display for PickError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickError::UnsupportedSize { width, height } => {
                write!(f, "pick target {}x{} exceeds device limits", width, height)
            }
            PickError::Readback(e) => write!(f, "pick read-back failed: {}", e),
        }
    }
}

impl std::error::Error for PickError {}

/// Offscreen float target the UV pass is drawn into, plus the generation
/// of the scene it currently holds.
pub struct PickTarget {
    target: OffscreenTarget,
    rendered_generation: Option<u64>,
    staging: Option<(wgpu::Buffer, u64)>,
}

impl PickTarget {
    /// Creates the target and reads one texel back to prove the round trip
    /// works on this device.
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Result<Self, PickError> {
        if !ctx.supports_size(width, height) {
            return Err(PickError::UnsupportedSize { width, height });
        }
        let mut pick = Self {
            target: OffscreenTarget::new(&ctx.device, "uv_pick_target", width, height, UV_FORMAT),
            rendered_generation: None,
            staging: None,
        };
        pick.read_texel(ctx, 0, 0)?;
        Ok(pick)
    }

    pub fn width(&self) -> u32 {
        self.target.width
    }

    pub fn height(&self) -> u32 {
        self.target.height
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.rendered_generation == Some(generation)
    }

    /// Raw texel at `(x, y)`, top row first.
    pub fn read_texel(&mut self, ctx: &GpuContext, x: u32, y: u32) -> Result<[f32; 4], PickError> {
        let bytes = readback_region(
            ctx,
            &self.target.color,
            (x, y),
            (1, 1),
            UV_TEXEL_BYTES,
            &mut self.staging,
        )
        .map_err(|e| PickError::Readback(e.to_string()))?;
        if bytes.len() < UV_TEXEL_BYTES as usize {
            return Err(PickError::Readback(format!("short read ({} bytes)", bytes.len())));
        }
        Ok(bytemuck::pod_read_unaligned(&bytes[..UV_TEXEL_BYTES as usize]))
    }
}

impl SceneView {
    /// Draw the UV pass unless it is already current for this camera and
    /// viewport.
    fn ensure_uv_pass(&mut self) {
        if self.pick.is_current(self.generation) {
            return;
        }
        self.renderer.write_uniforms(&self.ctx.queue, &self.uniforms());
        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("uv_pick_encoder"),
        });
        self.renderer.encode(
            &mut encoder,
            RenderMode::UvPick,
            &self.pick.target.color_view,
            &self.pick.target.depth_view,
            &self.mesh,
            None,
        );
        self.ctx.submit_one(encoder);
        self.pick.rendered_generation = Some(self.generation);
    }
}

impl SurfacePicker for SceneView {
    /// `at` is in framebuffer pixels of the main view, origin top-left.
    ///
    /// # Panics
    /// If the texel cannot be read back.  Startup already proved the
    /// read-back path, so a failure here means the device is gone.
    fn pick(&mut self, at: ScreenPoint) -> Option<Uv> {
        let (x, y) = texel_coords(at, self.pick.width(), self.pick.height())?;
        self.ensure_uv_pass();
        match self.pick.read_texel(&self.ctx, x, y) {
            Ok(texel) => decode_uv_texel(texel),
            Err(e) => {
                crate::log_err!("[GPU] {}", e);
                panic!("surface picker failed: {}", e);
            }
        }
    }
}
