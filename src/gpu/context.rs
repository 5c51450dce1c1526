// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::Arc;

use super::picking::PickError;

#[derive(Debug)]
pub enum GpuError {
    /// Neither a hardware nor a software adapter was found.
    NoAdapter,
    RequestDevice(String),
    /// The canvas is larger than the device's texture limit.
    TextureTooLarge { width: u32, height: u32, max: u32 },
    Picker(PickError),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "no GPU adapter available (hardware or software)"),
            GpuError::RequestDevice(e) => write!(f, "failed to create GPU device: {}", e),
            GpuError::TextureTooLarge { width, height, max } => write!(
                f,
                "texture {}x{} exceeds the device limit of {} pixels per side",
                width, height, max
            ),
            GpuError::Picker(e) => write!(f, "surface picker unavailable: {}", e),
        }
    }
}

impl std::error::Error for GpuError {}

impl From<PickError> for GpuError {
    fn from(e: PickError) -> Self {
        GpuError::Picker(e)
    }
}

/// Holds the core wgpu resources shared by the model renderer and the
/// surface picker.  Created once at startup.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
}

impl GpuContext {
    /// Create a GPU context.  Tries hardware first, then falls back to a
    /// software rasterizer (`force_fallback_adapter`).
    ///
    /// eframe doesn't expose its device to application code, so we own a
    /// headless one and block on it with `pollster`.
    pub fn new(preferred_gpu: &str) -> Result<Self, GpuError> {
        match pollster::block_on(Self::new_async(preferred_gpu, false)) {
            Ok(ctx) => return Ok(ctx),
            Err(GpuError::NoAdapter) => {}
            Err(e) => return Err(e),
        }
        crate::log_warn!("[GPU] Hardware adapter unavailable, trying software fallback");
        pollster::block_on(Self::new_async(preferred_gpu, true))
    }

    async fn new_async(preferred_gpu: &str, force_fallback: bool) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power = match preferred_gpu.to_lowercase().as_str() {
            "low power" | "integrated" => wgpu::PowerPreference::LowPower,
            _ => wgpu::PowerPreference::HighPerformance,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power,
                compatible_surface: None, // headless, offscreen targets only
                force_fallback_adapter: force_fallback,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("TexPaint GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .map_err(|e| GpuError::RequestDevice(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width > 0 && height > 0 && width <= self.max_texture_dim && height <= self.max_texture_dim
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Block until all submitted work and pending buffer maps complete.
    pub fn wait_idle(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }
}
