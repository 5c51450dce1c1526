// ============================================================================
// GPU MODULE — offscreen model rendering and surface picking for TexPaint
// ============================================================================
//
// Architecture:
//   context.rs  — wgpu Device, Queue, adapter init
//   shaders.rs  — all WGSL shader source (inline strings)
//   texture.rs  — CanvasTexture, the GPU copy of the canvas
//   mesh.rs     — vertex/index buffers for the model
//   renderer.rs — ModelRenderer pipelines + SceneView coordinator
//   picking.rs  — UV pick target and single-texel read-back
// ============================================================================

pub mod context;
pub mod mesh;
pub mod picking;
pub mod renderer;
pub mod shaders;
pub mod texture;

pub use context::{GpuContext, GpuError};
pub use picking::PickError;
pub use renderer::{RenderMode, SceneView};
pub use texture::CanvasTexture;
