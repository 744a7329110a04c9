// ============================================================================
// GPU MODULE — wgpu backend for the effect chain
// ============================================================================
//
// Architecture:
//   context.rs — wgpu Device, Queue, adapter init
//   shaders.rs — all WGSL shader source (inline strings)
//   texture.rs — uploaded source images and render targets
//   pool.rs    — render target recycling pool
//   chain.rs   — GpuCompositor: scene pass, effect passes, readback
// ============================================================================

pub mod chain;
pub mod context;
pub mod pool;
pub mod shaders;
pub mod texture;

pub use chain::{GpuCompositor, GpuPass};
pub use context::GpuContext;
