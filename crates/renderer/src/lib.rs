//! Headless renderer for animata clips.
//!
//! Wraps a GLSL fragment shader so it reads its inputs from a single uniform
//! block, draws it offscreen with `wgpu` and hands each frame back as packed
//! RGB. The flow for one token is:
//!
//! ```text
//!   ParameterSet + LoopTiming
//!          │ RenderJob
//!          ▼
//!   FrameSource::render_job ──▶ GpuRenderer::render(params, t) ──▶ Frame
//!                                      │
//!                                      └─▶ AnimataUniforms ─▶ GPU UBO
//! ```
//!
//! `GpuRenderer` owns all GPU resources and is reused across tokens. Shaders
//! only receive the uniforms they declare, so a shader that ignores `iTime`
//! still renders.

mod compile;
mod error;
mod frame;
mod gpu;
mod job;
mod source;
mod timeline;
mod types;

pub use compile::{wrap_fragment, ShaderInterface, Uniform, WrappedShader, GRADIENT_FRAGMENT};
pub use error::{RenderError, ShaderError};
pub use frame::{Frame, FrameOrigin};
pub use gpu::GpuRenderer;
pub use job::RenderJob;
pub use source::FrameSource;
pub use timeline::{time_for_frame, LoopTiming, TimingError};
pub use types::{GpuPowerPreference, RendererConfig, Resolution, ShaderSource};
