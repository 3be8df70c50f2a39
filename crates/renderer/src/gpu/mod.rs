//! Headless GPU path from uniforms to pixels.
//!
//! - `context` picks an adapter and opens a device with no surface.
//! - `pipeline` compiles the wrapped GLSL and owns the offscreen target and
//!   its read-back buffer.
//! - `uniforms` mirrors the std140 block the wrapper injects.
//! - `state` glues them together behind [`GpuRenderer`].

mod context;
mod pipeline;
mod state;
mod uniforms;

pub use state::GpuRenderer;
