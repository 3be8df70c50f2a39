use std::sync::mpsc;

use params::ParameterSet;

use crate::compile::{wrap_fragment, WrappedShader, GRADIENT_FRAGMENT};
use crate::error::RenderError;
use crate::frame::{Frame, FrameOrigin};
use crate::source::FrameSource;
use crate::types::{RendererConfig, Resolution, ShaderSource};

use super::context::GpuContext;
use super::pipeline::{RenderTarget, ShaderPipeline};
use super::uniforms::AnimataUniforms;

/// Headless wgpu renderer: one compiled shader, one offscreen target.
///
/// Built once per run and reused for every token. Each call to
/// [`GpuRenderer::render`] uploads the uniform block, draws a full-screen
/// triangle and blocks until the pixels are back on the CPU.
pub struct GpuRenderer {
    context: GpuContext,
    pipeline: ShaderPipeline,
    target: RenderTarget,
    shader: WrappedShader,
    uniforms: AnimataUniforms,
}

impl GpuRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let source = match &config.shader {
            ShaderSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| RenderError::ReadShader {
                    path: path.clone(),
                    source,
                })?
            }
            ShaderSource::Gradient => GRADIENT_FRAGMENT.to_string(),
        };
        let shader = wrap_fragment(&source)?;
        tracing::debug!(
            shader = %config.shader,
            uniforms = ?shader.interface.declared(),
            "wrapped fragment shader"
        );

        let context = GpuContext::new(config.power).map_err(RenderError::Init)?;

        let resolution = config.resolution;
        let max = context.adapter_profile.max_texture_dimension;
        if resolution.width == 0
            || resolution.height == 0
            || resolution.width > max
            || resolution.height > max
        {
            return Err(RenderError::Resolution {
                requested: resolution,
                max,
            });
        }

        let (pipeline, error) =
            context.validation_scope(|device| ShaderPipeline::new(device, &shader));
        if let Some(message) = error {
            return Err(RenderError::Compile(message));
        }

        let target = RenderTarget::new(&context.device, resolution);
        let uniforms = AnimataUniforms::new(&shader.interface, resolution, config.gain);

        Ok(Self {
            context,
            pipeline,
            target,
            shader,
            uniforms,
        })
    }

    /// GLSL actually handed to the compiler, for debugging.
    pub fn wrapped_source(&self) -> &str {
        &self.shader.source
    }

    /// Encodes the shader pass plus the copy into the read-back buffer and
    /// submits it.
    fn submit_frame(&self, device: &wgpu::Device) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shader pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.pipeline.uniform_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.target.copy_to_readback(&mut encoder);
        self.context.queue.submit(Some(encoder.finish()));
    }

    /// Maps the read-back buffer and waits for it. On failure the buffer is
    /// left unmapped so the next frame can map it again.
    fn map_readback(&self, device: &wgpu::Device) -> Result<(), RenderError> {
        let slice = self.target.readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let mapped = device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| err.to_string())
            .and_then(|_| receiver.recv().map_err(|err| err.to_string()))
            .and_then(|result| result.map_err(|err| err.to_string()));
        if let Err(message) = mapped {
            // Cancels a map that is still pending.
            self.target.readback.unmap();
            return Err(RenderError::Readback(message));
        }
        Ok(())
    }

    /// Unmaps the read-back buffer whatever state a failed frame left it in.
    fn release_readback(&self) {
        let ((), error) = self.context.validation_scope(|_| self.target.readback.unmap());
        if let Some(message) = error {
            tracing::debug!(%message, "read-back buffer was not mapped");
        }
    }

    fn copy_mapped(&self) -> Result<Frame, RenderError> {
        let data = self.target.readback.slice(..).get_mapped_range();
        Frame::from_padded_rgba(
            self.target.resolution.width,
            self.target.resolution.height,
            self.target.padded_bytes_per_row as usize,
            &data,
            FrameOrigin::TopLeft,
        )
    }
}

impl FrameSource for GpuRenderer {
    fn resolution(&self) -> Resolution {
        self.target.resolution
    }

    fn render(&mut self, params: &ParameterSet, time: f64) -> Result<Frame, RenderError> {
        self.uniforms.set_params(&self.shader.interface, params);
        self.uniforms.set_time(&self.shader.interface, time);
        let (mapped, error) = self.context.validation_scope(|device| {
            self.context.queue.write_buffer(
                &self.pipeline.uniform_buffer,
                0,
                self.uniforms.as_bytes(),
            );
            self.submit_frame(device);
            self.map_readback(device)
        });

        match (mapped, error) {
            (Ok(()), None) => {
                let frame = self.copy_mapped();
                self.target.readback.unmap();
                frame
            }
            (Ok(()), Some(message)) | (Err(_), Some(message)) => {
                self.release_readback();
                Err(RenderError::Draw(message))
            }
            (Err(err), None) => {
                self.release_readback();
                Err(err)
            }
        }
    }
}
