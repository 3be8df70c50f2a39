use std::path::PathBuf;

use crate::types::Resolution;

/// Shader text that cannot be adapted to the uniform block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("shader does not define `void main()`")]
    MissingMain,
    #[error("shader does not declare an `out vec4` colour output")]
    MissingOutput,
    #[error("unsupported uniform `{0}`; only iResolution, iTime, uHueI, uRotSpeed, uScale, uDotDiv and uGain are provided")]
    UnknownUniform(String),
    #[error("uniform `{name}` must be declared as `{expected}`, found `{found}`")]
    UniformType {
        name: String,
        expected: &'static str,
        found: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read shader at {path}")]
    ReadShader {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("shader failed to compile:\n{0}")]
    Compile(String),
    #[error("GPU initialisation failed")]
    Init(#[source] anyhow::Error),
    #[error("resolution {requested} is not supported (GPU max texture dimension is {max})")]
    Resolution { requested: Resolution, max: u32 },
    #[error("GPU rejected the draw: {0}")]
    Draw(String),
    #[error("frame read-back failed: {0}")]
    Readback(String),
    #[error("read-back buffer holds {actual} bytes, expected at least {expected}")]
    ShortReadback { expected: usize, actual: usize },
}
