use std::fmt;
use std::path::PathBuf;

/// Output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where the fragment shader comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// GLSL fragment shader on disk.
    File(PathBuf),
    /// Built-in UV gradient that only reads `iResolution`; used to isolate
    /// pipeline and read-back problems from shader problems.
    Gradient,
}

impl fmt::Display for ShaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderSource::File(path) => write!(f, "{}", path.display()),
            ShaderSource::Gradient => f.write_str("<gradient test>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Immutable configuration for the headless renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub resolution: Resolution,
    pub shader: ShaderSource,
    /// Exposure knob forwarded to `uGain`; not range-checked.
    pub gain: f32,
    pub power: GpuPowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(512, 512),
            shader: ShaderSource::File(PathBuf::from("shader_frag.glsl")),
            gain: 0.35,
            power: GpuPowerPreference::default(),
        }
    }
}

/// Summary of the adapter picked at start-up, for logs.
#[derive(Debug, Clone)]
pub(crate) struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}
