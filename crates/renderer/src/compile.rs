use std::borrow::Cow;
use std::fmt::Write as _;

use wgpu::naga::ShaderStage;

use crate::error::ShaderError;

/// Uniforms the renderer knows how to feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Resolution,
    Time,
    Hues,
    RotationSpeed,
    Scale,
    DotDivisor,
    Gain,
}

impl Uniform {
    pub const ALL: [Uniform; 7] = [
        Uniform::Resolution,
        Uniform::Time,
        Uniform::Hues,
        Uniform::RotationSpeed,
        Uniform::Scale,
        Uniform::DotDivisor,
        Uniform::Gain,
    ];

    /// Name the shader source uses.
    pub fn glsl_name(self) -> &'static str {
        match self {
            Uniform::Resolution => "iResolution",
            Uniform::Time => "iTime",
            Uniform::Hues => "uHueI",
            Uniform::RotationSpeed => "uRotSpeed",
            Uniform::Scale => "uScale",
            Uniform::DotDivisor => "uDotDiv",
            Uniform::Gain => "uGain",
        }
    }

    pub fn glsl_type(self) -> &'static str {
        match self {
            Uniform::Resolution => "vec3",
            Uniform::Hues => "ivec4",
            _ => "float",
        }
    }

    fn block_field(self) -> String {
        format!("ubo._{}", self.glsl_name())
    }

    fn from_glsl_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|uniform| uniform.glsl_name() == name)
    }
}

/// Which uniforms a fragment shader actually declares.
///
/// Uniforms the shader leaves out are never written; a shader without
/// `iTime` simply renders the same picture every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    declared: Vec<Uniform>,
}

impl ShaderInterface {
    pub fn declares(&self, uniform: Uniform) -> bool {
        self.declared.contains(&uniform)
    }

    pub fn declared(&self) -> &[Uniform] {
        &self.declared
    }

    fn insert(&mut self, uniform: Uniform) {
        if !self.declares(uniform) {
            self.declared.push(uniform);
        }
    }
}

/// Fragment source rewritten for the renderer's uniform block.
#[derive(Debug, Clone)]
pub struct WrappedShader {
    pub source: String,
    pub interface: ShaderInterface,
}

/// UV gradient used by `--gradient-test`.
pub const GRADIENT_FRAGMENT: &str = r"#version 330
out vec4 FragColor;
uniform vec3 iResolution;
void main(){
  vec2 uv = gl_FragCoord.xy / iResolution.xy;
  FragColor = vec4(uv, 0.0, 1.0);
}
";

pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    shader: &WrappedShader,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("animata fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(shader.source.clone()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Turns a desktop-GL style fragment shader (`void main()`, loose
/// `uniform` declarations, bottom-left `gl_FragCoord`) into GLSL 450 that
/// reads from a single std140 block.
///
/// 1. `#version`, `precision` and recognised `uniform` lines are blanked so
///    compiler line numbers still match the file.
/// 2. The first `out vec4` gets an explicit location.
/// 3. [`HEADER`] declares the block, aliases each declared uniform onto it and
///    renames the shader's `main`.
/// 4. [`FOOTER`] flips `gl_FragCoord` to a bottom-left origin and calls it.
pub fn wrap_fragment(source: &str) -> Result<WrappedShader, ShaderError> {
    let mut interface = ShaderInterface::default();
    let mut body = String::with_capacity(source.len() + 64);
    let mut has_output = false;

    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            body.push('\n');
            continue;
        }
        if let Some(declaration) = strip_keyword(trimmed, "uniform") {
            for uniform in parse_uniform_declaration(declaration)? {
                interface.insert(uniform);
            }
            body.push('\n');
            continue;
        }
        if !has_output && is_colour_output(trimmed) {
            has_output = true;
            if trimmed.starts_with("layout") {
                body.push_str(line);
            } else {
                body.push_str("layout(location = 0) ");
                body.push_str(trimmed);
            }
            body.push('\n');
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    if !declares_main(source) {
        return Err(ShaderError::MissingMain);
    }
    if !has_output {
        return Err(ShaderError::MissingOutput);
    }

    let mut wrapped = String::from(HEADER);
    for uniform in interface.declared() {
        let _ = writeln!(
            wrapped,
            "#define {} {}",
            uniform.glsl_name(),
            uniform.block_field()
        );
    }
    wrapped.push_str("#define gl_FragCoord animata_frag_coord\n");
    wrapped.push_str("#define main animata_user_main\n");
    wrapped.push_str("#line 1\n");
    wrapped.push_str(&body);
    wrapped.push_str(FOOTER);

    Ok(WrappedShader {
        source: wrapped,
        interface,
    })
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

fn parse_uniform_declaration(declaration: &str) -> Result<Vec<Uniform>, ShaderError> {
    let statement = declaration
        .split_once(';')
        .map_or(declaration, |(statement, _)| statement);
    let mut tokens = statement
        .split_whitespace()
        .filter(|token| !matches!(*token, "lowp" | "mediump" | "highp"));
    let ty = tokens.next().unwrap_or_default();
    let names: String = tokens.collect::<Vec<_>>().join(" ");

    if names.is_empty() || statement.contains('{') {
        return Err(ShaderError::UnknownUniform(statement.trim().to_string()));
    }

    let mut uniforms = Vec::new();
    for name in names.split(',') {
        let name = name.trim();
        let uniform = Uniform::from_glsl_name(name)
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))?;
        if uniform.glsl_type() != ty {
            return Err(ShaderError::UniformType {
                name: name.to_string(),
                expected: uniform.glsl_type(),
                found: ty.to_string(),
            });
        }
        uniforms.push(uniform);
    }
    Ok(uniforms)
}

fn is_colour_output(line: &str) -> bool {
    let declaration = if line.starts_with("layout") {
        line.split_once(')').map_or("", |(_, rest)| rest.trim_start())
    } else {
        line
    };
    strip_keyword(declaration, "out")
        .and_then(|rest| strip_keyword(rest, "vec4"))
        .is_some()
}

fn declares_main(source: &str) -> bool {
    source.match_indices("void").any(|(index, _)| {
        let rest = source[index + 4..].trim_start();
        rest.strip_prefix("main")
            .is_some_and(|after| after.trim_start().starts_with('('))
    })
}

/// Uniform block shared by every shader. Must match `AnimataUniforms` in
/// `gpu/uniforms.rs` byte for byte.
const HEADER: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform AnimataParams {
    vec3 _iResolution;
    float _iTime;
    ivec4 _uHueI;
    float _uRotSpeed;
    float _uScale;
    float _uDotDiv;
    float _uGain;
} ubo;

vec4 animata_frag_coord;
";

const FOOTER: &str = r"
#undef main
#undef gl_FragCoord
void main() {
    animata_frag_coord = vec4(
        gl_FragCoord.x,
        ubo._iResolution.y - gl_FragCoord.y,
        gl_FragCoord.z,
        gl_FragCoord.w
    );
    animata_user_main();
}
";

const VERTEX_SHADER_GLSL: &str = r"#version 450
const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    gl_Position = vec4(positions[gl_VertexIndex], 0.0, 1.0);
}
";
