use bytemuck::{Pod, Zeroable};
use params::ParameterSet;

use crate::compile::{ShaderInterface, Uniform};
use crate::types::Resolution;

/// CPU mirror of the `AnimataParams` std140 block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct AnimataUniforms {
    pub i_resolution: [f32; 3],
    pub i_time: f32,
    pub u_hue: [i32; 4],
    pub u_rot_speed: f32,
    pub u_scale: f32,
    pub u_dot_div: f32,
    pub u_gain: f32,
}

impl AnimataUniforms {
    /// Block with the per-run values set. `iResolution` is always filled
    /// because the wrapper's vertical flip reads it; other fields only when
    /// the shader declares them.
    pub fn new(interface: &ShaderInterface, resolution: Resolution, gain: f32) -> Self {
        let mut uniforms = Self {
            i_resolution: [resolution.width as f32, resolution.height as f32, 1.0],
            ..Self::default()
        };
        if interface.declares(Uniform::Gain) {
            uniforms.u_gain = gain;
        }
        uniforms
    }

    pub fn set_params(&mut self, interface: &ShaderInterface, params: &ParameterSet) {
        if interface.declares(Uniform::Hues) {
            self.u_hue = params.hue_vector();
        }
        if interface.declares(Uniform::RotationSpeed) {
            self.u_rot_speed = params.rotation_speed as f32;
        }
        if interface.declares(Uniform::Scale) {
            self.u_scale = params.scale as f32;
        }
        if interface.declares(Uniform::DotDivisor) {
            self.u_dot_div = params.dot_divisor as f32;
        }
    }

    pub fn set_time(&mut self, interface: &ShaderInterface, seconds: f64) {
        if interface.declares(Uniform::Time) {
            self.i_time = seconds as f32;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{wrap_fragment, GRADIENT_FRAGMENT};

    #[test]
    fn block_matches_std140_size() {
        assert_eq!(std::mem::size_of::<AnimataUniforms>(), 48);
        assert_eq!(std::mem::offset_of!(AnimataUniforms, u_hue), 16);
        assert_eq!(std::mem::offset_of!(AnimataUniforms, u_gain), 44);
    }

    #[test]
    fn undeclared_uniforms_stay_zeroed() {
        let interface = wrap_fragment(GRADIENT_FRAGMENT).unwrap().interface;
        let mut uniforms = AnimataUniforms::new(&interface, Resolution::new(64, 32), 0.35);
        uniforms.set_params(&interface, &params::derive(1));
        uniforms.set_time(&interface, 1.5);

        assert_eq!(uniforms.i_resolution, [64.0, 32.0, 1.0]);
        assert_eq!(uniforms.i_time, 0.0);
        assert_eq!(uniforms.u_hue, [0; 4]);
        assert_eq!(uniforms.u_gain, 0.0);
    }

    #[test]
    fn declared_uniforms_are_written() {
        let source = "out vec4 c;\nuniform float iTime;\nuniform ivec4 uHueI;\nuniform float uGain;\nvoid main() { c = vec4(iTime); }\n";
        let interface = wrap_fragment(source).unwrap().interface;
        let mut uniforms = AnimataUniforms::new(&interface, Resolution::new(8, 8), 0.5);
        uniforms.set_params(&interface, &params::derive(1));
        uniforms.set_time(&interface, 2.0);

        assert_eq!(uniforms.i_time, 2.0);
        assert_eq!(uniforms.u_hue, [1, 4, 6, 6]);
        assert_eq!(uniforms.u_gain, 0.5);
    }

    #[test]
    fn resolution_is_written_even_when_undeclared() {
        let source = "out vec4 c;\nuniform float iTime;\nvoid main() { c = vec4(iTime); }\n";
        let wrapped = wrap_fragment(source).unwrap();
        assert!(!wrapped.interface.declares(Uniform::Resolution));
        assert!(wrapped.source.contains("_iResolution.y - gl_FragCoord.y"));

        let uniforms = AnimataUniforms::new(&wrapped.interface, Resolution::new(40, 24), 0.35);
        assert_eq!(uniforms.i_resolution, [40.0, 24.0, 1.0]);
    }
}
