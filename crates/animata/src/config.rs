use std::path::{Path, PathBuf};

use encoder::{EncoderOptions, FfmpegOptions, WebmCodec, DEFAULT_GIF_SPEED, GIF_SPEED_RANGE};
use metadata::{AssetAddressing, MetadataOptions, DEFAULT_COLLECTION, DEFAULT_DESCRIPTION, DEFAULT_SCHEME};
use params::{Overrides, ParamError, ParameterPlan, Sweep, SweepKind};
use renderer::{
    GpuPowerPreference, LoopTiming, RendererConfig, Resolution, ShaderSource, TimingError,
};
use serde::Deserialize;

use crate::cli::Cli;

pub const DEFAULT_OUT_ROOT: &str = "out";
pub const DEFAULT_COUNT: usize = 999;
pub const DEFAULT_START_ID: u64 = 1;
pub const DEFAULT_SIZE: u32 = 512;
pub const DEFAULT_FPS: u32 = 24;
pub const DEFAULT_SECONDS: f64 = 4.0;
pub const DEFAULT_THUMB_AT: f64 = 1.0;
pub const DEFAULT_SHADER: &str = "shader_frag.glsl";
pub const DEFAULT_GAIN: f32 = 0.35;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error(transparent)]
    Timing(#[from] TimingError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of a `--config` TOML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub out_root: Option<PathBuf>,
    pub count: Option<usize>,
    pub start_id: Option<u64>,
    pub render: RenderSection,
    pub encode: EncodeSection,
    pub metadata: MetadataSection,
    pub params: ParamsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub seconds: Option<f64>,
    pub thumb_at: Option<f64>,
    pub shader: Option<PathBuf>,
    pub gain: Option<f32>,
    pub gradient_test: Option<bool>,
    pub low_power: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeSection {
    pub mp4_crf: Option<u8>,
    pub mp4_preset: Option<String>,
    pub webm_crf: Option<u8>,
    pub webm_codec: Option<String>,
    pub threads: Option<u32>,
    pub gif_speed: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataSection {
    pub collection: Option<String>,
    pub description: Option<String>,
    pub animations_cid: Option<String>,
    pub images_cid: Option<String>,
    pub uri_scheme: Option<String>,
    pub trait_type: Option<String>,
    pub trait_value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamsSection {
    pub hues: Option<[u8; 4]>,
    pub rotation_speed: Option<f64>,
    pub scale: Option<f64>,
    pub dot_divisor: Option<f64>,
    pub sweep: Option<SweepKind>,
    pub sweep_values: Option<[f64; 4]>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved, validated settings for one run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub out_root: PathBuf,
    pub count: usize,
    pub start_id: u64,
    pub timing: LoopTiming,
    pub poster_time: f64,
    pub renderer: RendererConfig,
    pub encoders: EncoderOptions,
    pub addressing: AssetAddressing,
    pub metadata: MetadataOptions,
    pub plan: ParameterPlan,
    pub metadata_only: bool,
    pub debug_dump: bool,
}

impl BatchConfig {
    /// Explicit flags win over the config file, which wins over defaults.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let FileConfig {
            out_root,
            count,
            start_id,
            render,
            encode,
            metadata: meta,
            params,
        } = file;

        let width = cli.width.or(render.width).unwrap_or(DEFAULT_SIZE);
        let height = cli.height.or(render.height).unwrap_or(DEFAULT_SIZE);
        let resolution = validate_resolution(width, height)?;

        let fps = cli.fps.or(render.fps).unwrap_or(DEFAULT_FPS);
        let seconds = cli.seconds.or(render.seconds).unwrap_or(DEFAULT_SECONDS);
        let timing = LoopTiming::new(fps, seconds)?;

        let poster_time = cli.thumb_at.or(render.thumb_at).unwrap_or(DEFAULT_THUMB_AT);
        if !poster_time.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "poster time must be finite, got {poster_time}"
            )));
        }

        let gain = cli.gain.or(render.gain).unwrap_or(DEFAULT_GAIN);
        if !gain.is_finite() {
            return Err(ConfigError::Invalid(format!("gain must be finite, got {gain}")));
        }

        let shader = if cli.gradient_test || render.gradient_test.unwrap_or(false) {
            ShaderSource::Gradient
        } else {
            ShaderSource::File(
                cli.shader
                    .clone()
                    .or(render.shader)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SHADER)),
            )
        };
        let power = if render.low_power.unwrap_or(false) {
            GpuPowerPreference::Low
        } else {
            GpuPowerPreference::High
        };

        let encoders = resolve_encoders(cli, encode)?;

        let scheme = cli
            .uri_scheme
            .clone()
            .or(meta.uri_scheme)
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
            return Err(ConfigError::Invalid(format!("invalid URI scheme '{scheme}'")));
        }
        let animations_cid = cli.animations_cid.clone().or(meta.animations_cid);
        let images_cid = cli.images_cid.clone().or(meta.images_cid);
        let addressing =
            AssetAddressing::from_cids(animations_cid.as_deref(), images_cid.as_deref(), &scheme);

        let defaults = MetadataOptions::default();
        let metadata = MetadataOptions {
            collection: cli
                .collection
                .clone()
                .or(meta.collection)
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            description: cli
                .description
                .clone()
                .or(meta.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            fixed_trait: (
                meta.trait_type.unwrap_or(defaults.fixed_trait.0),
                meta.trait_value.unwrap_or(defaults.fixed_trait.1),
            ),
        };

        let overrides = Overrides {
            hues: cli.fixed_hue.or(params.hues),
            rotation_speed: cli.fixed_rot_speed.or(params.rotation_speed),
            scale: cli.fixed_scale.or(params.scale),
            dot_divisor: cli.fixed_dotdiv.or(params.dot_divisor),
        };
        let sweep_values = cli.sweep_values.or(params.sweep_values);
        let sweep = match (cli.sweep.or(params.sweep), sweep_values) {
            (Some(kind), values) => Some(Sweep::new(kind, values)),
            (None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "sweep values were given without a sweep kind".to_string(),
                ))
            }
            (None, None) => None,
        };
        let plan = ParameterPlan::new(overrides, sweep)?;

        let count = cli.count.or(count).unwrap_or(DEFAULT_COUNT);
        let start_id = cli.start_id.or(start_id).unwrap_or(DEFAULT_START_ID);
        let batch_len = plan.batch_len(count) as u64;
        if batch_len > 0 && start_id.checked_add(batch_len - 1).is_none() {
            return Err(ConfigError::Invalid(format!(
                "token ids starting at {start_id} overflow after {batch_len} tokens"
            )));
        }

        Ok(Self {
            out_root: cli
                .out_root
                .clone()
                .or(out_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_ROOT)),
            count,
            start_id,
            timing,
            poster_time,
            renderer: RendererConfig {
                resolution,
                shader,
                gain,
                power,
            },
            encoders,
            addressing,
            metadata,
            plan,
            metadata_only: cli.metadata_only,
            debug_dump: cli.debug_dump,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.renderer.resolution
    }

    pub fn poster_index(&self) -> u32 {
        self.timing.poster_index(self.poster_time)
    }

    /// Tokens actually produced, in order.
    pub fn token_ids(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        (0..self.plan.batch_len(self.count)).map(|position| (position, self.start_id + position as u64))
    }
}

/// yuv420p output needs even dimensions.
fn validate_resolution(width: u32, height: u32) -> Result<Resolution, ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::Invalid(format!(
            "resolution must be non-zero, got {width}x{height}"
        )));
    }
    if width % 2 != 0 || height % 2 != 0 {
        return Err(ConfigError::Invalid(format!(
            "width and height must be even for yuv420p video, got {width}x{height}"
        )));
    }
    Ok(Resolution::new(width, height))
}

fn resolve_encoders(cli: &Cli, encode: EncodeSection) -> Result<EncoderOptions, ConfigError> {
    let defaults = FfmpegOptions::default();
    let webm_codec = match (cli.webm_codec, encode.webm_codec) {
        (Some(codec), _) => codec,
        (None, Some(name)) => name.parse::<WebmCodec>().map_err(ConfigError::Invalid)?,
        (None, None) => defaults.webm_codec,
    };

    let mp4_crf = cli.mp4_crf.or(encode.mp4_crf).unwrap_or(defaults.mp4_crf);
    if mp4_crf > 51 {
        return Err(ConfigError::Invalid(format!(
            "x264 CRF must be in 0..=51, got {mp4_crf}"
        )));
    }
    let webm_crf = cli.webm_crf.or(encode.webm_crf).unwrap_or(defaults.webm_crf);
    if webm_crf > 63 {
        return Err(ConfigError::Invalid(format!(
            "VPx CRF must be in 0..=63, got {webm_crf}"
        )));
    }
    let gif_speed = cli.gif_speed.or(encode.gif_speed).unwrap_or(DEFAULT_GIF_SPEED);
    if !GIF_SPEED_RANGE.contains(&gif_speed) {
        return Err(ConfigError::Invalid(format!(
            "GIF speed must be in {}..={}, got {gif_speed}",
            GIF_SPEED_RANGE.start(),
            GIF_SPEED_RANGE.end()
        )));
    }
    let mp4_preset = cli
        .mp4_preset
        .clone()
        .or(encode.mp4_preset)
        .unwrap_or(defaults.mp4_preset);
    if mp4_preset.trim().is_empty() {
        return Err(ConfigError::Invalid("x264 preset must not be empty".to_string()));
    }

    Ok(EncoderOptions {
        ffmpeg: FfmpegOptions {
            mp4_crf,
            mp4_preset,
            webm_crf,
            webm_codec,
            threads: cli.threads.or(encode.threads).unwrap_or(defaults.threads),
        },
        gif_speed,
        ..EncoderOptions::default()
    })
}
