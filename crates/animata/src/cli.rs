use std::path::PathBuf;

use clap::Parser;
use encoder::WebmCodec;
use params::SweepKind;

/// Every setting is optional here so a `--config` file can supply it;
/// defaults are applied in `config::BatchConfig::resolve`.
#[derive(Parser, Debug, Default)]
#[command(
    name = "animata",
    author,
    version,
    about = "Render deterministic looping shader animations to GIF/MP4/WebM with poster PNGs and token metadata"
)]
pub struct Cli {
    /// TOML file with `[render]`, `[encode]`, `[metadata]` and `[params]` sections.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root output folder (default: out).
    #[arg(long, value_name = "DIR")]
    pub out_root: Option<PathBuf>,

    /// How many tokens to generate (default: 999).
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,

    /// First token id (default: 1).
    #[arg(long, value_name = "ID")]
    pub start_id: Option<u64>,

    /// Render width in pixels; must be even (default: 512).
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Render height in pixels; must be even (default: 512).
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Frames per second (default: 24).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<u32>,

    /// Loop length in seconds (default: 4).
    #[arg(long, value_name = "SECONDS")]
    pub seconds: Option<f64>,

    /// Poster time in seconds from the start of the loop (default: 1.0).
    #[arg(long, value_name = "SECONDS")]
    pub thumb_at: Option<f64>,

    /// Name prefix; the metadata name becomes `<collection> <id>`.
    #[arg(long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Metadata description text.
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    /// x264 CRF, lower is better (default: 18).
    #[arg(long, value_name = "CRF")]
    pub mp4_crf: Option<u8>,

    /// x264 preset (default: medium).
    #[arg(long, value_name = "PRESET")]
    pub mp4_preset: Option<String>,

    /// VP9/VP8 CRF, lower is better (default: 28).
    #[arg(long, value_name = "CRF")]
    pub webm_crf: Option<u8>,

    /// WebM codec: `libvpx-vp9` (better) or `libvpx` (faster).
    #[arg(long, value_name = "CODEC", value_parser = parse_webm_codec)]
    pub webm_codec: Option<WebmCodec>,

    /// ffmpeg threads (0 = auto).
    #[arg(long, value_name = "N")]
    pub threads: Option<u32>,

    /// GIF quantizer speed, 1 (best) to 30 (fastest) (default: 10).
    #[arg(long, value_name = "SPEED")]
    pub gif_speed: Option<i32>,

    /// Content id of the published animations folder (mp4/webm/gif).
    #[arg(long, value_name = "CID")]
    pub animations_cid: Option<String>,

    /// Content id of the published poster images folder (png).
    #[arg(long, value_name = "CID")]
    pub images_cid: Option<String>,

    /// URI scheme used with the content ids (default: ipfs).
    #[arg(long, value_name = "SCHEME")]
    pub uri_scheme: Option<String>,

    /// Skip rendering and only (re)write metadata from the saved sidecars.
    #[arg(long)]
    pub metadata_only: bool,

    /// Fragment shader to render (default: shader_frag.glsl).
    #[arg(long, value_name = "FILE")]
    pub shader: Option<PathBuf>,

    /// Render a plain UV gradient instead of the shader to isolate pipeline issues.
    #[arg(long)]
    pub gradient_test: bool,

    /// Dump the first frame as PNG and raw rgb24, plus the wrapped shader source.
    #[arg(long)]
    pub debug_dump: bool,

    /// Value fed to the shader's `uGain` uniform (default: 0.35).
    #[arg(long, env = "ANIMATA_GAIN", value_name = "GAIN", value_parser = parse_gain)]
    pub gain: Option<f32>,

    /// Fix all four hues, e.g. `3,3,3,3` (each 0..6).
    #[arg(long, value_name = "H,H,H,H", value_parser = parse_fixed_hue)]
    pub fixed_hue: Option<[u8; 4]>,

    /// Fix the rotation speed for every token.
    #[arg(long, value_name = "SPEED")]
    pub fixed_rot_speed: Option<f64>,

    /// Fix the scale for every token (0.08..0.18).
    #[arg(long, value_name = "SCALE")]
    pub fixed_scale: Option<f64>,

    /// Fix the dot divisor for every token (0.5..0.9).
    #[arg(long, value_name = "DIVISOR")]
    pub fixed_dotdiv: Option<f64>,

    /// Generate four clips sweeping one variable (`rot`, `scale` or `dotdiv`); the others sit at their midpoints.
    #[arg(long, value_name = "KIND", value_parser = parse_sweep_kind)]
    pub sweep: Option<SweepKind>,

    /// Four comma-separated values for the sweep, overriding the defaults.
    #[arg(long, value_name = "V,V,V,V", value_parser = parse_sweep_values)]
    pub sweep_values: Option<[f64; 4]>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_webm_codec(value: &str) -> Result<WebmCodec, String> {
    value.trim().parse()
}

pub fn parse_gain(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    let gain: f32 = trimmed
        .parse()
        .map_err(|_| format!("invalid gain '{trimmed}'"))?;
    if !gain.is_finite() {
        return Err(format!("gain must be finite, got '{trimmed}'"));
    }
    Ok(gain)
}

pub fn parse_fixed_hue(value: &str) -> Result<[u8; 4], String> {
    params::parse_hue_list(value).map_err(|err| err.to_string())
}

pub fn parse_sweep_kind(value: &str) -> Result<SweepKind, String> {
    value.parse().map_err(|err: params::ParamError| err.to_string())
}

pub fn parse_sweep_values(value: &str) -> Result<[f64; 4], String> {
    params::parse_sweep_values(value).map_err(|err| err.to_string())
}
