use std::num::{ParseFloatError, ParseIntError};

/// Operator mistakes in parameter overrides or sweep settings.
///
/// These are detected before any rendering starts and abort the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("fixed hue requires exactly 4 comma-separated integers, got {0}")]
    HueCount(usize),
    #[error("fixed hue values must be in 0..={max}, got {value}")]
    HueRange { value: i64, max: u8 },
    #[error("invalid hue value '{value}': {source}")]
    HueParse {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("sweep values require exactly 4 numbers, got {0}")]
    SweepCount(usize),
    #[error("invalid sweep value '{value}': {source}")]
    SweepParse {
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("unknown sweep kind '{0}' (expected rot, scale, or dotdiv)")]
    SweepKind(String),
    #[error("{name} must be a finite positive number, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}
