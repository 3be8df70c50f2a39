use std::path::Path;

use params::{ParameterSet, SweepKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// Parameters and render settings persisted next to every token so metadata
/// can be rebuilt later without rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSidecar {
    pub token_id: u64,
    pub hue: [u8; 4],
    pub rotation_speed: f64,
    pub scale: f64,
    pub dot_divisor: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_seconds: f64,
    pub poster_frame: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepKind>,
}

/// Render settings recorded in a sidecar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_seconds: f64,
    pub poster_frame: u32,
}

impl ParamSidecar {
    pub fn new(
        token_id: u64,
        params: &ParameterSet,
        settings: RenderSettings,
        sweep: Option<SweepKind>,
    ) -> Self {
        Self {
            token_id,
            hue: params.hues,
            rotation_speed: params.rotation_speed,
            scale: params.scale,
            dot_divisor: params.dot_divisor,
            width: settings.width,
            height: settings.height,
            fps: settings.fps,
            duration_seconds: settings.duration_seconds,
            poster_frame: settings.poster_frame,
            sweep,
        }
    }

    pub fn params(&self) -> ParameterSet {
        ParameterSet {
            hues: self.hue,
            rotation_speed: self.rotation_speed,
            scale: self.scale,
            dot_divisor: self.dot_divisor,
        }
    }

    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), MetadataError> {
        write_json(path, self)
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MetadataError> {
    let text = std::fs::read_to_string(path).map_err(|source| MetadataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| MetadataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `value` as two-space indented JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), MetadataError> {
    let text = serde_json::to_string_pretty(value).map_err(MetadataError::Serialise)?;
    std::fs::write(path, text).map_err(|source| MetadataError::Write {
        path: path.to_path_buf(),
        source,
    })
}
