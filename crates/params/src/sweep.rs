use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParamError;
use crate::set::ParameterSet;

/// Number of clips in a comparison sweep.
pub const SWEEP_LEN: usize = 4;

/// Hue set used for every sweep clip unless the operator fixed one.
pub const SWEEP_HUES: [u8; 4] = [3, 3, 3, 3];

pub const ROTATION_MIDPOINT: f64 = 3.0;
pub const SCALE_MIDPOINT: f64 = 0.13;
pub const DOT_DIVISOR_MIDPOINT: f64 = 0.7;

/// Parameter varied across a sweep batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepKind {
    #[serde(rename = "rot")]
    Rotation,
    #[serde(rename = "scale")]
    Scale,
    #[serde(rename = "dotdiv")]
    DotDivisor,
}

impl SweepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SweepKind::Rotation => "rot",
            SweepKind::Scale => "scale",
            SweepKind::DotDivisor => "dotdiv",
        }
    }

    /// Endpoints plus two interior points of each candidate range.
    pub fn default_values(self) -> [f64; SWEEP_LEN] {
        match self {
            SweepKind::Rotation => [2.0, 2.5, 3.5, 4.0],
            SweepKind::Scale => [0.08, 0.11, 0.15, 0.18],
            SweepKind::DotDivisor => [0.5, 0.6, 0.8, 0.9],
        }
    }

    /// Reads the swept parameter back out of a set.
    pub fn value_of(self, params: &ParameterSet) -> f64 {
        match self {
            SweepKind::Rotation => params.rotation_speed,
            SweepKind::Scale => params.scale,
            SweepKind::DotDivisor => params.dot_divisor,
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepKind {
    type Err = ParamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rot" | "rotation" => Ok(SweepKind::Rotation),
            "scale" => Ok(SweepKind::Scale),
            "dotdiv" | "dot-divisor" => Ok(SweepKind::DotDivisor),
            other => Err(ParamError::SweepKind(other.to_string())),
        }
    }
}

/// Controlled comparison batch: one parameter varies, the rest are pinned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub kind: SweepKind,
    pub values: [f64; SWEEP_LEN],
}

impl Sweep {
    pub fn new(kind: SweepKind, values: Option<[f64; SWEEP_LEN]>) -> Self {
        Self {
            kind,
            values: values.unwrap_or_else(|| kind.default_values()),
        }
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        for value in self.values {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamError::NotPositive {
                    name: "sweep value",
                    value,
                });
            }
        }
        Ok(())
    }

    /// Overrides the swept parameter for the clip at `position` in the batch.
    ///
    /// `keep_hues` is set when the operator fixed a hue set, which then wins
    /// over [`SWEEP_HUES`].
    pub fn apply(&self, position: usize, keep_hues: bool, params: &mut ParameterSet) {
        if !keep_hues {
            params.hues = SWEEP_HUES;
        }
        let value = self.values[position % SWEEP_LEN];
        match self.kind {
            SweepKind::Rotation => {
                params.rotation_speed = value;
                params.scale = SCALE_MIDPOINT;
                params.dot_divisor = DOT_DIVISOR_MIDPOINT;
            }
            SweepKind::Scale => {
                params.scale = value;
                params.rotation_speed = ROTATION_MIDPOINT;
                params.dot_divisor = DOT_DIVISOR_MIDPOINT;
            }
            SweepKind::DotDivisor => {
                params.dot_divisor = value;
                params.rotation_speed = ROTATION_MIDPOINT;
                params.scale = SCALE_MIDPOINT;
            }
        }
    }
}

/// Parses exactly four comma-separated numbers.
pub fn parse_sweep_values(value: &str) -> Result<[f64; SWEEP_LEN], ParamError> {
    let parts: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != SWEEP_LEN {
        return Err(ParamError::SweepCount(parts.len()));
    }
    let mut values = [0.0; SWEEP_LEN];
    for (slot, part) in values.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|source| ParamError::SweepParse {
            value: part.to_string(),
            source,
        })?;
    }
    Ok(values)
}
