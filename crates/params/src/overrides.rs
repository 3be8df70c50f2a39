use serde::{Deserialize, Serialize};

use crate::error::ParamError;
use crate::set::{ParameterSet, HUE_MAX};

/// Operator-supplied fixed values applied uniformly to every token.
///
/// Overrides are applied after derivation, so the seeded draws for the
/// remaining parameters are unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    pub hues: Option<[u8; 4]>,
    pub rotation_speed: Option<f64>,
    pub scale: Option<f64>,
    pub dot_divisor: Option<f64>,
}

impl Overrides {
    pub fn validate(&self) -> Result<(), ParamError> {
        if let Some(hues) = self.hues {
            if let Some(&bad) = hues.iter().find(|&&hue| hue > HUE_MAX) {
                return Err(ParamError::HueRange {
                    value: i64::from(bad),
                    max: HUE_MAX,
                });
            }
        }
        check_positive("fixed rotation speed", self.rotation_speed)?;
        check_positive("fixed scale", self.scale)?;
        check_positive("fixed dot divisor", self.dot_divisor)?;
        Ok(())
    }

    pub fn apply(&self, params: &mut ParameterSet) {
        if let Some(hues) = self.hues {
            params.hues = hues;
        }
        if let Some(speed) = self.rotation_speed {
            params.rotation_speed = speed;
        }
        if let Some(scale) = self.scale {
            params.scale = scale;
        }
        if let Some(divisor) = self.dot_divisor {
            params.dot_divisor = divisor;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn check_positive(name: &'static str, value: Option<f64>) -> Result<(), ParamError> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ParamError::NotPositive { name, value: v }),
        _ => Ok(()),
    }
}

/// Parses a `3,3,3,3` style hue list.
pub fn parse_hue_list(value: &str) -> Result<[u8; 4], ParamError> {
    let parts: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 4 {
        return Err(ParamError::HueCount(parts.len()));
    }

    let mut hues = [0u8; 4];
    for (slot, part) in hues.iter_mut().zip(parts) {
        let parsed: i64 = part.parse().map_err(|source| ParamError::HueParse {
            value: part.to_string(),
            source,
        })?;
        if !(0..=i64::from(HUE_MAX)).contains(&parsed) {
            return Err(ParamError::HueRange {
                value: parsed,
                max: HUE_MAX,
            });
        }
        *slot = parsed as u8;
    }
    Ok(hues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::derive;

    #[test]
    fn hue_override_leaves_other_draws_alone() {
        let derived = derive(1);
        let overrides = Overrides {
            hues: Some([1, 2, 3, 4]),
            ..Overrides::default()
        };
        let mut params = derived;
        overrides.apply(&mut params);

        assert_eq!(params.hues, [1, 2, 3, 4]);
        assert_eq!(params.rotation_speed, derived.rotation_speed);
        assert_eq!(params.scale, derived.scale);
        assert_eq!(params.dot_divisor, derived.dot_divisor);
    }

    #[test]
    fn parses_hue_lists() {
        assert_eq!(parse_hue_list("3,3,3,3").unwrap(), [3, 3, 3, 3]);
        assert_eq!(parse_hue_list(" 0, 6 ,1,2 ").unwrap(), [0, 6, 1, 2]);
        assert!(matches!(parse_hue_list("1,2,3"), Err(ParamError::HueCount(3))));
        assert!(matches!(
            parse_hue_list("1,2,3,7"),
            Err(ParamError::HueRange { value: 7, .. })
        ));
        assert!(matches!(
            parse_hue_list("1,2,3,-1"),
            Err(ParamError::HueRange { value: -1, .. })
        ));
        assert!(matches!(
            parse_hue_list("1,2,x,4"),
            Err(ParamError::HueParse { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_reals() {
        let overrides = Overrides {
            scale: Some(0.0),
            ..Overrides::default()
        };
        assert!(overrides.validate().is_err());

        let overrides = Overrides {
            rotation_speed: Some(f64::NAN),
            ..Overrides::default()
        };
        assert!(overrides.validate().is_err());

        let overrides = Overrides {
            hues: Some([0, 1, 2, 9]),
            ..Overrides::default()
        };
        assert!(overrides.validate().is_err());

        assert!(Overrides::default().validate().is_ok());
    }
}
