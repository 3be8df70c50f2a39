use params::{ParameterSet, SweepKind};
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::locator::AssetAddressing;
use crate::naming::AssetKind;

pub const DEFAULT_COLLECTION: &str = "Regent Animata";
pub const DEFAULT_DESCRIPTION: &str = "A procedurally generated looping shader animation. \
MP4 is primary; WebM/GIF provided as alternates.";

/// Marketplace-style metadata for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub name: String,
    pub description: String,
    pub animation_url: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: TraitValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
}

impl Attribute {
    fn int(trait_type: impl Into<String>, value: i64) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: TraitValue::Int(value),
            display_type: None,
        }
    }

    fn number(trait_type: impl Into<String>, value: f64) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: TraitValue::Number(value),
            display_type: Some("number".to_string()),
        }
    }

    fn text(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: TraitValue::Text(value.into()),
            display_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    Int(i64),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub category: String,
    pub files: Vec<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub uri: String,
    #[serde(rename = "type")]
    pub mime: String,
}

/// Batch-wide text that goes into every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOptions {
    pub collection: String,
    pub description: String,
    /// Categorical trait appended after the numeric ones.
    pub fixed_trait: (String, String),
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            fixed_trait: ("Human Supporter".to_string(), "True".to_string()),
        }
    }
}

/// Builds the record for `token_id`. Pure: the same inputs always give the
/// same record.
pub fn build(
    token_id: u64,
    params: &ParameterSet,
    addressing: &AssetAddressing,
    options: &MetadataOptions,
    sweep: Option<SweepKind>,
) -> MetadataRecord {
    let mut attributes: Vec<Attribute> = params
        .hues
        .iter()
        .enumerate()
        .map(|(slot, hue)| Attribute::int(format!("Hue {}", slot + 1), i64::from(*hue)))
        .collect();
    attributes.push(Attribute::number("Rotation Speed", params.rotation_speed));
    attributes.push(Attribute::number("Scale", params.scale));
    attributes.push(Attribute::number("Dot Divisor", params.dot_divisor));
    let (trait_type, value) = &options.fixed_trait;
    attributes.push(Attribute::text(trait_type.as_str(), value.as_str()));
    if let Some(kind) = sweep {
        attributes.push(Attribute::number(format!("sweep-{kind}"), kind.value_of(params)));
    }

    let files = AssetKind::ALL
        .into_iter()
        .map(|kind| FileRef {
            uri: addressing.uri(kind, token_id),
            mime: kind.mime().to_string(),
        })
        .collect();

    MetadataRecord {
        name: format!("{} {}", options.collection, token_id),
        description: options.description.clone(),
        animation_url: addressing.uri(AssetKind::Mp4, token_id),
        image: addressing.uri(AssetKind::Png, token_id),
        attributes,
        properties: Properties {
            category: "video".to_string(),
            files,
        },
    }
}

impl MetadataRecord {
    /// Two-space indented JSON; stable byte for byte across runs.
    pub fn to_json(&self) -> Result<String, MetadataError> {
        serde_json::to_string_pretty(self).map_err(MetadataError::Serialise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn token_one() -> MetadataRecord {
        build(
            1,
            &params::derive(1),
            &AssetAddressing::default(),
            &MetadataOptions::default(),
            None,
        )
    }

    #[test]
    fn record_layout() {
        let value: Value = serde_json::from_str(&token_one().to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Regent Animata 1",
                "description": DEFAULT_DESCRIPTION,
                "animation_url": "animations/0001.mp4",
                "image": "images/0001.png",
                "attributes": [
                    {"trait_type": "Hue 1", "value": 1},
                    {"trait_type": "Hue 2", "value": 4},
                    {"trait_type": "Hue 3", "value": 6},
                    {"trait_type": "Hue 4", "value": 6},
                    {"trait_type": "Rotation Speed", "value": 2.0, "display_type": "number"},
                    {"trait_type": "Scale", "value": 0.12, "display_type": "number"},
                    {"trait_type": "Dot Divisor", "value": 0.5, "display_type": "number"},
                    {"trait_type": "Human Supporter", "value": "True"}
                ],
                "properties": {
                    "category": "video",
                    "files": [
                        {"uri": "animations/0001.mp4", "type": "video/mp4"},
                        {"uri": "animations/0001.webm", "type": "video/webm"},
                        {"uri": "animations/0001.gif", "type": "image/gif"},
                        {"uri": "images/0001.png", "type": "image/png"}
                    ]
                }
            })
        );
    }

    #[test]
    fn pretty_output_keeps_field_order_and_float_form() {
        let text = token_one().to_json().unwrap();
        assert!(text.starts_with("{\n  \"name\": \"Regent Animata 1\",\n  \"description\""));
        assert!(text.contains(
            "{\n      \"trait_type\": \"Rotation Speed\",\n      \"value\": 2.0,\n      \"display_type\": \"number\"\n    }"
        ));
        assert!(text.contains("\"value\": 1\n"));
    }

    #[test]
    fn sweep_trait_is_appended_last() {
        let mut params = params::derive(5);
        params.scale = 0.15;
        let record = build(
            5,
            &params,
            &AssetAddressing::from_cids(Some("anim"), Some("img"), "ipfs"),
            &MetadataOptions::default(),
            Some(SweepKind::Scale),
        );
        let last = record.attributes.last().unwrap();
        assert_eq!(last.trait_type, "sweep-scale");
        assert_eq!(last.value, TraitValue::Number(0.15));
        assert_eq!(last.display_type.as_deref(), Some("number"));
        assert_eq!(record.animation_url, "ipfs://anim/0005.mp4");
        assert_eq!(record.image, "ipfs://img/0005.png");
    }

    #[test]
    fn building_twice_is_byte_identical() {
        assert_eq!(token_one().to_json().unwrap(), token_one().to_json().unwrap());
    }
}
