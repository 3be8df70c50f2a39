//! Descriptive metadata and parameter sidecars for generated tokens.
//!
//! Everything here is a pure function of the token's parameters and the
//! batch's addressing choice, which is what lets `--metadata-only` rebuild
//! records from sidecars and get byte-identical output.

mod error;
mod locator;
mod naming;
mod record;
mod sidecar;

pub use error::MetadataError;
pub use locator::{AssetAddressing, AssetLocator, ANIMATIONS_DIR, DEFAULT_SCHEME, IMAGES_DIR};
pub use naming::{token_stem, AssetKind};
pub use record::{
    build, Attribute, FileRef, MetadataOptions, MetadataRecord, Properties, TraitValue,
    DEFAULT_COLLECTION, DEFAULT_DESCRIPTION,
};
pub use sidecar::{write_json, ParamSidecar, RenderSettings};
