use crate::naming::AssetKind;

pub const DEFAULT_SCHEME: &str = "ipfs";
pub const ANIMATIONS_DIR: &str = "animations";
pub const IMAGES_DIR: &str = "images";

/// Where one category of asset is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocator {
    /// Relative folder next to the metadata, e.g. `animations/0001.mp4`.
    Local { dir: String },
    /// Content-addressed folder, e.g. `ipfs://<cid>/0001.mp4`.
    Remote { scheme: String, locator: String },
}

impl AssetLocator {
    pub fn local(dir: impl Into<String>) -> Self {
        AssetLocator::Local { dir: dir.into() }
    }

    pub fn remote(scheme: impl Into<String>, locator: impl Into<String>) -> Self {
        AssetLocator::Remote {
            scheme: scheme.into(),
            locator: locator.into(),
        }
    }

    /// Remote when a content id is known, otherwise the local folder.
    pub fn from_cid(cid: Option<&str>, scheme: &str, local_dir: &str) -> Self {
        match cid.filter(|cid| !cid.is_empty()) {
            Some(cid) => Self::remote(scheme, cid),
            None => Self::local(local_dir),
        }
    }

    pub fn uri(&self, file_name: &str) -> String {
        match self {
            AssetLocator::Local { dir } => format!("{dir}/{file_name}"),
            AssetLocator::Remote { scheme, locator } => {
                format!("{scheme}://{locator}/{file_name}")
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, AssetLocator::Remote { .. })
    }
}

/// One locator per asset category, fixed for a whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetAddressing {
    pub animations: AssetLocator,
    pub images: AssetLocator,
}

impl Default for AssetAddressing {
    fn default() -> Self {
        Self {
            animations: AssetLocator::local(ANIMATIONS_DIR),
            images: AssetLocator::local(IMAGES_DIR),
        }
    }
}

impl AssetAddressing {
    pub fn from_cids(
        animations_cid: Option<&str>,
        images_cid: Option<&str>,
        scheme: &str,
    ) -> Self {
        Self {
            animations: AssetLocator::from_cid(animations_cid, scheme, ANIMATIONS_DIR),
            images: AssetLocator::from_cid(images_cid, scheme, IMAGES_DIR),
        }
    }

    pub fn uri(&self, kind: AssetKind, token_id: u64) -> String {
        let locator = if kind.is_animation() {
            &self.animations
        } else {
            &self.images
        };
        locator.uri(&kind.file_name(token_id))
    }
}
