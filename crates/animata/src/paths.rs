use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoder::Format;
use metadata::{token_stem, ANIMATIONS_DIR, IMAGES_DIR};

const METADATA_DIR: &str = "metadata";
const PARAMS_DIR: &str = "params";

/// Folder layout under `--out-root`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn animations_dir(&self) -> PathBuf {
        self.root.join(ANIMATIONS_DIR)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    pub fn params_dir(&self) -> PathBuf {
        self.root.join(PARAMS_DIR)
    }

    /// Creates every output folder; existing ones are left alone.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.animations_dir(),
            self.images_dir(),
            self.metadata_dir(),
            self.params_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn animation_path(&self, token_id: u64, format: Format) -> PathBuf {
        self.animations_dir()
            .join(format!("{}.{}", token_stem(token_id), format.extension()))
    }

    pub fn poster_path(&self, token_id: u64) -> PathBuf {
        self.images_dir().join(format!("{}.png", token_stem(token_id)))
    }

    pub fn metadata_path(&self, token_id: u64) -> PathBuf {
        self.metadata_dir().join(format!("{}.json", token_stem(token_id)))
    }

    pub fn sidecar_path(&self, token_id: u64) -> PathBuf {
        self.params_dir().join(format!("{}.json", token_stem(token_id)))
    }
}
