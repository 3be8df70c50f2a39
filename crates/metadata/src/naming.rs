/// File stem for a token: zero-padded to four digits, wider ids in full.
pub fn token_stem(token_id: u64) -> String {
    format!("{token_id:04}")
}

/// Files published for every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Mp4,
    Webm,
    Gif,
    Png,
}

impl AssetKind {
    /// Order used in `properties.files`.
    pub const ALL: [AssetKind; 4] = [AssetKind::Mp4, AssetKind::Webm, AssetKind::Gif, AssetKind::Png];

    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Mp4 => "mp4",
            AssetKind::Webm => "webm",
            AssetKind::Gif => "gif",
            AssetKind::Png => "png",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            AssetKind::Mp4 => "video/mp4",
            AssetKind::Webm => "video/webm",
            AssetKind::Gif => "image/gif",
            AssetKind::Png => "image/png",
        }
    }

    /// Animations share one folder; the poster lives with the images.
    pub fn is_animation(self) -> bool {
        !matches!(self, AssetKind::Png)
    }

    pub fn file_name(self, token_id: u64) -> String {
        format!("{}.{}", token_stem(token_id), self.extension())
    }
}
