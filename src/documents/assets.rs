// Certificate artwork lookup
// Bundled artwork lives under the static root, uploaded headers, logos and ads under
// the media root; a missing file is never an error for rendering

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::locale::Locale;

pub const PLAYERS_CLUB_LOGO: &str = "certificates/players-club-logo.png";
pub const FALLBACK_CLUB_LOGO: &str = "certificates/logo-25.jpg";
pub const DEFAULT_HEADER: &str = "certificates/certificate-header.jpg";
pub const DEFAULT_DOUBLE_HEADER: &str = "certificates/certificate-header-double.jpg";
pub const PRESTIGE_50_HEADER: &str = "certificates/prestige50-header.jpg";

/// ClubLink logo in the batch language
pub fn brand_logo(locale: Locale) -> String {
    format!("certificates/cl-logo-{}.png", locale)
}

pub fn ag30_header(locale: Locale) -> String {
    format!("certificates/ag30-header-{}.jpg", locale)
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Bundled asset by relative name, `None` when absent
    async fn static_asset(&self, name: &str) -> Option<Vec<u8>>;

    /// Uploaded file by its stored name, `None` when absent
    async fn media(&self, name: &str) -> Option<Vec<u8>>;
}

/// Assets read from two directories on local disk
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    static_root: PathBuf,
    media_root: PathBuf,
}

impl FsAssetStore {
    pub fn new(static_root: impl Into<PathBuf>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            static_root: static_root.into(),
            media_root: media_root.into(),
        }
    }

    async fn read(root: &Path, name: &str) -> Option<Vec<u8>> {
        let relative = Path::new(name.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            tracing::warn!("Rejected asset path outside its root: {}", name);
            return None;
        }

        match tokio::fs::read(root.join(relative)).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!("Asset {} unavailable: {}", name, e);
                None
            }
        }
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn static_asset(&self, name: &str) -> Option<Vec<u8>> {
        Self::read(&self.static_root, name).await
    }

    async fn media(&self, name: &str) -> Option<Vec<u8>> {
        if name.trim().is_empty() {
            return None;
        }
        Self::read(&self.media_root, name).await
    }
}
