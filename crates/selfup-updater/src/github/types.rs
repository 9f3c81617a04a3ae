//! GitHub API types.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::repository::UpdateDescriptor;
use crate::version::Version;

/// Raw release data from the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    /// The release tag name (e.g., "v0.1.0").
    pub tag_name: String,

    /// Release notes in markdown.
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

impl GitHubRelease {
    /// Parses the tag, `None` for tags that are not versions.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        self.tag_name.parse().ok()
    }

    /// Bullet points of the release notes, as the `changes` metadata list.
    #[must_use]
    pub fn custom_metadata(&self) -> Option<Value> {
        let changes: Vec<&str> = self
            .body
            .as_deref()?
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
            })
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();
        (!changes.is_empty()).then(|| json!({ "changes": changes }))
    }

    /// Finds the uploaded `.tar.gz` asset built for `target`.
    #[must_use]
    pub fn find_asset_for_target(&self, target: &str) -> Option<&GitHubAsset> {
        let target = target.to_lowercase();
        self.assets.iter().find(|asset| {
            let name = asset.name.to_lowercase();
            asset.is_uploaded()
                && name.contains(&target)
                && (name.ends_with(".tar.gz") || name.ends_with(".tgz"))
        })
    }

    /// Describes this release for the update cycle.
    #[must_use]
    pub fn descriptor(&self, version: Version, asset: &GitHubAsset) -> UpdateDescriptor {
        UpdateDescriptor {
            version,
            archive_name: asset.name.clone(),
            length: asset.size,
            custom: self.custom_metadata(),
            locator: asset.browser_download_url.clone(),
            digest: asset.digest.clone(),
        }
    }
}

/// Release asset data from the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub name: String,

    /// Direct download URL.
    pub browser_download_url: String,

    /// Upload state: "uploaded" (complete) or "open" (still uploading).
    pub state: String,

    /// SHA256 digest (format: "sha256:..."), null until GitHub computed it.
    #[serde(default)]
    pub digest: Option<String>,

    /// File size in bytes.
    pub size: u64,
}

impl GitHubAsset {
    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.state == "uploaded"
    }
}

/// Target triple used in release asset names.
#[must_use]
pub const fn target_triple() -> &'static str {
    if cfg!(all(target_os = "windows", target_arch = "aarch64")) {
        "aarch64-pc-windows-msvc"
    } else if cfg!(target_os = "windows") {
        "x86_64-pc-windows-msvc"
    } else if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        "aarch64-apple-darwin"
    } else if cfg!(target_os = "macos") {
        "x86_64-apple-darwin"
    } else if cfg!(target_arch = "aarch64") {
        "aarch64-unknown-linux-gnu"
    } else {
        "x86_64-unknown-linux-gnu"
    }
}
