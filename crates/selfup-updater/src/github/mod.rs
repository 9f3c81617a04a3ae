//! GitHub Releases client.

mod client;
mod types;

pub use client::GitHubRepository;
pub use types::{GitHubAsset, GitHubRelease, target_triple};
