//! GitHub Releases as an update repository.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use sha2::{Digest, Sha256};

use super::types::{GitHubRelease, target_triple};
use crate::config::UpdateChannel;
use crate::error::{Result, UpdateError};
use crate::repository::{UpdateDescriptor, UpdateRepository};
use crate::steps::progress::DownloadProgress;
use crate::verify;
use crate::version::Version;

/// GitHub API base URL.
const GITHUB_API_URL: &str = "https://api.github.com";

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("selfup/", env!("CARGO_PKG_VERSION"));

/// Size of each read while streaming a download.
const CHUNK_SIZE: usize = 64 * 1024;

/// Update repository backed by a GitHub repository's releases.
#[derive(Debug, Clone)]
pub struct GitHubRepository {
    client: Client,
    owner: String,
    repo: String,
    current: Version,
    target: String,
    target_dir: PathBuf,
}

impl GitHubRepository {
    /// Creates a client for `owner/repo`, downloading into `target_dir`.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        current: Version,
        target_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| UpdateError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
            current,
            target: target_triple().to_string(),
            target_dir: target_dir.into(),
        })
    }

    /// Overrides the target triple matched against asset names.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    fn list_releases(&self) -> Result<Vec<GitHubRelease>> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page=30",
            GITHUB_API_URL, self.owner, self.repo
        );
        tracing::debug!("Fetching releases from {}", url);

        let response = check_status(self.client.get(&url).send()?)?;
        Ok(response.json()?)
    }

    /// Picks the newest release on `channel` above the running version.
    fn select_update(
        &self,
        releases: &[GitHubRelease],
        channel: UpdateChannel,
    ) -> Result<Option<UpdateDescriptor>> {
        let newest = releases
            .iter()
            .filter(|release| !release.draft)
            .filter_map(|release| release.version().map(|version| (version, release)))
            .filter(|(version, _)| channel.includes(version) && *version > self.current)
            .max_by(|(a, _), (b, _)| a.cmp(b));

        let Some((version, release)) = newest else {
            return Ok(None);
        };
        let asset = release
            .find_asset_for_target(&self.target)
            .ok_or_else(|| UpdateError::NoAssetFound(self.target.clone()))?;
        Ok(Some(release.descriptor(version, asset)))
    }
}

/// Maps error statuses, including rate limiting, to `UpdateError`.
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status == reqwest::StatusCode::FORBIDDEN
        && response
            .headers()
            .get("x-ratelimit-remaining")
            .is_some_and(|remaining| remaining.to_str().unwrap_or("1") == "0")
    {
        let retry_after = response
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .map_or(60, |reset| {
                u64::try_from(reset - chrono::Utc::now().timestamp()).unwrap_or(0)
            });
        return Err(UpdateError::RateLimited { retry_after });
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(UpdateError::Network(
            "No releases found for this repository".to_string(),
        ));
    }

    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(UpdateError::Network(format!(
            "GitHub API error ({status}): {body}"
        )));
    }

    Ok(response)
}

/// Streams `reader` into `dest`, hashing and reporting progress as it goes.
fn stream_to_file(
    reader: &mut impl Read,
    dest: &Path,
    expected: u64,
    progress: &mut dyn FnMut(DownloadProgress),
) -> Result<(u64, String)> {
    let mut out = BufWriter::new(File::create(dest)?);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| UpdateError::Download(e.to_string()))?;
        if n == 0 {
            break;
        }
        out.write_all(&buffer[..n])?;
        hasher.update(&buffer[..n]);
        downloaded += n as u64;
        progress(DownloadProgress::new(downloaded, expected));
    }
    out.flush()?;

    Ok((downloaded, hex::encode(hasher.finalize())))
}

impl UpdateRepository for GitHubRepository {
    fn check_for_updates(&mut self, channel: UpdateChannel) -> Result<Option<UpdateDescriptor>> {
        let releases = self.list_releases()?;
        tracing::debug!(count = releases.len(), %channel, "Fetched releases");
        self.select_update(&releases, channel)
    }

    fn download(
        &mut self,
        update: &UpdateDescriptor,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<PathBuf> {
        let digest = update
            .digest
            .as_deref()
            .ok_or(UpdateError::NoDigestAvailable)?;

        fs::create_dir_all(&self.target_dir)?;
        let dest = self.target_dir.join(&update.archive_name);
        let partial = self.target_dir.join(format!("{}.part", update.archive_name));

        tracing::info!("Downloading {} from {}", update.archive_name, update.locator);
        let mut response = check_status(
            self.client
                .get(&update.locator)
                .header(ACCEPT, "application/octet-stream")
                .send()
                .map_err(|e| UpdateError::Download(e.to_string()))?,
        )?;

        let result = stream_to_file(&mut response, &partial, update.length, progress)
            .and_then(|(downloaded, actual)| {
                if downloaded != update.length {
                    return Err(UpdateError::Verification(format!(
                        "expected {} bytes, received {downloaded}",
                        update.length
                    )));
                }
                verify::check_digest(&actual, digest)
            });
        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&partial) {
                tracing::warn!(error = %cleanup, "Failed to remove partial download: {:?}", partial);
            }
            return Err(e);
        }

        fs::rename(&partial, &dest)?;
        tracing::info!("Downloaded to: {:?}", dest);
        Ok(dest)
    }
}
