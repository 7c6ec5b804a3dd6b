//! `UpdaterService` backed by an HTTP release manifest.
//!
//! The manifest is a small JSON document:
//!
//! ```json
//! { "version": "2.3.0", "url": "https://example.com/pmswitch-2.3.0.tar.gz", "notes": "..." }
//! ```
//!
//! A check announces a newer release on the event bus as `update-available`
//! with the bare version string. An install downloads the payload into the
//! staging directory, emitting `update-progress` per chunk, then emits
//! `update-finished`. Applying the staged payload is left to the packager.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::StreamExt;
use pmswitch_core::config::UpdateConfig;
use pmswitch_core::update::{UpdateEventKind, UpdaterService};
use pmswitch_core::{PmsError, Result};
use semver::Version;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;

use crate::event_bus::EventBus;

/// Release description served at the update endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseManifest {
    pub version: String,
    pub url: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ReleaseManifest {
    /// File name the payload is staged under.
    fn file_name(&self) -> String {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("pmswitch-{}", self.version))
    }
}

/// Parses a version, accepting an optional leading `v`.
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    Ok(Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed))?)
}

pub struct HttpUpdater {
    client: reqwest::Client,
    endpoint: Option<String>,
    current_version: Version,
    staging_dir: PathBuf,
    bus: EventBus,
}

impl HttpUpdater {
    /// Creates an updater comparing against `config.current_version`, or
    /// `fallback_version` (normally the package version) when unset.
    pub fn new(
        config: &UpdateConfig,
        fallback_version: &str,
        staging_dir: PathBuf,
        bus: EventBus,
    ) -> Result<Self> {
        let raw = config
            .current_version
            .as_deref()
            .unwrap_or(fallback_version);
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            current_version: parse_version(raw)?,
            staging_dir,
            bus,
        })
    }

    pub fn current_version(&self) -> &Version {
        &self.current_version
    }

    /// Fetches the manifest; `None` when no endpoint is configured.
    pub async fn fetch_manifest(&self) -> Result<Option<ReleaseManifest>> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(None);
        };
        let manifest = self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<ReleaseManifest>()
            .await?;
        Ok(Some(manifest))
    }

    pub fn is_newer(&self, manifest: &ReleaseManifest) -> Result<bool> {
        Ok(parse_version(&manifest.version)? > self.current_version)
    }

    async fn newer_release(&self) -> Result<Option<ReleaseManifest>> {
        match self.fetch_manifest().await? {
            Some(manifest) if self.is_newer(&manifest)? => Ok(Some(manifest)),
            Some(manifest) => {
                tracing::info!(
                    "[HttpUpdater] Up to date ({} >= {})",
                    self.current_version,
                    manifest.version
                );
                Ok(None)
            }
            None => {
                tracing::debug!("[HttpUpdater] No update endpoint configured");
                Ok(None)
            }
        }
    }

    async fn download(&self, manifest: &ReleaseManifest) -> Result<PathBuf> {
        let response = self
            .client
            .get(&manifest.url)
            .send()
            .await?
            .error_for_status()?;
        let content_length = response.content_length().unwrap_or(0);

        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let target = self.staging_dir.join(manifest.file_name());
        let mut file = tokio::fs::File::create(&target).await?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            self.bus.emit(
                UpdateEventKind::Progress.as_str(),
                json!({ "downloaded": downloaded, "contentLength": content_length }),
            );
        }
        file.flush().await?;

        if content_length > 0 && downloaded != content_length {
            return Err(PmsError::update(format!(
                "Download truncated: {} of {} bytes",
                downloaded, content_length
            )));
        }
        Ok(target)
    }
}

#[async_trait]
impl UpdaterService for HttpUpdater {
    async fn check_for_updates(&self) -> Result<()> {
        if let Some(manifest) = self.newer_release().await? {
            tracing::info!("[HttpUpdater] Found version {}", manifest.version);
            self.bus
                .emit(UpdateEventKind::Available.as_str(), json!(manifest.version));
        }
        Ok(())
    }

    async fn install_update(&self) -> Result<()> {
        let manifest = self
            .newer_release()
            .await?
            .ok_or_else(|| PmsError::update("No update available"))?;

        tracing::info!("[HttpUpdater] Downloading {} from {}", manifest.version, manifest.url);
        let staged = self.download(&manifest).await?;
        tracing::info!("[HttpUpdater] Staged {}", staged.display());

        self.bus
            .emit(UpdateEventKind::Finished.as_str(), serde_json::Value::Null);
        Ok(())
    }
}
