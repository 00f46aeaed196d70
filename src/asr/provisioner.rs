//! Lazy provisioning of the ASR model bundle.
//!
//! The bundle directory is treated as ready as soon as it exists. When it
//! is missing, the 7z archive at the configured URL is downloaded to a
//! temporary file and unpacked next to the bundle path. Extraction goes
//! into a hidden staging directory first and the bundle directory is moved
//! into place last, so a failed download or a corrupt archive never leaves
//! a half-populated bundle behind.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Ensure the bundle at `local_path` exists, fetching `remote_url` if not.
///
/// Returns `true` when the archive was downloaded and installed, `false`
/// when the bundle was already present (no network access in that case).
pub async fn ensure_model(client: &Client, local_path: &Path, remote_url: &str) -> Result<bool> {
    if local_path.exists() {
        debug!("Model bundle already present at {:?}", local_path);
        return Ok(false);
    }

    let bundle_name = local_path
        .file_name()
        .with_context(|| format!("Model path {:?} has no final component", local_path))?
        .to_os_string();
    let parent = match local_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    tokio::fs::create_dir_all(&parent)
        .await
        .with_context(|| format!("Failed to create model directory {:?}", parent))?;

    info!("Downloading model archive from: {}", remote_url);
    let archive = download_archive(client, remote_url).await?;

    let local_path = local_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let installed = install_archive(archive.path(), &parent, &bundle_name, &local_path);
        drop(archive);
        installed
    })
    .await
    .context("Model extraction task failed")??;

    Ok(true)
}

async fn download_archive(client: &Client, url: &str) -> Result<NamedTempFile> {
    let mut response = client
        .get(url)
        .send()
        .await
        .context("Failed to download model archive")?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to download model archive: HTTP {}", response.status());
    }

    let temp = tempfile::Builder::new()
        .prefix("utts-model-")
        .suffix(".7z")
        .tempfile()
        .context("Failed to create temporary archive file")?;
    let mut file = tokio::fs::File::from_std(temp.reopen()?);

    let mut total: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Model archive download interrupted")?
    {
        file.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }
    file.flush().await?;

    info!("Downloaded model archive ({} bytes) to {:?}", total, temp.path());
    Ok(temp)
}

fn install_archive(
    archive: &Path,
    parent: &Path,
    bundle_name: &OsStr,
    local_path: &Path,
) -> Result<()> {
    let staging = tempfile::Builder::new()
        .prefix(".provision-")
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create staging directory in {:?}", parent))?;

    info!("Extracting model archive into {:?}", parent);
    sevenz_rust::decompress_file(archive, staging.path())
        .map_err(|e| anyhow::anyhow!("Failed to extract model archive: {}", e))?;

    let staged_bundle = staging.path().join(bundle_name);
    if !staged_bundle.exists() {
        anyhow::bail!("Model archive does not contain {:?}", bundle_name);
    }

    for entry in std::fs::read_dir(staging.path())? {
        let entry = entry?;
        let name = entry.file_name();
        if name.as_os_str() == bundle_name {
            continue;
        }

        let target = parent.join(&name);
        if target.exists() {
            debug!("Keeping existing {:?}", target);
            continue;
        }
        std::fs::rename(entry.path(), &target)
            .with_context(|| format!("Failed to move {:?} into place", target))?;
    }

    match std::fs::rename(&staged_bundle, local_path) {
        Ok(()) => {
            info!("Model bundle ready at {:?}", local_path);
            Ok(())
        }
        Err(_) if local_path.exists() => {
            warn!("Model bundle at {:?} appeared during extraction; keeping it", local_path);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to move model bundle to {:?}", local_path)),
    }
}

/// Provisioner for one bundle path; serialises concurrent callers.
pub struct ModelProvisioner {
    local_path: PathBuf,
    remote_url: String,
    client: Client,
    lock: Mutex<()>,
}

impl ModelProvisioner {
    pub fn new(
        local_path: impl Into<PathBuf>,
        remote_url: impl Into<String>,
        download_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = download_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            local_path: local_path.into(),
            remote_url: remote_url.into(),
            client: builder.build().context("Failed to build download client")?,
            lock: Mutex::new(()),
        })
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn is_ready(&self) -> bool {
        self.local_path.exists()
    }

    pub async fn ensure_model(&self) -> Result<bool> {
        let _guard = self.lock.lock().await;
        ensure_model(&self.client, &self.local_path, &self.remote_url).await
    }
}
