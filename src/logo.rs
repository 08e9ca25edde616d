//! Logo sources
//!
//! The renderer asks a [`LogoSource`] for the letterhead logo once per render.
//! A missing logo is not an error from the renderer's point of view: it draws
//! a placeholder box instead.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::{Error, Result};

/// Anything that can produce the letterhead logo.
pub trait LogoSource: Send + Sync {
    /// The logo, or `None` when it is unavailable.
    fn load_logo(&self) -> Option<Arc<RgbaImage>>;
}

/// Never provides a logo; the placeholder box is always drawn.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogo;

impl LogoSource for NoLogo {
    fn load_logo(&self) -> Option<Arc<RgbaImage>> {
        None
    }
}

/// A logo already held in memory.
#[derive(Debug, Clone)]
pub struct StaticLogo(pub Arc<RgbaImage>);

impl StaticLogo {
    pub fn new(image: RgbaImage) -> Self {
        StaticLogo(Arc::new(image))
    }
}

impl LogoSource for StaticLogo {
    fn load_logo(&self) -> Option<Arc<RgbaImage>> {
        Some(self.0.clone())
    }
}

/// Read-through cache backed by a single file.
///
/// The file is read first; when it is missing or undecodable the logo is
/// downloaded from `url`, the fetched bytes are written to the file, and the
/// decoded image is returned. Concurrent first writes are harmless since every
/// writer stores the same content.
///
/// A failed download is remembered for `retry_after`; until then only the
/// file is consulted and no request is made.
pub struct LogoCache {
    path: PathBuf,
    url: Option<String>,
    timeout: Duration,
    retry_after: Duration,
    memo: RwLock<Option<Arc<RgbaImage>>>,
    failed_at: RwLock<Option<Instant>>,
}

impl LogoCache {
    pub fn new(path: impl Into<PathBuf>, url: Option<String>) -> Self {
        Self {
            path: path.into(),
            url,
            timeout: Duration::from_secs(10),
            retry_after: Duration::from_secs(60),
            memo: RwLock::new(None),
            failed_at: RwLock::new(None),
        }
    }

    /// How long a failed download suppresses further attempts.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// True while a recent download failure is being honoured.
    pub fn backing_off(&self) -> bool {
        match self.failed_at.read() {
            Ok(failed) => failed.map_or(false, |at| at.elapsed() < self.retry_after),
            Err(_) => false,
        }
    }

    fn record_failure(&self, failed: bool) {
        if let Ok(mut slot) = self.failed_at.write() {
            *slot = failed.then(Instant::now);
        }
    }

    fn read_local(&self) -> Result<RgbaImage> {
        if !self.path.is_file() {
            return Err(Error::LogoError(format!(
                "{} does not exist",
                self.path.display()
            )));
        }
        Ok(image::open(&self.path)?.to_rgba8())
    }

    #[cfg(feature = "remote-logo")]
    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;
        let resp = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;
        let bytes = resp
            .bytes()
            .map_err(|e| Error::NetworkError(format!("Failed to read logo body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "remote-logo"))]
    fn download(&self, url: &str) -> Result<Vec<u8>> {
        Err(Error::NetworkError(format!(
            "remote logo support is disabled, cannot fetch {}",
            url
        )))
    }

    fn fetch_and_store(&self) -> Result<RgbaImage> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| Error::LogoError("no download URL configured".into()))?;
        let bytes = self.download(url)?;
        let logo = image::load_from_memory(&bytes)?.to_rgba8();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, &bytes)?;
        log::info!("Cached logo from {} at {}", url, self.path.display());
        Ok(logo)
    }

    fn remember(&self, logo: RgbaImage) -> Arc<RgbaImage> {
        let logo = Arc::new(logo);
        if let Ok(mut memo) = self.memo.write() {
            *memo = Some(logo.clone());
        }
        logo
    }
}

impl LogoSource for LogoCache {
    fn load_logo(&self) -> Option<Arc<RgbaImage>> {
        if let Ok(memo) = self.memo.read() {
            if let Some(logo) = memo.as_ref() {
                return Some(logo.clone());
            }
        }

        match self.read_local() {
            Ok(logo) => return Some(self.remember(logo)),
            Err(e) => log::debug!("Local logo unavailable: {}", e),
        }

        if self.backing_off() {
            log::debug!("Skipping logo download after a recent failure");
            return None;
        }

        match self.fetch_and_store() {
            Ok(logo) => {
                self.record_failure(false);
                Some(self.remember(logo))
            }
            Err(e) => {
                self.record_failure(true);
                log::warn!("Could not obtain logo, drawing placeholder: {}", e);
                None
            }
        }
    }
}
