//! Rent reminder notice renderer
//!
//! Turns four plain fields (resident name, unit number, amount due, due date)
//! into a letter-style A4 notice rendered as a 300 DPI PNG, and serves it from
//! a small web form.
//!
//! # Features
//!
//! - **Always renders**: missing fonts fall back to a built-in bitmap font and
//!   a missing logo falls back to a drawn placeholder box
//! - **Reproducible**: reference codes and paper texture come from an
//!   injectable, seedable random source
//! - **server** (default): `tiny_http` front end with preview and download
//! - **remote-logo** (default): fetch and cache the letterhead logo over HTTP
//!
//! # Example
//!
//! ```no_run
//! use rentnotice::{NoticeConfig, NoticeRenderer, NoticeRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = NoticeRenderer::new(NoticeConfig::default());
//! let request = NoticeRequest::new("Jane Doe")
//!     .with_unit("B-204")
//!     .with_amount("11,500");
//! let notice = renderer.render(&request);
//! notice.save("rent_reminder_Jane_Doe.png")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod fonts;
pub mod logo;
pub mod notice;
pub mod organization;
pub mod rendering;

// Web front end (form, preview, download)
#[cfg(feature = "server")]
pub mod server;

pub use fonts::{FontProvider, FontSet, FontSizes};
pub use logo::{LogoCache, LogoSource, NoLogo, StaticLogo};
pub use organization::Organization;
pub use rendering::layout::{NoticeLayout, PageGeometry};
pub use rendering::RenderedNotice;

use notice::References;
use rendering::layout::{self, NoticeContent};
use rendering::raster;

/// The resident and billing fields of one notice.
///
/// Values are rendered verbatim; nothing is validated. Missing fields take
/// their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeRequest {
    pub resident_name: String,
    /// Empty means no resident box is drawn
    pub unit_number: String,
    /// Pre-formatted; empty means no amount sentence
    pub amount_due: String,
    /// Spliced into "due by the <due_date> of this month"
    pub due_date: String,
}

impl Default for NoticeRequest {
    fn default() -> Self {
        Self {
            resident_name: notice::DEFAULT_RESIDENT.to_string(),
            unit_number: String::new(),
            amount_due: String::new(),
            due_date: "1st".to_string(),
        }
    }
}

impl NoticeRequest {
    pub fn new(resident_name: impl Into<String>) -> Self {
        Self {
            resident_name: resident_name.into(),
            ..Default::default()
        }
    }

    /// Default fields with the organization's usual due date.
    pub fn for_organization(org: &Organization) -> Self {
        Self {
            due_date: org.default_due_date.clone(),
            ..Default::default()
        }
    }

    pub fn with_unit(mut self, unit_number: impl Into<String>) -> Self {
        self.unit_number = unit_number.into();
        self
    }

    pub fn with_amount(mut self, amount_due: impl Into<String>) -> Self {
        self.amount_due = amount_due.into();
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = due_date.into();
        self
    }
}

/// When to scatter the paper texture over the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseMode {
    Never,
    Always,
    /// 50% chance per render
    #[default]
    CoinFlip,
}

impl NoiseMode {
    fn roll<R: Rng + ?Sized>(self, rng: &mut R) -> bool {
        match self {
            NoiseMode::Never => false,
            NoiseMode::Always => true,
            NoiseMode::CoinFlip => rng.gen_bool(0.5),
        }
    }
}

/// Where the logo cache lives and whether to use it at all
#[derive(Debug, Clone, PartialEq)]
pub struct LogoSettings {
    /// When false the placeholder box is always drawn
    pub enabled: bool,
    /// Directory holding the cached logo file
    pub directory: PathBuf,
    /// Download timeout in milliseconds
    pub timeout_ms: u64,
    /// Seconds to wait after a failed download before trying again
    pub retry_after_secs: u64,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("static"),
            timeout_ms: 10_000,
            retry_after_secs: 60,
        }
    }
}

/// Configuration for a [`NoticeRenderer`]
///
/// The defaults reproduce the web variant: A4 at 300 DPI, the Brandon
/// Apartments letterhead, serif fonts if installed, a cached logo under
/// `static/`, and a coin-flip paper texture.
///
/// # Examples
///
/// ```
/// let cfg = rentnotice::NoticeConfig::default();
/// assert_eq!(cfg.page.width, 2480);
/// assert_eq!(cfg.dpi, 300);
/// ```
#[derive(Debug, Clone)]
pub struct NoticeConfig {
    pub page: PageGeometry,
    /// Resolution recorded in the PNG
    pub dpi: u32,
    pub organization: Organization,
    /// Ordered font candidates
    pub fonts: FontProvider,
    pub font_sizes: FontSizes,
    pub logo: LogoSettings,
    pub noise: NoiseMode,
    /// Fixed seed for reference codes and texture; entropy when `None`
    pub seed: Option<u64>,
    /// Date printed on the notice; today when `None`
    pub issue_date: Option<NaiveDate>,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            dpi: rendering::DEFAULT_DPI,
            organization: Organization::default(),
            fonts: FontProvider::default(),
            font_sizes: FontSizes::default(),
            logo: LogoSettings::default(),
            noise: NoiseMode::default(),
            seed: None,
            issue_date: None,
        }
    }
}

impl NoticeConfig {
    /// Built-in font and no logo: output depends only on the request, the
    /// seed, and the date.
    pub fn offline() -> Self {
        Self {
            fonts: FontProvider::builtin_only(),
            logo: LogoSettings {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn logo_path(&self) -> PathBuf {
        self.logo.directory.join(&self.organization.logo_file)
    }
}

/// Renders notices. Cheap to share behind an `Arc`; every render is
/// independent.
pub struct NoticeRenderer {
    config: NoticeConfig,
    fonts: FontSet,
    logo: Arc<dyn LogoSource>,
}

impl NoticeRenderer {
    /// Resolve fonts once and set up the logo source from `config`.
    pub fn new(config: NoticeConfig) -> Self {
        let fonts = config.fonts.get_fonts(&config.font_sizes);
        let logo: Arc<dyn LogoSource> = if config.logo.enabled {
            Arc::new(
                LogoCache::new(config.logo_path(), Some(config.organization.logo_url.clone()))
                    .with_timeout(Duration::from_millis(config.logo.timeout_ms))
                    .with_retry_after(Duration::from_secs(config.logo.retry_after_secs)),
            )
        } else {
            Arc::new(NoLogo)
        };
        log::debug!(
            "Notice renderer ready (builtin font: {}, logo: {})",
            fonts.is_builtin(),
            config.logo.enabled
        );
        Self { config, fonts, logo }
    }

    /// Replace the logo source, e.g. with a [`StaticLogo`].
    pub fn with_logo_source(mut self, source: Arc<dyn LogoSource>) -> Self {
        self.logo = source;
        self
    }

    pub fn config(&self) -> &NoticeConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn logo_source(&self) -> &Arc<dyn LogoSource> {
        &self.logo
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Render with the configured random source.
    pub fn render(&self, request: &NoticeRequest) -> RenderedNotice {
        let mut rng = self.rng();
        self.render_with_rng(request, &mut rng)
    }

    /// Render drawing reference codes and texture from `rng`.
    pub fn render_with_rng<R: Rng + ?Sized>(&self, request: &NoticeRequest, rng: &mut R) -> RenderedNotice {
        let layout = self.layout_with_rng(request, rng);
        let image = raster::rasterize(&layout, &self.fonts);
        RenderedNotice {
            image,
            dpi: self.config.dpi,
        }
    }

    /// The display list for `request` without rasterizing it.
    pub fn layout(&self, request: &NoticeRequest) -> NoticeLayout {
        let mut rng = self.rng();
        self.layout_with_rng(request, &mut rng)
    }

    pub fn layout_with_rng<R: Rng + ?Sized>(&self, request: &NoticeRequest, rng: &mut R) -> NoticeLayout {
        let org = &self.config.organization;
        let date = self
            .config
            .issue_date
            .unwrap_or_else(|| Local::now().date_naive());
        let references = References::generate(org, date.year(), rng);
        let content = NoticeContent {
            request,
            organization: org,
            date_line: notice::date_line(date),
            references,
            logo: self.logo.load_logo(),
        };

        let mut page = layout::layout_notice(&self.config.page, &self.fonts, &content);
        if self.config.noise.roll(rng) {
            page.commands.push(layout::paper_texture(
                rng,
                page.width,
                page.height,
                layout::NOISE_PIXELS,
            ));
        }
        page
    }
}

/// Render with the default configuration.
pub fn render_notice(request: &NoticeRequest) -> RenderedNotice {
    NoticeRenderer::new(NoticeConfig::default()).render(request)
}

/// Render with the default configuration and write the PNG to `path`.
pub fn save_notice(request: &NoticeRequest, path: impl AsRef<Path>) -> Result<RenderedNotice> {
    let notice = render_notice(request);
    notice.save(path.as_ref())?;
    log::info!("Rent reminder notice saved as {}", path.as_ref().display());
    Ok(notice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NoticeConfig::default();
        assert_eq!(config.page.width, 2480);
        assert_eq!(config.page.height, 3508);
        assert_eq!(config.noise, NoiseMode::CoinFlip);
        assert!(config.logo.enabled);
        assert_eq!(config.logo_path(), PathBuf::from("static/brandon_logo.png"));
    }

    #[test]
    fn test_request_defaults() {
        let req = NoticeRequest::default();
        assert_eq!(req.resident_name, "Resident");
        assert_eq!(req.due_date, "1st");
        assert!(req.unit_number.is_empty());
        assert!(req.amount_due.is_empty());
    }

    #[test]
    fn test_request_for_organization_uses_its_due_date() {
        assert_eq!(NoticeRequest::for_organization(&Organization::ywca()).due_date, "10th");
        assert_eq!(NoticeRequest::for_organization(&Organization::brandon()), NoticeRequest::default());
    }

    #[test]
    fn test_request_from_partial_json() {
        let req: NoticeRequest = serde_json::from_str(r#"{"unit_number":"B-204"}"#).unwrap();
        assert_eq!(req.resident_name, "Resident");
        assert_eq!(req.unit_number, "B-204");
        assert_eq!(req.due_date, "1st");
    }

    #[test]
    fn test_noise_modes() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(!NoiseMode::Never.roll(&mut rng));
        assert!(NoiseMode::Always.roll(&mut rng));
        let heads = (0..200).filter(|_| NoiseMode::CoinFlip.roll(&mut rng)).count();
        assert!(heads > 50 && heads < 150);
    }

    #[test]
    fn test_offline_layout_uses_placeholder() {
        let renderer = NoticeRenderer::new(NoticeConfig::offline());
        assert!(renderer.fonts().is_builtin());
        let layout = renderer.layout(&NoticeRequest::default());
        assert!(layout.logo_placeholder);
    }

    #[test]
    fn test_seeded_layouts_match() {
        let config = NoticeConfig {
            seed: Some(42),
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            noise: NoiseMode::Always,
            ..NoticeConfig::offline()
        };
        let renderer = NoticeRenderer::new(config);
        let req = NoticeRequest::new("Jane Doe").with_unit("B-204");
        let a = renderer.layout(&req);
        let b = renderer.layout(&req);
        assert_eq!(a.commands, b.commands);
        assert!(a.texts().any(|t| t == "Date: 01/03/2026"));
    }
}
