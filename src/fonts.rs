//! Font selection with a guaranteed fallback
//!
//! A [`FontProvider`] walks an ordered list of font files and hands back a
//! [`FontSet`] with one [`NoticeFont`] per text role. When no candidate can be
//! read the built-in 10x20 bitmap font is used instead, so font loading never
//! fails.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusttype::{point, Font, Scale};

use crate::{Error, Result};

/// Cell size of the built-in bitmap font at scale 1.
pub const BUILTIN_GLYPH_WIDTH: u32 = 10;
pub const BUILTIN_GLYPH_HEIGHT: u32 = 20;

/// Gap between lines of a multi-line text block.
pub const MULTILINE_SPACING: u32 = 4;

/// Where a piece of text sits in the letter; each role has its own size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Header,
    Subheader,
    Text,
    Footer,
    Small,
}

/// Pixel sizes per role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub header: f32,
    pub subheader: f32,
    pub text: f32,
    pub footer: f32,
    pub small: f32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            header: 32.0,
            subheader: 21.0,
            text: 21.0,
            footer: 18.0,
            small: 16.0,
        }
    }
}

impl FontSizes {
    pub fn get(&self, role: FontRole) -> f32 {
        match role {
            FontRole::Header => self.header,
            FontRole::Subheader => self.subheader,
            FontRole::Text => self.text,
            FontRole::Footer => self.footer,
            FontRole::Small => self.small,
        }
    }
}

/// A sized font ready for measuring and drawing.
#[derive(Clone)]
pub enum NoticeFont {
    /// TrueType/OpenType outlines rendered with anti-aliasing
    Outline { font: Arc<Font<'static>>, px: f32 },
    /// Built-in bitmap font, each cell magnified by an integer factor
    Builtin { scale: u32 },
}

impl fmt::Debug for NoticeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeFont::Outline { px, .. } => f.debug_struct("Outline").field("px", px).finish(),
            NoticeFont::Builtin { scale } => {
                f.debug_struct("Builtin").field("scale", scale).finish()
            }
        }
    }
}

impl NoticeFont {
    /// Built-in font scaled to approximate `px`.
    pub fn builtin(px: f32) -> Self {
        let scale = (px / BUILTIN_GLYPH_HEIGHT as f32).round().max(1.0) as u32;
        NoticeFont::Builtin { scale }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, NoticeFont::Builtin { .. })
    }

    /// Horizontal extent of `text` in pixels.
    pub fn text_width(&self, text: &str) -> u32 {
        match self {
            NoticeFont::Outline { font, px } => {
                let scale = Scale::uniform(*px);
                font.layout(text, scale, point(0.0, 0.0))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0)
                    .ceil() as u32
            }
            NoticeFont::Builtin { scale } => {
                text.chars().count() as u32 * BUILTIN_GLYPH_WIDTH * scale
            }
        }
    }

    /// Height of one line of text in pixels, independent of content.
    pub fn line_height(&self) -> u32 {
        match self {
            NoticeFont::Outline { font, px } => {
                let v = font.v_metrics(Scale::uniform(*px));
                (v.ascent - v.descent).ceil() as u32
            }
            NoticeFont::Builtin { scale } => BUILTIN_GLYPH_HEIGHT * scale,
        }
    }

    pub fn text_size(&self, text: &str) -> (u32, u32) {
        (self.text_width(text), self.line_height())
    }

    /// Size of a block of lines drawn with [`MULTILINE_SPACING`] between them.
    pub fn block_size<S: AsRef<str>>(&self, lines: &[S]) -> (u32, u32) {
        if lines.is_empty() {
            return (0, 0);
        }
        let width = lines
            .iter()
            .map(|l| self.text_width(l.as_ref()))
            .max()
            .unwrap_or(0);
        let n = lines.len() as u32;
        (width, n * self.line_height() + (n - 1) * MULTILINE_SPACING)
    }
}

/// One font per role.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub header: NoticeFont,
    pub subheader: NoticeFont,
    pub text: NoticeFont,
    pub footer: NoticeFont,
    pub small: NoticeFont,
}

impl FontSet {
    pub fn builtin(sizes: &FontSizes) -> Self {
        Self {
            header: NoticeFont::builtin(sizes.header),
            subheader: NoticeFont::builtin(sizes.subheader),
            text: NoticeFont::builtin(sizes.text),
            footer: NoticeFont::builtin(sizes.footer),
            small: NoticeFont::builtin(sizes.small),
        }
    }

    pub fn from_font(font: Arc<Font<'static>>, sizes: &FontSizes) -> Self {
        let sized = |px: f32| NoticeFont::Outline { font: font.clone(), px };
        Self {
            header: sized(sizes.header),
            subheader: sized(sizes.subheader),
            text: sized(sizes.text),
            footer: sized(sizes.footer),
            small: sized(sizes.small),
        }
    }

    pub fn get(&self, role: FontRole) -> &NoticeFont {
        match role {
            FontRole::Header => &self.header,
            FontRole::Subheader => &self.subheader,
            FontRole::Text => &self.text,
            FontRole::Footer => &self.footer,
            FontRole::Small => &self.small,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.text.is_builtin()
    }
}

/// Ordered font candidates plus the directories bare file names are looked
/// up in.
#[derive(Debug, Clone, PartialEq)]
pub struct FontProvider {
    candidates: Vec<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl Default for FontProvider {
    fn default() -> Self {
        Self::new(vec![
            PathBuf::from("Times New Roman.ttf"),
            PathBuf::from("DejaVuSerif.ttf"),
        ])
    }
}

fn default_search_dirs() -> Vec<PathBuf> {
    [
        ".",
        "fonts",
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/truetype/msttcorefonts",
        "/usr/share/fonts/TTF",
        "/usr/share/fonts/dejavu",
        "/Library/Fonts",
        "/System/Library/Fonts/Supplemental",
        "C:\\Windows\\Fonts",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

impl FontProvider {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            search_dirs: default_search_dirs(),
        }
    }

    /// A provider that always yields the built-in font.
    pub fn builtin_only() -> Self {
        Self {
            candidates: Vec::new(),
            search_dirs: Vec::new(),
        }
    }

    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    fn resolve(&self, candidate: &Path) -> Option<PathBuf> {
        if candidate.is_absolute() || candidate.components().count() > 1 {
            return candidate.is_file().then(|| candidate.to_path_buf());
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(candidate))
            .find(|p| p.is_file())
    }

    /// Read and parse a single candidate.
    pub fn load_candidate(&self, candidate: &Path) -> Result<Arc<Font<'static>>> {
        let path = self
            .resolve(candidate)
            .ok_or_else(|| Error::FontError(format!("{} not found", candidate.display())))?;
        let data = std::fs::read(&path)?;
        let font = Font::try_from_vec(data).ok_or_else(|| {
            Error::FontError(format!("{} is not a usable font", path.display()))
        })?;
        log::debug!("Loaded font {}", path.display());
        Ok(Arc::new(font))
    }

    /// First candidate that loads, for every role; the built-in font otherwise.
    pub fn get_fonts(&self, sizes: &FontSizes) -> FontSet {
        for candidate in &self.candidates {
            match self.load_candidate(candidate) {
                Ok(font) => return FontSet::from_font(font, sizes),
                Err(e) => log::debug!("Skipping font candidate: {}", e),
            }
        }
        if !self.candidates.is_empty() {
            log::warn!("Preferred fonts not found, using the built-in font");
        }
        FontSet::builtin(sizes)
    }
}
