//! Page composition for the rent reminder notice
//!
//! `layout_notice` walks the letter top to bottom with a vertical cursor and
//! emits a flat list of paint commands. Nothing is drawn here; the result can
//! be inspected in tests and handed to `raster::rasterize`.

use std::sync::Arc;

use image::{Rgb, RgbaImage};
use rand::Rng;

use crate::fonts::{FontRole, FontSet, NoticeFont, MULTILINE_SPACING};
use crate::notice::{self, References};
use crate::organization::Organization;
use crate::rendering::paint::{Color, PaintCommand, Rect, BLACK, WHITE};
use crate::rendering::{A4_HEIGHT, A4_WIDTH};
use crate::NoticeRequest;

pub const HEADER_HEIGHT: u32 = 133;
pub const FOOTER_HEIGHT: u32 = 66;
pub const LOGO_MAX_WIDTH: u32 = 160;
pub const LOGO_MAX_HEIGHT: u32 = 66;

/// Cursor advance for a blank body line.
pub const PARAGRAPH_GAP: i32 = 20;
/// Extra advance after each drawn line.
const LINE_GAP: i32 = 5;

const HEADER_FILL: Color = Rgb([248, 248, 248]);
const DIVIDER: Color = Rgb([230, 230, 230]);
pub const BOX_FILL: Color = Rgb([248, 248, 248]);
pub const BOX_BORDER: Color = Rgb([220, 220, 220]);
const FOOTER_TEXT: Color = Rgb([100, 100, 100]);
pub const WATERMARK_COLOR: Color = Rgb([245, 245, 245]);
pub const NOISE_COLOR: Color = Rgb([240, 240, 240]);
pub const NOISE_PIXELS: usize = 5000;

/// Canvas size and margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin_left: 200,
            margin_right: 200,
            margin_top: 240,
            margin_bottom: 240,
        }
    }
}

impl PageGeometry {
    /// Wrap boundary for body text.
    pub fn content_width(&self) -> u32 {
        self.width
            .saturating_sub(self.margin_left.saturating_add(self.margin_right))
    }

    fn right_edge(&self) -> i32 {
        self.width.saturating_sub(self.margin_right) as i32
    }
}

/// Per-render inputs that are not geometry.
#[derive(Debug, Clone)]
pub struct NoticeContent<'a> {
    pub request: &'a NoticeRequest,
    pub organization: &'a Organization,
    /// Already formatted, e.g. `Date: 18/10/2026`
    pub date_line: String,
    pub references: References,
    pub logo: Option<Arc<RgbaImage>>,
}

#[derive(Debug, Clone)]
pub struct NoticeLayout {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<PaintCommand>,
    pub header_band: Rect,
    /// Where the logo, or the placeholder box, was placed
    pub logo_slot: Rect,
    pub logo_placeholder: bool,
    /// Bordered resident box, present only when a unit number was given
    pub info_box: Option<Rect>,
    pub content_width: u32,
}

impl NoticeLayout {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(PaintCommand::text)
    }

    /// Text of every line whose origin lies inside `rect`.
    pub fn texts_within(&self, rect: Rect) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                PaintCommand::Text { x, y, text, .. } if rect.contains(*x, *y) => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

struct Composer<'a> {
    page: &'a PageGeometry,
    fonts: &'a FontSet,
    commands: Vec<PaintCommand>,
}

impl<'a> Composer<'a> {
    fn new(page: &'a PageGeometry, fonts: &'a FontSet) -> Self {
        Self {
            page,
            fonts,
            commands: Vec::with_capacity(64),
        }
    }

    fn fill(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn stroke(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::StrokeRect { rect, color });
    }

    fn rule(&mut self, x: i32, y: i32, width: u32, color: Color) {
        self.commands.push(PaintCommand::Rule { x, y, width, color });
    }

    /// Draws one line and returns its height.
    fn text(&mut self, x: i32, y: i32, text: &str, role: FontRole, color: Color) -> i32 {
        self.commands.push(PaintCommand::Text {
            x,
            y,
            text: text.to_string(),
            role,
            color,
        });
        self.fonts.get(role).line_height() as i32
    }

    /// Draws one line flush against the right margin and returns its height.
    fn text_right(&mut self, y: i32, text: &str, role: FontRole, color: Color) -> i32 {
        let w = self.fonts.get(role).text_width(text) as i32;
        let x = self.page.right_edge() - w;
        self.text(x, y, text, role, color)
    }

    /// Draws a block of lines separated by the multi-line spacing.
    fn lines<S: AsRef<str>>(&mut self, x: i32, mut y: i32, lines: &[S], role: FontRole, color: Color) {
        for line in lines {
            let h = self.text(x, y, line.as_ref(), role, color);
            y += h + MULTILINE_SPACING as i32;
        }
    }
}

/// Lay out the full notice.
pub fn layout_notice(page: &PageGeometry, fonts: &FontSet, content: &NoticeContent<'_>) -> NoticeLayout {
    let mut c = Composer::new(page, fonts);
    let org = content.organization;
    let request = content.request;
    let left = page.margin_left as i32;
    let content_width = page.content_width();

    // Header band with logo or placeholder
    let header_band = Rect::new(0, 0, page.width, HEADER_HEIGHT);
    c.fill(header_band, HEADER_FILL);

    let logo = content
        .logo
        .as_ref()
        .filter(|l| l.width() > 0 && l.height() > 0);
    let (logo_slot, logo_placeholder) = match logo {
        Some(logo) => {
            let (w, h) = fit_within(logo.width(), logo.height(), LOGO_MAX_WIDTH, LOGO_MAX_HEIGHT);
            let slot = Rect::new(left, (HEADER_HEIGHT as i32 - h as i32) / 2, w, h);
            c.commands.push(PaintCommand::Image {
                rect: slot,
                image: logo.clone(),
            });
            (slot, false)
        }
        None => {
            let slot = Rect::new(
                left,
                (HEADER_HEIGHT as i32 - LOGO_MAX_HEIGHT as i32) / 2,
                LOGO_MAX_WIDTH,
                LOGO_MAX_HEIGHT,
            );
            c.fill(slot, org.accent);
            c.text(slot.x + 10, slot.y + 10, &org.short_name, FontRole::Subheader, WHITE);
            (slot, true)
        }
    };

    // Letterhead, divider, title
    let mut y = page.margin_top as i32 - 40;
    for line in [&org.name, &org.tagline] {
        let h = c.text_right(y, line, FontRole::Subheader, BLACK);
        y += h + LINE_GAP;
    }

    c.rule(left, HEADER_HEIGHT as i32 + 13, content_width, DIVIDER);

    let title_y = HEADER_HEIGHT as i32 + 80;
    let (title_w, title_h) = fonts.header.text_size(notice::TITLE);
    c.text(
        (page.width as i32 - title_w as i32) / 2,
        title_y,
        notice::TITLE,
        FontRole::Header,
        BLACK,
    );

    // Date and reference, right-aligned
    let content_top = title_y + title_h as i32 + 40;
    c.text_right(content_top, &content.date_line, FontRole::Text, BLACK);
    let ref_y = content_top + fonts.text.line_height() as i32 + 10;
    c.text_right(ref_y, &content.references.header_line(), FontRole::Text, BLACK);

    // Address block
    let mut y = content_top + 53;
    for line in &org.address_lines {
        let h = c.text(left, y, line, FontRole::Text, BLACK);
        y += h + LINE_GAP;
    }
    y += 80;

    // Resident box
    let mut info_box = None;
    if let Some(lines) = notice::resident_info_lines(request, org) {
        let (_, block_h) = fonts.text.block_size(&lines);
        let rect = Rect::new(left, y, content_width, block_h + 26);
        c.fill(rect, BOX_FILL);
        c.stroke(rect, BOX_BORDER);
        c.lines(left + 13, y + 13, &lines, FontRole::Text, BLACK);
        y += rect.height as i32 + 26;
        info_box = Some(rect);
    }

    // Greeting and body
    let h = c.text(left, y, &notice::greeting(request), FontRole::Text, BLACK);
    y += h + 20;
    for line in notice::body_lines(request, org) {
        if line.is_empty() {
            y += PARAGRAPH_GAP;
            continue;
        }
        for wrapped in wrap_text(&fonts.text, &line, content_width) {
            let h = c.text(left, y, &wrapped, FontRole::Text, BLACK);
            y += h + LINE_GAP;
        }
    }

    // Closing and signature
    y += 40;
    c.text(left, y, notice::CLOSING, FontRole::Text, BLACK);
    y += 106;
    c.text(left, y, &org.signature, FontRole::Text, BLACK);
    y += 33;
    c.lines(left, y, &[&org.manager_name, &org.manager_title], FontRole::Small, BLACK);
    log::debug!("Body ends at y={} on a {}px page", y, page.height);

    // Footer
    let footer_y = page.height as i32 - FOOTER_HEIGHT as i32 - page.margin_bottom as i32;
    c.rule(left, footer_y, content_width, DIVIDER);
    let footer_h = fonts.footer.line_height() as i32;
    c.text(
        left,
        footer_y + (FOOTER_HEIGHT as i32 - footer_h) / 2,
        notice::DISCLAIMER,
        FontRole::Footer,
        FOOTER_TEXT,
    );
    c.text_right(
        footer_y + FOOTER_HEIGHT as i32 + 10,
        &content.references.footer,
        FontRole::Footer,
        FOOTER_TEXT,
    );

    // Watermark
    let (mark_w, mark_h) = fonts.subheader.text_size(notice::WATERMARK);
    c.text(
        (page.width as i32 - mark_w as i32) / 2,
        (page.height as i32 - mark_h as i32) / 2,
        notice::WATERMARK,
        FontRole::Subheader,
        WATERMARK_COLOR,
    );

    NoticeLayout {
        width: page.width,
        height: page.height,
        commands: c.commands,
        header_band,
        logo_slot,
        logo_placeholder,
        info_box,
        content_width,
    }
}

/// Greedy word wrap.
///
/// Words are added to the current line while the measured width of the
/// candidate line stays within `max_width`; on overflow the line is flushed
/// and the offending word starts the next one. A word that alone is wider
/// than `max_width` is split between characters.
pub fn wrap_text(font: &NoticeFont, text: &str, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = fit_word(font, word, max_width, &mut lines);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if font.text_width(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = fit_word(font, word, max_width, &mut lines);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// Pushes full-width slices of an over-long word and returns what is left.
fn fit_word(font: &NoticeFont, word: &str, max_width: u32, lines: &mut Vec<String>) -> String {
    if font.text_width(word) <= max_width {
        return word.to_string();
    }
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && font.text_width(&piece) > max_width {
            piece.pop();
            lines.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    piece
}

/// Largest size within `max_width` x `max_height` that keeps the aspect
/// ratio. Images are only ever shrunk.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let ratio = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);
    (
        ((width as f64 * ratio).round() as u32).max(1),
        ((height as f64 * ratio).round() as u32).max(1),
    )
}

/// Scattered light-gray pixels that give the page a printed look.
pub fn paper_texture<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32, count: usize) -> PaintCommand {
    let points = if width == 0 || height == 0 {
        Vec::new()
    } else {
        (0..count)
            .map(|_| (rng.gen_range(0..width), rng.gen_range(0..height)))
            .collect()
    };
    PaintCommand::Speckle {
        points,
        color: NOISE_COLOR,
    }
}
