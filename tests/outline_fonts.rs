//! Layout and raster with a real TrueType font. Skipped on machines without
//! one of the candidate fonts installed.

use chrono::NaiveDate;
use rentnotice::fonts::NoticeFont;
use rentnotice::notice;
use rentnotice::rendering::layout::wrap_text;
use rentnotice::rendering::paint::PaintCommand;
use rentnotice::{
    FontProvider, FontSet, FontSizes, NoiseMode, NoticeConfig, NoticeRenderer, NoticeRequest,
    Organization,
};

fn outline_provider() -> FontProvider {
    FontProvider::new(vec!["DejaVuSerif.ttf".into(), "DejaVuSans.ttf".into()])
}

fn outline_fonts() -> Option<FontSet> {
    let set = outline_provider().get_fonts(&FontSizes::default());
    if set.is_builtin() {
        println!("No TrueType font found; skipping.");
        return None;
    }
    Some(set)
}

fn renderer() -> NoticeRenderer {
    NoticeRenderer::new(NoticeConfig {
        fonts: outline_provider(),
        seed: Some(11),
        issue_date: NaiveDate::from_ymd_opt(2026, 2, 1),
        noise: NoiseMode::Never,
        ..NoticeConfig::offline()
    })
}

fn request() -> NoticeRequest {
    NoticeRequest::new("Jane Doe")
        .with_unit("B-204")
        .with_amount("11,500")
        .with_due_date("5th")
}

#[test]
fn wrapped_outline_lines_fit_the_width() {
    let Some(fonts) = outline_fonts() else { return };
    assert!(matches!(fonts.text, NoticeFont::Outline { .. }));

    let org = Organization::default();
    for paragraph in notice::body_lines(&request(), &org) {
        if paragraph.is_empty() {
            continue;
        }
        for width in [2080, 700, 400] {
            let lines = wrap_text(&fonts.text, &paragraph, width);
            for line in &lines {
                assert!(
                    fonts.text.text_width(line) <= width,
                    "{:?} is wider than {}",
                    line,
                    width
                );
            }
            assert_eq!(lines.join(" "), paragraph.split_whitespace().collect::<Vec<_>>().join(" "));
        }
    }
}

#[test]
fn outline_layout_keeps_body_inside_margins() {
    let r = renderer();
    if r.fonts().is_builtin() {
        println!("No TrueType font found; skipping.");
        return;
    }
    let layout = r.layout(&request());
    for cmd in &layout.commands {
        if let PaintCommand::Text { x, text, role, .. } = cmd {
            let right = *x + r.fonts().get(*role).text_width(text) as i32;
            assert!(*x >= 0, "{:?} starts at {}", text, x);
            assert!(right <= 2280, "{:?} ends at {}", text, right);
        }
    }
}

#[test]
fn outline_text_inks_inside_the_resident_box() {
    let r = renderer();
    if r.fonts().is_builtin() {
        println!("No TrueType font found; skipping.");
        return;
    }
    let req = request();
    let rect = r.layout(&req).info_box.expect("info box");
    let notice = r.render(&req);

    let dark = |p: &image::Rgb<u8>| p.0.iter().all(|&c| c < 128);
    let mut inked = 0;
    for y in rect.y + 1..rect.bottom() - 1 {
        for x in rect.x + 1..rect.right() - 1 {
            if dark(notice.image.get_pixel(x as u32, y as u32)) {
                inked += 1;
            }
        }
    }
    assert!(inked > 100, "only {} dark pixels in the resident box", inked);

    // Nothing dark past the right margin between the box and the footer rule
    for y in rect.y as u32..3202 {
        for x in 2284..notice.width() {
            assert!(!dark(notice.image.get_pixel(x, y)), "ink at ({}, {})", x, y);
        }
    }
}
