//! Rasterizer: executes paint commands on an RGB canvas and encodes PNG

use std::convert::Infallible;
use std::sync::Arc;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Point, Size};
use embedded_graphics::mono_font::iso_8859_1::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;
use image::imageops::FilterType;
use image::{Rgb, RgbImage, RgbaImage};
use rusttype::{point, Font, Scale};

use crate::fonts::{FontSet, NoticeFont};
use crate::rendering::layout::NoticeLayout;
use crate::rendering::paint::{Color, PaintCommand, Rect, WHITE};
use crate::Result;

/// Paint every command of `layout` onto a fresh white canvas.
pub fn rasterize(layout: &NoticeLayout, fonts: &FontSet) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(layout.width, layout.height, WHITE);
    for cmd in &layout.commands {
        paint(&mut canvas, fonts, cmd);
    }
    canvas
}

pub fn paint(canvas: &mut RgbImage, fonts: &FontSet, cmd: &PaintCommand) {
    match cmd {
        PaintCommand::FillRect { rect, color } => fill_rect(canvas, *rect, *color),
        PaintCommand::StrokeRect { rect, color } => stroke_rect(canvas, *rect, *color),
        PaintCommand::Rule { x, y, width, color } => {
            fill_rect(canvas, Rect::new(*x, *y, *width, 1), *color)
        }
        PaintCommand::Text {
            x,
            y,
            text,
            role,
            color,
        } => draw_text(canvas, fonts.get(*role), *x, *y, text, *color),
        PaintCommand::Image { rect, image } => draw_image(canvas, *rect, image),
        PaintCommand::Speckle { points, color } => {
            for &(x, y) in points {
                if x < canvas.width() && y < canvas.height() {
                    canvas.put_pixel(x, y, *color);
                }
            }
        }
    }
}

fn put_pixel_checked(canvas: &mut RgbImage, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

fn blend_pixel(canvas: &mut RgbImage, x: i32, y: i32, color: Color, alpha: f32) {
    if alpha <= 0.0 || x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let a = alpha.min(1.0);
    let inv = 1.0 - a;
    let dst = canvas.get_pixel_mut(x, y);
    for i in 0..3 {
        dst.0[i] = (color.0[i] as f32 * a + dst.0[i] as f32 * inv).round() as u8;
    }
}

fn fill_rect(canvas: &mut RgbImage, rect: Rect, color: Color) {
    let x0 = rect.x.max(0) as u32;
    let y0 = rect.y.max(0) as u32;
    let x1 = (rect.right().max(0) as u32).min(canvas.width());
    let y1 = (rect.bottom().max(0) as u32).min(canvas.height());
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x, y, color);
        }
    }
}

fn stroke_rect(canvas: &mut RgbImage, rect: Rect, color: Color) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);
    for x in rect.x..=right {
        put_pixel_checked(canvas, x, rect.y, color);
        put_pixel_checked(canvas, x, bottom, color);
    }
    for y in rect.y..=bottom {
        put_pixel_checked(canvas, rect.x, y, color);
        put_pixel_checked(canvas, right, y, color);
    }
}

fn draw_image(canvas: &mut RgbImage, rect: Rect, image: &Arc<RgbaImage>) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let resized;
    let src: &RgbaImage = if image.dimensions() == (rect.width, rect.height) {
        &**image
    } else {
        resized = image::imageops::resize(&**image, rect.width, rect.height, FilterType::Lanczos3);
        &resized
    };
    for (ox, oy, p) in src.enumerate_pixels() {
        let alpha = p.0[3] as f32 / 255.0;
        blend_pixel(
            canvas,
            rect.x + ox as i32,
            rect.y + oy as i32,
            Rgb([p.0[0], p.0[1], p.0[2]]),
            alpha,
        );
    }
}

pub fn draw_text(canvas: &mut RgbImage, font: &NoticeFont, x: i32, y: i32, text: &str, color: Color) {
    match font {
        NoticeFont::Outline { font, px } => draw_outline_text(canvas, font, *px, x, y, text, color),
        NoticeFont::Builtin { scale } => draw_builtin_text(canvas, *scale, x, y, text, color),
    }
}

fn draw_outline_text(
    canvas: &mut RgbImage,
    font: &Font<'static>,
    px: f32,
    x: i32,
    y: i32,
    text: &str,
    color: Color,
) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let origin = point(x as f32, y as f32 + v_metrics.ascent);
    for glyph in font.layout(text, scale, origin) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                blend_pixel(canvas, bb.min.x + gx as i32, bb.min.y + gy as i32, color, coverage);
            });
        }
    }
}

/// Draw target that magnifies every pixel of the bitmap font into a
/// `scale` x `scale` block placed relative to `origin`.
struct ScaledTarget<'a> {
    canvas: &'a mut RgbImage,
    origin: (i32, i32),
    scale: u32,
}

impl OriginDimensions for ScaledTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }
}

impl DrawTarget for ScaledTarget<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        let s = self.scale as i32;
        for embedded_graphics::Pixel(p, color) in pixels {
            let rgb = Rgb([color.r(), color.g(), color.b()]);
            let x0 = self.origin.0 + p.x * s;
            let y0 = self.origin.1 + p.y * s;
            for dy in 0..s {
                for dx in 0..s {
                    put_pixel_checked(self.canvas, x0 + dx, y0 + dy, rgb);
                }
            }
        }
        Ok(())
    }
}

// The bitmap font covers ISO 8859-1 only.
fn builtin_glyphs(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => '\u{b7}',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            other => other,
        })
        .collect()
}

fn draw_builtin_text(canvas: &mut RgbImage, scale: u32, x: i32, y: i32, text: &str, color: Color) {
    let glyphs = builtin_glyphs(text);
    let style = MonoTextStyle::new(&FONT_10X20, Rgb888::new(color.0[0], color.0[1], color.0[2]));
    let mut target = ScaledTarget {
        canvas,
        origin: (x, y),
        scale: scale.max(1),
    };
    let _ = Text::with_baseline(&glyphs, Point::zero(), style, Baseline::Top).draw(&mut target);
}

/// Pixels per metre for a resolution in dots per inch.
pub fn dpi_to_ppm(dpi: u32) -> u32 {
    (dpi as f64 / 0.0254).round() as u32
}

/// Encode as 8-bit RGB PNG carrying `dpi` in the pHYs chunk.
pub fn encode_png(image: &RgbImage, dpi: u32) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = dpi_to_ppm(dpi);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FontProvider, FontRole, FontSizes};
    use crate::rendering::paint::BLACK;

    fn fonts() -> FontSet {
        FontProvider::builtin_only().get_fonts(&FontSizes::default())
    }

    #[test]
    fn fill_is_clipped_to_canvas() {
        let mut canvas = RgbImage::from_pixel(10, 10, WHITE);
        fill_rect(&mut canvas, Rect::new(-5, 8, 20, 10), BLACK);
        assert_eq!(*canvas.get_pixel(0, 9), BLACK);
        assert_eq!(*canvas.get_pixel(9, 8), BLACK);
        assert_eq!(*canvas.get_pixel(0, 7), WHITE);
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut canvas = RgbImage::from_pixel(10, 10, WHITE);
        let red = Rgb([255, 0, 0]);
        stroke_rect(&mut canvas, Rect::new(2, 2, 5, 4), red);
        assert_eq!(*canvas.get_pixel(2, 2), red);
        assert_eq!(*canvas.get_pixel(6, 5), red);
        assert_eq!(*canvas.get_pixel(4, 3), WHITE);
        assert_eq!(*canvas.get_pixel(7, 2), WHITE);
    }

    #[test]
    fn builtin_text_inks_inside_its_box() {
        let mut canvas = RgbImage::from_pixel(200, 60, WHITE);
        let fonts = fonts();
        paint(
            &mut canvas,
            &fonts,
            &PaintCommand::Text {
                x: 10,
                y: 10,
                text: "Hello".into(),
                role: FontRole::Header,
                color: BLACK,
            },
        );
        // Header is scale 2: 5 glyphs of 20x40
        let mut inked = 0;
        for (x, y, p) in canvas.enumerate_pixels() {
            if *p == BLACK {
                inked += 1;
                assert!((10..110).contains(&x) && (10..50).contains(&y));
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn transparent_image_pixels_are_skipped() {
        let mut canvas = RgbImage::from_pixel(4, 4, WHITE);
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([0, 0, 255, 255]));
        draw_image(&mut canvas, Rect::new(1, 1, 2, 2), &Arc::new(img));
        assert_eq!(*canvas.get_pixel(1, 1), Rgb([0, 0, 255]));
        assert_eq!(*canvas.get_pixel(2, 2), WHITE);
    }

    #[test]
    fn png_carries_resolution() {
        let canvas = RgbImage::from_pixel(8, 4, WHITE);
        let bytes = encode_png(&canvas, 300).unwrap();
        assert_eq!(&bytes[0..8], b"\x89PNG\r\n\x1a\n");

        let reader = png::Decoder::new(&bytes[..]).read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (8, 4));
        let dims = info.pixel_dims.expect("pHYs chunk");
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.yppu, 11811);
        assert!(matches!(dims.unit, png::Unit::Meter));
    }

    #[test]
    fn bullets_map_into_latin1() {
        assert_eq!(builtin_glyphs("\u{2022} a"), "\u{b7} a");
    }
}
