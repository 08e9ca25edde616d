//! Paint commands produced by layout and consumed by the rasterizer

use std::sync::Arc;

use image::{Rgb, RgbaImage};

use crate::fonts::FontRole;

pub type Color = Rgb<u8>;

pub const BLACK: Color = Rgb([0, 0, 0]);
pub const WHITE: Color = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    /// One pixel outline on the inside edge of `rect`
    StrokeRect {
        rect: Rect,
        color: Color,
    },
    /// One pixel horizontal line
    Rule {
        x: i32,
        y: i32,
        width: u32,
        color: Color,
    },
    /// Single line of text; `(x, y)` is the top-left of the line box
    Text {
        x: i32,
        y: i32,
        text: String,
        role: FontRole,
        color: Color,
    },
    /// Image scaled to `rect` and alpha-composited
    Image {
        rect: Rect,
        image: Arc<RgbaImage>,
    },
    /// Individual pixels set to `color`
    Speckle {
        points: Vec<(u32, u32)>,
        color: Color,
    },
}

impl PaintCommand {
    pub fn text(&self) -> Option<&str> {
        match self {
            PaintCommand::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}
