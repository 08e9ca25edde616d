//! Rendering pipeline: layout → paint commands → raster → PNG

pub mod layout;
pub mod paint;
pub mod raster;

use std::path::Path;

use image::RgbImage;
use sha2::{Digest, Sha256};

use crate::Result;

/// A4 at 300 DPI.
pub const A4_WIDTH: u32 = 2480;
pub const A4_HEIGHT: u32 = 3508;
pub const DEFAULT_DPI: u32 = 300;

/// A rendered notice held in memory.
#[derive(Debug, Clone)]
pub struct RenderedNotice {
    pub image: RgbImage,
    pub dpi: u32,
}

impl RenderedNotice {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// PNG bytes with the resolution recorded in the pHYs chunk.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        raster::encode_png(&self.image, self.dpi)
    }

    /// Write the PNG to `path`, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.encode_png()?)?;
        Ok(())
    }

    /// Hex SHA-256 over the dimensions and raw pixels.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.image.width().to_be_bytes());
        hasher.update(self.image.height().to_be_bytes());
        hasher.update(self.image.as_raw());
        hex::encode(hasher.finalize())
    }
}
