use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

use super::{EncodedImage, ImageFormat, ImageRenderer, Layout, Symbol};
use crate::error::QrTransferError;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Renders a greyscale PNG of the requested width with whole-pixel modules.
pub struct PngRenderer;

impl PngRenderer {
    fn rasterize(symbol: &Symbol, size: u32) -> GrayImage {
        let layout = Layout::fit(symbol, size);
        ImageBuffer::from_fn(layout.canvas, layout.canvas, |x, y| {
            if layout.is_dark_at(symbol, x, y) {
                DARK
            } else {
                LIGHT
            }
        })
    }
}

impl ImageRenderer for PngRenderer {
    fn render(&self, symbol: &Symbol, size: u32) -> Result<EncodedImage, QrTransferError> {
        let image = Self::rasterize(symbol, size);
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(EncodedImage::Png { bytes })
    }

    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }
}
