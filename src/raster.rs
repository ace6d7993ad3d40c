//! Image codec collaborator
//!
//! Bridges raw bytes and pixel buffers via the `image` crate: decoding
//! whatever format the user selected, re-encoding to the canonical
//! raster format (PNG) used as encryption plaintext, and composing a
//! fitted frame with transparent letterbox margins for display.

use crate::error::{ErrorCategory, ErrorKind, Result, ShadeboxError};
use crate::viewport::ViewportGeometry;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// An in-memory decoded image. Owned exclusively by whichever caller
/// decoded it and replaced wholesale on each navigation step.
#[derive(Debug)]
pub struct DecodedImage {
    image: DynamicImage,
    width: u32,
    height: u32,
    has_alpha: bool,
}

impl DecodedImage {
    pub fn new(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let has_alpha = image.color().has_alpha();
        Self {
            image,
            width,
            height,
            has_alpha,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel format carries an alpha channel. The composed
    /// frame pads with transparent margins, so callers that blit it need
    /// to know whether transparency survives.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Decodes raw bytes into a pixel buffer.
///
/// Fails with `UnsupportedImageFormat` when the bytes are not a decodable
/// image in any supported format.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    let image = image::load_from_memory(bytes).map_err(|e| {
        ShadeboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::UnsupportedImageFormat,
            format!("failed to decode image: {}", e),
            e,
        )
    })?;
    Ok(DecodedImage::new(image))
}

/// Re-encodes a pixel buffer to the canonical raster format (PNG).
///
/// Every container holds canonical bytes, so decryption always yields a
/// self-describing image regardless of the original source format.
pub fn encode_canonical(decoded: &DecodedImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    decoded
        .image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| {
            ShadeboxError::with_source(
                ErrorCategory::Internal,
                format!("failed to encode canonical PNG: {}", e),
                e,
            )
        })?;
    Ok(buf.into_inner())
}

/// Composes the displayable frame for a fitted image: the pixels scaled
/// to the geometry's size, centered on a transparent RGBA canvas that
/// includes the letterbox/pillarbox margins.
pub fn compose(decoded: &DecodedImage, geometry: &ViewportGeometry) -> RgbaImage {
    let scaled = decoded
        .image
        .thumbnail_exact(geometry.width, geometry.height)
        .to_rgba8();
    let canvas_width = geometry.width + 2 * geometry.margin_horizontal;
    let canvas_height = geometry.height + 2 * geometry.margin_vertical;
    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([0, 0, 0, 0]));
    image::imageops::overlay(
        &mut canvas,
        &scaled,
        i64::from(geometry.margin_horizontal),
        i64::from(geometry.margin_vertical),
    );
    canvas
}
