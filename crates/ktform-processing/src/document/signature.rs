//! Signature bitmap decoding.

use crate::encoding::decode_data_url;

use super::RenderError;

/// 8-bit RGB raster, already flattened onto a white background.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgb.len())
            .finish()
    }
}

/// Decode a signature data URL into an opaque RGB raster.
///
/// Drawing surfaces export transparent PNGs; transparent pixels become white so the
/// stroke stays visible on paper.
pub fn decode_signature(data_url: &str) -> Result<RasterImage, RenderError> {
    let bytes = decode_data_url(data_url).map_err(|e| RenderError::Signature(e.to_string()))?;
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| RenderError::Signature(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::Signature("empty image".to_string()));
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        for channel in [r, g, b] {
            let blended = (channel as u16 * alpha + 255 * (255 - alpha)) / 255;
            rgb.push(blended as u8);
        }
    }

    Ok(RasterImage { width, height, rgb })
}
