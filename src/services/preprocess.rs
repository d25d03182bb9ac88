use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::error::AnalysisError;

pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Encoded image ready to be sent to the model
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Decode uploaded bytes, guessing the format from the content
pub fn decode_upload(bytes: &[u8]) -> Result<DynamicImage, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyUpload);
    }

    image::load_from_memory(bytes).map_err(|e| AnalysisError::InvalidImage(e.to_string()))
}

/// Target size when the longer edge exceeds `max_dimension`, `None` otherwise.
/// Each edge is scaled by `max_dimension / longer_edge`, floored, at least 1.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let longer = width.max(height);
    if longer <= max_dimension {
        return None;
    }

    let scale = |edge: u32| -> u32 {
        let scaled = u64::from(edge) * u64::from(max_dimension) / u64::from(longer);
        (scaled as u32).max(1)
    };

    Some((scale(width), scale(height)))
}

/// Downsample so the longer edge is at most `max_dimension`, keeping aspect ratio.
/// Images already inside the bound are returned as-is.
pub fn resize_bounded(image: DynamicImage, max_dimension: u32) -> Result<DynamicImage, AnalysisError> {
    if max_dimension == 0 {
        return Err(AnalysisError::ImageProcessing(
            "max dimension must be positive".to_string(),
        ));
    }

    let (width, height) = image.dimensions();
    match bounded_dimensions(width, height, max_dimension) {
        None => Ok(image),
        Some((new_w, new_h)) => {
            log::debug!("📐 Resizing image {}x{} -> {}x{}", width, height, new_w, new_h);
            Ok(image.resize_exact(new_w, new_h, FilterType::Lanczos3))
        }
    }
}

/// JPEG-encode for the model request. JPEG has no alpha, so convert to RGB first.
pub fn encode_jpeg(image: &DynamicImage) -> Result<ImagePayload, AnalysisError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .map_err(|e| AnalysisError::ImageProcessing(e.to_string()))?;

    log::debug!("🖼️ Encoded JPEG payload: {} bytes", bytes.len());

    Ok(ImagePayload {
        bytes,
        mime_type: "image/jpeg",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 120, 40])))
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_within_bound_keeps_dimensions() {
        let resized = resize_bounded(solid(800, 600), 1024).unwrap();
        assert_eq!(resized.dimensions(), (800, 600));

        let exact = resize_bounded(solid(1024, 10), 1024).unwrap();
        assert_eq!(exact.dimensions(), (1024, 10));
    }

    #[test]
    fn test_landscape_halved() {
        let resized = resize_bounded(solid(2000, 1000), 1000).unwrap();
        assert_eq!(resized.dimensions(), (1000, 500));
    }

    #[test]
    fn test_portrait_uses_height_as_longer_edge() {
        let resized = resize_bounded(solid(300, 900), 100).unwrap();
        assert_eq!(resized.dimensions(), (33, 100));
    }

    #[test]
    fn test_thin_strip_keeps_one_pixel() {
        assert_eq!(bounded_dimensions(5000, 2, 1024), Some((1024, 1)));
    }

    #[test]
    fn test_dimensions_floor() {
        // 1024 * 1023 / 3000 = 349.18
        assert_eq!(bounded_dimensions(3000, 1023, 1024), Some((1024, 349)));
        assert_eq!(bounded_dimensions(1024, 1024, 1024), None);
    }

    #[test]
    fn test_zero_bound_is_processing_error() {
        let err = resize_bounded(solid(10, 10), 0).unwrap_err();
        assert!(matches!(err, AnalysisError::ImageProcessing(_)));
    }

    #[test]
    fn test_decode_upload_png() {
        let decoded = decode_upload(&png_bytes(&solid(12, 7))).unwrap();
        assert_eq!(decoded.dimensions(), (12, 7));
    }

    #[test]
    fn test_decode_upload_rejects_garbage() {
        let err = decode_upload(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidImage(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_decode_upload_empty() {
        assert!(matches!(decode_upload(&[]), Err(AnalysisError::EmptyUpload)));
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([0, 255, 0, 128])));
        let payload = encode_jpeg(&rgba).unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        // JPEG SOI marker
        assert_eq!(&payload.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&payload.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
    }
}
