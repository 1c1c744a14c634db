use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use rollcall_core::error::{AttendanceError, Result};
use std::io::Cursor;

/// JPEG produced from a captured frame
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode a frame, apply its EXIF orientation, and re-encode it as JPEG.
///
/// Runs for every frame, including ones that carry no orientation tag.
pub fn normalize_frame(bytes: &[u8], quality: u8) -> Result<NormalizedImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| capture_failed(format!("Failed to read frame: {}", e)))?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| capture_failed(format!("Unsupported frame format: {}", e)))?;

    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let image = DynamicImage::from_decoder(decoder)
        .map_err(|e| capture_failed(format!("Failed to decode frame: {}", e)))?;

    let image = orient(image, orientation);
    encode_jpeg(&image, quality)
}

/// Rotate/flip an image so its pixels are upright
pub fn orient(mut image: DynamicImage, orientation: Orientation) -> DynamicImage {
    if orientation != Orientation::NoTransforms {
        tracing::debug!(?orientation, "Applying frame orientation");
    }
    image.apply_orientation(orientation);
    image
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<NormalizedImage> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| capture_failed(format!("Failed to encode JPEG: {}", e)))?;

    Ok(NormalizedImage {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
    })
}

fn capture_failed(reason: String) -> AttendanceError {
    AttendanceError::CaptureFailed { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png_frame(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, _| Rgb([(x * 40) as u8, 90, 200]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_png_becomes_jpeg() {
        let normalized = normalize_frame(&png_frame(6, 4), 50).unwrap();

        assert_eq!(image::guess_format(&normalized.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((normalized.width, normalized.height), (6, 4));
    }

    #[test]
    fn test_upright_jpeg_is_still_reencoded() {
        let first = normalize_frame(&png_frame(6, 4), 90).unwrap();
        let second = normalize_frame(&first.bytes, 50).unwrap();

        assert_eq!(image::guess_format(&second.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((second.width, second.height), (6, 4));
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(6, 4));
        let rotated = orient(image, Orientation::Rotate90);
        assert_eq!((rotated.width(), rotated.height()), (4, 6));
    }

    #[test]
    fn test_garbage_frame_fails() {
        let err = normalize_frame(b"not an image", 50).unwrap_err();
        assert!(matches!(err, AttendanceError::CaptureFailed { .. }));
    }
}
