//! Image encoding: file bytes → MIME type, pixel size and base64 data URL.
//!
//! Chat-completion APIs accept images as base64 data URLs embedded in the
//! JSON request body. The bytes are sent as they are on disk: no re-encoding,
//! so a JPEG stays a JPEG and an SVG stays an SVG.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// MIME type for an image path, from its extension (case-insensitive).
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Pixel dimensions `(width, height)` read from the image header.
///
/// Only the header is decoded; the format is guessed from the bytes rather
/// than trusted from the file extension.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), image::ImageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .into_dimensions()
}

/// Encode raw bytes as a `data:` URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} image → {} bytes base64", mime_type, b64.len());
    format!("data:{mime_type};base64,{b64}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode should succeed");
        buf
    }

    #[test]
    fn mime_types_by_extension() {
        assert_eq!(mime_type_for(Path::new("a/b.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("fig.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("fig.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("fig.svg")), "image/svg+xml");
        assert_eq!(mime_type_for(Path::new("fig.tiff")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn dimensions_from_header() {
        assert_eq!(image_dimensions(&png_bytes(12, 7)).unwrap(), (12, 7));
        assert!(image_dimensions(b"definitely not an image").is_err());
    }

    #[test]
    fn data_url_round_trips() {
        let bytes = png_bytes(2, 2);
        let url = encode_data_url("image/png", &bytes);
        let b64 = url.strip_prefix("data:image/png;base64,").expect("prefix");
        assert_eq!(STANDARD.decode(b64).expect("valid base64"), bytes);
    }
}
