//! Owned pixel buffer that can leave the thread it was drawn on.
//!
//! Cairo surfaces are not `Send`, so every finished render is copied into a
//! `Bitmap` before it is handed to the compositor or the uploader.

use cairo::{Format, ImageSurface};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use tinydash_types::ImageFormat;

use crate::error::{RenderError, UploadError};

/// ARGB32 pixels in Cairo's native-endian premultiplied layout
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    /// Blank (fully transparent) surface of the given size, ready to draw on
    pub fn new_surface(width: u32, height: u32) -> Result<ImageSurface, cairo::Error> {
        ImageSurface::create(Format::ARgb32, width.max(1) as i32, height.max(1) as i32)
    }

    /// Copy the pixels out of a finished surface.
    ///
    /// Any `Context` drawing on the surface should be dropped first.
    pub fn from_surface(surface: &ImageSurface) -> Result<Self, RenderError> {
        surface.flush();
        let width = surface.width().max(0) as u32;
        let height = surface.height().max(0) as u32;
        let stride = surface.stride().max(0) as usize;
        let mut data = Vec::with_capacity(stride * height as usize);
        surface
            .with_data(|pixels| data.extend_from_slice(pixels))
            .map_err(|e| RenderError::Other(format!("surface data unavailable: {}", e)))?;
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Decode a JPEG or PNG still into premultiplied ARGB32
    pub fn decode(encoded: &[u8]) -> Result<Self, RenderError> {
        let rgba = image::load_from_memory(encoded)
            .map_err(|e| RenderError::Other(format!("undecodable image: {}", e)))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let stride = width as usize * 4;
        let mut data = Vec::with_capacity(stride * height as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let premultiply = |c: u8| (c as u32 * a as u32 + 127) / 255;
            let argb = (a as u32) << 24 | premultiply(r) << 16 | premultiply(g) << 8 | premultiply(b);
            data.extend_from_slice(&argb.to_ne_bytes());
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Container of an encoded still, judged by its magic bytes
    pub fn sniff_format(encoded: &[u8]) -> Option<ImageFormat> {
        match image::guess_format(encoded).ok()? {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            _ => None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// New Cairo surface holding a copy of these pixels
    pub fn to_surface(&self) -> Result<ImageSurface, cairo::Error> {
        ImageSurface::create_for_data(
            self.data.clone(),
            Format::ARgb32,
            self.width as i32,
            self.height as i32,
            self.stride as i32,
        )
    }

    /// Un-premultiplied (r, g, b, a) at a pixel, `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        let bytes: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        let argb = u32::from_ne_bytes(bytes);
        let a = (argb >> 24) as u8;
        let unpremultiply = |c: u32| -> u8 {
            if a == 0 {
                0
            } else {
                ((c & 0xff) * 255 / a as u32).min(255) as u8
            }
        };
        Some((
            unpremultiply(argb >> 16),
            unpremultiply(argb >> 8),
            unpremultiply(argb),
            a,
        ))
    }

    /// Encode as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>, UploadError> {
        let surface = self
            .to_surface()
            .map_err(|e| UploadError::Encode(e.to_string()))?;
        let mut png = Vec::new();
        surface
            .write_to_png(&mut png)
            .map_err(|e| UploadError::Encode(e.to_string()))?;
        Ok(png)
    }

    /// Encode as baseline JPEG, alpha dropped
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, UploadError> {
        let rgb = RgbImage::from_fn(self.width, self.height, |x, y| {
            let (r, g, b, _) = self.pixel(x, y).unwrap_or((0, 0, 0, 0));
            Rgb([r, g, b])
        });
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| UploadError::Encode(e.to_string()))?;
        Ok(jpeg)
    }

    pub fn encode(&self, format: ImageFormat, jpeg_quality: u8) -> Result<Vec<u8>, UploadError> {
        match format {
            ImageFormat::Jpeg => self.encode_jpeg(jpeg_quality),
            ImageFormat::Png => self.encode_png(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(r: f64, g: f64, b: f64) -> Bitmap {
        let surface = Bitmap::new_surface(8, 6).unwrap();
        {
            let cr = cairo::Context::new(&surface).unwrap();
            cr.set_source_rgb(r, g, b);
            cr.paint().unwrap();
        }
        Bitmap::from_surface(&surface).unwrap()
    }

    #[test]
    fn test_pixel_roundtrip_through_surface() {
        let bitmap = filled(1.0, 0.0, 0.0);
        assert_eq!(bitmap.width(), 8);
        assert_eq!(bitmap.height(), 6);
        assert_eq!(bitmap.pixel(3, 2), Some((255, 0, 0, 255)));
        assert_eq!(bitmap.pixel(8, 0), None);

        let copy = Bitmap::from_surface(&bitmap.to_surface().unwrap()).unwrap();
        assert_eq!(copy, bitmap);
    }

    #[test]
    fn test_png_signature() {
        let png = filled(0.0, 0.0, 1.0).encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
        assert_eq!(Bitmap::sniff_format(&png), Some(ImageFormat::Png));
        assert_eq!(Bitmap::decode(&png).unwrap(), filled(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_jpeg_encode_and_decode() {
        let jpeg = filled(1.0, 0.0, 0.0).encode(ImageFormat::Jpeg, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
        assert_eq!(Bitmap::sniff_format(&jpeg), Some(ImageFormat::Jpeg));

        let decoded = Bitmap::decode(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        let (r, g, b, a) = decoded.pixel(4, 3).unwrap();
        assert_eq!(a, 255);
        assert!(r > 230 && g < 30 && b < 30, "got {:?}", (r, g, b));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Bitmap::decode(b"not an image").is_err());
        assert_eq!(Bitmap::sniff_format(b"GIF89a"), None);
    }
}
