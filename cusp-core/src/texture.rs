/// Texture images and the texture coordinate transform
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Decoded RGBA8 image, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        if pixels.len() != width as usize * height as usize * 4 {
            return Err(AssetError::Decode(format!(
                "expected {}x{} RGBA pixels, got {} bytes",
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode PNG or JPEG bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AssetError::Decode(e.to_string()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    /// Nearest texel with repeat wrapping; v = 0 is the bottom row
    pub fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        if self.width == 0 || self.height == 0 {
            return [255, 255, 255, 255];
        }
        let x = (u.rem_euclid(1.0) * self.width as f32) as u32;
        let y = ((1.0 - v.rem_euclid(1.0)) * self.height as f32) as u32;
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);

        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Read and decode an image file
pub fn load_texture(path: &Path) -> Result<TextureImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    TextureImage::decode(&bytes)
}

/// Scale about a center point, applied to texture coordinates at draw time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureTransform {
    pub scale: [f64; 2],
    pub center: [f64; 2],
}

impl TextureTransform {
    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        [
            (uv[0] - self.center[0] as f32) * self.scale[0] as f32 + self.center[0] as f32,
            (uv[1] - self.center[1] as f32) * self.scale[1] as f32 + self.center[1] as f32,
        ]
    }
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0],
            center: [0.0, 0.0],
        }
    }
}

/// Progress of the one texture load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureState {
    #[default]
    Pending,
    Loaded,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> TextureImage {
        // 2x2: top row red, green; bottom row blue, white
        let pixels = vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ];
        TextureImage::from_rgba(2, 2, pixels).unwrap()
    }

    #[test]
    fn test_sample_orientation() {
        let texture = checker();
        assert_eq!(texture.sample(0.25, 0.25), [0, 0, 255, 255]);
        assert_eq!(texture.sample(0.75, 0.75), [0, 255, 0, 255]);
        // repeat wrapping
        assert_eq!(texture.sample(1.25, -0.75), [0, 0, 255, 255]);
    }

    #[test]
    fn test_rejects_short_pixel_data() {
        assert!(TextureImage::from_rgba(4, 4, vec![0; 10]).is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            TextureImage::decode(b"not an image"),
            Err(AssetError::Decode(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_texture(Path::new("/nonexistent/moss.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_transform_scales_about_center() {
        let transform = TextureTransform {
            scale: [2.0, 4.0],
            center: [0.5, 0.5],
        };
        assert_eq!(transform.apply([0.5, 0.5]), [0.5, 0.5]);
        assert_eq!(transform.apply([0.75, 0.25]), [1.0, -0.5]);
        assert_eq!(TextureTransform::default().apply([0.3, 0.7]), [0.3, 0.7]);
    }
}
