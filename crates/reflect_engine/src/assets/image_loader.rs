//! Image loading utilities for texture data
//!
//! PNG decoding into [`Texture2D`] and RGBA8 encoding for screenshots, both
//! through the `image` crate.

use std::path::Path;

use crate::assets::AssetError;
use crate::render::texture::Texture2D;

/// Decoded RGBA8 image
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel data, rows top to bottom
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();
        log::debug!("Loading image from: {:?}", path_ref);

        let bytes = std::fs::read(path_ref)?;
        let image = Self::from_bytes(&bytes)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path_ref.display(), e)))?;

        log::info!("Loaded image {}x{} from {:?}", image.width, image.height, path_ref);
        Ok(image)
    }

    /// Decode an in-memory image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to decode image: {}", e)))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self { data: rgba.into_raw(), width, height })
    }

    /// Convert to a sampled texture
    pub fn into_texture(self) -> Result<Texture2D, AssetError> {
        Texture2D::from_rgba8(self.width, self.height, &self.data).ok_or_else(|| {
            AssetError::InvalidData(format!("{} bytes do not fill {}x{}", self.data.len(), self.width, self.height))
        })
    }
}

/// Write RGBA8 pixels as a PNG
pub fn save_png<P: AsRef<Path>>(path: P, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), AssetError> {
    let path_ref = path.as_ref();
    let buffer = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| AssetError::InvalidData(format!("pixel data does not fill {width}x{height}")))?;
    buffer
        .save_with_format(path_ref, image::ImageFormat::Png)
        .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path_ref.display(), e)))?;
    log::info!("Saved {}x{} image to {:?}", width, height, path_ref);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::texture::colors;

    #[test]
    fn test_png_round_trip_through_disk() {
        let path = std::env::temp_dir().join("reflect_engine_image_test.png");
        let pixels = vec![255, 0, 0, 255, 255, 0, 0, 255];
        save_png(&path, 2, 1, pixels).unwrap();

        let texture = ImageData::from_file(&path).unwrap().into_texture().unwrap();
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.texels()[1], colors::RED);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_undecodable_bytes_are_rejected() {
        assert!(matches!(ImageData::from_bytes(b"not an image"), Err(AssetError::LoadFailed(_))));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        assert!(matches!(save_png("unused.png", 2, 2, vec![0; 4]), Err(AssetError::InvalidData(_))));
        let image = ImageData { data: vec![0; 4], width: 2, height: 2 };
        assert!(image.into_texture().is_err());
    }
}
