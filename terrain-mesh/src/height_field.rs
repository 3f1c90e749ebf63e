/// Decoded heightmap pixel grid
use crate::error::TerrainError;

/// A 2D grid of 8-bit intensity samples taken from the first colour channel
/// of a decoded image. Immutable once built; a new upload builds a new field.
#[derive(Debug, Clone)]
pub struct HeightField {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl HeightField {
    /// Decode an encoded raster image (PNG, JPEG, ...) into a height field.
    pub fn from_encoded_bytes(bytes: &[u8]) -> Result<Self, TerrainError> {
        let decoded = image::load_from_memory(bytes)?;
        let rgba = decoded.to_rgba8();
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);

        let samples = rgba.pixels().map(|pixel| pixel.0[0]).collect();

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a height field from raw RGBA8 pixel data (4 bytes per pixel).
    pub fn from_rgba8(width: usize, height: usize, data: &[u8]) -> Result<Self, TerrainError> {
        let expected = width * height * 4;
        if data.len() < expected {
            return Err(TerrainError::ImageDecodeFailure {
                reason: format!(
                    "pixel buffer holds {} bytes, {}x{} RGBA needs {}",
                    data.len(),
                    width,
                    height,
                    expected
                ),
            });
        }

        let samples = (0..width * height).map(|i| data[i * 4]).collect();

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Intensity at pixel coordinates, first channel only.
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.width + x]
    }

    /// Reject fields that cannot cover a resolution² sampling grid. Checked
    /// before any vertex is written so a failed bake leaves the mesh intact.
    pub fn ensure_covers(&self, resolution: usize) -> Result<(), TerrainError> {
        if self.width < resolution || self.height < resolution {
            return Err(TerrainError::ImageTooSmall {
                width: self.width,
                height: self.height,
                required: resolution,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_pixels(samples: &[u8]) -> Vec<u8> {
        samples
            .iter()
            .flat_map(|&value| [value, 0, 0, 255])
            .collect()
    }

    #[test]
    fn from_rgba8_reads_first_channel_only() {
        let data = [
            [10u8, 99, 99, 255],
            [20, 99, 99, 255],
            [30, 99, 99, 255],
            [40, 99, 99, 255],
        ]
        .concat();
        let field = HeightField::from_rgba8(2, 2, &data).unwrap();

        assert_eq!(field.sample(0, 0), 10);
        assert_eq!(field.sample(1, 0), 20);
        assert_eq!(field.sample(0, 1), 30);
        assert_eq!(field.sample(1, 1), 40);
    }

    #[test]
    fn from_rgba8_rejects_truncated_buffers() {
        let err = HeightField::from_rgba8(4, 4, &[0u8; 12]).unwrap_err();
        assert!(matches!(err, TerrainError::ImageDecodeFailure { .. }));
    }

    #[test]
    fn ensure_covers_rejects_small_fields() {
        let field = HeightField::from_rgba8(2, 2, &rgba_pixels(&[0, 0, 0, 0])).unwrap();
        let err = field.ensure_covers(4).unwrap_err();
        assert!(matches!(
            err,
            TerrainError::ImageTooSmall {
                width: 2,
                height: 2,
                required: 4
            }
        ));
        assert!(field.ensure_covers(2).is_ok());
    }

    #[test]
    fn from_encoded_bytes_rejects_garbage() {
        let err = HeightField::from_encoded_bytes(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, TerrainError::ImageDecodeFailure { .. }));
    }

    #[test]
    fn from_encoded_bytes_decodes_png() {
        let mut png = Vec::new();
        {
            use image::ImageEncoder;
            let encoder = image::codecs::png::PngEncoder::new(&mut png);
            let pixels = rgba_pixels(&[0, 128, 255, 64]);
            encoder
                .write_image(&pixels, 2, 2, image::ColorType::Rgba8)
                .unwrap();
        }

        let field = HeightField::from_encoded_bytes(&png).unwrap();
        assert_eq!(field.width(), 2);
        assert_eq!(field.sample(1, 0), 128);
        assert_eq!(field.sample(0, 1), 255);
    }
}
