use thiserror::Error;

/// Failures local to a single bake or export. None of these corrupt the
/// grid's existing state; callers keep rendering the previous mesh.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// The heightmap bytes could not be decoded into pixel data.
    #[error("heightmap image could not be decoded: {reason}")]
    ImageDecodeFailure { reason: String },

    /// The decoded image does not cover the sampling grid.
    #[error(
        "heightmap is {width}x{height} but the sampling grid needs at least {required}x{required} pixels"
    )]
    ImageTooSmall {
        width: usize,
        height: usize,
        required: usize,
    },

    /// Geometry or texture data could not be encoded into the export format.
    #[error("export serialisation failed: {reason}")]
    ExportSerializationFailure { reason: String },
}

impl From<image::ImageError> for TerrainError {
    fn from(err: image::ImageError) -> Self {
        TerrainError::ImageDecodeFailure {
            reason: err.to_string(),
        }
    }
}
