use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    #[error("invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },
    #[error("invalid Sobel aperture {0} (must be odd and in 3..=7)")]
    InvalidAperture(usize),
    #[error("invalid block size {0} (must be > 0)")]
    InvalidBlockSize(usize),
    #[error("response map is empty")]
    EmptyResponseMap,
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type DetectResult<T> = Result<T, DetectError>;

pub(crate) fn check_aperture(aperture_size: usize) -> DetectResult<()> {
    if aperture_size % 2 == 0 || !(3..=7).contains(&aperture_size) {
        return Err(DetectError::InvalidAperture(aperture_size));
    }
    Ok(())
}

pub(crate) fn check_image(view: &camtrack_core::ImageView<'_>) -> DetectResult<()> {
    if view.is_empty() {
        return Err(DetectError::InvalidImageSize {
            width: view.width(),
            height: view.height(),
        });
    }
    Ok(())
}
