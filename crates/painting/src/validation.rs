use crate::constants::MAX_CANVAS_SIZE;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Invalid canvas size: {width}x{height} (max {})", MAX_CANVAS_SIZE)]
    InvalidSize { width: u32, height: u32 },
    #[error("Canvas allocation of {pixels} pixels failed")]
    AllocationFailed { pixels: usize },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StrokeError {
    #[error("Invalid stroke radius: {0}")]
    InvalidRadius(f32),
    #[error("Invalid color component: {0}")]
    InvalidColor(f32),
}

/// Check canvas dimensions before allocation
pub fn validate_canvas_size(width: u32, height: u32) -> Result<(), CanvasError> {
    if width == 0 || height == 0 || width > MAX_CANVAS_SIZE || height > MAX_CANVAS_SIZE {
        return Err(CanvasError::InvalidSize { width, height });
    }
    Ok(())
}

/// Validate a world-space paint radius
pub fn validate_radius(radius: f32) -> Result<(), StrokeError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(StrokeError::InvalidRadius(radius));
    }
    Ok(())
}

/// Validate an RGBA color (all channels in 0..=1)
pub fn validate_color(color: [f32; 4]) -> Result<(), StrokeError> {
    for channel in color {
        if !(0.0..=1.0).contains(&channel) {
            return Err(StrokeError::InvalidColor(channel));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_size_bounds() {
        assert!(validate_canvas_size(1024, 1024).is_ok());
        assert!(validate_canvas_size(0, 16).is_err());
        assert!(validate_canvas_size(MAX_CANVAS_SIZE + 1, 16).is_err());
    }

    #[test]
    fn test_radius_rejects_non_positive() {
        assert!(validate_radius(0.06).is_ok());
        assert_eq!(validate_radius(0.0), Err(StrokeError::InvalidRadius(0.0)));
        assert!(validate_radius(-1.0).is_err());
        assert!(validate_radius(f32::NAN).is_err());
    }

    #[test]
    fn test_color_channels_in_unit_range() {
        assert!(validate_color([0.1, 0.6, 1.0, 1.0]).is_ok());
        assert!(validate_color([1.2, 0.0, 0.0, 1.0]).is_err());
        assert_eq!(validate_color([0.0, -0.5, 0.0, 1.0]), Err(StrokeError::InvalidColor(-0.5)));
    }
}
