//! Conversions between frame pixels, minimap-relative pixels and normalized minimap space.
//!
//! None of these functions clamp. Points more than [`OUT_OF_BOUNDS_TOLERANCE`]
//! pixels outside the minimap are reported as [`CoordinateError::OutOfBounds`].

use super::error::CoordinateError;
use super::types::{NormalizedPoint, PixelPoint, PixelRect};
use crate::capture::{FramePlacement, ScreenPoint};
use serde::{Deserialize, Serialize};

/// Slack, in minimap pixels, accepted on every side of the rectangle
pub const OUT_OF_BOUNDS_TOLERANCE: f64 = 1.0;

/// Offset from the minimap's top-left corner. Negative when left of / above the minimap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x: i64,
    pub y: i64,
}

fn ensure_usable(rect: PixelRect) -> Result<(), CoordinateError> {
    if rect.is_empty() {
        Err(CoordinateError::DegenerateRect {
            width: rect.width,
            height: rect.height,
        })
    } else {
        Ok(())
    }
}

fn within(value: f64, extent: u32) -> bool {
    value >= -OUT_OF_BOUNDS_TOLERANCE && value <= extent as f64 + OUT_OF_BOUNDS_TOLERANCE
}

pub fn to_minimap_relative(absolute: PixelPoint, rect: PixelRect) -> RelativePoint {
    RelativePoint {
        x: absolute.x as i64 - rect.x as i64,
        y: absolute.y as i64 - rect.y as i64,
    }
}

/// Relative pixels to fractions of the minimap size
pub fn to_normalized(relative: RelativePoint, rect: PixelRect) -> Result<NormalizedPoint, CoordinateError> {
    ensure_usable(rect)?;
    let (x, y) = (relative.x as f64, relative.y as f64);
    if !within(x, rect.width) || !within(y, rect.height) {
        return Err(CoordinateError::OutOfBounds {
            x,
            y,
            width: rect.width,
            height: rect.height,
        });
    }
    Ok(NormalizedPoint::new(
        x / rect.width as f64,
        y / rect.height as f64,
    ))
}

/// Frame position of a normalized point, unrounded, after bounds checks
fn frame_position(normalized: NormalizedPoint, rect: PixelRect) -> Result<(f64, f64), CoordinateError> {
    ensure_usable(rect)?;
    let x = normalized.x * rect.width as f64;
    let y = normalized.y * rect.height as f64;
    if !x.is_finite() || !y.is_finite() || !within(x, rect.width) || !within(y, rect.height) {
        return Err(CoordinateError::OutOfBounds {
            x,
            y,
            width: rect.width,
            height: rect.height,
        });
    }
    Ok((rect.x as f64 + x, rect.y as f64 + y))
}

/// Inverse of [`to_normalized`] followed by [`to_minimap_relative`], rounded to the nearest pixel
pub fn to_absolute(normalized: NormalizedPoint, rect: PixelRect) -> Result<PixelPoint, CoordinateError> {
    let (frame_x, frame_y) = frame_position(normalized, rect)?;
    let abs_x = frame_x.round();
    let abs_y = frame_y.round();
    if abs_x < 0.0 || abs_y < 0.0 || abs_x > u32::MAX as f64 || abs_y > u32::MAX as f64 {
        return Err(CoordinateError::OutOfBounds {
            x: frame_x - rect.x as f64,
            y: frame_y - rect.y as f64,
            width: rect.width,
            height: rect.height,
        });
    }
    Ok(PixelPoint::new(abs_x as u32, abs_y as u32))
}

/// Normalized minimap point to a screen position, for clicking.
/// Rounds once, after dividing by the frame's pixel scale.
pub fn to_screen(
    normalized: NormalizedPoint,
    rect: PixelRect,
    placement: FramePlacement,
) -> Result<ScreenPoint, CoordinateError> {
    let (frame_x, frame_y) = frame_position(normalized, rect)?;
    Ok(placement.position_to_screen(frame_x, frame_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAP: PixelRect = PixelRect {
        x: 59,
        y: 55,
        width: 332,
        height: 236,
    };

    #[test]
    fn test_round_trip_within_one_pixel() {
        for &(px, py) in &[(59, 55), (60, 90), (200, 150), (390, 290), (391, 291), (123, 277)] {
            let p = PixelPoint::new(px, py);
            let normalized = to_normalized(to_minimap_relative(p, MINIMAP), MINIMAP).expect("inside minimap");
            let back = to_absolute(normalized, MINIMAP).expect("inside minimap");
            assert!(back.x.abs_diff(p.x) <= 1 && back.y.abs_diff(p.y) <= 1, "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn test_corners_normalize_to_unit_square() {
        let tl = to_normalized(RelativePoint { x: 0, y: 0 }, MINIMAP).expect("corner");
        assert_eq!(tl, NormalizedPoint::new(0.0, 0.0));

        let br = to_normalized(RelativePoint { x: 332, y: 236 }, MINIMAP).expect("corner");
        assert_eq!(br, NormalizedPoint::new(1.0, 1.0));
    }

    #[test]
    fn test_outside_tolerance_is_error_not_clamped() {
        let err = to_normalized(RelativePoint { x: -2, y: 10 }, MINIMAP).unwrap_err();
        assert!(matches!(err, CoordinateError::OutOfBounds { .. }));

        assert!(to_normalized(RelativePoint { x: -1, y: 10 }, MINIMAP).is_ok());
        assert!(to_normalized(RelativePoint { x: 10, y: 238 }, MINIMAP).is_err());
        assert!(to_absolute(NormalizedPoint::new(1.5, 0.5), MINIMAP).is_err());
        assert!(to_absolute(NormalizedPoint::new(f64::NAN, 0.5), MINIMAP).is_err());
    }

    #[test]
    fn test_degenerate_rect_is_rejected() {
        let flat = PixelRect::new(10, 10, 0, 20);
        assert!(matches!(
            to_normalized(RelativePoint { x: 0, y: 0 }, flat),
            Err(CoordinateError::DegenerateRect { .. })
        ));
    }

    #[test]
    fn test_to_screen_applies_frame_origin() {
        let placement = FramePlacement::unscaled(ScreenPoint::new(-1440, 20));
        let point = to_screen(NormalizedPoint::new(0.5, 0.5), MINIMAP, placement).expect("inside minimap");
        assert_eq!(point, ScreenPoint::new(-1440 + 59 + 166, 20 + 55 + 118));
    }

    #[test]
    fn test_to_screen_divides_by_pixel_scale() {
        let placement = FramePlacement::new(ScreenPoint::new(100, 100), 2.0);
        let minimap = PixelRect::new(600, 400, 400, 400);
        let point = to_screen(NormalizedPoint::new(0.5, 0.5), minimap, placement).expect("inside minimap");
        assert_eq!(point, ScreenPoint::new(500, 400));
        assert!(to_screen(NormalizedPoint::new(2.0, 0.5), minimap, placement).is_err());
    }
}
