//! Geometry and detection types shared across the vision pipeline

use crate::capture::{FramePlacement, ScreenRect};
use serde::{Deserialize, Serialize};

/// A pixel position inside a frame (origin top-left, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl PixelPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in frame pixels. `x + width` and `y + height` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn top_left(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    /// Integer center, rounded toward the top-left
    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        (point.x as u64) >= self.x as u64
            && (point.x as u64) < self.right()
            && (point.y as u64) >= self.y as u64
            && (point.y as u64) < self.bottom()
    }

    /// True when the rectangle lies completely inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }

    /// Width / height; 0.0 for a zero-height rectangle
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn intersection_area(&self, other: &PixelRect) -> u64 {
        let left = self.x.max(other.x) as u64;
        let top = self.y.max(other.y) as u64;
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            0
        } else {
            (right - left) * (bottom - top)
        }
    }

    /// Intersection over union, in `[0, 1]`
    pub fn iou(&self, other: &PixelRect) -> f64 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }

    /// Screen rectangle covered by these frame pixels
    pub fn to_screen(&self, placement: FramePlacement) -> ScreenRect {
        let top_left = placement.to_screen(self.top_left());
        ScreenRect::new(
            top_left.x,
            top_left.y,
            placement.length_to_screen(self.width),
            placement.length_to_screen(self.height),
        )
    }
}

/// Position inside the minimap as fractions of its width and height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Best placement of an anchor template
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchorMatch {
    /// Top-left corner of the matched window
    pub position: PixelPoint,
    pub confidence: f32,
}

/// One template detection in a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    /// Template name
    pub name: String,
    pub category: String,
    /// Frame-local bounds, the template's size at the matched offset
    pub bounds: PixelRect,
    pub confidence: f32,
}

impl MatchCandidate {
    pub fn center(&self) -> PixelPoint {
        self.bounds.center()
    }

    pub fn screen_bounds(&self, placement: FramePlacement) -> ScreenRect {
        self.bounds.to_screen(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScreenPoint;

    #[test]
    fn test_screen_bounds_divide_by_scale() {
        let candidate = MatchCandidate {
            name: "bat".into(),
            category: "monster".into(),
            bounds: PixelRect::new(800, 600, 32, 32),
            confidence: 0.9,
        };
        let retina = FramePlacement::new(ScreenPoint::new(100, 100), 2.0);
        assert_eq!(candidate.screen_bounds(retina), ScreenRect::new(500, 400, 16, 16));

        let plain = FramePlacement::unscaled(ScreenPoint::new(100, 100));
        assert_eq!(candidate.screen_bounds(plain), ScreenRect::new(900, 700, 32, 32));
    }

    #[test]
    fn test_iou_of_partial_overlap() {
        let a = PixelRect::new(0, 0, 16, 16);
        let b = PixelRect::new(8, 0, 16, 16);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(a.iou(&PixelRect::new(40, 40, 4, 4)), 0.0);
    }
}
