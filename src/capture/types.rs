use super::error::CaptureResult;
use crate::vision::types::{PixelPoint, PixelRect};
use image::{GrayImage, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Absolute screen position. Negative on monitors left of / above the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in absolute screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }

    pub fn same_size(&self, other: &ScreenRect) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// How frame pixels map onto the screen.
///
/// `origin` is the screen position of the capture's top-left pixel, `offset` is
/// where this frame starts inside that capture and `scale` is the number of
/// physical pixels per screen unit (2.0 on a Retina display).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramePlacement {
    pub origin: ScreenPoint,
    pub offset: PixelPoint,
    pub scale: f64,
}

impl Default for FramePlacement {
    fn default() -> Self {
        Self::unscaled(ScreenPoint::default())
    }
}

impl FramePlacement {
    pub fn new(origin: ScreenPoint, scale: f64) -> Self {
        Self {
            origin,
            offset: PixelPoint::default(),
            scale,
        }
    }

    /// One frame pixel per screen unit
    pub fn unscaled(origin: ScreenPoint) -> Self {
        Self::new(origin, 1.0)
    }

    /// Placement of a sub-image starting `offset` pixels into this one
    pub fn offset_by(&self, offset: PixelPoint) -> Self {
        Self {
            offset: PixelPoint::new(self.offset.x + offset.x, self.offset.y + offset.y),
            ..*self
        }
    }

    /// Unusable scales (zero, negative, NaN) count as 1.0
    fn effective_scale(&self) -> f64 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }

    /// Screen position of a fractional frame position, rounded to the nearest unit
    pub fn position_to_screen(&self, x: f64, y: f64) -> ScreenPoint {
        let scale = self.effective_scale();
        ScreenPoint::new(
            self.origin.x + ((self.offset.x as f64 + x) / scale).round() as i32,
            self.origin.y + ((self.offset.y as f64 + y) / scale).round() as i32,
        )
    }

    pub fn to_screen(&self, point: PixelPoint) -> ScreenPoint {
        self.position_to_screen(point.x as f64, point.y as f64)
    }

    /// Screen length covered by `pixels` frame pixels
    pub fn length_to_screen(&self, pixels: u32) -> u32 {
        (pixels as f64 / self.effective_scale()).round() as u32
    }
}

/// One captured image, tagged with where it sits on screen
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    placement: FramePlacement,
}

impl Frame {
    /// Frame with one pixel per screen unit, its top-left pixel at `origin`
    pub fn new(image: RgbImage, origin: ScreenPoint) -> Self {
        Self::with_placement(image, FramePlacement::unscaled(origin))
    }

    pub fn with_placement(image: RgbImage, placement: FramePlacement) -> Self {
        Self { image, placement }
    }

    /// Drop the alpha channel of a raw capture
    pub fn from_rgba(image: &RgbaImage, placement: FramePlacement) -> Self {
        let rgb = RgbImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            Rgb([r, g, b])
        });
        Self::with_placement(rgb, placement)
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn placement(&self) -> FramePlacement {
        self.placement
    }

    /// Screen position of the top-left pixel
    pub fn origin(&self) -> ScreenPoint {
        self.placement.to_screen(PixelPoint::default())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width(), self.height())
    }

    /// Single-channel luminance copy used for correlation
    pub fn intensity(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }

    /// Sub-frame for `rect`, or `None` if `rect` is empty or not fully inside this frame.
    /// The crop maps to the same screen positions as the pixels it was cut from.
    pub fn crop(&self, rect: PixelRect) -> Option<Frame> {
        if rect.is_empty() || !rect.fits_within(self.width(), self.height()) {
            return None;
        }
        let image = image::imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height).to_image();
        Some(Frame::with_placement(image, self.placement.offset_by(rect.top_left())))
    }

    /// Screen position of a frame pixel
    pub fn to_screen(&self, point: PixelPoint) -> ScreenPoint {
        self.placement.to_screen(point)
    }
}

/// Produces frames for a screen rectangle.
///
/// A failure means "try again shortly"; it is never reported as a black frame.
pub trait FrameSource: Send {
    fn capture(&mut self, region: ScreenRect) -> CaptureResult<Frame>;
}

/// Finds the game window's current screen bounds
pub trait WindowLocator: Send {
    fn find_game_window(&mut self) -> Option<ScreenRect>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn capture(&mut self, region: ScreenRect) -> CaptureResult<Frame> {
        (**self).capture(region)
    }
}

impl<T: WindowLocator + ?Sized> WindowLocator for Box<T> {
    fn find_game_window(&mut self) -> Option<ScreenRect> {
        (**self).find_game_window()
    }
}
