//! Frame source replaying still images, for offline runs and tests

use super::error::{CaptureError, CaptureResult};
use super::types::{Frame, FrameSource, ScreenPoint, ScreenRect};
use image::RgbImage;
use log::debug;
use std::path::Path;

/// Serves a fixed list of screen images in order, repeating the last one.
///
/// Each image stands for the whole screen with its top-left at (0, 0). A
/// capture returns the part of the requested region that overlaps the image.
#[derive(Debug, Clone)]
pub struct StillImageSource {
    frames: Vec<RgbImage>,
    cursor: usize,
}

impl StillImageSource {
    pub fn new(image: RgbImage) -> Self {
        Self::from_frames(vec![image])
    }

    pub fn from_frames(frames: Vec<RgbImage>) -> Self {
        Self { frames, cursor: 0 }
    }

    pub fn open(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| CaptureError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        debug!("📂 Replaying {:?} ({}x{})", path, image.width(), image.height());
        Ok(Self::new(image))
    }

    /// Screen bounds covered by the image that will be served next
    pub fn screen_bounds(&self) -> Option<ScreenRect> {
        self.current()
            .map(|image| ScreenRect::new(0, 0, image.width(), image.height()))
    }

    fn current(&self) -> Option<&RgbImage> {
        self.frames
            .get(self.cursor.min(self.frames.len().saturating_sub(1)))
    }
}

impl FrameSource for StillImageSource {
    fn capture(&mut self, region: ScreenRect) -> CaptureResult<Frame> {
        let image = self.current().ok_or(CaptureError::Empty)?;

        let left = region.x.max(0) as i64;
        let top = region.y.max(0) as i64;
        let right = (region.x as i64 + region.width as i64).min(image.width() as i64);
        let bottom = (region.y as i64 + region.height as i64).min(image.height() as i64);
        if right <= left || bottom <= top {
            return Err(CaptureError::RegionOutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            });
        }

        let crop = image::imageops::crop_imm(
            image,
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        )
        .to_image();

        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
        }
        Ok(Frame::new(crop, ScreenPoint::new(left as i32, top as i32)))
    }
}
