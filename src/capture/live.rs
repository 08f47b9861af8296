//! Live screen capture through `xcap`

use super::error::{CaptureError, CaptureResult};
use super::types::{Frame, FramePlacement, FrameSource, ScreenPoint, ScreenRect, WindowLocator};
use super::window::best_window;
use image::RgbaImage;
use log::{debug, warn};
use xcap::{Monitor, Window};

fn failed(context: &str, err: impl std::fmt::Display) -> CaptureError {
    CaptureError::CaptureFailed {
        description: format!("{context}: {err}"),
    }
}

/// Logical bounds of a monitor
fn monitor_bounds(monitor: &Monitor) -> CaptureResult<ScreenRect> {
    Ok(ScreenRect::new(
        monitor.x().map_err(|e| failed("monitor x", e))?,
        monitor.y().map_err(|e| failed("monitor y", e))?,
        monitor.width().map_err(|e| failed("monitor width", e))?,
        monitor.height().map_err(|e| failed("monitor height", e))?,
    ))
}

fn contains(bounds: &ScreenRect, x: i32, y: i32) -> bool {
    x >= bounds.x
        && y >= bounds.y
        && (x as i64) < bounds.x as i64 + bounds.width as i64
        && (y as i64) < bounds.y as i64 + bounds.height as i64
}

/// Captures the monitor that contains the region's top-left corner and crops to the region.
///
/// On scaled (HiDPI) displays the crop is taken in physical pixels, so the frame
/// can be larger than the logical region it covers; its placement carries the scale.
#[derive(Debug, Default)]
pub struct ScreenSource;

impl ScreenSource {
    pub fn new() -> Self {
        Self
    }
}

impl FrameSource for ScreenSource {
    fn capture(&mut self, region: ScreenRect) -> CaptureResult<Frame> {
        let monitors = Monitor::all().map_err(|e| failed("enumerate monitors", e))?;
        let mut chosen = None;
        for monitor in monitors {
            let bounds = monitor_bounds(&monitor)?;
            if contains(&bounds, region.x, region.y) {
                chosen = Some((monitor, bounds));
                break;
            }
        }
        let (monitor, bounds) = chosen.ok_or(CaptureError::NoMonitor {
            x: region.x,
            y: region.y,
        })?;

        let raw = monitor.capture_image().map_err(|e| failed("capture monitor", e))?;
        let (width, height) = (raw.width(), raw.height());
        let screen = RgbaImage::from_raw(width, height, raw.into_raw()).ok_or_else(|| {
            failed("capture monitor", "pixel buffer does not match its dimensions")
        })?;

        let scale = if bounds.width == 0 {
            1.0
        } else {
            width as f64 / bounds.width as f64
        };
        let left = ((region.x - bounds.x) as f64 * scale).round().max(0.0) as u32;
        let top = ((region.y - bounds.y) as f64 * scale).round().max(0.0) as u32;
        let crop_width = ((region.width as f64 * scale).round() as u32).min(width.saturating_sub(left));
        let crop_height = ((region.height as f64 * scale).round() as u32).min(height.saturating_sub(top));
        if crop_width == 0 || crop_height == 0 {
            return Err(CaptureError::RegionOutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            });
        }

        let cropped = image::imageops::crop_imm(&screen, left, top, crop_width, crop_height).to_image();
        debug!(
            "📸 Captured {}x{} at ({}, {}) scale {:.2}",
            crop_width, crop_height, region.x, region.y, scale
        );
        let placement = FramePlacement::new(ScreenPoint::new(region.x, region.y), scale);
        Ok(Frame::from_rgba(&cropped, placement))
    }
}

/// Finds the game window by title, ignoring minimized windows
#[derive(Debug, Clone)]
pub struct TitleWindowLocator {
    titles: Vec<String>,
}

impl TitleWindowLocator {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }
}

impl WindowLocator for TitleWindowLocator {
    fn find_game_window(&mut self) -> Option<ScreenRect> {
        let windows = match Window::all() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("⚠️ Failed to enumerate windows: {}", e);
                return None;
            }
        };

        let candidates = windows.into_iter().filter_map(|window| {
            if window.is_minimized().unwrap_or(false) {
                return None;
            }
            let title = window.title().ok()?;
            let bounds = ScreenRect::new(
                window.x().ok()?,
                window.y().ok()?,
                window.width().ok()?,
                window.height().ok()?,
            );
            Some((title, bounds))
        });
        best_window(candidates, &self.titles)
    }
}
