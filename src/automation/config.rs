//! Timing and calibration settings for the capture loop

use crate::capture::{DEFAULT_WINDOW_TITLES, FALLBACK_SCREEN, ScreenRect};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pixels between each anchor's top-left corner and the usable minimap edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderInsets {
    pub top: u32,
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Default for BorderInsets {
    fn default() -> Self {
        Self {
            top: 5,
            left: 9,
            right: 9,
            bottom: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub insets: BorderInsets,
    /// Minimum confidence for the top-left minimap anchor
    pub top_left_floor: f32,
    /// Minimum confidence for the bottom-right minimap anchor
    pub bottom_right_floor: f32,
    /// Minimum confidence for the player marker inside the minimap
    pub player_floor: f32,
    /// Delay before the next attempt after a failed calibration
    pub retry_delay_ms: u64,
    /// Re-locate the anchors every N calibrated cycles. `None` never re-checks.
    pub revalidate_every: Option<u32>,
    /// Relative aspect ratio change tolerated by re-validation before recalibrating
    pub aspect_tolerance: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            insets: BorderInsets::default(),
            top_left_floor: 0.8,
            bottom_right_floor: 0.8,
            player_floor: 0.8,
            retry_delay_ms: 1000,
            revalidate_every: None,
            aspect_tolerance: 0.05,
        }
    }
}

impl CalibrationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Preset that re-checks the minimap anchors about once a second at full speed
pub fn create_resize_aware_config() -> CalibrationConfig {
    CalibrationConfig {
        revalidate_every: Some(500),
        ..CalibrationConfig::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Game window titles, tried in order (case-insensitive)
    pub window_titles: Vec<String>,
    /// Region captured while no game window is found
    pub fallback_region: ScreenRect,
    /// Pause between two calibrated cycles
    pub cycle_delay_ms: u64,
    /// Pause after a failed capture
    pub capture_retry_ms: u64,
    /// How often the window bounds are re-queried
    pub window_poll_ms: u64,
    /// Command poll interval while paused
    pub idle_poll_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window_titles: DEFAULT_WINDOW_TITLES.iter().map(|t| t.to_string()).collect(),
            fallback_region: FALLBACK_SCREEN,
            cycle_delay_ms: 1,
            capture_retry_ms: 1000,
            window_poll_ms: 5000,
            idle_poll_ms: 100,
        }
    }
}

impl CaptureConfig {
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    pub fn capture_retry(&self) -> Duration {
        Duration::from_millis(self.capture_retry_ms)
    }

    pub fn window_poll(&self) -> Duration {
        Duration::from_millis(self.window_poll_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}
