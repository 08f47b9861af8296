//! Minimap calibration and player tracking.
//!
//! Two anchor templates mark the minimap's top-left and bottom-right corners.
//! Once both are found the minimap rectangle is fixed and every later frame is
//! only cropped to it and searched for the player marker. The anchors are not
//! checked again unless re-validation is configured.

use super::config::CalibrationConfig;
use super::error::CalibrationError;
use crate::capture::Frame;
use crate::vision::anchor::locate;
use crate::vision::coords::{to_minimap_relative, to_normalized};
use crate::vision::types::{NormalizedPoint, PixelPoint, PixelRect};
use image::{GrayImage, RgbImage};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

/// Reference images used for calibration and tracking, as intensity images
#[derive(Debug, Clone)]
pub struct AnchorSet {
    top_left: GrayImage,
    bottom_right: GrayImage,
    player: GrayImage,
}

impl AnchorSet {
    pub const TOP_LEFT_FILE: &'static str = "minimap_tl.png";
    pub const BOTTOM_RIGHT_FILE: &'static str = "minimap_br.png";
    pub const PLAYER_FILE: &'static str = "player.png";

    pub fn new(top_left: GrayImage, bottom_right: GrayImage, player: GrayImage) -> Result<Self, CalibrationError> {
        for (name, image) in [
            ("top-left", &top_left),
            ("bottom-right", &bottom_right),
            ("player", &player),
        ] {
            if image.width() == 0 || image.height() == 0 {
                return Err(CalibrationError::EmptyAnchor { name });
            }
        }
        Ok(Self {
            top_left,
            bottom_right,
            player,
        })
    }

    pub fn from_rgb(top_left: &RgbImage, bottom_right: &RgbImage, player: &RgbImage) -> Result<Self, CalibrationError> {
        Self::new(
            image::imageops::grayscale(top_left),
            image::imageops::grayscale(bottom_right),
            image::imageops::grayscale(player),
        )
    }

    /// Load the three anchor images from `directory`
    pub fn load(directory: &Path) -> Result<Self, CalibrationError> {
        let read = |file: &str| -> Result<GrayImage, CalibrationError> {
            let path = directory.join(file);
            image::open(&path)
                .map(|image| image.to_luma8())
                .map_err(|source| CalibrationError::AnchorLoad { path, source })
        };
        Self::new(
            read(Self::TOP_LEFT_FILE)?,
            read(Self::BOTTOM_RIGHT_FILE)?,
            read(Self::PLAYER_FILE)?,
        )
    }

    pub fn player_size(&self) -> (u32, u32) {
        self.player.dimensions()
    }
}

/// Calibration progress as seen between frames: only `Uncalibrated` or `Calibrated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CalibrationState {
    #[default]
    Uncalibrated,
    /// Internal: held only while [`MinimapCalibrator::process`] searches for the anchors.
    /// `process` always returns in one of the other two states.
    Calibrating,
    Calibrated,
}

/// Fully calibrated minimap geometry. Only exists while calibrated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimapCalibration {
    /// Top-left corner of the matched top-left anchor
    pub top_left_anchor: PixelPoint,
    /// Top-left corner of the matched bottom-right anchor
    pub bottom_right_anchor: PixelPoint,
    /// Usable minimap area, anchors plus border insets
    pub rect: PixelRect,
    pub aspect_ratio: f64,
    /// Frame sequence number the calibration was taken from
    pub frame_sequence: u64,
}

/// Last known player position, tagged with the frame it was measured in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerFix {
    pub position: NormalizedPoint,
    pub confidence: f32,
    pub frame_sequence: u64,
}

impl PlayerFix {
    /// Frames elapsed since this fix was measured
    pub fn age(&self, current_sequence: u64) -> u64 {
        current_sequence.saturating_sub(self.frame_sequence)
    }
}

/// Result of feeding one frame to the calibrator
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Anchors missing or rectangle unusable; retry after the calibration delay
    Uncalibrated,
    /// Calibrated; carries this frame's minimap crop
    Tracking { minimap: Frame, player_found: bool },
}

pub struct MinimapCalibrator {
    config: CalibrationConfig,
    anchors: AnchorSet,
    state: CalibrationState,
    calibration: Option<MinimapCalibration>,
    player: Option<PlayerFix>,
    minimap_sample: Option<RgbImage>,
    cycles_since_validation: u32,
}

impl MinimapCalibrator {
    pub fn new(config: CalibrationConfig, anchors: AnchorSet) -> Self {
        Self {
            config,
            anchors,
            state: CalibrationState::Uncalibrated,
            calibration: None,
            player: None,
            minimap_sample: None,
            cycles_since_validation: 0,
        }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_calibrated(&self) -> bool {
        self.state == CalibrationState::Calibrated
    }

    pub fn calibration(&self) -> Option<&MinimapCalibration> {
        self.calibration.as_ref()
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.aspect_ratio)
    }

    pub fn player(&self) -> Option<PlayerFix> {
        self.player
    }

    /// Minimap crop taken from the frame that produced the current calibration
    pub fn minimap_sample(&self) -> Option<&RgbImage> {
        self.minimap_sample.as_ref()
    }

    /// Drop the calibration; the next frame starts a fresh anchor search.
    /// The last player fix is kept, its sequence number shows its age.
    pub fn invalidate(&mut self) {
        if self.calibration.take().is_some() {
            info!("🧭 Minimap calibration invalidated");
        }
        self.minimap_sample = None;
        self.cycles_since_validation = 0;
        self.state = CalibrationState::Uncalibrated;
    }

    /// Minimap rectangle for the given anchor positions, or `None` when it is
    /// inverted, empty, or too small to hold the player marker
    pub fn derive_rect(&self, top_left: PixelPoint, bottom_right: PixelPoint) -> Option<PixelRect> {
        let insets = self.config.insets;
        let left = top_left.x as i64 + insets.left as i64;
        let top = top_left.y as i64 + insets.top as i64;
        let right = bottom_right.x as i64 - insets.right as i64;
        let bottom = bottom_right.y as i64 - insets.bottom as i64;

        let width = right - left;
        let height = bottom - top;
        let (marker_width, marker_height) = self.anchors.player_size();
        if width <= 0 || height <= 0 || width < marker_width as i64 || height < marker_height as i64 {
            return None;
        }
        Some(PixelRect::new(left as u32, top as u32, width as u32, height as u32))
    }

    /// Run one cycle: calibrate if needed, then crop and track the player
    pub fn process(&mut self, frame: &Frame, sequence: u64) -> CycleOutcome {
        if self.is_calibrated() {
            if self.revalidation_due() && !self.revalidate(frame, sequence) {
                return CycleOutcome::Uncalibrated;
            }
        } else if !self.calibrate(frame, sequence) {
            return CycleOutcome::Uncalibrated;
        }
        self.track(frame, sequence)
    }

    fn find_anchors(&self, frame: &Frame) -> Option<(PixelPoint, PixelPoint)> {
        let intensity = frame.intensity();
        let top_left = locate(&intensity, &self.anchors.top_left, self.config.top_left_floor);
        let bottom_right = locate(
            &intensity,
            &self.anchors.bottom_right,
            self.config.bottom_right_floor,
        );
        match (top_left, bottom_right) {
            (Some(tl), Some(br)) => {
                debug!(
                    "🎯 Anchors at {:?} ({:.3}) and {:?} ({:.3})",
                    tl.position, tl.confidence, br.position, br.confidence
                );
                Some((tl.position, br.position))
            }
            (tl, br) => {
                debug!(
                    "Anchors missing: top-left {}, bottom-right {}",
                    if tl.is_some() { "found" } else { "not found" },
                    if br.is_some() { "found" } else { "not found" }
                );
                None
            }
        }
    }

    fn calibrate(&mut self, frame: &Frame, sequence: u64) -> bool {
        self.state = CalibrationState::Calibrating;

        let Some((top_left, bottom_right)) = self.find_anchors(frame) else {
            self.state = CalibrationState::Uncalibrated;
            return false;
        };
        let Some(rect) = self.derive_rect(top_left, bottom_right) else {
            warn!(
                "⚠️ Rejected minimap rectangle from anchors {:?} and {:?}",
                top_left, bottom_right
            );
            self.state = CalibrationState::Uncalibrated;
            return false;
        };
        let Some(minimap) = frame.crop(rect) else {
            self.state = CalibrationState::Uncalibrated;
            return false;
        };

        info!(
            "🧭 Minimap calibrated at ({}, {}) {}x{}",
            rect.x, rect.y, rect.width, rect.height
        );
        self.calibration = Some(MinimapCalibration {
            top_left_anchor: top_left,
            bottom_right_anchor: bottom_right,
            rect,
            aspect_ratio: rect.aspect_ratio(),
            frame_sequence: sequence,
        });
        self.minimap_sample = Some(minimap.into_image());
        self.cycles_since_validation = 0;
        self.state = CalibrationState::Calibrated;
        true
    }

    fn revalidation_due(&mut self) -> bool {
        let Some(every) = self.config.revalidate_every else {
            return false;
        };
        self.cycles_since_validation += 1;
        self.cycles_since_validation >= every.max(1)
    }

    /// Re-locate the anchors. A changed aspect ratio or lost anchor drops the
    /// calibration; a moved minimap of the same shape is followed.
    fn revalidate(&mut self, frame: &Frame, sequence: u64) -> bool {
        self.cycles_since_validation = 0;
        let Some(current) = self.calibration.clone() else {
            return false;
        };

        let Some((top_left, bottom_right)) = self.find_anchors(frame) else {
            info!("🧭 Minimap anchors lost");
            self.invalidate();
            return false;
        };
        let Some(rect) = self.derive_rect(top_left, bottom_right) else {
            self.invalidate();
            return false;
        };

        let drift = (rect.aspect_ratio() - current.aspect_ratio).abs() / current.aspect_ratio;
        if drift > self.config.aspect_tolerance {
            info!(
                "🧭 Minimap aspect ratio changed {:.3} -> {:.3}, recalibrating",
                current.aspect_ratio,
                rect.aspect_ratio()
            );
            self.invalidate();
            return false;
        }

        if rect != current.rect {
            debug!("Minimap moved to {:?}", rect);
            self.calibration = Some(MinimapCalibration {
                top_left_anchor: top_left,
                bottom_right_anchor: bottom_right,
                rect,
                aspect_ratio: current.aspect_ratio,
                frame_sequence: sequence,
            });
        }
        true
    }

    fn track(&mut self, frame: &Frame, sequence: u64) -> CycleOutcome {
        let Some(rect) = self.calibration.as_ref().map(|c| c.rect) else {
            return CycleOutcome::Uncalibrated;
        };
        let Some(minimap) = frame.crop(rect) else {
            warn!(
                "⚠️ Frame {}x{} no longer contains the minimap",
                frame.width(),
                frame.height()
            );
            self.invalidate();
            return CycleOutcome::Uncalibrated;
        };

        let found = locate(&minimap.intensity(), &self.anchors.player, self.config.player_floor);
        let player_found = match found {
            Some(marker) => {
                let (marker_width, marker_height) = self.anchors.player_size();
                let center = PixelPoint::new(
                    rect.x + marker.position.x + marker_width / 2,
                    rect.y + marker.position.y + marker_height / 2,
                );
                match to_normalized(to_minimap_relative(center, rect), rect) {
                    Ok(position) => {
                        self.player = Some(PlayerFix {
                            position,
                            confidence: marker.confidence,
                            frame_sequence: sequence,
                        });
                        true
                    }
                    Err(e) => {
                        warn!("⚠️ Player marker outside minimap: {}", e);
                        false
                    }
                }
            }
            None => false,
        };

        CycleOutcome::Tracking {
            minimap,
            player_found,
        }
    }
}
