// Capture loop, minimap calibration and snapshot publishing
pub mod calibrator;
pub mod channels;
pub mod config;
pub mod error;
pub mod fsm;
pub mod snapshot;
pub mod types;

pub use calibrator::{AnchorSet, CalibrationState, CycleOutcome, MinimapCalibration, MinimapCalibrator, PlayerFix};
pub use channels::create_automation_channels;
pub use config::{BorderInsets, CalibrationConfig, CaptureConfig, create_resize_aware_config};
pub use error::CalibrationError;
pub use fsm::{CaptureLoop, SharedLibrary};
pub use snapshot::{Snapshot, SnapshotPublisher, SnapshotReader, snapshot_channel};
pub use types::{AutomationCommand, AutomationEvent, LoopState};
