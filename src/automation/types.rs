// Types and enums for the capture loop
use super::calibrator::CalibrationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutomationCommand {
    Pause,
    Resume,
    Stop,
    RescanTemplates,              // Reload the template directory
    Recalibrate,                  // Drop the minimap calibration and search anchors again
    UpdateCategories(Option<Vec<String>>), // None matches every category
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutomationEvent {
    StateChanged(LoopState),
    CalibrationChanged(CalibrationState),
    TemplatesReloaded(usize),
    WindowChanged { width: u32, height: u32 },
    Error(String),
}
