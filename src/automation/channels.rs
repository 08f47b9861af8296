// Communication channels for the capture loop
use super::types::{AutomationCommand, AutomationEvent};
use tokio::sync::mpsc;

/// Command and event channels between the capture loop and its controller
pub fn create_automation_channels() -> (
    mpsc::Sender<AutomationCommand>,
    mpsc::Receiver<AutomationCommand>,
    mpsc::Sender<AutomationEvent>,
    mpsc::Receiver<AutomationEvent>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::channel(64);
    (cmd_tx, cmd_rx, event_tx, event_rx)
}
