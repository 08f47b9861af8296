//! Latest pipeline output, published as one immutable value per frame

use super::calibrator::{CalibrationState, MinimapCalibration, PlayerFix};
use crate::capture::FramePlacement;
use crate::vision::types::MatchCandidate;
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything consumers need from one processed frame
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Sequence number of the frame this snapshot was built from; 0 before the first frame
    pub sequence: u64,
    pub state: CalibrationState,
    pub calibration: Option<MinimapCalibration>,
    /// Minimap crop of this frame, present while calibrated
    pub minimap: Option<Arc<RgbImage>>,
    /// Last known player position; compare its sequence with [`Snapshot::sequence`] for staleness
    pub player: Option<PlayerFix>,
    /// Suppressed matches, strongest first, in frame coordinates
    pub matches: Vec<MatchCandidate>,
    /// Where the frame sits on screen, for turning matches into click positions
    pub frame_placement: FramePlacement,
}

impl Snapshot {
    /// True when the player fix was measured in this very frame
    pub fn player_is_fresh(&self) -> bool {
        self.player
            .is_some_and(|fix| fix.frame_sequence == self.sequence)
    }

    /// Matches of one category, strongest first
    pub fn matches_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a MatchCandidate> + 'a {
        self.matches.iter().filter(move |m| m.category == category)
    }
}

/// Write side, owned by the capture loop
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Snapshot>>,
}

/// Read side. Cheap to clone; reading never blocks the publisher.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<Snapshot>>,
}

pub fn snapshot_channel() -> (SnapshotPublisher, SnapshotReader) {
    let (tx, rx) = watch::channel(Arc::new(Snapshot::default()));
    (SnapshotPublisher { tx }, SnapshotReader { rx })
}

impl SnapshotPublisher {
    /// Replace the current snapshot, whether or not anyone is listening
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<Snapshot> {
        self.rx.borrow().clone()
    }

    /// Wait for a snapshot newer than the last one seen. `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
