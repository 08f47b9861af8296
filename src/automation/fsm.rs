// Capture loop: capture -> calibrate/track -> match -> publish, one frame at a time
use super::calibrator::{CycleOutcome, MinimapCalibrator};
use super::config::CaptureConfig;
use super::snapshot::{Snapshot, SnapshotPublisher, SnapshotReader, snapshot_channel};
use super::types::{AutomationCommand, AutomationEvent, LoopState};
use crate::capture::{FrameSource, ScreenRect, WindowLocator};
use crate::vision::library::TemplateLibrary;
use crate::vision::matcher::TemplateMatcher;
use log::{debug, error, info, warn};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::time::{Instant, sleep};

/// Template library shared between the loop and whoever edits templates
pub type SharedLibrary = Arc<RwLock<TemplateLibrary>>;

pub struct CaptureLoop<S, W> {
    state: LoopState,
    source: S,
    window: W,
    config: CaptureConfig,
    calibrator: MinimapCalibrator,
    matcher: TemplateMatcher,
    library: SharedLibrary,
    command_rx: mpsc::Receiver<AutomationCommand>,
    event_tx: mpsc::Sender<AutomationEvent>,
    publisher: SnapshotPublisher,
    region: Option<ScreenRect>,
    last_window_poll: Option<Instant>,
    sequence: u64,
}

impl<S: FrameSource, W: WindowLocator> CaptureLoop<S, W> {
    /// Build a loop and the reader for its snapshots. Nothing runs until [`Self::run`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: S,
        window: W,
        config: CaptureConfig,
        calibrator: MinimapCalibrator,
        matcher: TemplateMatcher,
        library: SharedLibrary,
        command_rx: mpsc::Receiver<AutomationCommand>,
        event_tx: mpsc::Sender<AutomationEvent>,
    ) -> (Self, SnapshotReader) {
        let (publisher, reader) = snapshot_channel();
        let capture_loop = Self {
            state: LoopState::Running,
            source,
            window,
            config,
            calibrator,
            matcher,
            library,
            command_rx,
            event_tx,
            publisher,
            region: None,
            last_window_poll: None,
            sequence: 0,
        };
        (capture_loop, reader)
    }

    /// Run until `Stop` or until every command sender is dropped.
    /// Consumes the loop so the frame source is released when this returns.
    pub async fn run(mut self) {
        info!("🎮 Capture loop started");
        self.emit(AutomationEvent::StateChanged(LoopState::Running));

        while self.state != LoopState::Stopped {
            self.drain_commands();
            match self.state {
                LoopState::Running => {
                    let delay = self.run_cycle();
                    self.wait(delay).await;
                }
                LoopState::Paused => {
                    let idle = self.config.idle_poll();
                    self.wait(idle).await;
                }
                LoopState::Stopped => {}
            }
        }

        info!("⏹️ Capture loop stopped after {} frames", self.sequence);
    }

    /// Sleep for `delay`, waking early for a command
    async fn wait(&mut self, delay: Duration) {
        tokio::select! {
            _ = sleep(delay) => {}
            command = self.command_rx.recv() => match command {
                Some(command) => self.process_command(command),
                None => self.change_state(LoopState::Stopped),
            },
        }
    }

    fn drain_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.process_command(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Command channel closed");
                    self.change_state(LoopState::Stopped);
                    break;
                }
            }
        }
    }

    fn process_command(&mut self, command: AutomationCommand) {
        debug!("Command: {:?}", command);
        match command {
            AutomationCommand::Pause => {
                if self.state == LoopState::Running {
                    self.change_state(LoopState::Paused);
                }
            }
            AutomationCommand::Resume => {
                if self.state == LoopState::Paused {
                    self.change_state(LoopState::Running);
                }
            }
            AutomationCommand::Stop => self.change_state(LoopState::Stopped),
            AutomationCommand::Recalibrate => {
                self.calibrator.invalidate();
                self.emit(AutomationEvent::CalibrationChanged(self.calibrator.state()));
            }
            AutomationCommand::RescanTemplates => {
                let result = self
                    .library
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .reload();
                match result {
                    Ok(count) => self.emit(AutomationEvent::TemplatesReloaded(count)),
                    Err(e) => {
                        error!("❌ Template rescan failed: {}", e);
                        self.emit(AutomationEvent::Error(e.to_string()));
                    }
                }
            }
            AutomationCommand::UpdateCategories(categories) => {
                info!("🔍 Matching categories: {:?}", categories);
                self.matcher.set_categories(categories);
            }
        }
    }

    fn change_state(&mut self, new_state: LoopState) {
        if self.state != new_state {
            info!("🔄 Capture loop {:?} -> {:?}", self.state, new_state);
            self.state = new_state;
            self.emit(AutomationEvent::StateChanged(new_state));
        }
    }

    /// Events are advisory; a full or closed event channel never stalls the loop
    fn emit(&self, event: AutomationEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => debug!("Event channel full, dropped {:?}", event),
        }
    }

    /// Re-query the game window when the poll interval has passed.
    /// A size change invalidates the calibration; a pure move does not.
    fn refresh_window(&mut self) -> ScreenRect {
        let due = match (self.region, self.last_window_poll) {
            (Some(_), Some(last)) => last.elapsed() >= self.config.window_poll(),
            _ => true,
        };

        if due {
            self.last_window_poll = Some(Instant::now());
            let found = self.window.find_game_window();
            let bounds = found.unwrap_or(self.config.fallback_region);
            if found.is_none() && self.region.is_none() {
                warn!("⚠️ Game window not found, capturing {:?}", bounds);
            }

            match self.region {
                Some(previous) if previous.same_size(&bounds) => {
                    if previous != bounds {
                        debug!("Game window moved to ({}, {})", bounds.x, bounds.y);
                    }
                }
                Some(_) => {
                    info!("🪟 Game window resized to {}x{}", bounds.width, bounds.height);
                    self.calibrator.invalidate();
                    self.emit(AutomationEvent::WindowChanged {
                        width: bounds.width,
                        height: bounds.height,
                    });
                }
                None => {}
            }
            self.region = Some(bounds);
        }

        self.region.unwrap_or(self.config.fallback_region)
    }

    /// One full pass over a single frame. Returns the delay before the next one.
    fn run_cycle(&mut self) -> Duration {
        let region = self.refresh_window();
        let frame = match self.source.capture(region) {
            Ok(frame) => frame,
            Err(e) if e.is_transient() => {
                warn!(
                    "📸 Capture failed: {}; retrying in {:?}",
                    e,
                    self.config.capture_retry()
                );
                self.emit(AutomationEvent::Error(e.to_string()));
                return self.config.capture_retry();
            }
            Err(e) => {
                // retrying cannot help; wait for a Resume once the setup is fixed
                error!("❌ Capture failed: {}; pausing", e);
                self.emit(AutomationEvent::Error(e.to_string()));
                self.change_state(LoopState::Paused);
                return self.config.idle_poll();
            }
        };

        self.sequence += 1;
        let sequence = self.sequence;
        let previous = self.calibrator.state();
        let outcome = self.calibrator.process(&frame, sequence);
        if self.calibrator.state() != previous {
            self.emit(AutomationEvent::CalibrationChanged(self.calibrator.state()));
        }

        let matches = {
            let library = self.library.read().unwrap_or_else(PoisonError::into_inner);
            self.matcher.match_all(&library, Some(&frame))
        };

        let (minimap, delay) = match outcome {
            CycleOutcome::Tracking { minimap, .. } => {
                (Some(Arc::new(minimap.into_image())), self.config.cycle_delay())
            }
            CycleOutcome::Uncalibrated => (None, self.calibrator.config().retry_delay()),
        };

        debug!(
            "Frame {}: {:?}, player {:?}, {} matches",
            sequence,
            self.calibrator.state(),
            self.calibrator.player().map(|p| p.position),
            matches.len()
        );

        self.publisher.publish(Snapshot {
            sequence,
            state: self.calibrator.state(),
            calibration: self.calibrator.calibration().cloned(),
            minimap,
            player: self.calibrator.player(),
            matches,
            frame_placement: frame.placement(),
        });
        delay
    }
}
