//! Input action sequences gated by a shared enable flag.
//!
//! The gate is checked before every step. Releasing a key is never gated, and a
//! cancelled run releases whatever it still holds, so pausing cannot leave a
//! key stuck down.

use super::keys::Key;
use crate::capture::ScreenPoint;
use log::{debug, info};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input backend rejected {action}: {description}")]
    Rejected {
        action: String,
        description: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    KeyDown(Key),
    KeyUp(Key),
    /// Press and release `count` times, holding for `down` and pausing `up` after each release
    Press {
        key: Key,
        count: u32,
        down: Duration,
        up: Duration,
    },
    MoveMouse(ScreenPoint),
    Click {
        at: ScreenPoint,
        button: MouseButton,
    },
    Wait(Duration),
}

impl InputAction {
    /// Single tap with the usual 50 ms hold and 100 ms release
    pub fn tap(key: Key) -> Self {
        InputAction::Press {
            key,
            count: 1,
            down: Duration::from_millis(50),
            up: Duration::from_millis(100),
        }
    }
}

/// Raw event injection, provided by the platform layer
pub trait InputSink: Send {
    fn key_down(&mut self, key: Key) -> Result<(), InputError>;
    fn key_up(&mut self, key: Key) -> Result<(), InputError>;
    fn move_mouse(&mut self, to: ScreenPoint) -> Result<(), InputError>;
    fn click(&mut self, at: ScreenPoint, button: MouseButton) -> Result<(), InputError>;
}

/// Shared on/off switch for input. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct ActionGate {
    enabled: Arc<AtomicBool>,
}

impl ActionGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flip the flag, returning the new value
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }
}

impl Default for ActionGate {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Gate closed; `completed` steps ran before the cancellation
    Cancelled { completed: usize },
}

/// Runs action sequences against a sink, tracking which keys are down
pub struct ActionRunner<K> {
    sink: K,
    gate: ActionGate,
    held: BTreeSet<Key>,
}

impl<K: InputSink> ActionRunner<K> {
    pub fn new(sink: K, gate: ActionGate) -> Self {
        Self {
            sink,
            gate,
            held: BTreeSet::new(),
        }
    }

    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    pub fn held_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.iter().copied()
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    fn press_key(&mut self, key: Key) -> Result<(), InputError> {
        self.sink.key_down(key)?;
        self.held.insert(key);
        Ok(())
    }

    fn release_key(&mut self, key: Key) -> Result<(), InputError> {
        self.sink.key_up(key)?;
        self.held.remove(&key);
        Ok(())
    }

    /// Release every key this runner still holds
    pub fn release_all(&mut self) -> Result<(), InputError> {
        let held: Vec<Key> = self.held.iter().copied().collect();
        for key in held {
            self.release_key(key)?;
        }
        Ok(())
    }

    /// Execute `steps` in order. Keys pressed by a completed sequence stay held.
    pub async fn run(&mut self, steps: &[InputAction]) -> Result<RunOutcome, InputError> {
        for (index, step) in steps.iter().enumerate() {
            if let InputAction::KeyUp(key) = step {
                self.release_key(*key)?;
                continue;
            }

            if !self.gate.is_enabled() {
                info!("⏸️ Input disabled, cancelled after {} of {} steps", index, steps.len());
                self.release_all()?;
                return Ok(RunOutcome::Cancelled { completed: index });
            }

            debug!("Input step: {:?}", step);
            match step {
                InputAction::KeyDown(key) => self.press_key(*key)?,
                InputAction::KeyUp(_) => {}
                InputAction::Press {
                    key,
                    count,
                    down,
                    up,
                } => {
                    for repeat in 0..*count {
                        if repeat > 0 && !self.gate.is_enabled() {
                            break;
                        }
                        self.press_key(*key)?;
                        sleep(*down).await;
                        // the release always completes once the key went down
                        self.release_key(*key)?;
                        sleep(*up).await;
                    }
                }
                InputAction::MoveMouse(to) => self.sink.move_mouse(*to)?,
                InputAction::Click { at, button } => {
                    self.sink.move_mouse(*at)?;
                    sleep(Duration::from_millis(10)).await;
                    self.sink.click(*at, *button)?;
                }
                InputAction::Wait(duration) => sleep(*duration).await,
            }
        }
        Ok(RunOutcome::Completed)
    }
}
