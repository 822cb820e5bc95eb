//! Async driver that runs a [`LoaderSequencer`] against real timers.
//!
//! One task owns the sequencer and `select!`s over its next deadline (or the
//! next animation frame while typing), the readiness latch, and commands from
//! the host page. Dropping the `run()` future cancels every pending sleep.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::model::{LoaderEvent, LoaderSnapshot, LoaderState};
use super::sequencer::LoaderSequencer;
use super::storage::IntroStorage;

/// Frame interval used to sample the typing animation (~60 Hz).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Host page → loader commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderCommand {
    /// Skip straight to the exit.
    TriggerExit,
    /// The exit transition finished playing.
    TransitionEnd,
    /// Tear the loader down before it finishes.
    Unmount,
}

/// How a driver run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderOutcome {
    /// Reached `Done`.
    Finished { elapsed: Duration },
    /// Unmounted first; the finish callback was not called.
    Unmounted { state: LoaderState },
}

/// Host-side handle to a running driver.
#[derive(Debug)]
pub struct LoaderHandle {
    commands: mpsc::UnboundedSender<LoaderCommand>,
    snapshots: watch::Receiver<LoaderSnapshot>,
    events: mpsc::UnboundedReceiver<LoaderEvent>,
}

impl LoaderHandle {
    /// Returns false if the driver is gone.
    pub fn trigger_exit(&self) -> bool {
        self.commands.send(LoaderCommand::TriggerExit).is_ok()
    }

    pub fn transition_end(&self) -> bool {
        self.commands.send(LoaderCommand::TransitionEnd).is_ok()
    }

    pub fn unmount(&self) -> bool {
        self.commands.send(LoaderCommand::Unmount).is_ok()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> LoaderSnapshot {
        *self.snapshots.borrow()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot> {
        self.snapshots.clone()
    }

    /// Next loader event, or `None` once the driver has stopped.
    pub async fn next_event(&mut self) -> Option<LoaderEvent> {
        self.events.recv().await
    }
}

/// Owns a sequencer and feeds it time, readiness and host commands.
pub struct LoaderDriver<S: IntroStorage> {
    sequencer: LoaderSequencer<S>,
    commands: mpsc::UnboundedReceiver<LoaderCommand>,
    snapshots: watch::Sender<LoaderSnapshot>,
    events: mpsc::UnboundedSender<LoaderEvent>,
}

impl<S: IntroStorage> LoaderDriver<S> {
    /// Wraps a freshly mounted sequencer.
    pub fn new(sequencer: LoaderSequencer<S>) -> (Self, LoaderHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(sequencer.snapshot());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let driver = Self {
            sequencer,
            commands: command_rx,
            snapshots: snapshot_tx,
            events: event_tx,
        };
        let handle = LoaderHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_rx,
        };
        (driver, handle)
    }

    /// Runs until `Done` or an unmount command.
    pub async fn run(mut self) -> LoaderOutcome {
        let start = Instant::now();
        let readiness = self.sequencer.readiness().clone();
        let mut ready_seen = readiness.is_ready();
        let mut commands_open = true;

        self.sequencer.advance(Duration::ZERO);

        loop {
            self.publish();
            if self.sequencer.state() == LoaderState::Done {
                return LoaderOutcome::Finished {
                    elapsed: self.sequencer.now(),
                };
            }

            let frame = self
                .sequencer
                .is_typing()
                .then(|| self.sequencer.now() + FRAME_INTERVAL);
            let wake = [self.sequencer.next_deadline(), frame]
                .into_iter()
                .flatten()
                .min();
            let deadline = start + wake.unwrap_or_default();

            tokio::select! {
                _ = sleep_until(deadline), if wake.is_some() => {
                    self.sequencer.advance(start.elapsed());
                }
                _ = readiness.wait(), if !ready_seen => {
                    ready_seen = true;
                    self.sequencer.notify_ready(start.elapsed());
                }
                command = self.commands.recv(), if commands_open => match command {
                    Some(LoaderCommand::TriggerExit) => {
                        self.sequencer.trigger_exit(start.elapsed());
                    }
                    Some(LoaderCommand::TransitionEnd) => {
                        self.sequencer.transition_end(start.elapsed());
                    }
                    Some(LoaderCommand::Unmount) => return self.unmount(),
                    None => commands_open = false,
                },
                else => return self.unmount(),
            }
        }
    }

    fn unmount(mut self) -> LoaderOutcome {
        let state = self.sequencer.state();
        self.sequencer.unmount();
        self.publish();
        debug!(%state, "loader driver stopped before finishing");
        LoaderOutcome::Unmounted { state }
    }

    fn publish(&mut self) {
        for event in self.sequencer.take_events() {
            // Receiver dropped means nobody is rendering; keep running.
            let _ = self.events.send(event);
        }
        self.snapshots.send_replace(self.sequencer.snapshot());
    }
}

// =============================================================================
// TESTS
// =============================================================================
