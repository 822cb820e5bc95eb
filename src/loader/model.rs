//! Data models for the intro loader.
//!
//! Config values serialize in camelCase so the same JSON shape works for the
//! browser host (`timeoutMs`, `minVisibleMs`, ...) and for the terminal demo.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{IntroError, IntroResult};

/// Storage key holding the "seen before" flag.
pub const DEFAULT_STORAGE_KEY: &str = "scpc-intro-seen";

// =============================================================================
// CONFIG
// =============================================================================

/// Typing and minimum-visible durations for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingProfile {
    /// How long the snippet takes to type out.
    pub typing_ms: u64,
    /// Minimum time from mount before the loader may exit.
    pub min_visible_ms: u64,
}

impl TimingProfile {
    /// Creates a profile from typing and minimum-visible durations.
    pub fn new(typing_ms: u64, min_visible_ms: u64) -> Self {
        Self {
            typing_ms,
            min_visible_ms,
        }
    }

    /// Typing duration.
    pub fn typing(&self) -> Duration {
        Duration::from_millis(self.typing_ms)
    }

    /// Minimum visible duration.
    pub fn min_visible(&self) -> Duration {
        Duration::from_millis(self.min_visible_ms)
    }
}

/// Configuration for one sequencer instance.
///
/// Immutable once the sequencer is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SequencerConfig {
    /// Global timeout after which readiness is forced.
    pub timeout_ms: u64,
    /// First-visit minimum visible duration.
    pub min_visible_ms: u64,
    /// First-visit typing duration.
    pub typing_ms: u64,
    /// Profile substituted when the "seen before" flag is present.
    pub returning: TimingProfile,
    /// Pause between typing completion and Holding (cross-fade settle).
    pub holding_pause_ms: u64,
    /// Minimum time content must be visible before exit (flicker guard).
    pub content_visible_min_ms: u64,
    /// Exit-condition poll interval while Holding.
    pub poll_interval_ms: u64,
    /// Upper bound on waiting for the exit transition to end.
    pub exit_fallback_ms: u64,
    /// Key of the "seen before" flag in persistent storage.
    pub storage_key: String,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            min_visible_ms: 4_000,
            typing_ms: 3_500,
            returning: TimingProfile::new(1_500, 2_000),
            holding_pause_ms: 600,
            content_visible_min_ms: 400,
            poll_interval_ms: 100,
            exit_fallback_ms: 500,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl SequencerConfig {
    /// Creates a validated config with default timings for everything but
    /// the timeout and the first-visit minimum visible duration.
    pub fn new(timeout_ms: u64, min_visible_ms: u64) -> IntroResult<Self> {
        let config = Self {
            timeout_ms,
            min_visible_ms,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Builder: Set first-visit typing duration.
    pub fn with_typing_ms(mut self, typing_ms: u64) -> Self {
        self.typing_ms = typing_ms;
        self
    }

    /// Builder: Set the returning-user profile.
    pub fn with_returning(mut self, profile: TimingProfile) -> Self {
        self.returning = profile;
        self
    }

    /// Builder: Set the exit transition fallback.
    pub fn with_exit_fallback_ms(mut self, ms: u64) -> Self {
        self.exit_fallback_ms = ms;
        self
    }

    /// Builder: Set the storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Checks the invariants the sequencer relies on.
    pub fn validate(&self) -> IntroResult<()> {
        if self.timeout_ms == 0 {
            return Err(IntroError::invalid_config("timeoutMs must be greater than 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(IntroError::invalid_config(
                "pollIntervalMs must be greater than 0",
            ));
        }
        if self.storage_key.is_empty() {
            return Err(IntroError::invalid_config("storageKey must not be empty"));
        }
        Ok(())
    }

    /// Profile used for a first visit.
    pub fn first_visit(&self) -> TimingProfile {
        TimingProfile::new(self.typing_ms, self.min_visible_ms)
    }

    /// Profile for a run, given whether the intro was seen before.
    pub fn profile_for(&self, seen_before: bool) -> TimingProfile {
        if seen_before {
            self.returning
        } else {
            self.first_visit()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn holding_pause(&self) -> Duration {
        Duration::from_millis(self.holding_pause_ms)
    }

    pub fn content_visible_min(&self) -> Duration {
        Duration::from_millis(self.content_visible_min_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn exit_fallback(&self) -> Duration {
        Duration::from_millis(self.exit_fallback_ms)
    }
}

/// Host capabilities that decide whether the exit transition is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Environment {
    /// User prefers reduced motion.
    pub reduced_motion: bool,
    /// Host can play the exit transition and report its end.
    pub animations_supported: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            animations_supported: true,
        }
    }
}

impl Environment {
    /// Environment for a user who prefers reduced motion.
    pub fn reduced_motion() -> Self {
        Self {
            reduced_motion: true,
            ..Self::default()
        }
    }

    /// Environment without animation support.
    pub fn without_animations() -> Self {
        Self {
            animations_supported: false,
            ..Self::default()
        }
    }

    /// True when the exit transition should actually be played.
    pub fn plays_exit_transition(&self) -> bool {
        self.animations_supported && !self.reduced_motion
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Loader phase. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderState {
    /// Snippet is being typed out.
    Typing,
    /// Content visible, waiting for the exit condition.
    Holding,
    /// Exit transition in flight.
    Animating,
    /// Terminal.
    Done,
}

impl LoaderState {
    /// Lowercase name, as exposed to the presentation layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderState::Typing => "typing",
            LoaderState::Holding => "holding",
            LoaderState::Animating => "animating",
            LoaderState::Done => "done",
        }
    }
}

impl std::fmt::Display for LoaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed-character progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingProgress {
    pub total_length: usize,
    pub displayed_length: usize,
}

impl TypingProgress {
    /// True once every character is displayed.
    pub fn is_complete(&self) -> bool {
        self.displayed_length >= self.total_length
    }
}

/// Notification drained by the host with `take_events()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LoaderEvent {
    /// Phase transition, stamped with milliseconds since mount.
    StateChanged {
        from: LoaderState,
        to: LoaderState,
        at_ms: u64,
    },
    /// Presentation should start the exit transition now.
    ExitAnimationStarted,
    /// Loader finished; emitted exactly once.
    Finished,
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderSnapshot {
    pub state: LoaderState,
    pub progress: TypingProgress,
    pub ready: bool,
    pub seen_before: bool,
    /// Milliseconds since mount.
    pub elapsed_ms: u64,
}

// =============================================================================
// TESTS
// =============================================================================
