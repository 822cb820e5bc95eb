//! The intro loader state machine.
//!
//! `LoaderSequencer` is clock-driven and owns no real timers: the host feeds
//! it time (`advance`) and events (`notify_ready`, `transition_end`,
//! `trigger_exit`), and pending timers live in the sequencer as plain
//! deadlines. Each timer handler runs at its own deadline, so a host that
//! wakes up late or in large steps still sees the same transitions.
//!
//! ```text
//! Typing ──typing complete + pause──▶ Holding ──exit condition──▶ Animating ──transition end / fallback──▶ Done
//! ```

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::highlight::{highlight, Token};

use super::model::{
    Environment, LoaderEvent, LoaderSnapshot, LoaderState, SequencerConfig, TimingProfile,
    TypingProgress,
};
use super::readiness::ReadinessSignal;
use super::storage::IntroStorage;
use super::typing::{char_prefix, TypingAnimator};
use crate::error::IntroResult;

/// Pending timer kinds, in tie-break order for equal deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TimerKind {
    GlobalTimeout,
    HoldingPause,
    ExitPoll,
    ExitFallback,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    at: Duration,
    kind: TimerKind,
}

type FinishCallback = Box<dyn FnOnce()>;

/// Coordinates typing, readiness and the minimum visible duration, then
/// performs a one-shot exit.
///
/// All time arguments are durations since mount. They are clamped to be
/// monotonic, so a stale timestamp never moves the sequencer backward.
pub struct LoaderSequencer<S: IntroStorage> {
    text: String,
    config: SequencerConfig,
    environment: Environment,
    profile: TimingProfile,
    seen_before: bool,
    readiness: ReadinessSignal,
    ready_observed: bool,
    storage: S,
    on_finish: Option<FinishCallback>,
    typing: TypingAnimator,
    state: LoaderState,
    content_visible_at: Option<Duration>,
    exit_triggered: bool,
    mounted: bool,
    now: Duration,
    /// Sorted by deadline.
    timers: Vec<Timer>,
    events: Vec<LoaderEvent>,
}

impl<S: IntroStorage> LoaderSequencer<S> {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Mounts a sequencer at t = 0.
    ///
    /// Reads the "seen before" flag once to pick the timing profile, arms the
    /// global timeout and starts typing. `on_finish` runs exactly once, on
    /// entering `Done`, and never after `unmount()`.
    pub fn mount(
        text: impl Into<String>,
        config: SequencerConfig,
        environment: Environment,
        readiness: ReadinessSignal,
        storage: S,
        on_finish: impl FnOnce() + 'static,
    ) -> IntroResult<Self> {
        config.validate()?;

        let seen_before = match storage.read_flag(&config.storage_key) {
            Ok(seen) => seen,
            Err(e) => {
                warn!(error = %e, "could not read intro flag, assuming first visit");
                false
            }
        };
        let profile = config.profile_for(seen_before);
        let text = text.into();
        let typing = TypingAnimator::new(
            text.chars().count(),
            profile.typing(),
            environment.reduced_motion,
        );

        let mut sequencer = Self {
            text,
            config,
            environment,
            profile,
            seen_before,
            readiness,
            ready_observed: false,
            storage,
            on_finish: Some(Box::new(on_finish)),
            typing,
            state: LoaderState::Typing,
            content_visible_at: None,
            exit_triggered: false,
            mounted: true,
            now: Duration::ZERO,
            timers: Vec::new(),
            events: Vec::new(),
        };

        debug!(
            seen_before,
            typing_ms = profile.typing_ms,
            min_visible_ms = profile.min_visible_ms,
            "intro loader mounted"
        );

        sequencer.schedule(sequencer.config.timeout(), TimerKind::GlobalTimeout);
        if sequencer.typing.is_complete() {
            sequencer.on_typing_complete(Duration::ZERO);
        }
        sequencer.run_due_timers(Duration::ZERO);
        sequencer.observe_readiness(Duration::ZERO);
        Ok(sequencer)
    }

    /// Tears the sequencer down: clears every pending timer and drops the
    /// finish callback without calling it. Later calls are no-ops.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.timers.clear();
        self.on_finish = None;
        debug!(state = %self.state, "intro loader unmounted");
    }

    // =========================================================================
    // HOST INPUTS
    // =========================================================================

    /// Animation frame / timer wake-up at `now`.
    pub fn advance(&mut self, now: Duration) {
        if !self.mounted {
            return;
        }
        let now = self.clamp(now);

        if self.state == LoaderState::Typing
            && !self.typing.is_complete()
            && self.typing.sample(now)
        {
            self.on_typing_complete(now);
        }

        self.run_due_timers(now);
        self.observe_readiness(now);
    }

    /// The readiness source settled (successfully or not).
    pub fn notify_ready(&mut self, now: Duration) {
        if !self.mounted {
            return;
        }
        let now = self.clamp(now);
        self.readiness.resolve();
        self.ready_observed = true;
        self.check_exit(now);
    }

    /// The exit transition reported its end.
    ///
    /// Returns false if no exit transition was in flight.
    pub fn transition_end(&mut self, now: Duration) -> bool {
        if !self.mounted || self.state != LoaderState::Animating {
            return false;
        }
        let now = self.clamp(now);
        self.finish(now);
        true
    }

    /// Starts the exit now, bypassing the exit condition.
    ///
    /// From `Typing` this snaps typing to complete and still passes through
    /// `Holding` and `Animating`. Only the first call has an effect; returns
    /// whether this call triggered the exit.
    pub fn trigger_exit(&mut self, now: Duration) -> bool {
        if !self.mounted || self.exit_triggered || self.state >= LoaderState::Animating {
            return false;
        }
        let now = self.clamp(now);

        if self.state == LoaderState::Typing {
            self.typing.finish();
            self.cancel(TimerKind::HoldingPause);
            self.transition(LoaderState::Holding, now);
            self.content_visible_at = Some(now);
        }

        self.begin_exit(now);
        true
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn progress(&self) -> TypingProgress {
        self.typing.progress()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the returning-user profile is in effect.
    pub fn seen_before(&self) -> bool {
        self.seen_before
    }

    pub fn profile(&self) -> TimingProfile {
        self.profile
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn readiness(&self) -> &ReadinessSignal {
        &self.readiness
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Full snippet.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The part of the snippet typed so far.
    pub fn visible_text(&self) -> &str {
        char_prefix(&self.text, self.typing.progress().displayed_length)
    }

    /// Highlighted tokens of the visible text.
    pub fn highlighted(&self) -> Vec<Token<'_>> {
        highlight(self.visible_text())
    }

    /// Latest time seen by the sequencer.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn snapshot(&self) -> LoaderSnapshot {
        LoaderSnapshot {
            state: self.state,
            progress: self.progress(),
            ready: self.is_ready(),
            seen_before: self.seen_before,
            elapsed_ms: self.now.as_millis() as u64,
        }
    }

    /// Earliest pending timer deadline, if any.
    ///
    /// Animation frames are not included; while typing, the host also
    /// samples on its own frame clock.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.first().map(|t| t.at)
    }

    /// Number of pending timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// True while typing is still animating.
    pub fn is_typing(&self) -> bool {
        self.state == LoaderState::Typing && !self.typing.is_complete()
    }

    /// Drains the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<LoaderEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    fn on_typing_complete(&mut self, at: Duration) {
        let pause = if self.environment.reduced_motion {
            Duration::ZERO
        } else {
            self.config.holding_pause()
        };
        debug!(at_ms = at.as_millis() as u64, "typing complete");
        self.schedule(at + pause, TimerKind::HoldingPause);
    }

    fn enter_holding(&mut self, at: Duration) {
        if self.state != LoaderState::Typing {
            return;
        }
        self.transition(LoaderState::Holding, at);
        self.content_visible_at = Some(at);
        self.check_exit(at);
        if self.state == LoaderState::Holding {
            self.schedule(at + self.config.poll_interval(), TimerKind::ExitPoll);
        }
    }

    /// Exit condition: ready, typed, minimum visible time since mount, and
    /// content visible long enough to avoid a flicker.
    fn check_exit(&mut self, at: Duration) {
        if self.exit_triggered || self.state != LoaderState::Holding {
            return;
        }

        let ready = self.readiness.is_ready();
        let typed = self.typing.is_complete();
        let min_passed = at >= self.profile.min_visible();
        let content_passed = self
            .content_visible_at
            .is_some_and(|visible| at.saturating_sub(visible) >= self.config.content_visible_min());

        if ready && typed && min_passed && content_passed {
            self.begin_exit(at);
        }
    }

    fn begin_exit(&mut self, at: Duration) {
        self.exit_triggered = true;
        self.cancel(TimerKind::ExitPoll);
        self.transition(LoaderState::Animating, at);

        if self.environment.plays_exit_transition() {
            self.events.push(LoaderEvent::ExitAnimationStarted);
            self.schedule(at + self.config.exit_fallback(), TimerKind::ExitFallback);
        } else {
            self.finish(at);
        }
    }

    fn finish(&mut self, at: Duration) {
        if self.state == LoaderState::Done {
            return;
        }
        self.transition(LoaderState::Done, at);
        self.timers.clear();

        if let Err(e) = self.storage.write_flag(&self.config.storage_key) {
            warn!(error = %e, "could not persist intro flag");
        }
        if let Some(on_finish) = self.on_finish.take() {
            on_finish();
        }
        self.events.push(LoaderEvent::Finished);

        info!(
            elapsed_ms = at.as_millis() as u64,
            seen_before = self.seen_before,
            "intro loader finished"
        );
    }

    fn transition(&mut self, to: LoaderState, at: Duration) {
        let from = self.state;
        debug_assert!(to > from, "loader state must move forward: {from} -> {to}");
        self.state = to;
        let at_ms = at.as_millis() as u64;
        self.events.push(LoaderEvent::StateChanged { from, to, at_ms });
        debug!(%from, %to, at_ms, "loader transition");
    }

    fn observe_readiness(&mut self, now: Duration) {
        if !self.ready_observed && self.readiness.is_ready() {
            self.ready_observed = true;
            self.check_exit(now);
        }
    }

    // =========================================================================
    // TIMERS
    // =========================================================================

    fn schedule(&mut self, at: Duration, kind: TimerKind) {
        let index = self
            .timers
            .partition_point(|t| (t.at, t.kind) <= (at, kind));
        self.timers.insert(index, Timer { at, kind });
    }

    fn cancel(&mut self, kind: TimerKind) {
        self.timers.retain(|t| t.kind != kind);
    }

    fn run_due_timers(&mut self, now: Duration) {
        while self.mounted {
            match self.timers.first() {
                Some(timer) if timer.at <= now => {
                    let timer = self.timers.remove(0);
                    self.fire(timer);
                }
                _ => break,
            }
        }
    }

    fn fire(&mut self, timer: Timer) {
        let at = timer.at;
        match timer.kind {
            TimerKind::GlobalTimeout => {
                if self.readiness.resolve() {
                    debug!(at_ms = at.as_millis() as u64, "global timeout forced readiness");
                }
                self.ready_observed = true;
                self.check_exit(at);
            }
            TimerKind::HoldingPause => self.enter_holding(at),
            TimerKind::ExitPoll => {
                if self.state == LoaderState::Holding {
                    self.check_exit(at);
                    if self.state == LoaderState::Holding {
                        self.schedule(at + self.config.poll_interval(), TimerKind::ExitPoll);
                    }
                }
            }
            TimerKind::ExitFallback => {
                if self.state == LoaderState::Animating {
                    debug!("exit transition end not reported, using fallback");
                    self.finish(at);
                }
            }
        }
    }

    fn clamp(&mut self, now: Duration) -> Duration {
        if now > self.now {
            self.now = now;
        }
        self.now
    }
}

impl<S: IntroStorage> std::fmt::Debug for LoaderSequencer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderSequencer")
            .field("state", &self.state)
            .field("progress", &self.typing.progress())
            .field("ready", &self.readiness.is_ready())
            .field("seen_before", &self.seen_before)
            .field("now", &self.now)
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntroError;
    use crate::loader::model::DEFAULT_STORAGE_KEY;
    use crate::loader::storage::{FileStorage, MemoryStorage};
    use std::cell::Cell;
    use std::rc::Rc;

    const FRAME_MS: u64 = 16;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn snippet() -> String {
        "#include <bits/stdc++.h>\nusing namespace std;\n".repeat(10)
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let calls = Rc::new(Cell::new(0));
        let handle = calls.clone();
        (calls, move || handle.set(handle.get() + 1))
    }

    fn mount_with(
        config: SequencerConfig,
        environment: Environment,
        storage: MemoryStorage,
    ) -> (LoaderSequencer<MemoryStorage>, Rc<Cell<u32>>) {
        let (calls, on_finish) = counter();
        let sequencer = LoaderSequencer::mount(
            snippet(),
            config,
            environment,
            ReadinessSignal::pending(),
            storage,
            on_finish,
        )
        .unwrap();
        (sequencer, calls)
    }

    /// Steps frames until Done or `limit_ms`, resolving readiness at the
    /// first frame at or after `ready_at_ms`. Returns all events.
    fn run_frames<S: IntroStorage>(
        sequencer: &mut LoaderSequencer<S>,
        ready_at_ms: Option<u64>,
        limit_ms: u64,
    ) -> Vec<LoaderEvent> {
        let mut events = sequencer.take_events();
        let mut t = 0;
        while t <= limit_ms && sequencer.state() != LoaderState::Done {
            if ready_at_ms.is_some_and(|r| t >= r) && !sequencer.is_ready() {
                sequencer.notify_ready(ms(t));
            }
            sequencer.advance(ms(t));
            events.extend(sequencer.take_events());
            t += FRAME_MS;
        }
        events
    }

    fn entered_at(events: &[LoaderEvent], state: LoaderState) -> Option<u64> {
        events.iter().find_map(|e| match e {
            LoaderEvent::StateChanged { to, at_ms, .. } if *to == state => Some(*at_ms),
            _ => None,
        })
    }

    fn count_entries(events: &[LoaderEvent], state: LoaderState) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, LoaderEvent::StateChanged { to, .. } if *to == state))
            .count()
    }

    #[test]
    fn test_first_visit_scenario() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, calls) = mount_with(config, Environment::default(), MemoryStorage::new());

        let events = run_frames(&mut sequencer, Some(500), 20000);

        // First frame at or after 3500ms is 3504; then the 600ms pause.
        assert_eq!(entered_at(&events, LoaderState::Holding), Some(4104));
        // Flicker guard: content visible for 400ms, checked on 100ms polls.
        assert_eq!(entered_at(&events, LoaderState::Animating), Some(4504));
        // No transition end reported: 500ms fallback.
        assert_eq!(entered_at(&events, LoaderState::Done), Some(5004));
        assert_eq!(calls.get(), 1);
        assert_eq!(sequencer.storage().get(DEFAULT_STORAGE_KEY), Some("true"));
    }

    #[test]
    fn test_returning_user_is_faster() {
        let config = SequencerConfig::new(15000, 4000)
            .unwrap()
            .with_returning(TimingProfile::new(800, 1500));

        let (mut first, _) = mount_with(config.clone(), Environment::default(), MemoryStorage::new());
        let first_done = entered_at(&run_frames(&mut first, Some(500), 20000), LoaderState::Done);

        let storage = MemoryStorage::new().with_flag(DEFAULT_STORAGE_KEY);
        let (mut returning, calls) = mount_with(config, Environment::default(), storage);
        assert!(returning.seen_before());
        assert_eq!(returning.profile(), TimingProfile::new(800, 1500));
        let returning_done =
            entered_at(&run_frames(&mut returning, Some(500), 20000), LoaderState::Done);

        assert_eq!(returning_done, Some(2300));
        assert!(returning_done < first_done);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_readiness_never_settles_global_timeout_wins() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, calls) = mount_with(config, Environment::default(), MemoryStorage::new());

        let events = run_frames(&mut sequencer, None, 30000);

        let done = entered_at(&events, LoaderState::Done).unwrap();
        assert_eq!(entered_at(&events, LoaderState::Animating), Some(15000));
        assert!(done <= 15000 + 4000 + 500);
        assert!(sequencer.is_ready());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_reduced_motion_skips_typing_and_exit_transition() {
        let config = SequencerConfig::new(15000, 1000).unwrap();
        let (mut sequencer, calls) =
            mount_with(config, Environment::reduced_motion(), MemoryStorage::new());

        assert_eq!(sequencer.state(), LoaderState::Holding);
        assert!(sequencer.progress().is_complete());

        let events = run_frames(&mut sequencer, Some(0), 5000);
        let done = entered_at(&events, LoaderState::Done).unwrap();
        assert_eq!(done, 1000);
        assert!(!events.contains(&LoaderEvent::ExitAnimationStarted));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_missing_animation_support_finishes_instantly() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, _) =
            mount_with(config, Environment::without_animations(), MemoryStorage::new());

        let events = run_frames(&mut sequencer, Some(0), 20000);
        assert_eq!(
            entered_at(&events, LoaderState::Animating),
            entered_at(&events, LoaderState::Done)
        );
        // Still passes through Animating.
        assert_eq!(count_entries(&events, LoaderState::Animating), 1);
    }

    #[test]
    fn test_transition_end_finishes_before_fallback() {
        let config = SequencerConfig::new(15000, 0).unwrap().with_typing_ms(0);
        let (mut sequencer, calls) = mount_with(config, Environment::default(), MemoryStorage::new());

        sequencer.notify_ready(ms(0));
        sequencer.advance(ms(0));
        sequencer.advance(ms(1000));
        assert_eq!(sequencer.state(), LoaderState::Animating);
        assert!(sequencer.take_events().contains(&LoaderEvent::ExitAnimationStarted));

        assert!(sequencer.transition_end(ms(1200)));
        assert_eq!(sequencer.state(), LoaderState::Done);
        assert!(!sequencer.transition_end(ms(1300)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_trigger_exit_twice_is_idempotent() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, calls) = mount_with(config, Environment::default(), MemoryStorage::new());

        sequencer.advance(ms(1000));
        assert!(sequencer.trigger_exit(ms(1000)));
        assert!(!sequencer.trigger_exit(ms(1000)));

        sequencer.advance(ms(1100));
        assert!(sequencer.transition_end(ms(1200)));
        sequencer.advance(ms(5000));

        let events = sequencer.take_events();
        assert_eq!(count_entries(&events, LoaderState::Holding), 1);
        assert_eq!(count_entries(&events, LoaderState::Animating), 1);
        assert_eq!(count_entries(&events, LoaderState::Done), 1);
        assert_eq!(
            events.iter().filter(|e| **e == LoaderEvent::Finished).count(),
            1
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_early_exit_snaps_typing_and_passes_through_holding() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, _) = mount_with(config, Environment::default(), MemoryStorage::new());

        sequencer.advance(ms(500));
        assert!(!sequencer.progress().is_complete());

        sequencer.trigger_exit(ms(500));
        assert!(sequencer.progress().is_complete());
        assert_eq!(sequencer.visible_text(), sequencer.text());

        let events = sequencer.take_events();
        let states: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                LoaderEvent::StateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![LoaderState::Holding, LoaderState::Animating]);
    }

    #[test]
    fn test_repeated_exit_checks_finish_once() {
        let config = SequencerConfig::new(15000, 0).unwrap().with_typing_ms(100);
        let (mut sequencer, calls) = mount_with(config, Environment::without_animations(), MemoryStorage::new());

        for t in (0..3000).step_by(10) {
            sequencer.notify_ready(ms(t));
            sequencer.advance(ms(t));
            sequencer.notify_ready(ms(t));
        }

        assert_eq!(sequencer.state(), LoaderState::Done);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unmount_clears_timers_and_drops_callback() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, calls) = mount_with(config, Environment::default(), MemoryStorage::new());

        sequencer.advance(ms(100));
        assert!(sequencer.pending_timers() > 0);

        sequencer.unmount();
        assert_eq!(sequencer.pending_timers(), 0);
        assert_eq!(sequencer.next_deadline(), None);

        sequencer.notify_ready(ms(200));
        sequencer.advance(ms(30000));
        assert!(!sequencer.trigger_exit(ms(30000)));
        assert_eq!(sequencer.state(), LoaderState::Typing);
        assert_eq!(calls.get(), 0);
        assert_eq!(sequencer.storage().get(DEFAULT_STORAGE_KEY), None);
    }

    #[test]
    fn test_flag_written_only_at_done() {
        let config = SequencerConfig::new(15000, 0).unwrap().with_typing_ms(0);
        let (mut sequencer, _) = mount_with(config, Environment::default(), MemoryStorage::new());

        sequencer.notify_ready(ms(0));
        sequencer.advance(ms(0));
        sequencer.advance(ms(1000));
        assert_eq!(sequencer.state(), LoaderState::Animating);
        assert_eq!(sequencer.storage().get(DEFAULT_STORAGE_KEY), None);

        sequencer.advance(ms(2000));
        assert_eq!(sequencer.state(), LoaderState::Done);
        assert_eq!(sequencer.storage().get(DEFAULT_STORAGE_KEY), Some("true"));
    }

    struct BrokenStorage;

    impl IntroStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> IntroResult<Option<String>> {
            Err(IntroError::storage("quota exceeded"))
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> IntroResult<()> {
            Err(IntroError::storage("quota exceeded"))
        }
    }

    #[test]
    fn test_storage_failures_are_absorbed() {
        let (calls, on_finish) = counter();
        let mut sequencer = LoaderSequencer::mount(
            snippet(),
            SequencerConfig::new(15000, 4000).unwrap(),
            Environment::default(),
            ReadinessSignal::ready(),
            BrokenStorage,
            on_finish,
        )
        .unwrap();

        assert!(!sequencer.seen_before());
        let events = run_frames(&mut sequencer, None, 20000);
        assert!(events.contains(&LoaderEvent::Finished));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_invalid_config_rejected_at_mount() {
        let config = SequencerConfig {
            poll_interval_ms: 0,
            ..SequencerConfig::default()
        };
        let result = LoaderSequencer::mount(
            "x",
            config,
            Environment::default(),
            ReadinessSignal::pending(),
            MemoryStorage::new(),
            || {},
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_monotonic_through_run() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, _) = mount_with(config, Environment::default(), MemoryStorage::new());

        let mut last = 0;
        for t in (0..6000).step_by(16) {
            sequencer.advance(ms(t));
            let shown = sequencer.progress().displayed_length;
            assert!(shown >= last);
            assert_eq!(sequencer.visible_text().chars().count(), shown);
            last = shown;
        }
        assert_eq!(last, sequencer.progress().total_length);
    }

    #[test]
    fn test_stale_time_is_clamped() {
        let config = SequencerConfig::new(15000, 4000).unwrap();
        let (mut sequencer, _) = mount_with(config, Environment::default(), MemoryStorage::new());

        sequencer.advance(ms(2000));
        let shown = sequencer.progress().displayed_length;
        sequencer.advance(ms(100));
        assert_eq!(sequencer.now(), ms(2000));
        assert_eq!(sequencer.progress().displayed_length, shown);
    }

    #[test]
    fn test_already_ready_signal_is_observed_at_holding() {
        let config = SequencerConfig::new(15000, 0).unwrap().with_typing_ms(0);
        let (calls, on_finish) = counter();
        let mut sequencer = LoaderSequencer::mount(
            "int main() {}",
            config,
            Environment::without_animations(),
            ReadinessSignal::ready(),
            MemoryStorage::new(),
            on_finish,
        )
        .unwrap();

        sequencer.advance(ms(0));
        sequencer.advance(ms(600));
        sequencer.advance(ms(1000));
        assert_eq!(sequencer.state(), LoaderState::Done);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_corrupt_state_file_recovers_after_one_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"scpc-intro-se"#).unwrap();

        let mut seen = Vec::new();
        for _ in 0..2 {
            let mut sequencer = LoaderSequencer::mount(
                snippet(),
                SequencerConfig::new(15000, 4000).unwrap(),
                Environment::default(),
                ReadinessSignal::ready(),
                FileStorage::new(&path),
                || {},
            )
            .unwrap();
            seen.push(sequencer.seen_before());
            run_frames(&mut sequencer, None, 20000);
            assert_eq!(sequencer.state(), LoaderState::Done);
        }

        assert_eq!(seen, vec![false, true]);
    }
}
