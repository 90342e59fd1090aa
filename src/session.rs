use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::keystroke::KeystrokeLog;
use crate::wpm::{error_accuracy, guard_elapsed, positional_accuracy, wpm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionMode {
    Test,
    Lesson,
    Game,
}

/// Idle -> Active -> Finished. Only `start` leaves Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Active,
    Finished,
}

/// Snapshot produced once when a session completes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub mode: SessionMode,
    pub elapsed_seconds: f64,
    pub wpm: f64,
    pub accuracy_pct: f64,
    pub correct_units: usize,
    pub error_count: u32,
}

impl SessionResult {
    pub fn new(
        mode: SessionMode,
        elapsed_seconds: f64,
        correct_units: usize,
        error_count: u32,
        accuracy_pct: f64,
    ) -> Self {
        let elapsed_seconds = guard_elapsed(elapsed_seconds);
        Self {
            mode,
            elapsed_seconds,
            wpm: wpm(correct_units, elapsed_seconds),
            accuracy_pct: accuracy_pct.clamp(0.0, 100.0),
            correct_units,
            error_count,
        }
    }
}

/// Display-only numbers recomputed on every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveStats {
    pub elapsed_seconds: f64,
    pub wpm: f64,
    pub accuracy_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Session not active, nothing changed
    Ignored,
    Matching,
    Mismatch { position: usize },
    Completed(SessionResult),
}

/// Tracks one typing test or lesson against a fixed reference text
#[derive(Debug)]
pub struct Session<C: Clock = SystemClock> {
    mode: SessionMode,
    clock: C,
    reference_text: String,
    reference_len: usize,
    phase: Phase,
    started_at: Option<Instant>,
    typed_text: String,
    typed_length: usize,
    error_count: u32,
    completed_chars: usize,
    keystroke_log: KeystrokeLog,
}

impl Session<SystemClock> {
    pub fn new(mode: SessionMode) -> Self {
        Self::with_clock(mode, SystemClock)
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(mode: SessionMode, clock: C) -> Self {
        Self {
            mode,
            clock,
            reference_text: String::new(),
            reference_len: 0,
            phase: Phase::Idle,
            started_at: None,
            typed_text: String::new(),
            typed_length: 0,
            error_count: 0,
            completed_chars: 0,
            keystroke_log: KeystrokeLog::new(),
        }
    }

    /// Begin a new attempt. An active session is discarded and restarted.
    pub fn start(&mut self, reference_text: impl Into<String>) {
        if self.phase == Phase::Active {
            debug!(mode = %self.mode, "restarting active session");
        }
        self.reference_text = reference_text.into();
        self.reference_len = self.reference_text.chars().count();
        self.typed_text.clear();
        self.typed_length = 0;
        self.error_count = 0;
        self.completed_chars = 0;
        self.keystroke_log.clear();
        self.started_at = Some(self.clock.now());
        self.phase = Phase::Active;
        debug!(mode = %self.mode, len = self.reference_len, "session started");
    }

    /// Feed the full text typed so far
    pub fn record_input(&mut self, current_typed_text: &str) -> InputOutcome {
        if self.phase != Phase::Active {
            return InputOutcome::Ignored;
        }

        let mut typed: Vec<char> = current_typed_text.chars().collect();
        let overflow = self.mode == SessionMode::Lesson && typed.len() > self.reference_len;
        if overflow {
            typed.truncate(self.reference_len);
        }

        let mismatch = typed
            .iter()
            .zip(self.reference_text.chars())
            .position(|(t, r)| *t != r)
            .or(if overflow { Some(self.reference_len) } else { None });

        self.typed_text = typed.iter().collect();
        self.typed_length = typed.len();

        match mismatch {
            Some(position) => {
                // one increment per input event, regardless of how many chars differ
                self.error_count = self.error_count.saturating_add(1);
                InputOutcome::Mismatch { position }
            }
            None => {
                self.completed_chars = self.typed_length;
                if self.typed_length >= self.reference_len && self.typed_text == self.reference_text
                {
                    match self.finish() {
                        Some(result) => InputOutcome::Completed(result),
                        None => InputOutcome::Ignored,
                    }
                } else {
                    InputOutcome::Matching
                }
            }
        }
    }

    /// Log a key press at the current cursor. Modifiers and inactive
    /// sessions are skipped.
    pub fn record_keystroke(&mut self, key: &str) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        let offset_ms = self
            .started_at
            .map(|t| self.clock.now().saturating_duration_since(t).as_millis() as u64)
            .unwrap_or(0);
        self.keystroke_log.push(key, offset_ms, self.typed_length)
    }

    /// Live metrics for display; never touches the error count
    pub fn tick(&self, elapsed_seconds: f64) -> Option<LiveStats> {
        if self.phase != Phase::Active {
            return None;
        }
        Some(LiveStats {
            elapsed_seconds,
            wpm: wpm(self.typed_length, elapsed_seconds),
            accuracy_pct: positional_accuracy(&self.typed_text, &self.reference_text),
        })
    }

    /// Complete the session. Returns `None` if it is not active.
    pub fn finish(&mut self) -> Option<SessionResult> {
        if self.phase != Phase::Active {
            return None;
        }
        self.phase = Phase::Finished;

        let result = SessionResult::new(
            self.mode,
            self.elapsed_seconds(),
            self.typed_length,
            self.error_count,
            error_accuracy(self.error_count, self.reference_len),
        );
        info!(
            mode = %self.mode,
            wpm = result.wpm,
            accuracy = result.accuracy_pct,
            errors = result.error_count,
            "session finished"
        );
        Some(result)
    }

    /// Abandon an active attempt without producing a result.
    /// Returns false when nothing was active.
    pub fn cancel(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.phase = Phase::Finished;
        debug!(mode = %self.mode, typed = self.typed_length, "session discarded");
        true
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started_at
            .map(|t| self.clock.now().saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Lesson progress bar: longest correct prefix over reference length
    pub fn progress_pct(&self) -> f64 {
        if self.reference_len == 0 {
            return 0.0;
        }
        (self.completed_chars as f64 / self.reference_len as f64 * 100.0).min(100.0)
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn reference_text(&self) -> &str {
        &self.reference_text
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    pub fn typed_length(&self) -> usize {
        self.typed_length
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn keystroke_log(&self) -> &KeystrokeLog {
        &self.keystroke_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use assert_matches::assert_matches;

    fn session(mode: SessionMode) -> (Session<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Session::with_clock(mode, clock.clone()), clock)
    }

    #[test]
    fn new_session_is_idle() {
        let (s, _) = session(SessionMode::Test);
        assert_eq!(s.phase(), Phase::Idle);
        assert!(!s.is_active());
        assert_eq!(s.typed_length(), 0);
        assert_eq!(s.error_count(), 0);
    }

    #[test]
    fn exact_hello_world_in_six_seconds() {
        let (mut s, clock) = session(SessionMode::Test);
        s.start("hello world");

        clock.advance_secs(6.0);
        let outcome = s.record_input("hello world");

        let result = assert_matches!(outcome, InputOutcome::Completed(r) => r);
        assert!((result.wpm - 22.0).abs() < 1e-9);
        assert_eq!(result.accuracy_pct, 100.0);
        assert_eq!(result.correct_units, 11);
        assert_eq!(s.phase(), Phase::Finished);
    }

    #[test]
    fn mismatch_counts_once_and_stays_active() {
        let (mut s, _) = session(SessionMode::Test);
        s.start("hello");

        assert_eq!(s.record_input("hell"), InputOutcome::Matching);
        assert_eq!(
            s.record_input("helln"),
            InputOutcome::Mismatch { position: 4 }
        );
        assert_eq!(s.error_count(), 1);
        assert!(s.is_active());
    }

    #[test]
    fn several_wrong_chars_in_one_event_count_once() {
        let (mut s, _) = session(SessionMode::Test);
        s.start("hello");

        s.record_input("hxxxx");
        assert_eq!(s.error_count(), 1);

        s.record_input("hxxxxy");
        assert_eq!(s.error_count(), 2);
    }

    #[test]
    fn test_mode_allows_overtyping_without_completion() {
        let (mut s, _) = session(SessionMode::Test);
        s.start("hi");

        assert_matches!(s.record_input("hip"), InputOutcome::Matching);
        assert_eq!(s.typed_length(), 3);
        assert!(s.is_active());
    }

    #[test]
    fn lesson_mode_truncates_and_flags_overflow() {
        let (mut s, _) = session(SessionMode::Lesson);
        s.start("asdf");

        assert_eq!(
            s.record_input("asdfj"),
            InputOutcome::Mismatch { position: 4 }
        );
        assert_eq!(s.typed_length(), 4);
        assert_eq!(s.typed_text(), "asdf");
        assert_eq!(s.error_count(), 1);
        assert!(s.is_active());
    }

    #[test]
    fn lesson_progress_tracks_correct_prefix() {
        let (mut s, _) = session(SessionMode::Lesson);
        s.start("asdf");

        s.record_input("as");
        assert_eq!(s.progress_pct(), 50.0);

        s.record_input("asx");
        assert_eq!(s.progress_pct(), 50.0);

        s.record_input("asd");
        assert_eq!(s.progress_pct(), 75.0);
    }

    #[test]
    fn input_after_finish_is_ignored() {
        let (mut s, _) = session(SessionMode::Test);
        s.start("hello");
        s.record_input("hex");
        let errors = s.error_count();
        let len = s.typed_length();

        assert!(s.finish().is_some());
        assert_eq!(s.record_input("zzzzzz"), InputOutcome::Ignored);
        assert_eq!(s.error_count(), errors);
        assert_eq!(s.typed_length(), len);
    }

    #[test]
    fn finish_is_idempotent() {
        let (mut s, _) = session(SessionMode::Test);
        assert!(s.finish().is_none());

        s.start("abc");
        assert!(s.finish().is_some());
        assert!(s.finish().is_none());
    }

    #[test]
    fn cancel_discards_without_result() {
        let (mut s, _) = session(SessionMode::Test);
        assert!(!s.cancel());

        s.start("abc");
        s.record_input("ab");
        assert!(s.cancel());
        assert_eq!(s.phase(), Phase::Finished);
        assert!(s.finish().is_none());
        assert_eq!(s.record_input("abc"), InputOutcome::Ignored);
        assert!(!s.cancel());
    }

    #[test]
    fn error_count_saturates() {
        let (mut s, _) = session(SessionMode::Test);
        s.start("abc");
        s.error_count = u32::MAX;

        assert_matches!(s.record_input("x"), InputOutcome::Mismatch { position: 0 });
        assert_eq!(s.error_count(), u32::MAX);
        assert_eq!(s.finish().unwrap().accuracy_pct, 0.0);
    }

    #[test]
    fn finish_at_zero_elapsed_is_finite() {
        let (mut s, _) = session(SessionMode::Test);
        s.start("abc");
        s.record_input("ab");

        let r = s.finish().unwrap();
        assert!(r.elapsed_seconds > 0.0);
        assert!(r.wpm.is_finite());
        assert!(r.wpm >= 0.0);
    }

    #[test]
    fn empty_reference_yields_zero_wpm() {
        let (mut s, clock) = session(SessionMode::Test);
        s.start("");
        clock.advance_secs(3.0);

        let r = s.finish().unwrap();
        assert_eq!(r.wpm, 0.0);
        assert_eq!(r.accuracy_pct, 100.0);
    }

    #[test]
    fn accuracy_stays_in_range_with_many_errors() {
        let (mut s, clock) = session(SessionMode::Test);
        s.start("ab");
        for _ in 0..10 {
            s.record_input("x");
        }
        clock.advance_secs(1.0);

        let r = s.finish().unwrap();
        assert_eq!(r.accuracy_pct, 0.0);
        assert_eq!(r.error_count, 10);
    }

    #[test]
    fn start_while_active_resets_everything() {
        let (mut s, clock) = session(SessionMode::Test);
        s.start("hello");
        s.record_input("hx");
        s.record_keystroke("h");

        clock.advance_secs(2.0);
        s.start("world");

        assert!(s.is_active());
        assert_eq!(s.reference_text(), "world");
        assert_eq!(s.error_count(), 0);
        assert_eq!(s.typed_length(), 0);
        assert!(s.keystroke_log().is_empty());
        assert_eq!(s.elapsed_seconds(), 0.0);
    }

    #[test]
    fn tick_reports_live_stats_without_counting_errors() {
        let (mut s, _) = session(SessionMode::Test);
        assert!(s.tick(1.0).is_none());

        s.start("hello world");
        s.record_input("hellx");
        let errors = s.error_count();

        let live = s.tick(6.0).unwrap();
        assert!((live.wpm - 10.0).abs() < 1e-9);
        assert_eq!(live.accuracy_pct, 80.0);
        assert_eq!(s.error_count(), errors);
    }

    #[test]
    fn keystrokes_are_offset_from_start() {
        let (mut s, clock) = session(SessionMode::Test);
        assert!(!s.record_keystroke("a"));

        s.start("ab");
        clock.advance_secs(0.25);
        s.record_keystroke("a");
        s.record_input("a");
        clock.advance_secs(0.25);
        s.record_keystroke("Shift");
        s.record_keystroke("b");

        let entries = s.keystroke_log().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp_offset_ms, 250);
        assert_eq!(entries[0].cursor_position, 0);
        assert_eq!(entries[1].timestamp_offset_ms, 500);
        assert_eq!(entries[1].cursor_position, 1);
    }

    #[test]
    fn unicode_positions_are_by_char() {
        let (mut s, _) = session(SessionMode::Test);
        s.start("héllo");
        assert_eq!(
            s.record_input("hélla"),
            InputOutcome::Mismatch { position: 4 }
        );
        assert_eq!(s.typed_length(), 5);
    }
}
