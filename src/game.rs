use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::session::{Phase, SessionMode, SessionResult};
use crate::wpm::{keystroke_accuracy, points_for_word};

pub const DEFAULT_GAME_SECS: u32 = 60;

/// Used when the backend cannot supply a word pool
pub const FALLBACK_WORDS: [&str; 5] = ["error", "loading", "words", "please", "refresh"];

/// Remaining words for the current round, drawn without replacement
#[derive(Debug, Clone, Default)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    pub fn fill<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(Into::into)
                .filter(|w: &String| !w.trim().is_empty()),
        );
    }

    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<String> {
        if self.words.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.words.len());
        Some(self.words.swap_remove(idx))
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub score: u32,
    pub words_typed: u32,
    pub correct_words: u32,
    pub summary: SessionResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameInput {
    Ignored,
    /// Typed text is (or is not) a prefix of the target word
    Progress { on_track: bool },
    WordCompleted { points: u32, needs_refill: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameTick {
    Idle,
    Running { time_left: u32 },
    Finished(GameResult),
}

/// Timed word game: type the shown word, score by word length
#[derive(Debug)]
pub struct GameSession<C: Clock = SystemClock> {
    clock: C,
    rng: StdRng,
    duration_secs: u32,
    phase: Phase,
    started_at: Option<Instant>,
    pool: WordPool,
    current_word: Option<String>,
    score: u32,
    time_left: u32,
    correct_words: u32,
    total_keystrokes: u32,
    correct_keystrokes: u32,
}

impl GameSession<SystemClock> {
    pub fn new(duration_secs: u32) -> Self {
        Self::with_parts(duration_secs, SystemClock, StdRng::from_entropy())
    }
}

impl<C: Clock> GameSession<C> {
    pub fn with_parts(duration_secs: u32, clock: C, rng: StdRng) -> Self {
        Self {
            clock,
            rng,
            duration_secs: duration_secs.max(1),
            phase: Phase::Idle,
            started_at: None,
            pool: WordPool::default(),
            current_word: None,
            score: 0,
            time_left: duration_secs.max(1),
            correct_words: 0,
            total_keystrokes: 0,
            correct_keystrokes: 0,
        }
    }

    /// Reset counters and the countdown, then draw the first word
    pub fn start<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pool.clear();
        self.pool.fill(words);
        self.score = 0;
        self.time_left = self.duration_secs;
        self.correct_words = 0;
        self.total_keystrokes = 0;
        self.correct_keystrokes = 0;
        self.started_at = Some(self.clock.now());
        self.phase = Phase::Active;
        self.current_word = self.pool.draw(&mut self.rng);
        debug!(pool = self.pool.len(), "game started");
    }

    pub fn record_input(&mut self, text: &str) -> GameInput {
        if self.phase != Phase::Active {
            return GameInput::Ignored;
        }
        let Some(word) = self.current_word.as_deref() else {
            return GameInput::Ignored;
        };

        let typed = text.trim();
        self.total_keystrokes = self.total_keystrokes.saturating_add(1);
        let on_track = word.starts_with(typed);
        if on_track {
            self.correct_keystrokes = self.correct_keystrokes.saturating_add(1);
        }

        if typed != word {
            return GameInput::Progress { on_track };
        }

        let points = points_for_word(word);
        self.score = self.score.saturating_add(points);
        self.correct_words = self.correct_words.saturating_add(1);
        self.current_word = self.pool.draw(&mut self.rng);

        let needs_refill = self.current_word.is_none();
        if needs_refill {
            debug!("word pool exhausted");
        }
        GameInput::WordCompleted {
            points,
            needs_refill,
        }
    }

    /// Top up the pool; draws a word if the round was waiting on one
    pub fn refill<I, S>(&mut self, words: I) -> Option<&str>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pool.fill(words);
        if self.phase == Phase::Active && self.current_word.is_none() {
            self.current_word = self.pool.draw(&mut self.rng);
        }
        self.current_word.as_deref()
    }

    /// One-second countdown step
    pub fn tick(&mut self) -> GameTick {
        if self.phase != Phase::Active {
            return GameTick::Idle;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return GameTick::Running {
                time_left: self.time_left,
            };
        }
        match self.finish() {
            Some(result) => GameTick::Finished(result),
            None => GameTick::Idle,
        }
    }

    pub fn finish(&mut self) -> Option<GameResult> {
        if self.phase != Phase::Active {
            return None;
        }
        self.phase = Phase::Finished;

        let elapsed = self
            .started_at
            .map(|t| self.clock.now().saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        let summary = SessionResult::new(
            SessionMode::Game,
            elapsed,
            self.correct_words as usize,
            self.total_keystrokes.saturating_sub(self.correct_keystrokes),
            keystroke_accuracy(self.correct_keystrokes, self.total_keystrokes),
        );
        let result = GameResult {
            score: self.score,
            words_typed: self.correct_words,
            correct_words: self.correct_words,
            summary,
        };
        info!(
            score = result.score,
            words = result.correct_words,
            accuracy = summary.accuracy_pct,
            "game finished"
        );
        Some(result)
    }

    /// Abandon a running round without a result. False when none was running.
    pub fn cancel(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.phase = Phase::Finished;
        self.current_word = None;
        debug!(score = self.score, "round discarded");
        true
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

}
