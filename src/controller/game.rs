use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::api::{ApiResult, Backend, Difficulty, GameSubmission};
use crate::clock::{Clock, SystemClock};
use crate::dispatch::Dispatcher;
use crate::game::{GameInput, GameResult, GameSession, GameTick, FALLBACK_WORDS};
use crate::view::{Presenter, ViewEvent};

/// Words requested per pool fetch
pub const DEFAULT_WORD_COUNT: usize = 50;

#[derive(Debug)]
pub enum GameReply {
    Start(ApiResult<Vec<String>>),
    Refill(ApiResult<Vec<String>>),
}

pub struct GameController<B: Backend, C: Clock = SystemClock> {
    backend: Arc<B>,
    dispatcher: Dispatcher<GameReply>,
    game: GameSession<C>,
    difficulty: Difficulty,
    word_count: usize,
    refill_pending: bool,
}

impl<B: Backend> GameController<B, SystemClock> {
    pub fn new(backend: Arc<B>, handle: Handle, difficulty: Difficulty, duration_secs: u32) -> Self {
        Self::with_game(
            backend,
            handle,
            GameSession::new(duration_secs),
            difficulty,
            DEFAULT_WORD_COUNT,
        )
    }
}

impl<B: Backend, C: Clock> GameController<B, C> {
    pub fn with_game(
        backend: Arc<B>,
        handle: Handle,
        game: GameSession<C>,
        difficulty: Difficulty,
        word_count: usize,
    ) -> Self {
        Self {
            backend,
            dispatcher: Dispatcher::new(handle),
            game,
            difficulty,
            word_count: word_count.max(1),
            refill_pending: false,
        }
    }

    pub fn game(&self) -> &GameSession<C> {
        &self.game
    }

    /// Fetch a fresh pool; the round starts when it arrives
    pub fn start<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        self.dispatcher.begin_generation();
        self.game.cancel();
        self.refill_pending = false;
        presenter.present(ViewEvent::Status("Loading words...".into()));
        self.spawn_fetch(GameReply::Start);
    }

    fn spawn_fetch(&mut self, wrap: fn(ApiResult<Vec<String>>) -> GameReply) {
        let backend = Arc::clone(&self.backend);
        let (count, difficulty) = (self.word_count, self.difficulty);
        self.dispatcher
            .spawn(async move { wrap(backend.fetch_words(count, difficulty).await) });
    }

    pub fn poll<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        for reply in self.dispatcher.drain() {
            self.apply(reply, presenter);
        }
    }

    pub async fn await_reply<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> bool {
        match self.dispatcher.next_reply().await {
            Some(reply) => {
                self.apply(reply, presenter);
                true
            }
            None => false,
        }
    }

    fn apply<P: Presenter + ?Sized>(&mut self, reply: GameReply, presenter: &mut P) {
        match reply {
            GameReply::Start(words) => {
                self.game.start(words_or_fallback(words));
                presenter.present(ViewEvent::GameClock(self.game.time_left()));
                presenter.present(ViewEvent::GameScore(0));
                presenter.present(ViewEvent::GameWord(self.current_word()));
                presenter.present(ViewEvent::ClearInput);
            }
            GameReply::Refill(words) => {
                self.refill_pending = false;
                let word = self.game.refill(words_or_fallback(words)).map(str::to_string);
                presenter.present(ViewEvent::GameWord(word));
            }
        }
    }

    fn current_word(&self) -> Option<String> {
        self.game.current_word().map(str::to_string)
    }

    pub fn on_input<P: Presenter + ?Sized>(&mut self, typed: &str, presenter: &mut P) {
        let target = self.current_word();
        match self.game.record_input(typed) {
            GameInput::Ignored => {}
            GameInput::Progress { on_track } => {
                let mismatch = match (&target, on_track) {
                    (Some(word), false) => Some(first_mismatch(typed.trim(), word)),
                    _ => None,
                };
                presenter.present(ViewEvent::InputState {
                    mismatch,
                    progress_pct: 0.0,
                });
            }
            GameInput::WordCompleted {
                points,
                needs_refill,
            } => {
                debug!(points, score = self.game.score(), "word completed");
                presenter.present(ViewEvent::GameScore(self.game.score()));
                presenter.present(ViewEvent::GameWord(self.current_word()));
                presenter.present(ViewEvent::ClearInput);
                if needs_refill && !self.refill_pending {
                    self.refill_pending = true;
                    self.spawn_fetch(GameReply::Refill);
                }
            }
        }
    }

    /// One-second countdown step
    pub fn on_tick<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        match self.game.tick() {
            GameTick::Idle => {}
            GameTick::Running { time_left } => presenter.present(ViewEvent::GameClock(time_left)),
            GameTick::Finished(result) => self.complete(result, presenter),
        }
    }

    pub fn end<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Option<GameResult> {
        let result = self.game.finish()?;
        self.complete(result, presenter);
        Some(result)
    }

    fn complete<P: Presenter + ?Sized>(&mut self, result: GameResult, presenter: &mut P) {
        presenter.present(ViewEvent::GameOver(result));

        let submission = GameSubmission {
            score: result.score,
            words_typed: result.words_typed,
            correct_words: result.correct_words,
            accuracy: result.summary.accuracy_pct,
            wpm: result.summary.wpm,
            difficulty: self.difficulty,
        };
        let backend = Arc::clone(&self.backend);
        self.dispatcher.spawn_detached(async move {
            match backend.submit_game(submission).await {
                Ok(_) => info!("game result saved"),
                Err(e) => warn!(error = %e, "failed to save game result"),
            }
        });
    }
}

fn words_or_fallback(reply: ApiResult<Vec<String>>) -> Vec<String> {
    match reply {
        Ok(words) if words.iter().any(|w| !w.trim().is_empty()) => words,
        Ok(_) => {
            warn!("backend sent an empty word pool");
            fallback_words()
        }
        Err(e) => {
            warn!(error = %e, "failed to load game words");
            fallback_words()
        }
    }
}

fn fallback_words() -> Vec<String> {
    FALLBACK_WORDS.iter().map(|w| w.to_string()).collect()
}

fn first_mismatch(typed: &str, word: &str) -> usize {
    typed
        .chars()
        .zip(word.chars())
        .position(|(t, w)| t != w)
        .unwrap_or_else(|| word.chars().count())
}
