use crate::api::{Lesson, PredictResponse, TestAnalysis};
use crate::chat::ChatMessage;
use crate::game::GameResult;
use crate::progress::{ProgressReport, SpeedForecast};
use crate::session::{LiveStats, SessionResult};

/// Everything a controller can ask the screen to show
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Transient line: loading notices and fallback error messages
    Status(String),
    ReferenceText(String),
    LessonLoaded(Lesson),
    Live(LiveStats),
    InputState {
        mismatch: Option<usize>,
        progress_pct: f64,
    },
    /// `None` renders as "Prediction unavailable"
    Prediction(Option<PredictResponse>),
    SessionFinished(SessionResult),
    Analysis(TestAnalysis),
    GameWord(Option<String>),
    GameScore(u32),
    GameClock(u32),
    GameOver(GameResult),
    ClearInput,
    /// `None` renders as "No data available"
    Progress(Option<ProgressReport>),
    Forecast(SpeedForecast),
    Chat(Vec<ChatMessage>),
}

/// Sink for view events. Controllers never render directly.
pub trait Presenter {
    fn present(&mut self, event: ViewEvent);
}

impl Presenter for Vec<ViewEvent> {
    fn present(&mut self, event: ViewEvent) {
        self.push(event);
    }
}

/// State the terminal UI draws from, folded out of view events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    pub status: Option<String>,
    pub reference_text: String,
    pub lesson: Option<Lesson>,
    pub live: Option<LiveStats>,
    pub mismatch: Option<usize>,
    pub progress_pct: f64,
    pub prediction: Option<Option<PredictResponse>>,
    pub finished: Option<SessionResult>,
    pub analysis: Option<TestAnalysis>,
    pub game_word: Option<String>,
    pub game_score: u32,
    pub game_clock: Option<u32>,
    pub game_over: Option<GameResult>,
    pub progress: Option<Option<ProgressReport>>,
    pub forecast: Option<SpeedForecast>,
    pub chat: Vec<ChatMessage>,
    clear_input: bool,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once per `ClearInput` event
    pub fn take_clear_input(&mut self) -> bool {
        std::mem::take(&mut self.clear_input)
    }

    fn reset_attempt(&mut self) {
        self.live = None;
        self.mismatch = None;
        self.progress_pct = 0.0;
        self.prediction = None;
        self.finished = None;
        self.analysis = None;
    }
}

impl Presenter for ViewModel {
    fn present(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Status(msg) => self.status = Some(msg),
            ViewEvent::ReferenceText(text) => {
                self.reset_attempt();
                self.status = None;
                self.reference_text = text;
            }
            ViewEvent::LessonLoaded(lesson) => {
                self.reset_attempt();
                self.status = None;
                self.reference_text = lesson.content.clone();
                self.lesson = Some(lesson);
            }
            ViewEvent::Live(stats) => self.live = Some(stats),
            ViewEvent::InputState {
                mismatch,
                progress_pct,
            } => {
                self.mismatch = mismatch;
                self.progress_pct = progress_pct;
            }
            ViewEvent::Prediction(p) => self.prediction = Some(p),
            ViewEvent::SessionFinished(result) => self.finished = Some(result),
            ViewEvent::Analysis(analysis) => {
                self.status = None;
                self.analysis = Some(analysis);
            }
            ViewEvent::GameWord(word) => self.game_word = word,
            ViewEvent::GameScore(score) => self.game_score = score,
            ViewEvent::GameClock(secs) => {
                if self.game_clock.is_none() {
                    self.status = None;
                    self.game_over = None;
                    self.game_score = 0;
                }
                self.game_clock = Some(secs);
            }
            ViewEvent::GameOver(result) => {
                self.game_clock = None;
                self.game_word = None;
                self.game_score = result.score;
                self.game_over = Some(result);
            }
            ViewEvent::ClearInput => self.clear_input = true,
            ViewEvent::Progress(report) => {
                self.status = None;
                self.progress = Some(report);
            }
            ViewEvent::Forecast(forecast) => self.forecast = Some(forecast),
            ViewEvent::Chat(messages) => self.chat = messages,
        }
    }
}
