use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::{ApiError, ApiResult};
use super::types::*;
use super::Backend;

/// In-process backend with canned answers that records every request.
/// Exchanges without a canned answer fail with a 503.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    text: Option<String>,
    lessons: HashMap<String, Lesson>,
    words: Option<Vec<String>>,
    analysis: Option<TestAnalysis>,
    prediction: Option<PredictResponse>,
    progress: Option<ProgressResponse>,
    chat_reply: Option<String>,

    text_requests: Vec<Difficulty>,
    word_requests: Vec<(usize, Difficulty)>,
    submitted_tests: Vec<SubmitTestRequest>,
    lesson_updates: Vec<LessonProgressRequest>,
    game_submissions: Vec<GameSubmission>,
    prediction_requests: Vec<PredictRequest>,
    chat_queries: Vec<String>,
}

fn unavailable<T>(endpoint: &'static str) -> ApiResult<T> {
    Err(ApiError::Status {
        endpoint,
        status: 503,
    })
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_text(self, text: &str) -> Self {
        self.state().text = Some(text.to_string());
        self
    }

    pub fn with_lesson(self, lesson: Lesson) -> Self {
        self.state().lessons.insert(lesson.id.clone(), lesson);
        self
    }

    pub fn with_words(self, words: &[&str]) -> Self {
        self.state().words = Some(words.iter().map(|w| w.to_string()).collect());
        self
    }

    pub fn with_analysis(self, analysis: TestAnalysis) -> Self {
        self.state().analysis = Some(analysis);
        self
    }

    pub fn with_prediction(self, prediction: PredictResponse) -> Self {
        self.state().prediction = Some(prediction);
        self
    }

    pub fn with_progress(self, progress: ProgressResponse) -> Self {
        self.state().progress = Some(progress);
        self
    }

    pub fn with_chat_reply(self, reply: &str) -> Self {
        self.state().chat_reply = Some(reply.to_string());
        self
    }

    pub fn text_requests(&self) -> Vec<Difficulty> {
        self.state().text_requests.clone()
    }

    pub fn word_requests(&self) -> Vec<(usize, Difficulty)> {
        self.state().word_requests.clone()
    }

    pub fn submitted_tests(&self) -> Vec<SubmitTestRequest> {
        self.state().submitted_tests.clone()
    }

    pub fn lesson_updates(&self) -> Vec<LessonProgressRequest> {
        self.state().lesson_updates.clone()
    }

    pub fn game_submissions(&self) -> Vec<GameSubmission> {
        self.state().game_submissions.clone()
    }

    pub fn prediction_requests(&self) -> Vec<PredictRequest> {
        self.state().prediction_requests.clone()
    }

    pub fn chat_queries(&self) -> Vec<String> {
        self.state().chat_queries.clone()
    }
}

impl Backend for MemoryBackend {
    async fn fetch_text(&self, difficulty: Difficulty) -> ApiResult<String> {
        let mut state = self.state();
        state.text_requests.push(difficulty);
        match &state.text {
            Some(text) => Ok(text.clone()),
            None => unavailable("api/get-text"),
        }
    }

    async fn fetch_lesson(&self, lesson_id: &str) -> ApiResult<Lesson> {
        match self.state().lessons.get(lesson_id) {
            Some(lesson) => Ok(lesson.clone()),
            None => Err(ApiError::Status {
                endpoint: "api/get-lesson",
                status: 404,
            }),
        }
    }

    async fn fetch_words(&self, count: usize, difficulty: Difficulty) -> ApiResult<Vec<String>> {
        let mut state = self.state();
        state.word_requests.push((count, difficulty));
        match &state.words {
            Some(words) => Ok(words.iter().take(count).cloned().collect()),
            None => unavailable("api/game-words"),
        }
    }

    async fn submit_test(&self, request: SubmitTestRequest) -> ApiResult<TestAnalysis> {
        let mut state = self.state();
        state.submitted_tests.push(request);
        match &state.analysis {
            Some(analysis) => Ok(analysis.clone()),
            None => unavailable("api/submit-test"),
        }
    }

    async fn submit_lesson(&self, request: LessonProgressRequest) -> ApiResult<Ack> {
        self.state().lesson_updates.push(request);
        Ok(Ack::default())
    }

    async fn submit_game(&self, request: GameSubmission) -> ApiResult<Ack> {
        self.state().game_submissions.push(request);
        Ok(Ack::default())
    }

    async fn predict_wpm(&self, request: PredictRequest) -> ApiResult<PredictResponse> {
        let mut state = self.state();
        state.prediction_requests.push(request);
        match state.prediction {
            Some(prediction) => Ok(prediction),
            None => unavailable("api/predict-wpm"),
        }
    }

    async fn fetch_progress(&self) -> ApiResult<ProgressResponse> {
        match &self.state().progress {
            Some(progress) => Ok(progress.clone()),
            None => unavailable("api/user-progress"),
        }
    }

    async fn ask_chatbot(&self, query: &str) -> ApiResult<String> {
        let mut state = self.state();
        state.chat_queries.push(query.to_string());
        match &state.chat_reply {
            Some(reply) => Ok(reply.clone()),
            None => unavailable("api/chatbot-query"),
        }
    }
}
