//! Request/response contract with the typing-analysis backend.
//!
//! The client never computes detailed analysis itself: texts, lessons and word
//! pools come from the backend, finished sessions go back to it, and it answers
//! with analysis, predictions and chat replies.

pub mod error;
pub mod http;
pub mod memory;
pub mod types;

use std::future::Future;

pub use error::{ApiError, ApiResult};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use types::*;

/// Every exchange the client has with the backend.
///
/// Implementations must be cheap to share across tasks; the dispatcher holds
/// them behind an `Arc` and calls them from spawned tokio tasks.
pub trait Backend: Send + Sync + 'static {
    fn fetch_text(&self, difficulty: Difficulty) -> impl Future<Output = ApiResult<String>> + Send;

    fn fetch_lesson(&self, lesson_id: &str) -> impl Future<Output = ApiResult<Lesson>> + Send;

    fn fetch_words(
        &self,
        count: usize,
        difficulty: Difficulty,
    ) -> impl Future<Output = ApiResult<Vec<String>>> + Send;

    fn submit_test(
        &self,
        request: SubmitTestRequest,
    ) -> impl Future<Output = ApiResult<TestAnalysis>> + Send;

    fn submit_lesson(
        &self,
        request: LessonProgressRequest,
    ) -> impl Future<Output = ApiResult<Ack>> + Send;

    fn submit_game(&self, request: GameSubmission) -> impl Future<Output = ApiResult<Ack>> + Send;

    fn predict_wpm(
        &self,
        request: PredictRequest,
    ) -> impl Future<Output = ApiResult<PredictResponse>> + Send;

    fn fetch_progress(&self) -> impl Future<Output = ApiResult<ProgressResponse>> + Send;

    fn ask_chatbot(&self, query: &str) -> impl Future<Output = ApiResult<String>> + Send;
}
