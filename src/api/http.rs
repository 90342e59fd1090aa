use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::types::*;
use super::Backend;

const USER_AGENT: &str = concat!("typemaster/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed implementation of the backend contract
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|_| ApiError::BaseUrl(base_url.to_string()))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: "client",
                source,
            })?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, endpoint: &'static str) -> ApiResult<Url> {
        self.base
            .join(endpoint)
            .map_err(|_| ApiError::BaseUrl(format!("{}{}", self.base, endpoint)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        debug!(endpoint, "GET");
        let resp = self
            .client
            .get(self.url(endpoint)?)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        decode(endpoint, resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> ApiResult<T> {
        let resp = self.post(endpoint, body).await?;
        decode(endpoint, resp).await
    }

    /// POST where only the status matters; an empty or odd body is still an ack
    async fn post_ack<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> ApiResult<Ack> {
        let resp = self.post(endpoint, body).await?;
        let resp = check_status(endpoint, resp)?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        Ok(serde_json::from_slice(&bytes).unwrap_or_default())
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> ApiResult<Response> {
        debug!(endpoint, "POST");
        self.client
            .post(self.url(endpoint)?)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })
    }
}

fn check_status(endpoint: &'static str, resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

async fn decode<T: DeserializeOwned>(endpoint: &'static str, resp: Response) -> ApiResult<T> {
    let resp = check_status(endpoint, resp)?;
    let bytes = resp
        .bytes()
        .await
        .map_err(|source| ApiError::Transport { endpoint, source })?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
        endpoint,
        message: e.to_string(),
    })
}

impl Backend for HttpBackend {
    async fn fetch_text(&self, difficulty: Difficulty) -> ApiResult<String> {
        let resp: TextResponse = self
            .get_json("api/get-text", &[("difficulty", difficulty.to_string())])
            .await?;
        Ok(resp.text)
    }

    async fn fetch_lesson(&self, lesson_id: &str) -> ApiResult<Lesson> {
        self.get_json("api/get-lesson", &[("lesson_id", lesson_id.to_string())])
            .await
    }

    async fn fetch_words(&self, count: usize, difficulty: Difficulty) -> ApiResult<Vec<String>> {
        let resp: WordsResponse = self
            .get_json(
                "api/game-words",
                &[
                    ("count", count.to_string()),
                    ("difficulty", difficulty.to_string()),
                ],
            )
            .await?;
        Ok(resp.words)
    }

    async fn submit_test(&self, request: SubmitTestRequest) -> ApiResult<TestAnalysis> {
        self.post_json("api/submit-test", &request).await
    }

    async fn submit_lesson(&self, request: LessonProgressRequest) -> ApiResult<Ack> {
        self.post_ack("api/update-lesson-progress", &request).await
    }

    async fn submit_game(&self, request: GameSubmission) -> ApiResult<Ack> {
        self.post_ack("api/submit-game", &request).await
    }

    async fn predict_wpm(&self, request: PredictRequest) -> ApiResult<PredictResponse> {
        self.post_json("api/predict-wpm", &request).await
    }

    async fn fetch_progress(&self) -> ApiResult<ProgressResponse> {
        self.get_json("api/user-progress", &[]).await
    }

    async fn ask_chatbot(&self, query: &str) -> ApiResult<String> {
        let resp: ChatResponse = self
            .post_json(
                "api/chatbot-query",
                &ChatRequest {
                    query: query.to_string(),
                },
            )
            .await?;
        Ok(resp.response)
    }
}
