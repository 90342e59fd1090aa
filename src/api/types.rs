use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::keystroke::KeystrokeLog;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordsResponse {
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTestRequest {
    pub original_text: String,
    pub typed_text: String,
    #[serde(rename = "time_taken")]
    pub elapsed_seconds: f64,
    #[serde(rename = "keystroke_data")]
    pub keystroke_log: KeystrokeLog,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordError {
    pub original: String,
    pub typed: String,
    #[serde(default)]
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub word_errors: Vec<WordError>,
    /// `(pattern, count)` pairs such as `("e->r", 3)`
    #[serde(default)]
    pub common_errors: Vec<(String, u32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub status: String,
    #[serde(default)]
    pub current_avg: f64,
    #[serde(default)]
    pub predicted: f64,
    #[serde(default)]
    pub improvement: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Prediction {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Backend verdict on a submitted test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAnalysis {
    pub wpm: f64,
    pub accuracy: f64,
    #[serde(default)]
    pub error_analysis: Option<ErrorAnalysis>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub prediction: Option<Prediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub partial_text: String,
    #[serde(rename = "time_elapsed")]
    pub elapsed_seconds: f64,
    #[serde(rename = "keystroke_data")]
    pub keystroke_log: KeystrokeLog,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictResponse {
    pub predicted_wpm: f64,
    pub current_wpm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgressRequest {
    pub lesson_id: String,
    pub completed: bool,
    pub score: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSubmission {
    pub score: u32,
    pub words_typed: u32,
    pub correct_words: u32,
    pub accuracy: f64,
    pub wpm: f64,
    pub difficulty: Difficulty,
}

/// Acknowledgement body; the backend may send `{}` or `{"status": ...}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WpmPoint {
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    pub wpm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyPoint {
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStatistics {
    #[serde(default)]
    pub character_errors: BTreeMap<String, u32>,
    #[serde(default)]
    pub most_common_errors: BTreeMap<String, u32>,
    #[serde(default)]
    pub total_errors: u64,
    #[serde(default)]
    pub total_characters: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub wpm_history: Vec<WpmPoint>,
    #[serde(default)]
    pub accuracy_history: Vec<AccuracyPoint>,
    #[serde(default)]
    pub error_statistics: ErrorStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
