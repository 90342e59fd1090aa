use chrono::NaiveDateTime;
use itertools::Itertools;

use crate::api::{ApiResult, PredictResponse, ProgressResponse};
use crate::util::{mean, moving_average, std_dev};

/// Number of tests in the trend line
pub const TREND_WINDOW: usize = 3;

const TOP_ERRORS: usize = 10;

pub const NEED_MORE_TESTS: &str =
    "Complete more typing tests to receive a personalized speed prediction.";
pub const FORECAST_ERROR: &str = "Unable to generate prediction. Please try again later.";

/// Dashboard numbers derived from the backend's history
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub labels: Vec<String>,
    pub wpm: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub accuracy_labels: Vec<String>,
    pub accuracy: Vec<f64>,
    pub mean_wpm: f64,
    pub best_wpm: f64,
    pub wpm_std_dev: f64,
    pub mean_accuracy: Option<f64>,
    pub top_errors: Vec<(String, u32)>,
    pub total_errors: u64,
}

impl ProgressReport {
    /// `None` when there is no history to show
    pub fn from_response(resp: &ProgressResponse) -> Option<Self> {
        if resp.wpm_history.is_empty() && resp.accuracy_history.is_empty() {
            return None;
        }

        let wpm: Vec<f64> = resp.wpm_history.iter().map(|p| p.wpm).collect();
        let accuracy: Vec<f64> = resp.accuracy_history.iter().map(|p| p.accuracy).collect();
        let labels = resp
            .wpm_history
            .iter()
            .enumerate()
            .map(|(i, p)| label_for(i, p.timestamp))
            .collect();
        let accuracy_labels = resp
            .accuracy_history
            .iter()
            .enumerate()
            .map(|(i, p)| label_for(i, p.timestamp))
            .collect();

        // prefer the aggregated counts, fall back to raw character errors
        let source = if resp.error_statistics.most_common_errors.is_empty() {
            &resp.error_statistics.character_errors
        } else {
            &resp.error_statistics.most_common_errors
        };
        let top_errors = source
            .iter()
            .map(|(pattern, count)| (pattern.clone(), *count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .take(TOP_ERRORS)
            .collect();

        Some(Self {
            labels,
            accuracy_labels,
            trend: moving_average(&wpm, TREND_WINDOW),
            mean_wpm: mean(&wpm).unwrap_or(0.0),
            best_wpm: wpm.iter().copied().fold(0.0, f64::max),
            wpm_std_dev: std_dev(&wpm).unwrap_or(0.0),
            mean_accuracy: mean(&accuracy),
            wpm,
            accuracy,
            top_errors,
            total_errors: resp.error_statistics.total_errors,
        })
    }

    /// Difference between the last trend value and the first one
    pub fn trend_change(&self) -> Option<f64> {
        let mut values = self.trend.iter().flatten();
        let first = *values.next()?;
        let last = values.last().copied().unwrap_or(first);
        Some(last - first)
    }

    pub fn tests_taken(&self) -> usize {
        self.wpm.len()
    }
}

/// Speed forecast shown under the progress charts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedForecast {
    Forecast {
        current_wpm: f64,
        predicted_wpm: f64,
        /// Whole percent, only when the prediction beats the current speed
        improvement_pct: Option<i64>,
    },
    NeedMoreTests,
    Unavailable,
}

impl SpeedForecast {
    pub fn from_reply(reply: &ApiResult<PredictResponse>) -> Self {
        let Ok(resp) = reply else {
            return SpeedForecast::Unavailable;
        };
        if resp.predicted_wpm <= 0.0 {
            return SpeedForecast::NeedMoreTests;
        }
        let improvement = if resp.current_wpm > 0.0 {
            ((resp.predicted_wpm - resp.current_wpm) / resp.current_wpm * 100.0).round() as i64
        } else {
            0
        };
        SpeedForecast::Forecast {
            current_wpm: resp.current_wpm,
            predicted_wpm: resp.predicted_wpm,
            improvement_pct: (improvement > 0).then_some(improvement),
        }
    }
}

fn label_for(index: usize, timestamp: Option<NaiveDateTime>) -> String {
    match timestamp {
        Some(ts) => ts.format("%Y-%m-%d").to_string(),
        None => format!("Test {}", index + 1),
    }
}
