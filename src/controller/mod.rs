//! Controllers glue a tracker, the backend and a presenter together.
//!
//! Each one owns its tracker and a [`Dispatcher`](crate::dispatch::Dispatcher).
//! The event loop feeds them input and ticks, then calls `poll` so backend
//! replies are folded in on the same thread. Backend failures never stop a
//! session; they only turn into one of the messages below.

pub mod chat;
pub mod game;
pub mod lesson;
pub mod progress;

use std::time::Duration;

pub use chat::ChatController;
pub use game::GameController;
pub use lesson::LessonController;
pub use progress::ProgressController;
pub use test::TestController;

pub const TEXT_ERROR: &str = "Error loading text. Please try again.";
pub const LESSON_ERROR: &str = "Error loading lesson. Please try again.";
pub const ANALYSIS_ERROR: &str = "Error analyzing your test results. Please try again.";
pub const PREDICTION_UNAVAILABLE: &str = "Prediction unavailable";
pub const NO_DATA: &str = "No data available";

/// When live predictions are requested during a test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionTiming {
    /// No prediction before this much of the test has elapsed
    pub delay: Duration,
    pub interval: Duration,
}

impl Default for PredictionTiming {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            interval: Duration::from_secs(5),
        }
    }
}

impl PredictionTiming {
    /// Due when past the delay and at least one interval after the last request
    pub fn is_due(&self, elapsed_secs: f64, last_request_secs: Option<f64>) -> bool {
        if elapsed_secs <= self.delay.as_secs_f64() {
            return false;
        }
        match last_request_secs {
            Some(last) => elapsed_secs - last >= self.interval.as_secs_f64(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_waits_for_delay_then_interval() {
        let timing = PredictionTiming::default();
        assert!(!timing.is_due(3.0, None));
        assert!(!timing.is_due(5.0, None));
        assert!(timing.is_due(5.5, None));
        assert!(!timing.is_due(8.0, Some(5.5)));
        assert!(timing.is_due(10.5, Some(5.5)));
    }
}
