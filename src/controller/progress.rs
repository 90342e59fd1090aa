use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::NO_DATA;
use crate::api::{ApiResult, Backend, PredictRequest, PredictResponse, ProgressResponse};
use crate::dispatch::Dispatcher;
use crate::keystroke::KeystrokeLog;
use crate::progress::{ProgressReport, SpeedForecast};
use crate::view::{Presenter, ViewEvent};

#[derive(Debug)]
pub enum ProgressReply {
    History(ApiResult<ProgressResponse>),
    Forecast(ApiResult<PredictResponse>),
}

/// Fetches history and a speed forecast for the dashboard
pub struct ProgressController<B: Backend> {
    backend: Arc<B>,
    dispatcher: Dispatcher<ProgressReply>,
    report: Option<ProgressReport>,
    forecast: Option<SpeedForecast>,
}

impl<B: Backend> ProgressController<B> {
    pub fn new(backend: Arc<B>, handle: Handle) -> Self {
        Self {
            backend,
            dispatcher: Dispatcher::new(handle),
            report: None,
            forecast: None,
        }
    }

    pub fn report(&self) -> Option<&ProgressReport> {
        self.report.as_ref()
    }

    pub fn forecast(&self) -> Option<SpeedForecast> {
        self.forecast
    }

    pub fn refresh<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        self.dispatcher.begin_generation();
        presenter.present(ViewEvent::Status("Loading progress...".into()));

        let backend = Arc::clone(&self.backend);
        self.dispatcher
            .spawn(async move { ProgressReply::History(backend.fetch_progress().await) });

        // an empty attempt asks for a forecast from history alone
        let request = PredictRequest {
            partial_text: String::new(),
            elapsed_seconds: 0.0,
            keystroke_log: KeystrokeLog::new(),
        };
        let backend = Arc::clone(&self.backend);
        self.dispatcher
            .spawn(async move { ProgressReply::Forecast(backend.predict_wpm(request).await) });
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

    fn apply<P: Presenter + ?Sized>(&mut self, reply: ProgressReply, presenter: &mut P) {
        match reply {
            ProgressReply::History(history) => {
                self.report = match history {
                    Ok(resp) => ProgressReport::from_response(&resp),
                    Err(e) => {
                        warn!(error = %e, "failed to load progress");
                        None
                    }
                };
                presenter.present(ViewEvent::Progress(self.report.clone()));
                if self.report.is_none() {
                    presenter.present(ViewEvent::Status(NO_DATA.into()));
                }
            }
            ProgressReply::Forecast(prediction) => {
                match &prediction {
                    Ok(p) => debug!(predicted = p.predicted_wpm, "speed forecast"),
                    Err(e) => warn!(error = %e, "speed forecast failed"),
                }
                let forecast = SpeedForecast::from_reply(&prediction);
                self.forecast = Some(forecast);
                presenter.present(ViewEvent::Forecast(forecast));
            }
        }
    }
}
