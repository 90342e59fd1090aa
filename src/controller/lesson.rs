use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::LESSON_ERROR;
use crate::api::{ApiResult, Backend, Lesson, LessonProgressRequest};
use crate::clock::{Clock, SystemClock};
use crate::dispatch::Dispatcher;
use crate::session::{InputOutcome, Session, SessionMode, SessionResult};
use crate::view::{Presenter, ViewEvent};

/// Guided lesson: fetch, start on demand, report completion
pub struct LessonController<B: Backend, C: Clock = SystemClock> {
    backend: Arc<B>,
    dispatcher: Dispatcher<ApiResult<Lesson>>,
    session: Session<C>,
    lesson: Option<Lesson>,
}

impl<B: Backend> LessonController<B, SystemClock> {
    pub fn new(backend: Arc<B>, handle: Handle) -> Self {
        Self::with_clock(backend, handle, SystemClock)
    }
}

impl<B: Backend, C: Clock> LessonController<B, C> {
    pub fn with_clock(backend: Arc<B>, handle: Handle, clock: C) -> Self {
        Self {
            backend,
            dispatcher: Dispatcher::new(handle),
            session: Session::with_clock(SessionMode::Lesson, clock),
            lesson: None,
        }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn lesson(&self) -> Option<&Lesson> {
        self.lesson.as_ref()
    }

    pub fn load_lesson<P: Presenter + ?Sized>(&mut self, lesson_id: &str, presenter: &mut P) {
        self.dispatcher.begin_generation();
        self.session.cancel();
        presenter.present(ViewEvent::Status("Loading lesson...".into()));

        let backend = Arc::clone(&self.backend);
        let lesson_id = lesson_id.to_string();
        self.dispatcher
            .spawn(async move { backend.fetch_lesson(&lesson_id).await });
    }

    /// Load the lesson `step` positions away from the current numeric id
    pub fn load_adjacent<P: Presenter + ?Sized>(&mut self, step: i64, presenter: &mut P) -> bool {
        let current = self
            .lesson
            .as_ref()
            .and_then(|l| l.id.parse::<i64>().ok())
            .unwrap_or(1);
        let next = current + step;
        if next < 1 {
            return false;
        }
        self.load_lesson(&next.to_string(), presenter);
        true
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

    fn apply<P: Presenter + ?Sized>(&mut self, reply: ApiResult<Lesson>, presenter: &mut P) {
        match reply {
            Ok(lesson) => {
                debug!(id = %lesson.id, title = %lesson.title, "lesson loaded");
                self.lesson = Some(lesson.clone());
                presenter.present(ViewEvent::LessonLoaded(lesson));
                presenter.present(ViewEvent::ClearInput);
                presenter.present(ViewEvent::Status("Press Enter to start".into()));
            }
            Err(e) => {
                if e.is_status(404) {
                    warn!(error = %e, "no such lesson");
                } else {
                    warn!(error = %e, "failed to load lesson");
                }
                presenter.present(ViewEvent::Status(LESSON_ERROR.into()));
            }
        }
    }

    /// Start (or restart) the loaded lesson. False when nothing is loaded.
    pub fn start<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> bool {
        let Some(lesson) = &self.lesson else {
            return false;
        };
        self.session.start(lesson.content.clone());
        presenter.present(ViewEvent::LessonLoaded(lesson.clone()));
        presenter.present(ViewEvent::ClearInput);
        true
    }

    pub fn on_input<P: Presenter + ?Sized>(&mut self, typed: &str, presenter: &mut P) {
        let (mismatch, completed) = match self.session.record_input(typed) {
            InputOutcome::Ignored => return,
            InputOutcome::Matching => (None, None),
            InputOutcome::Mismatch { position } => (Some(position), None),
            InputOutcome::Completed(result) => (None, Some(result)),
        };
        presenter.present(ViewEvent::InputState {
            mismatch,
            progress_pct: self.session.progress_pct(),
        });
        if let Some(result) = completed {
            self.complete(result, presenter);
        }
    }

    pub fn on_keystroke(&mut self, key: &str) -> bool {
        self.session.record_keystroke(key)
    }

    pub fn on_tick<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        let elapsed = self.session.elapsed_seconds();
        if let Some(stats) = self.session.tick(elapsed) {
            presenter.present(ViewEvent::Live(stats));
        }
    }

    fn complete<P: Presenter + ?Sized>(&mut self, result: SessionResult, presenter: &mut P) {
        presenter.present(ViewEvent::SessionFinished(result));
        let Some(lesson) = &self.lesson else {
            return;
        };

        let request = LessonProgressRequest {
            lesson_id: lesson.id.clone(),
            completed: true,
            score: result.wpm,
            accuracy: result.accuracy_pct,
        };
        let backend = Arc::clone(&self.backend);
        self.dispatcher.spawn_detached(async move {
            let lesson_id = request.lesson_id.clone();
            match backend.submit_lesson(request).await {
                Ok(_) => info!(%lesson_id, "lesson progress saved"),
                Err(e) => warn!(%lesson_id, error = %e, "failed to save lesson progress"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::clock::ManualClock;
    use crate::session::Phase;
    use std::time::Duration;

    fn lesson(id: &str, content: &str) -> Lesson {
        Lesson {
            id: id.into(),
            title: "Home Row Basics".into(),
            description: "asdf jkl;".into(),
            content: content.into(),
            difficulty: None,
        }
    }

    fn controller(
        backend: MemoryBackend,
    ) -> (LessonController<MemoryBackend, ManualClock>, Arc<MemoryBackend>, ManualClock) {
        let backend = Arc::new(backend);
        let clock = ManualClock::new();
        let ctl = LessonController::with_clock(Arc::clone(&backend), Handle::current(), clock.clone());
        (ctl, backend, clock)
    }

    async fn wait_for_updates(backend: &MemoryBackend, n: usize) {
        for _ in 0..100 {
            if backend.lesson_updates().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn input_before_start_is_ignored() {
        let (mut ctl, _, _) = controller(MemoryBackend::new().with_lesson(lesson("1", "asdf")));
        let mut events: Vec<ViewEvent> = Vec::new();
        ctl.load_lesson("1", &mut events);
        ctl.await_reply(&mut events).await;
        assert_eq!(ctl.lesson().map(|l| l.title.as_str()), Some("Home Row Basics"));

        ctl.on_input("a", &mut events);
        assert_eq!(ctl.session().phase(), Phase::Idle);
        assert!(ctl.start(&mut events));
        assert!(ctl.session().is_active());
    }

    #[tokio::test]
    async fn completion_reports_progress() {
        let (mut ctl, backend, clock) =
            controller(MemoryBackend::new().with_lesson(lesson("1", "asdf jkl;")));
        let mut events: Vec<ViewEvent> = Vec::new();
        ctl.load_lesson("1", &mut events);
        ctl.await_reply(&mut events).await;
        ctl.start(&mut events);

        ctl.on_input("asdf", &mut events);
        assert_eq!(
            events.last(),
            Some(&ViewEvent::InputState {
                mismatch: None,
                progress_pct: 4.0 / 9.0 * 100.0
            })
        );
        clock.advance_secs(3.0);
        ctl.on_input("asdf jkl;", &mut events);

        assert!(matches!(events.last(), Some(ViewEvent::SessionFinished(_))));
        wait_for_updates(&backend, 1).await;
        let updates = backend.lesson_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].lesson_id, "1");
        assert!(updates[0].completed);
        assert_eq!(updates[0].accuracy, 100.0);
        assert_eq!(updates[0].score.round(), 36.0);
    }

    #[tokio::test]
    async fn overflow_counts_as_mismatch() {
        let (mut ctl, _, _) = controller(MemoryBackend::new().with_lesson(lesson("1", "ab")));
        let mut events: Vec<ViewEvent> = Vec::new();
        ctl.load_lesson("1", &mut events);
        ctl.await_reply(&mut events).await;
        ctl.start(&mut events);

        ctl.on_input("a", &mut events);
        ctl.on_input("abc", &mut events);
        assert!(matches!(
            events.last(),
            Some(ViewEvent::InputState {
                mismatch: Some(2),
                ..
            })
        ));
        assert_eq!(ctl.session().error_count(), 1);
        assert_eq!(ctl.session().typed_text(), "ab");
        assert!(ctl.session().is_active());
    }

    #[tokio::test]
    async fn missing_lesson_shows_message() {
        let (mut ctl, _, _) = controller(MemoryBackend::new());
        let mut events: Vec<ViewEvent> = Vec::new();
        ctl.load_lesson("42", &mut events);
        ctl.await_reply(&mut events).await;

        assert_eq!(events.last(), Some(&ViewEvent::Status(LESSON_ERROR.into())));
        assert!(!ctl.start(&mut events));
    }

    #[tokio::test]
    async fn switching_lessons_abandons_the_attempt() {
        let (mut ctl, backend, _) = controller(
            MemoryBackend::new()
                .with_lesson(lesson("1", "asdf"))
                .with_lesson(lesson("2", "jkl;")),
        );
        let mut events: Vec<ViewEvent> = Vec::new();
        ctl.load_lesson("1", &mut events);
        ctl.await_reply(&mut events).await;
        ctl.start(&mut events);
        ctl.on_input("as", &mut events);

        ctl.load_lesson("2", &mut events);
        assert_eq!(ctl.session().phase(), Phase::Finished);
        ctl.await_reply(&mut events).await;

        assert!(!events
            .iter()
            .any(|e| matches!(e, ViewEvent::SessionFinished(_))));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(backend.lesson_updates().is_empty());
    }

    #[tokio::test]
    async fn adjacent_lesson_uses_numeric_id() {
        let (mut ctl, _, _) = controller(
            MemoryBackend::new()
                .with_lesson(lesson("1", "asdf"))
                .with_lesson(lesson("2", "jkl;")),
        );
        let mut events: Vec<ViewEvent> = Vec::new();
        ctl.load_lesson("1", &mut events);
        ctl.await_reply(&mut events).await;

        assert!(!ctl.load_adjacent(-1, &mut events));
        assert!(ctl.load_adjacent(1, &mut events));
        ctl.await_reply(&mut events).await;
        assert_eq!(ctl.lesson().map(|l| l.id.as_str()), Some("2"));
    }
}
