use std::sync::Arc;

use tarteel_core::model::{LessonSize, Progress, ProgressDraft, ReviewScore};
use tarteel_core::quran::SurahIndex;

use super::plan::{SessionBuilder, SessionPhase};
use super::service::{SessionService, TransitionOutcome};
use crate::Clock;
use crate::content::PortionLoader;
use crate::error::SessionError;
use crate::progress_store::ProgressStore;

/// Result of one rating or approval within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAnswerResult {
    pub phase: SessionPhase,
    pub is_complete: bool,
    /// Whether content for the next step is already available.
    pub content_ready: bool,
}

/// Orchestrates setup, session start and persisted transitions.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    store: ProgressStore,
    loader: Arc<dyn PortionLoader>,
    surahs: Arc<dyn SurahIndex>,
    lesson_size: LessonSize,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        store: ProgressStore,
        loader: Arc<dyn PortionLoader>,
        surahs: Arc<dyn SurahIndex>,
    ) -> Self {
        Self {
            clock,
            store,
            loader,
            surahs,
            lesson_size: LessonSize::default(),
        }
    }

    #[must_use]
    pub fn with_lesson_size(mut self, lesson_size: LessonSize) -> Self {
        self.lesson_size = lesson_size;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn lesson_size(&self) -> LessonSize {
        self.lesson_size
    }

    /// Stored progress, or `None` before setup.
    pub async fn load_progress(&self) -> Option<Progress> {
        self.store.load().await
    }

    /// First-time setup: validates the starting point and persists it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyInitialized` if progress exists, or
    /// `SessionError::Progress` for an invalid starting point.
    pub async fn begin(&self, draft: ProgressDraft) -> Result<Progress, SessionError> {
        if self.store.load().await.is_some() {
            return Err(SessionError::AlreadyInitialized);
        }
        self.reset(draft).await
    }

    /// Replaces any stored progress with a fresh starting point.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Progress` for an invalid starting point.
    pub async fn reset(&self, draft: ProgressDraft) -> Result<Progress, SessionError> {
        let progress = draft.validate(self.clock.today(), self.surahs.as_ref())?;
        self.store.save(&progress).await;
        tracing::info!(
            surah = %progress.current_surah(),
            ayah_index = progress.current_ayah_index(),
            "progress initialised"
        );
        Ok(progress)
    }

    /// Builds today's session from stored progress and loads the content of
    /// its first step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInitialized` before setup, or the builder's
    /// errors for a record it cannot plan from.
    pub async fn start_session(&self) -> Result<SessionService, SessionError> {
        let progress = self
            .store
            .load()
            .await
            .ok_or(SessionError::NotInitialized)?;
        let builder =
            SessionBuilder::new(Arc::clone(&self.surahs)).with_lesson_size(self.lesson_size);
        let mut session = SessionService::new(builder, progress, self.clock.today())?;

        let summary = session.session_progress();
        tracing::info!(
            phase = %summary.phase,
            due = summary.queue_len,
            today = %session.today(),
            "session built"
        );

        self.reload_content(&mut session).await;
        Ok(session)
    }

    /// Fetches content for the current step if it is still missing.
    ///
    /// Fetch failures leave the session loading; returns whether content is
    /// available afterwards.
    pub async fn reload_content(&self, session: &mut SessionService) -> bool {
        let Some(request) = session.content_request() else {
            return !session.is_loading();
        };

        match self.loader.load_portion(&request.range).await {
            Ok(content) => {
                let accepted = session.resolve_content(request.ticket, content);
                if !accepted {
                    tracing::debug!(
                        ticket = request.ticket,
                        portion = %request.range.id(),
                        "discarding stale portion content"
                    );
                }
                accepted
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    portion = %request.range.id(),
                    "failed to load portion content"
                );
                false
            }
        }
    }

    /// Rates the current step, persists the new progress and loads the next
    /// step's content.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the rating does not apply right now; the
    /// session and the stored progress are then unchanged.
    pub async fn rate(
        &self,
        session: &mut SessionService,
        score: ReviewScore,
    ) -> Result<SessionAnswerResult, SessionError> {
        let outcome = session.rate(score)?;
        Ok(self.commit(session, outcome).await)
    }

    /// Sabaqi pass/fail, persisted.
    ///
    /// # Errors
    ///
    /// See [`SessionLoopService::rate`].
    pub async fn rate_recitation(
        &self,
        session: &mut SessionService,
        passed: bool,
    ) -> Result<SessionAnswerResult, SessionError> {
        let outcome = session.rate_recitation(passed)?;
        Ok(self.commit(session, outcome).await)
    }

    /// Approves today's lesson, persisted.
    ///
    /// # Errors
    ///
    /// See [`SessionLoopService::rate`].
    pub async fn approve(
        &self,
        session: &mut SessionService,
    ) -> Result<SessionAnswerResult, SessionError> {
        let outcome = session.approve()?;
        Ok(self.commit(session, outcome).await)
    }

    async fn commit(
        &self,
        session: &mut SessionService,
        outcome: TransitionOutcome,
    ) -> SessionAnswerResult {
        self.store.save(&outcome.progress).await;
        let content_ready = self.reload_content(session).await;
        SessionAnswerResult {
            phase: outcome.phase,
            is_complete: session.is_complete(),
            content_ready,
        }
    }
}
