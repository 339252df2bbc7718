use std::sync::Arc;

use storage::repository::ProgressRepository;
use tarteel_core::model::Progress;

/// Tolerant facade over the progress repository.
///
/// Reads that fail are reported as "no progress yet" and failed writes are
/// only logged: the previous record stays intact and the next session starts
/// from it.
#[derive(Clone)]
pub struct ProgressStore {
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted progress, or `None` if absent or unreadable.
    pub async fn load(&self) -> Option<Progress> {
        match self.repo.get_progress().await {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!(error = %err, "progress record unreadable; treating as absent");
                None
            }
        }
    }

    /// Persist progress, logging instead of failing.
    pub async fn save(&self, progress: &Progress) {
        if let Err(err) = self.repo.save_progress(progress).await {
            tracing::warn!(error = %err, "failed to persist progress");
        }
    }
}
