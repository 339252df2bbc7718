use tarteel_core::model::{Portion, PortionRange};

use super::plan::SessionPhase;
use super::progress::SessionProgress;
use super::service::SessionService;
use crate::content::PortionContent;

/// Presentation-agnostic snapshot of a running session.
///
/// Holds no formatted strings; the front end decides how to show verse
/// references, dates and scores.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: SessionPhase,
    /// Verse range of the current step; `None` once done.
    pub range: Option<PortionRange>,
    /// The approved portion under review, during Dhor only.
    pub review: Option<Portion>,
    /// `None` while the content is still loading.
    pub content: Option<PortionContent>,
    pub progress: SessionProgress,
}

impl SessionView {
    #[must_use]
    pub fn from_session(session: &SessionService) -> Self {
        Self {
            phase: session.phase(),
            range: session.current_range().cloned(),
            review: session.current_review().cloned(),
            content: session.content().cloned(),
            progress: session.session_progress(),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.range.is_some() && self.content.is_none()
    }
}
