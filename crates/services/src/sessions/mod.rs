mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPhase, SessionState};
pub use progress::SessionProgress;
pub use service::{ContentRequest, SessionService, TransitionOutcome};
pub use view::SessionView;
pub use workflow::{SessionAnswerResult, SessionLoopService};
