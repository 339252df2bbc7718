#![forbid(unsafe_code)]

pub mod content;
pub mod error;
pub mod progress_store;
pub mod sessions;

pub use tarteel_core::Clock;
pub use sessions as session;

pub use content::{AlQuranCloudLoader, PortionContent, PortionLoader, Verse};
pub use error::{ContentError, SessionError};
pub use progress_store::ProgressStore;

pub use sessions::{
    SessionAnswerResult, SessionBuilder, SessionLoopService, SessionPhase, SessionProgress,
    SessionService, SessionView,
};
