mod ids;
mod lesson;
mod portion;
mod progress;
mod review;

pub use ids::{IdError, PortionId, SURAH_COUNT, SurahNumber};
pub use lesson::{LessonSize, LessonSizeError};
pub use portion::{Portion, PortionError, PortionRange};
pub use progress::{Progress, ProgressDraft, ProgressError};
pub use review::{ReviewScore, ReviewScoreError};
