use super::plan::SessionPhase;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: SessionPhase,
    /// Zero-based position in the Dhor queue; 0 outside Dhor.
    pub queue_position: usize,
    pub queue_len: usize,
    /// Portions rated during Dhor so far.
    pub reviewed: usize,
    pub is_complete: bool,
}
