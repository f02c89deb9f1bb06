use crate::{DocumentRef, QueuePhase};

/// Read-only snapshot of the queue for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueView {
    pub phase: QueuePhase,
    pub cursor: usize,
    pub total: usize,
    pub items: Vec<DocumentRef>,
    pub remaining_time_ms: u64,
    pub active_elapsed_ms: u64,
}
