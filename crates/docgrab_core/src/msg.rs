use crate::{BatchId, DocumentRef, Millis};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Replace whatever is queued with a new batch and start walking it.
    StartBatch {
        items: Vec<DocumentRef>,
        /// Caller-reported total; `None` or zero means `items.len()`.
        total_count: Option<usize>,
        started_at: Millis,
    },
    /// User asked to pause at the next item boundary.
    Pause { at: Millis },
    /// User asked to continue a paused batch.
    Resume { at: Millis },
    /// User dropped the batch.
    Cancel,
    /// The inter-item delay for `batch` has elapsed.
    StepDue { batch: BatchId },
    /// The fetch requested by [`crate::Effect::FetchItem`] is over.
    ItemFinished { batch: BatchId, success: bool },
}
