use crate::{BatchId, DocumentRef, Event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Forward an event to the progress reporter.
    Notify(Event),
    /// Download one document, then answer with [`crate::Msg::ItemFinished`].
    FetchItem {
        batch: BatchId,
        index: usize,
        document: DocumentRef,
    },
    /// Answer with [`crate::Msg::StepDue`] after `delay_ms`.
    ScheduleStep { batch: BatchId, delay_ms: u64 },
}
