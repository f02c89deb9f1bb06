use crate::eta::remaining_time_ms;
use crate::view_model::QueueView;
use crate::DocumentRef;

/// Generation counter for batches; stale messages carry an older value.
pub type BatchId = u64;

/// Milliseconds since the Unix epoch, supplied by the caller's clock.
pub type Millis = u64;

/// Pause between the end of one item and the start of the next.
pub const DEFAULT_INTER_ITEM_DELAY_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueuePhase {
    #[default]
    Idle,
    Running,
    Paused,
}

/// The one batch a controller owns. Only [`crate::update`] mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueState {
    phase: QueuePhase,
    items: Vec<DocumentRef>,
    cursor: usize,
    total_count: usize,
    batch: BatchId,
    in_flight: bool,
    step_scheduled: bool,
    started_at: Millis,
    pause_started_at: Option<Millis>,
    paused_total: Millis,
    inter_item_delay_ms: u64,
}

impl Default for QueueState {
    fn default() -> Self {
        Self::with_inter_item_delay(DEFAULT_INTER_ITEM_DELAY_MS)
    }
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inter_item_delay(inter_item_delay_ms: u64) -> Self {
        Self {
            phase: QueuePhase::Idle,
            items: Vec::new(),
            cursor: 0,
            total_count: 0,
            batch: 0,
            in_flight: false,
            step_scheduled: false,
            started_at: 0,
            pause_started_at: None,
            paused_total: 0,
            inter_item_delay_ms,
        }
    }

    pub fn phase(&self) -> QueuePhase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn items(&self) -> &[DocumentRef] {
        &self.items
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn batch(&self) -> BatchId {
        self.batch
    }

    pub fn is_paused(&self) -> bool {
        self.phase == QueuePhase::Paused
    }

    pub fn inter_item_delay_ms(&self) -> u64 {
        self.inter_item_delay_ms
    }

    pub fn remaining_time_ms(&self) -> u64 {
        remaining_time_ms(self.total_count, self.cursor)
    }

    /// Time spent running the current batch, excluding pauses.
    pub fn active_elapsed_ms(&self, now: Millis) -> Millis {
        if self.phase == QueuePhase::Idle {
            return 0;
        }
        let current_pause = self
            .pause_started_at
            .map_or(0, |paused_at| now.saturating_sub(paused_at));
        now.saturating_sub(self.started_at)
            .saturating_sub(self.paused_total)
            .saturating_sub(current_pause)
    }

    pub fn view(&self, now: Millis) -> QueueView {
        QueueView {
            phase: self.phase,
            cursor: self.cursor,
            total: self.total_count,
            items: self.items.clone(),
            remaining_time_ms: self.remaining_time_ms(),
            active_elapsed_ms: self.active_elapsed_ms(now),
        }
    }

    /// Drop the current batch. The generation counter and configuration survive
    /// so that late messages from the dropped batch stay recognisable.
    pub(crate) fn reset(&mut self) {
        let batch = self.batch;
        *self = Self::with_inter_item_delay(self.inter_item_delay_ms);
        self.batch = batch;
    }

    pub(crate) fn begin_batch(
        &mut self,
        items: Vec<DocumentRef>,
        total_count: Option<usize>,
        started_at: Millis,
    ) -> BatchId {
        self.reset();
        self.batch += 1;
        self.total_count = total_count.filter(|n| *n > 0).unwrap_or(items.len());
        self.items = items;
        self.started_at = started_at;
        self.phase = QueuePhase::Running;
        self.batch
    }

    pub(crate) fn is_current(&self, batch: BatchId) -> bool {
        self.phase != QueuePhase::Idle && self.batch == batch
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub(crate) fn current_item(&self) -> Option<&DocumentRef> {
        self.items.get(self.cursor)
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }

    pub(crate) fn step_scheduled(&self) -> bool {
        self.step_scheduled
    }

    pub(crate) fn set_step_scheduled(&mut self, scheduled: bool) {
        self.step_scheduled = scheduled;
    }

    pub(crate) fn advance(&mut self) {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
    }

    pub(crate) fn pause(&mut self, at: Millis) {
        self.phase = QueuePhase::Paused;
        self.pause_started_at = Some(at);
    }

    pub(crate) fn resume(&mut self, at: Millis) {
        if let Some(paused_at) = self.pause_started_at.take() {
            self.paused_total += at.saturating_sub(paused_at);
        }
        self.phase = QueuePhase::Running;
    }
}
