//! Docgrab core: the pure batch-queue state machine and its message contract.
mod document;
mod effect;
pub mod eta;
mod msg;
mod protocol;
mod state;
mod update;
mod view_model;

pub use document::{sanitize_filename, DocumentRef, PDF_EXTENSION};
pub use effect::Effect;
pub use eta::{format_remaining, remaining_time_ms};
pub use msg::Msg;
pub use protocol::{Command, Completion, Event, PageRequest, TokenResponse};
pub use state::{BatchId, Millis, QueuePhase, QueueState, DEFAULT_INTER_ITEM_DELAY_MS};
pub use update::update;
pub use view_model::QueueView;
