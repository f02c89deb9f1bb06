//! Async executor for the batch state machine.
//!
//! The driver is the only owner of [`QueueState`]. Commands arrive through a
//! single-consumer channel and are handled between loop steps, so a command
//! sent while a document is in flight waits until that document is done.
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use docgrab_core::{
    update, BatchId, Command, DocumentRef, Effect, Event, Millis, Msg, QueueState, QueueView,
    DEFAULT_INTER_ITEM_DELAY_MS,
};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use crate::{Credential, Downloader, ProgressReporter};

/// Shown to the user when a single download finds no credential.
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication failed. Please log in first.";

/// Wall clock in Unix milliseconds. Injected so tests can pin time.
pub type Clock = Arc<dyn Fn() -> Millis + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Millis)
            .unwrap_or(0)
    })
}

#[derive(Clone)]
pub struct DriverSettings {
    pub inter_item_delay: Duration,
    pub clock: Clock,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            inter_item_delay: Duration::from_millis(DEFAULT_INTER_ITEM_DELAY_MS),
            clock: system_clock(),
        }
    }
}

pub struct QueueDriver {
    state: QueueState,
    downloader: Downloader,
    reporter: Arc<dyn ProgressReporter>,
    clock: Clock,
    pending: VecDeque<Effect>,
    scheduled: Option<(Instant, BatchId)>,
    view_tx: watch::Sender<QueueView>,
}

impl QueueDriver {
    pub fn new(
        downloader: Downloader,
        reporter: Arc<dyn ProgressReporter>,
        settings: DriverSettings,
    ) -> Self {
        let delay_ms = settings.inter_item_delay.as_millis() as u64;
        let state = QueueState::with_inter_item_delay(delay_ms);
        let (view_tx, _) = watch::channel(state.view((settings.clock)()));
        Self {
            state,
            downloader,
            reporter,
            clock: settings.clock,
            pending: VecDeque::new(),
            scheduled: None,
            view_tx,
        }
    }

    /// Latest queue snapshot, refreshed after every state change.
    pub fn subscribe(&self) -> watch::Receiver<QueueView> {
        self.view_tx.subscribe()
    }

    /// Process commands until every sender is dropped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            self.drain_effects().await;

            let deadline = self.scheduled.map(|(at, _)| at);
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((_, batch)) = self.scheduled.take() {
                        self.apply(Msg::StepDue { batch });
                    }
                }
            }
        }
        engine_info!("Command channel closed; queue driver stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        let now = (self.clock)();
        match command {
            Command::DownloadAll {
                items,
                total_items,
                start_time,
            } => {
                engine_info!(
                    "Starting batch of {} documents (reported total {:?})",
                    items.len(),
                    total_items
                );
                let started_at = start_time.filter(|t| *t > 0).unwrap_or(now);
                self.apply(Msg::StartBatch {
                    items,
                    total_count: total_items,
                    started_at,
                });
            }
            Command::PauseDownload => {
                engine_info!("Pause requested at item {}", self.state.cursor());
                self.apply(Msg::Pause { at: now });
            }
            Command::ResumeDownload => {
                engine_info!("Resume requested at item {}", self.state.cursor());
                self.apply(Msg::Resume { at: now });
            }
            Command::CancelDownload => {
                engine_info!("Cancel requested at item {}", self.state.cursor());
                self.apply(Msg::Cancel);
            }
            Command::DownloadSingle { pk, name } => {
                self.download_single(DocumentRef::new(pk, name)).await;
            }
            Command::SavePrivilegeToken { token } => match Credential::new(token) {
                Some(credential) => self.downloader.credentials().save_credential(&credential),
                None => engine_warn!("Ignoring empty credential from page"),
            },
        }
    }

    async fn download_single(&mut self, document: DocumentRef) {
        match self.downloader.download(&document).await {
            Ok(_) => self.reporter.report(Event::single_complete(document.name)),
            Err(err) if err.kind.is_authentication() => {
                engine_warn!("Single download of {} needs a credential", document.id);
                self.reporter.report(Event::Error {
                    message: AUTH_REQUIRED_MESSAGE.to_string(),
                });
            }
            Err(err) => engine_error!("Error downloading document id={}: {}", document.id, err),
        }
    }

    async fn drain_effects(&mut self) {
        while let Some(effect) = self.pending.pop_front() {
            match effect {
                Effect::Notify(event) => {
                    engine_debug!("Reporting {:?}", event);
                    self.reporter.report(event);
                }
                Effect::FetchItem {
                    batch,
                    index,
                    document,
                } => {
                    engine_debug!("Batch {} item {}: fetching {}", batch, index, document.id);
                    let success = self.downloader.download_document(&document).await;
                    self.apply(Msg::ItemFinished { batch, success });
                }
                Effect::ScheduleStep { batch, delay_ms } => {
                    let at = Instant::now() + Duration::from_millis(delay_ms);
                    self.scheduled = Some((at, batch));
                }
            }
        }
    }

    fn apply(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.pending.extend(effects);
        self.view_tx.send_replace(self.state.view((self.clock)()));
    }
}
