use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use docgrab_core::{Command, DocumentRef, Event, QueueView};
use engine_logging::engine_error;
use thiserror::Error;
use tokio::sync::{mpsc as async_mpsc, watch};

use crate::driver::{Clock, DriverSettings, QueueDriver};
use crate::{
    ApiFetcher, ChannelReporter, ConflictPolicy, CredentialProvider, CredentialSource,
    DirectorySink, Downloader, FetchError, FetchSettings, JsonFileCredentialStore,
    NoCredentialSource,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid fetch settings: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
}

#[derive(Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub output_dir: PathBuf,
    pub conflict: ConflictPolicy,
    pub credential_cache: PathBuf,
    pub credential_source: Arc<dyn CredentialSource>,
    pub inter_item_delay: Duration,
    pub clock: Clock,
}

impl EngineConfig {
    /// Defaults with downloads going to `output_dir` and the credential cached
    /// next to them.
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        let credential_cache = output_dir.join(".docgrab_credentials.json");
        let driver = DriverSettings::default();
        Self {
            fetch: FetchSettings::default(),
            output_dir,
            conflict: ConflictPolicy::default(),
            credential_cache,
            credential_source: Arc::new(NoCredentialSource),
            inter_item_delay: driver.inter_item_delay,
            clock: driver.clock,
        }
    }

    pub fn build_downloader(&self) -> Result<Downloader, FetchError> {
        let credentials = CredentialProvider::new(
            Arc::new(JsonFileCredentialStore::new(self.credential_cache.clone())),
            self.credential_source.clone(),
        );
        let fetcher = ApiFetcher::new(self.fetch.clone())?;
        let sink = DirectorySink::new(self.output_dir.clone(), self.conflict);
        Ok(Downloader::new(
            credentials,
            Arc::new(fetcher),
            Arc::new(sink),
        ))
    }
}

/// Cloneable way to reach the driver from other threads.
///
/// Holds a weak sender: only the [`EngineHandle`] keeps the driver running.
#[derive(Clone)]
pub struct CommandSender {
    tx: async_mpsc::WeakUnboundedSender<Command>,
}

impl CommandSender {
    /// Returns `false` once the driver has stopped or the handle is gone.
    pub fn send(&self, command: Command) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }
}

/// Runs a [`QueueDriver`] on its own thread; talk to it with commands, read
/// events back on the calling thread.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<Command>,
    event_rx: mpsc::Receiver<Event>,
    views: watch::Receiver<QueueView>,
    worker: thread::JoinHandle<()>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let downloader = config.build_downloader()?;
        let settings = DriverSettings {
            inter_item_delay: config.inter_item_delay,
            clock: config.clock.clone(),
        };
        Self::with_downloader(downloader, settings)
    }

    pub fn with_downloader(
        downloader: Downloader,
        settings: DriverSettings,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        let driver = QueueDriver::new(
            downloader,
            Arc::new(ChannelReporter::new(event_tx)),
            settings,
        );
        let views = driver.subscribe();

        let worker = thread::Builder::new()
            .name("docgrab-queue".to_string())
            .spawn(move || runtime.block_on(driver.run(cmd_rx)))?;

        Ok(Self {
            cmd_tx,
            event_rx,
            views,
            worker,
        })
    }

    pub fn send(&self, command: Command) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn commands(&self) -> CommandSender {
        CommandSender {
            tx: self.cmd_tx.downgrade(),
        }
    }

    pub fn start(&self, items: Vec<DocumentRef>, total_items: Option<usize>) {
        self.send(Command::DownloadAll {
            items,
            total_items,
            start_time: None,
        });
    }

    pub fn pause(&self) {
        self.send(Command::PauseDownload);
    }

    pub fn resume(&self) {
        self.send(Command::ResumeDownload);
    }

    pub fn cancel(&self) {
        self.send(Command::CancelDownload);
    }

    pub fn download_single(&self, document: DocumentRef) {
        self.send(Command::DownloadSingle {
            pk: document.id,
            name: document.name,
        });
    }

    pub fn save_credential(&self, token: impl Into<String>) {
        self.send(Command::SavePrivilegeToken {
            token: token.into(),
        });
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn view(&self) -> QueueView {
        self.views.borrow().clone()
    }

    /// Close the command channel and wait for the in-flight item, if any.
    pub fn shutdown(self) {
        let _ = self.finish();
    }

    /// Like [`shutdown`](Self::shutdown), but hands back the events that were
    /// reported and not yet read. Commands already sent are still handled.
    pub fn finish(self) -> Vec<Event> {
        let Self {
            cmd_tx,
            event_rx,
            worker,
            ..
        } = self;
        drop(cmd_tx);
        if worker.join().is_err() {
            engine_error!("Queue driver thread panicked");
        }
        event_rx.try_iter().collect()
    }
}
