//! Newline-delimited JSON bridge: commands on stdin, events on stdout.
//!
//! The host keeps stdin open for as long as the session lasts. Closing it lets
//! the in-flight document finish, flushes pending events and exits.
//!
//! The host is also the page the credential lives in. When nothing is cached
//! the engine writes `{"action":"getPrivilegeToken"}` and waits for a
//! `{"token": ...}` line on stdin.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use docgrab_core::{Command, PageRequest, TokenResponse};
use docgrab_engine::{CommandSender, Credential, CredentialSource, EngineHandle, SourceError};
use engine_logging::{engine_debug, engine_info, engine_warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::platform::config::AppConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long a credential request waits for the page before giving up.
pub const PAGE_TOKEN_TIMEOUT: Duration = Duration::from_secs(5);

/// One line read from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeInput {
    Command(Command),
    Token(TokenResponse),
}

/// Blank lines are skipped. A line with an `action` is a command; a line with
/// only a `token` answers the last credential request.
pub fn parse_input_line(line: &str) -> Result<Option<BridgeInput>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(line)?;
    if value.get("action").is_none() && value.get("token").is_some() {
        return serde_json::from_value(value).map(|reply| Some(BridgeInput::Token(reply)));
    }
    serde_json::from_value(value).map(|command| Some(BridgeInput::Command(command)))
}

pub fn write_message(out: &mut impl Write, message: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, message)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn lock<W>(out: &Mutex<W>) -> MutexGuard<'_, W> {
    out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The credential request waiting for the page's answer, if any.
#[derive(Clone, Default)]
pub struct TokenRequests {
    waiting: Arc<Mutex<Option<oneshot::Sender<TokenResponse>>>>,
}

impl TokenRequests {
    fn register(&self) -> oneshot::Receiver<TokenResponse> {
        let (tx, rx) = oneshot::channel();
        *lock(&self.waiting) = Some(tx);
        rx
    }

    /// Hand a reply to the waiting request. `false` when nobody asked.
    pub fn deliver(&self, reply: TokenResponse) -> bool {
        match lock(&self.waiting).take() {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// The page is gone; fail the waiting request now.
    pub fn close(&self) {
        lock(&self.waiting).take();
    }
}

/// Asks the host page for the credential over the bridge.
pub struct PageCredentialSource<W> {
    out: Arc<Mutex<W>>,
    requests: TokenRequests,
    timeout: Duration,
}

impl<W> PageCredentialSource<W> {
    pub fn new(out: Arc<Mutex<W>>, requests: TokenRequests, timeout: Duration) -> Self {
        Self {
            out,
            requests,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl<W: Write + Send + 'static> CredentialSource for PageCredentialSource<W> {
    async fn extract(&self) -> Result<Option<Credential>, SourceError> {
        let reply = self.requests.register();
        write_message(&mut *lock(&self.out), &PageRequest::GetPrivilegeToken)
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;

        match tokio::time::timeout(self.timeout, reply).await {
            Ok(Ok(reply)) => Ok(reply.token.and_then(Credential::new)),
            Ok(Err(_)) => Err(SourceError::Unavailable("page closed the bridge".into())),
            Err(_) => {
                self.requests.close();
                Err(SourceError::Unavailable(format!(
                    "page did not answer within {:?}",
                    self.timeout
                )))
            }
        }
    }
}

pub fn run(config: &AppConfig) -> Result<()> {
    let out = Arc::new(Mutex::new(io::stdout()));
    let requests = TokenRequests::default();

    let mut engine_config = config.engine_config();
    engine_config.credential_source = Arc::new(PageCredentialSource::new(
        out.clone(),
        requests.clone(),
        PAGE_TOKEN_TIMEOUT,
    ));
    let handle = EngineHandle::new(engine_config)?;

    let input_closed = Arc::new(AtomicBool::new(false));
    spawn_input_reader(handle.commands(), requests, input_closed.clone());
    engine_info!("Bridge ready; reading commands from stdin");

    while !input_closed.load(Ordering::SeqCst) {
        if let Some(event) = handle.recv_timeout(POLL_INTERVAL) {
            write_message(&mut *lock(&out), &event)?;
        }
    }

    for event in handle.finish() {
        write_message(&mut *lock(&out), &event)?;
    }
    engine_info!("Bridge input closed");
    Ok(())
}

fn spawn_input_reader(
    commands: CommandSender,
    requests: TokenRequests,
    input_closed: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    engine_warn!("Failed to read bridge input: {}", err);
                    break;
                }
            };
            match parse_input_line(&line) {
                Ok(Some(BridgeInput::Command(command))) => {
                    engine_debug!("Bridge command {:?}", command);
                    if !commands.send(command) {
                        break;
                    }
                }
                Ok(Some(BridgeInput::Token(reply))) => {
                    if !requests.deliver(reply) {
                        engine_warn!("Ignoring credential reply nobody asked for");
                    }
                }
                Ok(None) => {}
                Err(err) => engine_warn!("Ignoring malformed bridge input: {}", err),
            }
        }
        requests.close();
        input_closed.store(true, Ordering::SeqCst);
    });
}
