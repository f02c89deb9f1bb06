//! Interactive runs of the engine from a terminal.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use docgrab_core::{Command, Completion, DocumentRef, Event};
use docgrab_engine::{CommandSender, EngineHandle};
use engine_logging::{engine_info, engine_warn};

use crate::platform::config::AppConfig;
use crate::platform::render::{render_event, CONTROLS_HINT};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Read a JSON array of `{ "pk": ..., "name": ... }` objects.
pub fn load_items(path: &Path) -> Result<Vec<DocumentRef>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read items {path:?}"))?;
    let items: Vec<DocumentRef> = serde_json::from_str(&content)
        .with_context(|| format!("items file {path:?} is not a JSON list of documents"))?;
    Ok(items)
}

/// Map a line typed by the user to a queue control.
pub fn parse_control(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Command::PauseDownload),
        "r" | "resume" => Some(Command::ResumeDownload),
        "c" | "cancel" | "q" | "quit" => Some(Command::CancelDownload),
        _ => None,
    }
}

pub fn run_batch(
    config: &AppConfig,
    items: Vec<DocumentRef>,
    total: Option<usize>,
) -> Result<()> {
    let handle = EngineHandle::new(config.engine_config())?;
    let cancelled = Arc::new(AtomicBool::new(false));
    spawn_control_reader(handle.commands(), cancelled.clone());

    engine_info!(
        "Downloading {} document(s) into {:?}",
        items.len(),
        config.output_dir
    );
    println!("{CONTROLS_HINT}");
    let started = items.clone();
    handle.start(items, total);

    loop {
        if cancelled.load(Ordering::SeqCst) {
            println!("Cancelled.");
            break;
        }
        let Some(event) = handle.recv_timeout(POLL_INTERVAL) else {
            continue;
        };
        println!("{}", render_event(&event, &started, &handle.view()));
        if matches!(event, Event::DownloadComplete(Completion::All { .. })) {
            break;
        }
    }

    handle.shutdown();
    Ok(())
}

pub fn run_single(config: &AppConfig, document: DocumentRef) -> Result<()> {
    let handle = EngineHandle::new(config.engine_config())?;
    let view = handle.view();
    let requested = [document.clone()];
    handle.download_single(document);

    let events = handle.finish();
    if events.is_empty() {
        // Failures other than a missing credential are only logged.
        println!("Download failed; see the log for details.");
    }
    for event in &events {
        println!("{}", render_event(event, &requested, &view));
    }
    Ok(())
}

fn spawn_control_reader(commands: CommandSender, cancelled: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_control(&line) {
                Some(command) => {
                    let cancel = matches!(command, Command::CancelDownload);
                    if !commands.send(command) {
                        break;
                    }
                    if cancel {
                        cancelled.store(true, Ordering::SeqCst);
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => engine_warn!("Unknown control `{}`; {}", line.trim(), CONTROLS_HINT),
            }
        }
    });
}
