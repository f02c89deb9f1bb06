use docgrab_core::{format_remaining, Completion, DocumentRef, Event, QueueView};

/// One human-readable status line per event.
///
/// `items` is the list the session started, so progress lines name their
/// document even after the queue has moved on or reset. `view` is the live
/// queue snapshot and is only read for pause events: the driver publishes the
/// paused view before reporting the event, and active time stands still until
/// resume.
pub fn render_event(event: &Event, items: &[DocumentRef], view: &QueueView) -> String {
    match event {
        Event::DownloadProgress {
            current,
            total,
            remaining_time_ms,
        } => {
            let mut line = format!(
                "[{current}/{total}] about {} left",
                format_remaining(*remaining_time_ms)
            );
            if let Some(next) = items.get(*current) {
                line.push_str(&format!(" - {}", next.name));
            }
            line
        }
        Event::DownloadComplete(Completion::All { count }) => {
            format!("Done: processed {count} document(s)")
        }
        Event::DownloadComplete(Completion::Single { name }) => format!("Saved {name}"),
        Event::PauseDownloadUi => format!(
            "Paused after {} of downloading. Enter `r` to resume or `c` to cancel.",
            format_remaining(view.active_elapsed_ms)
        ),
        Event::ResumeDownloadUi => "Resumed.".to_string(),
        Event::Error { message } => format!("Error: {message}"),
    }
}

pub const CONTROLS_HINT: &str = "Controls: `p` pause, `r` resume, `c` cancel";
