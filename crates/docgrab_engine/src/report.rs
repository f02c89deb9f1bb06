use std::sync::mpsc;

use docgrab_core::Event;

/// Receives lifecycle and progress events from the queue driver.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: Event);
}

impl<F> ProgressReporter for F
where
    F: Fn(Event) + Send + Sync,
{
    fn report(&self, event: Event) {
        self(event)
    }
}

/// Forwards events to a std channel, for consumers on a plain thread.
pub struct ChannelReporter {
    tx: mpsc::Sender<Event>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: Event) {
        // A vanished receiver just means nobody is watching any more.
        let _ = self.tx.send(event);
    }
}
