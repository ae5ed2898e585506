//! Defines an abstraction over the event sending mechanism.

use super::events::EngineEvent;
use tokio::sync::mpsc::UnboundedSender;

/// A trait that abstracts the sending of engine events.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: EngineEvent);
}

/// Implement the trait for a tokio channel feeding the UI thread.
impl EventProxy for UnboundedSender<EngineEvent> {
    fn send_event(&self, event: EngineEvent) {
        // A closed receiver means the UI is gone; the engine keeps working.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to send event to UI: {}", e);
        }
    }
}
