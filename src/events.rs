//! Project change notifications
//!
//! Events carry no payload; listeners re-query the project for current state.

use tokio::sync::broadcast;
use tracing::trace;

const CHANNEL_CAPACITY: usize = 64;

/// Something about the project changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectEvent {
    /// The package set was rebuilt
    Reloaded,
    /// The sync status moved to a different value
    StatusChanged,
    /// The manifest was created, removed, rewritten or changed on disk
    ManifestChanged,
}

/// Broadcast bus shared by the components of one project
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProjectEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.sender.subscribe()
    }

    /// Emit `event` to every current subscriber
    pub fn emit(&self, event: ProjectEvent) {
        // No subscribers is not an error
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(?event, receivers, "event emitted");
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(ProjectEvent::Reloaded);
        bus.emit(ProjectEvent::StatusChanged);

        assert_eq!(first.recv().await.unwrap(), ProjectEvent::Reloaded);
        assert_eq!(first.recv().await.unwrap(), ProjectEvent::StatusChanged);
        assert_eq!(second.recv().await.unwrap(), ProjectEvent::Reloaded);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(ProjectEvent::ManifestChanged);
        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }
}
