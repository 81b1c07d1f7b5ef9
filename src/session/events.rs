use tokio::sync::broadcast;

/// Session transitions. `Expired` and `LoggedOut` mean "send the user to the
/// login entry point"; the HTTP client raises them and a single top-level
/// listener (see `guard::Navigator`) acts on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    Expired { reason: String },
    LoggedOut,
}

#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self { tx }
    }

    pub fn emit(&self, event: SessionEvent) {
        tracing::debug!("session event: {:?}", event);
        // nobody listening is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
