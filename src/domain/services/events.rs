#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use std::sync::Arc;

use tokio::sync::mpsc;

use super::ExplorerCache;
use super::RefreshStatus;
use crate::domain::models::Event;
use crate::domain::models::UserStatus;

/// Consumes status and explorer notifications, keeping the explorer in step
/// with the session.
pub struct EventsService {
    explorer: Arc<ExplorerCache>,
    events: mpsc::UnboundedReceiver<Event>,
}

impl EventsService {
    pub fn new(explorer: Arc<ExplorerCache>, events: mpsc::UnboundedReceiver<Event>) -> EventsService {
        return EventsService { explorer, events };
    }

    async fn handle(&self, event: Event) {
        match event {
            Event::StatusChanged(UserStatus::SignedIn, username) => {
                match self.explorer.refresh().await {
                    RefreshStatus::Loaded(courses) => {
                        tracing::debug!(username = ?username, courses, "Explorer refreshed after sign in");
                    }
                    status => {
                        tracing::warn!(username = ?username, status = ?status, "Explorer refresh after sign in did not load");
                    }
                }
            }
            Event::StatusChanged(UserStatus::SignedOut, _) => {
                self.explorer.clear().await;
            }
            Event::ExplorerChanged(id) => {
                tracing::debug!(id = ?id, "Explorer changed");
            }
        }
    }

    /// Handles everything already queued without waiting for more.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle(event).await;
            handled += 1;
        }

        return handled;
    }

    /// Handles events until every sender has been dropped.
    pub async fn start(&mut self) {
        while let Some(event) = self.events.recv().await {
            self.handle(event).await;
        }
    }
}
