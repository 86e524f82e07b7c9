use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::calendar::{AuthorizationStatus, Calendar, Reminder};
use crate::error::Result;

/// Outcome notifications broadcast to the registered listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    StatusChanged(AuthorizationStatus),
    Authorized,
    Denied,
    CalendarCreated(Result<Calendar>),
    CalendarRemoved {
        identifier: String,
        result: Result<()>,
    },
    ReminderCreated(Result<Reminder>),
    ReminderRemoved {
        identifier: String,
        result: Result<()>,
    },
    ReminderUpdated(Result<Reminder>),
}

/// Slot for at most one listener.
///
/// An empty slot, or a listener whose receiver was dropped, swallows events.
#[derive(Debug, Clone, Default)]
pub struct Observer {
    slot: Arc<Mutex<Option<mpsc::UnboundedSender<StoreEvent>>>>,
}

impl Observer {
    fn slot(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<StoreEvent>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new listener, replacing any previous one.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.slot() = Some(tx);
        rx
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }

    pub fn is_registered(&self) -> bool {
        self.slot().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn notify(&self, event: StoreEvent) {
        let mut slot = self.slot();
        let Some(tx) = slot.as_ref() else {
            return;
        };
        if tx.send(event).is_err() {
            tracing::debug!("observer receiver dropped, clearing listener");
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_without_listener_is_silent() {
        let observer = Observer::default();
        assert!(!observer.is_registered());
        observer.notify(StoreEvent::Authorized);
    }

    #[test]
    fn new_listener_replaces_old_one() {
        let observer = Observer::default();
        let mut first = observer.subscribe();
        let mut second = observer.subscribe();

        observer.notify(StoreEvent::Denied);

        assert!(first.try_recv().is_err());
        assert_eq!(second.try_recv().unwrap(), StoreEvent::Denied);
    }

    #[test]
    fn dropped_receiver_unregisters() {
        let observer = Observer::default();
        drop(observer.subscribe());
        assert!(!observer.is_registered());
        observer.notify(StoreEvent::Authorized);
        assert!(observer.slot().is_none());
    }

    #[test]
    fn clones_share_the_slot() {
        let observer = Observer::default();
        let mut rx = observer.clone().subscribe();
        observer.notify(StoreEvent::StatusChanged(AuthorizationStatus::Authorized));
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::StatusChanged(AuthorizationStatus::Authorized)
        );
        observer.clear();
        assert!(!observer.is_registered());
    }
}
