use std::sync::Arc;

use chrono::{Duration, Local};
use color_eyre::eyre::Result;
use remindkit::{DateComponents, EventStore, MemoryStore, Priority, ReminderDraft};

use crate::config::Backend;

/// Open the event store the config asks for.
pub fn open(backend: Backend) -> Result<Arc<dyn EventStore>> {
    match backend {
        Backend::Memory => Ok(Arc::new(demo_store()?)),
        Backend::EventKit | Backend::Auto => open_platform(backend),
    }
}

#[cfg(target_os = "macos")]
fn open_platform(_backend: Backend) -> Result<Arc<dyn EventStore>> {
    Ok(Arc::new(remindkit::EventKitStore::new()?))
}

#[cfg(not(target_os = "macos"))]
fn open_platform(backend: Backend) -> Result<Arc<dyn EventStore>> {
    if backend == Backend::EventKit {
        color_eyre::eyre::bail!("the EventKit backend is only available on macOS");
    }
    tracing::warn!("EventKit unavailable on this platform, using the in-memory demo store");
    Ok(Arc::new(demo_store()?))
}

/// In-memory store with a couple of lists to browse.
fn demo_store() -> Result<MemoryStore> {
    let store = MemoryStore::new();
    let today = Local::now().date_naive();

    let groceries = store.insert_calendar("Groceries");
    store.insert_reminder(&ReminderDraft::new("Milk", &groceries))?;
    store.insert_reminder(
        &ReminderDraft::new("Coffee beans", &groceries)
            .priority(Priority::High)
            .due(DateComponents::date(today)),
    )?;

    let work = store.insert_calendar("Work");
    store.insert_reminder(
        &ReminderDraft::new("Send quarterly report", &work)
            .priority(Priority::Medium)
            .due(DateComponents::date(today + Duration::days(2)))
            .notes("Numbers are in the shared drive"),
    )?;
    let filed = store.insert_reminder(&ReminderDraft::new("File expenses", &work))?;
    store.set_completed(&filed, true)?;

    Ok(store)
}
