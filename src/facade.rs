use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use crate::calendar::calendar::sort_by_title;
use crate::calendar::{
    AuthorizationStatus, Calendar, CalendarDraft, EventStore, FetchId,
    FetchOutcome, Predicate, Reminder, ReminderDraft,
};
use crate::error::{Error, ItemKind, Result};
use crate::executor::{main_queue, submit, Background, Executor, MainLoop};
use crate::observer::{Observer, StoreEvent};

/// Handle to an issued reminder fetch.
#[derive(Debug, Clone)]
pub struct FetchToken {
    id: FetchId,
    cancelled: Arc<AtomicBool>,
}

impl FetchToken {
    pub fn id(&self) -> FetchId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Facade over an [`EventStore`].
///
/// Every operation that touches the store returns immediately. The store call
/// runs on the background executor and the outcome is delivered on the main
/// executor, first to the completion passed in and then, for authorization and
/// mutations, to the observer.
pub struct Reminders {
    store: Arc<dyn EventStore>,
    background: Arc<dyn Executor>,
    main: Arc<dyn Executor>,
    observer: Observer,
    next_fetch: AtomicU64,
}

impl Reminders {
    pub fn new(
        store: Arc<dyn EventStore>,
        background: impl Executor,
        main: impl Executor,
    ) -> Self {
        Self {
            store,
            background: Arc::new(background),
            main: Arc::new(main),
            observer: Observer::default(),
            next_fetch: AtomicU64::new(1),
        }
    }

    /// Background work on the current tokio runtime; deliveries on the
    /// returned loop.
    pub fn with_current_runtime(store: Arc<dyn EventStore>) -> Result<(Self, MainLoop)> {
        let background = Background::current()?;
        let (queue, main_loop) = main_queue();
        Ok((Self::new(store, background, queue), main_loop))
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Register the listener for outcome events, replacing any previous one.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        self.observer.subscribe()
    }

    fn dispatch<T, W, R>(&self, work: W, resume: R)
    where
        T: Send + 'static,
        W: FnOnce(&dyn EventStore) -> T + Send + 'static,
        R: FnOnce(T) + Send + 'static,
    {
        let store = self.store.clone();
        submit(
            self.background.as_ref(),
            self.main.clone(),
            move || work(store.as_ref()),
            resume,
        );
    }

    // Authorization

    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.store.authorization_status()
    }

    pub fn request_authorization<F>(&self, completion: F)
    where
        F: FnOnce(AuthorizationStatus) + Send + 'static,
    {
        tracing::debug!("requesting reminders access");
        let observer = self.observer.clone();
        self.dispatch(
            |store| match store.request_access() {
                Ok(true) => AuthorizationStatus::Authorized,
                Ok(false) => AuthorizationStatus::Denied,
                Err(err) => {
                    tracing::warn!(%err, "access request failed");
                    AuthorizationStatus::Denied
                }
            },
            move |status| {
                tracing::info!(?status, "reminders access decided");
                completion(status);
                observer.notify(StoreEvent::StatusChanged(status));
                observer.notify(match status {
                    AuthorizationStatus::Authorized => StoreEvent::Authorized,
                    AuthorizationStatus::Denied => StoreEvent::Denied,
                });
            },
        );
    }

    // Predicates

    pub fn predicate_for_reminders(&self, calendars: Option<&[Calendar]>) -> Predicate {
        Predicate::reminders_in(calendars)
    }

    pub fn predicate_for_incomplete(
        &self,
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<&[Calendar]>,
    ) -> Predicate {
        Predicate::incomplete(starting, ending, calendars)
    }

    pub fn predicate_for_completed(
        &self,
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<&[Calendar]>,
    ) -> Predicate {
        Predicate::completed(starting, ending, calendars)
    }

    // Queries

    /// All reminder lists, sorted by title.
    pub fn calendars<F>(&self, completion: F)
    where
        F: FnOnce(Vec<Calendar>) + Send + 'static,
    {
        self.dispatch(
            |store| {
                let mut calendars = store.calendars();
                sort_by_title(&mut calendars);
                calendars
            },
            completion,
        );
    }

    /// Fetch reminders matching `predicate`. A store that answers with no
    /// result delivers an empty list. A cancelled fetch never calls back.
    pub fn reminders_matching<F>(&self, predicate: Predicate, completion: F) -> FetchToken
    where
        F: FnOnce(Vec<Reminder>) + Send + 'static,
    {
        let token = FetchToken {
            id: FetchId(self.next_fetch.fetch_add(1, Ordering::Relaxed)),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        tracing::debug!(id = token.id.0, ?predicate, "fetching reminders");

        let worker = token.clone();
        let receiver = token.clone();
        self.dispatch(
            move |store| {
                if worker.is_cancelled() {
                    return FetchOutcome::Cancelled;
                }
                store.fetch_reminders(worker.id, &predicate)
            },
            move |outcome| match outcome {
                FetchOutcome::Completed(found) if !receiver.is_cancelled() => {
                    completion(found.unwrap_or_default());
                }
                _ => tracing::debug!(id = receiver.id.0, "fetch cancelled"),
            },
        );
        token
    }

    pub fn reminders_in<F>(&self, calendars: Option<&[Calendar]>, completion: F) -> FetchToken
    where
        F: FnOnce(Vec<Reminder>) + Send + 'static,
    {
        self.reminders_matching(self.predicate_for_reminders(calendars), completion)
    }

    pub fn incomplete<F>(
        &self,
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<&[Calendar]>,
        completion: F,
    ) -> FetchToken
    where
        F: FnOnce(Vec<Reminder>) + Send + 'static,
    {
        let predicate = self.predicate_for_incomplete(starting, ending, calendars);
        self.reminders_matching(predicate, completion)
    }

    pub fn completed<F>(
        &self,
        starting: Option<DateTime<Local>>,
        ending: Option<DateTime<Local>>,
        calendars: Option<&[Calendar]>,
        completion: F,
    ) -> FetchToken
    where
        F: FnOnce(Vec<Reminder>) + Send + 'static,
    {
        let predicate = self.predicate_for_completed(starting, ending, calendars);
        self.reminders_matching(predicate, completion)
    }

    pub fn cancel(&self, token: &FetchToken) {
        if !token.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!(id = token.id.0, "cancelling fetch");
            self.store.cancel_fetch(token.id);
        }
    }

    // Reminder lists

    pub fn create_calendar<F>(&self, title: impl Into<String>, completion: F)
    where
        F: FnOnce(Result<Calendar>) + Send + 'static,
    {
        let title = title.into();
        tracing::debug!(%title, "creating reminder list");
        let observer = self.observer.clone();
        self.dispatch(
            move |store| {
                let draft = CalendarDraft {
                    title,
                    source: store.default_source(),
                };
                store.save_calendar(&draft)
            },
            move |result| {
                if let Err(err) = &result {
                    tracing::warn!(%err, "creating reminder list failed");
                }
                completion(result.clone());
                observer.notify(StoreEvent::CalendarCreated(result));
            },
        );
    }

    pub fn remove_calendar<F>(&self, identifier: impl Into<String>, completion: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let identifier = identifier.into();
        tracing::debug!(%identifier, "removing reminder list");
        let observer = self.observer.clone();
        self.dispatch(
            move |store| {
                let outcome = store
                    .calendar(&identifier)
                    .map(|calendar| store.remove_calendar(&calendar));
                (identifier, outcome)
            },
            move |(identifier, outcome)| match outcome {
                // The listener only hears about removals that reached the store.
                None => completion(Err(Error::not_found(ItemKind::Calendar, identifier))),
                Some(result) => {
                    if let Err(err) = &result {
                        tracing::warn!(%identifier, %err, "removing reminder list failed");
                    }
                    completion(result.clone());
                    observer.notify(StoreEvent::CalendarRemoved { identifier, result });
                }
            },
        );
    }

    // Reminders

    /// Create a reminder in `draft.calendar_id`. Priority defaults to none.
    pub fn create_reminder<F>(&self, mut draft: ReminderDraft, completion: F)
    where
        F: FnOnce(Result<Reminder>) + Send + 'static,
    {
        draft.priority = Some(draft.priority.unwrap_or_default());
        tracing::debug!(title = %draft.title, calendar = %draft.calendar_id, "creating reminder");
        let observer = self.observer.clone();
        self.dispatch(
            move |store| store.save_reminder(&draft),
            move |result| {
                if let Err(err) = &result {
                    tracing::warn!(%err, "creating reminder failed");
                }
                completion(result.clone());
                observer.notify(StoreEvent::ReminderCreated(result));
            },
        );
    }

    pub fn remove_reminder<F>(&self, identifier: impl Into<String>, completion: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let identifier = identifier.into();
        tracing::debug!(%identifier, "removing reminder");
        let observer = self.observer.clone();
        self.dispatch(
            move |store| {
                let outcome = store
                    .reminder(&identifier)
                    .map(|reminder| store.remove_reminder(&reminder));
                (identifier, outcome)
            },
            move |(identifier, outcome)| match outcome {
                None => completion(Err(Error::not_found(ItemKind::Reminder, identifier))),
                Some(result) => {
                    if let Err(err) = &result {
                        tracing::warn!(%identifier, %err, "removing reminder failed");
                    }
                    completion(result.clone());
                    observer.notify(StoreEvent::ReminderRemoved { identifier, result });
                }
            },
        );
    }

    /// Mark a reminder complete or incomplete. Unknown identifiers are
    /// reported to the completion only, as with removal.
    pub fn set_completed<F>(&self, identifier: impl Into<String>, completed: bool, completion: F)
    where
        F: FnOnce(Result<Reminder>) + Send + 'static,
    {
        let identifier = identifier.into();
        tracing::debug!(%identifier, completed, "updating reminder");
        let observer = self.observer.clone();
        self.dispatch(
            move |store| {
                let outcome = store
                    .reminder(&identifier)
                    .map(|reminder| store.set_completed(&reminder, completed));
                (identifier, outcome)
            },
            move |(identifier, outcome)| match outcome {
                None => completion(Err(Error::not_found(ItemKind::Reminder, identifier))),
                Some(result) => {
                    if let Err(err) = &result {
                        tracing::warn!(%identifier, %err, "updating reminder failed");
                    }
                    completion(result.clone());
                    observer.notify(StoreEvent::ReminderUpdated(result));
                }
            },
        );
    }
}
