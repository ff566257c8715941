//! Session state and storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::form::InnForm;
use crate::inn_list::{BroadcastSurface, DEFAULT_CAPACITY, InnList, ResultEntry};

/// Default session timeout (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Renders buffered per subscriber before a slow stream starts lagging.
const STREAM_BUFFER: usize = 16;

/// One page's check state.
///
/// Cheap to clone; clones share the same list and form.
#[derive(Debug, Clone)]
pub struct InnSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    /// Result list; the mutex serializes pushes from concurrent replies.
    list: Mutex<InnList<BroadcastSurface>>,
    /// Subscriber handle onto the list's surface.
    list_surface: BroadcastSurface,
    form: Mutex<InnForm>,
    form_tx: broadcast::Sender<String>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl InnSession {
    /// Create a session with a fresh id and an empty list.
    pub fn new(capacity: usize) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), capacity, Vec::new())
    }

    /// Create a session with a specific id and seed entries.
    pub fn with_id(id: impl Into<String>, capacity: usize, initial: Vec<ResultEntry>) -> Self {
        let surface = BroadcastSurface::new(STREAM_BUFFER);
        let list_surface = surface.clone();
        let (form_tx, _) = broadcast::channel(STREAM_BUFFER);
        let now = Utc::now();

        Self {
            inner: Arc::new(SessionInner {
                id: id.into(),
                list: Mutex::new(InnList::new(surface, initial, capacity)),
                list_surface,
                form: Mutex::new(InnForm::new()),
                form_tx,
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Run `f` with exclusive access to the result list.
    pub fn with_list<R>(&self, f: impl FnOnce(&mut InnList<BroadcastSurface>) -> R) -> R {
        let mut guard = self
            .inner
            .list
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut guard);
        drop(guard);
        self.touch();
        out
    }

    /// Run `f` with exclusive access to the form.
    pub fn with_form<R>(&self, f: impl FnOnce(&mut InnForm) -> R) -> R {
        let mut guard = self
            .inner
            .form
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut guard);
        drop(guard);
        self.touch();
        out
    }

    /// Current list markup, rendered from the entries.
    pub fn list_html(&self) -> String {
        self.with_list(|list| list.markup())
    }

    pub fn form_html(&self) -> String {
        let id = self.inner.id.clone();
        self.with_form(|form| form.render(&id))
    }

    /// Send the current form markup to stream subscribers.
    pub fn publish_form(&self) {
        let html = self.form_html();
        // Nobody listening yet is fine.
        let _ = self.inner.form_tx.send(html);
    }

    pub fn subscribe_list(&self) -> broadcast::Receiver<String> {
        self.inner.list_surface.subscribe()
    }

    pub fn subscribe_form(&self) -> broadcast::Receiver<String> {
        self.inner.form_tx.subscribe()
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    /// Check if the session has been idle longer than `timeout`.
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // Negative means clock skew; treat as fresh.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    /// Get the session age.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.inner.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Thread-safe store for sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, InnSession>>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store whose sessions keep the default number of results.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store whose sessions keep up to `capacity` results each.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                capacity,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Create a new session and return it.
    pub fn create(&self) -> InnSession {
        self.create_with_entries(Vec::new())
    }

    /// Create a new session seeded with `initial` results.
    pub fn create_with_entries(&self, initial: Vec<ResultEntry>) -> InnSession {
        let session = InnSession::with_id(Uuid::new_v4().to_string(), self.inner.capacity, initial);
        let mut guard = self.write();
        guard.insert(session.id().to_string(), session.clone());
        session
    }

    /// Get a session by ID.
    pub fn get(&self, id: &str) -> Option<InnSession> {
        self.read().get(id).cloned()
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<InnSession> {
        self.write().remove(id)
    }

    /// Get the number of active sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions that have been inactive longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, InnSession>> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, InnSession>> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_store() {
        let store = SessionStore::with_capacity(3);

        assert!(store.is_empty());

        let session = store.create();
        assert_eq!(store.len(), 1);
        assert_eq!(session.with_list(|list| list.capacity()), 3);

        let retrieved = store.get(session.id()).unwrap();
        assert_eq!(retrieved.id(), session.id());

        store.remove(session.id());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let session = InnSession::new(DEFAULT_CAPACITY);
        let other = session.clone();

        other.with_list(|list| {
            list.push(ResultEntry::parse("7707083893", "2024-01-01T10:00", true).unwrap());
        });

        assert_eq!(session.with_list(|list| list.len()), 1);
        assert!(session.list_html().contains("7707083893"));
    }

    #[test]
    fn test_seeded_session_is_not_rendered() {
        let store = SessionStore::new();
        let seed = vec![ResultEntry::parse("7707083893", "2024-01-01T10:00", true).unwrap()];
        let session = store.create_with_entries(seed);

        assert_eq!(session.with_list(|list| list.surface().latest()), "");
        assert!(session.list_html().contains("7707083893"));
    }

    #[test]
    fn test_publish_form_reaches_subscribers() {
        let session = InnSession::new(2);
        let mut rx = session.subscribe_form();

        session.with_form(|form| form.submit("short"));
        session.publish_form();

        assert!(rx.try_recv().unwrap().contains("10 или 12"));
    }

    #[test]
    fn test_cleanup_expired() {
        let store = SessionStore::new();
        let _ = store.create();
        let _ = store.create();

        assert_eq!(store.cleanup_expired_with_timeout(DEFAULT_SESSION_TIMEOUT), 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.cleanup_expired_with_timeout(Duration::from_millis(5)), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_age_grows() {
        let session = InnSession::new(1);
        assert!(session.age() < Duration::from_secs(5));
    }
}
