//! Client and session identity, with inactivity-based session rotation.

use std::cell::RefCell;
use std::rc::Rc;

use beaconkit_core::time::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::KeyValueStoreHandle;

/// A session's identity and activity bookkeeping, persisted as a whole so a
/// reload can tell how long the session has actually been idle.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    id: String,
    started_at_ms: i64,
    last_activity_at_ms: i64,
}

/// Owns client and session identity, persisting both through an optional
/// [`super::store::KeyValueStore`] and rotating the session after
/// `inactivity_timeout_ms` of silence.
///
/// Storage is best-effort: per spec, a failure to read or write the backing
/// store never surfaces as an error, it just falls back to an in-memory
/// session/client id for the rest of the page's lifetime.
pub struct SessionManager {
    session_key: String,
    client_key: String,
    inactivity_timeout_ms: i64,
    clock: Rc<dyn Clock>,
    store: RefCell<Option<KeyValueStoreHandle>>,
    record: RefCell<SessionRecord>,
    client_id: RefCell<String>,
}

impl SessionManager {
    /// Build a session manager, loading (or minting) a persisted client id
    /// and starting a fresh session.
    ///
    /// `store` is optional: when `None` (or when every read/write against it
    /// fails), the manager still functions, just without persistence across
    /// page loads.
    #[must_use]
    pub fn new(
        session_storage_key: impl Into<String>,
        inactivity_timeout_ms: i64,
        clock: Rc<dyn Clock>,
        store: Option<KeyValueStoreHandle>,
    ) -> Self {
        let session_key = session_storage_key.into();
        let client_key = format!("{session_key}_client");

        let client_id = store
            .as_ref()
            .and_then(|s| s.get(&client_key).ok().flatten())
            .unwrap_or_else(Self::generate_anonymous_client_id);

        if let Some(s) = store.as_ref() {
            let _ = s.set(&client_key, &client_id);
        }

        let now = clock.now_ms();
        let manager = Self {
            session_key,
            client_key,
            inactivity_timeout_ms,
            clock,
            store: RefCell::new(store),
            record: RefCell::new(SessionRecord {
                id: Uuid::new_v4().to_string(),
                started_at_ms: now,
                last_activity_at_ms: now,
            }),
            client_id: RefCell::new(client_id),
        };

        manager.restore_or_start_session();
        manager
    }

    fn generate_anonymous_client_id() -> String {
        format!("anon-{}", Uuid::new_v4())
    }

    fn restore_or_start_session(&self) {
        let persisted = self
            .store
            .borrow()
            .as_ref()
            .and_then(|s| s.get(&self.session_key).ok().flatten())
            .and_then(|raw| serde_json::from_str::<SessionRecord>(&raw).ok());

        match persisted {
            Some(record) => {
                let now = self.clock.now_ms();
                if now - record.last_activity_at_ms > self.inactivity_timeout_ms {
                    self.start_new_session();
                } else {
                    *self.record.borrow_mut() = record;
                }
            }
            None => self.persist_record(),
        }
    }

    fn persist_record(&self) {
        let record = self.record.borrow().clone();
        if let Some(store) = self.store.borrow().as_ref() {
            if let Ok(encoded) = serde_json::to_string(&record) {
                let _ = store.set(&self.session_key, &encoded);
            }
        }
    }

    /// The current session id.
    #[must_use]
    pub fn get_session_id(&self) -> String {
        self.record.borrow().id.clone()
    }

    /// The current client id, stable across sessions unless overridden.
    #[must_use]
    pub fn get_client_id(&self) -> String {
        self.client_id.borrow().clone()
    }

    /// Explicitly override the client id, persisting it immediately.
    pub fn set_client_id(&self, client_id: impl Into<String>) {
        let client_id = client_id.into();
        if let Some(store) = self.store.borrow().as_ref() {
            let _ = store.set(&self.client_key, &client_id);
        }
        *self.client_id.borrow_mut() = client_id;
    }

    /// Mint a fresh session id, resetting activity bookkeeping, and persist
    /// it. Returns the new session id.
    pub fn start_new_session(&self) -> String {
        let now = self.clock.now_ms();
        let id = Uuid::new_v4().to_string();
        *self.record.borrow_mut() = SessionRecord {
            id: id.clone(),
            started_at_ms: now,
            last_activity_at_ms: now,
        };
        self.persist_record();
        id
    }

    /// Clear the persisted session entirely and start a fresh one.
    pub fn clear_session(&self) {
        if let Some(store) = self.store.borrow().as_ref() {
            let _ = store.remove(&self.session_key);
        }
        self.start_new_session();
    }

    /// Bump the session's last-activity timestamp to now, persisting it so a
    /// reload can measure idle time from the right instant.
    pub fn update_activity(&self) {
        self.record.borrow_mut().last_activity_at_ms = self.clock.now_ms();
        self.persist_record();
    }

    /// Check whether the session has been inactive past the configured
    /// timeout; if so, rotate it and return `true`. Called before every
    /// enrichment so a stale session never leaks into an emitted event.
    pub fn check_session_expired(&self) -> bool {
        let elapsed = self.clock.now_ms() - self.record.borrow().last_activity_at_ms;
        if elapsed > self.inactivity_timeout_ms {
            self.start_new_session();
            true
        } else {
            false
        }
    }
}
