//! Session registry mapping chat identifiers to live dialogs.
//!
//! One registry instance exists per channel; it owns creation-on-first-
//! contact and hands each new session to its own eviction watcher.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dialog::{Dialog, StateSet};
use crate::messenger::Messenger;

use super::watcher;

// ============================================================================
// Types
// ============================================================================

/// How a session's inactivity is policed.
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    /// How often each watcher re-checks its session.
    pub poll_interval: Duration,
    /// Inactivity span after which a session is evicted.
    pub idle_timeout: Duration,
}

pub(crate) struct SessionEntry {
    pub(crate) dialog: Arc<Mutex<Dialog>>,
    /// Handle of this session's eviction watcher, joined on shutdown.
    pub(crate) watcher: JoinHandle<()>,
}

/// Registry of live dialogs for one channel.
///
/// Thread-safe and cheap to clone. Lookups and insertions for different
/// chats never block each other; per-dialog serialization happens through
/// the `Mutex` each entry wraps its dialog in.
#[derive(Clone)]
pub struct SessionRegistry {
    channel: String,
    sessions: Arc<DashMap<String, SessionEntry>>,
    states: Arc<StateSet>,
    messenger: Arc<dyn Messenger>,
    eviction: EvictionPolicy,
    /// Shutdown signal sender.
    shutdown_tx: Arc<watch::Sender<bool>>,
    /// Shutdown signal receiver (cloned for each watcher).
    shutdown_rx: watch::Receiver<bool>,
}

// ============================================================================
// Implementation
// ============================================================================

impl SessionRegistry {
    pub fn new(
        channel: impl Into<String>,
        states: Arc<StateSet>,
        messenger: Arc<dyn Messenger>,
        eviction: EvictionPolicy,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            channel: channel.into(),
            sessions: Arc::new(DashMap::new()),
            states,
            messenger,
            eviction,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Look up the dialog for `chat_id`, creating it on first contact.
    ///
    /// Racing callers for the same never-seen chat converge on a single
    /// dialog with exactly one watcher; the loser of the insert race never
    /// spawns anything.
    pub fn get_or_create(&self, chat_id: &str) -> Arc<Mutex<Dialog>> {
        if let Some(entry) = self.sessions.get(chat_id) {
            return entry.dialog.clone();
        }

        match self.sessions.entry(chat_id.to_string()) {
            Entry::Occupied(occupied) => occupied.get().dialog.clone(),
            Entry::Vacant(vacant) => {
                let dialog = Arc::new(Mutex::new(Dialog::new(
                    self.channel.clone(),
                    chat_id,
                    self.states.clone(),
                    self.messenger.clone(),
                )));
                let watcher = watcher::spawn(
                    self.channel.clone(),
                    chat_id.to_string(),
                    dialog.clone(),
                    self.sessions.clone(),
                    self.eviction,
                    self.shutdown_rx.clone(),
                );
                debug!(channel = %self.channel, chat_id = %chat_id, "created session");
                vacant.insert(SessionEntry {
                    dialog: dialog.clone(),
                    watcher,
                });
                dialog
            }
        }
    }

    /// Check if a session exists.
    pub fn contains(&self, chat_id: &str) -> bool {
        self.sessions.contains_key(chat_id)
    }

    /// Get the number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Signal all watchers to stop and wait for them to finish.
    ///
    /// Watchers interrupted by shutdown return without evicting; their
    /// sessions are dropped here along with the map.
    pub async fn shutdown(&self) {
        info!(channel = %self.channel, "shutting down session registry");

        if self.shutdown_tx.send(true).is_err() {
            return;
        }

        let keys: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, entry)) = self.sessions.remove(&key) {
                let _ = entry.watcher.await;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
