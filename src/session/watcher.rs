//! Per-session inactivity watcher.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dialog::{Dialog, DialogState};

use super::registry::{EvictionPolicy, SessionEntry};

/// Spawn the eviction watcher for one session.
///
/// Exactly one watcher exists per session for its entire lifetime, and it is
/// the sole owner of that session's removal: no other path takes entries out
/// of the map (shutdown only short-circuits the loop).
pub(crate) fn spawn(
    channel: String,
    chat_id: String,
    dialog: Arc<Mutex<Dialog>>,
    sessions: Arc<DashMap<String, SessionEntry>>,
    policy: EvictionPolicy,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(policy.poll_interval) => {}
                _ = shutdown_rx.changed() => return,
            }

            // Take the session lock before the comparison: a message racing
            // this check bumps last_active first and averts eviction.
            let mut guard = dialog.lock().await;
            if guard.last_active().elapsed() <= policy.idle_timeout {
                continue;
            }

            // A mid-flow user is told their order was cancelled so no
            // partial order dangles, even though no one may be reading.
            if guard.state() != DialogState::Sleep {
                guard.force_cancel().await;
            }
            drop(guard);

            sessions.remove(&chat_id);
            debug!(channel = %channel, chat_id = %chat_id, "evicted inactive session");
            return;
        }
    })
}
