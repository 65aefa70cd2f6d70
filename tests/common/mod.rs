//! Common test utilities.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;

use pizzabot::dialog::{StateDescriptor, StateSet};
use pizzabot::messenger::Messenger;
use pizzabot::server::{self, AppState};
use pizzabot::session::{EvictionPolicy, SessionRegistry};

pub const BOT_TOKEN: &str = "123456:TEST-TOKEN";

/// Messenger that records sends and always reports success.
pub struct RecordingMessenger {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, chat_id: &str, text: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        true
    }
}

fn test_states() -> StateSet {
    let size = StateDescriptor::from_json("size.json", include_str!("../../states/size.json"))
        .unwrap();
    let payment_type = StateDescriptor::from_json(
        "payment_type.json",
        include_str!("../../states/payment_type.json"),
    )
    .unwrap();
    let confirm =
        StateDescriptor::from_json("confirm.json", include_str!("../../states/confirm.json"))
            .unwrap();
    StateSet::new(size, payment_type, confirm).unwrap()
}

/// Build a test app with a recording messenger and eviction far in the future.
pub fn test_app() -> (Router, Arc<RecordingMessenger>) {
    let messenger = RecordingMessenger::new();
    let registry = SessionRegistry::new(
        "telegram",
        Arc::new(test_states()),
        messenger.clone(),
        EvictionPolicy {
            poll_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(600),
        },
    );
    let state = AppState { telegram: registry };
    (server::build_app(state, BOT_TOKEN, 30), messenger)
}
