//! The per-session dialog engine.
//!
//! `machine` is the pure state machine, `validator` resolves raw user text
//! to canonical slot values, `descriptor` holds the immutable per-state
//! configuration, and `engine` ties them together into one live `Dialog`
//! per conversation.

mod descriptor;
mod engine;
pub mod machine;
mod validator;

pub use descriptor::{DescriptorError, StateDescriptor, StateSet, ValueEntry};
pub use engine::Dialog;
pub use machine::{DialogState, Slots, Transition, Trigger};
pub use validator::{UnrecognizedInput, normalize, resolve};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::messenger::Messenger;

    use super::descriptor::{StateDescriptor, StateSet};

    /// Descriptor set built from the JSON files shipped with the crate.
    pub fn test_states() -> StateSet {
        let size =
            StateDescriptor::from_json("size.json", include_str!("../../states/size.json"))
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

    /// Messenger that records every send and answers with a settable result.
    pub struct RecordingMessenger {
        sent: Mutex<Vec<(String, String)>>,
        deliver_ok: AtomicBool,
    }

    impl RecordingMessenger {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                deliver_ok: AtomicBool::new(true),
            })
        }

        pub fn set_delivery_ok(&self, ok: bool) {
            self.deliver_ok.store(ok, Ordering::SeqCst);
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
            self.deliver_ok.load(Ordering::SeqCst)
        }
    }
}
