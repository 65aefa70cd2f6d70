//! One live conversation per end user.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::messenger::Messenger;

use super::descriptor::StateSet;
use super::machine::{self, CANCEL_PHRASES, CONFIRM_NO, CONFIRM_YES, DialogState, Slots, Trigger};
use super::validator::{UnrecognizedInput, normalize, resolve};

/// A single conversation with one end user on one channel.
///
/// Not safe for concurrent stepping: callers serialize access through the
/// session registry's per-session lock. The eviction watcher takes the same
/// lock before reading `last_active`.
pub struct Dialog {
    channel: String,
    chat_id: String,
    state: DialogState,
    slots: Slots,
    last_active: Instant,
    pending_reply: String,
    states: Arc<StateSet>,
    messenger: Arc<dyn Messenger>,
}

impl Dialog {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        states: Arc<StateSet>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            state: DialogState::Sleep,
            slots: Slots::default(),
            last_active: Instant::now(),
            pending_reply: String::new(),
            states,
            messenger,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn last_active(&self) -> Instant {
        self.last_active
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    // ------------------------------------------------------------------------
    // Message Processing
    // ------------------------------------------------------------------------

    /// Consume one inbound message and return the bot's reply (possibly
    /// empty if no branch produced one).
    pub async fn consume(&mut self, raw: &str) -> String {
        self.last_active = Instant::now();
        self.pending_reply.clear();

        let text = normalize(raw);
        if self.state != DialogState::Sleep && CANCEL_PHRASES.contains(&text.as_str()) {
            self.fire(Trigger::CancelOrder).await;
            return self.pending_reply.clone();
        }

        match self.state {
            DialogState::Sleep => self.fire(Trigger::Ask).await,

            DialogState::Size => match self.set_size(&text) {
                Ok(()) => self.fire(Trigger::Ask).await,
                Err(UnrecognizedInput { hint }) => self.deliver(hint).await,
            },

            DialogState::PaymentType => match self.set_payment_type(&text) {
                Ok(()) => self.fire(Trigger::Ask).await,
                Err(UnrecognizedInput { hint }) => self.deliver(hint).await,
            },

            DialogState::Confirm => match self.set_confirm(&text) {
                Ok(()) => match self.slots.confirm.as_deref() {
                    Some(CONFIRM_YES) => self.fire(Trigger::AcceptOrder).await,
                    Some(CONFIRM_NO) => self.fire(Trigger::CancelOrder).await,
                    // Unreachable with a validated confirm descriptor.
                    _ => {}
                },
                Err(UnrecognizedInput { hint }) => self.deliver(hint).await,
            },
        }

        self.pending_reply.clone()
    }

    /// Cancel an in-progress order on behalf of the eviction watcher.
    pub async fn force_cancel(&mut self) {
        self.fire(Trigger::CancelOrder).await;
    }

    // ------------------------------------------------------------------------
    // Slot Setters
    // ------------------------------------------------------------------------

    fn set_size(&mut self, raw: &str) -> Result<(), UnrecognizedInput> {
        self.slots.size = Some(resolve(&self.states.size, raw)?);
        Ok(())
    }

    fn set_payment_type(&mut self, raw: &str) -> Result<(), UnrecognizedInput> {
        self.slots.payment_type = Some(resolve(&self.states.payment_type, raw)?);
        Ok(())
    }

    fn set_confirm(&mut self, raw: &str) -> Result<(), UnrecognizedInput> {
        self.slots.confirm = Some(resolve(&self.states.confirm, raw)?);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Transitions and Delivery
    // ------------------------------------------------------------------------

    async fn fire(&mut self, trigger: Trigger) {
        let transition = machine::apply(self.state, &self.slots, trigger, &self.states);
        self.state = transition.next;
        if transition.reset_slots {
            self.slots.reset();
        }
        if let Some(reply) = transition.reply {
            self.deliver(reply).await;
        }
    }

    /// Record the reply and hand it to the messenger.
    ///
    /// A failed delivery while an order is in progress abandons the order:
    /// the dialog cancels itself rather than sit on a prompt the user never
    /// saw. The cancellation runs with the state already back in `Sleep`, so
    /// a second failure has nothing left to abandon.
    async fn deliver(&mut self, text: String) {
        self.pending_reply = text.clone();
        let delivered = self.messenger.send(&self.chat_id, &text).await;

        if !delivered && self.state != DialogState::Sleep {
            debug!(
                channel = %self.channel,
                chat_id = %self.chat_id,
                "delivery failed, abandoning order"
            );
            let transition =
                machine::apply(self.state, &self.slots, Trigger::CancelOrder, &self.states);
            self.state = transition.next;
            self.slots.reset();
            if let Some(reply) = transition.reply {
                self.pending_reply = reply.clone();
                let _ = self.messenger.send(&self.chat_id, &reply).await;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
