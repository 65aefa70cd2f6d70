//! The dialog state machine as a pure transition function.
//!
//! No framework: states are a tagged union, guards and actions are ordinary
//! branches, and `apply` never mutates its inputs, which keeps the machine
//! directly unit-testable.

use super::descriptor::StateSet;

// ============================================================================
// Constants
// ============================================================================

/// Canonical confirm value that accepts the order.
pub const CONFIRM_YES: &str = "yes";
/// Canonical confirm value that cancels the order.
pub const CONFIRM_NO: &str = "no";

/// Reply emitted when an order is accepted.
pub const ACCEPT_MESSAGE: &str = "Спасибо за заказ";
/// Reply emitted when an order is cancelled.
pub const CANCEL_MESSAGE: &str = "Заказ отменен";
/// Normalized phrasings that cancel an in-progress order from any state.
pub const CANCEL_PHRASES: &[&str] = &["отмена"];

// ============================================================================
// Types
// ============================================================================

/// The question currently being asked.
///
/// `Sleep` is both the initial state and the state every terminal action
/// returns to; there is no separate accepted/cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Sleep,
    Size,
    PaymentType,
    Confirm,
}

/// Collected slot values. A slot is `None` until successfully validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slots {
    pub size: Option<String>,
    pub payment_type: Option<String>,
    pub confirm: Option<String>,
}

impl Slots {
    pub fn size_known(&self) -> bool {
        self.size.is_some()
    }

    pub fn payment_type_known(&self) -> bool {
        self.payment_type.is_some()
    }

    /// The confirm slot only counts as known once it resolved to yes; a
    /// resolved no fires cancellation immediately and never parks here.
    pub fn confirm_known(&self) -> bool {
        self.confirm.as_deref() == Some(CONFIRM_YES)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Events that drive the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Advance to the first unanswered slot and emit its prompt.
    Ask,
    /// Finalize a fully confirmed order.
    AcceptOrder,
    /// Abandon the order from any state.
    CancelOrder,
}

/// Outcome of applying a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: DialogState,
    pub reply: Option<String>,
    pub reset_slots: bool,
}

impl Transition {
    fn stay(state: DialogState) -> Self {
        Self {
            next: state,
            reply: None,
            reset_slots: false,
        }
    }
}

// ============================================================================
// Transition Function
// ============================================================================

/// Apply `trigger` to the machine.
///
/// `Ask` is idempotent and slot-driven: it inspects which slots are unknown
/// and deterministically selects the next unanswered one, so repeating it
/// with no new information re-emits the same prompt. A trigger whose guard
/// does not hold produces a stay-put transition with no reply.
pub fn apply(
    state: DialogState,
    slots: &Slots,
    trigger: Trigger,
    states: &StateSet,
) -> Transition {
    match trigger {
        Trigger::Ask => {
            if !slots.size_known() {
                Transition {
                    next: DialogState::Size,
                    reply: Some(states.size.prompt.clone()),
                    reset_slots: false,
                }
            } else if !slots.payment_type_known() {
                Transition {
                    next: DialogState::PaymentType,
                    reply: Some(states.payment_type.prompt.clone()),
                    reset_slots: false,
                }
            } else if !slots.confirm_known() {
                let size = slots.size.as_deref().unwrap_or_default();
                let payment_type = slots.payment_type.as_deref().unwrap_or_default();
                Transition {
                    next: DialogState::Confirm,
                    reply: Some(states.confirm.render_prompt(&[size, payment_type])),
                    reset_slots: false,
                }
            } else {
                Transition::stay(state)
            }
        }

        Trigger::AcceptOrder => {
            if state == DialogState::Confirm
                && slots.size_known()
                && slots.payment_type_known()
                && slots.confirm_known()
            {
                Transition {
                    next: DialogState::Sleep,
                    reply: Some(ACCEPT_MESSAGE.to_string()),
                    reset_slots: true,
                }
            } else {
                Transition::stay(state)
            }
        }

        Trigger::CancelOrder => Transition {
            next: DialogState::Sleep,
            reply: Some(CANCEL_MESSAGE.to_string()),
            reset_slots: true,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
