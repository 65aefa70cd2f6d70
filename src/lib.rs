//! Pizzabot - a slot-filling pizza ordering bot served over chat webhooks.
//!
//! The core is a per-session dialog engine: a finite-state conversation
//! machine that collects pizza size, payment method, and a confirmation,
//! validating each answer against a configured interpretation table. A
//! concurrent session registry keeps one dialog per (channel, chat) pair
//! and evicts sessions after an inactivity window.

pub mod config;
pub mod dialog;
pub mod handlers;
pub mod messenger;
pub mod server;
pub mod session;
