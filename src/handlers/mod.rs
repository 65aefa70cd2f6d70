//! HTTP request handlers.

mod health;
pub mod telegram;
mod version;

pub use health::{livez, readyz};
pub use version::version;
