//! Session lifecycle: the concurrent registry and per-session eviction.

mod registry;
mod watcher;

pub use registry::{EvictionPolicy, SessionRegistry};
