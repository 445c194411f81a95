//! Canonical tick data model shared by the provider, broker, and router crates.

mod tick;
mod message;

pub use tick::{Tick, TickError};
pub use message::{BrokerMeta, TickMsg};
