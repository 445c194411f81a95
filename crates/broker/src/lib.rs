//! Kafka-compatible broker client: keyed publish with full-ISR acks, and a
//! manual-commit-after-handoff consumer.

mod consumer;
mod publisher;
mod wire;

pub use consumer::{Consumer, ConsumerError};
pub use publisher::{PublishError, PublishErrorCategory, Publisher};
pub use wire::TickWire;
