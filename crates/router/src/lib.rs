//! Deterministic symbol-sharding fan-out and a pool of serial per-shard
//! workers.

mod fnv;
mod processor;
mod router;
mod shard;
mod worker;

pub use fnv::fnv1a_32;
pub use processor::{NoopProcessor, ProcessError, Processor};
pub use router::Router;
pub use shard::{ShardReceiver, ShardSender};
pub use worker::start_workers;
