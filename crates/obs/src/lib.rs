//! Ambient observability: structured logging, Prometheus metrics, and the
//! health/readiness HTTP surface shared by both binaries.

mod logging;
mod readiness;
mod server;

pub use logging::init_tracing;
pub use readiness::Readiness;
pub use server::serve_http;
