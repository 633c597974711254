//! Shared plumbing for the `dgemm` and `fifo-check` binaries: exit status
//! mapping, tracing setup, and the human-readable report lines.

pub mod logging;
pub mod report;
pub mod status;

pub use logging::{init_tracing, InitError};
pub use status::Status;
