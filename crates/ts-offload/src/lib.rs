//! `ts-offload` - Offloading DGEMM to a fixed-tile streaming engine.
//!
//! A [`Session`] owns a loaded engine and runs `C = beta * C + alpha * A * B`
//! as pack -> queue -> run -> unpack. [`FifoValidator`] exercises the same
//! transport on its own with a synthetic producer. The engines under
//! [`engine`] run in-process so the whole pipeline works without hardware.

pub mod config;
pub mod design;
pub mod efficiency;
pub mod engine;
pub mod error;
pub mod session;
pub mod validator;

pub use config::{OffloadConfig, ValidatorConfig};
pub use design::{dgemm_design, fifo_design, ConfigWord, FifoEntry};
pub use efficiency::Efficiency;
pub use engine::{PatternEngine, TileEngine};
pub use error::{OffloadError, Result};
pub use session::{OffloadReport, OffloadState, OffloadTimings, Session};
pub use validator::{compare_batch, FifoValidator, Mismatch, ValidationReport};
