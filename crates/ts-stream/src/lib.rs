//! `ts-stream` - Streaming transport between a host and a tile engine.
//!
//! This crate provides:
//! - `Design`, the named streams and constants of a loaded engine design
//! - `Actions`, the batch-queue transport: queue whole buffers and
//!   single-shot directives, then hand them to one blocking `Engine::run`
//! - `slot_stream`, the slot-acquire transport: a fixed-depth ring with
//!   acquire/commit semantics, backpressure, and optional timeouts
//! - The `Engine` trait every engine implementation plugs in behind

pub mod actions;
pub mod design;
pub mod engine;
pub mod error;
pub mod ring;

pub use actions::Actions;
pub use design::Design;
pub use engine::{select_device, Engine, ANY_DEVICE};
pub use error::{Result, StreamError};
pub use ring::{slot_stream, SlotReader, SlotWriter, WriteSlots};
