//! In-process engines implementing the `ts_stream::Engine` boundary.
//!
//! These stand in for hardware so the whole offload pipeline runs, and is
//! tested, on the host.

pub mod pattern;
pub mod tile;

pub use pattern::PatternEngine;
pub use tile::TileEngine;

/// Device names reachable by the in-process engines.
pub const LOCAL_DEVICES: &[&str] = &["local0"];
