use std::fmt::Debug;
use std::sync::Arc;

use crate::actions::Actions;
use crate::design::Design;
use crate::error::{Result, StreamError};
use crate::ring::SlotWriter;

/// Device selector matching any available device.
pub const ANY_DEVICE: &str = "*";

/// Trait for engines a design can be loaded onto (hardware adapters,
/// in-process stand-ins).
///
/// The engine's compute is opaque: hosts only queue buffers and directives
/// into an [`Actions`] set and hand it to [`Engine::run`], or talk to it
/// through slot streams.
pub trait Engine: Send + Debug {
    /// Returns the name of this engine (e.g., "tile-ref").
    fn name(&self) -> &str;

    /// The design loaded on this engine.
    fn design(&self) -> Arc<Design>;

    /// Start an empty action set for this engine's design.
    fn actions<'a>(&self) -> Actions<'a> {
        Actions::new(self.design())
    }

    /// Return the engine to its power-on state.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Execute one action set, blocking until every queued transfer has
    /// completed. The action set's directives are consumed by this call.
    fn run(&mut self, actions: Actions<'_>) -> Result<()>;

    /// Set up slot stream `name` as `slots` records of `slot_size` bytes and
    /// return its producer end.
    fn setup_slot_stream(
        &mut self,
        name: &str,
        _slots: usize,
        _slot_size: usize,
    ) -> Result<SlotWriter> {
        Err(StreamError::UnknownStream(name.to_string()))
    }
}

/// Resolve `selector` against the device names an engine can reach.
///
/// `"*"` picks the first device; anything else must match a name exactly.
///
/// # Errors
/// Returns `DeviceUnavailable` when nothing matches.
pub fn select_device<'d>(selector: &str, available: &[&'d str]) -> Result<&'d str> {
    let found = if selector == ANY_DEVICE {
        available.first().copied()
    } else {
        available.iter().copied().find(|d| *d == selector)
    };
    found.ok_or_else(|| {
        StreamError::DeviceUnavailable(format!(
            "no device matches '{}' (available: {:?})",
            selector, available
        ))
    })
}
