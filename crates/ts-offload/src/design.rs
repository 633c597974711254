//! Designs the offload paths load, and the wire records they exchange.

use bytemuck::{Pod, Zeroable};
use ts_stream::Design;
use ts_tile::TileGrid;

/// Compute module of the DGEMM design.
pub const DGEMM_MODULE: &str = "TM";
pub const DGEMM_TILE_SIZE: usize = 16;
pub const DGEMM_FREQUENCY_MHZ: u32 = 200;
pub const STREAM_A: &str = "A";
pub const STREAM_B: &str = "B";
pub const STREAM_C: &str = "C";
pub const PARAM_NUM_TILES: &str = "numTiles";

pub const FIFO_MODULE: &str = "SuperFifo";
pub const CONFIG_STREAM: &str = "configWord";
pub const FIFO_STREAM: &str = "read_fifo";

/// The tiled DGEMM design: A and B tiles in, partial C tiles out.
pub fn dgemm_design() -> Design {
    dgemm_design_with_tile(DGEMM_TILE_SIZE)
}

/// The DGEMM design built for a tile edge other than the default.
pub fn dgemm_design_with_tile(tile_size: usize) -> Design {
    Design::new("DGEMM", DGEMM_MODULE)
        .with_input(STREAM_A)
        .with_input(STREAM_B)
        .with_output(STREAM_C)
        .with_scalar(PARAM_NUM_TILES)
        .with_tile_size(tile_size)
        .with_frequency_mhz(DGEMM_FREQUENCY_MHZ)
}

/// The bounded-FIFO test design: one config slot stream in, records out.
pub fn fifo_design() -> Design {
    Design::new("SuperFifo", FIFO_MODULE)
        .with_slot_stream(CONFIG_STREAM)
        .with_output(FIFO_STREAM)
}

/// Ticks the DGEMM module must run for `grid`.
///
/// One tile-worth beyond the work itself is needed to drain the engine's
/// pipeline. This is a property of this design, not of tiled GEMM.
pub fn tick_budget(grid: &TileGrid) -> u64 {
    (grid.num_tiles() as u64 + 1) * grid.tile_area() as u64
}

/// Configuration record sent once over the `configWord` slot stream.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ConfigWord {
    pub base: u64,
    pub word_count: u64,
}

/// One 32-byte record drained from `read_fifo`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct FifoEntry {
    pub data: [u64; 4],
}

impl FifoEntry {
    pub const FIELDS: usize = 4;

    /// The record the pattern producer emits at `value`.
    pub fn marker(value: u64) -> Self {
        FifoEntry {
            data: [value, 0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_budget_has_one_spare_tile() {
        let grid = TileGrid::new(20, 20, 20, 16).unwrap();
        assert_eq!(grid.num_tiles(), 8);
        assert_eq!(tick_budget(&grid), 9 * 256);
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<ConfigWord>(), 16);
        assert_eq!(std::mem::size_of::<FifoEntry>(), 32);
    }

    #[test]
    fn test_designs_declare_streams() {
        let d = dgemm_design();
        assert!(d.has_input(STREAM_A) && d.has_input(STREAM_B) && d.has_output(STREAM_C));
        assert_eq!(d.tile_size, DGEMM_TILE_SIZE);
        let f = fifo_design();
        assert!(f.has_slot_stream(CONFIG_STREAM) && f.has_output(FIFO_STREAM));
    }
}
