//! `ts-tile` - Matrix views and the tile-major data layout used by tilestream.
//!
//! This crate provides:
//! - Strided `MatrixView` / `MatrixViewMut` windows over row-major `f64` data
//! - A `TileGrid` describing how an `M x N x K` problem maps onto `T x T` tiles
//! - `pack`, which lays a matrix out tile-by-tile with zero padding
//! - `unpack_accumulate`, which scatters a result tile stream back into C
//! - A reference triple-loop DGEMM used to check offloaded results

pub mod error;
pub mod grid;
pub mod matrix;
pub mod pack;
pub mod packed;
pub mod reference;
pub mod unpack;

// Re-export primary types at the crate root for convenience.
pub use error::{Result, TileError};
pub use grid::{TileGrid, TileIndex};
pub use matrix::{Matrix, MatrixView, MatrixViewMut, Transpose};
pub use pack::{pack, pack_a, pack_b, pack_with_order, packed_len};
pub use packed::{PackedBuffer, TileOrder};
pub use reference::{check_gemm_dims, compare_exact, dgemm_reference, require_no_transpose};
pub use unpack::unpack_accumulate;
