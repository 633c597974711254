use crate::error::{Result, TileError};
use std::fmt;

/// Number of `tile`-sized blocks needed to cover `len` elements.
///
/// # Panics
/// Panics if `tile == 0`.
pub fn tiles_for(len: usize, tile: usize) -> usize {
    assert!(tile > 0, "tile edge must be > 0");
    len.div_ceil(tile)
}

/// Position of one element inside a tile-major buffer.
///
/// A tile-major buffer holds tiles back to back; each tile is `T x T`
/// row-major. The mapping to a flat index depends only on the number of tile
/// columns in the buffer and the tile edge, never on the backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub tile_row: usize,
    pub tile_col: usize,
    pub row: usize,
    pub col: usize,
}

impl TileIndex {
    pub fn new(tile_row: usize, tile_col: usize, row: usize, col: usize) -> Self {
        TileIndex {
            tile_row,
            tile_col,
            row,
            col,
        }
    }

    /// Flat offset in a buffer with `tile_cols` tiles per tile row.
    pub fn flat(&self, tile_cols: usize, tile: usize) -> usize {
        assert!(
            self.tile_col < tile_cols && self.row < tile && self.col < tile,
            "tile index {:?} out of bounds for {} tile columns of edge {}",
            self,
            tile_cols,
            tile
        );
        ((self.tile_row * tile_cols + self.tile_col) * tile + self.row) * tile + self.col
    }

    /// Inverse of [`TileIndex::flat`].
    pub fn from_flat(flat: usize, tile_cols: usize, tile: usize) -> Self {
        assert!(tile_cols > 0 && tile > 0, "empty tile layout");
        let area = tile * tile;
        let tile_no = flat / area;
        let within = flat % area;
        TileIndex {
            tile_row: tile_no / tile_cols,
            tile_col: tile_no % tile_cols,
            row: within / tile,
            col: within % tile,
        }
    }

    /// Row in the logical (unpadded) matrix this element corresponds to.
    pub fn matrix_row(&self, tile: usize) -> usize {
        self.tile_row * tile + self.row
    }

    /// Column in the logical (unpadded) matrix this element corresponds to.
    pub fn matrix_col(&self, tile: usize) -> usize {
        self.tile_col * tile + self.col
    }
}

/// Tile decomposition of a `C[M x N] += A[M x K] * B[K x N]` problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileGrid {
    m: usize,
    n: usize,
    k: usize,
    tile: usize,
}

impl TileGrid {
    /// Create the grid for an `m x n x k` problem over `tile x tile` blocks.
    ///
    /// # Errors
    /// Returns `InvalidTileSize` if `tile == 0`.
    pub fn new(m: usize, n: usize, k: usize, tile: usize) -> Result<Self> {
        if tile == 0 {
            return Err(TileError::InvalidTileSize(tile));
        }
        Ok(TileGrid { m, n, k, tile })
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Tile edge length `T`.
    pub fn tile(&self) -> usize {
        self.tile
    }

    /// Elements in one tile (`T * T`).
    pub fn tile_area(&self) -> usize {
        self.tile * self.tile
    }

    pub fn m_tiles(&self) -> usize {
        tiles_for(self.m, self.tile)
    }

    pub fn n_tiles(&self) -> usize {
        tiles_for(self.n, self.tile)
    }

    pub fn k_tiles(&self) -> usize {
        tiles_for(self.k, self.tile)
    }

    pub fn padded_m(&self) -> usize {
        self.m_tiles() * self.tile
    }

    pub fn padded_n(&self) -> usize {
        self.n_tiles() * self.tile
    }

    pub fn padded_k(&self) -> usize {
        self.k_tiles() * self.tile
    }

    /// Number of tile products the engine computes (`mTiles * nTiles * kTiles`).
    pub fn num_tiles(&self) -> usize {
        self.m_tiles() * self.n_tiles() * self.k_tiles()
    }

    /// Length in elements of the packed A operand.
    pub fn a_len(&self) -> usize {
        self.m_tiles() * self.k_tiles() * self.tile_area()
    }

    /// Length in elements of the packed B operand.
    pub fn b_len(&self) -> usize {
        self.k_tiles() * self.n_tiles() * self.tile_area()
    }

    /// Length in elements of the result tile stream.
    pub fn result_len(&self) -> usize {
        self.num_tiles() * self.tile_area()
    }

    /// Flat offset of `(row, col)` inside result tile `(m_tile, n_tile, k_tile)`.
    ///
    /// The result stream is ordered `(mTile, nTile, kTile, row, col)`.
    pub fn result_offset(
        &self,
        m_tile: usize,
        n_tile: usize,
        k_tile: usize,
        row: usize,
        col: usize,
    ) -> usize {
        assert!(
            m_tile < self.m_tiles()
                && n_tile < self.n_tiles()
                && k_tile < self.k_tiles()
                && row < self.tile
                && col < self.tile,
            "result position ({}, {}, {}, {}, {}) out of bounds for grid {}",
            m_tile,
            n_tile,
            k_tile,
            row,
            col,
            self
        );
        let tile_no = (m_tile * self.n_tiles() + n_tile) * self.k_tiles() + k_tile;
        (tile_no * self.tile + row) * self.tile + col
    }

    /// Multiply-accumulate operations of the logical problem.
    pub fn points(&self) -> f64 {
        self.m as f64 * self.n as f64 * self.k as f64
    }

    /// Multiply-accumulate operations the engine performs on the padded problem.
    pub fn padded_points(&self) -> f64 {
        self.padded_m() as f64 * self.padded_n() as f64 * self.padded_k() as f64
    }
}

impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}x{}x{}] as {}x{}x{} tiles of {}",
            self.m,
            self.n,
            self.k,
            self.m_tiles(),
            self.n_tiles(),
            self.k_tiles(),
            self.tile
        )
    }
}
