/// Order in which whole tiles are laid out in a packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOrder {
    /// Tile rows outermost: `(tileRow, tileCol, row, col)`. Used for A.
    RowBands,
    /// Tile columns outermost: `(tileCol, tileRow, row, col)`. Used for B,
    /// so one column band of B is one contiguous sweep over K.
    ColumnBands,
}

/// Tile-major, zero-padded copy of a matrix, in the engine's ingestion order.
///
/// Invariant: `len() == tile_rows * tile_cols * tile * tile`.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBuffer {
    data: Vec<f64>,
    tile: usize,
    tile_rows: usize,
    tile_cols: usize,
    order: TileOrder,
}

impl PackedBuffer {
    /// Wrap already packed data.
    ///
    /// # Panics
    /// Panics if `data.len()` disagrees with the tile counts.
    pub fn from_vec(
        data: Vec<f64>,
        tile: usize,
        tile_rows: usize,
        tile_cols: usize,
        order: TileOrder,
    ) -> Self {
        assert_eq!(
            data.len(),
            tile_rows * tile_cols * tile * tile,
            "packed length does not match {}x{} tiles of {}",
            tile_rows,
            tile_cols,
            tile
        );
        PackedBuffer {
            data,
            tile,
            tile_rows,
            tile_cols,
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn tile(&self) -> usize {
        self.tile
    }

    pub fn tile_rows(&self) -> usize {
        self.tile_rows
    }

    pub fn tile_cols(&self) -> usize {
        self.tile_cols
    }

    pub fn order(&self) -> TileOrder {
        self.order
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Number of contiguous bands (tiles sharing the outer index).
    pub fn bands(&self) -> usize {
        match self.order {
            TileOrder::RowBands => self.tile_rows,
            TileOrder::ColumnBands => self.tile_cols,
        }
    }

    /// The contiguous run of tiles sharing outer index `band`.
    pub fn band(&self, band: usize) -> &[f64] {
        assert!(band < self.bands(), "band {} out of range", band);
        let per_band = self.len() / self.bands();
        &self.data[band * per_band..(band + 1) * per_band]
    }

    /// The `T * T` elements of tile `(tile_row, tile_col)`.
    pub fn tile_at(&self, tile_row: usize, tile_col: usize) -> &[f64] {
        assert!(
            tile_row < self.tile_rows && tile_col < self.tile_cols,
            "tile ({}, {}) out of range",
            tile_row,
            tile_col
        );
        let tile_no = match self.order {
            TileOrder::RowBands => tile_row * self.tile_cols + tile_col,
            TileOrder::ColumnBands => tile_col * self.tile_rows + tile_row,
        };
        let area = self.tile * self.tile;
        &self.data[tile_no * area..(tile_no + 1) * area]
    }
}
