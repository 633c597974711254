use crate::error::{Result, TileError};
use crate::grid::tiles_for;
use crate::matrix::MatrixView;
use crate::packed::{PackedBuffer, TileOrder};

/// Packed length in elements for an `rows x cols` matrix over `tile`-sized tiles.
pub fn packed_len(rows: usize, cols: usize, tile: usize) -> usize {
    tiles_for(rows, tile) * tile * tiles_for(cols, tile) * tile
}

/// Append tile `(tile_row, tile_col)` of `src` to `out`, zero padding past
/// the logical bounds.
fn emit_tile(
    out: &mut Vec<f64>,
    src: &MatrixView<'_>,
    tile_row: usize,
    tile_col: usize,
    tile: usize,
) {
    for x in 0..tile {
        let row = tile_row * tile + x;
        if row < src.rows() {
            let row_data = src.row(row);
            for y in 0..tile {
                let col = tile_col * tile + y;
                out.push(if col < src.cols() { row_data[col] } else { 0.0 });
            }
        } else {
            // Row tail: never touch the source.
            out.extend(std::iter::repeat(0.0).take(tile));
        }
    }
}

/// Repack `src` into `tile x tile` blocks laid out in `order`.
///
/// Every padded position beyond `src.rows()` / `src.cols()` is exactly zero.
///
/// # Errors
/// Returns `InvalidTileSize` if `tile == 0`.
pub fn pack_with_order(
    src: MatrixView<'_>,
    tile: usize,
    order: TileOrder,
) -> Result<PackedBuffer> {
    if tile == 0 {
        return Err(TileError::InvalidTileSize(tile));
    }
    let tile_rows = tiles_for(src.rows(), tile);
    let tile_cols = tiles_for(src.cols(), tile);
    let mut out = Vec::with_capacity(packed_len(src.rows(), src.cols(), tile));

    match order {
        TileOrder::RowBands => {
            for tr in 0..tile_rows {
                for tc in 0..tile_cols {
                    emit_tile(&mut out, &src, tr, tc, tile);
                }
            }
        }
        TileOrder::ColumnBands => {
            for tc in 0..tile_cols {
                for tr in 0..tile_rows {
                    emit_tile(&mut out, &src, tr, tc, tile);
                }
            }
        }
    }

    tracing::trace!(
        rows = src.rows(),
        cols = src.cols(),
        tile,
        len = out.len(),
        "packed matrix"
    );
    Ok(PackedBuffer::from_vec(out, tile, tile_rows, tile_cols, order))
}

/// Pack in row-band order, `(tileRow, tileCol, row, col)`.
pub fn pack(src: MatrixView<'_>, tile: usize) -> Result<PackedBuffer> {
    pack_with_order(src, tile, TileOrder::RowBands)
}

/// Pack the `M x K` A operand: `(mTile, kTile, row, col)`.
pub fn pack_a(a: MatrixView<'_>, tile: usize) -> Result<PackedBuffer> {
    pack_with_order(a, tile, TileOrder::RowBands)
}

/// Pack the `K x N` B operand: `(nTile, kTile, row, col)`, one contiguous
/// K sweep per column band.
pub fn pack_b(b: MatrixView<'_>, tile: usize) -> Result<PackedBuffer> {
    pack_with_order(b, tile, TileOrder::ColumnBands)
}
