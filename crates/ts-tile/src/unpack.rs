use crate::error::{Result, TileError};
use crate::grid::TileGrid;
use crate::matrix::MatrixViewMut;

/// Scatter a result tile stream into `c`, accumulating partial products.
///
/// `stream` is ordered `(mTile, nTile, kTile, row, col)` and is positionally
/// dense: padded positions occupy real slots and are skipped, never written.
/// For every output element:
///
/// ```text
/// C[r,c] = (kTile == 0 ? beta * C[r,c] : C[r,c]) + alpha * stream[pos]
/// ```
///
/// so `beta` is applied exactly once per element however many K tiles there are.
/// A grid with no K tiles still scales C by `beta` once.
///
/// # Errors
/// Returns `StreamLength` if the stream does not cover the grid, or
/// `OutputMismatch` if `c` is not `M x N`.
pub fn unpack_accumulate(
    stream: &[f64],
    grid: &TileGrid,
    alpha: f64,
    beta: f64,
    c: &mut MatrixViewMut<'_>,
) -> Result<()> {
    if stream.len() != grid.result_len() {
        return Err(TileError::StreamLength {
            expected: grid.result_len(),
            got: stream.len(),
        });
    }
    if (c.rows(), c.cols()) != (grid.m(), grid.n()) {
        return Err(TileError::OutputMismatch {
            expected: (grid.m(), grid.n()),
            got: (c.rows(), c.cols()),
        });
    }

    if grid.k_tiles() == 0 {
        c.scale(beta);
        return Ok(());
    }

    let t = grid.tile();
    let mut pos = 0;
    for mm in 0..grid.m_tiles() {
        for nn in 0..grid.n_tiles() {
            for kk in 0..grid.k_tiles() {
                for x in 0..t {
                    let row = mm * t + x;
                    if row >= grid.m() {
                        pos += (t - x) * t;
                        break;
                    }
                    for y in 0..t {
                        let col = nn * t + y;
                        if col >= grid.n() {
                            pos += t - y;
                            break;
                        }
                        let dst = c.get_mut(row, col);
                        if kk == 0 {
                            *dst *= beta;
                        }
                        *dst += alpha * stream[pos];
                        pos += 1;
                    }
                }
            }
        }
    }
    debug_assert_eq!(pos, stream.len());
    Ok(())
}
