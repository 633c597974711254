use crate::error::{Result, TileError};
use crate::matrix::{MatrixView, MatrixViewMut, Transpose};

/// Validate `C[m x n] = A[m x k] * B[k x n]` shapes and return `(m, n, k)`.
///
/// # Errors
/// Returns `MatmulMismatch` when the inner dimensions disagree and
/// `OutputMismatch` when C is not `m x n`.
pub fn check_gemm_dims(
    a: &MatrixView<'_>,
    b: &MatrixView<'_>,
    c: &MatrixViewMut<'_>,
) -> Result<(usize, usize, usize)> {
    let (m, k) = (a.rows(), a.cols());
    let (k2, n) = (b.rows(), b.cols());
    if k != k2 {
        return Err(TileError::MatmulMismatch { m, k, k2, n });
    }
    if (c.rows(), c.cols()) != (m, n) {
        return Err(TileError::OutputMismatch {
            expected: (m, n),
            got: (c.rows(), c.cols()),
        });
    }
    Ok((m, n, k))
}

/// Reject transposed operands, which the tiled layout does not implement.
pub fn require_no_transpose(trans_a: Transpose, trans_b: Transpose) -> Result<()> {
    if trans_a != Transpose::No || trans_b != Transpose::No {
        return Err(TileError::Unsupported(format!(
            "transposed operands (trans_a={:?}, trans_b={:?})",
            trans_a, trans_b
        )));
    }
    Ok(())
}

/// Unblocked software DGEMM: `C = beta * C + alpha * A * B`.
///
/// Straight triple loop, used as the ground truth offloaded results are
/// compared against.
pub fn dgemm_reference(
    trans_a: Transpose,
    trans_b: Transpose,
    alpha: f64,
    a: MatrixView<'_>,
    b: MatrixView<'_>,
    beta: f64,
    c: &mut MatrixViewMut<'_>,
) -> Result<()> {
    require_no_transpose(trans_a, trans_b)?;
    let (m, n, k) = check_gemm_dims(&a, &b, c)?;

    for mm in 0..m {
        for nn in 0..n {
            let dst = c.get_mut(mm, nn);
            *dst *= beta;
            for kk in 0..k {
                *dst += alpha * a.get(mm, kk) * b.get(kk, nn);
            }
        }
    }
    Ok(())
}

/// Exact element-wise equality over the logical extent of two matrices.
pub fn compare_exact(expected: MatrixView<'_>, actual: MatrixView<'_>) -> bool {
    if (expected.rows(), expected.cols()) != (actual.rows(), actual.cols()) {
        return false;
    }
    (0..expected.rows()).all(|r| expected.row(r) == actual.row(r))
}
