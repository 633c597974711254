use crate::error::{Result, TileError};

/// Whether a GEMM operand is used as stored or transposed.
///
/// Only `No` is supported by the tiled offload path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transpose {
    #[default]
    No,
    Yes,
}

fn check_fit(rows: usize, cols: usize, stride: usize, len: usize) -> Result<()> {
    let fits = if rows == 0 || cols == 0 {
        rows == 0 || (rows - 1) * stride <= len
    } else {
        stride >= cols && (rows - 1) * stride + cols <= len
    };
    if fits {
        Ok(())
    } else {
        Err(TileError::InvalidStride {
            rows,
            cols,
            stride,
            len,
        })
    }
}

/// Read-only `rows x cols` window over row-major `f64` data.
///
/// `stride` is the leading dimension: element `(r, c)` lives at
/// `data[r * stride + c]`, so a view can address a sub-matrix of a larger
/// backing array without copying.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    data: &'a [f64],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a> MatrixView<'a> {
    /// # Errors
    /// Returns `InvalidStride` if `stride < cols` or the view runs past `data`.
    pub fn new(data: &'a [f64], rows: usize, cols: usize, stride: usize) -> Result<Self> {
        check_fit(rows, cols, stride, data.len())?;
        Ok(MatrixView {
            data,
            rows,
            cols,
            stride,
        })
    }

    /// Densely packed view (`stride == cols`).
    pub fn dense(data: &'a [f64], rows: usize, cols: usize) -> Result<Self> {
        Self::new(data, rows, cols, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        assert!(r < self.rows && c < self.cols, "({}, {}) out of bounds", r, c);
        self.data[r * self.stride + c]
    }

    /// The `cols` logical elements of row `r`.
    pub fn row(&self, r: usize) -> &'a [f64] {
        assert!(r < self.rows, "row {} out of bounds", r);
        let start = r * self.stride;
        &self.data[start..start + self.cols]
    }
}

/// Mutable `rows x cols` window over row-major `f64` data.
#[derive(Debug)]
pub struct MatrixViewMut<'a> {
    data: &'a mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a> MatrixViewMut<'a> {
    /// # Errors
    /// Returns `InvalidStride` if `stride < cols` or the view runs past `data`.
    pub fn new(data: &'a mut [f64], rows: usize, cols: usize, stride: usize) -> Result<Self> {
        check_fit(rows, cols, stride, data.len())?;
        Ok(MatrixViewMut {
            data,
            rows,
            cols,
            stride,
        })
    }

    pub fn dense(data: &'a mut [f64], rows: usize, cols: usize) -> Result<Self> {
        Self::new(data, rows, cols, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        assert!(r < self.rows && c < self.cols, "({}, {}) out of bounds", r, c);
        self.data[r * self.stride + c]
    }

    pub fn get_mut(&mut self, r: usize, c: usize) -> &mut f64 {
        assert!(r < self.rows && c < self.cols, "({}, {}) out of bounds", r, c);
        &mut self.data[r * self.stride + c]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        assert!(r < self.rows, "row {} out of bounds", r);
        let start = r * self.stride;
        &mut self.data[start..start + self.cols]
    }

    /// Multiply every logical element by `s`, leaving stride padding untouched.
    pub fn scale(&mut self, s: f64) {
        for r in 0..self.rows {
            for v in self.row_mut(r) {
                *v *= s;
            }
        }
    }
}

/// Owned dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "data length {} does not match {}x{}",
            data.len(),
            rows,
            cols
        );
        Matrix { data, rows, cols }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Build a matrix by evaluating `f(r, c)` for every element.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Matrix { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn view(&self) -> MatrixView<'_> {
        MatrixView {
            data: &self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.cols,
        }
    }

    pub fn view_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut {
            data: &mut self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_with_stride() {
        // 2x2 window inside a 3x4 backing array.
        let data: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let v = MatrixView::new(&data, 2, 2, 4).unwrap();
        assert_eq!(v.get(0, 0), 0.0);
        assert_eq!(v.get(1, 1), 5.0);
        assert_eq!(v.row(1), &[4.0, 5.0]);
    }

    #[test]
    fn test_stride_smaller_than_cols() {
        let data = vec![0.0; 16];
        assert!(MatrixView::new(&data, 2, 4, 3).is_err());
    }

    #[test]
    fn test_view_past_end() {
        let data = vec![0.0; 7];
        assert!(MatrixView::new(&data, 2, 4, 4).is_err());
        assert!(MatrixView::new(&data, 2, 3, 4).is_ok());
    }

    #[test]
    fn test_zero_sized_views() {
        let empty: [f64; 0] = [];
        assert!(MatrixView::new(&empty, 0, 0, 0).is_ok());
        assert!(MatrixView::new(&empty, 0, 5, 5).is_ok());
        assert!(MatrixView::new(&empty, 1, 0, 0).is_ok());
    }

    #[test]
    fn test_scale_skips_stride_padding() {
        let mut data = vec![1.0; 6];
        let mut v = MatrixViewMut::new(&mut data, 2, 2, 3).unwrap();
        v.scale(3.0);
        assert_eq!(data, vec![3.0, 3.0, 1.0, 3.0, 3.0, 1.0]);
    }

    #[test]
    fn test_from_fn() {
        let m = Matrix::from_fn(2, 3, |r, c| (r * 10 + c) as f64);
        assert_eq!(m.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(m.view().get(1, 2), 12.0);
    }

    #[test]
    #[should_panic]
    fn test_new_shape_mismatch_panics() {
        let _m = Matrix::new(vec![1.0, 2.0], 3, 1);
    }
}
