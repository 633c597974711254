use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TileError {
    #[error("invalid tile size {0}: tile edge must be > 0")]
    InvalidTileSize(usize),
    #[error("invalid matrix view: {rows}x{cols} with stride {stride} does not fit a buffer of {len} elements")]
    InvalidStride {
        rows: usize,
        cols: usize,
        stride: usize,
        len: usize,
    },
    #[error("matmul dimension mismatch: [{m}x{k}] @ [{k2}x{n}]")]
    MatmulMismatch {
        m: usize,
        k: usize,
        k2: usize,
        n: usize,
    },
    #[error("output shape mismatch: expected {expected:?}, got {got:?}")]
    OutputMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("result stream length mismatch: expected {expected} elements, got {got}")]
    StreamLength { expected: usize, got: usize },
    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, TileError>;
