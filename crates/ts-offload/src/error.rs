use thiserror::Error;

#[derive(Error, Debug)]
pub enum OffloadError {
    #[error("tile error: {0}")]
    Tile(#[from] ts_tile::TileError),
    #[error("stream error: {0}")]
    Stream(#[from] ts_stream::StreamError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, OffloadError>;
