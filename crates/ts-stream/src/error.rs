use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    #[error("unknown stream '{0}'")]
    UnknownStream(String),
    #[error("unknown module '{0}'")]
    UnknownModule(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("timed out after {waited:?} waiting on stream '{stream}'")]
    Timeout { stream: String, waited: Duration },
    #[error("stream '{0}' closed by its peer")]
    Closed(String),
    #[error("stream '{0}' lock poisoned")]
    Poisoned(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("engine run failed: {0}")]
    RunFailed(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;
