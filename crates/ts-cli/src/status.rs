use std::process::ExitCode;

use ts_offload::OffloadError;
use ts_stream::StreamError;

/// Outcome of a driver run, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// The run completed but results or records did not match.
    Mismatch,
    /// Bad arguments or configuration; nothing touched the engine.
    InvalidArgument,
    EngineUnavailable,
    RunFailed,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Mismatch | Status::InvalidArgument => 1,
            Status::EngineUnavailable => 2,
            Status::RunFailed => 3,
        }
    }

    pub fn from_match(matched: bool) -> Self {
        if matched {
            Status::Ok
        } else {
            Status::Mismatch
        }
    }
}

impl From<&OffloadError> for Status {
    fn from(err: &OffloadError) -> Self {
        match err {
            OffloadError::Config(_) => Status::InvalidArgument,
            OffloadError::Stream(StreamError::DeviceUnavailable(_)) => Status::EngineUnavailable,
            _ => Status::RunFailed,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.code())
    }
}
