//! Engine error type.

use crate::growth::Phase;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("could not decode audio: {0}")]
    DecodeFailure(String),
    #[error("audio graph already running")]
    GraphAlreadyRunning,
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("cannot {action} while {from}")]
    InvalidTransition { from: Phase, action: &'static str },
    #[error("encoding failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
