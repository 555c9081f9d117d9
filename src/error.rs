use thiserror::Error;

use crate::types::{PointerId, RequestId};

/// Why an input event was dropped without touching session state.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TouchRejection {
    #[error("stale request {event}, active request is {active}")]
    StaleEvent { event: RequestId, active: RequestId },

    #[error("no active session")]
    NoActiveSession,

    #[error("pointer {0} is not the tracked pointer")]
    UnknownPointer(PointerId),
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {active} is still active, hide it before showing {requested}")]
    SessionActive {
        active: RequestId,
        requested: RequestId,
    },

    #[error("keyguard request {0} skipped, fingerprint detection is not running")]
    DetectionIdle(RequestId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid dimming entry `{0}`, expected `brightness,alpha`")]
    DimmingEntry(String),

    #[error("dimming entry `{0}` does not raise brightness over the previous entry")]
    DimmingOrder(String),

    #[error("invalid config value: {0}")]
    Invalid(&'static str),
}
