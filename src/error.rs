//! Crate-wide error types.
//!
//! Each component gets its own narrow error enum so that a caller can match
//! on the failure without downcasting; the taxonomy follows the five classes
//! described for the pipeline: configuration, transient I/O, protocol
//! violation, resource exhaustion and invariant violation.

use thiserror::Error;

/// Errors raised while loading or validating a JSON configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid led layout: {0}")]
    InvalidLayout(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Errors raised by the priority muxer.
#[derive(Debug, Error)]
pub enum MuxerError {
    #[error("priority {0} is not registered")]
    NotRegistered(u8),
    #[error("priority {0} is reserved for the sentinel input")]
    ReservedPriority(u8),
}

/// Errors raised by a [`crate::driver::Driver`] implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transient write failure: {0}")]
    Transient(String),
    #[error("device not open")]
    NotOpen,
    #[error("color count mismatch: expected {expected}, got {got}")]
    ColorCountMismatch { expected: usize, got: usize },
}

/// Errors raised by a [`crate::capture::CaptureSource`].
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture source already started")]
    AlreadyStarted,
    #[error("capture source not started")]
    NotStarted,
}

/// Errors raised while running a single pipeline instance.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("device error: {0}")]
    Device(#[from] DriverError),
    #[error("muxer error: {0}")]
    Muxer(#[from] MuxerError),
    #[error("input channel closed")]
    ChannelClosed,
}

/// Errors raised by the instance manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("no such instance: {0}")]
    NoSuchInstance(u8),
    #[error("instance {0} is already running")]
    AlreadyRunning(u8),
    #[error("instance {0} is not running")]
    NotRunning(u8),
    #[error("instance failed to start: {0}")]
    StartFailed(#[from] InstanceError),
    #[error("instance limit reached (256)")]
    InstanceLimitReached,
}
