use thiserror::Error;

#[derive(Debug, Error)]
pub enum KefError {
    /// A device call failed for a reason the speaker did not classify further
    #[error("device operation failed: {0}")]
    Device(String),

    #[error("speaker unreachable: {0}")]
    Unreachable(String),

    #[error("speaker is powered off")]
    PoweredOff,

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The volume sync controller has shut down and no longer accepts events
    #[error("controller is not running")]
    ControllerClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KefError>;
