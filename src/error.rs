use thiserror::Error;

/// Everything that can go wrong between the adapter and the screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// Adapter missing, powered off or scan refused by the platform.
    #[error("Scan failed: {0}")]
    ScanFailure(String),

    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Session lost: {0}")]
    SessionLost(String),

    #[error("Malformed heart rate payload: need {needed} bytes, got {actual}")]
    MalformedPayload { needed: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MonitorError>;
