use thiserror::Error;

/// Errors surfaced at startup (configuration, logging setup).
///
/// Nothing on the per-frame path produces one of these.
#[derive(Error, Debug)]
pub enum RxTapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, RxTapError>;

/// Failures reported by a host when installing a receive handler.
#[derive(Error, Debug)]
pub enum HostError {
    /// Another handler already owns the interface's receive slot.
    #[error("interface {0} already has a receive handler")]
    Busy(String),

    #[error("interface {0} not found")]
    NoSuchInterface(String),

    #[error("failed to open receive channel on {interface}: {source}")]
    Channel {
        interface: String,
        #[source]
        source: std::io::Error,
    },

    #[error("host rejected registration: {0}")]
    Rejected(String),
}

/// Registration outcomes the registry logs and skips. Never fatal.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("interface {interface} already has a receive handler installed")]
    RegistrationConflict { interface: String },

    #[error("registration on {interface} failed: {source}")]
    RegistrationFailed {
        interface: String,
        #[source]
        source: HostError,
    },
}

impl RegistryError {
    pub fn from_host(interface: &str, err: HostError) -> Self {
        match err {
            HostError::Busy(_) => Self::RegistrationConflict { interface: interface.to_string() },
            source => Self::RegistrationFailed { interface: interface.to_string(), source },
        }
    }
}
