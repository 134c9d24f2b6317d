//! Unified error type for the Duelhall server.

use duelhall_protocol::ProtocolError;
use duelhall_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps every crate-specific error.
///
/// Lobby refusals never show up here: they are reported to the client as
/// `errorMessage` events and the connection carries on.
#[derive(Debug, thiserror::Error)]
pub enum DuelhallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The registry task has stopped; no more events can be processed.
    #[error("lobby registry is not running")]
    RegistryUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "gone",
        ));
        let duelhall_err: DuelhallError = err.into();
        assert!(matches!(duelhall_err, DuelhallError::Transport(_)));
        assert!(duelhall_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::InvalidFlag {
            name: "X",
            value: "maybe".into(),
        };
        let duelhall_err: DuelhallError = err.into();
        assert!(matches!(duelhall_err, DuelhallError::Config(_)));
    }

    #[test]
    fn test_registry_unavailable_message() {
        assert_eq!(
            DuelhallError::RegistryUnavailable.to_string(),
            "lobby registry is not running"
        );
    }
}
