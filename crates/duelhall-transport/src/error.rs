/// Errors that can occur in the transport layer.
///
/// Every variant wraps the underlying I/O failure so callers can log the
/// root cause; the lobby layer never sees these.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed (peer gone, socket closed mid-write).
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding, accepting or upgrading a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
