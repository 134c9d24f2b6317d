//! Per-connection handler: decode inbound events, write outbound ones.
//!
//! Each accepted connection gets two tasks:
//!   1. the reader (this handler) decodes client events and forwards them
//!      to the registry actor;
//!   2. a writer draining the connection's event queue onto the socket.
//!
//! The queue is the connection's only outbound path, which keeps events
//! in the order the registry produced them.
//!
//! When the reader stops, the registry is told first; once the writer has
//! flushed what the registry queued before unregistering, the socket is
//! closed.

use std::sync::Arc;
use std::time::Duration;

use duelhall_protocol::{ClientEvent, Codec, ConnectionId, ServerEvent};
use duelhall_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::{DuelhallError, RegistryHandle};

/// Drop guard that tells the registry a connection is gone.
///
/// Runs on every exit path of the handler, including panics and early
/// `?` returns.
struct ConnectionGuard {
    conn_id: ConnectionId,
    registry: RegistryHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.registry.disconnect(self.conn_id).is_err() {
            tracing::debug!(
                conn_id = %self.conn_id,
                "registry gone, skipping disconnect"
            );
        }
    }
}

/// Upper bound on flushing queued events after the reader stops.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DuelhallError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, "client connected");

    let (tx, rx) = mpsc::unbounded_channel();
    state.registry.connect(conn_id, tx)?;
    let guard = ConnectionGuard {
        conn_id,
        registry: state.registry.clone(),
    };

    // The writer exits once the registry drops the queue's sender.
    let writer =
        tokio::spawn(write_events(Arc::clone(&conn), rx, Arc::clone(&state)));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "client disconnected");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "ignoring malformed event");
                continue;
            }
        };

        state.registry.dispatch(conn_id, event)?;
    }

    // Registry disconnect, then unregister, which closes the queue.
    drop(guard);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
        tracing::debug!(%conn_id, "writer did not drain in time");
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close after disconnect failed");
    }
    Ok(())
}

/// Drains one connection's queue onto its socket, in order.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<C>>,
) {
    let conn_id = conn.id();

    while let Some(event) = events.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };

        let sent = match std::str::from_utf8(&bytes) {
            Ok(text) => conn.send_text(text).await,
            Err(_) => conn.send(&bytes).await,
        };
        if let Err(e) = sent {
            tracing::debug!(%conn_id, error = %e, "send failed, writer stopping");
            break;
        }
    }
}
