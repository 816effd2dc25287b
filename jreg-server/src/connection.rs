//! WebSocket connection handling
//!
//! # Connection Lifecycle
//!
//! 1. **Upgrade**: the HTTP handshake is accepted and shown to the
//!    authenticator, fixing the connection's auth verdict
//! 2. **Process**: every text frame is a request body for the dispatcher
//! 3. **Close**: the peer closes, or the socket fails
//!
//! # Task Model
//!
//! A receive task reads frames and dispatches them; a send task drains an
//! outgoing channel into the socket. Replies to notifications are dropped
//! before they reach the channel.

use crate::auth::Authenticator;
use crate::dispatcher::Dispatcher;
use crate::metrics::ServerMetrics;
use futures::{SinkExt, StreamExt};
use jreg_core::{Error, Result};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// Serve a single WebSocket connection until it closes
#[tracing::instrument(skip(stream, dispatcher, authenticator, metrics, active), fields(conn_id = conn_id))]
pub async fn handle_connection(
    stream: TcpStream,
    conn_id: u64,
    dispatcher: Dispatcher,
    authenticator: Option<Arc<dyn Authenticator>>,
    metrics: Option<Arc<ServerMetrics>>,
    active: Arc<AtomicI64>,
) -> Result<()> {
    tracing::debug!("Upgrading connection to WebSocket");

    let mut authenticated = false;
    let callback = |request: &Request, response: Response| -> std::result::Result<Response, ErrorResponse> {
        if let Some(ref auth) = authenticator {
            authenticated = auth.authenticate(request);
        }
        Ok(response)
    };
    let ws_stream = accept_hdr_async(stream, callback)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    tracing::info!(authenticated = authenticated, "Connection upgraded");

    let open = active.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(ref m) = metrics {
        m.record_connections(open);
    }

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                tracing::error!(error = %e, "Error sending message");
                break;
            }
        }
        if let Err(e) = ws_sender.close().await {
            tracing::warn!(error = %e, "Error closing WebSocket");
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let outcome = dispatcher
                        .dispatch_outcome(text.as_bytes(), authenticated)
                        .await;
                    let Some(body) = outcome.to_reply_body() else {
                        continue;
                    };
                    // the dispatcher only ever produces UTF-8 JSON
                    let text = String::from_utf8_lossy(&body).into_owned();
                    if tx.send(Message::Text(text)).is_err() {
                        tracing::debug!("Send task gone, dropping reply");
                        break;
                    }
                }
                Ok(Message::Binary(data)) => {
                    let outcome = dispatcher.dispatch_outcome(&data, authenticated).await;
                    if let Some(body) = outcome.to_reply_body() {
                        if tx.send(Message::Binary(body)).is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Connection closed by client");
                    break;
                }
                Ok(_) => {} // ping/pong is handled by tungstenite
                Err(e) => {
                    tracing::error!(error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            // dropping the sender ends the send task after it flushes
            if let Err(e) = send_task.await {
                tracing::warn!(error = %e, "Send task failed during shutdown");
            }
        }
    }

    let open = active.fetch_sub(1, Ordering::SeqCst) - 1;
    if let Some(ref m) = metrics {
        m.record_connections(open);
    }
    tracing::info!("Connection cleaned up");

    Ok(())
}
