//! Transports that carry encoded envelopes to a server
//!
//! The proxy only produces and consumes bytes. How they travel is up to a
//! [`Transport`]:
//!
//! - [`WsTransport`]: a WebSocket connection to a `jreg-server`
//! - [`from_fn`]: any async closure, e.g. one that feeds a `Dispatcher`
//!   in-process for tests

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use jreg_core::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Carries one request body to the server and brings back the reply
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a body and wait for the response body
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>>;

    /// Send a body that expects no response
    ///
    /// The default waits for and discards a reply, which suits transports
    /// that always answer.
    async fn send_notification(&self, body: Vec<u8>) -> Result<()> {
        self.send(body).await.map(|_| ())
    }
}

/// Adapter from an async closure to [`Transport`]
pub struct FnTransport<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>>> + Send,
{
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        (self.func)(body).await
    }
}

/// Create a transport from an async closure
///
/// ```rust
/// use jreg_client::transport;
///
/// let echo = transport::from_fn(|body| async move { Ok(body) });
/// ```
pub fn from_fn<F, Fut>(func: F) -> Arc<dyn Transport>
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    Arc::new(FnTransport { func })
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport
///
/// Requests on one connection are serialized: the server answers frames in
/// order, so the next text frame is the reply to the request just sent.
pub struct WsTransport {
    stream: Mutex<WsStream>,
}

impl WsTransport {
    /// Connect without credentials
    #[tracing::instrument(skip(url), fields(url = url))]
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_request(url, None).await
    }

    /// Connect presenting `Authorization: Bearer <token>` at the handshake
    #[tracing::instrument(skip(url, token), fields(url = url))]
    pub async fn connect_with_token(url: &str, token: &str) -> Result<Self> {
        Self::connect_request(url, Some(token)).await
    }

    async fn connect_request(url: &str, token: Option<&str>) -> Result<Self> {
        let mut request = url
            .into_client_request()
            .map_err(|e| Error::Transport(e.to_string()))?;

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::Usage(format!("Invalid token: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        tracing::info!("Connecting to server");
        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        tracing::info!("Connected successfully");

        Ok(Self {
            stream: Mutex::new(stream),
        })
    }

    /// Close the connection
    pub async fn close(&self) -> Result<()> {
        self.stream
            .lock()
            .await
            .close(None)
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    async fn write(stream: &mut WsStream, body: Vec<u8>) -> Result<()> {
        let text = String::from_utf8(body).map_err(|e| Error::Serialization(e.to_string()))?;
        stream
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        let mut stream = self.stream.lock().await;
        Self::write(&mut stream, body).await?;

        while let Some(message) = stream.next().await {
            match message.map_err(|e| Error::Transport(e.to_string()))? {
                Message::Text(text) => return Ok(text.into_bytes()),
                Message::Binary(data) => return Ok(data),
                Message::Close(_) => break,
                _ => {} // ping/pong
            }
        }

        Err(Error::Transport("Connection closed before a reply arrived".to_string()))
    }

    async fn send_notification(&self, body: Vec<u8>) -> Result<()> {
        let mut stream = self.stream.lock().await;
        Self::write(&mut stream, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_transport() {
        let transport = from_fn(|body: Vec<u8>| async move {
            let mut reply = b"echo:".to_vec();
            reply.extend(body);
            Ok(reply)
        });

        let reply = transport.send(b"hi".to_vec()).await.unwrap();
        assert_eq!(reply, b"echo:hi");
        transport.send_notification(b"x".to_vec()).await.unwrap();
    }

    #[tokio::test]
    async fn test_fn_transport_error() {
        let transport = from_fn(|_body| async { Err(Error::Transport("down".into())) });
        let err = transport.send(Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_ws_connect_refused() {
        // port 9 (discard) is not expected to run a WebSocket server
        let result = WsTransport::connect("ws://127.0.0.1:9/").await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
