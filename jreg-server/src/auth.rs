//! Caller authentication for the WebSocket transport
//!
//! The dispatcher does not know how callers prove who they are; it only
//! receives a yes/no per request. For WebSocket connections that verdict is
//! reached once, during the HTTP upgrade, by an [`Authenticator`] looking at
//! the handshake request. Every request on the connection inherits it.
//!
//! A rejected handshake is not refused: the connection is accepted as
//! anonymous, and methods that need authentication answer with a 401 error.

use std::sync::Arc;
use tokio_tungstenite::tungstenite::handshake::server::Request;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;

/// Decides whether a connecting client is authenticated
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, request: &Request) -> bool;
}

/// Accepts `Authorization: Bearer <token>` with a fixed token
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken").field("token", &"<redacted>").finish()
    }
}

impl Authenticator for BearerToken {
    fn authenticate(&self, request: &Request) -> bool {
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map_or(false, |token| token.trim() == self.token)
    }
}

/// Adapter from a closure to [`Authenticator`]
pub struct FnAuthenticator<F> {
    func: F,
}

impl<F> Authenticator for FnAuthenticator<F>
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    fn authenticate(&self, request: &Request) -> bool {
        (self.func)(request)
    }
}

/// Create an authenticator from a closure over the handshake request
pub fn authenticator_fn<F>(func: F) -> Arc<dyn Authenticator>
where
    F: Fn(&Request) -> bool + Send + Sync + 'static,
{
    Arc::new(FnAuthenticator { func })
}
