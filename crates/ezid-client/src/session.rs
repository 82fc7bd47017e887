//! Session state machine.
//!
//! ```text
//!              login ok                    logout
//! Anonymous ─────────────► Authenticated ─────────► Closed
//!     ▲                         │
//!     └──── 401 on a request ───┘  (SessionExpired)
//! ```
//!
//! The session cookie lives only inside the `Authenticated` state, so an
//! operation can never run with a stale or missing token. Nothing here
//! re-authenticates on its own: after expiry the caller must log in again.

use crate::config::ClientConfig;
use crate::error::EzidError;
use crate::response::{message_of, Envelope, Outcome};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cookie::Cookie;

/// Name of the cookie the service issues at login.
pub const SESSION_COOKIE: &str = "sessionid";

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session cookie held
    Anonymous,
    /// Logged in; requests carry the session cookie
    Authenticated,
    /// Logged out; the session cannot be reused
    Closed,
}

enum Auth {
    Anonymous,
    Authenticated { cookie: String },
    Closed,
}

/// Authentication state for one logical actor.
///
/// All state-changing methods take `&mut self`; share a session across
/// tasks only behind external synchronization such as a mutex.
pub struct Session<T> {
    transport: T,
    config: ClientConfig,
    username: Option<String>,
    auth: Auth,
}

impl<T: Transport> Session<T> {
    /// Create an anonymous session.
    #[must_use]
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            config,
            username: None,
            auth: Auth::Anonymous,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.auth {
            Auth::Anonymous => SessionState::Anonymous,
            Auth::Authenticated { .. } => SessionState::Authenticated,
            Auth::Closed => SessionState::Closed,
        }
    }

    /// Account name of the last successful login, while authenticated.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Log in with HTTP Basic credentials and keep the returned cookie.
    ///
    /// Only valid while `Anonymous`. On any failure the session stays
    /// `Anonymous`.
    ///
    /// # Errors
    ///
    /// - [`EzidError::AlreadyAuthenticated`] / [`EzidError::SessionClosed`]
    ///   from the wrong state
    /// - [`EzidError::Authentication`] on 401/403
    /// - [`EzidError::Transport`] when no response arrives
    /// - [`EzidError::ProtocolFormat`] if no session cookie is returned
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), EzidError> {
        match self.auth {
            Auth::Anonymous => {}
            Auth::Authenticated { .. } => return Err(EzidError::AlreadyAuthenticated),
            Auth::Closed => return Err(EzidError::SessionClosed),
        }

        let url = self.config.url("/login");
        tracing::debug!(username, url, "PUT login");

        let request = HttpRequest::new(Method::Put, url, self.config.timeout)
            .header("Authorization", basic_auth(username, password));
        let response = self.transport.send(request).await?;

        if matches!(response.status, 401 | 403) {
            tracing::warn!(username, status = response.status, "Login rejected");
            return Err(EzidError::Authentication {
                status: response.status,
                message: message_of(&response.body),
            });
        }
        if !response.is_success() {
            return Err(EzidError::Operation {
                status: response.status,
                message: message_of(&response.body),
            });
        }
        let envelope = Envelope::parse(&response.body)?;
        if envelope.outcome == Outcome::Error {
            return Err(EzidError::Authentication {
                status: response.status,
                message: envelope.message,
            });
        }

        let cookie = session_cookie(&response).ok_or_else(|| {
            EzidError::ProtocolFormat("login response carried no session cookie".to_string())
        })?;

        self.username = Some(username.to_string());
        self.auth = Auth::Authenticated { cookie };
        tracing::info!(username, "Logged in");
        Ok(())
    }

    /// Log out and close the session.
    ///
    /// The cookie is discarded and the session is `Closed` whatever the
    /// service answers.
    ///
    /// # Errors
    ///
    /// - [`EzidError::SessionNotActive`] / [`EzidError::SessionClosed`] from
    ///   the wrong state (no request is sent)
    /// - [`EzidError::Transport`] or [`EzidError::Operation`] if the logout
    ///   request itself failed; the session is closed regardless
    pub async fn logout(&mut self) -> Result<(), EzidError> {
        let cookie = match std::mem::replace(&mut self.auth, Auth::Closed) {
            Auth::Authenticated { cookie } => cookie,
            Auth::Anonymous => {
                self.auth = Auth::Anonymous;
                return Err(EzidError::SessionNotActive);
            }
            Auth::Closed => return Err(EzidError::SessionClosed),
        };
        let username = self.username.take();

        let url = self.config.url("/logout");
        tracing::debug!(url, "GET logout");

        let request =
            HttpRequest::new(Method::Get, url, self.config.timeout).header("Cookie", cookie);
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Logout request failed; session closed locally");
                return Err(e.into());
            }
        };

        if !response.is_success() {
            tracing::warn!(status = response.status, "Logout rejected; session closed locally");
            return Err(EzidError::Operation {
                status: response.status,
                message: message_of(&response.body),
            });
        }

        tracing::info!(username = username.as_deref().unwrap_or_default(), "Logged out");
        Ok(())
    }

    /// Check that the session can carry a request, without sending one.
    ///
    /// # Errors
    ///
    /// - [`EzidError::SessionNotActive`] when `Anonymous`
    /// - [`EzidError::SessionClosed`] after logout
    pub fn require_active(&self) -> Result<(), EzidError> {
        self.cookie().map(|_| ())
    }

    fn cookie(&self) -> Result<&str, EzidError> {
        match &self.auth {
            Auth::Authenticated { cookie } => Ok(cookie),
            Auth::Anonymous => Err(EzidError::SessionNotActive),
            Auth::Closed => Err(EzidError::SessionClosed),
        }
    }

    /// Send a request carrying the session cookie.
    ///
    /// Status codes are returned to the caller uninterpreted, except that a
    /// 401 means the service dropped the session: the cookie is discarded,
    /// the session becomes `Anonymous`, and [`EzidError::SessionExpired`] is
    /// returned. A transport failure leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// - [`EzidError::SessionNotActive`] / [`EzidError::SessionClosed`]
    ///   without sending anything
    /// - [`EzidError::SessionExpired`] on 401
    /// - [`EzidError::Transport`] when no response arrives
    pub async fn authenticated_request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpResponse, EzidError> {
        let cookie = self.cookie()?.to_string();

        let url = self.config.url(path);
        let mut request =
            HttpRequest::new(method, url.clone(), self.config.timeout).header("Cookie", cookie);
        if let Some(body) = body {
            request = request.anvl_body(body);
        }

        let response = self.transport.send(request).await?;
        tracing::debug!(%method, url, status = response.status, "EZID response");

        if response.status == 401 {
            self.auth = Auth::Anonymous;
            self.username = None;
            tracing::warn!("Session expired; login required");
            return Err(EzidError::SessionExpired {
                message: message_of(&response.body),
            });
        }

        Ok(response)
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.auth {
            Auth::Anonymous => "Anonymous",
            Auth::Authenticated { .. } => "Authenticated",
            Auth::Closed => "Closed",
        };
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("username", &self.username)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Extract `name=value` of the session cookie from `Set-Cookie` headers.
///
/// Prefers the cookie named [`SESSION_COOKIE`]; otherwise takes the first
/// parseable one.
fn session_cookie(response: &HttpResponse) -> Option<String> {
    let cookies: Vec<Cookie<'_>> = response
        .header_values("set-cookie")
        .filter_map(|value| Cookie::parse(value).ok())
        .collect();
    cookies
        .iter()
        .find(|c| c.name() == SESSION_COOKIE)
        .or_else(|| cookies.first())
        .map(|c| format!("{}={}", c.name(), c.value()))
}
