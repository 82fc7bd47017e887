//! In-memory EZID service for deterministic testing.
//!
//! [`MockService`] implements [`Transport`] and answers requests the way the
//! real service does: Basic-auth login issuing a `sessionid` cookie, shoulder
//! minting, create conflicts, partial metadata updates, reserved-only delete,
//! and `no such identifier` errors. Every request is recorded so tests can
//! assert that an operation made no network call.
//!
//! # Example
//!
//! ```
//! use ezid_client::mock::{MockService, MOCK_BASE_URL};
//! use ezid_client::{ClientConfig, EzidClient, Metadata};
//!
//! # tokio_test::block_on(async {
//! let service = MockService::new().with_user("apitest", "apitest");
//! let mut client =
//!     EzidClient::with_transport(ClientConfig::with_base_url(MOCK_BASE_URL), service.clone());
//!
//! client.login("apitest", "apitest").await.unwrap();
//! let id = client
//!     .mint_identifier("ark:/99999/fk4", &Metadata::new())
//!     .await
//!     .unwrap();
//! assert!(id.as_str().starts_with("ark:/99999/fk4"));
//! assert_eq!(service.request_count(), 2);
//! # });
//! ```

use crate::error::TransportError;
use crate::identifier::{Scheme, Shoulder};
use crate::profile::Internal;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ezid_anvl::{decode, encode, unescape, Metadata};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Base URL the mock answers to.
pub const MOCK_BASE_URL: &str = "http://ezid.mock";

/// Mock service. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockService {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    /// Accounts: username to password.
    users: HashMap<String, String>,
    /// Live sessions: cookie value to username.
    sessions: HashMap<String, String>,
    /// Stored identifiers.
    identifiers: HashMap<String, Metadata>,
    /// Counter for cookies and minted suffixes.
    counter: u64,
    /// Failure to return instead of the next response.
    fail_next: Option<TransportError>,
    /// Every request received, in order.
    requests: Vec<HttpRequest>,
}

impl MockService {
    /// Create an empty service with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account.
    #[must_use]
    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.state()
            .users
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Store an identifier directly, bypassing the API.
    pub fn insert_identifier(&self, identifier: &str, metadata: Metadata) {
        self.state()
            .identifiers
            .insert(identifier.to_string(), metadata);
    }

    /// Stored metadata for an identifier, if it exists.
    #[must_use]
    pub fn identifier(&self, identifier: &str) -> Option<Metadata> {
        self.state().identifiers.get(identifier).cloned()
    }

    /// Invalidate every live session, as a server-side expiry would.
    pub fn expire_sessions(&self) {
        self.state().sessions.clear();
    }

    /// Fail the next request with a transport error instead of answering.
    pub fn fail_next(&self, error: TransportError) {
        self.state().fail_next = Some(error);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockService {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state();
        state.requests.push(request.clone());
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        Ok(state.handle(&request))
    }
}

fn success(status: u16, message: &str) -> HttpResponse {
    HttpResponse::new(status, format!("success: {message}"))
}

fn bad_request(reason: &str) -> HttpResponse {
    HttpResponse::new(400, format!("error: bad request - {reason}"))
}

fn unauthorized() -> HttpResponse {
    HttpResponse::new(401, "error: unauthorized")
}

impl MockState {
    fn handle(&mut self, request: &HttpRequest) -> HttpResponse {
        let Some(path) = request.url.strip_prefix(MOCK_BASE_URL) else {
            return HttpResponse::new(404, "error: not found");
        };

        if path == "/login" {
            return match request.method {
                Method::Put | Method::Get => self.login(request),
                _ => HttpResponse::new(405, "error: method not allowed"),
            };
        }

        let Some(owner) = self.session_user(request) else {
            return unauthorized();
        };

        if path == "/logout" {
            if let Some(cookie) = request.header_value("cookie") {
                self.sessions.remove(cookie);
            }
            return success(200, "authentication credentials flushed");
        }

        let body = match request.body.as_deref().map(decode).transpose() {
            Ok(body) => body.unwrap_or_default(),
            Err(e) => return bad_request(&format!("ANVL parse error ({e})")),
        };

        if let Some(shoulder) = path.strip_prefix("/shoulder/") {
            return match request.method {
                Method::Post => self.mint(&unescape(shoulder), body, &owner),
                _ => HttpResponse::new(405, "error: method not allowed"),
            };
        }

        if let Some(identifier) = path.strip_prefix("/id/") {
            let identifier = unescape(identifier);
            return match request.method {
                Method::Get => self.get(&identifier),
                Method::Put => self.create(&identifier, body, &owner),
                Method::Post => self.update(&identifier, body),
                Method::Delete => self.delete(&identifier),
            };
        }

        HttpResponse::new(404, "error: not found")
    }

    fn login(&mut self, request: &HttpRequest) -> HttpResponse {
        let credentials = request
            .header_value("authorization")
            .and_then(|value| value.strip_prefix("Basic "))
            .and_then(|encoded| STANDARD.decode(encoded).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok());
        let Some((username, password)) = credentials.as_deref().and_then(|c| c.split_once(':'))
        else {
            return unauthorized();
        };
        if self.users.get(username).map(String::as_str) != Some(password) {
            return unauthorized();
        }

        self.counter += 1;
        let cookie = format!("sessionid=mock-session-{}", self.counter);
        self.sessions.insert(cookie.clone(), username.to_string());
        success(200, "session cookie returned")
            .header("Set-Cookie", format!("{cookie}; Path=/; HttpOnly"))
    }

    fn session_user(&self, request: &HttpRequest) -> Option<String> {
        request
            .header_value("cookie")
            .and_then(|cookie| self.sessions.get(cookie))
            .cloned()
    }

    fn mint(&mut self, shoulder: &str, metadata: Metadata, owner: &str) -> HttpResponse {
        let Ok(shoulder) = Shoulder::parse(shoulder) else {
            return bad_request("unrecognized shoulder");
        };
        self.counter += 1;
        let identifier = format!("{}{:06}", shoulder.as_str(), self.counter);
        self.store(&identifier, metadata, owner);
        match shoulder.scheme() {
            Scheme::Doi => {
                let shadow = format!("ark:/b{}", identifier.trim_start_matches("doi:10."));
                success(201, &format!("{identifier} | {}", shadow.to_lowercase()))
            }
            Scheme::Ark => success(201, &identifier),
        }
    }

    fn create(&mut self, identifier: &str, metadata: Metadata, owner: &str) -> HttpResponse {
        if self.identifiers.contains_key(identifier) {
            return bad_request("identifier already exists");
        }
        self.store(identifier, metadata, owner);
        success(201, identifier)
    }

    fn store(&mut self, identifier: &str, mut metadata: Metadata, owner: &str) {
        if !metadata.contains_key(Internal::Status.wire_name()) {
            metadata.insert(Internal::Status.wire_name(), "public");
        }
        metadata.insert(Internal::Owner.wire_name(), owner);
        self.identifiers.insert(identifier.to_string(), metadata);
    }

    fn get(&self, identifier: &str) -> HttpResponse {
        match self.identifiers.get(identifier) {
            Some(metadata) => HttpResponse::new(
                200,
                format!("success: {identifier}\n{}", encode(metadata)),
            ),
            None => bad_request("no such identifier"),
        }
    }

    fn update(&mut self, identifier: &str, metadata: Metadata) -> HttpResponse {
        match self.identifiers.get_mut(identifier) {
            Some(stored) => {
                stored.merge(metadata);
                success(200, identifier)
            }
            None => bad_request("no such identifier"),
        }
    }

    fn delete(&mut self, identifier: &str) -> HttpResponse {
        let Some(metadata) = self.identifiers.get(identifier) else {
            return bad_request("no such identifier");
        };
        if metadata.get(Internal::Status.wire_name()) != Some("reserved") {
            return bad_request("identifier status does not support deletion");
        }
        self.identifiers.remove(identifier);
        success(200, identifier)
    }
}
