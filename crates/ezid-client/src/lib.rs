//! # EZID Client
//!
//! Session-based client for the EZID persistent identifier service, which
//! issues and manages DOI and ARK identifiers.
//!
//! ## Flow
//!
//! 1. [`EzidClient::login`] exchanges Basic credentials for a session cookie
//! 2. Identifier operations (mint, create, get, set, delete) send ANVL bodies
//!    carrying the cookie
//! 3. Responses are parsed into a `success`/`error` envelope and failures are
//!    classified into [`EzidError`] variants
//! 4. [`EzidClient::logout`] closes the session for good
//!
//! Nothing is retried and nothing re-authenticates implicitly: an expired
//! session surfaces as [`EzidError::SessionExpired`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod identifier;
pub mod mock;
pub mod profile;
pub mod response;
pub mod session;
pub mod status;
pub mod transport;

pub use client::EzidClient;
pub use config::{ClientConfig, Credentials};
pub use error::{EzidError, TransportError};
pub use ezid_anvl::Metadata;
pub use identifier::{Identifier, Scheme, Shoulder};
pub use profile::{DataCite, DublinCore, Erc, FieldResolver, Internal, ProfileTables};
pub use session::{Session, SessionState};
pub use status::IdentifierStatus;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
