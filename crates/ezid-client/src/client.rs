//! Identifier operations over an authenticated session.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | mint      | `POST /shoulder/{shoulder}` |
//! | create    | `PUT /id/{identifier}` |
//! | get       | `GET /id/{identifier}` |
//! | set       | `POST /id/{identifier}` |
//! | delete    | `DELETE /id/{identifier}` |
//!
//! Request bodies are ANVL-encoded metadata; responses are parsed into an
//! [`Envelope`](crate::response::Envelope) and failures are classified into
//! [`EzidError`] variants.

use crate::config::{ClientConfig, Credentials};
use crate::error::EzidError;
use crate::identifier::{Identifier, Shoulder};
use crate::response::{classify, Request};
use crate::session::{Session, SessionState};
use crate::transport::{Method, ReqwestTransport, Transport};
use ezid_anvl::{encode, escape_path, Metadata};

/// Client for the EZID identifier service.
#[derive(Debug)]
pub struct EzidClient<T = ReqwestTransport> {
    session: Session<T>,
}

impl EzidClient<ReqwestTransport> {
    /// Create a client using the `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, EzidError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> EzidClient<T> {
    /// Create a client over any transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            session: Session::new(config, transport),
        }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Log in. See [`Session::login`].
    ///
    /// # Errors
    ///
    /// See [`Session::login`].
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), EzidError> {
        self.session.login(username, password).await
    }

    /// Log in with stored credentials.
    ///
    /// # Errors
    ///
    /// See [`Session::login`].
    pub async fn login_with(&mut self, credentials: &Credentials) -> Result<(), EzidError> {
        self.session
            .login(&credentials.username, &credentials.password)
            .await
    }

    /// Log out. See [`Session::logout`].
    ///
    /// # Errors
    ///
    /// See [`Session::logout`].
    pub async fn logout(&mut self) -> Result<(), EzidError> {
        self.session.logout().await
    }

    /// Mint a new identifier under `shoulder`.
    ///
    /// # Errors
    ///
    /// - [`EzidError::SessionNotActive`] / [`EzidError::SessionClosed`] if
    ///   not logged in, checked before the shoulder
    /// - [`EzidError::InvalidIdentifier`] for a shoulder without a
    ///   `doi:`/`ark:` prefix, before any request
    /// - [`EzidError::Operation`] with the service's message on rejection
    pub async fn mint_identifier(
        &mut self,
        shoulder: &str,
        metadata: &Metadata,
    ) -> Result<Identifier, EzidError> {
        self.session.require_active()?;
        let shoulder = Shoulder::parse(shoulder)?;
        let path = format!("/shoulder/{}", escape_path(shoulder.as_str()));

        let response = self
            .session
            .authenticated_request(Method::Post, &path, Some(encode(metadata)))
            .await?;
        let envelope = classify(Request::Mint, &response, shoulder.as_str())?;
        let identifier = Identifier::from_success_message(&envelope.message)?;

        tracing::info!(shoulder = %shoulder, identifier = %identifier, "Minted identifier");
        Ok(identifier)
    }

    /// Register a caller-chosen identifier.
    ///
    /// # Errors
    ///
    /// - session errors if not logged in, then
    ///   [`EzidError::InvalidIdentifier`], both before any request
    /// - [`EzidError::IdentifierExists`] if the identifier is taken
    /// - [`EzidError::Operation`] on other rejections
    pub async fn create_identifier(
        &mut self,
        identifier: &str,
        metadata: &Metadata,
    ) -> Result<Identifier, EzidError> {
        self.session.require_active()?;
        let requested = Identifier::parse(identifier)?;

        let response = self
            .session
            .authenticated_request(Method::Put, &id_path(&requested), Some(encode(metadata)))
            .await?;
        let envelope = classify(Request::Create, &response, requested.as_str())?;
        let created = Identifier::from_success_message(&envelope.message)?;

        tracing::info!(identifier = %created, "Created identifier");
        Ok(created)
    }

    /// Fetch an identifier's metadata, including internal `_` fields.
    ///
    /// # Errors
    ///
    /// - session errors if not logged in, then
    ///   [`EzidError::InvalidIdentifier`], both before any request
    /// - [`EzidError::NotFound`] if the identifier is unknown
    /// - [`EzidError::ProtocolFormat`] if the metadata is not valid ANVL
    pub async fn get_metadata(&mut self, identifier: &str) -> Result<Metadata, EzidError> {
        self.session.require_active()?;
        let identifier = Identifier::parse(identifier)?;

        let response = self
            .session
            .authenticated_request(Method::Get, &id_path(&identifier), None)
            .await?;
        let envelope = classify(Request::Get, &response, identifier.as_str())?;

        tracing::debug!(identifier = %identifier, fields = envelope.metadata.len(), "Fetched metadata");
        Ok(envelope.metadata)
    }

    /// Upsert the given fields; fields not mentioned are left untouched.
    ///
    /// # Errors
    ///
    /// - session errors if not logged in, then
    ///   [`EzidError::InvalidIdentifier`], both before any request
    /// - [`EzidError::NotFound`] if the identifier is unknown
    /// - [`EzidError::Operation`] on other rejections
    pub async fn set_metadata(
        &mut self,
        identifier: &str,
        metadata: &Metadata,
    ) -> Result<(), EzidError> {
        self.session.require_active()?;
        let identifier = Identifier::parse(identifier)?;

        let response = self
            .session
            .authenticated_request(Method::Post, &id_path(&identifier), Some(encode(metadata)))
            .await?;
        classify(Request::Set, &response, identifier.as_str())?;

        tracing::info!(identifier = %identifier, fields = metadata.len(), "Updated metadata");
        Ok(())
    }

    /// Delete an identifier. The service only allows this while the
    /// identifier is `reserved`.
    ///
    /// # Errors
    ///
    /// - session errors if not logged in, then
    ///   [`EzidError::InvalidIdentifier`], both before any request
    /// - [`EzidError::NotFound`] if the identifier is unknown
    /// - [`EzidError::Operation`] carrying the service's reason otherwise
    pub async fn delete_identifier(&mut self, identifier: &str) -> Result<(), EzidError> {
        self.session.require_active()?;
        let identifier = Identifier::parse(identifier)?;

        let response = self
            .session
            .authenticated_request(Method::Delete, &id_path(&identifier), None)
            .await?;
        classify(Request::Delete, &response, identifier.as_str())?;

        tracing::info!(identifier = %identifier, "Deleted identifier");
        Ok(())
    }
}

fn id_path(identifier: &Identifier) -> String {
    format!("/id/{}", escape_path(identifier.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockService, MOCK_BASE_URL};
    use crate::profile::{DataCite, DublinCore, Internal};
    use crate::status::IdentifierStatus;
    use crate::transport::ANVL_CONTENT_TYPE;

    const DOI_SHOULDER: &str = "doi:10.5072/FK2";
    const ARK_SHOULDER: &str = "ark:/99999/fk4";

    fn metadata(identifier: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(
            DataCite::Title,
            format!("Test entry from ezid service for identifier: {identifier}"),
        );
        metadata.insert(DataCite::Creator, "Keyser Söze");
        metadata.insert(DataCite::Publisher, "EZID Rust Library");
        metadata.insert(DataCite::PublicationYear, "2026");
        metadata
    }

    async fn logged_in() -> (MockService, EzidClient<MockService>) {
        let service = MockService::new().with_user("apitest", "apitest");
        let mut client =
            EzidClient::with_transport(ClientConfig::with_base_url(MOCK_BASE_URL), service.clone());
        client.login("apitest", "apitest").await.unwrap();
        (service, client)
    }

    #[tokio::test]
    async fn mint_doi() {
        let (service, mut client) = logged_in().await;
        let mut md = metadata("ToBeMinted");
        md.insert(Internal::Target, "http://example.com/ezidExample/");

        let id = client.mint_identifier(DOI_SHOULDER, &md).await.unwrap();
        assert!(id.as_str().starts_with(DOI_SHOULDER));

        let request = service.requests().pop().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, format!("{MOCK_BASE_URL}/shoulder/{DOI_SHOULDER}"));
        assert_eq!(request.header_value("content-type"), Some(ANVL_CONTENT_TYPE));
        assert!(request
            .body
            .unwrap()
            .contains("datacite.creator: Keyser S%C3%B6ze\n"));

        let stored = service.identifier(id.as_str()).unwrap();
        assert_eq!(stored.get("datacite.creator"), Some("Keyser Söze"));
        assert_eq!(stored.get("_target"), Some("http://example.com/ezidExample/"));
    }

    #[tokio::test]
    async fn mint_rejects_unprefixed_shoulder_without_request() {
        let (service, mut client) = logged_in().await;
        let sent = service.request_count();

        for shoulder in ["", "10.5072/FK2", "doi:"] {
            let err = client
                .mint_identifier(shoulder, &Metadata::new())
                .await
                .unwrap_err();
            assert!(matches!(err, EzidError::InvalidIdentifier(_)));
        }
        assert_eq!(service.request_count(), sent);
    }

    #[tokio::test]
    async fn create_then_conflict() {
        let (_service, mut client) = logged_in().await;
        let identifier = format!("{DOI_SHOULDER}/TEST/20261016");

        let created = client
            .create_identifier(&identifier, &metadata(&identifier))
            .await
            .unwrap();
        assert_eq!(created.as_str(), identifier);

        let err = client
            .create_identifier(&identifier, &metadata(&identifier))
            .await
            .unwrap_err();
        assert!(matches!(err, EzidError::IdentifierExists { identifier: ref i, .. } if *i == identifier));
    }

    #[tokio::test]
    async fn set_and_get_metadata() {
        let (_service, mut client) = logged_in().await;
        let id = client
            .mint_identifier(DOI_SHOULDER, &metadata("ToBeMinted"))
            .await
            .unwrap();

        let mut update = Metadata::new();
        update.insert(DublinCore::Title, "A Dublin Core resource title");
        client.set_metadata(id.as_str(), &update).await.unwrap();

        let fetched = client.get_metadata(id.as_str()).await.unwrap();
        assert_eq!(fetched.get("dc.title"), Some("A Dublin Core resource title"));
        // Untouched fields survive a partial update
        assert_eq!(fetched.get("datacite.publisher"), Some("EZID Rust Library"));
        assert_eq!(
            IdentifierStatus::from_metadata(&fetched).unwrap(),
            Some(IdentifierStatus::Public)
        );
    }

    #[tokio::test]
    async fn metadata_with_newlines_roundtrips() {
        let (_service, mut client) = logged_in().await;
        let xml = "<?xml version=\"1.0\"?>\n<resource>\r\n\t<title>100% done</title>\n</resource>\n";
        let mut md = Metadata::new();
        md.insert(DataCite::Xml, xml);

        let id = client.mint_identifier(ARK_SHOULDER, &md).await.unwrap();
        let fetched = client.get_metadata(id.as_str()).await.unwrap();
        assert_eq!(fetched.get("datacite"), Some(xml));
    }

    #[tokio::test]
    async fn get_unknown_identifier() {
        let (_service, mut client) = logged_in().await;
        let err = client
            .get_metadata("doi:10.5072/FK2DOESNOTEXIST")
            .await
            .unwrap_err();
        assert!(matches!(err, EzidError::NotFound { .. }));
    }

    #[tokio::test]
    async fn set_unknown_identifier() {
        let (_service, mut client) = logged_in().await;
        let err = client
            .set_metadata("ark:/99999/fk4nothere", &metadata("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, EzidError::NotFound { .. }));
    }

    #[tokio::test]
    async fn failed_set_leaves_caller_record_untouched() {
        let (_service, mut client) = logged_in().await;
        let update = metadata("x");
        let before = update.clone();
        let _ = client.set_metadata("ark:/99999/fk4nothere", &update).await;
        assert_eq!(update, before);
    }

    #[tokio::test]
    async fn delete_reserved_identifier() {
        let (service, mut client) = logged_in().await;
        let identifier = format!("{ARK_SHOULDER}/TEST/20261016");
        let mut md = Metadata::new();
        IdentifierStatus::Reserved.write_to(&mut md);

        let id = client.create_identifier(&identifier, &md).await.unwrap();
        client.delete_identifier(id.as_str()).await.unwrap();
        assert!(service.identifier(id.as_str()).is_none());

        let err = client.delete_identifier(id.as_str()).await.unwrap_err();
        assert!(matches!(err, EzidError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_public_identifier_is_rejected_and_metadata_kept() {
        let (_service, mut client) = logged_in().await;
        let id = client
            .mint_identifier(DOI_SHOULDER, &metadata("public"))
            .await
            .unwrap();
        let before = client.get_metadata(id.as_str()).await.unwrap();

        let err = client.delete_identifier(id.as_str()).await.unwrap_err();
        match err {
            EzidError::Operation { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("does not support deletion"));
            }
            other => panic!("expected Operation error, got {other:?}"),
        }

        let after = client.get_metadata(id.as_str()).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn operations_before_login_make_no_request() {
        let service = MockService::new().with_user("apitest", "wrong");
        let mut client =
            EzidClient::with_transport(ClientConfig::with_base_url(MOCK_BASE_URL), service.clone());

        let err = client.login("apitest", "apitest").await.unwrap_err();
        assert!(matches!(err, EzidError::Authentication { .. }));
        assert_eq!(client.state(), SessionState::Anonymous);
        let sent = service.request_count();

        let md = metadata("x");
        assert!(matches!(
            client.mint_identifier(DOI_SHOULDER, &md).await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.create_identifier("ark:/99999/fk4a", &md).await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.get_metadata("ark:/99999/fk4a").await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.set_metadata("ark:/99999/fk4a", &md).await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.delete_identifier("ark:/99999/fk4a").await,
            Err(EzidError::SessionNotActive)
        ));
        assert_eq!(service.request_count(), sent);
    }

    #[tokio::test]
    async fn session_state_is_checked_before_arguments() {
        let service = MockService::new();
        let mut client =
            EzidClient::with_transport(ClientConfig::with_base_url(MOCK_BASE_URL), service.clone());
        let md = Metadata::new();

        assert!(matches!(
            client.mint_identifier("not-a-shoulder", &md).await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.create_identifier("", &md).await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.get_metadata("10.5072/FK2X").await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.set_metadata("bogus", &md).await,
            Err(EzidError::SessionNotActive)
        ));
        assert!(matches!(
            client.delete_identifier("bogus").await,
            Err(EzidError::SessionNotActive)
        ));
        assert_eq!(service.request_count(), 0);
    }

    #[tokio::test]
    async fn operations_after_logout_report_closed() {
        let (service, mut client) = logged_in().await;
        client.logout().await.unwrap();
        let sent = service.request_count();

        assert!(matches!(
            client.get_metadata("ark:/99999/fk4a").await,
            Err(EzidError::SessionClosed)
        ));
        assert_eq!(service.request_count(), sent);
    }

    #[tokio::test]
    async fn expired_session_requires_explicit_login() {
        let (service, mut client) = logged_in().await;
        let id = client
            .mint_identifier(ARK_SHOULDER, &Metadata::new())
            .await
            .unwrap();

        service.expire_sessions();
        assert!(matches!(
            client.get_metadata(id.as_str()).await,
            Err(EzidError::SessionExpired { .. })
        ));
        assert!(matches!(
            client.get_metadata(id.as_str()).await,
            Err(EzidError::SessionNotActive)
        ));

        client
            .login_with(&Credentials::new("apitest", "apitest"))
            .await
            .unwrap();
        assert!(client.get_metadata(id.as_str()).await.is_ok());
    }
}
