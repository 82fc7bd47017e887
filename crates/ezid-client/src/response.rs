//! Response envelope parsing and error classification.
//!
//! Every EZID response body starts with a status line, `success: <message>`
//! or `error: <message>`, optionally followed by ANVL metadata.

use crate::error::EzidError;
use crate::transport::HttpResponse;
use ezid_anvl::{decode, unescape, Metadata};

/// Outcome token of a response's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `success:`
    Success,
    /// `error:`
    Error,
}

/// A parsed response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Outcome token
    pub outcome: Outcome,
    /// Message or identifier after the token
    pub message: String,
    /// Metadata lines following the status line
    pub metadata: Metadata,
}

impl Envelope {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns [`EzidError::ProtocolFormat`] if the first line is not a
    /// `success`/`error` status line or the remainder is not valid ANVL.
    pub fn parse(body: &str) -> Result<Self, EzidError> {
        let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
        let first = first.strip_suffix('\r').unwrap_or(first);

        let (token, message) = first.split_once(':').ok_or_else(|| {
            EzidError::ProtocolFormat(format!("missing status line in response: {first:?}"))
        })?;
        let outcome = match token.trim() {
            "success" => Outcome::Success,
            "error" => Outcome::Error,
            other => {
                return Err(EzidError::ProtocolFormat(format!(
                    "unknown response status {other:?}"
                )))
            }
        };

        Ok(Self {
            outcome,
            message: unescape(message.trim()),
            metadata: decode(rest)?,
        })
    }
}

/// Markers the service uses in error messages.
const NOT_FOUND_MARKER: &str = "no such identifier";
const EXISTS_MARKER: &str = "already exists";

/// The identifier operation a response answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Request {
    Mint,
    Create,
    Get,
    Set,
    Delete,
}

impl Request {
    /// Only a caller-chosen identifier can collide with an existing one.
    fn can_conflict(self) -> bool {
        self == Self::Create
    }
}

/// Turn a response into a success envelope or a classified error.
///
/// `identifier` names the subject of the request for error reporting.
pub(crate) fn classify(
    request: Request,
    response: &HttpResponse,
    identifier: &str,
) -> Result<Envelope, EzidError> {
    let parsed = Envelope::parse(&response.body);

    if response.is_success() {
        let envelope = parsed?;
        if envelope.outcome == Outcome::Success {
            return Ok(envelope);
        }
        return Err(rejection(request, response.status, identifier, envelope.message));
    }

    let message = match parsed {
        Ok(envelope) => envelope.message,
        Err(_) => response.body.trim().to_string(),
    };
    Err(rejection(request, response.status, identifier, message))
}

fn rejection(request: Request, status: u16, identifier: &str, message: String) -> EzidError {
    let lowered = message.to_ascii_lowercase();
    if status == 404 || lowered.contains(NOT_FOUND_MARKER) {
        EzidError::NotFound {
            identifier: identifier.to_string(),
            message,
        }
    } else if request.can_conflict() && (status == 409 || lowered.contains(EXISTS_MARKER)) {
        EzidError::IdentifierExists {
            identifier: identifier.to_string(),
            message,
        }
    } else {
        EzidError::Operation { status, message }
    }
}

/// Best-effort message from a body that may or may not be an envelope.
pub(crate) fn message_of(body: &str) -> String {
    Envelope::parse(body).map_or_else(|_| body.trim().to_string(), |envelope| envelope.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success_with_metadata() {
        let envelope = Envelope::parse(
            "success: doi:10.5072/FK2X\n_status: public\ndatacite.title: A%0AB\n",
        )
        .unwrap();
        assert_eq!(envelope.outcome, Outcome::Success);
        assert_eq!(envelope.message, "doi:10.5072/FK2X");
        assert_eq!(envelope.metadata.get("_status"), Some("public"));
        assert_eq!(envelope.metadata.get("datacite.title"), Some("A\nB"));
    }

    #[test]
    fn parse_error_line_only() {
        let envelope = Envelope::parse("error: bad request - no such identifier").unwrap();
        assert_eq!(envelope.outcome, Outcome::Error);
        assert_eq!(envelope.message, "bad request - no such identifier");
        assert!(envelope.metadata.is_empty());
    }

    #[test]
    fn parse_rejects_non_envelope() {
        assert!(matches!(
            Envelope::parse("<html>oops</html>"),
            Err(EzidError::ProtocolFormat(_))
        ));
        assert!(matches!(
            Envelope::parse("maybe: later"),
            Err(EzidError::ProtocolFormat(_))
        ));
        assert!(matches!(Envelope::parse(""), Err(EzidError::ProtocolFormat(_))));
    }

    #[test]
    fn classify_success() {
        let response = HttpResponse::new(201, "success: ark:/99999/fk4a");
        let envelope = classify(Request::Mint, &response, "ark:/99999/fk4").unwrap();
        assert_eq!(envelope.message, "ark:/99999/fk4a");
    }

    #[test]
    fn classify_not_found_by_marker_and_status() {
        let by_marker = HttpResponse::new(400, "error: bad request - no such identifier");
        assert!(matches!(
            classify(Request::Get, &by_marker, "doi:10.5072/NOPE"),
            Err(EzidError::NotFound { identifier, .. }) if identifier == "doi:10.5072/NOPE"
        ));

        let by_status = HttpResponse::new(404, "Not Found");
        assert!(matches!(
            classify(Request::Get, &by_status, "doi:10.5072/NOPE"),
            Err(EzidError::NotFound { message, .. }) if message == "Not Found"
        ));
    }

    #[test]
    fn classify_conflict() {
        let response = HttpResponse::new(400, "error: bad request - identifier already exists");
        assert!(matches!(
            classify(Request::Create, &response, "ark:/99999/fk4a"),
            Err(EzidError::IdentifierExists { .. })
        ));

        let by_status = HttpResponse::new(409, "error: conflict");
        assert!(matches!(
            classify(Request::Create, &by_status, "ark:/99999/fk4a"),
            Err(EzidError::IdentifierExists { .. })
        ));
    }

    #[test]
    fn conflict_markers_only_apply_to_create() {
        let response = HttpResponse::new(400, "error: bad request - element already exists");
        for request in [Request::Mint, Request::Set, Request::Delete] {
            assert!(matches!(
                classify(request, &response, "ark:/99999/fk4a"),
                Err(EzidError::Operation { status: 400, .. })
            ));
        }

        let conflict = HttpResponse::new(409, "error: conflict");
        assert!(matches!(
            classify(Request::Set, &conflict, "ark:/99999/fk4a"),
            Err(EzidError::Operation { status: 409, .. })
        ));
    }

    #[test]
    fn classify_generic_rejection_keeps_message() {
        let response = HttpResponse::new(
            400,
            "error: bad request - identifier status does not support deletion",
        );
        match classify(Request::Delete, &response, "doi:10.5072/X") {
            Err(EzidError::Operation { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad request - identifier status does not support deletion");
            }
            other => panic!("expected Operation error, got {other:?}"),
        }
    }

    #[test]
    fn classify_server_error_with_raw_body() {
        let response = HttpResponse::new(500, "Internal Server Error\n");
        assert!(matches!(
            classify(Request::Get, &response, "doi:10.5072/X"),
            Err(EzidError::Operation { status: 500, message }) if message == "Internal Server Error"
        ));
    }

    #[test]
    fn classify_malformed_success_body() {
        let response = HttpResponse::new(200, "garbage");
        assert!(matches!(
            classify(Request::Get, &response, "doi:10.5072/X"),
            Err(EzidError::ProtocolFormat(_))
        ));
    }

    #[test]
    fn classify_error_envelope_with_success_status() {
        let response = HttpResponse::new(200, "error: something odd");
        assert!(matches!(
            classify(Request::Get, &response, "doi:10.5072/X"),
            Err(EzidError::Operation { status: 200, .. })
        ));
    }
}
