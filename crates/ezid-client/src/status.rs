//! Identifier lifecycle status, carried in the `_status` field.

use crate::error::EzidError;
use crate::profile::Internal;
use ezid_anvl::Metadata;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierStatus {
    /// Not yet public; the only status from which deletion is allowed
    Reserved,
    /// Publicly resolvable
    Public,
    /// Withdrawn or otherwise unavailable, with an optional reason
    Unavailable {
        /// Text after `unavailable |`
        reason: Option<String>,
    },
}

impl IdentifierStatus {
    /// Read the status from a record's `_status` field.
    ///
    /// # Errors
    ///
    /// Returns [`EzidError::ProtocolFormat`] if the field holds an unknown
    /// status.
    pub fn from_metadata(metadata: &Metadata) -> Result<Option<Self>, EzidError> {
        metadata
            .get(Internal::Status.wire_name())
            .map(str::parse)
            .transpose()
    }

    /// Upsert this status into a record's `_status` field.
    pub fn write_to(&self, metadata: &mut Metadata) {
        metadata.insert(Internal::Status.wire_name(), self.to_string());
    }
}

impl fmt::Display for IdentifierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => f.write_str("reserved"),
            Self::Public => f.write_str("public"),
            Self::Unavailable { reason: None } => f.write_str("unavailable"),
            Self::Unavailable {
                reason: Some(reason),
            } => write!(f, "unavailable | {reason}"),
        }
    }
}

impl FromStr for IdentifierStatus {
    type Err = EzidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, reason) = match s.split_once('|') {
            Some((head, reason)) => (head.trim(), Some(reason.trim())),
            None => (s.trim(), None),
        };
        match head {
            "reserved" => Ok(Self::Reserved),
            "public" => Ok(Self::Public),
            "unavailable" => Ok(Self::Unavailable {
                reason: reason.filter(|r| !r.is_empty()).map(str::to_string),
            }),
            other => Err(EzidError::ProtocolFormat(format!(
                "unknown identifier status {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_statuses() {
        assert_eq!(
            "reserved".parse::<IdentifierStatus>().unwrap(),
            IdentifierStatus::Reserved
        );
        assert_eq!(
            " public ".parse::<IdentifierStatus>().unwrap(),
            IdentifierStatus::Public
        );
        assert_eq!(
            "unavailable".parse::<IdentifierStatus>().unwrap(),
            IdentifierStatus::Unavailable { reason: None }
        );
        assert_eq!(
            "unavailable | withdrawn by author"
                .parse::<IdentifierStatus>()
                .unwrap(),
            IdentifierStatus::Unavailable {
                reason: Some("withdrawn by author".to_string())
            }
        );
    }

    #[test]
    fn unknown_status_is_protocol_error() {
        assert!(matches!(
            "deleted".parse::<IdentifierStatus>(),
            Err(EzidError::ProtocolFormat(_))
        ));
    }

    #[test]
    fn display_roundtrip() {
        for status in [
            IdentifierStatus::Reserved,
            IdentifierStatus::Public,
            IdentifierStatus::Unavailable { reason: None },
            IdentifierStatus::Unavailable {
                reason: Some("withdrawn".to_string()),
            },
        ] {
            assert_eq!(status.to_string().parse::<IdentifierStatus>().unwrap(), status);
        }
    }

    #[test]
    fn read_and_write_metadata() {
        let mut metadata = Metadata::new();
        assert_eq!(IdentifierStatus::from_metadata(&metadata).unwrap(), None);

        IdentifierStatus::Reserved.write_to(&mut metadata);
        assert_eq!(metadata.get("_status"), Some("reserved"));
        assert_eq!(
            IdentifierStatus::from_metadata(&metadata).unwrap(),
            Some(IdentifierStatus::Reserved)
        );
    }
}
