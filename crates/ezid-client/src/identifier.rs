//! Identifier and shoulder types.
//!
//! Both are plain strings that must start with a recognized scheme prefix.
//! Validation happens before any request is sent.

use crate::error::EzidError;
use std::fmt;
use std::str::FromStr;

/// Identifier scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Digital Object Identifier, `doi:` prefix
    Doi,
    /// Archival Resource Key, `ark:` prefix
    Ark,
}

impl Scheme {
    /// Prefix including the trailing colon.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Doi => "doi:",
            Self::Ark => "ark:",
        }
    }

    /// Detect the scheme of a scheme-prefixed string.
    #[must_use]
    pub fn detect(value: &str) -> Option<Self> {
        [Self::Doi, Self::Ark].into_iter().find(|scheme| {
            value
                .get(..scheme.prefix().len())
                .is_some_and(|head| head.eq_ignore_ascii_case(scheme.prefix()))
        })
    }
}

fn validate(value: &str) -> Result<Scheme, EzidError> {
    let value = value.trim();
    let scheme =
        Scheme::detect(value).ok_or_else(|| EzidError::InvalidIdentifier(value.to_string()))?;
    if value.len() == scheme.prefix().len() {
        return Err(EzidError::InvalidIdentifier(value.to_string()));
    }
    Ok(scheme)
}

/// A full identifier such as `doi:10.5072/FK2ABC` or `ark:/99999/fk4xyz`.
///
/// Immutable once created; only its metadata changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    value: String,
    scheme: Scheme,
}

impl Identifier {
    /// Validate and wrap an identifier string.
    ///
    /// # Errors
    ///
    /// Returns [`EzidError::InvalidIdentifier`] if the string lacks a
    /// `doi:`/`ark:` prefix or has nothing after it.
    pub fn parse(value: &str) -> Result<Self, EzidError> {
        let scheme = validate(value)?;
        Ok(Self {
            value: value.trim().to_string(),
            scheme,
        })
    }

    /// The identifier's scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Parse the identifier out of a mint/create success message.
    ///
    /// DOI responses carry a shadow ARK after ` | `, which is dropped.
    pub(crate) fn from_success_message(message: &str) -> Result<Self, EzidError> {
        let (primary, shadow) = match message.split_once('|') {
            Some((primary, shadow)) => (primary, Some(shadow.trim())),
            None => (message, None),
        };
        let identifier = Self::parse(primary).map_err(|_| {
            EzidError::ProtocolFormat(format!("no identifier in success response: {message:?}"))
        })?;
        if let Some(shadow) = shadow {
            tracing::debug!(identifier = %identifier, shadow, "Ignoring shadow identifier");
        }
        Ok(identifier)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Identifier {
    type Err = EzidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// A namespace prefix under which identifiers are minted,
/// e.g. `doi:10.5072/FK2` or `ark:/99999/fk4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shoulder {
    value: String,
    scheme: Scheme,
}

impl Shoulder {
    /// Validate and wrap a shoulder string.
    ///
    /// # Errors
    ///
    /// Returns [`EzidError::InvalidIdentifier`] for an empty or unprefixed
    /// shoulder.
    pub fn parse(value: &str) -> Result<Self, EzidError> {
        let scheme = validate(value)?;
        Ok(Self {
            value: value.trim().to_string(),
            scheme,
        })
    }

    /// The shoulder's scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The shoulder as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Shoulder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Shoulder {
    type Err = EzidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
