//! Metadata profile tables.
//!
//! Each profile maps symbolic field names (`TITLE`) to the wire names the
//! service stores (`datacite.title`). The tables are read-only; the codec
//! never looks at them, they only help callers build [`ezid_anvl::Metadata`]
//! keys.

macro_rules! profile {
    (
        $(#[$meta:meta])*
        $name:ident, $profile:literal {
            $($(#[$vmeta:meta])* $variant:ident => $symbol:literal, $wire:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Every field of this profile.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Profile name as used in qualified lookups and `_profile`.
            pub const PROFILE: &'static str = $profile;

            /// Field name as stored by the service.
            #[must_use]
            pub fn wire_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Upper-case symbolic name.
            #[must_use]
            pub fn symbolic_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $symbol,)+
                }
            }

            /// Find a field by symbolic name (case-insensitive).
            #[must_use]
            pub fn from_symbolic(symbol: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|field| field.symbolic_name().eq_ignore_ascii_case(symbol))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.wire_name())
            }
        }

        impl From<$name> for String {
            fn from(field: $name) -> Self {
                field.wire_name().to_string()
            }
        }
    };
}

profile! {
    /// Service bookkeeping fields, prefixed with `_`.
    Internal, "internal" {
        /// Resolution target URL
        Target => "TARGET", "_target";
        /// Lifecycle status
        Status => "STATUS", "_status";
        /// Preferred metadata profile
        Profile => "PROFILE", "_profile";
        /// Whether the identifier is exported to search services
        Export => "EXPORT", "_export";
        /// Owning account
        Owner => "OWNER", "_owner";
        /// Owning group
        OwnerGroup => "OWNERGROUP", "_ownergroup";
        /// Creation time
        Created => "CREATED", "_created";
        /// Last update time
        Updated => "UPDATED", "_updated";
        /// Shadow ARK of a DOI
        ShadowedBy => "SHADOWEDBY", "_shadowedby";
        /// DOI shadowed by an ARK
        Shadows => "SHADOWS", "_shadows";
        /// Co-owning accounts
        CoOwners => "COOWNERS", "_coowners";
        /// DataCite datacenter
        DataCenter => "DATACENTER", "_datacenter";
        /// Crossref registration flag
        Crossref => "CROSSREF", "_crossref";
    }
}

profile! {
    /// DataCite kernel fields.
    DataCite, "datacite" {
        /// Full DataCite XML document
        Xml => "XML", "datacite";
        /// Creator names
        Creator => "CREATOR", "datacite.creator";
        /// Resource title
        Title => "TITLE", "datacite.title";
        /// Publisher
        Publisher => "PUBLISHER", "datacite.publisher";
        /// Year of publication
        PublicationYear => "PUBLICATIONYEAR", "datacite.publicationyear";
        /// General resource type
        ResourceType => "RESOURCETYPE", "datacite.resourcetype";
    }
}

profile! {
    /// Dublin Core fields.
    DublinCore, "dc" {
        /// Creator
        Creator => "CREATOR", "dc.creator";
        /// Title
        Title => "TITLE", "dc.title";
        /// Publisher
        Publisher => "PUBLISHER", "dc.publisher";
        /// Date
        Date => "DATE", "dc.date";
        /// Resource type
        Type => "TYPE", "dc.type";
    }
}

profile! {
    /// Electronic Resource Citation fields.
    Erc, "erc" {
        /// Full ERC record
        Record => "RECORD", "erc";
        /// Who made the resource
        Who => "WHO", "erc.who";
        /// What the resource is
        What => "WHAT", "erc.what";
        /// When it was made
        When => "WHEN", "erc.when";
    }
}

/// Read-only lookup from symbolic field name to wire field name.
pub trait FieldResolver {
    /// Resolve a symbolic name; `None` if the name is unknown.
    fn resolve(&self, symbolic: &str) -> Option<&'static str>;
}

/// Resolver over all built-in profiles.
///
/// Accepts wire names as-is (`datacite.title`), profile-qualified symbols
/// (`dc.TITLE`), and bare symbols (`TITLE`). Bare symbols are searched in
/// order internal, DataCite, Dublin Core, ERC.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileTables;

impl ProfileTables {
    fn wire_names() -> impl Iterator<Item = &'static str> {
        Internal::ALL
            .iter()
            .map(|f| f.wire_name())
            .chain(DataCite::ALL.iter().map(|f| f.wire_name()))
            .chain(DublinCore::ALL.iter().map(|f| f.wire_name()))
            .chain(Erc::ALL.iter().map(|f| f.wire_name()))
    }

    fn in_profile(profile: &str, symbol: &str) -> Option<&'static str> {
        if profile.eq_ignore_ascii_case(Internal::PROFILE) {
            Internal::from_symbolic(symbol).map(Internal::wire_name)
        } else if profile.eq_ignore_ascii_case(DataCite::PROFILE) {
            DataCite::from_symbolic(symbol).map(DataCite::wire_name)
        } else if profile.eq_ignore_ascii_case(DublinCore::PROFILE) {
            DublinCore::from_symbolic(symbol).map(DublinCore::wire_name)
        } else if profile.eq_ignore_ascii_case(Erc::PROFILE) {
            Erc::from_symbolic(symbol).map(Erc::wire_name)
        } else {
            None
        }
    }
}

impl FieldResolver for ProfileTables {
    fn resolve(&self, symbolic: &str) -> Option<&'static str> {
        if let Some(wire) = Self::wire_names().find(|wire| *wire == symbolic) {
            return Some(wire);
        }
        if let Some((profile, symbol)) = symbolic.split_once('.') {
            return Self::in_profile(profile, symbol);
        }
        [
            Internal::PROFILE,
            DataCite::PROFILE,
            DublinCore::PROFILE,
            Erc::PROFILE,
        ]
        .into_iter()
        .find_map(|profile| Self::in_profile(profile, symbolic))
    }
}
