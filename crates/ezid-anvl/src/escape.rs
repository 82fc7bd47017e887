//! Percent-style escaping for ANVL element names, values, and URL paths.
//!
//! Escaped bytes are written as `%` followed by two uppercase hex digits.
//! Non-ASCII characters are always escaped byte-wise from their UTF-8 form.
//!
//! - **Values**: control characters (including `\n`, `\r`, `\t`) and `%`
//! - **Names**: everything escaped in values, plus `:` and any leading or
//!   trailing spaces
//! - **Paths**: identifiers and shoulders placed in a request path keep `/`
//!   and `:` readable
//!
//! Unescaping is tolerant: a `%` that is not followed by two hex digits is
//! kept literally instead of failing the whole record.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters that must be percent-encoded in ANVL values.
const VALUE_ESCAPE: &AsciiSet = &CONTROLS.add(b'%');

/// Characters that must be percent-encoded in ANVL element names.
const NAME_ESCAPE: &AsciiSet = &VALUE_ESCAPE.add(b':');

/// Characters that must be percent-encoded when an identifier or shoulder
/// is used as a URL path segment.
/// Note: `/` and `:` are preserved, the service expects them unescaped.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'{')
    .add(b'|')
    .add(b'}')
    .add(b'\\');

/// Escape an ANVL value.
///
/// # Examples
///
/// ```
/// use ezid_anvl::escape;
///
/// assert_eq!(escape("line one\nline two"), "line one%0Aline two");
/// assert_eq!(escape("100%"), "100%25");
/// // Colons are legal inside values
/// assert_eq!(escape("Test: resource"), "Test: resource");
/// ```
#[must_use]
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, VALUE_ESCAPE).to_string()
}

/// Escape an ANVL element name.
///
/// In addition to the value rules, `:` is escaped so it cannot be mistaken
/// for the name/value separator, and leading or trailing spaces are escaped
/// so they survive line parsing.
///
/// # Examples
///
/// ```
/// use ezid_anvl::escape_name;
///
/// assert_eq!(escape_name("datacite.title"), "datacite.title");
/// assert_eq!(escape_name("a:b"), "a%3Ab");
/// assert_eq!(escape_name(" padded "), "%20padded%20");
/// ```
#[must_use]
pub fn escape_name(name: &str) -> String {
    let without_leading = name.trim_start_matches(' ');
    let leading = name.len() - without_leading.len();
    let core = without_leading.trim_end_matches(' ');
    let trailing = without_leading.len() - core.len();

    let mut escaped = String::with_capacity(name.len() + 2 * (leading + trailing));
    for _ in 0..leading {
        escaped.push_str("%20");
    }
    escaped.extend(utf8_percent_encode(core, NAME_ESCAPE));
    for _ in 0..trailing {
        escaped.push_str("%20");
    }
    escaped
}

/// Escape an identifier or shoulder for use in a request path.
///
/// # Examples
///
/// ```
/// use ezid_anvl::escape_path;
///
/// assert_eq!(escape_path("doi:10.5072/FK2"), "doi:10.5072/FK2");
/// assert_eq!(escape_path("ark:/99999/fk4 x?"), "ark:/99999/fk4%20x%3F");
/// ```
#[must_use]
pub fn escape_path(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_ESCAPE).to_string()
}

/// Reverse any of the escapes above.
///
/// Malformed sequences (`%` followed by non-hex digits, or a trailing `%`)
/// are passed through literally. Byte sequences that do not form valid
/// UTF-8 are replaced with U+FFFD.
///
/// # Examples
///
/// ```
/// use ezid_anvl::{escape, unescape};
///
/// let original = "Keyser Söze\n100%";
/// assert_eq!(unescape(&escape(original)), original);
/// assert_eq!(unescape("50%zz off %"), "50%zz off %");
/// ```
#[must_use]
pub fn unescape(escaped: &str) -> String {
    percent_decode_str(escaped).decode_utf8_lossy().into_owned()
}
