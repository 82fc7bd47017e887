//! ANVL encoder and decoder.
//!
//! A record is a sequence of `name: value` lines. On decode, a physical line
//! that starts with a space or tab continues the previous value; the pieces
//! are joined with a single space before unescaping. A blank line (or a line
//! holding only `:`) ends a record.
//!
//! The encoder never folds long values, so each field is exactly one line.

use crate::escape::{escape, escape_name, unescape};
use crate::record::Metadata;

/// Encode a record as ANVL text, one `name: value` line per field.
///
/// An empty record encodes to an empty string.
///
/// # Examples
///
/// ```
/// use ezid_anvl::{encode, Metadata};
///
/// let mut record = Metadata::new();
/// record.insert("_target", "http://example.com/");
/// record.insert("datacite.title", "Two\nlines");
/// assert_eq!(
///     encode(&record),
///     "_target: http://example.com/\ndatacite.title: Two%0Alines\n"
/// );
/// ```
#[must_use]
pub fn encode(record: &Metadata) -> String {
    let mut text = String::new();
    for (name, value) in record {
        text.push_str(&escape_name(name));
        text.push_str(": ");
        text.push_str(&escape(value));
        text.push('\n');
    }
    text
}

/// Decode ANVL text into a single record.
///
/// If the text holds several blank-line separated records their fields are
/// merged. Duplicate names are not an error: the last occurrence wins.
///
/// # Errors
///
/// Returns [`AnvlError`] if a non-blank line has no `:` separator, or if a
/// continuation line appears before any `name:` line of its record.
///
/// # Examples
///
/// ```
/// use ezid_anvl::decode;
///
/// let record = decode("title: Test: resource\nnote: A long\n  note\n").unwrap();
/// assert_eq!(record.get("title"), Some("Test: resource"));
/// assert_eq!(record.get("note"), Some("A long note"));
/// ```
pub fn decode(text: &str) -> Result<Metadata, AnvlError> {
    let mut merged = Metadata::new();
    for record in decode_records(text)? {
        merged.merge(record);
    }
    Ok(merged)
}

/// Decode a stream of blank-line separated ANVL records.
///
/// Empty records (runs of blank lines) are skipped.
///
/// # Errors
///
/// Same conditions as [`decode`].
pub fn decode_records(text: &str) -> Result<Vec<Metadata>, AnvlError> {
    let mut parser = Parser::default();
    for (index, raw) in text.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        parser.feed(index + 1, line)?;
    }
    Ok(parser.finish())
}

#[derive(Default)]
struct Parser {
    records: Vec<Metadata>,
    current: Metadata,
    pending: Option<(String, String)>,
}

impl Parser {
    fn feed(&mut self, line_number: usize, line: &str) -> Result<(), AnvlError> {
        if is_record_break(line) {
            self.end_record();
            return Ok(());
        }

        if line.starts_with([' ', '\t']) {
            let Some((_, value)) = self.pending.as_mut() else {
                return Err(AnvlError::OrphanContinuation { line: line_number });
            };
            value.push(' ');
            value.push_str(line.trim_start_matches([' ', '\t']));
            return Ok(());
        }

        // Escaped colons are `%3A`, so the first literal colon is the separator.
        let Some((name, value)) = line.split_once(':') else {
            return Err(AnvlError::MissingSeparator {
                line: line_number,
                content: line.to_string(),
            });
        };
        self.flush();
        let value = value.strip_prefix(' ').unwrap_or(value);
        self.pending = Some((name.to_string(), value.to_string()));
        Ok(())
    }

    fn flush(&mut self) {
        if let Some((name, value)) = self.pending.take() {
            self.current.insert(unescape(&name), unescape(&value));
        }
    }

    fn end_record(&mut self) {
        self.flush();
        if !self.current.is_empty() {
            self.records.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Vec<Metadata> {
        self.end_record();
        self.records
    }
}

/// A blank line, or a line that is exactly `:`. An empty name still encodes
/// as `": value"`, so the separator is never matched after trimming.
fn is_record_break(line: &str) -> bool {
    line == ":" || line.trim().is_empty()
}

/// Errors produced when decoding malformed ANVL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnvlError {
    /// A non-blank line had no `:` separator
    #[error("ANVL line {line} has no ':' separator: {content:?}")]
    MissingSeparator {
        /// 1-based line number
        line: usize,
        /// Offending line
        content: String,
    },
    /// A continuation line appeared before any `name:` line
    #[error("ANVL line {line} continues a value but no element precedes it")]
    OrphanContinuation {
        /// 1-based line number
        line: usize,
    },
}
