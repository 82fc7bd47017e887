//! Property-based tests for the escaper and codec.
//!
//! These tests use proptest to check round-trip invariants over arbitrary
//! Unicode names and values, including empty and whitespace-only strings.

use proptest::prelude::*;

use ezid_anvl::{decode, decode_records, encode, escape, escape_name, unescape, Metadata};

/// Strategy for records with arbitrary names and values.
fn any_record(max_fields: usize) -> impl Strategy<Value = Metadata> {
    prop::collection::vec((any::<String>(), any::<String>()), 0..max_fields)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy biased toward characters the codec treats specially.
fn tricky_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            ':', '%', ' ', '\t', '\n', '\r', 'a', 'Z', '0', 'é', '资', '\u{0}', '\u{7f}',
        ]),
        0..12,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    /// Any value survives escaping.
    #[test]
    fn value_roundtrip(value in any::<String>()) {
        prop_assert_eq!(unescape(&escape(&value)), value);
    }

    /// Any name survives escaping.
    #[test]
    fn name_roundtrip(name in any::<String>()) {
        prop_assert_eq!(unescape(&escape_name(&name)), name);
    }

    /// Escaped text never contains a line break or a name separator.
    #[test]
    fn escaped_name_is_single_token(name in any::<String>()) {
        let escaped = escape_name(&name);
        prop_assert!(!escaped.contains(['\n', '\r', ':']));
        prop_assert!(!escaped.starts_with([' ', '\t']));
    }

    /// Any record survives encode then decode.
    #[test]
    fn record_roundtrip(record in any_record(16)) {
        let decoded = decode(&encode(&record)).unwrap();
        prop_assert_eq!(decoded, record);
    }

    /// Records built from separator-like characters survive encode then decode.
    #[test]
    fn tricky_record_roundtrip(
        pairs in prop::collection::vec((tricky_string(), tricky_string()), 0..8),
    ) {
        let record: Metadata = pairs.into_iter().collect();
        let decoded = decode(&encode(&record)).unwrap();
        prop_assert_eq!(decoded, record);
    }

    /// Each field encodes to exactly one line.
    #[test]
    fn encode_is_one_line_per_field(record in any_record(16)) {
        let text = encode(&record);
        prop_assert_eq!(text.matches('\n').count(), record.len());
    }

    /// Blank-line separated records decode back into the same sequence.
    #[test]
    fn record_stream_roundtrip(
        records in prop::collection::vec(any_record(6), 0..5),
    ) {
        let records: Vec<Metadata> = records.into_iter().filter(|r| !r.is_empty()).collect();
        let text: String = records.iter().map(|r| encode(r) + "\n").collect();
        prop_assert_eq!(decode_records(&text).unwrap(), records);
    }
}
