mod common;

use common::{interchange, ELIGIBILITY_RESPONSE_BODY};
use x12_codec::{parse, ParseOptions, Transaction};

use pretty_assertions::assert_eq;

fn canonical() -> String {
    interchange("HB", "271", "005010X279A1", ELIGIBILITY_RESPONSE_BODY)
}

fn parse_strict(text: &str) -> Transaction {
    parse(text, &ParseOptions::strict()).unwrap()
}

#[test]
fn test_lf_after_terminator() {
    let expected = parse_strict(&canonical());
    let actual = parse_strict(&canonical().replace('~', "~\n"));
    assert_eq!(actual.body, expected.body);
    assert_eq!(actual.raw_segments, expected.raw_segments);
}

#[test]
fn test_crlf_after_terminator() {
    let expected = parse_strict(&canonical());
    let actual = parse_strict(&canonical().replace('~', "~\r\n"));
    assert_eq!(actual.raw_segments, expected.raw_segments);
}

#[test]
fn test_newline_inside_segment_is_noise() {
    let expected = parse_strict(&canonical());
    let text = canonical().replace("EB*C*IND", "EB*C*\nIND");
    let actual = parse_strict(&text);
    assert_eq!(actual.body, expected.body);
}

#[test]
fn test_byte_order_mark() {
    let expected = parse_strict(&canonical());
    let actual = parse_strict(&format!("\u{feff}{}", canonical()));
    assert_eq!(actual.envelope, expected.envelope);
    assert_eq!(actual.raw_segments.len(), expected.raw_segments.len());
}

#[test]
fn test_trailing_newlines() {
    let actual = parse_strict(&format!("{}\n\n\r\n", canonical()));
    assert_eq!(actual.raw_segments.last().map(|s| s.id.as_str()), Some("IEA"));
}
