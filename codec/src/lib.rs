//! X12 Transaction Codec
//!
//! Parses HIPAA X12 documents into typed transactions and generates X12 text
//! back from them. Eight transaction sets are modeled: 837P, 837I, 835, 270,
//! 271, 276, 277 and 278.
//!
//! # Pipeline
//! ```text
//! text -> Document (delimiters + segments) -> Envelope -> TransactionType
//!      -> loops + typed body -> Transaction
//! ```
//! Generation runs the other way: envelope header, body segments written by
//! the transaction's builder, then SE/GE/IEA trailers with recomputed counts.
//!
//! # Usage
//! ```ignore
//! let transaction = x12_codec::parse(raw, &ParseOptions::default())?;
//! let text = x12_codec::generate(&transaction, &GenerateOptions::default())?;
//! ```

mod builders;
mod envelope;
mod error;
pub mod loops;
mod options;
mod transaction;

use x12_segment::{first, Document, Segment, SegmentWriter};

pub use builders::*;
pub use envelope::{
    default_envelope, default_envelope_at, Envelope, GroupHeader, InterchangeHeader,
    TransactionSetHeader,
};
pub use error::{X12Error, X12Result};
pub use loops::{build_loops, Loop};
pub use options::{GenerateOptions, ParseOptions};
pub use transaction::{Transaction, TransactionBody, TransactionType};
pub use x12_segment::Delimiters;

/// Parse one X12 document into a typed transaction
///
/// Only structural problems fail: no segments, a missing ISA/GS/ST, or an
/// unsupported ST01. With [`ParseOptions::strict`] a malformed ISA or a wrong
/// SE count fails as well; otherwise those are logged and tolerated.
pub fn parse(text: &str, options: &ParseOptions) -> X12Result<Transaction> {
    let document = Document::parse(text, options.delimiters);
    if document.segments.is_empty() {
        return Err(X12Error::NoSegments);
    }
    let segments = document.segments;

    let envelope = Envelope::parse(&segments)?;
    check_isa(&segments, options.strict)?;
    check_segment_count(&segments, options.strict)?;

    let transaction_type = TransactionType::classify(&envelope, &segments, &document.delimiters)?;

    let body_segments: Vec<Segment> = segments
        .iter()
        .filter(|s| !s.is_envelope())
        .cloned()
        .collect();
    let reader = builders::Reader::new(&body_segments, &document.delimiters);
    let body = builders::read(transaction_type, &reader);
    let loops = build_loops(&segments);

    tracing::debug!(
        transaction_type = %transaction_type,
        control_number = %envelope.st.transaction_set_control_number,
        segments = segments.len(),
        loops = loops.len(),
        "parsed transaction"
    );

    Ok(Transaction {
        envelope,
        raw_segments: segments,
        loops,
        body,
    })
}

/// Render a transaction as X12 text
///
/// ST01 always follows the body's transaction type. SE01, GE01 and IEA01 are
/// computed from what is written, never taken from the input.
pub fn generate(transaction: &Transaction, options: &GenerateOptions) -> X12Result<String> {
    if !options.delimiters.are_distinct() {
        return Err(X12Error::InvalidDelimiters);
    }

    let transaction_type = transaction.transaction_type();
    let mut writer = SegmentWriter::new(options.delimiters);
    transaction
        .envelope
        .write_header(&mut writer, transaction_type.st_code());
    builders::write(&transaction.body, &transaction.envelope, &mut writer);
    transaction.envelope.write_trailer(&mut writer);

    tracing::debug!(
        transaction_type = %transaction_type,
        segments = writer.len(),
        "generated transaction"
    );
    Ok(writer.finish(options.line_breaks))
}

fn check_isa(segments: &[Segment], strict: bool) -> X12Result<()> {
    let Some(isa) = first(segments, "ISA") else {
        return Ok(());
    };
    let found = isa.elements.len();
    if found == x12_segment::isa::ISA_ELEMENT_COUNT {
        return Ok(());
    }
    if strict {
        return Err(X12Error::InvalidIsa { found });
    }
    tracing::warn!(found, "ISA does not carry 16 elements");
    Ok(())
}

/// SE01 must count every segment from ST through SE inclusive
fn check_segment_count(segments: &[Segment], strict: bool) -> X12Result<()> {
    let Some(start) = segments.iter().position(|s| s.is("ST")) else {
        return Ok(());
    };
    let Some(offset) = segments[start..].iter().position(|s| s.is("SE")) else {
        if strict {
            return Err(X12Error::MissingEnvelopeSegment { segment: "SE" });
        }
        tracing::warn!("transaction set has no SE trailer");
        return Ok(());
    };

    let actual = offset + 1;
    let declared = segments[start + offset].element(1);
    if declared.trim().parse::<usize>().ok() == Some(actual) {
        return Ok(());
    }
    if strict {
        return Err(X12Error::SegmentCountMismatch {
            declared: declared.to_string(),
            actual,
        });
    }
    tracing::warn!(declared, actual, "SE segment count does not match");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ELIGIBILITY: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *240101*1200*^*00501*000000001*0*P*:~\
GS*HS*SENDER*RECEIVER*20240101*1200*1*X*005010X279A1~\
ST*270*0001*005010X279A1~\
BHT*0022*13*0001*20240101*1200~\
HL*1**20*1~\
NM1*PR*2*ACME HEALTH*****PI*12345~\
HL*2*1*21*1~\
NM1*1P*2*CLINIC*****XX*1234567890~\
HL*3*2*22*0~\
NM1*IL*1*DOE*JOHN****MI*W123~\
EQ*30~\
SE*10*0001~\
GE*1*1~\
IEA*1*000000001~";

    #[test]
    fn test_parse_eligibility_inquiry() {
        let transaction = parse(ELIGIBILITY, &ParseOptions::strict()).unwrap();
        assert_eq!(transaction.transaction_type(), TransactionType::EligibilityInquiry);
        assert_eq!(transaction.raw_segments.len(), 14);
        let TransactionBody::EligibilityInquiry(inquiry) = &transaction.body else {
            panic!("expected a 270 body");
        };
        assert_eq!(inquiry.information_source.payer_id, "12345");
        assert_eq!(inquiry.subscriber.member_id, "W123");
        assert_eq!(inquiry.eligibility_inquiries.len(), 1);
    }

    #[test]
    fn test_strict_rejects_wrong_count() {
        let text = ELIGIBILITY.replace("SE*10*0001", "SE*9*0001");
        assert_eq!(
            parse(&text, &ParseOptions::strict()).unwrap_err(),
            X12Error::SegmentCountMismatch {
                declared: "9".into(),
                actual: 10,
            }
        );
        assert!(parse(&text, &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("", &ParseOptions::default()), Err(X12Error::NoSegments));
        assert_eq!(parse(" \r\n ", &ParseOptions::default()), Err(X12Error::NoSegments));
    }

    #[test]
    fn test_generate_rejects_clashing_delimiters() {
        let transaction = parse(ELIGIBILITY, &ParseOptions::default()).unwrap();
        let options = GenerateOptions {
            delimiters: Delimiters {
                component: '*',
                ..Default::default()
            },
            line_breaks: false,
        };
        assert_eq!(generate(&transaction, &options), Err(X12Error::InvalidDelimiters));
    }
}
