mod common;

use common::{interchange, ISA, PROFESSIONAL_BODY};
use x12_codec::{parse, ParseOptions, TransactionBody, TransactionType, X12Error};

use pretty_assertions::assert_eq;

#[test]
fn test_missing_gs() {
    let text = interchange("HC", "837", "005010X222A1", PROFESSIONAL_BODY);
    let start = text.find("GS*").unwrap();
    let end = start + text[start..].find('~').unwrap() + 1;
    let without_gs = format!("{}{}", &text[..start], &text[end..]);

    assert_eq!(
        parse(&without_gs, &ParseOptions::default()).unwrap_err(),
        X12Error::MissingEnvelopeSegment { segment: "GS" }
    );
}

#[test]
fn test_missing_st() {
    let text = format!("{ISA}GS*HC*S*R*20240101*1200*1*X*005010X222A1~GE*0*1~IEA*1*000000001~");
    assert_eq!(
        parse(&text, &ParseOptions::default()).unwrap_err(),
        X12Error::MissingEnvelopeSegment { segment: "ST" }
    );
}

#[test]
fn test_missing_isa() {
    let text = "GS*HC*S*R*20240101*1200*1*X*005010X222A1~ST*837*0001~SE*2*0001~";
    assert_eq!(
        parse(text, &ParseOptions::default()).unwrap_err(),
        X12Error::MissingEnvelopeSegment { segment: "ISA" }
    );
}

#[test]
fn test_unsupported_transaction_type() {
    let text = interchange("BE", "834", "005010X220A1", &["BGN*00*1*20240101"]);
    let err = parse(&text, &ParseOptions::default()).unwrap_err();
    assert_eq!(err, X12Error::UnsupportedTransactionType { code: "834".into() });
    assert_eq!(err.to_string(), "Unsupported transaction type: 834");
}

#[test]
fn test_short_isa_strict_and_lenient() {
    // ISA with only 15 elements: ISA16 dropped
    let short = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *240101*1200*^*00501*000000001*0*P~\
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

    assert_eq!(
        parse(short, &ParseOptions::strict()).unwrap_err(),
        X12Error::InvalidIsa { found: 15 }
    );

    let lenient = parse(short, &ParseOptions::default()).unwrap();
    assert_eq!(lenient.transaction_type(), TransactionType::EligibilityInquiry);
    assert_eq!(lenient.envelope.isa.component_separator, ":");
    let TransactionBody::EligibilityInquiry(inquiry) = &lenient.body else {
        panic!("expected a 270 body");
    };
    assert_eq!(inquiry.subscriber.member_id, "W123");
}

#[test]
fn test_missing_se_strict() {
    let text = interchange("HC", "837", "005010X222A1", PROFESSIONAL_BODY);
    let start = text.find("SE*").unwrap();
    let end = start + text[start..].find('~').unwrap() + 1;
    let without_se = format!("{}{}", &text[..start], &text[end..]);

    assert_eq!(
        parse(&without_se, &ParseOptions::strict()).unwrap_err(),
        X12Error::MissingEnvelopeSegment { segment: "SE" }
    );
    assert!(parse(&without_se, &ParseOptions::default()).is_ok());
}

#[test]
fn test_garbage_is_not_x12() {
    let err = parse("hello world", &ParseOptions::default()).unwrap_err();
    assert_eq!(err, X12Error::MissingEnvelopeSegment { segment: "ISA" });
}
