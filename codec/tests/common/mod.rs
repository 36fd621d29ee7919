//! Shared fixtures for the codec integration tests
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use x12_codec::{default_envelope_at, Envelope, TransactionType};

/// A well-formed 106 character ISA with the default delimiters
pub const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *240101*1200*^*00501*000000001*0*P*:~";

/// Wrap body segments in ISA/GS/ST ... SE/GE/IEA with a correct SE count
///
/// Body segments are given without their terminator.
pub fn interchange(functional_id: &str, st_code: &str, version: &str, body: &[&str]) -> String {
    let mut out = String::from(ISA);
    out.push_str(&format!(
        "GS*{functional_id}*SENDER*RECEIVER*20240101*1200*1*X*{version}~"
    ));
    out.push_str(&format!("ST*{st_code}*0001*{version}~"));
    for segment in body {
        out.push_str(segment);
        out.push('~');
    }
    out.push_str(&format!("SE*{}*0001~", body.len() + 2));
    out.push_str("GE*1*1~IEA*1*000000001~");
    out
}

pub fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

/// Default envelope with a fixed timestamp
pub fn envelope(transaction_type: TransactionType) -> Envelope {
    default_envelope_at(transaction_type, "SENDER", "RECEIVER", "1", stamp())
}

pub const PROFESSIONAL_BODY: &[&str] = &[
    "BHT*0019*00*CLM-100*20240101*1200*CH",
    "NM1*41*2*SUNRISE CLINIC*****46*1234567890",
    "PER*IC*JANE BILLER*TE*5551234567",
    "NM1*40*2*ACME HEALTH*****46*ACME01",
    "HL*1**20*1",
    "PRV*BI*PXC*207Q00000X",
    "NM1*85*2*SUNRISE CLINIC*****XX*1234567890",
    "N3*100 MAIN ST",
    "N4*SPRINGFIELD*IL*62701",
    "REF*EI*371234567",
    "HL*2*1*22*0",
    "SBR*P*18*GRP-42******CI",
    "NM1*IL*1*DOE*JOHN****MI*W123456789",
    "N3*12 ELM ST",
    "N4*SPRINGFIELD*IL*62702",
    "DMG*D8*19800115*M",
    "NM1*PR*2*ACME HEALTH*****PI*ACME01",
    "CLM*CLM-100*225***11:B:1*Y*A*Y*I",
    "REF*G1*AUTH-1",
    "HI*ABK:E119*ABF:I10",
    "NM1*82*1*SMITH*ALICE****XX*1098765432",
    "PRV*PE*PXC*207R00000X",
    "LX*1",
    "SV1*HC:99213:25*125*UN*1*11**1:2",
    "DTP*472*D8*20240105",
    "LX*2",
    "SV1*HC:85025*100*UN*2*11**1",
    "DTP*472*D8*20240105",
];

pub const INSTITUTIONAL_BODY: &[&str] = &[
    "BHT*0019*00*INST-7*20240101*1200*CH",
    "NM1*41*2*GENERAL HOSPITAL*****46*1112223333",
    "NM1*40*2*ACME HEALTH*****46*ACME01",
    "HL*1**20*1",
    "NM1*85*2*GENERAL HOSPITAL*****XX*1112223333",
    "N3*1 HOSPITAL WAY",
    "N4*SPRINGFIELD*IL*62701",
    "REF*EI*361111111",
    "HL*2*1*22*0",
    "SBR*P*18*******CI",
    "NM1*IL*1*ROE*RICHARD****MI*M987",
    "NM1*PR*2*ACME HEALTH*****PI*ACME01",
    "CLM*INST-7*5000***111:A:1*Y*A*Y*Y",
    "DTP*435*D8*20240201",
    "DTP*096*D8*20240205",
    "CL1*1*7*01",
    "HI*ABK:I214",
    "NM1*71*1*JONES*MARK****XX*1555555555",
    "LX*1",
    "SV2*0120**4000*DA*4",
    "DTP*472*RD8*20240201-20240205",
    "LX*2",
    "SV2*0300*HC:80053*1000*UN*1",
    "DTP*472*D8*20240202",
];

/// One claim: a service line carrying a CO-4 denial
pub const REMITTANCE_BODY: &[&str] = &[
    "BPR*I*0*C*NON************20240110",
    "TRN*1*0*1ACME01",
    "DTM*405*20240110",
    "N1*PR*ACME HEALTH",
    "N3*500 INSURANCE BLVD",
    "N4*HARTFORD*CT*06101",
    "REF*2U*ACME01",
    "N1*PE*SUNRISE CLINIC*XX*1234567890",
    "REF*TJ*371234567",
    "CLP*CLM-2024-001*4*1500*0*0*MC*PCN-77",
    "NM1*QC*1*DOE*JOHN",
    "SVC*HC:99215*1500*0**1",
    "DTM*472*20240102",
    "CAS*CO*4*500",
];

pub const ELIGIBILITY_RESPONSE_BODY: &[&str] = &[
    "BHT*0022*11*0001*20240101*1200",
    "HL*1**20*1",
    "NM1*PR*2*ACME HEALTH*****PI*ACME01",
    "HL*2*1*21*1",
    "NM1*1P*2*SUNRISE CLINIC*****XX*1234567890",
    "HL*3*2*22*0",
    "TRN*2*0001*91234567890",
    "NM1*IL*1*DOE*JOHN****MI*W123456789",
    "DMG*D8*19800115*M",
    "DTP*346*D8*20240101",
    "EB*1*IND*30**GOLD PPO",
    "EB*C*IND*30***23*1500",
    "DTP*307*RD8*20240101-20241231",
    "MSG*DEDUCTIBLE RESETS JANUARY 1",
];
