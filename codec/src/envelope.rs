//! Interchange (ISA/IEA), functional group (GS/GE) and transaction set (ST/SE) envelopes.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use x12_segment::{first, isa, Segment, SegmentWriter};

use crate::error::{X12Error, X12Result};
use crate::transaction::TransactionType;

/// ISA: Interchange Control Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeHeader {
    /// ISA01
    pub authorization_qualifier: String,
    /// ISA02
    pub authorization_info: String,
    /// ISA03
    pub security_qualifier: String,
    /// ISA04
    pub security_info: String,
    /// ISA05
    pub sender_id_qualifier: String,
    /// ISA06, stored without its fixed-width padding
    pub sender_id: String,
    /// ISA07
    pub receiver_id_qualifier: String,
    /// ISA08, stored without its fixed-width padding
    pub receiver_id: String,
    /// ISA09 (YYMMDD)
    pub date: String,
    /// ISA10 (HHMM)
    pub time: String,
    /// ISA11
    pub repetition_separator: String,
    /// ISA12
    pub version_number: String,
    /// ISA13
    pub control_number: String,
    /// ISA14
    pub acknowledgment_requested: String,
    /// ISA15 (T = test, P = production)
    pub usage_indicator: String,
    /// ISA16
    pub component_separator: String,
}

/// GS: Functional Group Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupHeader {
    pub functional_id_code: String,
    pub application_sender_code: String,
    pub application_receiver_code: String,
    /// CCYYMMDD
    pub date: String,
    pub time: String,
    pub group_control_number: String,
    pub responsible_agency_code: String,
    pub version_code: String,
}

/// ST: Transaction Set Header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSetHeader {
    pub transaction_set_id_code: String,
    pub transaction_set_control_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_convention_reference: Option<String>,
}

/// The three header segments that wrap a transaction set
///
/// Trailers are never stored: SE, GE and IEA are recomputed from the headers
/// and the emitted body whenever a document is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub isa: InterchangeHeader,
    pub gs: GroupHeader,
    pub st: TransactionSetHeader,
}

fn or_default(segment: &Segment, n: usize, default: &str) -> String {
    segment.optional(n).unwrap_or(default).to_string()
}

impl Envelope {
    /// Read the first ISA, GS and ST in the segment sequence
    ///
    /// Missing ISA fields fall back to their conventional values instead of
    /// failing; a short ISA is the validator's concern, not the parser's.
    pub fn parse(segments: &[Segment]) -> X12Result<Self> {
        let isa = first(segments, "ISA").ok_or(X12Error::MissingEnvelopeSegment { segment: "ISA" })?;
        let gs = first(segments, "GS").ok_or(X12Error::MissingEnvelopeSegment { segment: "GS" })?;
        let st = first(segments, "ST").ok_or(X12Error::MissingEnvelopeSegment { segment: "ST" })?;

        let isa = InterchangeHeader {
            authorization_qualifier: or_default(isa, 1, "00"),
            authorization_info: isa.element(2).trim().to_string(),
            security_qualifier: or_default(isa, 3, "00"),
            security_info: isa.element(4).trim().to_string(),
            sender_id_qualifier: isa.element(5).to_string(),
            sender_id: isa.element(6).trim().to_string(),
            receiver_id_qualifier: isa.element(7).to_string(),
            receiver_id: isa.element(8).trim().to_string(),
            date: isa.element(9).to_string(),
            time: isa.element(10).to_string(),
            repetition_separator: or_default(isa, 11, "^"),
            version_number: or_default(isa, 12, "00501"),
            control_number: isa.element(13).to_string(),
            acknowledgment_requested: or_default(isa, 14, "0"),
            usage_indicator: or_default(isa, 15, "P"),
            component_separator: isa
                .element(16)
                .chars()
                .next()
                .unwrap_or(':')
                .to_string(),
        };

        let gs = GroupHeader {
            functional_id_code: gs.element(1).to_string(),
            application_sender_code: gs.element(2).to_string(),
            application_receiver_code: gs.element(3).to_string(),
            date: gs.element(4).to_string(),
            time: gs.element(5).to_string(),
            group_control_number: gs.element(6).to_string(),
            responsible_agency_code: or_default(gs, 7, "X"),
            version_code: or_default(gs, 8, "005010X222A1"),
        };

        let st = TransactionSetHeader {
            transaction_set_id_code: st.element(1).to_string(),
            transaction_set_control_number: st.element(2).to_string(),
            implementation_convention_reference: st.optional(3).map(str::to_string),
        };

        Ok(Self { isa, gs, st })
    }

    /// ISA13 as it appears on the wire
    pub fn interchange_control_number(&self) -> String {
        isa::pad_left(&self.isa.control_number, 9)
    }

    /// Emit ISA, GS and ST
    ///
    /// ISA11 and ISA16 always reflect the writer's delimiters so the header
    /// describes the document it opens. `st_code` overrides ST01.
    pub fn write_header(&self, writer: &mut SegmentWriter, st_code: &str) {
        let delimiters = *writer.delimiters();
        let repetition = delimiters.repetition.to_string();
        let component = delimiters.component.to_string();

        let raw = [
            self.isa.authorization_qualifier.as_str(),
            self.isa.authorization_info.as_str(),
            self.isa.security_qualifier.as_str(),
            self.isa.security_info.as_str(),
            self.isa.sender_id_qualifier.as_str(),
            self.isa.sender_id.as_str(),
            self.isa.receiver_id_qualifier.as_str(),
            self.isa.receiver_id.as_str(),
            self.isa.date.as_str(),
            self.isa.time.as_str(),
            repetition.as_str(),
            self.isa.version_number.as_str(),
            self.isa.control_number.as_str(),
            self.isa.acknowledgment_requested.as_str(),
            self.isa.usage_indicator.as_str(),
            component.as_str(),
        ];
        let fields: Vec<String> = raw
            .iter()
            .enumerate()
            .map(|(i, value)| isa::fit_field(i, value))
            .collect();
        writer.push("ISA", fields);

        writer.push(
            "GS",
            [
                &self.gs.functional_id_code,
                &self.gs.application_sender_code,
                &self.gs.application_receiver_code,
                &self.gs.date,
                &self.gs.time,
                &self.gs.group_control_number,
                &self.gs.responsible_agency_code,
                &self.gs.version_code,
            ],
        );

        if st_code != self.st.transaction_set_id_code {
            tracing::warn!(
                envelope = %self.st.transaction_set_id_code,
                body = st_code,
                "ST01 rewritten to match transaction body"
            );
        }
        writer.push(
            "ST",
            [
                st_code,
                self.st.transaction_set_control_number.as_str(),
                self.st
                    .implementation_convention_reference
                    .as_deref()
                    .unwrap_or(""),
            ],
        );
    }

    /// Emit SE, GE and IEA
    ///
    /// The SE count is every segment written so far minus ISA and GS, plus SE itself.
    pub fn write_trailer(&self, writer: &mut SegmentWriter) {
        let count = writer.len() - 1;
        writer.push(
            "SE",
            [
                count.to_string(),
                self.st.transaction_set_control_number.clone(),
            ],
        );
        writer.push("GE", ["1", self.gs.group_control_number.as_str()]);
        writer.push("IEA", ["1".to_string(), self.interchange_control_number()]);
    }
}

/// Envelope with the conventional defaults for `transaction_type`, stamped now
pub fn default_envelope(
    transaction_type: TransactionType,
    sender_id: &str,
    receiver_id: &str,
    control_number: &str,
) -> Envelope {
    default_envelope_at(
        transaction_type,
        sender_id,
        receiver_id,
        control_number,
        Local::now().naive_local(),
    )
}

/// [`default_envelope`] with an explicit timestamp
pub fn default_envelope_at(
    transaction_type: TransactionType,
    sender_id: &str,
    receiver_id: &str,
    control_number: &str,
    at: NaiveDateTime,
) -> Envelope {
    let time = at.format("%H%M").to_string();
    let version = transaction_type.version();
    let delimiters = x12_segment::Delimiters::default();

    Envelope {
        isa: InterchangeHeader {
            authorization_qualifier: "00".into(),
            authorization_info: String::new(),
            security_qualifier: "00".into(),
            security_info: String::new(),
            sender_id_qualifier: "ZZ".into(),
            sender_id: sender_id.into(),
            receiver_id_qualifier: "ZZ".into(),
            receiver_id: receiver_id.into(),
            date: at.format("%y%m%d").to_string(),
            time: time.clone(),
            repetition_separator: delimiters.repetition.to_string(),
            version_number: "00501".into(),
            control_number: isa::pad_left(control_number, 9),
            acknowledgment_requested: "0".into(),
            usage_indicator: "P".into(),
            component_separator: delimiters.component.to_string(),
        },
        gs: GroupHeader {
            functional_id_code: transaction_type.functional_id_code().into(),
            application_sender_code: sender_id.into(),
            application_receiver_code: receiver_id.into(),
            date: at.format("%Y%m%d").to_string(),
            time,
            group_control_number: control_number.into(),
            responsible_agency_code: "X".into(),
            version_code: version.into(),
        },
        st: TransactionSetHeader {
            transaction_set_id_code: transaction_type.st_code().into(),
            transaction_set_control_number: isa::pad_left(control_number, 4),
            implementation_convention_reference: Some(version.into()),
        },
    }
}
