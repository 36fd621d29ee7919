use serde::{Deserialize, Serialize};
use x12_segment::{Segment, SegmentWriter};

use super::common::{
    amount, format_amount, optional_amount, owned, procedure_composite, read_procedure,
    reference, timestamp, write_organization, DateRange, Dependent, Hierarchy, InformationReceiver,
    InformationSource, Subscriber,
};
use super::Reader;
use crate::envelope::Envelope;

/// Provider whose claims are being asked about (HL 19)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProvider {
    pub name: String,
    pub npi: String,
}

impl ServiceProvider {
    fn read(reader: &Reader<'_>, entity_code: &str) -> Option<Self> {
        reader.entity(entity_code).map(|e| Self {
            name: e.head.element(3).to_string(),
            npi: e.head.element(9).to_string(),
        })
    }
}

/// 276 health care claim status request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatusInquiry {
    pub information_source: InformationSource,
    pub information_receiver: InformationReceiver,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<ServiceProvider>,
    pub subscriber: Subscriber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent: Option<Dependent>,
    pub claim_status_inquiries: Vec<ClaimInquiry>,
}

/// One claim asked about, opened by its TRN trace number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInquiry {
    /// TRN02
    pub claim_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_claim_control_number: Option<String>,
    /// REF*BLT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_type: Option<String>,
    /// AMT*T3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<DateRange>,
}

impl ClaimInquiry {
    fn read(claim: &Reader<'_>) -> Option<Self> {
        let trn = claim.first("TRN")?;
        Some(Self {
            claim_id: trn.element(2).to_string(),
            payer_claim_control_number: reference(claim, "1K"),
            bill_type: reference(claim, "BLT"),
            charge_amount: optional_amount(claim.find("AMT", 1, "T3").and_then(|a| a.optional(2))),
            service_date: claim.find("DTP", 1, "472").map(|dtp| DateRange::read(dtp, 2)),
        })
    }

    fn write(&self, writer: &mut SegmentWriter, originator: &str) {
        writer.push("TRN", ["1", self.claim_id.as_str(), originator]);
        if let Some(number) = &self.payer_claim_control_number {
            writer.push("REF", ["1K", number.as_str()]);
        }
        if let Some(bill_type) = &self.bill_type {
            writer.push("REF", ["BLT", bill_type.as_str()]);
        }
        if let Some(charge) = self.charge_amount {
            writer.push("AMT", ["T3".to_string(), format_amount(charge)]);
        }
        if let Some(date) = &self.service_date {
            date.write(writer, "472");
        }
    }
}

/// 277 health care claim status response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatusResponse {
    pub information_source: InformationSource,
    pub information_receiver: InformationReceiver,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<ServiceProvider>,
    pub subscriber: Subscriber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent: Option<Dependent>,
    pub claim_statuses: Vec<ClaimStatus>,
}

/// Status of one claim: its TRN, the claim-level STC and any service lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatus {
    pub claim_id: String,
    /// STC01-1
    pub claim_status_category_code: String,
    /// STC01-2
    pub claim_status_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_claim_charge_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_claim_payment_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_claim_control_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_line_statuses: Vec<ServiceLineStatus>,
}

/// SVC with its own STC and DTP*472
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineStatus {
    pub procedure_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedure_modifiers: Vec<String>,
    pub charge_amount: f64,
    pub paid_amount: f64,
    pub status_category_code: String,
    pub status_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<DateRange>,
}

/// Category and status codes of an STC01 composite
fn read_stc(reader: &Reader<'_>, stc: Option<&Segment>) -> (String, String) {
    let Some(stc) = stc else {
        return (String::new(), String::new());
    };
    let components = reader.components(stc, 1);
    let component = |n: usize| components.get(n).copied().unwrap_or("").to_string();
    (component(0), component(1))
}

fn category_or_default(category: &str) -> &str {
    if category.is_empty() {
        "F0"
    } else {
        category
    }
}

impl ServiceLineStatus {
    fn read(line: &Reader<'_>) -> Option<Self> {
        let svc = line.first("SVC")?;
        let (procedure_code, procedure_modifiers) = read_procedure(line, svc, 1);
        let (status_category_code, status_code) = read_stc(line, line.first("STC"));
        Some(Self {
            procedure_code,
            procedure_modifiers,
            charge_amount: amount(svc.element(2)),
            paid_amount: amount(svc.element(3)),
            status_category_code,
            status_code,
            service_date: line.find("DTP", 1, "472").map(|dtp| DateRange::read(dtp, 2)),
        })
    }

    fn write(&self, writer: &mut SegmentWriter) {
        let procedure = procedure_composite(writer, &self.procedure_code, &self.procedure_modifiers);
        writer.push(
            "SVC",
            [
                procedure,
                format_amount(self.charge_amount),
                format_amount(self.paid_amount),
            ],
        );
        let status = writer.composite([
            category_or_default(&self.status_category_code),
            self.status_code.as_str(),
        ]);
        writer.push("STC", [status]);
        if let Some(date) = &self.service_date {
            date.write(writer, "472");
        }
    }
}

impl ClaimStatus {
    /// Human readable meaning of the acknowledgement categories
    pub fn category_description(&self) -> &'static str {
        match self.claim_status_category_code.as_str() {
            "A0" => "Forwarded",
            "A1" => "Pending",
            "A2" => "Accepted",
            "A3" => "Rejected",
            "A4" => "Not Found",
            "A5" => "Split",
            _ => "Unknown",
        }
    }

    fn read(claim: &Reader<'_>) -> Option<Self> {
        let trn = claim.first("TRN")?;
        let header = claim.until("SVC");
        let stc = header.first("STC");
        let (claim_status_category_code, claim_status_code) = read_stc(claim, stc);

        Some(Self {
            claim_id: trn.element(2).to_string(),
            claim_status_category_code,
            claim_status_code,
            effective_date: owned(stc.and_then(|s| s.optional(2))),
            total_claim_charge_amount: optional_amount(stc.and_then(|s| s.optional(4))),
            total_claim_payment_amount: optional_amount(stc.and_then(|s| s.optional(5))),
            payer_claim_control_number: reference(&header, "1K"),
            service_line_statuses: claim
                .anchored("SVC")
                .iter()
                .filter_map(ServiceLineStatus::read)
                .collect(),
        })
    }

    fn write(&self, writer: &mut SegmentWriter, originator: &str) {
        writer.push("TRN", ["2", self.claim_id.as_str(), originator]);
        let status = writer.composite([
            category_or_default(&self.claim_status_category_code),
            self.claim_status_code.as_str(),
        ]);
        writer.push(
            "STC",
            [
                status,
                self.effective_date.clone().unwrap_or_default(),
                String::new(),
                self.total_claim_charge_amount
                    .map(format_amount)
                    .unwrap_or_default(),
                self.total_claim_payment_amount
                    .map(format_amount)
                    .unwrap_or_default(),
            ],
        );
        if let Some(number) = &self.payer_claim_control_number {
            writer.push("REF", ["1K", number.as_str()]);
        }
        for line in &self.service_line_statuses {
            line.write(writer);
        }
    }
}

/// Source, receiver, optional provider, subscriber and optional dependent
/// levels shared by 276 and 277
struct Parties<'a> {
    source: &'a InformationSource,
    receiver: &'a InformationReceiver,
    provider: Option<&'a ServiceProvider>,
    provider_code: &'a str,
    subscriber: &'a Subscriber,
    dependent: Option<&'a Dependent>,
}

impl Parties<'_> {
    fn write(&self, writer: &mut SegmentWriter) {
        let mut hierarchy = Hierarchy::default();
        let source_level = hierarchy.push(writer, None, "20", true);
        self.source.write(writer, "PR");
        let mut parent = hierarchy.push(writer, Some(source_level), "21", true);
        self.receiver.write(writer, "41");

        if let Some(provider) = self.provider {
            parent = hierarchy.push(writer, Some(parent), "19", true);
            write_organization(writer, self.provider_code, &provider.name, "XX", &provider.npi);
        }

        let subscriber_level = hierarchy.push(writer, Some(parent), "22", self.dependent.is_some());
        self.subscriber.write(writer);

        if let Some(dependent) = self.dependent {
            hierarchy.push(writer, Some(subscriber_level), "23", false);
            dependent.write(writer, "QC");
        }
    }
}

fn write_bht(writer: &mut SegmentWriter, purpose: &str, envelope: &Envelope) {
    let (date, time) = timestamp();
    writer.push(
        "BHT",
        [
            "0010",
            purpose,
            envelope.st.transaction_set_control_number.as_str(),
            date.as_str(),
            time.as_str(),
        ],
    );
}

impl ClaimStatusInquiry {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let claim_status_inquiries: Vec<ClaimInquiry> = reader
            .anchored("TRN")
            .iter()
            .filter_map(ClaimInquiry::read)
            .collect();
        tracing::debug!(claims = claim_status_inquiries.len(), "read claim status inquiry");

        Self {
            information_source: InformationSource::read(reader, "PR"),
            information_receiver: InformationReceiver::read(reader, "41"),
            service_provider: ServiceProvider::read(reader, "1P"),
            subscriber: Subscriber::read(reader),
            dependent: Dependent::read(&reader.after("HL", 3, "23"), "QC"),
            claim_status_inquiries,
        }
    }

    pub(crate) fn write(&self, envelope: &Envelope, writer: &mut SegmentWriter) {
        write_bht(writer, "13", envelope);
        Parties {
            source: &self.information_source,
            receiver: &self.information_receiver,
            provider: self.service_provider.as_ref(),
            provider_code: "1P",
            subscriber: &self.subscriber,
            dependent: self.dependent.as_ref(),
        }
        .write(writer);

        let originator = format!("9{}", self.information_receiver.npi);
        for inquiry in &self.claim_status_inquiries {
            inquiry.write(writer, &originator);
        }
    }
}

impl ClaimStatusResponse {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let claim_statuses: Vec<ClaimStatus> = reader
            .anchored("TRN")
            .iter()
            .filter_map(ClaimStatus::read)
            .collect();
        tracing::debug!(claims = claim_statuses.len(), "read claim status response");

        Self {
            information_source: InformationSource::read(reader, "PR"),
            information_receiver: InformationReceiver::read(reader, "41"),
            service_provider: ServiceProvider::read(reader, "85"),
            subscriber: Subscriber::read(reader),
            dependent: Dependent::read(&reader.after("HL", 3, "23"), "QC"),
            claim_statuses,
        }
    }

    pub(crate) fn write(&self, envelope: &Envelope, writer: &mut SegmentWriter) {
        write_bht(writer, "08", envelope);
        Parties {
            source: &self.information_source,
            receiver: &self.information_receiver,
            provider: self.service_provider.as_ref(),
            provider_code: "85",
            subscriber: &self.subscriber,
            dependent: self.dependent.as_ref(),
        }
        .write(writer);

        let originator = format!("9{}", self.information_receiver.npi);
        for status in &self.claim_statuses {
            status.write(writer, &originator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use x12_segment::Delimiters;

    #[test]
    fn test_statuses_grouped_by_trace() {
        let segments = vec![
            Segment::new("NM1", ["IL", "1", "DOE", "JOHN", "", "", "", "MI", "W1"]),
            Segment::new("TRN", ["2", "CLM-1"]),
            Segment::new("STC", ["A2:20", "20240105", "", "150", "120"]),
            Segment::new("REF", ["1K", "PCN-1"]),
            Segment::new("SVC", ["HC:99213", "150", "120"]),
            Segment::new("STC", ["F1:65"]),
            Segment::new("DTP", ["472", "D8", "20240101"]),
            Segment::new("TRN", ["2", "CLM-2"]),
            Segment::new("STC", [":4"]),
        ];
        let response =
            ClaimStatusResponse::read(&Reader::new(&segments, &Delimiters::default()));
        assert_eq!(response.claim_statuses.len(), 2);

        let first = &response.claim_statuses[0];
        assert_eq!(first.claim_id, "CLM-1");
        assert_eq!(first.claim_status_category_code, "A2");
        assert_eq!(first.category_description(), "Accepted");
        assert_eq!(first.effective_date.as_deref(), Some("20240105"));
        assert_eq!(first.total_claim_charge_amount, Some(150.0));
        assert_eq!(first.total_claim_payment_amount, Some(120.0));
        assert_eq!(first.payer_claim_control_number.as_deref(), Some("PCN-1"));
        assert_eq!(first.service_line_statuses.len(), 1);
        assert_eq!(first.service_line_statuses[0].status_code, "65");

        let second = &response.claim_statuses[1];
        assert_eq!(second.claim_status_category_code, "");
        assert_eq!(second.category_description(), "Unknown");
    }

    #[test]
    fn test_missing_category_written_as_finalized() {
        let status = ClaimStatus {
            claim_id: "CLM-9".into(),
            claim_status_code: "1".into(),
            ..Default::default()
        };
        let mut writer = SegmentWriter::new(Delimiters::default());
        status.write(&mut writer, "91234567890");
        assert_eq!(writer.finish(false), "TRN*2*CLM-9*91234567890~STC*F0:1~");
    }

    #[test]
    fn test_inquiry_fields() {
        let segments = vec![
            Segment::new("TRN", ["1", "CLM-7", "91234567890"]),
            Segment::new("REF", ["BLT", "111"]),
            Segment::new("AMT", ["T3", "250.00"]),
            Segment::new("DTP", ["472", "RD8", "20240101-20240102"]),
        ];
        let reader = Reader::new(&segments, &Delimiters::default());
        let inquiry = ClaimInquiry::read(&reader).unwrap();
        assert_eq!(inquiry.claim_id, "CLM-7");
        assert_eq!(inquiry.bill_type.as_deref(), Some("111"));
        assert_eq!(inquiry.charge_amount, Some(250.0));
        assert_eq!(inquiry.payer_claim_control_number, None);

        let mut writer = SegmentWriter::new(Delimiters::default());
        inquiry.write(&mut writer, "91234567890");
        assert_eq!(
            writer.finish(false),
            "TRN*1*CLM-7*91234567890~REF*BLT*111~AMT*T3*250.00~DTP*472*RD8*20240101-20240102~"
        );
    }
}
