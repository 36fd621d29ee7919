use serde::{Deserialize, Serialize};
use x12_segment::SegmentWriter;

use super::claim::{
    claim_scope, write_parties, BillingProvider, ClaimInformation, ClaimSubscriber, DiagnosisCode,
    Patient, Payer,
};
use super::common::{
    amount, format_amount, format_quantity, owned, procedure_composite, read_procedure, timestamp,
    DateRange, ProviderRef,
};
use super::Reader;

/// 837I health care claim, institutional
///
/// The type of bill travels as `claim_information.facility_code` (CLM05-1
/// with qualifier `A`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalClaim {
    pub billing_provider: BillingProvider,
    pub subscriber: ClaimSubscriber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Patient>,
    pub payer: Payer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attending_provider: Option<ProviderRef>,
    pub claim_information: ClaimInformation,
    pub facility_info: FacilityInfo,
    #[serde(default)]
    pub diagnosis_codes: Vec<DiagnosisCode>,
    #[serde(default)]
    pub service_lines: Vec<InstitutionalServiceLine>,
}

/// Admission and discharge details (DTP*435, DTP*096, CL1)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_type_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_status_code: Option<String>,
}

impl FacilityInfo {
    fn read(claim: &Reader<'_>) -> Self {
        let date = |qualifier: &str| {
            claim
                .find("DTP", 1, qualifier)
                .and_then(|dtp| dtp.optional(3))
                .map(str::to_string)
        };
        let cl1 = claim.first("CL1");
        let code = |n: usize| owned(cl1.and_then(|c| c.optional(n)));
        Self {
            admission_date: date("435"),
            discharge_date: date("096"),
            admission_type_code: code(1),
            admission_source_code: code(2),
            patient_status_code: code(3),
        }
    }

    fn write(&self, writer: &mut SegmentWriter) {
        if let Some(admission) = &self.admission_date {
            writer.push("DTP", ["435", "D8", admission.as_str()]);
        }
        if let Some(discharge) = &self.discharge_date {
            writer.push("DTP", ["096", "D8", discharge.as_str()]);
        }
        let codes = [
            &self.admission_type_code,
            &self.admission_source_code,
            &self.patient_status_code,
        ];
        if codes.iter().any(|c| c.is_some()) {
            writer.push("CL1", codes.map(|c| c.as_deref().unwrap_or("")));
        }
    }
}

/// 2400 institutional service line (LX + SV2 + DTP*472)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalServiceLine {
    pub line_number: u32,
    pub revenue_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedure_modifiers: Vec<String>,
    pub charge_amount: f64,
    pub unit_type: String,
    pub service_units: f64,
    pub service_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date_end: Option<String>,
}

impl InstitutionalServiceLine {
    fn read(line: &Reader<'_>, index: usize) -> Option<Self> {
        let sv2 = line.first("SV2")?;
        let (procedure_code, procedure_modifiers) = match sv2.optional(2) {
            Some(_) => {
                let (code, modifiers) = read_procedure(line, sv2, 2);
                (Some(code), modifiers)
            }
            None => (None, Vec::new()),
        };
        let dates = line
            .find("DTP", 1, "472")
            .map(|dtp| DateRange::read(dtp, 2))
            .unwrap_or_default();

        Some(Self {
            line_number: line
                .first("LX")
                .and_then(|lx| lx.element(1).parse().ok())
                .unwrap_or(index as u32 + 1),
            revenue_code: sv2.element(1).to_string(),
            procedure_code,
            procedure_modifiers,
            charge_amount: amount(sv2.element(3)),
            unit_type: sv2.element(4).to_string(),
            service_units: amount(sv2.element(5)),
            service_date: dates.from_date,
            service_date_end: dates.to_date,
        })
    }

    fn write(&self, writer: &mut SegmentWriter) {
        writer.push("LX", [self.line_number.to_string()]);
        let procedure = match self.procedure_code.as_deref() {
            Some(code) => procedure_composite(writer, code, &self.procedure_modifiers),
            None => String::new(),
        };
        writer.push(
            "SV2",
            [
                self.revenue_code.clone(),
                procedure,
                format_amount(self.charge_amount),
                self.unit_type.clone(),
                format_quantity(self.service_units),
            ],
        );
        DateRange {
            from_date: self.service_date.clone(),
            to_date: self.service_date_end.clone(),
        }
        .write(writer, "472");
    }
}

impl InstitutionalClaim {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let claim = claim_scope(reader);
        let header = claim.until("LX");

        let service_lines = claim
            .anchored("LX")
            .iter()
            .enumerate()
            .filter_map(|(i, line)| InstitutionalServiceLine::read(line, i))
            .collect::<Vec<_>>();
        tracing::debug!(lines = service_lines.len(), "read institutional claim");

        Self {
            billing_provider: BillingProvider::read(reader),
            subscriber: ClaimSubscriber::read(reader),
            patient: Patient::read(reader),
            payer: Payer::read(reader),
            attending_provider: header.entity("71").map(|e| ProviderRef::read(&e, "AT")),
            claim_information: ClaimInformation::read(&claim),
            facility_info: FacilityInfo::read(&header),
            diagnosis_codes: DiagnosisCode::read_all(&header),
            service_lines,
        }
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter) {
        let (date, time) = timestamp();
        writer.push(
            "BHT",
            [
                "0019",
                "00",
                self.claim_information.claim_id.as_str(),
                date.as_str(),
                time.as_str(),
                "CH",
            ],
        );

        write_parties(
            writer,
            &self.billing_provider,
            &self.subscriber,
            &self.payer,
            self.patient.as_ref(),
        );

        self.claim_information.write_clm(writer, "A");
        self.facility_info.write(writer);
        self.claim_information.write_supplemental(writer);
        DiagnosisCode::write_all(&self.diagnosis_codes, writer);

        if let Some(attending) = &self.attending_provider {
            attending.write(writer, "71", "AT");
        }

        for line in &self.service_lines {
            line.write(writer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use x12_segment::{Delimiters, Segment};

    #[test]
    fn test_facility_info() {
        let segments = vec![
            Segment::new("CLM", ["C-9", "5000", "", "", "111:A:1"]),
            Segment::new("DTP", ["435", "D8", "20240201"]),
            Segment::new("DTP", ["096", "D8", "20240205"]),
            Segment::new("CL1", ["1", "7", "01"]),
        ];
        let reader = Reader::new(&segments, &Delimiters::default());
        let info = FacilityInfo::read(&reader);
        assert_eq!(info.admission_date.as_deref(), Some("20240201"));
        assert_eq!(info.discharge_date.as_deref(), Some("20240205"));
        assert_eq!(info.admission_type_code.as_deref(), Some("1"));
        assert_eq!(info.patient_status_code.as_deref(), Some("01"));
        assert_eq!(ClaimInformation::read(&reader).facility_code, "111");
    }

    #[test]
    fn test_revenue_line_without_procedure() {
        let segments = vec![
            Segment::new("LX", ["1"]),
            Segment::new("SV2", ["0120", "", "1500", "DA", "3"]),
            Segment::new("DTP", ["472", "D8", "20240201"]),
        ];
        let reader = Reader::new(&segments, &Delimiters::default());
        let line = InstitutionalServiceLine::read(&reader, 0).unwrap();
        assert_eq!(line.revenue_code, "0120");
        assert_eq!(line.procedure_code, None);
        assert_eq!(line.service_units, 3.0);

        let mut writer = SegmentWriter::new(Delimiters::default());
        line.write(&mut writer);
        assert_eq!(
            writer.finish(false),
            "LX*1~SV2*0120**1500.00*DA*3~DTP*472*D8*20240201~"
        );
    }
}
