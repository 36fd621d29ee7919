use serde::{Deserialize, Serialize};
use x12_segment::SegmentWriter;

use super::claim::{
    claim_scope, write_parties, BillingProvider, ClaimInformation, ClaimSubscriber, DiagnosisCode,
    Patient, Payer,
};
use super::common::{
    amount, format_amount, format_quantity, procedure_composite, read_procedure, timestamp,
    DateRange, ProviderRef,
};
use super::Reader;

/// 837P health care claim, professional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalClaim {
    pub billing_provider: BillingProvider,
    pub subscriber: ClaimSubscriber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Patient>,
    pub payer: Payer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendering_provider: Option<ProviderRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referring_provider: Option<ProviderRef>,
    pub claim_information: ClaimInformation,
    #[serde(default)]
    pub diagnosis_codes: Vec<DiagnosisCode>,
    #[serde(default)]
    pub service_lines: Vec<ServiceLine>,
}

/// 2400 professional service line (LX + SV1 + DTP*472)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub line_number: u32,
    pub procedure_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedure_modifiers: Vec<String>,
    pub charge_amount: f64,
    /// SV103 (UN units, MJ minutes)
    pub unit_type: String,
    pub units: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_of_service: Option<String>,
    /// 1-based positions into the claim's diagnosis codes
    #[serde(default)]
    pub diagnosis_pointers: Vec<u32>,
    pub service_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date_end: Option<String>,
}

impl ServiceLine {
    fn read(line: &Reader<'_>, index: usize) -> Option<Self> {
        let sv1 = line.first("SV1")?;
        let (procedure_code, procedure_modifiers) = read_procedure(line, sv1, 1);
        let dates = line
            .find("DTP", 1, "472")
            .map(|dtp| DateRange::read(dtp, 2))
            .unwrap_or_default();

        Some(Self {
            line_number: line
                .first("LX")
                .and_then(|lx| lx.element(1).parse().ok())
                .unwrap_or(index as u32 + 1),
            procedure_code,
            procedure_modifiers,
            charge_amount: amount(sv1.element(2)),
            unit_type: sv1.element(3).to_string(),
            units: amount(sv1.element(4)),
            place_of_service: sv1.optional(5).map(str::to_string),
            diagnosis_pointers: line
                .components(sv1, 7)
                .into_iter()
                .filter_map(|p| p.parse().ok())
                .collect(),
            service_date: dates.from_date,
            service_date_end: dates.to_date,
        })
    }

    fn write(&self, writer: &mut SegmentWriter) {
        writer.push("LX", [self.line_number.to_string()]);

        let procedure = procedure_composite(writer, &self.procedure_code, &self.procedure_modifiers);
        let pointers: Vec<String> = self.diagnosis_pointers.iter().map(u32::to_string).collect();
        let pointers = writer.composite(&pointers);
        writer.push(
            "SV1",
            [
                procedure,
                format_amount(self.charge_amount),
                self.unit_type.clone(),
                format_quantity(self.units),
                self.place_of_service.clone().unwrap_or_default(),
                String::new(),
                pointers,
            ],
        );

        DateRange {
            from_date: self.service_date.clone(),
            to_date: self.service_date_end.clone(),
        }
        .write(writer, "472");
    }
}

impl ProfessionalClaim {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let claim = claim_scope(reader);
        let providers = claim.until("LX");

        let claim_information = ClaimInformation::read(&claim);
        let service_lines = claim
            .anchored("LX")
            .iter()
            .enumerate()
            .filter_map(|(i, line)| ServiceLine::read(line, i))
            .collect::<Vec<_>>();
        tracing::debug!(
            claim_id = %claim_information.claim_id,
            lines = service_lines.len(),
            "read professional claim"
        );

        Self {
            billing_provider: BillingProvider::read(reader),
            subscriber: ClaimSubscriber::read(reader),
            patient: Patient::read(reader),
            payer: Payer::read(reader),
            rendering_provider: providers.entity("82").map(|e| ProviderRef::read(&e, "PE")),
            referring_provider: providers.entity("DN").map(|e| ProviderRef::read(&e, "RF")),
            claim_information,
            diagnosis_codes: DiagnosisCode::read_all(&claim),
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

        self.claim_information.write_clm(writer, "B");
        self.claim_information.write_supplemental(writer);
        DiagnosisCode::write_all(&self.diagnosis_codes, writer);

        if let Some(referring) = &self.referring_provider {
            referring.write(writer, "DN", "RF");
        }
        if let Some(rendering) = &self.rendering_provider {
            rendering.write(writer, "82", "PE");
        }

        for line in &self.service_lines {
            line.write(writer);
        }
    }
}
