//! Parties and claim header shared by the professional and institutional 837.

use serde::{Deserialize, Serialize};
use x12_segment::SegmentWriter;

use super::common::{
    amount, format_amount, optional_amount, owned, read_contact, read_demographics, reference,
    write_contact, write_demographics, write_name, write_organization, Address, Gender, Name,
};
use super::Reader;

/// 2010AA billing provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingProvider {
    pub name: String,
    pub npi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_code: Option<String>,
    pub address: Address,
    pub tax_id: String,
    /// `EI` (employer identification number) or `SY` (social security number)
    pub tax_id_qualifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

impl BillingProvider {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let (contact_name, contact_phone) = read_contact(reader);
        let taxonomy_code = reader
            .find("PRV", 1, "BI")
            .and_then(|prv| prv.optional(3))
            .map(str::to_string);

        let Some(entity) = reader.entity("85") else {
            return Self {
                taxonomy_code,
                contact_name,
                contact_phone,
                ..Default::default()
            };
        };
        let tax_ref = entity
            .scope
            .all("REF")
            .find(|r| matches!(r.element(1), "EI" | "SY"));

        Self {
            name: entity.head.element(3).to_string(),
            npi: entity.head.element(9).to_string(),
            taxonomy_code,
            address: Address::read(&entity.scope).unwrap_or_default(),
            tax_id: tax_ref.map(|r| r.element(2)).unwrap_or("").to_string(),
            tax_id_qualifier: tax_ref.map(|r| r.element(1)).unwrap_or("EI").to_string(),
            contact_name,
            contact_phone,
        }
    }

    /// 1000A submitter, then 2000A/2010AA
    fn write_submitter(&self, writer: &mut SegmentWriter) {
        write_organization(writer, "41", &self.name, "46", &self.npi);
        write_contact(writer, self.contact_name.as_deref(), self.contact_phone.as_deref());
    }

    fn write(&self, writer: &mut SegmentWriter) {
        if let Some(taxonomy) = &self.taxonomy_code {
            writer.push("PRV", ["BI", "PXC", taxonomy.as_str()]);
        }
        write_organization(writer, "85", &self.name, "XX", &self.npi);
        self.address.write(writer);
        writer.push("REF", [self.tax_id_qualifier.as_str(), self.tax_id.as_str()]);
    }
}

/// 2000B/2010BA subscriber
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSubscriber {
    pub member_id: String,
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_number: Option<String>,
    /// SBR02 (18 self, 01 spouse, 19 child, ...)
    pub relationship_code: String,
}

impl ClaimSubscriber {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let sbr = reader.first("SBR");
        let mut subscriber = Self {
            relationship_code: sbr.map(|s| s.element(2)).unwrap_or("").to_string(),
            group_number: owned(sbr.and_then(|s| s.optional(3))),
            ..Default::default()
        };
        if let Some(entity) = reader.entity("IL") {
            let (date_of_birth, gender) = read_demographics(&entity.scope);
            subscriber.member_id = entity.head.element(9).to_string();
            subscriber.name = Name::read(entity.head);
            subscriber.address = Address::read(&entity.scope);
            subscriber.date_of_birth = date_of_birth;
            subscriber.gender = gender;
        }
        subscriber
    }

    fn write(&self, writer: &mut SegmentWriter) {
        writer.push(
            "SBR",
            [
                "P",
                self.relationship_code.as_str(),
                self.group_number.as_deref().unwrap_or(""),
                "",
                "",
                "",
                "",
                "",
                "CI",
            ],
        );
        write_name(writer, "IL", &self.name, "MI", &self.member_id);
        if let Some(address) = &self.address {
            address.write(writer);
        }
        write_demographics(writer, self.date_of_birth.as_deref(), self.gender);
    }
}

/// 2000C/2010CA patient, present only when the patient is not the subscriber
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// PAT01
    pub relationship_to_subscriber: String,
}

impl Patient {
    pub(crate) fn read(reader: &Reader<'_>) -> Option<Self> {
        let level = reader.after("HL", 3, "23");
        let entity = level.entity("QC")?;
        let (date_of_birth, gender) = read_demographics(&entity.scope);
        Some(Self {
            name: Name::read(entity.head),
            address: Address::read(&entity.scope),
            date_of_birth,
            gender,
            relationship_to_subscriber: level
                .first("PAT")
                .map(|p| p.element(1))
                .unwrap_or("")
                .to_string(),
        })
    }

    fn write(&self, writer: &mut SegmentWriter) {
        writer.push("PAT", [self.relationship_to_subscriber.as_str()]);
        write_name(writer, "QC", &self.name, "", "");
        if let Some(address) = &self.address {
            address.write(writer);
        }
        write_demographics(writer, self.date_of_birth.as_deref(), self.gender);
    }
}

/// 2010BB payer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    pub name: String,
    pub payer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Payer {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        reader
            .entity("PR")
            .map(|e| Self {
                name: e.head.element(3).to_string(),
                payer_id: e.head.element(9).to_string(),
                address: Address::read(&e.scope),
            })
            .unwrap_or_default()
    }

    fn write(&self, writer: &mut SegmentWriter) {
        write_organization(writer, "PR", &self.name, "PI", &self.payer_id);
        if let Some(address) = &self.address {
            address.write(writer);
        }
    }
}

/// 2300 claim header (CLM)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInformation {
    pub claim_id: String,
    pub total_charge_amount: f64,
    /// CLM05-1: place of service (professional) or type of bill (institutional)
    pub facility_code: String,
    /// CLM05-3 (1 original, 7 replacement, 8 void)
    pub frequency_code: String,
    pub provider_signature_on_file: bool,
    pub assignment_of_benefits: bool,
    /// CLM09 (Y, I, N)
    pub release_of_information: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_paid_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_authorization_number: Option<String>,
}

impl ClaimInformation {
    pub(crate) fn read(claim: &Reader<'_>) -> Self {
        let Some(clm) = claim.first("CLM") else {
            return Self::default();
        };
        let facility = claim.components(clm, 5);
        Self {
            claim_id: clm.element(1).to_string(),
            total_charge_amount: amount(clm.element(2)),
            facility_code: facility.first().copied().unwrap_or("").to_string(),
            frequency_code: facility.get(2).copied().unwrap_or("").to_string(),
            provider_signature_on_file: clm.element(6) == "Y",
            assignment_of_benefits: matches!(clm.element(7), "A" | "Y"),
            release_of_information: clm.element(9).to_string(),
            patient_paid_amount: optional_amount(
                claim.find("AMT", 1, "F5").and_then(|a| a.optional(2)),
            ),
            prior_authorization_number: reference(claim, "G1"),
        }
    }

    /// CLM with the facility code qualifier (`B` professional, `A` institutional)
    pub(crate) fn write_clm(&self, writer: &mut SegmentWriter, facility_qualifier: &str) {
        let facility = writer.composite([
            self.facility_code.as_str(),
            facility_qualifier,
            self.frequency_code.as_str(),
        ]);
        writer.push(
            "CLM",
            [
                self.claim_id.clone(),
                format_amount(self.total_charge_amount),
                String::new(),
                String::new(),
                facility,
                yes_no(self.provider_signature_on_file).to_string(),
                if self.assignment_of_benefits { "A" } else { "C" }.to_string(),
                yes_no(self.assignment_of_benefits).to_string(),
                self.release_of_information.clone(),
            ],
        );
    }

    /// AMT*F5 and REF*G1, which follow the claim dates
    pub(crate) fn write_supplemental(&self, writer: &mut SegmentWriter) {
        if let Some(paid) = self.patient_paid_amount {
            writer.push("AMT", ["F5".to_string(), format_amount(paid)]);
        }
        if let Some(authorization) = &self.prior_authorization_number {
            writer.push("REF", ["G1", authorization.as_str()]);
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Y"
    } else {
        "N"
    }
}

/// One HI composite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisCode {
    pub code: String,
    /// ABK/BK principal, ABF/BF other
    pub code_type: String,
    pub is_principal: bool,
}

impl DiagnosisCode {
    /// Every HI composite in the claim, in order
    pub(crate) fn read_all(claim: &Reader<'_>) -> Vec<Self> {
        claim
            .all("HI")
            .flat_map(|hi| hi.elements.iter())
            .filter(|e| !e.is_empty())
            .enumerate()
            .map(|(i, composite)| {
                let (code_type, code) = composite
                    .split_once(claim.component)
                    .unwrap_or(("", composite.as_str()));
                Self {
                    code: code.to_string(),
                    code_type: code_type.to_string(),
                    is_principal: i == 0,
                }
            })
            .collect()
    }

    /// HI segments, twelve composites each
    ///
    /// The stored qualifier is written as is; an empty one becomes ABK for the
    /// first code and ABF for the rest.
    pub(crate) fn write_all(codes: &[Self], writer: &mut SegmentWriter) {
        let composites: Vec<String> = codes
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let qualifier = match d.code_type.as_str() {
                    "" if i == 0 => "ABK",
                    "" => "ABF",
                    given => given,
                };
                writer.composite([qualifier, d.code.as_str()])
            })
            .collect();
        for chunk in composites.chunks(12) {
            writer.push("HI", chunk);
        }
    }
}

/// Submitter, receiver and the three hierarchical levels every 837 opens with
///
/// Leaves the writer positioned for CLM.
pub(crate) fn write_parties(
    writer: &mut SegmentWriter,
    billing_provider: &BillingProvider,
    subscriber: &ClaimSubscriber,
    payer: &Payer,
    patient: Option<&Patient>,
) {
    billing_provider.write_submitter(writer);
    write_organization(writer, "40", &payer.name, "46", &payer.payer_id);

    let mut hierarchy = super::common::Hierarchy::default();
    let billing_level = hierarchy.push(writer, None, "20", true);
    billing_provider.write(writer);

    let subscriber_level = hierarchy.push(writer, Some(billing_level), "22", patient.is_some());
    subscriber.write(writer);
    payer.write(writer);

    if let Some(patient) = patient {
        hierarchy.push(writer, Some(subscriber_level), "23", false);
        patient.write(writer);
    }
}

/// Segments from CLM to the end of the transaction
pub(crate) fn claim_scope<'a>(reader: &Reader<'a>) -> Reader<'a> {
    let segments = reader.segments();
    let start = segments.iter().position(|s| s.is("CLM")).unwrap_or(segments.len());
    reader.narrow(&segments[start..])
}
