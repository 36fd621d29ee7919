use serde::{Deserialize, Serialize};
use x12_segment::SegmentWriter;

use super::common::{
    format_quantity, optional_amount, owned, procedure_composite, read_contact, read_procedure,
    reference, timestamp, write_contact, write_organization, DateRange, Dependent, Hierarchy,
    ProviderRef, Subscriber,
};
use super::Reader;
use crate::envelope::Envelope;

/// 278 health care services review, request or response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesReview {
    pub action_code: ActionCode,
    pub umo_info: UmoInfo,
    pub requester_info: RequesterInfo,
    pub subscriber: Subscriber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent: Option<Dependent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attending_provider: Option<ProviderRef>,
    pub patient_event: PatientEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification: Option<Certification>,
    #[serde(default)]
    pub service_info: Vec<ServiceInfo>,
}

/// Direction of the review, carried by BHT02
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCode {
    /// BHT02 `13`
    #[default]
    #[serde(rename = "AR")]
    Request,
    /// BHT02 `11`
    #[serde(rename = "CT")]
    Response,
}

impl ActionCode {
    fn purpose(self) -> &'static str {
        match self {
            Self::Request => "13",
            Self::Response => "11",
        }
    }

    fn from_purpose(code: &str) -> Self {
        if code == "11" {
            Self::Response
        } else {
            Self::Request
        }
    }
}

/// Utilization management organization (NM1*X3)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UmoInfo {
    pub name: String,
    pub payer_id: String,
}

/// Requesting provider (NM1*1P, PER*IC)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterInfo {
    pub name: String,
    pub npi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

/// 2000E patient event: UM and DTP*472
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEvent {
    /// UM01 (HS health services review, AR admission review, SC specialty care)
    pub review_type: String,
    /// UM02 (I initial, R renewal, S revised, ...)
    pub certification_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type_code: Option<String>,
    pub event_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date_end: Option<String>,
}

/// HCR review outcome on responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    /// HCR01 (A1 certified in total, A3 not certified, A4 pended, ...)
    pub action_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

/// 2000F service level (HL SS + SV1)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub procedure_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedure_modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

impl PatientEvent {
    fn read(event: &Reader<'_>) -> Self {
        let um = event.first("UM");
        let element = |n: usize| um.and_then(|um| um.optional(n));
        let dates = event
            .find("DTP", 1, "472")
            .map(|dtp| DateRange::read(dtp, 2))
            .unwrap_or_default();
        Self {
            review_type: element(1).unwrap_or("HS").to_string(),
            certification_type: element(2).unwrap_or("I").to_string(),
            service_type_code: owned(element(3)),
            event_date: dates.from_date,
            event_date_end: dates.to_date,
        }
    }

    fn write_um(&self, writer: &mut SegmentWriter) {
        let or = |value: &str, default: &str| -> String {
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };
        writer.push(
            "UM",
            [
                or(&self.review_type, "HS"),
                or(&self.certification_type, "I"),
                self.service_type_code.clone().unwrap_or_default(),
            ],
        );
    }

    fn write_dates(&self, writer: &mut SegmentWriter) {
        DateRange {
            from_date: self.event_date.clone(),
            to_date: self.event_date_end.clone(),
        }
        .write(writer, "472");
    }
}

impl Certification {
    fn read(event: &Reader<'_>) -> Option<Self> {
        let hcr = event.first("HCR");
        let date = |qualifier: &str| {
            event
                .find("DTP", 1, qualifier)
                .and_then(|dtp| dtp.optional(3))
                .map(str::to_string)
        };
        let certification_number = owned(hcr.and_then(|h| h.optional(2)))
            .or_else(|| reference(event, "BB"));
        let effective_date = date("007");
        let expiration_date = date("036");

        if hcr.is_none()
            && certification_number.is_none()
            && effective_date.is_none()
            && expiration_date.is_none()
        {
            return None;
        }
        Some(Self {
            action_code: hcr
                .and_then(|h| h.optional(1))
                .unwrap_or("A1")
                .to_string(),
            certification_number,
            effective_date,
            expiration_date,
        })
    }

    fn write_hcr(&self, writer: &mut SegmentWriter) {
        let action = if self.action_code.is_empty() {
            "A1"
        } else {
            self.action_code.as_str()
        };
        writer.push(
            "HCR",
            [action, self.certification_number.as_deref().unwrap_or("")],
        );
    }

    fn write_dates(&self, writer: &mut SegmentWriter) {
        if let Some(date) = &self.effective_date {
            writer.push("DTP", ["007", "D8", date.as_str()]);
        }
        if let Some(date) = &self.expiration_date {
            writer.push("DTP", ["036", "D8", date.as_str()]);
        }
    }
}

impl ServiceInfo {
    fn read(level: &Reader<'_>) -> Option<Self> {
        let sv1 = level.first("SV1")?;
        let (procedure_code, procedure_modifiers) = read_procedure(level, sv1, 1);
        Some(Self {
            procedure_code,
            procedure_modifiers,
            quantity: optional_amount(sv1.optional(4)),
        })
    }

    fn write(&self, writer: &mut SegmentWriter) {
        let procedure = procedure_composite(writer, &self.procedure_code, &self.procedure_modifiers);
        writer.push(
            "SV1",
            [
                procedure,
                String::new(),
                String::new(),
                self.quantity.map(format_quantity).unwrap_or_default(),
            ],
        );
    }
}

impl ServicesReview {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let event = reader.after("HL", 3, "EV").before("HL", 3, "SS");
        let service_info: Vec<ServiceInfo> = reader
            .anchored("HL")
            .iter()
            .filter(|level| level.first("HL").is_some_and(|hl| hl.element(3) == "SS"))
            .filter_map(ServiceInfo::read)
            .collect();

        let requester_info = reader
            .entity("1P")
            .map(|e| {
                let (contact_name, contact_phone) = read_contact(&e.scope);
                RequesterInfo {
                    name: e.head.element(3).to_string(),
                    npi: e.head.element(9).to_string(),
                    contact_name,
                    contact_phone,
                }
            })
            .unwrap_or_default();
        let action_code = ActionCode::from_purpose(
            reader.first("BHT").map(|bht| bht.element(2)).unwrap_or(""),
        );
        tracing::debug!(?action_code, services = service_info.len(), "read services review");

        Self {
            action_code,
            umo_info: reader
                .entity("X3")
                .map(|e| UmoInfo {
                    name: e.head.element(3).to_string(),
                    payer_id: e.head.element(9).to_string(),
                })
                .unwrap_or_default(),
            requester_info,
            subscriber: Subscriber::read(reader),
            dependent: Dependent::read(&reader.after("HL", 3, "23"), "QC"),
            attending_provider: event.entity("71").map(|e| ProviderRef::read(&e, "AT")),
            patient_event: PatientEvent::read(&event),
            certification: Certification::read(&event),
            service_info,
        }
    }

    pub(crate) fn write(&self, envelope: &Envelope, writer: &mut SegmentWriter) {
        let control_number = envelope.st.transaction_set_control_number.as_str();
        let (date, time) = timestamp();
        writer.push(
            "BHT",
            [
                "0007",
                self.action_code.purpose(),
                control_number,
                date.as_str(),
                time.as_str(),
            ],
        );

        let mut hierarchy = Hierarchy::default();
        let umo_level = hierarchy.push(writer, None, "20", true);
        write_organization(writer, "X3", &self.umo_info.name, "PI", &self.umo_info.payer_id);

        let requester_level = hierarchy.push(writer, Some(umo_level), "21", true);
        write_organization(writer, "1P", &self.requester_info.name, "XX", &self.requester_info.npi);
        write_contact(
            writer,
            self.requester_info.contact_name.as_deref(),
            self.requester_info.contact_phone.as_deref(),
        );

        let mut parent = hierarchy.push(writer, Some(requester_level), "22", true);
        self.subscriber.write(writer);

        if let Some(dependent) = &self.dependent {
            parent = hierarchy.push(writer, Some(parent), "23", true);
            dependent.write(writer, "QC");
        }

        let event_level = hierarchy.push(writer, Some(parent), "EV", !self.service_info.is_empty());
        let originator = format!("9{}", self.requester_info.npi);
        writer.push("TRN", ["1", control_number, originator.as_str()]);
        self.patient_event.write_um(writer);
        if let Some(certification) = &self.certification {
            certification.write_hcr(writer);
        }
        self.patient_event.write_dates(writer);
        if let Some(certification) = &self.certification {
            certification.write_dates(writer);
        }
        if let Some(attending) = &self.attending_provider {
            attending.write(writer, "71", "AT");
        }

        for service in &self.service_info {
            hierarchy.push(writer, Some(event_level), "SS", false);
            service.write(writer);
        }
    }
}
