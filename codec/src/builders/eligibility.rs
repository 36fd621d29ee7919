use serde::{Deserialize, Serialize};
use x12_segment::{Segment, SegmentWriter};

use super::common::{
    format_amount, format_quantity, optional_amount, owned, procedure_composite, read_procedure,
    timestamp, DateRange, Dependent, Hierarchy, InformationReceiver, InformationSource, Subscriber,
};
use super::Reader;
use crate::envelope::Envelope;

/// Service type code used when an inquiry does not name one (health benefit plan coverage)
const DEFAULT_SERVICE_TYPE: &str = "30";

/// 270 eligibility, coverage or benefit inquiry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityInquiry {
    pub information_source: InformationSource,
    pub information_receiver: InformationReceiver,
    pub subscriber: Subscriber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent: Option<Dependent>,
    pub eligibility_inquiries: Vec<BenefitInquiry>,
}

/// One EQ with its optional DTP*291
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitInquiry {
    pub service_type_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date_range: Option<DateRange>,
}

impl BenefitInquiry {
    fn read(inquiry: &Reader<'_>) -> Option<Self> {
        let eq = inquiry.first("EQ")?;
        Some(Self {
            service_type_code: eq.optional(1).unwrap_or(DEFAULT_SERVICE_TYPE).to_string(),
            procedure_code: eq
                .optional(2)
                .map(|_| read_procedure(inquiry, eq, 2).0)
                .filter(|code| !code.is_empty()),
            service_date_range: inquiry
                .find("DTP", 1, "291")
                .map(|dtp| DateRange::read(dtp, 2)),
        })
    }

    fn write(&self, writer: &mut SegmentWriter) {
        let procedure = match &self.procedure_code {
            Some(code) => procedure_composite(writer, code, &[]),
            None => String::new(),
        };
        writer.push("EQ", [self.service_type_code.clone(), procedure]);
        if let Some(range) = &self.service_date_range {
            range.write(writer, "291");
        }
    }
}

/// 271 eligibility, coverage or benefit information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    pub information_source: InformationSource,
    pub information_receiver: InformationReceiver,
    pub subscriber: ResponseSubscriber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent: Option<ResponseDependent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_validation: Option<RequestValidation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSubscriber {
    #[serde(flatten)]
    pub member: Subscriber,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscriber_dates: Vec<SubscriberDate>,
    #[serde(default)]
    pub eligibility_benefits: Vec<EligibilityBenefit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDependent {
    #[serde(flatten)]
    pub member: Dependent,
    #[serde(default)]
    pub eligibility_benefits: Vec<EligibilityBenefit>,
}

/// DTP under the subscriber name (346 plan begin, 356 eligibility begin, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberDate {
    pub qualifier: String,
    /// CCYYMMDD, or CCYYMMDD-CCYYMMDD for a range
    pub date: String,
}

impl SubscriberDate {
    fn read(dtp: &Segment) -> Self {
        Self {
            qualifier: dtp.element(1).to_string(),
            date: dtp.element(3).to_string(),
        }
    }

    fn write(&self, writer: &mut SegmentWriter) {
        let format = if self.date.contains('-') { "RD8" } else { "D8" };
        writer.push("DTP", [self.qualifier.as_str(), format, self.date.as_str()]);
    }
}

/// AAA request validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestValidation {
    pub valid_request: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_action_code: Option<String>,
}

impl RequestValidation {
    fn read(aaa: &Segment) -> Self {
        Self {
            valid_request: aaa.element(1) == "Y",
            reject_reason_code: owned(aaa.optional(3)),
            follow_up_action_code: owned(aaa.optional(4)),
        }
    }

    fn write(&self, writer: &mut SegmentWriter) {
        writer.push(
            "AAA",
            [
                if self.valid_request { "Y" } else { "N" },
                "",
                self.reject_reason_code.as_deref().unwrap_or(""),
                self.follow_up_action_code.as_deref().unwrap_or(""),
            ],
        );
    }
}

/// 2110 EB with its DTP*307 and MSG segments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityBenefit {
    /// EB01 (1 active coverage, 6 inactive, C deductible, ...)
    pub information_status_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_coverage_level: Option<String>,
    pub service_type_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_type_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_coverage_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period_qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetary_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// EB11
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_required: Option<bool>,
    /// EB12 (Y, N, W not applicable, U unknown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_plan_network_indicator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_info: Vec<String>,
}

impl EligibilityBenefit {
    fn read(benefit: &Reader<'_>) -> Option<Self> {
        let eb = benefit.first("EB")?;
        Some(Self {
            information_status_code: eb.optional(1).unwrap_or("1").to_string(),
            benefit_coverage_level: owned(eb.optional(2)),
            service_type_code: eb.optional(3).unwrap_or(DEFAULT_SERVICE_TYPE).to_string(),
            insurance_type_code: owned(eb.optional(4)),
            plan_coverage_description: owned(eb.optional(5)),
            time_period_qualifier: owned(eb.optional(6)),
            monetary_amount: optional_amount(eb.optional(7)),
            percent: optional_amount(eb.optional(8)),
            authorization_required: eb.optional(11).map(|flag| flag == "Y"),
            in_plan_network_indicator: owned(eb.optional(12)),
            date_range: benefit
                .find("DTP", 1, "307")
                .map(|dtp| DateRange::read(dtp, 2)),
            additional_info: benefit
                .all("MSG")
                .map(|msg| msg.element(1).to_string())
                .collect(),
        })
    }

    fn read_all(level: &Reader<'_>) -> Vec<Self> {
        level
            .anchored("EB")
            .iter()
            .filter_map(Self::read)
            .collect()
    }

    fn write(&self, writer: &mut SegmentWriter) {
        let status = if self.information_status_code.is_empty() {
            "1"
        } else {
            self.information_status_code.as_str()
        };
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        writer.push(
            "EB",
            [
                status.to_string(),
                text(&self.benefit_coverage_level),
                self.service_type_code.clone(),
                text(&self.insurance_type_code),
                text(&self.plan_coverage_description),
                text(&self.time_period_qualifier),
                self.monetary_amount.map(format_amount).unwrap_or_default(),
                self.percent.map(format_quantity).unwrap_or_default(),
                String::new(),
                String::new(),
                self.authorization_required
                    .map(|required| if required { "Y" } else { "N" }.to_string())
                    .unwrap_or_default(),
                text(&self.in_plan_network_indicator),
            ],
        );
        if let Some(range) = &self.date_range {
            range.write(writer, "307");
        }
        for info in &self.additional_info {
            writer.push("MSG", [info]);
        }
    }
}

/// Source and receiver levels shared by the inquiry and the response
fn write_parties(
    hierarchy: &mut Hierarchy,
    writer: &mut SegmentWriter,
    source: &InformationSource,
    receiver: &InformationReceiver,
) -> u32 {
    let source_level = hierarchy.push(writer, None, "20", true);
    source.write(writer, "PR");
    let receiver_level = hierarchy.push(writer, Some(source_level), "21", true);
    receiver.write(writer, "1P");
    receiver_level
}

fn write_trace(writer: &mut SegmentWriter, trace_type: &str, envelope: &Envelope, npi: &str) {
    let originator = format!("9{npi}");
    writer.push(
        "TRN",
        [
            trace_type,
            envelope.st.transaction_set_control_number.as_str(),
            originator.as_str(),
        ],
    );
}

fn write_bht(writer: &mut SegmentWriter, purpose: &str, envelope: &Envelope) {
    let (date, time) = timestamp();
    writer.push(
        "BHT",
        [
            "0022",
            purpose,
            envelope.st.transaction_set_control_number.as_str(),
            date.as_str(),
            time.as_str(),
        ],
    );
}

impl EligibilityInquiry {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let mut eligibility_inquiries: Vec<BenefitInquiry> = reader
            .anchored("EQ")
            .iter()
            .filter_map(BenefitInquiry::read)
            .collect();
        if eligibility_inquiries.is_empty() {
            eligibility_inquiries.push(BenefitInquiry {
                service_type_code: DEFAULT_SERVICE_TYPE.to_string(),
                ..Default::default()
            });
        }

        Self {
            information_source: InformationSource::read(reader, "PR"),
            information_receiver: InformationReceiver::read(reader, "1P"),
            subscriber: Subscriber::read(reader),
            dependent: Dependent::read(&reader.after("HL", 3, "23"), "03"),
            eligibility_inquiries,
        }
    }

    pub(crate) fn write(&self, envelope: &Envelope, writer: &mut SegmentWriter) {
        write_bht(writer, "13", envelope);

        let mut hierarchy = Hierarchy::default();
        let receiver_level = write_parties(
            &mut hierarchy,
            writer,
            &self.information_source,
            &self.information_receiver,
        );
        let subscriber_level =
            hierarchy.push(writer, Some(receiver_level), "22", self.dependent.is_some());
        write_trace(writer, "1", envelope, &self.information_receiver.npi);
        self.subscriber.write(writer);

        if let Some(dependent) = &self.dependent {
            hierarchy.push(writer, Some(subscriber_level), "23", false);
            dependent.write(writer, "03");
        }

        for inquiry in &self.eligibility_inquiries {
            inquiry.write(writer);
        }
    }
}

impl EligibilityResponse {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let subscriber_level = reader.after("HL", 3, "22").before("HL", 3, "23");
        let dependent_level = reader.after("HL", 3, "23");

        let subscriber_dates: Vec<SubscriberDate> = reader
            .entity("IL")
            .map(|e| e.scope.all("DTP").map(SubscriberDate::read).collect())
            .unwrap_or_default();
        let subscriber = ResponseSubscriber {
            member: Subscriber::read(reader),
            subscriber_dates,
            eligibility_benefits: EligibilityBenefit::read_all(&subscriber_level),
        };
        let dependent = Dependent::read(&dependent_level, "03").map(|member| ResponseDependent {
            member,
            eligibility_benefits: EligibilityBenefit::read_all(&dependent_level),
        });
        tracing::debug!(
            benefits = subscriber.eligibility_benefits.len(),
            dependent = dependent.is_some(),
            "read eligibility response"
        );

        Self {
            information_source: InformationSource::read(reader, "PR"),
            information_receiver: InformationReceiver::read(reader, "1P"),
            subscriber,
            dependent,
            request_validation: reader.first("AAA").map(RequestValidation::read),
        }
    }

    pub(crate) fn write(&self, envelope: &Envelope, writer: &mut SegmentWriter) {
        write_bht(writer, "11", envelope);

        let mut hierarchy = Hierarchy::default();
        let receiver_level = write_parties(
            &mut hierarchy,
            writer,
            &self.information_source,
            &self.information_receiver,
        );
        let subscriber_level =
            hierarchy.push(writer, Some(receiver_level), "22", self.dependent.is_some());
        write_trace(writer, "2", envelope, &self.information_receiver.npi);

        self.subscriber.member.write(writer);
        if let Some(validation) = &self.request_validation {
            validation.write(writer);
        }
        for date in &self.subscriber.subscriber_dates {
            date.write(writer);
        }
        for benefit in &self.subscriber.eligibility_benefits {
            benefit.write(writer);
        }

        if let Some(dependent) = &self.dependent {
            hierarchy.push(writer, Some(subscriber_level), "23", false);
            dependent.member.write(writer, "03");
            for benefit in &dependent.eligibility_benefits {
                benefit.write(writer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use x12_segment::Delimiters;

    fn response_segments() -> Vec<Segment> {
        vec![
            Segment::new("HL", ["1", "", "20", "1"]),
            Segment::new("NM1", ["PR", "2", "ACME HEALTH", "", "", "", "", "PI", "12345"]),
            Segment::new("HL", ["2", "1", "21", "1"]),
            Segment::new("NM1", ["1P", "2", "CLINIC", "", "", "", "", "XX", "1234567890"]),
            Segment::new("HL", ["3", "2", "22", "1"]),
            Segment::new("NM1", ["IL", "1", "DOE", "JOHN", "", "", "", "MI", "W999"]),
            Segment::new("DMG", ["D8", "19800101", "M"]),
            Segment::new("DTP", ["346", "D8", "20240101"]),
            Segment::new("EB", ["1", "IND", "30", "", "GOLD PLAN"]),
            Segment::new("EB", ["C", "IND", "30", "", "", "23", "500"]),
            Segment::new("DTP", ["307", "RD8", "20240101-20241231"]),
            Segment::new("MSG", ["DEDUCTIBLE APPLIES"]),
            Segment::new("HL", ["4", "3", "23", "0"]),
            Segment::new("NM1", ["03", "1", "DOE", "JANE"]),
            Segment::new("INS", ["N", "19"]),
            Segment::new("EB", ["6", "", "30"]),
        ]
    }

    #[test]
    fn test_response_benefits_split_by_level() {
        let segments = response_segments();
        let response = EligibilityResponse::read(&Reader::new(&segments, &Delimiters::default()));

        assert_eq!(response.information_source.payer_id, "12345");
        assert_eq!(response.subscriber.member.member_id, "W999");
        assert_eq!(
            response.subscriber.subscriber_dates,
            vec![SubscriberDate {
                qualifier: "346".into(),
                date: "20240101".into(),
            }]
        );

        let benefits = &response.subscriber.eligibility_benefits;
        assert_eq!(benefits.len(), 2);
        assert_eq!(benefits[0].plan_coverage_description.as_deref(), Some("GOLD PLAN"));
        assert_eq!(benefits[1].monetary_amount, Some(500.0));
        assert_eq!(
            benefits[1].date_range.as_ref().and_then(|r| r.to_date.as_deref()),
            Some("20241231")
        );
        assert_eq!(benefits[1].additional_info, vec!["DEDUCTIBLE APPLIES"]);

        let dependent = response.dependent.unwrap();
        assert_eq!(dependent.member.relationship_code, "19");
        assert_eq!(dependent.eligibility_benefits.len(), 1);
        assert_eq!(dependent.eligibility_benefits[0].information_status_code, "6");
        assert_eq!(response.request_validation, None);
    }

    #[test]
    fn test_inquiry_defaults_to_plan_coverage() {
        let segments = vec![Segment::new("NM1", ["IL", "1", "DOE", "JOHN", "", "", "", "MI", "W1"])];
        let inquiry = EligibilityInquiry::read(&Reader::new(&segments, &Delimiters::default()));
        assert_eq!(inquiry.eligibility_inquiries.len(), 1);
        assert_eq!(inquiry.eligibility_inquiries[0].service_type_code, "30");
        assert_eq!(inquiry.dependent, None);
    }

    #[test]
    fn test_eq_with_procedure_and_dates() {
        let segments = vec![
            Segment::new("EQ", ["98", "HC:99213"]),
            Segment::new("DTP", ["291", "D8", "20240315"]),
        ];
        let reader = Reader::new(&segments, &Delimiters::default());
        let inquiry = BenefitInquiry::read(&reader).unwrap();
        assert_eq!(inquiry.procedure_code.as_deref(), Some("99213"));

        let mut writer = SegmentWriter::new(Delimiters::default());
        inquiry.write(&mut writer);
        assert_eq!(writer.finish(false), "EQ*98*HC:99213~DTP*291*D8*20240315~");
    }

    #[test]
    fn test_request_validation() {
        let aaa = Segment::new("AAA", ["N", "", "72", "C"]);
        let validation = RequestValidation::read(&aaa);
        assert!(!validation.valid_request);
        assert_eq!(validation.reject_reason_code.as_deref(), Some("72"));

        let mut writer = SegmentWriter::new(Delimiters::default());
        validation.write(&mut writer);
        assert_eq!(writer.finish(false), "AAA*N**72*C~");
    }
}
