use serde::{Deserialize, Serialize};
use x12_segment::{Segment, SegmentWriter};

use super::common::{
    amount, format_amount, format_quantity, optional_amount, owned, procedure_composite,
    read_procedure, reference, write_name, Address, Name,
};
use super::Reader;

/// CAS holds at most six reason/amount/quantity triplets
const CAS_TRIPLETS: usize = 6;

/// 835 claim payment/advice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remittance {
    pub payer_info: PayerInfo,
    pub payee_info: PayeeInfo,
    pub payment_method: PaymentMethod,
    /// BPR16, CCYYMMDD
    pub payment_date: String,
    pub payment_amount: f64,
    /// TRN02
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_or_eft_number: Option<String>,
    #[serde(default)]
    pub claim_payments: Vec<ClaimPayment>,
}

/// BPR04
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Automated clearing house transfer
    Ach,
    /// Physical check
    #[default]
    Chk,
    /// Non-payment data
    Non,
}

impl PaymentMethod {
    pub fn code(self) -> &'static str {
        match self {
            Self::Ach => "ACH",
            Self::Chk => "CHK",
            Self::Non => "NON",
        }
    }

    fn from_code(code: &str) -> Self {
        match code {
            "ACH" => Self::Ach,
            "NON" => Self::Non,
            _ => Self::Chk,
        }
    }
}

/// 1000A payer identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerInfo {
    pub name: String,
    pub payer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// 1000B payee identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayeeInfo {
    pub name: String,
    pub npi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// 2100 claim payment (CLP)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayment {
    pub claim_id: String,
    /// CLP02 (1 processed as primary, 2 secondary, 4 denied, 22 reversal, ...)
    pub claim_status: String,
    pub total_claim_charge_amount: f64,
    pub total_claim_payment_amount: f64,
    pub patient_responsibility_amount: f64,
    /// CLP06, `MC` (Medicaid) when absent
    pub claim_filing_indicator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_claim_control_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<Name>,
    /// Claim-level CAS, directly under the CLP
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<Adjustment>,
    #[serde(default)]
    pub service_lines: Vec<ServicePayment>,
}

/// 2110 service payment (SVC)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayment {
    pub procedure_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedure_modifiers: Vec<String>,
    pub charge_amount: f64,
    pub paid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_code: Option<String>,
    pub units: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<String>,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_amount: Option<f64>,
}

/// One CAS reason/amount/quantity triplet with its group code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustment {
    /// CO contractual, CR correction, OA other, PI payer initiated, PR patient responsibility
    pub group_code: String,
    pub reason_code: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

impl Adjustment {
    /// Every triplet of one CAS segment
    fn read(cas: &Segment) -> impl Iterator<Item = Self> + '_ {
        let group_code = cas.element(1);
        (0..CAS_TRIPLETS)
            .map(move |i| 2 + i * 3)
            .take_while(move |&reason| !cas.element(reason).is_empty())
            .map(move |reason| Self {
                group_code: group_code.to_string(),
                reason_code: cas.element(reason).to_string(),
                amount: amount(cas.element(reason + 1)),
                quantity: optional_amount(cas.optional(reason + 2)),
            })
    }

    fn read_all<'a>(segments: impl Iterator<Item = &'a Segment>) -> Vec<Self> {
        segments.filter(|s| s.is("CAS")).flat_map(Self::read).collect()
    }

    /// CAS segments, packing consecutive adjustments of one group together
    fn write_all(adjustments: &[Self], writer: &mut SegmentWriter) {
        let mut rest = adjustments;
        while let Some(first) = rest.first() {
            let run = rest
                .iter()
                .take(CAS_TRIPLETS)
                .take_while(|a| a.group_code == first.group_code)
                .count();
            let mut elements = vec![first.group_code.clone()];
            for adjustment in &rest[..run] {
                elements.push(adjustment.reason_code.clone());
                elements.push(format_amount(adjustment.amount));
                elements.push(adjustment.quantity.map(format_quantity).unwrap_or_default());
            }
            writer.push("CAS", elements);
            rest = &rest[run..];
        }
    }
}

impl ServicePayment {
    fn read(service: &Reader<'_>) -> Option<Self> {
        let svc = service.first("SVC")?;
        let (procedure_code, procedure_modifiers) = read_procedure(service, svc, 1);
        Some(Self {
            procedure_code,
            procedure_modifiers,
            charge_amount: amount(svc.element(2)),
            paid_amount: amount(svc.element(3)),
            revenue_code: owned(svc.optional(4)),
            units: svc.optional(5).map(amount).unwrap_or(1.0),
            service_date: owned(service.find("DTM", 1, "472").and_then(|d| d.optional(2))),
            adjustments: Adjustment::read_all(service.segments().iter()),
            allowed_amount: optional_amount(
                service.find("AMT", 1, "B6").and_then(|a| a.optional(2)),
            ),
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
                self.revenue_code.clone().unwrap_or_default(),
                format_quantity(self.units),
            ],
        );
        if let Some(date) = &self.service_date {
            writer.push("DTM", ["472", date.as_str()]);
        }
        Adjustment::write_all(&self.adjustments, writer);
        if let Some(allowed) = self.allowed_amount {
            writer.push("AMT", ["B6".to_string(), format_amount(allowed)]);
        }
    }
}

impl ClaimPayment {
    fn read(claim: &Reader<'_>) -> Option<Self> {
        let clp = claim.first("CLP")?;
        let header = claim.until("SVC");
        let service_lines: Vec<ServicePayment> = claim
            .anchored("SVC")
            .iter()
            .filter_map(ServicePayment::read)
            .collect();

        Some(Self {
            claim_id: clp.element(1).to_string(),
            claim_status: clp.element(2).to_string(),
            total_claim_charge_amount: amount(clp.element(3)),
            total_claim_payment_amount: amount(clp.element(4)),
            patient_responsibility_amount: amount(clp.element(5)),
            claim_filing_indicator: clp.optional(6).unwrap_or("MC").to_string(),
            payer_claim_control_number: owned(clp.optional(7)),
            patient_name: header.entity("QC").map(|e| Name::read(e.head)),
            adjustments: Adjustment::read_all(header.segments().iter()),
            service_lines,
        })
    }

    fn write(&self, writer: &mut SegmentWriter) {
        let filing = if self.claim_filing_indicator.is_empty() {
            "MC"
        } else {
            self.claim_filing_indicator.as_str()
        };
        writer.push(
            "CLP",
            [
                self.claim_id.clone(),
                self.claim_status.clone(),
                format_amount(self.total_claim_charge_amount),
                format_amount(self.total_claim_payment_amount),
                format_amount(self.patient_responsibility_amount),
                filing.to_string(),
                self.payer_claim_control_number.clone().unwrap_or_default(),
            ],
        );
        Adjustment::write_all(&self.adjustments, writer);
        if let Some(patient) = &self.patient_name {
            write_name(writer, "QC", patient, "", "");
        }
        for service in &self.service_lines {
            service.write(writer);
        }
    }
}

impl PayerInfo {
    fn read(reader: &Reader<'_>) -> Self {
        if let Some(party) = reader.party("PR") {
            return Self {
                name: party.head.element(2).to_string(),
                payer_id: reference(&party.scope, "2U").unwrap_or_default(),
                address: Address::read(&party.scope),
            };
        }
        // some payers identify themselves with NM1 instead of N1
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
        writer.push("N1", ["PR", self.name.as_str()]);
        if let Some(address) = &self.address {
            address.write(writer);
        }
        writer.push("REF", ["2U", self.payer_id.as_str()]);
    }
}

impl PayeeInfo {
    fn read(reader: &Reader<'_>) -> Self {
        reader
            .party("PE")
            .map(|party| Self {
                name: party.head.element(2).to_string(),
                npi: party.head.element(4).to_string(),
                tax_id: reference(&party.scope, "TJ"),
                address: Address::read(&party.scope),
            })
            .unwrap_or_default()
    }

    fn write(&self, writer: &mut SegmentWriter) {
        let qualifier = if self.npi.is_empty() { "" } else { "XX" };
        writer.push("N1", ["PE", self.name.as_str(), qualifier, self.npi.as_str()]);
        if let Some(address) = &self.address {
            address.write(writer);
        }
        if let Some(tax_id) = &self.tax_id {
            writer.push("REF", ["TJ", tax_id.as_str()]);
        }
    }
}

impl Remittance {
    pub(crate) fn read(reader: &Reader<'_>) -> Self {
        let header = reader.until("CLP");
        let bpr = header.first("BPR");
        let claim_payments: Vec<ClaimPayment> = reader
            .anchored("CLP")
            .iter()
            .filter_map(ClaimPayment::read)
            .collect();
        tracing::debug!(claims = claim_payments.len(), "read remittance");

        Self {
            payer_info: PayerInfo::read(&header),
            payee_info: PayeeInfo::read(&header),
            payment_method: PaymentMethod::from_code(bpr.map(|b| b.element(4)).unwrap_or("")),
            payment_date: bpr
                .and_then(|b| b.optional(16))
                .or_else(|| header.find("DTM", 1, "405").and_then(|d| d.optional(2)))
                .unwrap_or("")
                .to_string(),
            payment_amount: amount(bpr.map(|b| b.element(2)).unwrap_or("")),
            check_or_eft_number: header
                .find("TRN", 1, "1")
                .and_then(|t| t.optional(2))
                .map(str::to_string),
            claim_payments,
        }
    }

    pub(crate) fn write(&self, writer: &mut SegmentWriter) {
        let mut bpr = vec![String::new(); 16];
        bpr[0] = "I".into();
        bpr[1] = format_amount(self.payment_amount);
        bpr[2] = "C".into();
        bpr[3] = self.payment_method.code().into();
        bpr[15] = self.payment_date.clone();
        writer.push("BPR", bpr);

        let originator = format!("1{}", self.payer_info.payer_id);
        writer.push(
            "TRN",
            [
                "1",
                self.check_or_eft_number.as_deref().unwrap_or_default(),
                originator.as_str(),
            ],
        );
        writer.push("DTM", ["405", self.payment_date.as_str()]);

        self.payer_info.write(writer);
        self.payee_info.write(writer);

        for claim in &self.claim_payments {
            claim.write(writer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use x12_segment::Delimiters;

    #[test]
    fn test_cas_triplets() {
        let cas = Segment::new("CAS", ["CO", "45", "20", "", "253", "1.5", "2"]);
        let adjustments: Vec<_> = Adjustment::read(&cas).collect();
        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[0].reason_code, "45");
        assert_eq!(adjustments[0].quantity, None);
        assert_eq!(adjustments[1].group_code, "CO");
        assert_eq!(adjustments[1].amount, 1.5);
        assert_eq!(adjustments[1].quantity, Some(2.0));
    }

    #[test]
    fn test_cas_packs_by_group() {
        let adjustment = |group: &str, reason: &str| Adjustment {
            group_code: group.into(),
            reason_code: reason.into(),
            amount: 10.0,
            quantity: None,
        };
        let mut writer = SegmentWriter::new(Delimiters::default());
        Adjustment::write_all(
            &[adjustment("CO", "45"), adjustment("CO", "253"), adjustment("PR", "1")],
            &mut writer,
        );
        assert_eq!(
            writer.finish(false),
            "CAS*CO*45*10.00**253*10.00~CAS*PR*1*10.00~"
        );
    }

    #[test]
    fn test_claim_level_and_line_level_adjustments() {
        let segments = vec![
            Segment::new("CLP", ["C1", "1", "200", "150", "50"]),
            Segment::new("CAS", ["OA", "23", "5"]),
            Segment::new("NM1", ["QC", "1", "DOE", "JOHN"]),
            Segment::new("SVC", ["HC:99213", "200", "150", "", ""]),
            Segment::new("DTM", ["472", "20240110"]),
            Segment::new("CAS", ["PR", "2", "45"]),
            Segment::new("AMT", ["B6", "195"]),
        ];
        let reader = Reader::new(&segments, &Delimiters::default());
        let claim = ClaimPayment::read(&reader).unwrap();
        assert_eq!(claim.claim_filing_indicator, "MC");
        assert_eq!(claim.patient_name.as_ref().map(|n| n.last_name.as_str()), Some("DOE"));
        assert_eq!(claim.adjustments.len(), 1);
        assert_eq!(claim.adjustments[0].reason_code, "23");

        let line = &claim.service_lines[0];
        assert_eq!(line.units, 1.0);
        assert_eq!(line.service_date.as_deref(), Some("20240110"));
        assert_eq!(line.adjustments.len(), 1);
        assert_eq!(line.adjustments[0].group_code, "PR");
        assert_eq!(line.allowed_amount, Some(195.0));
    }

    #[test]
    fn test_trace_number_is_kept_verbatim() {
        let reread = |remittance: &Remittance| {
            let mut writer = SegmentWriter::new(Delimiters::default());
            remittance.write(&mut writer);
            let text = writer.finish(false);
            let document = x12_segment::Document::parse(&text, Delimiters::default());
            let trn = x12_segment::find(&document.segments, "TRN", 1, "1").cloned();
            let reader = Reader::new(&document.segments, &Delimiters::default());
            (trn, Remittance::read(&reader))
        };
        let base = Remittance {
            payer_info: PayerInfo {
                payer_id: "ACME01".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let zero = Remittance {
            check_or_eft_number: Some("0".into()),
            ..base.clone()
        };
        let (trn, parsed) = reread(&zero);
        assert_eq!(trn.map(|t| t.elements.join("*")).as_deref(), Some("1*0*1ACME01"));
        assert_eq!(parsed.check_or_eft_number.as_deref(), Some("0"));

        let (trn, parsed) = reread(&base);
        assert_eq!(trn.map(|t| t.elements.join("*")).as_deref(), Some("1**1ACME01"));
        assert_eq!(parsed.check_or_eft_number, None);
    }

    #[test]
    fn test_payment_method_codes() {
        assert_eq!(PaymentMethod::from_code("ACH"), PaymentMethod::Ach);
        assert_eq!(PaymentMethod::from_code(""), PaymentMethod::Chk);
        assert_eq!(PaymentMethod::Non.code(), "NON");
    }
}
