use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use x12_segment::{first, Delimiters, Segment};

use crate::builders::{
    ClaimStatusInquiry, ClaimStatusResponse, EligibilityInquiry, EligibilityResponse,
    InstitutionalClaim, ProfessionalClaim, Remittance, ServicesReview,
};
use crate::envelope::Envelope;
use crate::error::{X12Error, X12Result};
use crate::loops::Loop;

/// The eight supported transaction variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// 837P health care claim, professional
    #[serde(rename = "837P")]
    Professional,
    /// 837I health care claim, institutional
    #[serde(rename = "837I")]
    Institutional,
    /// 835 claim payment/advice
    #[serde(rename = "835")]
    Remittance,
    /// 270 eligibility, coverage or benefit inquiry
    #[serde(rename = "270")]
    EligibilityInquiry,
    /// 271 eligibility, coverage or benefit information
    #[serde(rename = "271")]
    EligibilityResponse,
    /// 276 claim status request
    #[serde(rename = "276")]
    ClaimStatusInquiry,
    /// 277 claim status response
    #[serde(rename = "277")]
    ClaimStatusResponse,
    /// 278 services review, request or response
    #[serde(rename = "278")]
    ServicesReview,
}

impl TransactionType {
    pub const ALL: [TransactionType; 8] = [
        Self::Professional,
        Self::Institutional,
        Self::Remittance,
        Self::EligibilityInquiry,
        Self::EligibilityResponse,
        Self::ClaimStatusInquiry,
        Self::ClaimStatusResponse,
        Self::ServicesReview,
    ];

    /// Short tag used in serialized transactions (`837P`, `835`, ...)
    pub fn tag(self) -> &'static str {
        match self {
            Self::Professional => "837P",
            Self::Institutional => "837I",
            Self::Remittance => "835",
            Self::EligibilityInquiry => "270",
            Self::EligibilityResponse => "271",
            Self::ClaimStatusInquiry => "276",
            Self::ClaimStatusResponse => "277",
            Self::ServicesReview => "278",
        }
    }

    /// ST01 transaction set identifier
    pub fn st_code(self) -> &'static str {
        match self {
            Self::Professional | Self::Institutional => "837",
            other => other.tag(),
        }
    }

    /// GS01 functional identifier code
    pub fn functional_id_code(self) -> &'static str {
        match self {
            Self::Professional | Self::Institutional => "HC",
            Self::Remittance => "HP",
            Self::EligibilityInquiry => "HS",
            Self::EligibilityResponse => "HB",
            Self::ClaimStatusInquiry => "HR",
            Self::ClaimStatusResponse => "HN",
            Self::ServicesReview => "HI",
        }
    }

    /// GS08 / ST03 implementation guide version
    pub fn version(self) -> &'static str {
        match self {
            Self::Professional => "005010X222A1",
            Self::Institutional => "005010X223A2",
            Self::Remittance => "005010X221A1",
            Self::EligibilityInquiry | Self::EligibilityResponse => "005010X279A1",
            Self::ClaimStatusInquiry | Self::ClaimStatusResponse => "005010X212",
            Self::ServicesReview => "005010X217",
        }
    }

    /// Determine the variant of a parsed document
    ///
    /// ST01 selects the transaction set. An 837 is institutional when the
    /// CLM05 facility code qualifier is `A`, professional when it is `B`;
    /// otherwise the implementation guide named in ST03/GS08 decides, and
    /// failing that the presence of institutional-only segments (SV2, CL1).
    pub fn classify(
        envelope: &Envelope,
        segments: &[Segment],
        delimiters: &Delimiters,
    ) -> X12Result<Self> {
        let code = envelope.st.transaction_set_id_code.as_str();
        let transaction_type = match code {
            "837" => Self::classify_claim(envelope, segments, delimiters),
            "835" => Self::Remittance,
            "270" => Self::EligibilityInquiry,
            "271" => Self::EligibilityResponse,
            "276" => Self::ClaimStatusInquiry,
            "277" => Self::ClaimStatusResponse,
            "278" => Self::ServicesReview,
            _ => {
                return Err(X12Error::UnsupportedTransactionType {
                    code: code.to_string(),
                })
            }
        };
        tracing::debug!(transaction_type = %transaction_type, "classified transaction");
        Ok(transaction_type)
    }

    fn classify_claim(envelope: &Envelope, segments: &[Segment], delimiters: &Delimiters) -> Self {
        if let Some(clm) = first(segments, "CLM") {
            match clm.component(5, 2, delimiters.component) {
                "A" => return Self::Institutional,
                "B" => return Self::Professional,
                _ => {}
            }
        }

        let guide = envelope
            .st
            .implementation_convention_reference
            .as_deref()
            .unwrap_or(&envelope.gs.version_code);
        if guide.contains("X223") {
            return Self::Institutional;
        }
        if guide.contains("X222") {
            return Self::Professional;
        }

        if segments.iter().any(|s| s.is("SV2") || s.is("CL1")) {
            Self::Institutional
        } else {
            Self::Professional
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TransactionType {
    type Err = X12Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == s)
            .ok_or_else(|| X12Error::UnsupportedTransactionType { code: s.to_string() })
    }
}

/// Variant-specific business content of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transactionType")]
pub enum TransactionBody {
    #[serde(rename = "837P")]
    Professional(ProfessionalClaim),
    #[serde(rename = "837I")]
    Institutional(InstitutionalClaim),
    #[serde(rename = "835")]
    Remittance(Remittance),
    #[serde(rename = "270")]
    EligibilityInquiry(EligibilityInquiry),
    #[serde(rename = "271")]
    EligibilityResponse(EligibilityResponse),
    #[serde(rename = "276")]
    ClaimStatusInquiry(ClaimStatusInquiry),
    #[serde(rename = "277")]
    ClaimStatusResponse(ClaimStatusResponse),
    #[serde(rename = "278")]
    ServicesReview(ServicesReview),
}

impl TransactionBody {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Professional(_) => TransactionType::Professional,
            Self::Institutional(_) => TransactionType::Institutional,
            Self::Remittance(_) => TransactionType::Remittance,
            Self::EligibilityInquiry(_) => TransactionType::EligibilityInquiry,
            Self::EligibilityResponse(_) => TransactionType::EligibilityResponse,
            Self::ClaimStatusInquiry(_) => TransactionType::ClaimStatusInquiry,
            Self::ClaimStatusResponse(_) => TransactionType::ClaimStatusResponse,
            Self::ServicesReview(_) => TransactionType::ServicesReview,
        }
    }
}

/// A parsed (or to-be-generated) transaction set
///
/// `raw_segments` and `loops` are populated by parsing and ignored by
/// generation, which works from `envelope` and `body` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub envelope: Envelope,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loops: Vec<Loop>,
    #[serde(flatten)]
    pub body: TransactionBody,
}

impl Transaction {
    pub fn new(envelope: Envelope, body: TransactionBody) -> Self {
        Self {
            envelope,
            raw_segments: Vec::new(),
            loops: Vec::new(),
            body,
        }
    }

    #[inline]
    pub fn transaction_type(&self) -> TransactionType {
        self.body.transaction_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::default_envelope;

    #[test]
    fn test_tag_round_trip() {
        for t in TransactionType::ALL {
            assert_eq!(t.to_string().parse::<TransactionType>(), Ok(t));
        }
        assert_eq!(
            "834".parse::<TransactionType>(),
            Err(X12Error::UnsupportedTransactionType { code: "834".into() })
        );
    }

    #[test]
    fn test_lookup_tables() {
        assert_eq!(TransactionType::Institutional.st_code(), "837");
        assert_eq!(TransactionType::Institutional.functional_id_code(), "HC");
        assert_eq!(TransactionType::ClaimStatusResponse.functional_id_code(), "HN");
        assert_eq!(TransactionType::ServicesReview.version(), "005010X217");
    }

    fn classify(envelope: &Envelope, segments: &[Segment]) -> X12Result<TransactionType> {
        TransactionType::classify(envelope, segments, &Delimiters::default())
    }

    #[test]
    fn test_classify_unknown_code() {
        let mut envelope = default_envelope(TransactionType::Remittance, "S", "R", "1");
        envelope.st.transaction_set_id_code = "999".into();
        assert_eq!(
            classify(&envelope, &[]),
            Err(X12Error::UnsupportedTransactionType { code: "999".into() })
        );
    }

    #[test]
    fn test_classify_837_by_facility_qualifier() {
        let envelope = default_envelope(TransactionType::Professional, "S", "R", "1");
        let institutional = [Segment::new("CLM", ["C1", "100", "", "", "13:A:1"])];
        assert_eq!(classify(&envelope, &institutional), Ok(TransactionType::Institutional));

        let professional = [Segment::new("CLM", ["C1", "100", "", "", "11:B:1"])];
        assert_eq!(classify(&envelope, &professional), Ok(TransactionType::Professional));
    }

    #[test]
    fn test_classify_837_by_guide_and_segments() {
        let envelope = default_envelope(TransactionType::Institutional, "S", "R", "1");
        assert_eq!(classify(&envelope, &[]), Ok(TransactionType::Institutional));

        let mut unlabeled = default_envelope(TransactionType::Professional, "S", "R", "1");
        unlabeled.st.implementation_convention_reference = None;
        unlabeled.gs.version_code = "005010".into();
        assert_eq!(classify(&unlabeled, &[]), Ok(TransactionType::Professional));
        assert_eq!(
            classify(&unlabeled, &[Segment::new("CL1", ["1", "7", "01"])]),
            Ok(TransactionType::Institutional)
        );
    }
}
