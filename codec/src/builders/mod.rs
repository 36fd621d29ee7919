//! Transaction builders
//!
//! One module per business document. Each exposes a payload type with a
//! `read` constructor (segments to fields) and a `write` method (fields to
//! segments), both built on the shared [`Reader`] queries and writer helpers
//! in [`common`].

mod claim;
mod claim_status;
mod common;
mod eligibility;
mod institutional;
mod professional;
mod remittance;
mod services_review;

use x12_segment::{Delimiters, Segment, SegmentWriter};

use crate::envelope::Envelope;
use crate::loops;
use crate::transaction::{TransactionBody, TransactionType};

pub use claim::{BillingProvider, ClaimInformation, ClaimSubscriber, DiagnosisCode, Patient, Payer};
pub use claim_status::{
    ClaimInquiry, ClaimStatus, ClaimStatusInquiry, ClaimStatusResponse, ServiceLineStatus,
    ServiceProvider,
};
pub use common::{
    Address, DateRange, Dependent, EntityType, Gender, InformationReceiver, InformationSource,
    Name, ProviderRef, Subscriber,
};
pub use eligibility::{
    BenefitInquiry, EligibilityBenefit, EligibilityInquiry, EligibilityResponse,
    RequestValidation, ResponseDependent, ResponseSubscriber, SubscriberDate,
};
pub use institutional::{FacilityInfo, InstitutionalClaim, InstitutionalServiceLine};
pub use professional::{ProfessionalClaim, ServiceLine};
pub use remittance::{
    Adjustment, ClaimPayment, PayeeInfo, PayerInfo, PaymentMethod, Remittance, ServicePayment,
};
pub use services_review::{
    ActionCode, Certification, PatientEvent, RequesterInfo, ServiceInfo, ServicesReview, UmoInfo,
};

/// Read-only view over a run of segments, carrying the component separator
/// needed to split composites
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reader<'a> {
    segments: &'a [Segment],
    component: char,
}

/// A name segment (`NM1` or `N1`) and the segments that describe it
#[derive(Debug, Clone, Copy)]
pub(crate) struct Entity<'a> {
    pub head: &'a Segment,
    pub scope: Reader<'a>,
}

impl<'a> Reader<'a> {
    pub fn new(segments: &'a [Segment], delimiters: &Delimiters) -> Self {
        Self {
            segments,
            component: delimiters.component,
        }
    }

    #[inline]
    pub fn segments(&self) -> &'a [Segment] {
        self.segments
    }

    /// Same separator, different run of segments
    pub fn narrow(&self, segments: &'a [Segment]) -> Self {
        Self {
            segments,
            component: self.component,
        }
    }

    /// Segments after the first one matching `id`/`element`/`value`, or an
    /// empty run when there is no match
    pub fn after(&self, id: &str, element: usize, value: &str) -> Self {
        match x12_segment::position(self.segments, id, element, value) {
            Some(i) => self.narrow(&self.segments[i + 1..]),
            None => self.narrow(&[]),
        }
    }

    /// Segments before the first one matching `id`/`element`/`value`, or the
    /// whole run when there is no match
    pub fn before(&self, id: &str, element: usize, value: &str) -> Self {
        self.cut(x12_segment::position(self.segments, id, element, value))
    }

    /// Segments before the first `id` segment, or the whole run
    pub fn until(&self, id: &str) -> Self {
        self.cut(self.segments.iter().position(|s| s.is(id)))
    }

    fn cut(&self, end: Option<usize>) -> Self {
        end.map_or(*self, |i| self.narrow(&self.segments[..i]))
    }

    pub fn find(&self, id: &str, element: usize, value: &str) -> Option<&'a Segment> {
        x12_segment::find(self.segments, id, element, value)
    }

    pub fn first(&self, id: &str) -> Option<&'a Segment> {
        x12_segment::first(self.segments, id)
    }

    pub fn all(&self, id: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        x12_segment::find_all(self.segments, id)
    }

    /// One reader per `anchor` segment, each running to the next anchor
    pub fn anchored(&self, anchor: &str) -> Vec<Reader<'a>> {
        x12_segment::anchored(self.segments, anchor)
            .into_iter()
            .map(|s| self.narrow(s))
            .collect()
    }

    /// Components of a composite element
    pub fn components(&self, segment: &'a Segment, element: usize) -> Vec<&'a str> {
        segment.components(element, self.component)
    }

    /// `NM1` with the given entity identifier code, scoped up to the next
    /// loop-opening segment
    pub fn entity(&self, code: &str) -> Option<Entity<'a>> {
        let start = x12_segment::position(self.segments, "NM1", 1, code)?;
        Some(self.scoped(start, |s| loops::loop_id(s).is_some()))
    }

    /// `N1` with the given entity identifier code, scoped up to the next `N1`
    /// or loop-opening segment
    pub fn party(&self, code: &str) -> Option<Entity<'a>> {
        let start = x12_segment::position(self.segments, "N1", 1, code)?;
        Some(self.scoped(start, |s| s.is("N1") || loops::loop_id(s).is_some()))
    }

    fn scoped(&self, start: usize, stop: impl Fn(&Segment) -> bool) -> Entity<'a> {
        let rest = &self.segments[start + 1..];
        let end = rest.iter().position(stop).unwrap_or(rest.len());
        Entity {
            head: &self.segments[start],
            scope: self.narrow(&rest[..end]),
        }
    }
}

/// Populate the payload of `transaction_type` from a segment sequence
pub(crate) fn read(transaction_type: TransactionType, reader: &Reader<'_>) -> TransactionBody {
    match transaction_type {
        TransactionType::Professional => TransactionBody::Professional(ProfessionalClaim::read(reader)),
        TransactionType::Institutional => {
            TransactionBody::Institutional(InstitutionalClaim::read(reader))
        }
        TransactionType::Remittance => TransactionBody::Remittance(Remittance::read(reader)),
        TransactionType::EligibilityInquiry => {
            TransactionBody::EligibilityInquiry(EligibilityInquiry::read(reader))
        }
        TransactionType::EligibilityResponse => {
            TransactionBody::EligibilityResponse(EligibilityResponse::read(reader))
        }
        TransactionType::ClaimStatusInquiry => {
            TransactionBody::ClaimStatusInquiry(ClaimStatusInquiry::read(reader))
        }
        TransactionType::ClaimStatusResponse => {
            TransactionBody::ClaimStatusResponse(ClaimStatusResponse::read(reader))
        }
        TransactionType::ServicesReview => TransactionBody::ServicesReview(ServicesReview::read(reader)),
    }
}

/// Emit the body segments of a transaction, between ST and SE
pub(crate) fn write(body: &TransactionBody, envelope: &Envelope, writer: &mut SegmentWriter) {
    match body {
        TransactionBody::Professional(tx) => tx.write(writer),
        TransactionBody::Institutional(tx) => tx.write(writer),
        TransactionBody::Remittance(tx) => tx.write(writer),
        TransactionBody::EligibilityInquiry(tx) => tx.write(envelope, writer),
        TransactionBody::EligibilityResponse(tx) => tx.write(envelope, writer),
        TransactionBody::ClaimStatusInquiry(tx) => tx.write(envelope, writer),
        TransactionBody::ClaimStatusResponse(tx) => tx.write(envelope, writer),
        TransactionBody::ServicesReview(tx) => tx.write(envelope, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new("NM1", ["85", "2", "CLINIC"]),
            Segment::new("N3", ["1 MAIN ST"]),
            Segment::new("REF", ["EI", "123456789"]),
            Segment::new("HL", ["2", "1", "22", "0"]),
            Segment::new("N3", ["9 ELSEWHERE"]),
            Segment::new("N1", ["PR", "PAYER"]),
            Segment::new("REF", ["2U", "P1"]),
            Segment::new("N1", ["PE", "CLINIC"]),
            Segment::new("REF", ["TJ", "99"]),
        ]
    }

    #[test]
    fn test_entity_scope_stops_at_next_loop() {
        let segments = segments();
        let reader = Reader::new(&segments, &Delimiters::default());
        let billing = reader.entity("85").unwrap();
        assert_eq!(billing.head.element(3), "CLINIC");
        assert_eq!(billing.scope.segments().len(), 2);
        assert!(reader.entity("IL").is_none());
    }

    #[test]
    fn test_party_scope_stops_at_next_n1() {
        let segments = segments();
        let reader = Reader::new(&segments, &Delimiters::default());
        let payer = reader.party("PR").unwrap();
        assert_eq!(payer.scope.segments().len(), 1);
        assert_eq!(payer.scope.find("REF", 1, "2U").map(|s| s.element(2)), Some("P1"));
        let payee = reader.party("PE").unwrap();
        assert_eq!(payee.scope.segments().len(), 1);
    }

    #[test]
    fn test_after_and_before() {
        let segments = segments();
        let reader = Reader::new(&segments, &Delimiters::default());
        assert_eq!(reader.after("HL", 3, "22").segments().len(), 5);
        assert_eq!(reader.before("HL", 3, "22").segments().len(), 3);
        assert!(reader.after("HL", 3, "23").segments().is_empty());
        assert_eq!(reader.before("HL", 3, "23").segments().len(), 9);
        assert_eq!(reader.until("N1").segments().len(), 5);
        assert_eq!(reader.until("CLM").segments().len(), 9);
    }
}
