//! X12 Validation Library
//!
//! A diagnostic pass over an X12 document that never fails. Where
//! `x12_codec::parse` stops at the first structural problem, [`validate`]
//! surveys the whole document and reports everything it finds as errors
//! (the document is unusable) or warnings (non-standard but processable).
//!
//! Validators are composable: each one sees every segment in order, then
//! gets a [`Validator::finish`] call for end-of-document checks.
//!
//! # Usage
//!
//! ```ignore
//! let report = x12_validation::validate(raw);
//! if !report.valid {
//!     for issue in &report.errors {
//!         eprintln!("{issue}");
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use x12_codec::TransactionType;
use x12_segment::{isa, Delimiters, Document, Segment, ENVELOPE_IDS};

/// Maximum number of issues a single validator accumulates
pub const MAX_ISSUES: usize = 1000;

/// Issue severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    /// Violates the envelope structure, the document should be rejected
    #[default]
    Error,
    /// Non-standard but processable
    Warning,
}

/// Machine-readable issue code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    ParseError,
    MissingIsa,
    MissingGs,
    MissingSt,
    MissingSe,
    MissingGe,
    MissingIea,
    InvalidIsa,
    SegmentSequence,
    SegmentCountMismatch,
    ControlNumberMismatch,
    UnsupportedTransaction,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::MissingIsa => "MISSING_ISA",
            Self::MissingGs => "MISSING_GS",
            Self::MissingSt => "MISSING_ST",
            Self::MissingSe => "MISSING_SE",
            Self::MissingGe => "MISSING_GE",
            Self::MissingIea => "MISSING_IEA",
            Self::InvalidIsa => "INVALID_ISA",
            Self::SegmentSequence => "SEGMENT_SEQUENCE",
            Self::SegmentCountMismatch => "SEGMENT_COUNT_MISMATCH",
            Self::ControlNumberMismatch => "CONTROL_NUMBER_MISMATCH",
            Self::UnsupportedTransaction => "UNSUPPORTED_TRANSACTION",
        }
    }

    fn missing(segment_id: &str) -> Option<Self> {
        match segment_id {
            "ISA" => Some(Self::MissingIsa),
            "GS" => Some(Self::MissingGs),
            "ST" => Some(Self::MissingSt),
            "SE" => Some(Self::MissingSe),
            "GE" => Some(Self::MissingGe),
            "IEA" => Some(Self::MissingIea),
            _ => None,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic with its location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(skip)]
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    /// Segment identifier the issue was found on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    /// X12 element number within that segment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<usize>,
}

impl Issue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            segment: None,
            element: None,
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    pub fn at(mut self, segment: &str, element: Option<usize>) -> Self {
        self.segment = Some(segment.to_string());
        self.element = element;
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.code)?;
        if let Some(segment) = &self.segment {
            write!(f, " at {segment}")?;
            if let Some(element) = self.element {
                write!(f, "{element:02}")?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Outcome of [`validate`]
///
/// `valid` is true exactly when `errors` is empty; warnings never affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationResult {
    fn from_issues(issues: Vec<Issue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Whether any error or warning carries the code
    pub fn has(&self, code: IssueCode) -> bool {
        self.errors
            .iter()
            .chain(&self.warnings)
            .any(|issue| issue.code == code)
    }
}

/// Trait for individual validators
///
/// Validators accumulate issues internally and never stop processing.
pub trait Validator {
    /// Inspect the next segment in document order
    fn validate(&mut self, segment: &Segment);

    /// Called once after the last segment
    fn finish(&mut self) {}

    /// Accumulated issues
    fn issues(&self) -> &[Issue];

    /// Reset to the initial state
    fn clear(&mut self);

    /// Validator name, for logs
    fn name(&self) -> &str;
}

fn push(issues: &mut Vec<Issue>, issue: Issue) {
    if issues.len() < MAX_ISSUES {
        issues.push(issue);
    }
}

/// Envelope structure: presence, ISA shape and nesting
///
/// Missing envelope segments and a malformed ISA are errors. Envelope
/// segments out of their nesting order are only warnings, since the codec
/// locates envelope segments by identifier rather than position.
pub struct EnvelopeValidator {
    issues: Vec<Issue>,
    seen: HashSet<String>,
    state: EnvelopeState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeState {
    Initial,
    InInterchange,
    InGroup,
    InTransaction,
}

impl EnvelopeValidator {
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            seen: HashSet::new(),
            state: EnvelopeState::Initial,
        }
    }

    /// Check the current state, then move to `next`
    fn step(&mut self, segment: &Segment, expected: EnvelopeState, next: EnvelopeState, scope: &str) {
        if self.state != expected {
            push(
                &mut self.issues,
                Issue::warning(
                    IssueCode::SegmentSequence,
                    format!("{} segment outside of {scope}", segment.id),
                )
                .at(&segment.id, None),
            );
        }
        self.state = next;
    }

    fn validate_isa(&mut self, segment: &Segment) {
        let found = segment.elements.len();
        if found != isa::ISA_ELEMENT_COUNT {
            push(
                &mut self.issues,
                Issue::error(
                    IssueCode::InvalidIsa,
                    format!(
                        "ISA segment must have {} elements, found {found}",
                        isa::ISA_ELEMENT_COUNT
                    ),
                )
                .at("ISA", None),
            );
        }
    }
}

impl Default for EnvelopeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for EnvelopeValidator {
    fn validate(&mut self, segment: &Segment) {
        if !segment.is_envelope() {
            return;
        }
        self.seen.insert(segment.id.clone());

        use EnvelopeState::*;
        match segment.id.as_str() {
            "ISA" => {
                self.validate_isa(segment);
                self.step(segment, Initial, InInterchange, "a new document or interchange");
            }
            "GS" => self.step(segment, InInterchange, InGroup, "an interchange"),
            "ST" => self.step(segment, InGroup, InTransaction, "a functional group"),
            "SE" => self.step(segment, InTransaction, InGroup, "a transaction set"),
            "GE" => self.step(segment, InGroup, InInterchange, "a functional group"),
            "IEA" => self.step(segment, InInterchange, Initial, "an interchange"),
            _ => {}
        }
    }

    fn finish(&mut self) {
        for id in ENVELOPE_IDS {
            if self.seen.contains(id) {
                continue;
            }
            if let Some(code) = IssueCode::missing(id) {
                push(
                    &mut self.issues,
                    Issue::error(code, format!("Missing {id} segment")),
                );
            }
        }
    }

    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn clear(&mut self) {
        self.issues.clear();
        self.seen.clear();
        self.state = EnvelopeState::Initial;
    }

    fn name(&self) -> &str {
        "envelope"
    }
}

/// Trailer counts and control numbers
///
/// SE01 must count the segments from ST through SE inclusive; SE02, GE02 and
/// IEA02 must repeat the control numbers of their headers. All mismatches are
/// warnings.
pub struct ControlValidator {
    issues: Vec<Issue>,
    isa_control: Option<String>,
    gs_control: Option<String>,
    st_control: Option<String>,
    /// Segments seen since the open ST, ST included
    st_segment_count: Option<usize>,
}

impl ControlValidator {
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            isa_control: None,
            gs_control: None,
            st_control: None,
            st_segment_count: None,
        }
    }

    fn check_control(&mut self, segment: &Segment, header: &str, expected: Option<&String>) {
        let Some(expected) = expected else {
            return;
        };
        let found = segment.element(2);
        if same_control_number(found, expected) {
            return;
        }
        push(
            &mut self.issues,
            Issue::warning(
                IssueCode::ControlNumberMismatch,
                format!("{}02 ({found}) does not match {header} ({expected})", segment.id),
            )
            .at(&segment.id, Some(2)),
        );
    }

    fn check_count(&mut self, segment: &Segment, actual: usize) {
        let declared = segment.element(1);
        if declared.trim().parse::<usize>().ok() == Some(actual) {
            return;
        }
        push(
            &mut self.issues,
            Issue::warning(
                IssueCode::SegmentCountMismatch,
                format!("SE segment count ({declared}) does not match actual count ({actual})"),
            )
            .at("SE", Some(1)),
        );
    }
}

impl Default for ControlValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Control numbers compare numerically when both sides are numeric
fn same_control_number(found: &str, expected: &str) -> bool {
    let (found, expected) = (found.trim(), expected.trim());
    match (found.parse::<u64>(), expected.parse::<u64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => found == expected,
    }
}

impl Validator for ControlValidator {
    fn validate(&mut self, segment: &Segment) {
        if let Some(count) = self.st_segment_count.as_mut() {
            *count += 1;
        }

        match segment.id.as_str() {
            "ISA" => {
                self.isa_control = segment
                    .optional(isa::CONTROL_NUMBER_FIELD + 1)
                    .map(str::to_string)
            }
            "GS" => self.gs_control = segment.optional(6).map(str::to_string),
            "ST" => {
                self.st_control = segment.optional(2).map(str::to_string);
                self.st_segment_count = Some(1);
            }
            "SE" => {
                if let Some(actual) = self.st_segment_count.take() {
                    self.check_count(segment, actual);
                }
                let st_control = self.st_control.take();
                self.check_control(segment, "ST02", st_control.as_ref());
            }
            "GE" => {
                let gs_control = self.gs_control.take();
                self.check_control(segment, "GS06", gs_control.as_ref());
            }
            "IEA" => {
                let isa_control = self.isa_control.take();
                self.check_control(segment, "ISA13", isa_control.as_ref());
            }
            _ => {}
        }
    }

    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn clear(&mut self) {
        self.issues.clear();
        self.isa_control = None;
        self.gs_control = None;
        self.st_control = None;
        self.st_segment_count = None;
    }

    fn name(&self) -> &str {
        "control"
    }
}

/// ST01 must name one of the modeled transaction sets
#[derive(Default)]
pub struct TransactionSetValidator {
    issues: Vec<Issue>,
}

impl TransactionSetValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_supported(code: &str) -> bool {
        TransactionType::ALL.iter().any(|t| t.st_code() == code)
    }
}

impl Validator for TransactionSetValidator {
    fn validate(&mut self, segment: &Segment) {
        if !segment.is("ST") {
            return;
        }
        let code = segment.element(1);
        if !Self::is_supported(code) {
            push(
                &mut self.issues,
                Issue::warning(
                    IssueCode::UnsupportedTransaction,
                    format!("Transaction type {code} may not be fully supported"),
                )
                .at("ST", Some(1)),
            );
        }
    }

    fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn clear(&mut self) {
        self.issues.clear();
    }

    fn name(&self) -> &str {
        "transaction set"
    }
}

/// Composable validation suite
///
/// Runs every validator over the same segment stream and concatenates their
/// issues in the order the validators were added.
pub struct ValidationSuite {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidationSuite {
    /// Create an empty suite
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Envelope, control and transaction set checks
    pub fn standard() -> Self {
        let mut suite = Self::new();
        suite.add(Box::new(EnvelopeValidator::new()));
        suite.add(Box::new(ControlValidator::new()));
        suite.add(Box::new(TransactionSetValidator::new()));
        suite
    }

    pub fn add(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn validate(&mut self, segment: &Segment) {
        for validator in &mut self.validators {
            validator.validate(segment);
        }
    }

    pub fn issue_count(&self) -> usize {
        self.validators.iter().map(|v| v.issues().len()).sum()
    }

    pub fn clear(&mut self) {
        for validator in &mut self.validators {
            validator.clear();
        }
    }

    /// Run end-of-document checks and collect every issue
    pub fn finish(mut self) -> Vec<Issue> {
        let mut all_issues = Vec::new();
        for validator in &mut self.validators {
            validator.finish();
            tracing::trace!(
                validator = validator.name(),
                issues = validator.issues().len(),
                "validator finished"
            );
            all_issues.extend(validator.issues().iter().cloned());
        }
        all_issues
    }
}

impl Default for ValidationSuite {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a raw X12 document
///
/// Never panics and never fails: every problem, including input with no
/// segments at all, is reported in the returned [`ValidationResult`].
pub fn validate(text: &str) -> ValidationResult {
    let document = Document::parse(text, Delimiters::default());
    if document.segments.is_empty() {
        return ValidationResult::from_issues(vec![Issue::error(
            IssueCode::ParseError,
            "No valid segments found in EDI document",
        )]);
    }

    let mut suite = ValidationSuite::standard();
    for segment in &document.segments {
        suite.validate(segment);
    }
    let result = ValidationResult::from_issues(suite.finish());

    tracing::debug!(
        segments = document.segments.len(),
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        valid = result.valid,
        "validated document"
    );
    result
}
