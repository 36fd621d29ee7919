/// Result type for codec operations
pub type X12Result<T> = Result<T, X12Error>;

/// Structural failures that abort a parse or generate call
///
/// Field-level problems (an unparsable amount, a missing optional segment)
/// never surface here; they are defaulted by the builders.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum X12Error {
    /// The input contained no segments at all
    #[error("No valid segments found in EDI document")]
    NoSegments,

    /// ISA, GS or ST is absent
    #[error("Missing required envelope segment {segment}")]
    MissingEnvelopeSegment { segment: &'static str },

    /// ST01 (or a transaction type tag) names a transaction this codec does not model
    #[error("Unsupported transaction type: {code}")]
    UnsupportedTransactionType { code: String },

    /// Strict mode: ISA does not carry exactly 16 elements
    #[error("ISA segment must have 16 elements, found {found}")]
    InvalidIsa { found: usize },

    /// Strict mode: SE01 disagrees with the segments actually present
    #[error("SE segment count ({declared}) does not match actual count ({actual})")]
    SegmentCountMismatch { declared: String, actual: usize },

    /// Element separator, component separator, repetition separator and
    /// segment terminator must be distinct
    #[error("Delimiters must be distinct characters")]
    InvalidDelimiters,
}

impl X12Error {
    /// Segment identifier the error points at, where one is known
    pub fn segment(&self) -> Option<&'static str> {
        match self {
            Self::MissingEnvelopeSegment { segment } => Some(segment),
            Self::UnsupportedTransactionType { .. } => Some("ST"),
            Self::InvalidIsa { .. } => Some("ISA"),
            Self::SegmentCountMismatch { .. } => Some("SE"),
            Self::NoSegments | Self::InvalidDelimiters => None,
        }
    }
}
