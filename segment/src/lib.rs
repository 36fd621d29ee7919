//! X12 Segment Layer
//!
//! The atomic pieces of an X12 interchange: segments, the document-global
//! delimiter set, the segmenter that turns raw text into segments, the typed
//! queries builders use to locate segments, and the writer that renders them
//! back to text.
//!
//! # Usage
//! ```ignore
//! let document = Document::parse(raw, Delimiters::default());
//! let payer = find(&document.segments, "NM1", 1, "PR");
//! ```

mod delimiters;
pub mod isa;
mod query;
mod segmenter;
mod writer;

use serde::{Deserialize, Serialize};

pub use delimiters::Delimiters;
pub use query::{anchored, find, find_all, first, position};
pub use segmenter::{normalize, split_segments, Document};
pub use writer::SegmentWriter;

/// Envelope segment identifiers, in interchange order
pub const ENVELOPE_IDS: [&str; 6] = ["ISA", "GS", "ST", "SE", "GE", "IEA"];

/// One X12 segment: an identifier plus its ordered data elements.
///
/// Elements are stored 0-indexed (`elements[0]` is NM101) but read through
/// [`Segment::element`] with X12 reference numbering, where element 0 is the
/// segment ID itself. Absent trailing elements read as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Segment identifier (e.g., "ISA", "GS", "ST", "NM1")
    pub id: String,
    /// Data elements, not including the segment ID
    pub elements: Vec<String>,
}

impl Segment {
    pub fn new<I>(id: &str, elements: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            id: id.to_string(),
            elements: elements
                .into_iter()
                .map(|e| e.as_ref().to_string())
                .collect(),
        }
    }

    /// Whether this segment carries the given identifier
    #[inline]
    pub fn is(&self, id: &str) -> bool {
        self.id == id
    }

    /// Whether this segment is one of the interchange/group/transaction envelope segments
    pub fn is_envelope(&self) -> bool {
        ENVELOPE_IDS.contains(&self.id.as_str())
    }

    /// Get element by X12 element number
    ///
    /// - `element(0)` returns the segment ID (e.g., NM1-00)
    /// - `element(1)` returns the first data element (e.g., NM1-01)
    ///
    /// Missing elements read as `""`, never as an error.
    #[inline]
    pub fn element(&self, element_number: usize) -> &str {
        match element_number {
            0 => &self.id,
            n => self.elements.get(n - 1).map(String::as_str).unwrap_or(""),
        }
    }

    /// Like [`Segment::element`], but `None` when the element is absent or empty
    #[inline]
    pub fn optional(&self, element_number: usize) -> Option<&str> {
        Some(self.element(element_number)).filter(|e| !e.is_empty())
    }

    /// Split a composite element on the component separator
    ///
    /// An empty or missing element yields a single empty component.
    pub fn components(&self, element_number: usize, separator: char) -> Vec<&str> {
        self.element(element_number).split(separator).collect()
    }

    /// Get one component of a composite element, 1-based (`CLM05-1`)
    pub fn component(&self, element_number: usize, component: usize, separator: char) -> &str {
        if component == 0 {
            return "";
        }
        self.element(element_number)
            .split(separator)
            .nth(component - 1)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_numbering() {
        let segment = Segment::new("NM1", ["PR", "2", "ACME HEALTH"]);
        assert_eq!(segment.element(0), "NM1");
        assert_eq!(segment.element(1), "PR");
        assert_eq!(segment.element(3), "ACME HEALTH");
        assert_eq!(segment.element(9), "");
    }

    #[test]
    fn test_optional_element() {
        let segment = Segment::new("N3", ["12 MAIN ST", ""]);
        assert_eq!(segment.optional(1), Some("12 MAIN ST"));
        assert_eq!(segment.optional(2), None);
        assert_eq!(segment.optional(3), None);
    }

    #[test]
    fn test_component_split() {
        let segment = Segment::new("CLM", ["A1", "100", "", "", "11:B:1"]);
        assert_eq!(segment.components(5, ':'), vec!["11", "B", "1"]);
        assert_eq!(segment.component(5, 1, ':'), "11");
        assert_eq!(segment.component(5, 3, ':'), "1");
        assert_eq!(segment.component(5, 4, ':'), "");
        assert_eq!(segment.components(3, ':'), vec![""]);
    }

    #[test]
    fn test_envelope_detection() {
        assert!(Segment::new("SE", ["4", "0001"]).is_envelope());
        assert!(!Segment::new("BHT", ["0019"]).is_envelope());
    }
}
