use serde::{Deserialize, Serialize};

use crate::isa;

/// X12 delimiters extracted from the ISA segment
///
/// Every segment of a document uses the same set; it is resolved once and
/// never changes for the rest of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delimiters {
    /// Element separator (position 3 in ISA, typically '*')
    pub element: char,

    /// Component (sub-element) separator (position 104 in ISA, typically ':')
    pub component: char,

    /// Repetition separator (position 82 in ISA, typically '^')
    pub repetition: char,

    /// Segment terminator (position 105 in ISA, typically '~')
    pub segment: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            element: '*',
            component: ':',
            repetition: '^',
            segment: '~',
        }
    }
}

impl Delimiters {
    /// Read the delimiters from the fixed offsets of a leading ISA segment.
    ///
    /// Falls back to `fallback` when the text does not start with `ISA` or is
    /// shorter than a full ISA segment. When the ISA is not fixed width (a
    /// missing element shifts every offset) only the element separator is
    /// trusted. No error is raised: hand-authored fragments without an
    /// interchange header are accepted as-is.
    pub fn resolve(text: &str, fallback: Delimiters) -> Delimiters {
        if !text.starts_with("ISA") {
            tracing::trace!("no ISA prefix, using fallback delimiters");
            return fallback;
        }

        let head: Vec<char> = text.chars().take(isa::ISA_LENGTH).collect();
        if head.len() < isa::ISA_LENGTH {
            tracing::trace!(length = head.len(), "ISA segment too short, using fallback delimiters");
            return fallback;
        }

        let element = head[isa::ELEMENT_SEPARATOR_OFFSET];
        let component = head[isa::COMPONENT_SEPARATOR_OFFSET];
        let segment = head[isa::SEGMENT_TERMINATOR_OFFSET];
        if [component, segment]
            .iter()
            .any(|&c| c.is_ascii_alphanumeric() || c == element)
        {
            // fields are not fixed width; the offsets point into data
            tracing::debug!(%component, %segment, "ISA is not fixed width, keeping fallback terminators");
            return Delimiters { element, ..fallback };
        }

        Delimiters {
            element,
            component,
            repetition: head[isa::REPETITION_SEPARATOR_OFFSET],
            segment,
        }
    }

    /// Element separator, component separator and segment terminator must all differ
    pub fn are_distinct(&self) -> bool {
        self.element != self.component
            && self.element != self.segment
            && self.component != self.segment
            && self.repetition != self.element
            && self.repetition != self.segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISA: &str = "ISA*00*          *00*          *ZZ*SENDER         *ZZ*RECEIVER       *210101*1200*^*00501*000000001*0*P*:~";

    #[test]
    fn test_resolve_default_isa() {
        assert_eq!(Delimiters::resolve(ISA, Delimiters::default()), Delimiters::default());
    }

    #[test]
    fn test_resolve_custom_isa() {
        let custom = ISA
            .replace('*', "|")
            .replace('^', "{")
            .replace(':', "^")
            .replace('~', "\\");

        let delimiters = Delimiters::resolve(&custom, Delimiters::default());
        assert_eq!(delimiters.element, '|');
        assert_eq!(delimiters.component, '^');
        assert_eq!(delimiters.repetition, '{');
        assert_eq!(delimiters.segment, '\\');
    }

    #[test]
    fn test_fallback_without_isa() {
        let fallback = Delimiters {
            element: '+',
            ..Default::default()
        };
        assert_eq!(Delimiters::resolve("ST+837+0001~", fallback), fallback);
    }

    #[test]
    fn test_fallback_on_short_isa() {
        let fallback = Delimiters::default();
        assert_eq!(Delimiters::resolve("ISA|00|", fallback), fallback);
    }

    #[test]
    fn test_short_isa_keeps_element_separator() {
        let short = "ISA|00|          |00|          |ZZ|SENDER         |ZZ|RECEIVER       |210101|1200|^|00501|000000001|0|P~GS|HS|A|B~";
        let delimiters = Delimiters::resolve(short, Delimiters::default());
        assert_eq!(delimiters.element, '|');
        assert_eq!(delimiters.segment, '~');
        assert_eq!(delimiters.component, ':');
    }

    #[test]
    fn test_distinct() {
        assert!(Delimiters::default().are_distinct());
        let clash = Delimiters {
            component: '*',
            ..Default::default()
        };
        assert!(!clash.are_distinct());
    }
}
