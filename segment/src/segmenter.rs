use crate::{Delimiters, Segment};

/// Strip transport noise from a raw document
///
/// Removes a leading byte-order mark and every line break. X12 uses the
/// segment terminator as its only structural separator, so CR and LF are
/// never segment boundaries.
pub fn normalize(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .chars()
        .filter(|&c| c != '\r' && c != '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Split normalized text into segments
///
/// Each non-empty fragment between segment terminators becomes one segment;
/// its first element-separated token is the segment ID.
pub fn split_segments(normalized: &str, delimiters: &Delimiters) -> Vec<Segment> {
    normalized
        .split(delimiters.segment)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| {
            let mut tokens = fragment.split(delimiters.element);
            let id = tokens.next().unwrap_or_default().to_string();
            Segment {
                id,
                elements: tokens.map(str::to_string).collect(),
            }
        })
        .collect()
}

/// A raw document resolved into its delimiters and flat segment sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub delimiters: Delimiters,
    pub segments: Vec<Segment>,
}

impl Document {
    /// Normalize, resolve delimiters from the ISA header, and segment
    ///
    /// `fallback` supplies the delimiters for documents without a full ISA.
    pub fn parse(text: &str, fallback: Delimiters) -> Self {
        let normalized = normalize(text);
        let delimiters = Delimiters::resolve(&normalized, fallback);
        let segments = split_segments(&normalized, &delimiters);

        tracing::debug!(
            segments = segments.len(),
            element = %delimiters.element,
            component = %delimiters.component,
            terminator = %delimiters.segment,
            "segmented document"
        );

        Self {
            delimiters,
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_line_breaks() {
        assert_eq!(normalize("\u{feff}ST*837~\r\nSE*2~\n"), "ST*837~SE*2~");
        assert_eq!(normalize("  NM1*PR\r*2~  "), "NM1*PR*2~");
    }

    #[test]
    fn test_split_discards_empty_fragments() {
        let segments = split_segments("ST*837*0001~~SE*2*0001~", &Delimiters::default());
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, "ST");
        assert_eq!(segments[0].elements, vec!["837", "0001"]);
        assert_eq!(segments[1].id, "SE");
    }

    #[test]
    fn test_split_keeps_empty_elements() {
        let segments = split_segments("NM1*IL*1**LAST*FIRST**MI~", &Delimiters::default());
        assert_eq!(
            segments[0].elements,
            vec!["IL", "1", "", "LAST", "FIRST", "", "MI"]
        );
    }

    #[test]
    fn test_segment_without_elements() {
        let segments = split_segments("LS~", &Delimiters::default());
        assert_eq!(segments[0].id, "LS");
        assert!(segments[0].elements.is_empty());
    }
}
