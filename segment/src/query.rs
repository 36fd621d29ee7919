use crate::Segment;

/// Find the first segment with identifier `id` whose element `element`
/// (X12 numbering, 1 = first data element) equals `value`
///
/// `find(segments, "NM1", 1, "PR")` locates the payer name segment.
pub fn find<'a>(
    segments: &'a [Segment],
    id: &str,
    element: usize,
    value: &str,
) -> Option<&'a Segment> {
    segments
        .iter()
        .find(|s| s.is(id) && s.element(element) == value)
}

/// Index of the first segment matched by [`find`]
pub fn position(segments: &[Segment], id: &str, element: usize, value: &str) -> Option<usize> {
    segments
        .iter()
        .position(|s| s.is(id) && s.element(element) == value)
}

/// First segment with identifier `id`
pub fn first<'a>(segments: &'a [Segment], id: &str) -> Option<&'a Segment> {
    segments.iter().find(|s| s.is(id))
}

/// Every segment with identifier `id`, in document order
pub fn find_all<'a>(segments: &'a [Segment], id: &'a str) -> impl Iterator<Item = &'a Segment> {
    segments.iter().filter(move |s| s.is(id))
}

/// Slice the sequence at every `anchor` segment
///
/// Each slice begins with one anchor and runs up to, but excluding, the next
/// anchor or the end of the sequence. Segments before the first anchor are
/// not part of any slice.
pub fn anchored<'a>(segments: &'a [Segment], anchor: &str) -> Vec<&'a [Segment]> {
    let starts: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is(anchor))
        .map(|(i, _)| i)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(segments.len());
            &segments[start..end]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Segment> {
        vec![
            Segment::new("CLM", ["A1", "100"]),
            Segment::new("LX", ["1"]),
            Segment::new("SV1", ["HC:99213", "60"]),
            Segment::new("DTP", ["472", "D8", "20240101"]),
            Segment::new("LX", ["2"]),
            Segment::new("SV1", ["HC:85025", "40"]),
            Segment::new("SE", ["7", "0001"]),
        ]
    }

    #[test]
    fn test_find_by_tagged_element() {
        let segments = vec![
            Segment::new("NM1", ["85", "2", "CLINIC"]),
            Segment::new("NM1", ["PR", "2", "PAYER"]),
        ];
        let payer = find(&segments, "NM1", 1, "PR").unwrap();
        assert_eq!(payer.element(3), "PAYER");
        assert!(find(&segments, "NM1", 1, "IL").is_none());
        assert_eq!(position(&segments, "NM1", 1, "PR"), Some(1));
    }

    #[test]
    fn test_anchored_slices() {
        let segments = sample();
        let lines = anchored(&segments, "LX");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 3);
        assert_eq!(lines[0][0].element(1), "1");
        assert_eq!(lines[1].len(), 3, "last slice runs to the end");
        assert_eq!(lines[1][2].id, "SE");
    }

    #[test]
    fn test_anchored_without_anchor() {
        assert!(anchored(&sample(), "CLP").is_empty());
    }

    #[test]
    fn test_find_all() {
        let segments = sample();
        assert_eq!(find_all(&segments, "SV1").count(), 2);
        assert_eq!(first(&segments, "LX").map(|s| s.element(1)), Some("1"));
    }
}
