use crate::{Delimiters, Segment};

/// Accumulates segments in emission order and renders them with one delimiter set
#[derive(Debug, Clone)]
pub struct SegmentWriter {
    delimiters: Delimiters,
    segments: Vec<Segment>,
}

impl SegmentWriter {
    pub fn new(delimiters: Delimiters) -> Self {
        Self {
            delimiters,
            segments: Vec::new(),
        }
    }

    #[inline]
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Append a segment built from its ID and elements
    pub fn push<I>(&mut self, id: &str, elements: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.segments.push(Segment::new(id, elements));
    }

    /// Join parts with the component separator (`HC:99213:25`)
    pub fn composite<I>(&self, parts: I) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let separator = self.delimiters.component.to_string();
        parts
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(&separator)
    }

    /// Number of segments written so far
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Render one segment; trailing empty elements are dropped
    pub fn render_segment(&self, segment: &Segment) -> String {
        let used = segment
            .elements
            .iter()
            .rposition(|e| !e.is_empty())
            .map_or(0, |i| i + 1);

        let mut out = segment.id.clone();
        for element in &segment.elements[..used] {
            out.push(self.delimiters.element);
            out.push_str(element);
        }
        out.push(self.delimiters.segment);
        out
    }

    /// Render every segment, optionally putting each on its own line
    pub fn finish(self, line_breaks: bool) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(&self.render_segment(segment));
            if line_breaks {
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_trims_trailing_empty_elements() {
        let mut writer = SegmentWriter::new(Delimiters::default());
        writer.push("N3", ["12 MAIN ST", ""]);
        writer.push("HL", ["1", "", "20", "1"]);
        assert_eq!(writer.finish(false), "N3*12 MAIN ST~HL*1**20*1~");
    }

    #[test]
    fn test_line_breaks() {
        let mut writer = SegmentWriter::new(Delimiters::default());
        writer.push("LX", ["1"]);
        writer.push("LX", ["2"]);
        assert_eq!(writer.len(), 2);
        assert_eq!(writer.finish(true), "LX*1~\nLX*2~\n");
    }

    #[test]
    fn test_composite_uses_component_separator() {
        let writer = SegmentWriter::new(Delimiters {
            component: '>',
            ..Default::default()
        });
        assert_eq!(writer.composite(["HC", "99213", "25"]), "HC>99213>25");
    }
}
