use x12_segment::Delimiters;

/// Per-call parse configuration
///
/// `delimiters` is only the fallback for documents whose ISA header is too
/// short to carry its own; a well-formed ISA always wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiters: Delimiters,
    /// Reject ISA headers without 16 elements and SE counts that do not add up
    pub strict: bool,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }
}

/// Per-call generate configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub delimiters: Delimiters,
    /// Put a line feed after every segment terminator
    pub line_breaks: bool,
}
