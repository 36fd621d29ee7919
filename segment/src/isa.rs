//! Fixed-width layout of the ISA (Interchange Control Header) segment.
//!
//! ISA is the only X12 segment whose elements have fixed widths, which is
//! what lets a reader find the delimiters at fixed character offsets before
//! knowing what they are.

/// Full ISA length including the segment terminator
pub const ISA_LENGTH: usize = 106;

pub const ELEMENT_SEPARATOR_OFFSET: usize = 3;
pub const REPETITION_SEPARATOR_OFFSET: usize = 82;
pub const COMPONENT_SEPARATOR_OFFSET: usize = 104;
pub const SEGMENT_TERMINATOR_OFFSET: usize = 105;

/// Number of data elements in an ISA segment
pub const ISA_ELEMENT_COUNT: usize = 16;

/// Widths of ISA01 through ISA16
pub const FIELD_WIDTHS: [usize; ISA_ELEMENT_COUNT] = [
    2,  // ISA01: Authorization Information Qualifier
    10, // ISA02: Authorization Information
    2,  // ISA03: Security Information Qualifier
    10, // ISA04: Security Information
    2,  // ISA05: Interchange ID Qualifier (sender)
    15, // ISA06: Interchange Sender ID
    2,  // ISA07: Interchange ID Qualifier (receiver)
    15, // ISA08: Interchange Receiver ID
    6,  // ISA09: Interchange Date (YYMMDD)
    4,  // ISA10: Interchange Time (HHMM)
    1,  // ISA11: Repetition Separator
    5,  // ISA12: Interchange Control Version Number
    9,  // ISA13: Interchange Control Number
    1,  // ISA14: Acknowledgment Requested
    1,  // ISA15: Usage Indicator
    1,  // ISA16: Component Element Separator
];

/// Index (0-based) of ISA13 within [`FIELD_WIDTHS`]
pub const CONTROL_NUMBER_FIELD: usize = 12;

/// Space-pad on the right, truncating anything past `width`
pub fn pad_right(value: &str, width: usize) -> String {
    let mut padded: String = value.chars().take(width).collect();
    let len = padded.chars().count();
    padded.push_str(&" ".repeat(width - len));
    padded
}

/// Zero-pad on the left, keeping only the last `width` characters
pub fn pad_left(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.chars().skip(len - width).collect();
    }
    let mut padded = "0".repeat(width - len);
    padded.push_str(value);
    padded
}

/// Fit one ISA element to its fixed width
///
/// The control number is zero-padded on the left; every other field is
/// space-padded on the right.
pub fn fit_field(index: usize, value: &str) -> String {
    let width = FIELD_WIDTHS[index];
    if index == CONTROL_NUMBER_FIELD {
        pad_left(value, width)
    } else {
        pad_right(value, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_adds_up() {
        // "ISA" + 16 separators + fields, terminator at offset 105
        let body: usize = FIELD_WIDTHS.iter().sum::<usize>() + 3 + ISA_ELEMENT_COUNT;
        assert_eq!(body, SEGMENT_TERMINATOR_OFFSET);
        assert_eq!(body + 1, ISA_LENGTH);
    }

    #[test]
    fn test_pad_right() {
        assert_eq!(pad_right("SENDER", 15), "SENDER         ");
        assert_eq!(pad_right("A-VERY-LONG-SENDER-ID", 15), "A-VERY-LONG-SEN");
    }

    #[test]
    fn test_pad_left() {
        assert_eq!(pad_left("1", 9), "000000001");
        assert_eq!(pad_left("000001", 4), "0001");
        assert_eq!(pad_left("1234567890", 9), "234567890");
    }

    #[test]
    fn test_fit_field() {
        assert_eq!(fit_field(12, "42"), "000000042");
        assert_eq!(fit_field(1, ""), "          ");
        assert_eq!(fit_field(0, "00"), "00");
    }
}
