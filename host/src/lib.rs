//! X12 Host Library
//!
//! The pieces of the `x12` binary that are worth testing on their own:
//! bounded document reads, logging setup and report rendering.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use x12_validation::ValidationResult;

/// Default upper bound on a document read from disk (16 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

/// Number of issues printed per section of a text report
pub const MAX_DISPLAYED_ISSUES: usize = 20;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("document exceeds the maximum size of {}", format_bytes(*.limit))]
    TooLarge { limit: u64 },

    #[error("document is not valid UTF-8")]
    NotUtf8,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Host configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    /// Documents larger than this are rejected before parsing
    pub max_bytes: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Read a whole document, refusing anything over `limit` bytes
///
/// At most `limit + 1` bytes are pulled from the reader, so an oversized
/// input is detected without buffering all of it.
pub fn read_bounded<R: Read>(reader: R, limit: u64) -> Result<String, HostError> {
    let mut bytes = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(HostError::TooLarge { limit });
    }
    String::from_utf8(bytes).map_err(|_| HostError::NotUtf8)
}

/// Read a document from disk within the configured size bound
pub fn read_document<P: AsRef<Path>>(path: P, config: &HostConfig) -> Result<String, HostError> {
    let file = File::open(path.as_ref())?;
    let size = file.metadata()?.len();
    if size > config.max_bytes {
        return Err(HostError::TooLarge {
            limit: config.max_bytes,
        });
    }
    let text = read_bounded(BufReader::new(file), config.max_bytes)?;
    tracing::debug!(path = %path.as_ref().display(), bytes = text.len(), "read document");
    Ok(text)
}

/// Install a stderr subscriber
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug over warn.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Render a validation report for a terminal
pub fn render_report(result: &ValidationResult) -> String {
    let mut out = String::new();
    if result.valid {
        out.push_str("Document is valid\n");
    } else {
        out.push_str("Document is invalid\n");
    }
    out.push_str(&format!(
        "  Errors:   {}\n  Warnings: {}\n",
        result.errors.len(),
        result.warnings.len()
    ));

    for (title, issues) in [("Errors", &result.errors), ("Warnings", &result.warnings)] {
        if issues.is_empty() {
            continue;
        }
        out.push_str(&format!("\n=== {title} ({}) ===\n", issues.len()));
        for (i, issue) in issues.iter().take(MAX_DISPLAYED_ISSUES).enumerate() {
            out.push_str(&format!("{}. {issue}\n", i + 1));
        }
        if issues.len() > MAX_DISPLAYED_ISSUES {
            out.push_str(&format!(
                "... and {} more\n",
                issues.len() - MAX_DISPLAYED_ISSUES
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_read_bounded() {
        assert_eq!(read_bounded("ST*270~".as_bytes(), 7).unwrap(), "ST*270~");
        assert!(matches!(
            read_bounded("ST*270~".as_bytes(), 6),
            Err(HostError::TooLarge { limit: 6 })
        ));
        assert!(matches!(
            read_bounded(&[0xff, 0xfe][..], 10),
            Err(HostError::NotUtf8)
        ));
    }

    #[test]
    fn test_read_document_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ISA*00~GS*HS~").unwrap();

        let roomy = HostConfig::default();
        assert_eq!(read_document(file.path(), &roomy).unwrap(), "ISA*00~GS*HS~");

        let tight = HostConfig { max_bytes: 4 };
        let err = read_document(file.path(), &tight).unwrap_err();
        assert_eq!(err.to_string(), "document exceeds the maximum size of 4 B");
    }

    #[test]
    fn test_read_document_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_document(dir.path().join("absent.x12"), &HostConfig::default()).unwrap_err();
        assert!(matches!(err, HostError::Io(_)));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(DEFAULT_MAX_BYTES), "16.00 MB");
    }

    #[test]
    fn test_render_report() {
        let result = x12_validation::validate("ST*834*0001~SE*2*0001~");
        let report = render_report(&result);
        assert!(report.starts_with("Document is invalid\n"));
        assert!(report.contains("=== Errors (4) ===\n1. [Error] MISSING_ISA: Missing ISA segment\n"));
        assert!(report.contains("UNSUPPORTED_TRANSACTION at ST01"));
    }
}
