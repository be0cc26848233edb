//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that end up in request URLs. Workspace and
//! report ids are interpolated into path segments, so anything that would change the
//! shape of the URL is rejected up front.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const RESERVED_CHARS: [char; 4] = ['/', '?', '#', '%'];

fn validate_path_segment(kind: &str, id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err(format!("{kind} cannot be empty"));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(format!("{kind} '{id}' must not contain whitespace"));
    }
    if let Some(c) = id.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(format!("{kind} '{id}' contains reserved character '{c}'"));
    }
    Ok(())
}

/// Power BI workspace (group) identifier
///
/// # Examples
///
/// ```
/// use pbi_export::domain::ids::WorkspaceId;
/// use std::str::FromStr;
///
/// let id = WorkspaceId::from_str("f089354e-8366-4e18-aea3-4cb4a3a50b48").unwrap();
/// assert_eq!(id.as_str(), "f089354e-8366-4e18-aea3-4cb4a3a50b48");
/// assert!(WorkspaceId::from_str("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    /// Creates a new WorkspaceId, validating it is usable as a URL path segment
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        validate_path_segment("Workspace ID", &id)?;
        Ok(Self(id))
    }

    /// Returns the workspace ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkspaceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for WorkspaceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Power BI report identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(String);

impl ReportId {
    /// Creates a new ReportId, validating it is usable as a URL path segment
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        validate_path_segment("Report ID", &id)?;
        Ok(Self(id))
    }

    /// Returns the report ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ReportId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Service-assigned export job identifier
///
/// Export ids are long opaque base64-ish tokens, so only emptiness is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExportId(String);

impl ExportId {
    /// Creates a new ExportId
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Export ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the export ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the id, safe to embed in a file name
    pub fn short(&self, len: usize) -> String {
        self.0
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(len)
            .collect()
    }
}

impl fmt::Display for ExportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_id_valid() {
        let id = WorkspaceId::new("W1").unwrap();
        assert_eq!(id.as_str(), "W1");
        assert_eq!(id.to_string(), "W1");
    }

    #[test]
    fn test_workspace_id_empty() {
        assert!(WorkspaceId::new("").is_err());
        assert!(WorkspaceId::new("   ").is_err());
    }

    #[test]
    fn test_report_id_rejects_reserved_characters() {
        for bad in ["a/b", "a?b", "a#b", "a%2F", "a b"] {
            assert!(ReportId::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_report_id_accepts_guid() {
        let id = ReportId::from_str("2ad3f1f5-0b46-4d1a-a5f9-d8e4c4e8b1a7").unwrap();
        assert_eq!(id.as_ref(), "2ad3f1f5-0b46-4d1a-a5f9-d8e4c4e8b1a7");
    }

    #[test]
    fn test_export_id_short() {
        let id = ExportId::new("Mi9C7zYxMjM0NTY3ODkwYWJjZGVm/ZWY=").unwrap();
        assert_eq!(id.short(8), "Mi9C7zYx");
        // '/' and '=' are dropped so the result is a valid file name fragment
        assert!(!id.short(64).contains('/'));
    }

    #[test]
    fn test_export_id_empty() {
        assert!(ExportId::new("").is_err());
    }
}
