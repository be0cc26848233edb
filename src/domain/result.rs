//! Result type alias for run-level operations

use super::errors::ExporterError;

/// Result type alias using [`ExporterError`]
///
/// # Examples
///
/// ```
/// use pbi_export::domain::result::Result;
/// use pbi_export::domain::errors::ExporterError;
///
/// fn failing_function() -> Result<()> {
///     Err(ExporterError::InvalidConfiguration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExporterError>;
