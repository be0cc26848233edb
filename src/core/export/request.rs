//! Export request construction
//!
//! Turns the run configuration into a validated [`ExportRequest`]. No network access
//! happens here; every problem surfaces as `InvalidConfiguration` before the first
//! export call.

use crate::config::ExportConfig;
use crate::domain::{
    ExportRequest, ExportRequestParameters, ExporterError, ReportId, Result, WorkspaceId,
};
use std::path::{Path, PathBuf};

/// Load request parameters from a JSON file
///
/// # Errors
///
/// Returns `InvalidConfiguration` if the file cannot be read, does not match the
/// parameters schema (unknown fields included) or fails validation.
///
/// # Example
///
/// ```no_run
/// use pbi_export::core::export::request::load_parameters;
///
/// let params = load_parameters("export_request.json").expect("invalid parameters");
/// println!("format: {}", params.format);
/// ```
pub fn load_parameters(path: impl AsRef<Path>) -> Result<ExportRequestParameters> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ExporterError::InvalidConfiguration(format!(
            "Failed to read export parameters {}: {e}",
            path.display()
        ))
    })?;

    let parameters: ExportRequestParameters = serde_json::from_str(&contents).map_err(|e| {
        ExporterError::InvalidConfiguration(format!(
            "Invalid export parameters in {}: {e}",
            path.display()
        ))
    })?;

    parameters.validate().map_err(|e| {
        ExporterError::InvalidConfiguration(format!(
            "Invalid export parameters in {}: {e}",
            path.display()
        ))
    })?;

    Ok(parameters)
}

/// Builder for [`ExportRequest`]
///
/// ```
/// use pbi_export::core::export::RequestBuilder;
/// use pbi_export::domain::FileFormat;
///
/// let request = RequestBuilder::new()
///     .workspace_id("W1")
///     .report_id("R1")
///     .build()
///     .unwrap();
/// assert_eq!(request.format(), FileFormat::Pdf);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    workspace_id: Option<String>,
    report_id: Option<String>,
    parameters_file: Option<PathBuf>,
    parameters: Option<ExportRequestParameters>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            workspace_id: config.workspace_id.clone(),
            report_id: config.report_id.clone(),
            parameters_file: config.parameters_file.as_ref().map(PathBuf::from),
            parameters: None,
        }
    }

    pub fn workspace_id(mut self, id: impl Into<String>) -> Self {
        self.workspace_id = Some(id.into());
        self
    }

    pub fn report_id(mut self, id: impl Into<String>) -> Self {
        self.report_id = Some(id.into());
        self
    }

    pub fn parameters_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.parameters_file = Some(path.into());
        self
    }

    /// Explicit parameters; take precedence over a parameters file
    pub fn parameters(mut self, parameters: ExportRequestParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Validate inputs and produce the request
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for a missing or malformed id or unusable parameters.
    pub fn build(self) -> Result<ExportRequest> {
        let workspace_id = self
            .workspace_id
            .ok_or_else(|| {
                ExporterError::InvalidConfiguration("workspace_id is required".to_string())
            })
            .and_then(|id| WorkspaceId::new(id).map_err(ExporterError::InvalidConfiguration))?;

        let report_id = self
            .report_id
            .ok_or_else(|| ExporterError::InvalidConfiguration("report_id is required".to_string()))
            .and_then(|id| ReportId::new(id).map_err(ExporterError::InvalidConfiguration))?;

        let parameters = match (self.parameters, self.parameters_file) {
            (Some(parameters), _) => {
                parameters
                    .validate()
                    .map_err(ExporterError::InvalidConfiguration)?;
                parameters
            }
            (None, Some(path)) => load_parameters(&path)?,
            (None, None) => ExportRequestParameters::pdf(),
        };

        Ok(ExportRequest {
            workspace_id,
            report_id,
            parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    fn params_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults_to_pdf() {
        let request = RequestBuilder::new()
            .workspace_id("W1")
            .report_id("R1")
            .build()
            .unwrap();
        assert_eq!(request.workspace_id.as_str(), "W1");
        assert_eq!(request.parameters, ExportRequestParameters::pdf());
    }

    #[test_case(None, Some("R1") ; "missing workspace")]
    #[test_case(Some("W1"), None ; "missing report")]
    #[test_case(Some(""), Some("R1") ; "empty workspace")]
    #[test_case(Some("W1"), Some("  ") ; "blank report")]
    #[test_case(Some("W 1"), Some("R1") ; "whitespace inside id")]
    #[test_case(Some("W1"), Some("R1/../x") ; "slash")]
    #[test_case(Some("W1?x=1"), Some("R1") ; "query")]
    #[test_case(Some("W1"), Some("R1#frag") ; "fragment")]
    #[test_case(Some("W%31"), Some("R1") ; "percent")]
    fn test_rejects_bad_ids(workspace: Option<&str>, report: Option<&str>) {
        let mut builder = RequestBuilder::new();
        if let Some(ws) = workspace {
            builder = builder.workspace_id(ws);
        }
        if let Some(rid) = report {
            builder = builder.report_id(rid);
        }
        assert!(matches!(
            builder.build(),
            Err(ExporterError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_parameters_file_is_loaded() {
        let file = params_file(r#"{"format": "PPTX", "powerBIReportConfiguration": {"pages": [{"pageName": "ReportSection2"}]}}"#);
        let request = RequestBuilder::new()
            .workspace_id("W1")
            .report_id("R1")
            .parameters_file(file.path())
            .build()
            .unwrap();
        assert_eq!(request.format(), FileFormat::Pptx);
    }

    #[test]
    fn test_unknown_parameter_field_rejected() {
        let file = params_file(r#"{"format": "PDF", "pagez": []}"#);
        let err = load_parameters(file.path()).unwrap_err();
        assert!(matches!(err, ExporterError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let file = params_file("{format: PDF");
        assert!(load_parameters(file.path()).is_err());
    }

    #[test]
    fn test_missing_parameters_file() {
        let err = load_parameters("does-not-exist.json").unwrap_err();
        assert!(err.to_string().contains("does-not-exist.json"));
    }

    #[test]
    fn test_from_config() {
        let config = ExportConfig {
            workspace_id: Some("W1".to_string()),
            report_id: Some("R1".to_string()),
            ..Default::default()
        };
        let request = RequestBuilder::from_config(&config).build().unwrap();
        assert_eq!(request.report_id.as_str(), "R1");
    }
}
