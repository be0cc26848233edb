//! Export request parameters
//!
//! Strongly-typed body of the `ExportTo` request. Parameters are validated once when
//! built or loaded; unknown fields are rejected so a typo in a parameters file fails
//! fast instead of being silently ignored by the service.

use super::ids::{ReportId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    #[default]
    Pdf,
    Png,
    Pptx,
    Xlsx,
    Docx,
    Csv,
    Xml,
    Mhtml,
    Image,
    #[serde(rename = "ACCESSIBLEPDF")]
    AccessiblePdf,
}

impl FileFormat {
    /// File extension used when storing the artifact
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Pdf | FileFormat::AccessiblePdf => "pdf",
            FileFormat::Png => "png",
            FileFormat::Pptx => "pptx",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Docx => "docx",
            FileFormat::Csv => "csv",
            FileFormat::Xml => "xml",
            FileFormat::Mhtml => "mhtml",
            // IMAGE renders paginated reports; the service picks the encoding
            FileFormat::Image => "img",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Export request body
///
/// # Example
///
/// ```
/// use pbi_export::domain::parameters::{ExportRequestParameters, FileFormat};
///
/// let params: ExportRequestParameters = serde_json::from_str(
///     r#"{"format": "PPTX", "powerBIReportConfiguration": {"pages": [{"pageName": "ReportSection1"}]}}"#,
/// ).unwrap();
/// assert_eq!(params.format, FileFormat::Pptx);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportRequestParameters {
    /// Requested output format
    pub format: FileFormat,

    /// Settings for Power BI (interactive) reports
    #[serde(
        rename = "powerBIReportConfiguration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub power_bi_report_configuration: Option<PowerBiReportConfiguration>,

    /// Settings for paginated reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paginated_report_configuration: Option<PaginatedReportConfiguration>,
}

/// Interactive report rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PowerBiReportConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ExportReportSettings>,

    /// Pages (and optionally a single visual) to export; empty exports all pages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<ExportReportPage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub report_level_filters: Vec<ExportFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bookmark: Option<PageBookmark>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<EffectiveIdentity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportReportSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_hidden_pages: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportReportPage {
    pub page_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<PageBookmark>,
}

/// OData-style filter, e.g. `Table1/CategoryName eq 'Condiments'`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportFilter {
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PageBookmark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Row-level security identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EffectiveIdentity {
    pub username: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaginatedReportConfiguration {
    /// Renderer device-info settings, passed through as string pairs
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub format_settings: std::collections::BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_values: Vec<ParameterValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<EffectiveIdentity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterValue {
    pub name: String,
    pub value: String,
}

impl ExportRequestParameters {
    /// Default parameters: render the current report as PDF
    pub fn pdf() -> Self {
        Self::default()
    }

    /// Checks constraints the type system cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.power_bi_report_configuration.is_some()
            && self.paginated_report_configuration.is_some()
        {
            return Err(
                "powerBIReportConfiguration and paginatedReportConfiguration are mutually exclusive"
                    .to_string(),
            );
        }

        if let Some(config) = &self.power_bi_report_configuration {
            if let Some(page) = config.pages.iter().find(|p| p.page_name.trim().is_empty()) {
                return Err(format!(
                    "page entries require a pageName (visual: {:?})",
                    page.visual_name
                ));
            }
            if config
                .report_level_filters
                .iter()
                .any(|f| f.filter.trim().is_empty())
            {
                return Err("reportLevelFilters entries cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

/// A fully resolved export request shared by every job of a run
///
/// Built once by the request builder; jobs hold it behind an `Arc` so the
/// parameters are serialized from the same value for every submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub workspace_id: WorkspaceId,
    pub report_id: ReportId,
    pub parameters: ExportRequestParameters,
}

impl ExportRequest {
    pub fn format(&self) -> FileFormat {
        self.parameters.format
    }
}
