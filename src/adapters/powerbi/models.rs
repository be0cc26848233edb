//! Power BI REST API models
//!
//! Wire shapes of the `ExportTo` and `exports/{id}` responses. These stay separate
//! from the domain so unexpected service fields never leak past the adapter.

use super::service::PollStatus;
use serde::Deserialize;

/// Remote export state as spelled by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RemoteStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Undefined,
}

/// Body of both the submit (202) and status (200/202) responses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub id: String,

    #[serde(default)]
    pub status: Option<RemoteStatus>,

    #[serde(default)]
    pub percent_complete: Option<u8>,

    #[serde(default)]
    pub resource_location: Option<String>,

    #[serde(default)]
    pub report_name: Option<String>,

    #[serde(default)]
    pub error: Option<ServiceErrorBody>,
}

/// Error object embedded in a failed export or an error response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    pub fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "no error details".to_string(),
        }
    }
}

/// Top-level error envelope: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ServiceErrorBody,
}

/// Best-effort description of an error response body
pub fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.describe(),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.chars().take(512).collect(),
    }
}

impl ExportResponse {
    /// Map the wire status to a poll status
    ///
    /// `Undefined` and a missing status are treated as still running; a poll
    /// timeout bounds how long that can last.
    pub fn poll_status(&self) -> PollStatus {
        match self.status {
            Some(RemoteStatus::Succeeded) => PollStatus::Succeeded {
                resource_location: self
                    .resource_location
                    .clone()
                    .filter(|location| !location.trim().is_empty()),
            },
            Some(RemoteStatus::Failed) => PollStatus::Failed {
                reason: self
                    .error
                    .as_ref()
                    .map(ServiceErrorBody::describe)
                    .unwrap_or_else(|| "export failed without error details".to_string()),
            },
            Some(RemoteStatus::NotStarted)
            | Some(RemoteStatus::Running)
            | Some(RemoteStatus::Undefined)
            | None => PollStatus::Running {
                percent_complete: self.percent_complete,
            },
        }
    }
}
