//! Power BI REST client
//!
//! Implements [`ExportService`] over `reqwest`. Every response's `RequestId` header is
//! logged so failures can be correlated with service-side traces.
//!
//! API calls carry a whole-request timeout. Artifact bodies have no overall deadline;
//! each chunk must arrive within the same timeout instead, so a slow but live transfer
//! is never cut off.

use super::models::{describe_error_body, ExportResponse};
use super::service::{ArtifactStream, ExportService, StatusReport, SubmitReceipt};
use crate::adapters::credentials::AccessToken;
use crate::config::ServiceConfig;
use crate::domain::{ExportId, ExportRequest, ExporterError, Result, ServiceError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const REQUEST_ID_HEADER: &str = "RequestId";

/// Power BI export API client
///
/// # Example
///
/// ```no_run
/// use pbi_export::adapters::credentials::AccessToken;
/// use pbi_export::adapters::powerbi::PowerBiClient;
/// use pbi_export::config::ServiceConfig;
///
/// # fn example() -> pbi_export::domain::Result<()> {
/// let client = PowerBiClient::new(&ServiceConfig::default(), AccessToken::new("eyJ0..."))?;
/// assert_eq!(client.host(), "https://api.powerbi.com");
/// # Ok(())
/// # }
/// ```
pub struct PowerBiClient {
    host: String,
    client: Client,
    token: AccessToken,
    timeout: Duration,
}

impl PowerBiClient {
    /// Create a client for the configured host
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the HTTP client cannot be built.
    pub fn new(config: &ServiceConfig, token: AccessToken) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(concat!("pbi-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ExporterError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            host: config.host(),
            client,
            token,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn report_url(&self, request: &ExportRequest) -> String {
        format!(
            "{}/v1.0/myorg/groups/{}/reports/{}",
            self.host, request.workspace_id, request.report_id
        )
    }

    /// `.../exports/{id}` with the id encoded as a single path segment
    fn status_url(
        &self,
        request: &ExportRequest,
        export_id: &ExportId,
    ) -> std::result::Result<Url, ServiceError> {
        let mut url = Url::parse(&self.report_url(request)).map_err(|e| {
            ServiceError::InvalidResponse(format!("Invalid report URL: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ServiceError::InvalidResponse("Report URL cannot be a base".to_string())
            })?
            .push("exports")
            .push(export_id.as_str());
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
    ) -> std::result::Result<T, ServiceError> {
        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&body).map_err(|e| {
            ServiceError::InvalidResponse(format!("Unexpected response body: {e}"))
        })
    }
}

fn transport_error(error: reqwest::Error) -> ServiceError {
    ServiceError::Transport(error.to_string())
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `Retry-After` in delta-seconds form; HTTP-date values are ignored
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Classify a non-success response, consuming its body for the message
async fn error_from_response(response: Response) -> ServiceError {
    let status = response.status().as_u16();
    let retry_after = retry_after_secs(response.headers());
    let body = response.text().await.unwrap_or_default();

    match ServiceError::from_status(status, describe_error_body(&body)) {
        ServiceError::RateLimited { .. } => ServiceError::RateLimited {
            retry_after_secs: retry_after,
        },
        other => other,
    }
}

#[async_trait]
impl ExportService for PowerBiClient {
    async fn submit_export(
        &self,
        request: &ExportRequest,
    ) -> std::result::Result<SubmitReceipt, ServiceError> {
        let url = format!("{}/ExportTo", self.report_url(request));
        tracing::debug!(url = %url, format = %request.format(), "Submitting export");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header(AUTHORIZATION, self.token.bearer())
            .json(&request.parameters)
            .send()
            .await
            .map_err(transport_error)?;

        let request_id = request_id(response.headers());
        tracing::debug!(
            status = response.status().as_u16(),
            request_id = ?request_id,
            "Submit response received"
        );

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: ExportResponse = Self::read_json(response).await?;
        let export_id = ExportId::new(body.id).map_err(ServiceError::InvalidResponse)?;

        Ok(SubmitReceipt {
            export_id,
            request_id,
        })
    }

    async fn export_status(
        &self,
        request: &ExportRequest,
        export_id: &ExportId,
    ) -> std::result::Result<StatusReport, ServiceError> {
        let url = self.status_url(request, export_id)?;

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(AUTHORIZATION, self.token.bearer())
            .send()
            .await
            .map_err(transport_error)?;

        let request_id = request_id(response.headers());
        let retry_after = retry_after_secs(response.headers()).map(Duration::from_secs);
        tracing::trace!(
            export_id = %export_id,
            status = response.status().as_u16(),
            request_id = ?request_id,
            "Status response received"
        );

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: ExportResponse = Self::read_json(response).await?;
        if body.id != export_id.as_str() {
            tracing::debug!(expected = %export_id, returned = %body.id, "Status id mismatch");
        }

        Ok(StatusReport {
            status: body.poll_status(),
            retry_after,
            request_id,
        })
    }

    async fn open_artifact(
        &self,
        resource_location: &str,
    ) -> std::result::Result<Box<dyn ArtifactStream>, ServiceError> {
        let url = Url::parse(resource_location).map_err(|e| {
            ServiceError::InvalidResponse(format!(
                "Invalid resource location '{resource_location}': {e}"
            ))
        })?;

        // Only the wait for response headers is bounded here; the body is read by chunk
        let send = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.token.bearer())
            .send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                ServiceError::Transport(format!(
                    "No artifact response within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(transport_error)?;

        tracing::debug!(
            status = response.status().as_u16(),
            request_id = ?request_id(response.headers()),
            content_length = ?response.content_length(),
            "Artifact response received"
        );

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(Box::new(HttpArtifactStream {
            response,
            idle_timeout: self.timeout,
        }))
    }
}

/// Artifact body read chunk by chunk off the wire
struct HttpArtifactStream {
    response: Response,
    idle_timeout: Duration,
}

#[async_trait]
impl ArtifactStream for HttpArtifactStream {
    async fn next_chunk(&mut self) -> std::result::Result<Option<Vec<u8>>, ServiceError> {
        let chunk = tokio::time::timeout(self.idle_timeout, self.response.chunk())
            .await
            .map_err(|_| {
                ServiceError::StreamInterrupted(format!(
                    "No data received for {}s",
                    self.idle_timeout.as_secs()
                ))
            })?;

        chunk
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .map_err(|e| ServiceError::StreamInterrupted(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::powerbi::PollStatus;
    use crate::domain::{ExportRequestParameters, ReportId, WorkspaceId};
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn client_for(server: &mockito::ServerGuard) -> PowerBiClient {
        let config = ServiceConfig {
            base_url: Some(server.url()),
            ..Default::default()
        };
        PowerBiClient::new(&config, AccessToken::new("t0ken")).unwrap()
    }

    fn request() -> ExportRequest {
        ExportRequest {
            workspace_id: WorkspaceId::new("W1").unwrap(),
            report_id: ReportId::new("R1").unwrap(),
            parameters: ExportRequestParameters::pdf(),
        }
    }

    #[tokio::test]
    async fn test_submit_export_accepted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1.0/myorg/groups/W1/reports/R1/ExportTo")
            .match_header("authorization", "Bearer t0ken")
            .match_body(Matcher::Json(json!({"format": "PDF"})))
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_header("RequestId", "req-42")
            .with_body(r#"{"id": "Mi9C-E1", "status": "NotStarted"}"#)
            .create_async()
            .await;

        let receipt = client_for(&server).submit_export(&request()).await.unwrap();
        assert_eq!(receipt.export_id.as_str(), "Mi9C-E1");
        assert_eq!(receipt.request_id.as_deref(), Some("req-42"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_export_bad_request_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1.0/myorg/groups/W1/reports/R1/ExportTo")
            .with_status(400)
            .with_body(r#"{"error": {"code": "InvalidRequest", "message": "bad format"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).submit_export(&request()).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Rejected {
                status: 400,
                message: "InvalidRequest: bad format".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_submit_export_throttled_carries_retry_after() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1.0/myorg/groups/W1/reports/R1/ExportTo")
            .with_status(429)
            .with_header("Retry-After", "7")
            .create_async()
            .await;

        let err = client_for(&server).submit_export(&request()).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::RateLimited {
                retry_after_secs: Some(7)
            }
        );
    }

    #[tokio::test]
    async fn test_submit_export_missing_id_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1.0/myorg/groups/W1/reports/R1/ExportTo")
            .with_status(202)
            .with_body(r#"{"status": "NotStarted"}"#)
            .create_async()
            .await;

        let err = client_for(&server).submit_export(&request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_export_status_running_then_succeeded() {
        let mut server = mockito::Server::new_async().await;
        let location = format!("{}/files/E1", server.url());

        let running = server
            .mock("GET", "/v1.0/myorg/groups/W1/reports/R1/exports/E1")
            .with_status(202)
            .with_header("Retry-After", "2")
            .with_body(r#"{"id": "E1", "status": "Running", "percentComplete": 50}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let export_id = ExportId::new("E1").unwrap();

        let report = client.export_status(&request(), &export_id).await.unwrap();
        assert_eq!(
            report.status,
            PollStatus::Running {
                percent_complete: Some(50)
            }
        );
        assert_eq!(report.retry_after, Some(Duration::from_secs(2)));
        running.assert_async().await;
        running.remove_async().await;

        server
            .mock("GET", "/v1.0/myorg/groups/W1/reports/R1/exports/E1")
            .with_status(200)
            .with_body(
                json!({"id": "E1", "status": "Succeeded", "resourceLocation": location})
                    .to_string(),
            )
            .create_async()
            .await;

        let report = client.export_status(&request(), &export_id).await.unwrap();
        assert_eq!(
            report.status,
            PollStatus::Succeeded {
                resource_location: Some(location)
            }
        );
    }

    #[tokio::test]
    async fn test_export_status_escapes_export_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1.0/myorg/groups/W1/reports/R1/exports/Mi9C%2Fab+c==")
            .with_status(202)
            .with_body(r#"{"id": "Mi9C/ab+c==", "status": "Running"}"#)
            .create_async()
            .await;

        let export_id = ExportId::new("Mi9C/ab+c==").unwrap();
        let report = client_for(&server)
            .export_status(&request(), &export_id)
            .await
            .unwrap();
        assert!(matches!(report.status, PollStatus::Running { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_export_status_server_error_is_retryable() {
        use crate::domain::IsRetryable;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1.0/myorg/groups/W1/reports/R1/exports/E1")
            .with_status(503)
            .create_async()
            .await;

        let err = client_for(&server)
            .export_status(&request(), &ExportId::new("E1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Server { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_open_artifact_streams_body() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![0x25u8; 64 * 1024];
        server
            .mock("GET", "/files/E1")
            .match_header("authorization", "Bearer t0ken")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(body.clone())
            .create_async()
            .await;

        let client = client_for(&server);
        let mut stream = client
            .open_artifact(&format!("{}/files/E1", server.url()))
            .await
            .unwrap();

        let mut received = Vec::new();
        while let Some(chunk) = stream.next_chunk().await.unwrap() {
            received.extend_from_slice(&chunk);
        }
        assert_eq!(received, body);
    }

    #[tokio::test]
    async fn test_stalled_artifact_is_interrupted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/files/E1")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"%PDF-1.7")?;
                w.flush()?;
                std::thread::sleep(Duration::from_secs(3));
                Ok(())
            })
            .create_async()
            .await;

        let config = ServiceConfig {
            base_url: Some(server.url()),
            timeout_seconds: 1,
            ..Default::default()
        };
        let client = PowerBiClient::new(&config, AccessToken::new("t0ken")).unwrap();
        let mut stream = client
            .open_artifact(&format!("{}/files/E1", server.url()))
            .await
            .unwrap();

        assert!(stream.next_chunk().await.unwrap().is_some());
        let err = stream.next_chunk().await.unwrap_err();
        assert!(matches!(err, ServiceError::StreamInterrupted(_)));
    }

    #[tokio::test]
    async fn test_open_artifact_invalid_location() {
        let server = mockito::Server::new_async().await;
        let err = client_for(&server)
            .open_artifact("not a url")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }
}
