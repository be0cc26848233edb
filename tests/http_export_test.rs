//! Export runs over HTTP against a mock Power BI API

use mockito::Matcher;
use pbi_export::adapters::credentials::credential_source_from_config;
use pbi_export::adapters::powerbi::PowerBiClient;
use pbi_export::cli::commands::export::ExportArgs;
use pbi_export::cli::commands::{EXIT_PARTIAL_FAILURE, EXIT_SUCCESS};
use pbi_export::config::{secret_string, ExporterConfig};
use pbi_export::core::export::{
    ClientPolicies, DispatchPlan, Dispatcher, ExportClient, FileSink, RequestBuilder,
    ShutdownSignal,
};
use pbi_export::domain::FailureKind;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

const REPORT_PATH: &str = "/v1.0/myorg/groups/W1/reports/R1";

fn config_for(server: &mockito::ServerGuard) -> ExporterConfig {
    let mut config = ExporterConfig::default();
    config.service.base_url = Some(server.url());
    config.auth.access_token = Some(secret_string("t0ken".to_string()));
    config.export.workspace_id = Some("W1".to_string());
    config.export.report_id = Some("R1".to_string());
    config
}

#[tokio::test]
async fn test_stored_export_over_http() {
    let mut server = mockito::Server::new_async().await;
    let location = format!("{}/files/E1", server.url());

    let submit = server
        .mock("POST", format!("{REPORT_PATH}/ExportTo").as_str())
        .match_header("authorization", "Bearer t0ken")
        .match_body(Matcher::Json(json!({"format": "PDF"})))
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "E1", "status": "NotStarted"}"#)
        .create_async()
        .await;
    let status = server
        .mock("GET", format!("{REPORT_PATH}/exports/E1").as_str())
        .match_header("authorization", "Bearer t0ken")
        .with_status(200)
        .with_body(
            json!({"id": "E1", "status": "Succeeded", "resourceLocation": location}).to_string(),
        )
        .create_async()
        .await;
    let file = server
        .mock("GET", "/files/E1")
        .match_header("authorization", "Bearer t0ken")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("%PDF-1.7 over the wire")
        .create_async()
        .await;

    let config = config_for(&server);
    let token = credential_source_from_config(&config.auth)
        .unwrap()
        .token()
        .await
        .unwrap();
    let service = PowerBiClient::new(&config.service, token).unwrap();
    let request = RequestBuilder::from_config(&config.export).build().unwrap();

    let dir = TempDir::new().unwrap();
    let client = ExportClient::new(
        Arc::new(service),
        Arc::new(FileSink::new(dir.path())),
        ClientPolicies::from_config(&config.retry),
    );
    let summary = Dispatcher::new(Arc::new(client), Arc::new(request), ShutdownSignal::never())
        .run(DispatchPlan::new(1, 1))
        .await;

    assert!(summary.is_successful());
    let receipt = summary.outcomes[0].result.as_ref().unwrap();
    assert_eq!(
        std::fs::read(receipt.path.as_ref().unwrap()).unwrap(),
        b"%PDF-1.7 over the wire"
    );

    submit.assert_async().await;
    status.assert_async().await;
    file.assert_async().await;
}

#[tokio::test]
async fn test_export_command_discard_mode() {
    let mut server = mockito::Server::new_async().await;
    let location = format!("{}/files/E1", server.url());

    server
        .mock("POST", format!("{REPORT_PATH}/ExportTo").as_str())
        .with_status(202)
        .with_body(r#"{"id": "E1", "status": "NotStarted"}"#)
        .expect(3)
        .create_async()
        .await;
    server
        .mock("GET", format!("{REPORT_PATH}/exports/E1").as_str())
        .with_status(200)
        .with_body(
            json!({"id": "E1", "status": "Succeeded", "resourceLocation": location}).to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/files/E1")
        .with_status(200)
        .with_body("pdf bytes")
        .expect(3)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let args = ExportArgs {
        num_exports: Some(3),
        concurrency: Some(2),
        skip_download: true,
        output_dir: Some(dir.path().to_string_lossy().to_string()),
        ..Default::default()
    };
    let (_tx, rx) = watch::channel(false);

    let code = args.execute(config_for(&server), rx).await.unwrap();

    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_export_command_reports_partial_failure() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", format!("{REPORT_PATH}/ExportTo").as_str())
        .with_status(202)
        .with_body(r#"{"id": "E1", "status": "NotStarted"}"#)
        .create_async()
        .await;
    server
        .mock("GET", format!("{REPORT_PATH}/exports/E1").as_str())
        .with_status(200)
        .with_body(
            json!({"id": "E1", "status": "Failed", "error": {"code": "ExportFailed", "message": "render error"}})
                .to_string(),
        )
        .create_async()
        .await;

    let args = ExportArgs {
        skip_download: true,
        ..Default::default()
    };
    let (_tx, rx) = watch::channel(false);

    let code = args.execute(config_for(&server), rx).await.unwrap();
    assert_eq!(code, EXIT_PARTIAL_FAILURE);
}

#[tokio::test]
async fn test_rejected_submission_is_a_single_request() {
    let mut server = mockito::Server::new_async().await;
    let submit = server
        .mock("POST", format!("{REPORT_PATH}/ExportTo").as_str())
        .with_status(400)
        .with_body(r#"{"error": {"code": "InvalidRequest", "message": "Unsupported format"}}"#)
        .expect(1)
        .create_async()
        .await;

    let config = config_for(&server);
    let token = credential_source_from_config(&config.auth)
        .unwrap()
        .token()
        .await
        .unwrap();
    let service = PowerBiClient::new(&config.service, token).unwrap();
    let request = RequestBuilder::from_config(&config.export).build().unwrap();
    let client = ExportClient::new(
        Arc::new(service),
        Arc::new(pbi_export::core::export::DiscardSink),
        ClientPolicies::from_config(&config.retry),
    );

    let summary = Dispatcher::new(Arc::new(client), Arc::new(request), ShutdownSignal::never())
        .run(DispatchPlan::new(1, 1))
        .await;

    assert_eq!(summary.failures_of(FailureKind::SubmissionRejected), 1);
    submit.assert_async().await;
}

#[tokio::test]
async fn test_slow_artifact_outlives_request_timeout() {
    let mut server = mockito::Server::new_async().await;
    let location = format!("{}/files/E1", server.url());

    server
        .mock("POST", format!("{REPORT_PATH}/ExportTo").as_str())
        .with_status(202)
        .with_body(r#"{"id": "E1", "status": "NotStarted"}"#)
        .create_async()
        .await;
    server
        .mock("GET", format!("{REPORT_PATH}/exports/E1").as_str())
        .with_status(200)
        .with_body(
            json!({"id": "E1", "status": "Succeeded", "resourceLocation": location}).to_string(),
        )
        .create_async()
        .await;
    // Six 1 KiB chunks 400ms apart: the transfer takes well over the 1s timeout
    let file = server
        .mock("GET", "/files/E1")
        .with_status(200)
        .with_chunked_body(|w| {
            for _ in 0..6 {
                w.write_all(&[b'%'; 1024])?;
                w.flush()?;
                std::thread::sleep(Duration::from_millis(400));
            }
            Ok(())
        })
        .expect(1)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.service.timeout_seconds = 1;
    let token = credential_source_from_config(&config.auth)
        .unwrap()
        .token()
        .await
        .unwrap();
    let service = PowerBiClient::new(&config.service, token).unwrap();
    let request = RequestBuilder::from_config(&config.export).build().unwrap();

    let dir = TempDir::new().unwrap();
    let client = ExportClient::new(
        Arc::new(service),
        Arc::new(FileSink::new(dir.path())),
        ClientPolicies::from_config(&config.retry),
    );
    let summary = Dispatcher::new(Arc::new(client), Arc::new(request), ShutdownSignal::never())
        .run(DispatchPlan::new(1, 1))
        .await;

    assert!(summary.is_successful());
    let receipt = summary.outcomes[0].result.as_ref().unwrap();
    assert_eq!(receipt.bytes, 6 * 1024);
    assert_eq!(
        std::fs::metadata(receipt.path.as_ref().unwrap()).unwrap().len(),
        6 * 1024
    );
    file.assert_async().await;
}
