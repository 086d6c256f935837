//! Integration tests for batch insertion against a mock warehouse

use async_trait::async_trait;
use fake::faker::internet::en::{IPv4, UserAgent};
use fake::Fake;
use mockito::{Matcher, Server};
use serde_json::json;
use sextant::adapters::auth::{Credential, CredentialProvider};
use sextant::config::{secret_string, RetryConfig, WarehouseConfig};
use sextant::core::insert::BatchInserter;
use sextant::domain::{Batch, Event, Result, SextantError, WarehouseError};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

const INSERT_PATH: &str = "/projects/analytics-prod/datasets/events/tables/events_v2/insertAll";
const REJECTED_LINE: &str = "possible error processing event";

struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for CountingProvider {
    async fn authorize(&self) -> Result<Credential> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Credential::new(format!("token-{n}")))
    }
}

struct FailingProvider;

#[async_trait]
impl CredentialProvider for FailingProvider {
    async fn authorize(&self) -> Result<Credential> {
        Err(SextantError::Authentication(
            "Google STS token request returned 401".to_string(),
        ))
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }

    fn count(&self, needle: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(needle)).count()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn warehouse_config(api_url: &str, retries: usize) -> WarehouseConfig {
    WarehouseConfig {
        bigquery_project_id: Some("analytics-prod".to_string()),
        bigquery_dataset: Some("events".to_string()),
        bigquery_table_name: Some("events_v2".to_string()),
        bigquery_retries: Some(retries),
        bigquery_api_url: api_url.to_string(),
        request_timeout_seconds: 5,
        azure_client_id: Some("client".to_string()),
        azure_token_path: Some("/var/run/secrets/azure/tokens/token".to_string()),
        azure_scope: Some("api://AzureADTokenExchange/.default".to_string()),
        gcp_scope: Some("https://www.googleapis.com/auth/cloud-platform".to_string()),
        google_cloud_credentials: Some(secret_string("{}".to_string())),
        ..Default::default()
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        initial_delay_ms: 10,
        max_delay_ms: 40,
        backoff_multiplier: 2.0,
        max_elapsed_ms: 5_000,
    }
}

fn web_request_batch(n: usize) -> Batch {
    let events = (0..n)
        .map(|i| {
            let ip: String = IPv4().fake();
            let agent: String = UserAgent().fake();
            Event::new(json!({
                "event_type": "web_request",
                "sequence": i,
                "remote_ip": ip,
                "user_agent": agent,
                "status": (200u16..600).fake::<u16>(),
            }))
            .unwrap()
        })
        .collect();
    Batch::new(events)
}

#[tokio::test]
async fn test_accepted_batch_logs_no_rejections() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INSERT_PATH)
        .match_header("authorization", "Bearer token-1")
        .match_body(Matcher::PartialJson(json!({
            "kind": "bigquery#tableDataInsertAllRequest",
            "skipInvalidRows": true
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"kind":"bigquery#tableDataInsertAllResponse"}"#)
        .expect(1)
        .create_async()
        .await;

    let (logs, _guard) = capture_logs();
    let credentials = CountingProvider::new();
    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 3),
        fast_retry(),
        credentials.clone(),
    );

    inserter.insert(&web_request_batch(3)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(credentials.calls(), 1);
    assert_eq!(logs.count(REJECTED_LINE), 0);
}

#[tokio::test]
async fn test_rows_are_sent_in_batch_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INSERT_PATH)
        .match_body(Matcher::PartialJson(json!({
            "rows": [
                {"json": {"event_type": "login", "user": "a"}},
                {"json": {"event_type": "logout", "user": "a"}}
            ]
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 0),
        fast_retry(),
        CountingProvider::new(),
    );
    let batch = Batch::new(vec![
        Event::new(json!({"event_type": "login", "user": "a"})).unwrap(),
        Event::new(json!({"event_type": "logout", "user": "a"})).unwrap(),
    ]);

    inserter.insert(&batch).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_rows_log_every_event_and_fail() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", INSERT_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "kind": "bigquery#tableDataInsertAllResponse",
                "insertErrors": [
                    {"index": 1, "errors": [
                        {"reason": "invalid", "location": "status", "message": "no such field: status."}
                    ]},
                    {"index": 3, "errors": [
                        {"reason": "stopped", "message": ""}
                    ]}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let (logs, _guard) = capture_logs();
    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 3),
        fast_retry(),
        CountingProvider::new(),
    );

    let err = inserter.insert(&web_request_batch(5)).await.unwrap_err();

    let SextantError::SendEvents(message) = &err else {
        panic!("expected SendEvents, got {err:?}");
    };
    assert!(message.starts_with("BigQuery insert error for 2 event(s):"));
    assert!(message.contains("index: 1 error: no such field: status."));
    assert!(message.contains("index: 3"));
    assert_eq!(err.exit_code(), 1);

    assert_eq!(logs.count(REJECTED_LINE), 5);
    for position in 1..=5 {
        assert!(logs
            .contents()
            .contains(&format!("{REJECTED_LINE} ({position}/5)")));
    }
    let error_lines = logs
        .contents()
        .lines()
        .filter(|l| l.contains("ERROR") && l.contains("BigQuery insert error"))
        .count();
    assert_eq!(error_lines, 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried_with_same_credential() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("POST", INSERT_PATH)
        .match_header("authorization", "Bearer token-1")
        .with_status(503)
        .with_body("backend error")
        .expect(2)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", INSERT_PATH)
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let credentials = CountingProvider::new();
    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 3),
        fast_retry(),
        credentials.clone(),
    );

    inserter.insert(&web_request_batch(2)).await.unwrap();

    unavailable.assert_async().await;
    accepted.assert_async().await;
    assert_eq!(credentials.calls(), 1);
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_transport_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INSERT_PATH)
        .with_status(502)
        .with_body("bad gateway")
        .expect(3)
        .create_async()
        .await;

    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 2),
        fast_retry(),
        CountingProvider::new(),
    );

    let err = inserter.insert(&web_request_batch(1)).await.unwrap_err();
    mock.assert_async().await;
    assert!(matches!(
        err,
        SextantError::Warehouse(WarehouseError::ServerError { status: 502, .. })
    ));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_elapsed_budget_stops_retries_early() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INSERT_PATH)
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let retry = RetryConfig {
        initial_delay_ms: 100,
        max_delay_ms: 1_000,
        backoff_multiplier: 2.0,
        max_elapsed_ms: 250,
    };
    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 10),
        retry,
        CountingProvider::new(),
    );

    assert!(inserter.insert(&web_request_batch(1)).await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", INSERT_PATH)
        .with_status(404)
        .with_body(r#"{"error":{"message":"Not found: Table analytics-prod:events.events_v2"}}"#)
        .expect(1)
        .create_async()
        .await;

    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 5),
        fast_retry(),
        CountingProvider::new(),
    );

    let err = inserter.insert(&web_request_batch(1)).await.unwrap_err();
    mock.assert_async().await;
    assert!(matches!(
        err,
        SextantError::Warehouse(WarehouseError::ClientError { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_throttling_is_retried() {
    let mut server = Server::new_async().await;
    let throttled = server
        .mock("POST", INSERT_PATH)
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", INSERT_PATH)
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 1),
        fast_retry(),
        CountingProvider::new(),
    );

    inserter.insert(&web_request_batch(1)).await.unwrap();
    throttled.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn test_missing_keys_fail_without_network() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut config = warehouse_config(&server.url(), 3);
    config.bigquery_dataset = None;
    config.gcp_scope = None;
    let credentials = CountingProvider::new();
    let inserter = BatchInserter::new(config, fast_retry(), credentials.clone());

    let err = inserter.insert(&web_request_batch(2)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Configuration error: missing required config values: bigquery_dataset, gcp_scope"
    );
    assert_eq!(credentials.calls(), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_batch_is_accepted_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let credentials = CountingProvider::new();
    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 3),
        fast_retry(),
        credentials.clone(),
    );

    inserter.insert(&Batch::default()).await.unwrap();
    assert_eq!(credentials.calls(), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_credential_is_fetched_per_call() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("POST", INSERT_PATH)
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("POST", INSERT_PATH)
        .match_header("authorization", "Bearer token-2")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let credentials = CountingProvider::new();
    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 0),
        fast_retry(),
        credentials.clone(),
    );

    inserter.insert(&web_request_batch(1)).await.unwrap();
    inserter.insert(&web_request_batch(1)).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(credentials.calls(), 2);
}

#[tokio::test]
async fn test_authentication_failure_surfaces() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let inserter = BatchInserter::new(
        warehouse_config(&server.url(), 3),
        fast_retry(),
        Arc::new(FailingProvider),
    );

    let err = inserter.insert(&web_request_batch(1)).await.unwrap_err();
    assert!(matches!(err, SextantError::Authentication(_)));
    assert_eq!(err.exit_code(), 3);
    mock.assert_async().await;
}
