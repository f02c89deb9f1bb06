use std::time::Duration;

use docgrab_engine::{ApiFetcher, Credential, DocumentFetcher, FailureKind, FetchSettings};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF_B64: &str = "JVBERi0xLjQ=";

fn fetcher_for(server: &MockServer) -> ApiFetcher {
    ApiFetcher::new(FetchSettings {
        base_url: format!("{}/v1/file/", server.uri()),
        ..FetchSettings::default()
    })
    .unwrap()
}

fn token() -> Credential {
    Credential::new("secret-token").unwrap()
}

#[tokio::test]
async fn fetcher_sends_bearer_and_decodes_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/file/abc"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "file": PDF_B64 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let artifact = fetcher_for(&server).fetch("abc", &token()).await.expect("fetch ok");
    assert_eq!(artifact.bytes, b"%PDF-1.4");
    assert_eq!(artifact.mime_type(), "application/pdf");
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/file/locked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = fetcher_for(&server)
        .fetch("locked", &token())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(401));
}

#[tokio::test]
async fn fetcher_fails_without_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/file/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "x" })))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch("empty", &token()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::MissingPayload);
}

#[tokio::test]
async fn fetcher_fails_on_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/file/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = fetcher_for(&server).fetch("html", &token()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidPayload);
}

#[tokio::test]
async fn fetcher_times_out_only_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/file/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(serde_json::json!({ "file": PDF_B64 })),
        )
        .mount(&server)
        .await;

    let patient = fetcher_for(&server);
    assert!(patient.fetch("slow", &token()).await.is_ok());

    let impatient = ApiFetcher::new(FetchSettings {
        base_url: format!("{}/v1/file/", server.uri()),
        request_timeout: Some(Duration::from_millis(50)),
        ..FetchSettings::default()
    })
    .unwrap();
    let err = impatient.fetch("slow", &token()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/file/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/json")
                .set_body_string(format!(r#"{{"file":"{PDF_B64}"}}"#)),
        )
        .mount(&server)
        .await;

    let fetcher = ApiFetcher::new(FetchSettings {
        base_url: format!("{}/v1/file/", server.uri()),
        max_bytes: 10,
        ..FetchSettings::default()
    })
    .unwrap();
    let err = fetcher.fetch("large", &token()).await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 10, .. }));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let fetcher = fetcher_for(&server);
    drop(server);

    let err = fetcher.fetch("gone", &token()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}
