//! Integration tests for `Communicator::call_agent` retry/backoff behavior
//! against a local mock server.

use mesh_domain::config::CommunicatorConfig;
use mesh_communicator::Communicator;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> CommunicatorConfig {
    CommunicatorConfig {
        max_attempts: 3,
        default_timeout_ms: 2_000,
        ..CommunicatorConfig::default()
    }
}

#[tokio::test]
async fn call_agent_returns_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ack"))
        .mount(&server)
        .await;

    let comm = Communicator::new(fast_config(), "caller")
        .unwrap()
        .with_url_override("weather", server.uri());

    let body = comm
        .call_agent("weather", "what's the forecast?", None)
        .await
        .unwrap();
    assert_eq!(body, "ack");
}

#[tokio::test]
async fn call_agent_sets_originator_and_request_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .and(header_exists("x-originator-id"))
        .and(header_exists("x-request-id"))
        .and(header_exists("traceparent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let comm = Communicator::new(fast_config(), "caller")
        .unwrap()
        .with_url_override("weather", server.uri());

    comm.call_agent("weather", "hello", None).await.unwrap();
}

#[tokio::test]
async fn call_agent_retries_on_5xx_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let comm = Communicator::new(fast_config(), "caller")
        .unwrap()
        .with_url_override("weather", server.uri());

    let body = comm.call_agent("weather", "hello", None).await.unwrap();
    assert_eq!(body, "recovered");
}

#[tokio::test]
async fn call_agent_does_not_retry_on_4xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad instruction"))
        .expect(1)
        .mount(&server)
        .await;

    let comm = Communicator::new(fast_config(), "caller")
        .unwrap()
        .with_url_override("weather", server.uri());

    let err = comm.call_agent("weather", "hello", None).await.unwrap_err();
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn call_agent_exhausts_retries_on_persistent_5xx() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let comm = Communicator::new(fast_config(), "caller")
        .unwrap()
        .with_url_override("weather", server.uri());

    let err = comm.call_agent("weather", "hello", None).await.unwrap_err();
    assert!(err.to_string().contains("weather"));
}

#[tokio::test]
async fn ping_reports_healthy_on_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let comm = Communicator::new(fast_config(), "caller")
        .unwrap()
        .with_url_override("weather", server.uri());

    assert!(comm.ping("weather").await);
}

#[tokio::test]
async fn ping_reports_unhealthy_on_non_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let comm = Communicator::new(fast_config(), "caller")
        .unwrap()
        .with_url_override("weather", server.uri());

    assert!(!comm.ping("weather").await);
}
