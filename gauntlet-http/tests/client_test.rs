//! HttpManager against a live mock server

use gauntlet_http::{HttpClient, HttpConfig, HttpError, HttpManager};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager_with_timeout(timeout: Duration) -> HttpManager {
    HttpManager::with_config(HttpConfig {
        timeout,
        ..HttpConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_posts_json_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"username": "alice", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = manager_with_timeout(Duration::from_secs(5));
    let response = manager
        .post_json(
            &format!("{}/login", mock_server.uri()),
            &json!({"username": "alice", "password": "secret"}),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body["token"], "abc");
}

#[tokio::test]
async fn test_error_statuses_are_completed_exchanges() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let manager = manager_with_timeout(Duration::from_secs(5));
    let url = format!("{}/login", mock_server.uri());

    let first = manager.post_json(&url, &json!({})).await.unwrap();
    assert_eq!(first.status, 401);
    assert_eq!(first.body, json!("Unauthorized"));

    let second = manager.post_json(&url, &json!({})).await.unwrap();
    assert_eq!(second.status, 503);
    assert!(second.body.is_null());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let manager = manager_with_timeout(Duration::from_millis(200));
    let result = manager
        .post_json(&format!("{}/login", mock_server.uri()), &json!({}))
        .await;

    assert!(matches!(result, Err(HttpError::Timeout(_))));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let manager = manager_with_timeout(Duration::from_secs(2));
    let result = manager
        .post_json(&format!("http://127.0.0.1:{}/login", port), &json!({}))
        .await;

    assert!(matches!(result, Err(HttpError::NetworkError(_))));
}
