//! Integration tests for the robots client
//!
//! These tests use wiremock to serve robots.txt files and exercise the full
//! split → cache → fetch → evaluate cycle end-to-end.

use robots_gate::config::{Config, RequestConfig};
use robots_gate::{MemoryStore, RobotsClient, RobotsError, TtlStore};
use std::time::Duration;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROBOTS: &str = "User-agent: *\n\
                      Disallow: /disallowed\n\
                      Crawl-delay: 2\n\
                      \n\
                      User-agent: googlebot\n\
                      Disallow: /private\n";

/// Installs a log subscriber once; set RUST_LOG=robots_gate=debug to see it
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Mounts a robots.txt response that must be requested `times` times
async fn mount_robots(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

fn memory_client(ttl_ms: u64, store: Option<MemoryStore>) -> RobotsClient<MemoryStore> {
    let config = Config {
        ttl: ttl_ms,
        ..Config::default()
    };
    RobotsClient::with_store(config, store).expect("Failed to build client")
}

#[tokio::test]
async fn test_fetches_and_evaluates_robots_file() {
    init_tracing();
    let server = MockServer::start().await;
    // No durable store: each sequential check fetches again
    mount_robots(&server, ResponseTemplate::new(200).set_body_string(ROBOTS), 2).await;

    let client = memory_client(0, None);
    let base = server.uri();

    assert!(client
        .is_allowed("woobot/1.0", &format!("{}/allowed", base))
        .await
        .unwrap());
    assert!(!client
        .is_allowed("woobot/1.0", &format!("{}/disallowed", base))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_concurrent_checks_share_one_fetch() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string(ROBOTS)
            .set_delay(Duration::from_millis(100)),
        1,
    )
    .await;

    let client = memory_client(0, None);
    let base = server.uri();
    let allowed_url = format!("{}/allowed", base);
    let disallowed_url = format!("{}/disallowed", base);
    let root_url = format!("{}/", base);

    let (allowed, disallowed, googlebot) = tokio::join!(
        client.is_allowed("woobot/1.0", &allowed_url),
        client.is_allowed("woobot/1.0", &disallowed_url),
        client.is_allowed("googlebot", &root_url),
    );

    assert!(allowed.unwrap());
    assert!(!disallowed.unwrap());
    assert!(googlebot.unwrap());
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn test_agent_specific_group_applies() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string(ROBOTS)
            .set_delay(Duration::from_millis(50)),
        1,
    )
    .await;

    let client = memory_client(0, None);
    let disallowed_url = format!("{}/disallowed", server.uri());
    let private_url = format!("{}/private", server.uri());

    let (disallowed, private) = tokio::join!(
        client.is_allowed("googlebot", &disallowed_url),
        client.is_allowed("googlebot", &private_url),
    );

    assert!(disallowed.unwrap());
    assert!(!private.unwrap());
}

#[tokio::test]
async fn test_caches_robots_file_in_db() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(200).set_body_string(ROBOTS), 1).await;

    let dir = TempDir::new().unwrap();
    let config = Config {
        database_path: Some(dir.path().join("robots.db")),
        ..Config::default()
    };
    let client = RobotsClient::new(config).unwrap();
    let base = server.uri();

    assert!(client
        .is_allowed("woobot/1.0", &format!("{}/allowed", base))
        .await
        .unwrap());
    assert!(!client
        .is_allowed("woobot/1.0", &format!("{}/disallowed", base))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_db_cache_survives_new_client() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("robots.db");
    let config = Config {
        database_path: Some(db_path.clone()),
        ..Config::default()
    };

    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(200).set_body_string(ROBOTS), 1).await;
    let url = format!("{}/disallowed", server.uri());

    {
        let first = RobotsClient::new(config.clone()).unwrap();
        assert!(!first.is_allowed("woobot/1.0", &url).await.unwrap());
    }

    // The site now fails; the stored policy must still answer
    server.verify().await;
    server.reset().await;
    mount_robots(&server, ResponseTemplate::new(500), 0).await;

    let second = RobotsClient::new(config).unwrap();
    assert!(!second.is_allowed("woobot/1.0", &url).await.unwrap());
}

#[tokio::test]
async fn test_allows_all_when_no_robots_txt() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(404)
            .set_body_string(ROBOTS)
            .set_delay(Duration::from_millis(50)),
        1,
    )
    .await;

    let client = memory_client(0, None);
    let base = server.uri();
    let allowed_url = format!("{}/allowed", base);
    let disallowed_url = format!("{}/disallowed", base);
    let root_url = format!("{}/", base);

    let (allowed, disallowed, googlebot) = tokio::join!(
        client.is_allowed("woobot/1.0", &allowed_url),
        client.is_allowed("woobot/1.0", &disallowed_url),
        client.is_allowed("googlebot", &root_url),
    );

    assert!(allowed.unwrap());
    assert!(disallowed.unwrap());
    assert!(googlebot.unwrap());
}

#[tokio::test]
async fn test_server_error_fails_every_waiter() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(500)
            .set_body_string(ROBOTS)
            .set_delay(Duration::from_millis(50)),
        1,
    )
    .await;

    let client = memory_client(0, None);
    let base = server.uri();
    let allowed_url = format!("{}/allowed", base);
    let disallowed_url = format!("{}/disallowed", base);
    let root_url = format!("{}/", base);

    let (allowed, disallowed, googlebot) = tokio::join!(
        client.is_allowed("woobot/1.0", &allowed_url),
        client.is_allowed("woobot/1.0", &disallowed_url),
        client.is_allowed("googlebot", &root_url),
    );

    for result in [allowed, disallowed, googlebot] {
        let err = result.unwrap_err();
        assert!(matches!(err, RobotsError::Status(500)));
    }
}

#[tokio::test]
async fn test_rate_limited_is_not_treated_as_missing() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(429), 1).await;

    let client = memory_client(0, None);
    let err = client
        .is_allowed("woobot/1.0", &format!("{}/allowed", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_failed_fetch_is_not_stored() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(503), 1).await;

    let store = MemoryStore::new();
    let client = memory_client(0, Some(store.clone()));
    let result = client
        .is_allowed("woobot/1.0", &format!("{}/allowed", server.uri()))
        .await;

    assert!(matches!(result, Err(RobotsError::Status(503))));
    assert!(store.get(&server.uri()).await.unwrap_err().is_not_found());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_expired_policy_is_fetched_again() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(200).set_body_string(ROBOTS), 2).await;

    let client = memory_client(1, Some(MemoryStore::new()));
    let url = format!("{}/allowed", server.uri());

    assert!(client.is_allowed("woobot/1.0", &url).await.unwrap());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(client.is_allowed("woobot/1.0", &url).await.unwrap());
}

#[tokio::test]
async fn test_fresh_policy_is_served_from_store() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(200).set_body_string(ROBOTS), 1).await;

    let store = MemoryStore::new();
    let client = memory_client(60_000, Some(store.clone()));
    let url = format!("{}/allowed", server.uri());

    for _ in 0..3 {
        assert!(client.is_allowed("woobot/1.0", &url).await.unwrap());
    }
    assert!(store.get(&server.uri()).await.is_ok());
}

#[tokio::test]
async fn test_request_options_are_sent() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", "woobot/1.0"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        request: RequestConfig {
            user_agent: Some("woobot/1.0".to_string()),
            timeout_ms: Some(5_000),
            headers: [("x-api-key".to_string(), "secret".to_string())]
                .into_iter()
                .collect(),
            ..RequestConfig::default()
        },
        ..Config::default()
    };
    let client = RobotsClient::<MemoryStore>::with_store(config, None).unwrap();

    // Without the headers the mock would not match and wiremock answers 404,
    // which would read as "allowed"
    let allowed = client
        .is_allowed("woobot/1.0", &format!("{}/page", server.uri()))
        .await
        .unwrap();
    assert!(!allowed);
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200)
            .set_body_string(ROBOTS)
            .set_delay(Duration::from_millis(500)),
        1,
    )
    .await;

    let config = Config {
        request: RequestConfig {
            timeout_ms: Some(50),
            ..RequestConfig::default()
        },
        ..Config::default()
    };
    let client = RobotsClient::<MemoryStore>::with_store(config, None).unwrap();

    let err = client
        .is_allowed("woobot/1.0", &format!("{}/allowed", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, RobotsError::Transport { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_a_transport_error() {
    init_tracing();
    // Bind and release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = memory_client(0, None);
    let err = client
        .is_allowed("woobot/1.0", &format!("http://127.0.0.1:{}/allowed", port))
        .await
        .unwrap_err();

    match err {
        RobotsError::Transport { url, .. } => {
            assert_eq!(url, format!("http://127.0.0.1:{}/robots.txt", port));
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_policy_allows_everything() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("<html><body>Welcome!</body></html>"),
        1,
    )
    .await;

    let client = memory_client(0, None);
    let policy = client
        .policy(&format!("{}/anything", server.uri()))
        .await
        .unwrap();
    assert!(policy.is_allow_all());
}

#[tokio::test]
async fn test_crawl_delay_from_policy() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(200).set_body_string(ROBOTS), 2).await;

    let client = memory_client(0, None);
    let url = format!("{}/", server.uri());

    assert_eq!(client.crawl_delay("woobot/1.0", &url).await.unwrap(), Some(2.0));
    assert_eq!(client.crawl_delay("googlebot", &url).await.unwrap(), None);
}

#[tokio::test]
async fn test_hosts_are_cached_separately() {
    init_tracing();
    let open = MockServer::start().await;
    let closed = MockServer::start().await;
    mount_robots(&open, ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"), 1).await;
    mount_robots(&closed, ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"), 1).await;

    let client = memory_client(0, Some(MemoryStore::new()));

    assert!(client
        .is_allowed("woobot/1.0", &format!("{}/page", open.uri()))
        .await
        .unwrap());
    assert!(!client
        .is_allowed("woobot/1.0", &format!("{}/page", closed.uri()))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_double_slash_path_is_evaluated_whole() {
    init_tracing();
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: //secret"),
        1,
    )
    .await;

    let client = memory_client(0, Some(MemoryStore::new()));

    assert!(!client
        .is_allowed("woobot/1.0", &format!("{}//secret/page", server.uri()))
        .await
        .unwrap());
    assert!(client
        .is_allowed("woobot/1.0", &format!("{}/page", server.uri()))
        .await
        .unwrap());
}
