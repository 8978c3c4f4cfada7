//! Integration tests for the API gateway: retry classification, backoff,
//! and response caching.

use std::time::{Duration, Instant};

use serde_json::json;
use shopify_metaobjects::{
    AccessToken, ApiError, Gateway, HostUrl, LoaderConfig, MemoryCache, RetryPolicy, ShopDomain,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRAPHQL_PATH: &str = "/admin/api/2025-04/graphql.json";

fn config_against(server: &MockServer, retry: RetryPolicy) -> LoaderConfig {
    LoaderConfig::builder()
        .shop_domain(ShopDomain::new("test-shop").unwrap())
        .access_token(AccessToken::new("test-token").unwrap())
        .api_host(HostUrl::new(server.uri()).unwrap())
        .retry(retry)
        .build()
        .unwrap()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(40), Duration::from_millis(200)).unwrap()
}

fn shop_data() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {"shop": {"name": "Test Shop"}}
    }))
}

// ============================================================================
// Retry Behavior Tests
// ============================================================================

#[tokio::test]
async fn test_two_throttles_then_success_makes_exactly_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"errors": "Throttled"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(shop_data())
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_against(&server, fast_retry()));

    let started = Instant::now();
    let data = gateway.execute("query { shop { name } }", None).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(data["shop"]["name"], "Test Shop");
    // Backoff doubles: ~40ms then ~80ms between the three attempts
    assert!(elapsed >= Duration::from_millis(110), "elapsed was {elapsed:?}");
}

#[tokio::test]
async fn test_retry_exhaustion_is_a_typed_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"errors": "Throttled"})))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_against(&server, fast_retry()));
    let error = gateway.execute("query { shop { name } }", None).await.unwrap_err();

    assert!(matches!(
        error,
        ApiError::RetriesExceeded { attempts: 3, code: 429, .. }
    ));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(shop_data())
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_against(&server, fast_retry()));
    let data = gateway.execute("query { shop { name } }", None).await.unwrap();
    assert_eq!(data["shop"]["name"], "Test Shop");
}

#[tokio::test]
async fn test_graphql_errors_are_not_retried() {
    let server = MockServer::start().await;
    // Exactly one request: the query itself is invalid.
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Field 'nope' doesn't exist on type 'QueryRoot'"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_against(&server, fast_retry()));
    let error = gateway.execute("query { nope }", None).await.unwrap_err();

    assert!(matches!(error, ApiError::Graphql { .. }));
    assert!(error.to_string().contains("doesn't exist"));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"errors": "Invalid API key"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_against(&server, fast_retry()));
    let error = gateway.execute("query { shop { name } }", None).await.unwrap_err();

    assert!(matches!(error, ApiError::Response { code: 401, .. }));
}

#[tokio::test]
async fn test_retry_after_hint_extends_the_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "0.3")
                .set_body_json(json!({"errors": "Throttled"})),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(shop_data())
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_against(&server, fast_retry()));

    let started = Instant::now();
    gateway.execute("query { shop { name } }", None).await.unwrap();
    let elapsed = started.elapsed();

    // The 300ms hint beats the computed 40ms backoff
    assert!(elapsed >= Duration::from_millis(280), "elapsed was {elapsed:?}");
}

// ============================================================================
// Header Tests
// ============================================================================

#[tokio::test]
async fn test_requests_carry_access_token_and_json_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("X-Shopify-Access-Token", "test-token"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .respond_with(shop_data())
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_against(&server, fast_retry()));
    gateway.execute("query { shop { name } }", None).await.unwrap();
}

// ============================================================================
// Response Cache Tests
// ============================================================================

#[tokio::test]
async fn test_cached_reads_hit_the_network_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(shop_data())
        .expect(1)
        .mount(&server)
        .await;

    let config = config_against(&server, fast_retry());
    let gateway = Gateway::with_cache(&config, Box::new(MemoryCache::new()));

    let first = gateway
        .execute_cached("query { shop { name } }", None)
        .await
        .unwrap();
    let second = gateway
        .execute_cached("query { shop { name } }", None)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_distinct_variables_miss_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(shop_data())
        .expect(2)
        .mount(&server)
        .await;

    let config = config_against(&server, fast_retry());
    let gateway = Gateway::with_cache(&config, Box::new(MemoryCache::new()));

    gateway
        .execute_cached("query Q($n: Int) { shop { name } }", Some(json!({"n": 1})))
        .await
        .unwrap();
    gateway
        .execute_cached("query Q($n: Int) { shop { name } }", Some(json!({"n": 2})))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_mutations_bypass_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(shop_data())
        .expect(2)
        .mount(&server)
        .await;

    let config = config_against(&server, fast_retry());
    let gateway = Gateway::with_cache(&config, Box::new(MemoryCache::new()));

    // execute() never consults or fills the cache
    gateway.execute("mutation { noop }", None).await.unwrap();
    gateway.execute("mutation { noop }", None).await.unwrap();
}

#[tokio::test]
async fn test_cache_miss_behaves_like_no_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(shop_data())
        .expect(2)
        .mount(&server)
        .await;

    let config = config_against(&server, fast_retry());
    let with_cache = Gateway::with_cache(&config, Box::new(MemoryCache::new()));
    let without_cache = Gateway::new(&config);

    let cached = with_cache
        .execute_cached("query { shop { name } }", None)
        .await
        .unwrap();
    let plain = without_cache
        .execute_cached("query { shop { name } }", None)
        .await
        .unwrap();
    assert_eq!(cached, plain);
}
