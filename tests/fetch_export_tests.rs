//! Integration tests for the fetch/export pipeline and definition management.
//!
//! Backed by a wiremock server standing in for the GraphQL Admin API.

use std::time::Duration;

use serde_json::json;
use shopify_metaobjects::{
    AccessToken, ExportOptions, FieldDefinition, HostUrl, LoaderConfig, LoaderError,
    MetaobjectDefinition, MetaobjectLoader, RetryPolicy, ShopDomain,
};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRAPHQL_PATH: &str = "/admin/api/2025-04/graphql.json";

fn loader_against(server: &MockServer) -> MetaobjectLoader {
    let config = LoaderConfig::builder()
        .shop_domain(ShopDomain::new("test-shop").unwrap())
        .access_token(AccessToken::new("test-token").unwrap())
        .api_host(HostUrl::new(server.uri()).unwrap())
        .retry(
            RetryPolicy::new(3, Duration::from_millis(20), Duration::from_millis(100)).unwrap(),
        )
        .build()
        .unwrap();
    MetaobjectLoader::new(&config)
}

fn node(id: u32, handle: &str, fields: serde_json::Value) -> serde_json::Value {
    json!({
        "id": format!("gid://shopify/Metaobject/{id}"),
        "type": "region",
        "handle": handle,
        "fields": fields
    })
}

fn page(nodes: &[serde_json::Value], has_next: bool, cursor: Option<&str>) -> ResponseTemplate {
    let edges: Vec<serde_json::Value> = nodes.iter().map(|n| json!({"node": n})).collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {
            "metaobjects": {
                "edges": edges,
                "pageInfo": {"hasNextPage": has_next, "endCursor": cursor}
            }
        }
    }))
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_all_terminates_across_many_pages() {
    let server = MockServer::start().await;

    let page1 = [
        node(1, "north", json!([{"key": "name", "value": "North"}])),
        node(2, "south", json!([{"key": "name", "value": "South"}])),
    ];
    let page2 = [
        node(3, "east", json!([{"key": "name", "value": "East"}])),
        node(4, "west", json!([{"key": "name", "value": "West"}])),
    ];
    let page3 = [node(5, "center", json!([{"key": "name", "value": "Center"}]))];

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({"variables": {"after": null}})))
        .respond_with(page(&page1, true, Some("c1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({"variables": {"after": "c1"}})))
        .respond_with(page(&page2, true, Some("c2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({"variables": {"after": "c2"}})))
        .respond_with(page(&page3, false, None))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let all = loader.fetch_all_metaobjects("region", 2).await.unwrap();

    // All records, in server-returned order
    assert_eq!(all.len(), 5);
    let handles: Vec<&str> = all.iter().map(|m| m.handle.as_str()).collect();
    assert_eq!(handles, vec!["north", "south", "east", "west", "center"]);
}

#[tokio::test]
async fn test_single_page_fetch_exposes_cursor() {
    let server = MockServer::start().await;
    let nodes = [node(1, "north", json!([]))];
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(page(&nodes, true, Some("cursor-1")))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let result = loader.fetch_metaobjects("region", 50, None).await.unwrap();

    assert_eq!(result.metaobjects.len(), 1);
    assert!(result.has_next_page);
    assert_eq!(result.end_cursor.as_deref(), Some("cursor-1"));
}

#[tokio::test]
async fn test_page_size_is_clamped_to_api_ceiling() {
    let server = MockServer::start().await;
    // The request must carry the clamped value, not the caller's 500.
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({"variables": {"first": 250}})))
        .respond_with(page(&[], false, None))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let result = loader.fetch_metaobjects("region", 500, None).await.unwrap();
    assert!(result.metaobjects.is_empty());
}

// ============================================================================
// Dictionary Reindexing Tests
// ============================================================================

#[tokio::test]
async fn test_as_dict_reindexes_by_field_with_last_write_wins() {
    let server = MockServer::start().await;
    let nodes = [
        node(1, "north", json!([{"key": "code", "value": "N"}])),
        node(2, "south", json!([{"key": "code", "value": "S"}])),
        // Collides with "north" on code; the later record wins
        node(3, "north-2", json!([{"key": "code", "value": "N"}])),
    ];
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(page(&nodes, false, None))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let dict = loader
        .fetch_metaobjects_as_dict("region", "code")
        .await
        .unwrap();

    assert_eq!(dict.len(), 2);
    assert_eq!(dict.get("N").unwrap().handle, "north-2");
    assert_eq!(dict.get("S").unwrap().handle, "south");
}

#[tokio::test]
async fn test_as_dict_accepts_reserved_names() {
    let server = MockServer::start().await;
    let nodes = [node(1, "north", json!([]))];
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(page(&nodes, false, None))
        .expect(2)
        .mount(&server)
        .await;

    let loader = loader_against(&server);

    let by_handle = loader
        .fetch_metaobjects_as_dict("region", "handle")
        .await
        .unwrap();
    assert!(by_handle.contains_key("north"));

    let by_id = loader.fetch_metaobjects_as_dict("region", "id").await.unwrap();
    assert!(by_id.contains_key("gid://shopify/Metaobject/1"));
}

#[tokio::test]
async fn test_as_dict_raises_typed_error_for_missing_key_field() {
    let server = MockServer::start().await;
    let nodes = [node(1, "north", json!([{"key": "name", "value": "North"}]))];
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(page(&nodes, false, None))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let error = loader
        .fetch_metaobjects_as_dict("region", "code")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        LoaderError::KeyFieldMissing { ref key_field, ref handle }
            if key_field == "code" && handle == "north"
    ));
}

// ============================================================================
// CSV Export Tests
// ============================================================================

#[tokio::test]
async fn test_export_writes_one_row_per_record() {
    let server = MockServer::start().await;
    let nodes = [
        node(1, "north", json!([{"key": "name", "value": "North"}, {"key": "code", "value": "N"}])),
        node(2, "south", json!([{"key": "name", "value": "South"}])),
    ];
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(page(&nodes, false, None))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("regions.csv");

    let loader = loader_against(&server);
    let written = loader
        .export_metaobjects_to_csv("region", &out, &ExportOptions::default())
        .await
        .unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "handle,name,code");
    assert_eq!(lines[1], "north,North,N");
    assert_eq!(lines[2], "south,South,");
}

// ============================================================================
// Definition Management Tests
// ============================================================================

fn definition_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {
            "metaobjectDefinitionByType": {
                "id": "gid://shopify/MetaobjectDefinition/9",
                "type": "region",
                "name": "Region",
                "description": "Sales regions",
                "fieldDefinitions": [
                    {
                        "key": "name",
                        "name": "Name",
                        "required": true,
                        "type": {"name": "single_line_text_field"},
                        "validations": []
                    },
                    {
                        "key": "code",
                        "name": "Code",
                        "required": true,
                        "type": {"name": "single_line_text_field"},
                        "validations": [{"name": "max_length", "value": "3"}]
                    },
                    {
                        "key": "population",
                        "name": "Population",
                        "required": false,
                        "type": {"name": "number_integer"},
                        "validations": []
                    }
                ]
            }
        }
    }))
}

#[tokio::test]
async fn test_describe_partitions_fields_and_counts_types() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("metaobjectDefinitionByType"))
        .respond_with(definition_response())
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let description = loader.describe_metaobject_type("region").await.unwrap();

    assert_eq!(description.summary.total_fields, 3);
    assert_eq!(description.summary.required, vec!["name", "code"]);
    assert_eq!(description.summary.optional, vec!["population"]);
    assert_eq!(
        description.summary.field_types.get("single_line_text_field"),
        Some(&2)
    );
    assert_eq!(description.summary.field_types.get("number_integer"), Some(&1));
    assert!(description.to_string().contains("Metaobject type 'region'"));
}

#[tokio::test]
async fn test_describe_unknown_type_is_a_typed_lookup_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"metaobjectDefinitionByType": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let error = loader.describe_metaobject_type("ghost").await.unwrap_err();

    assert!(matches!(
        error,
        LoaderError::UnknownType { ref object_type } if object_type == "ghost"
    ));
}

#[tokio::test]
async fn test_create_definition_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("metaobjectDefinitionCreate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "metaobjectDefinitionCreate": {
                    "metaobjectDefinition": {
                        "id": "gid://shopify/MetaobjectDefinition/10",
                        "type": "region",
                        "name": "Region"
                    },
                    "userErrors": []
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let definition = MetaobjectDefinition::new("region", "Region")
        .with_field(FieldDefinition::new("name", "Name", "single_line_text_field").required());

    let loader = loader_against(&server);
    let id = loader.create_metaobject_definition(&definition).await.unwrap();
    assert_eq!(id, "gid://shopify/MetaobjectDefinition/10");
}

#[tokio::test]
async fn test_create_incomplete_definition_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // No fields at all: structurally incomplete
    let definition = MetaobjectDefinition::new("region", "Region");

    let loader = loader_against(&server);
    let error = loader
        .create_metaobject_definition(&definition)
        .await
        .unwrap_err();
    assert!(matches!(error, LoaderError::IncompleteDefinition { .. }));
}

#[tokio::test]
async fn test_update_definition_resolves_id_then_mutates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("metaobjectDefinitionByType"))
        .respond_with(definition_response())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({
            "variables": {"id": "gid://shopify/MetaobjectDefinition/9"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "metaobjectDefinitionUpdate": {
                    "metaobjectDefinition": {
                        "id": "gid://shopify/MetaobjectDefinition/9",
                        "type": "region",
                        "name": "Sales Region"
                    },
                    "userErrors": []
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    loader
        .update_metaobject_definition("region", json!({"name": "Sales Region"}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_metaobject_returns_deleted_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("metaobjectDelete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "metaobjectDelete": {
                    "deletedId": "gid://shopify/Metaobject/1",
                    "userErrors": []
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let deleted = loader
        .delete_metaobject("gid://shopify/Metaobject/1")
        .await
        .unwrap();
    assert_eq!(deleted, "gid://shopify/Metaobject/1");
}

// ============================================================================
// Statistics Tests
// ============================================================================

#[tokio::test]
async fn test_stats_count_field_population() {
    let server = MockServer::start().await;
    let nodes = [
        node(1, "north", json!([{"key": "name", "value": "North"}, {"key": "code", "value": "N"}])),
        node(2, "south", json!([{"key": "name", "value": "South"}])),
    ];
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(page(&nodes, false, None))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_against(&server);
    let stats = loader.get_metaobject_stats("region").await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.field_counts.get("name"), Some(&2));
    assert_eq!(stats.field_counts.get("code"), Some(&1));
}
