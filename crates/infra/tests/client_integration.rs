//! Integration tests for the async client facade
//!
//! **Coverage:**
//! - Readiness and liveness probes, including unreachable servers
//! - Meta endpoint
//! - Schema create / contains / delete_all round trip
//! - Data object get, paging, exists and delete
//! - Close semantics

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use support::mount_anonymous;
use weavelink_core::{HttpRequest, HttpResponse, Transport, TransportError};
use weavelink_domain::{TimeoutConfig, WeaveError};
use weavelink_infra::Client;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ID: &str = "fc7eb129-f138-457f-b727-1b29db191a67";

async fn anonymous_client() -> (MockServer, Client) {
    let server = MockServer::start().await;
    mount_anonymous(&server).await;
    let client = Client::builder(server.uri()).build().await.unwrap();
    (server, client)
}

#[tokio::test]
async fn probes_report_server_state() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/ready"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/live"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(client.is_ready().await.unwrap());
    assert!(!client.is_live().await.unwrap());
}

/// Answers discovery, then refuses every other connection.
struct RefusingTransport;

#[async_trait]
impl Transport for RefusingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.url.ends_with("/.well-known/openid-configuration") {
            return Ok(HttpResponse::new(404, ""));
        }
        Err(TransportError::Connect("connection refused".to_string()))
    }
}

#[tokio::test]
async fn unreachable_server_is_neither_ready_nor_live() {
    let client = Client::builder("http://localhost:8080")
        .transport(Arc::new(RefusingTransport))
        .build()
        .await
        .unwrap();

    assert!(!client.is_ready().await.unwrap());
    assert!(!client.is_live().await.unwrap());

    match client.get_meta().await.unwrap_err() {
        WeaveError::Connection(msg) => assert!(msg.starts_with("Cannot connect to weaviate."), "{msg}"),
        other => panic!("expected Connection, got {other:?}"),
    }
}

#[tokio::test]
async fn build_fails_when_discovery_is_unreachable() {
    let err = Client::builder("http://127.0.0.1:1").build().await.unwrap_err();
    assert!(matches!(err, WeaveError::Connection(_)), "{err:?}");
}

#[tokio::test]
async fn meta_errors_carry_context() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("GET"))
        .and(path("/v1/meta"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client.get_meta().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().starts_with("Meta endpoint!"), "{err}");
}

#[tokio::test]
async fn schema_round_trip() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "classes": [{"class": "Article"}, {"class": "Author"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/schema/Article"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/schema/Author"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let schema = client.schema();
    schema
        .create(&json!({"classes": [{"class": "article"}, {"class": "Author"}]}))
        .await
        .unwrap();

    assert!(schema.contains(Some("article")).await.unwrap());
    assert!(!schema.contains(Some("Publication")).await.unwrap());
    assert!(schema.contains(None).await.unwrap());

    schema.delete_all().await.unwrap();

    let created: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
        .filter_map(|body| body["class"].as_str().map(str::to_string))
        .collect();
    assert!(created.contains(&"Article".to_string()), "class names are capitalized: {created:?}");
}

#[tokio::test]
async fn schema_rejects_documents_without_classes() {
    let (_server, client) = anonymous_client().await;

    let err = client.schema().create(&json!({"types": []})).await.unwrap_err();
    assert!(matches!(err, WeaveError::InvalidInput(_)));
}

#[tokio::test]
async fn data_object_lookup() {
    let (server, client) = anonymous_client().await;
    let object_path = format!("/v1/objects/{ID}");
    Mock::given(method("GET"))
        .and(path(object_path.as_str()))
        .and(query_param("include", "vector,classification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": ID, "class": "Article"})))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(object_path.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let data = client.data_object();
    let beacon = format!("weaviate://localhost/Article/{ID}");

    let found = data.get_by_id(&beacon, &["vector", "classification"]).await.unwrap().unwrap();
    assert_eq!(found["class"], "Article");
    assert!(data.exists(ID).await.unwrap());
}

#[tokio::test]
async fn missing_objects_are_none() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/objects/{ID}").as_str()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(format!("/v1/objects/{ID}").as_str()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let data = client.data_object();
    assert!(data.get_by_id(ID, &[]).await.unwrap().is_none());
    assert!(!data.exists(ID).await.unwrap());
    assert!(matches!(data.get_by_id("nope", &[]).await, Err(WeaveError::InvalidInput(_))));
}

#[tokio::test]
async fn offset_is_sent_without_limit() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("GET"))
        .and(path("/v1/objects"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objects": []})))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.data_object().get(None, Some(20), &[]).await.unwrap();
    assert_eq!(page["objects"], json!([]));
}

#[tokio::test]
async fn delete_expects_no_content() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/v1/objects/{ID}").as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.data_object().delete(ID).await.unwrap();
}

#[tokio::test]
async fn slow_responses_time_out() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("GET"))
        .and(path("/v1/meta"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    client.set_timeout(TimeoutConfig::new(
        std::time::Duration::from_secs(1),
        std::time::Duration::from_millis(200),
    ));
    let err = client.get_meta().await.unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn closed_client_rejects_calls() {
    let (server, client) = anonymous_client().await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .and(body_partial_json(json!({"class": "Article"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client.close().await;
    client.close().await;

    let err = client.schema().create_class(&json!({"class": "Article"})).await.unwrap_err();
    assert!(matches!(err, WeaveError::Config(_)), "{err:?}");
}
