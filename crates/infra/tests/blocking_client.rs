//! Integration tests for the blocking client
//!
//! The mock server runs on its own multi-threaded runtime so the blocking
//! client can own the calling thread.

#[path = "support.rs"]
mod support;

use serde_json::json;
use tokio::runtime::Runtime;
use weavelink_core::BatchConfigPatch;
use weavelink_domain::{Credential, WeaveError};
use weavelink_infra::blocking::Client;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread().worker_threads(1).enable_all().build().unwrap()
}

#[test]
fn blocking_client_reads_meta_and_schema() {
    let runtime = server_runtime();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        support::mount_anonymous(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1.19.0"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/schema"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"classes": [{"class": "Article"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    });

    let client = Client::builder(server.uri()).build().unwrap();

    assert!(client.is_ready().unwrap());
    assert_eq!(client.get_meta().unwrap()["version"], "1.19.0");
    assert!(client.schema().contains(Some("article")).unwrap());
    assert!(client.get_open_id_configuration().unwrap().is_none());

    client.close();
    assert!(matches!(client.get_meta(), Err(WeaveError::Config(_))));
    drop(client);
    drop(server);
}

#[test]
fn blocking_client_authenticates_and_batches() {
    let runtime = server_runtime();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        support::mount_issuer(&server, &["client_credentials"]).await;
        Mock::given(method("POST"))
            .and(path(support::TOKEN_PATH))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(support::token_body("tok", 300)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/batch/objects"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"result": {}}, {"result": {}}, {"result": {}}])),
            )
            .expect(1)
            .mount(&server)
            .await;
        server
    });

    let client = Client::builder(server.uri())
        .configure(|builder| builder.credential(Credential::client_credentials("secret")))
        .build()
        .unwrap();

    let mut batch = client.batch();
    batch.configure(&BatchConfigPatch::new().batch_size(Some(3))).unwrap();
    for i in 0..3 {
        batch.add_object("Article", &json!({"n": i}), None, None).unwrap();
    }
    assert_eq!(batch.shape(), (0, 0));

    drop(batch);
    drop(client);
    runtime.block_on(server.verify());
}
