//! Bulk import demo
//!
//! Loads the client configuration from the environment (or a config file),
//! creates an `Article` class and imports a few thousand generated objects
//! with a dynamically sized batch.
//!
//! ```text
//! WEAVELINK_URL=http://localhost:8080 LOG_FORMAT=json \
//!     cargo run -p weavelink-infra --example bulk_import
//! ```

use anyhow::Context;
use serde_json::json;
use tracing::{info, warn};
use weavelink_core::BatchConfigPatch;
use weavelink_infra::config;
use weavelink_infra::observability::{init_tracing, LogFormat};
use weavelink_infra::Client;

const OBJECT_COUNT: usize = 2_500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format: LogFormat = std::env::var("LOG_FORMAT").unwrap_or_default().parse()?;
    init_tracing(format)?;

    let config = config::load().context("failed to load client configuration")?;
    let client = Client::from_config(config).await.context("failed to connect")?;

    if !client.is_ready().await? {
        anyhow::bail!("server at {} is not ready", client.session().base_url());
    }
    let meta = client.get_meta().await?;
    info!(version = %meta["version"], "connected");

    let schema = client.schema();
    if !schema.contains(Some("Article")).await? {
        schema
            .create_class(&json!({
                "class": "Article",
                "properties": [
                    {"name": "title", "dataType": ["text"]},
                    {"name": "wordCount", "dataType": ["int"]}
                ]
            }))
            .await?;
    }

    let mut batch = client.batch();
    batch
        .configure(
            &BatchConfigPatch::new()
                .batch_size(Some(100))
                .dynamic(true)
                .timeout_retries(3)
                .raise_on_item_error(false)
                .callback(|results, _items| {
                    let failed = results
                        .iter()
                        .filter(|r| weavelink_domain::errors::has_item_error(r))
                        .count();
                    if failed > 0 {
                        warn!(failed, "objects rejected by the server");
                    }
                }),
        )
        .await?;

    for i in 0..OBJECT_COUNT {
        batch
            .add_object(
                "Article",
                &json!({"title": format!("Article {i}"), "wordCount": i * 10}),
                None,
                None,
            )
            .await?;
    }
    batch.flush().await?;

    info!(
        objects = OBJECT_COUNT,
        recommended = batch.recommended_num_objects(),
        "import finished"
    );
    client.close().await;
    Ok(())
}
