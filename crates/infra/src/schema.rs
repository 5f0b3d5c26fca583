//! Schema helpers
//!
//! Thin mappings from class definitions to `/v1/schema` calls. Schema
//! validation itself is left to the server.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{info, instrument};
use weavelink_core::SessionManager;
use weavelink_domain::beacon::capitalize_first_letter;
use weavelink_domain::{Result, WeaveError};

const SCHEMA_PATH: &str = "/schema";

/// Schema operations bound to a session.
#[derive(Debug, Clone)]
pub struct Schema {
    session: Arc<SessionManager>,
}

impl Schema {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// The whole schema, or one class when `class_name` is given.
    ///
    /// # Errors
    /// Returns [`WeaveError::UnsuccessfulStatus`] for statuses other than 200.
    pub async fn get(&self, class_name: Option<&str>) -> Result<Value> {
        let path = match class_name {
            Some(name) => class_path(name)?,
            None => SCHEMA_PATH.to_string(),
        };
        let response = self.session.get(&path, &[]).await?;
        if response.status != 200 {
            return Err(unsuccessful("Get schema", response.status, response.body));
        }
        Ok(response.json()?)
    }

    /// Creates every class of a `{"classes": [...]}` document.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] when `classes` is missing, or the
    /// first error of [`Schema::create_classes`].
    pub async fn create(&self, schema: &Value) -> Result<()> {
        let classes = schema.get("classes").and_then(Value::as_array).ok_or_else(|| {
            WeaveError::InvalidInput("Schema must contain a 'classes' array".to_string())
        })?;
        self.create_classes(classes).await
    }

    /// Creates all classes concurrently and reports the first failure.
    ///
    /// # Errors
    /// The first error of [`Schema::create_class`].
    #[instrument(skip(self, classes), fields(count = classes.len()))]
    pub async fn create_classes(&self, classes: &[Value]) -> Result<()> {
        try_join_all(classes.iter().map(|class| self.create_class(class))).await?;
        info!("classes created");
        Ok(())
    }

    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for a definition without a
    /// `class` name, [`WeaveError::UnsuccessfulStatus`] for statuses other
    /// than 200.
    pub async fn create_class(&self, class: &Value) -> Result<()> {
        let name = class_name(class)?;
        let mut definition = class.clone();
        definition["class"] = Value::String(capitalize_first_letter(name));

        let response = self.session.post(SCHEMA_PATH, &definition).await?;
        if response.status != 200 {
            return Err(unsuccessful("Create class", response.status, response.body));
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`WeaveError::UnsuccessfulStatus`] for statuses other than 200.
    pub async fn delete_class(&self, class_name: &str) -> Result<()> {
        let response = self.session.delete(&class_path(class_name)?, None).await?;
        if response.status != 200 {
            return Err(unsuccessful("Delete class from schema", response.status, response.body));
        }
        Ok(())
    }

    /// Deletes every class in the schema.
    ///
    /// # Errors
    /// The first error of [`Schema::get`] or [`Schema::delete_class`].
    pub async fn delete_all(&self) -> Result<()> {
        for name in class_names(&self.get(None).await?) {
            self.delete_class(&name).await?;
        }
        Ok(())
    }

    /// Whether `class_name` exists, or whether any class exists when it is
    /// `None`.
    ///
    /// # Errors
    /// Any error of [`Schema::get`].
    pub async fn contains(&self, class_name: Option<&str>) -> Result<bool> {
        let names = class_names(&self.get(None).await?);
        Ok(match class_name {
            Some(name) => {
                let wanted = capitalize_first_letter(name);
                names.iter().any(|existing| *existing == wanted)
            }
            None => !names.is_empty(),
        })
    }
}

fn class_name(class: &Value) -> Result<&str> {
    class
        .get("class")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| WeaveError::InvalidInput("Class definition needs a 'class' name".to_string()))
}

fn class_names(schema: &Value) -> Vec<String> {
    schema
        .get("classes")
        .and_then(Value::as_array)
        .map(|classes| {
            classes
                .iter()
                .filter_map(|class| class.get("class").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn class_path(class_name: &str) -> Result<String> {
    if class_name.trim().is_empty() {
        return Err(WeaveError::InvalidInput("'class_name' must be a non-empty string".to_string()));
    }
    Ok(format!("{SCHEMA_PATH}/{}", urlencoding::encode(&capitalize_first_letter(class_name))))
}

fn unsuccessful(context: &str, status: u16, body: String) -> WeaveError {
    WeaveError::UnsuccessfulStatus { context: context.to_string(), status, body }
}
