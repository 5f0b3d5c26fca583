//! Data object helpers for `/v1/objects`

use std::sync::Arc;

use serde_json::Value;
use weavelink_core::SessionManager;
use weavelink_domain::beacon::parse_object_uuid;
use weavelink_domain::{Result, WeaveError};

const OBJECTS_PATH: &str = "/objects";

/// Object CRUD bound to a session.
#[derive(Debug, Clone)]
pub struct DataObject {
    session: Arc<SessionManager>,
}

impl DataObject {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// One object, `None` when it does not exist.
    ///
    /// `id` may be a UUID, a beacon or an object URL. `additional` names
    /// extra properties such as `vector` or `classification`.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for an id without a UUID,
    /// [`WeaveError::UnsuccessfulStatus`] for statuses other than 200/404.
    pub async fn get_by_id(&self, id: &str, additional: &[&str]) -> Result<Option<Value>> {
        let path = object_path(id)?;
        let response = self.session.get(&path, &include_param(additional)).await?;
        match response.status {
            200 => Ok(Some(response.json()?)),
            404 => Ok(None),
            status => Err(unsuccessful("Get object", status, response.body)),
        }
    }

    /// A page of objects. `offset` applies whether or not `limit` is set.
    ///
    /// # Errors
    /// Returns [`WeaveError::UnsuccessfulStatus`] for statuses other than 200.
    pub async fn get(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
        additional: &[&str],
    ) -> Result<Value> {
        let mut params = include_param(additional);
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        let response = self.session.get(OBJECTS_PATH, &params).await?;
        if response.status != 200 {
            return Err(unsuccessful("Get objects", response.status, response.body));
        }
        Ok(response.json()?)
    }

    /// # Errors
    /// Returns [`WeaveError::UnsuccessfulStatus`] for statuses other than
    /// 204/404.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let response = self.session.head(&object_path(id)?).await?;
        match response.status {
            204 | 200 => Ok(true),
            404 => Ok(false),
            status => Err(unsuccessful("Object exists", status, response.body)),
        }
    }

    /// # Errors
    /// Returns [`WeaveError::UnsuccessfulStatus`] for statuses other than 204.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let response = self.session.delete(&object_path(id)?, None).await?;
        if response.status != 204 {
            return Err(unsuccessful("Delete object", response.status, response.body));
        }
        Ok(())
    }
}

fn object_path(id: &str) -> Result<String> {
    Ok(format!("{OBJECTS_PATH}/{}", parse_object_uuid(id)?))
}

fn include_param(additional: &[&str]) -> Vec<(&'static str, String)> {
    if additional.is_empty() {
        return Vec::new();
    }
    vec![("include", additional.join(","))]
}

fn unsuccessful(context: &str, status: u16, body: String) -> WeaveError {
    WeaveError::UnsuccessfulStatus { context: context.to_string(), status, body }
}
