//! Resource Manager
//!
//! CRUD over HTTP for any resource kind in the registry, plus the
//! name-or-UUID resolver built on top of `list` and `get`.

use super::model::Resource;
use super::registry::{BodyFormat, ResourceKind};
use crate::api::http::Body;
use crate::api::SolumClient;
use crate::error::{Error, Result};
use reqwest::Method;
use serde_json::Value;

/// How a caller identifies a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// A server identifier; always a direct GET
    Id(&'a str),
    /// Either a UUID or a human name; names cost one full `list`
    NameOrId(&'a str),
}

/// CRUD adapter bound to one resource kind and base path
pub struct ResourceManager<'a> {
    client: &'a SolumClient,
    kind: &'static ResourceKind,
    base_path: String,
}

impl<'a> ResourceManager<'a> {
    /// Create a manager, filling `{param}` placeholders of the kind's base path
    pub fn new(
        client: &'a SolumClient,
        kind: &'static ResourceKind,
        params: &[(&str, &str)],
    ) -> Result<Self> {
        let mut base_path = kind.base_path.clone();
        for (name, value) in params {
            base_path = base_path.replace(
                &format!("{{{}}}", name),
                &urlencoding::encode(value),
            );
        }

        if base_path.contains('{') {
            return Err(Error::Validation(format!(
                "Missing parameter for {} path {}",
                kind.display_name, kind.base_path
            )));
        }

        Ok(Self {
            client,
            kind,
            base_path,
        })
    }

    pub fn kind(&self) -> &'static ResourceKind {
        self.kind
    }

    pub fn collection_url(&self) -> String {
        self.client
            .url(&format!("{}/{}", self.base_path, self.kind.collection_key))
    }

    pub fn resource_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(id))
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// List the whole collection, `filters` passed as query parameters
    pub async fn list(&self, filters: &[(&str, &str)]) -> Result<Vec<Resource>> {
        let url = format!("{}{}", self.collection_url(), encode_query(filters));
        let body = self.send(Method::GET, &url, Body::Empty).await?;
        unwrap_collection(body, &self.kind.collection_key)
    }

    pub async fn get(&self, id: &str) -> Result<Resource> {
        let body = self
            .send(Method::GET, &self.resource_url(id), Body::Empty)
            .await?;
        self.single(body)
    }

    /// Create a resource from structured fields
    pub async fn create(&self, fields: &Value) -> Result<Resource> {
        let body = self.encode(fields)?;
        let response = self.send(Method::POST, &self.collection_url(), body).await?;
        self.single(response)
    }

    /// Create a resource from a raw YAML/JSON document, sent verbatim
    pub async fn create_document(&self, text: &str) -> Result<Resource> {
        let response = self
            .send(Method::POST, &self.collection_url(), self.document(text))
            .await?;
        self.single(response)
    }

    pub async fn update(&self, id: &str, fields: &Value) -> Result<Resource> {
        let body = self.encode(fields)?;
        let response = self.send(Method::PUT, &self.resource_url(id), body).await?;
        self.single(response)
    }

    pub async fn update_document(&self, id: &str, text: &str) -> Result<Resource> {
        let response = self
            .send(Method::PUT, &self.resource_url(id), self.document(text))
            .await?;
        self.single(response)
    }

    pub async fn patch(&self, id: &str, fields: &Value) -> Result<Resource> {
        let body = self.encode(fields)?;
        let response = self.send(Method::PATCH, &self.resource_url(id), body).await?;
        self.single(response)
    }

    /// Delete a resource; deleting twice fails the second time
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.send(Method::DELETE, &self.resource_url(id), Body::Empty)
            .await?;
        Ok(())
    }

    /// Build/run log entries of one resource
    pub async fn logs(&self, id: &str) -> Result<Vec<Resource>> {
        let url = format!("{}/logs/", self.resource_url(id));
        let body = self.send(Method::GET, &url, Body::Empty).await?;
        unwrap_collection(body, "logs")
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Every resource whose attributes all equal the given values
    pub async fn findall(&self, filters: &[(&str, &str)]) -> Result<Vec<Resource>> {
        let resources = self.list(&[]).await?;
        Ok(filter_resources(resources, filters))
    }

    /// Exactly one resource matching the filters
    pub async fn findone(&self, filters: &[(&str, &str)]) -> Result<Resource> {
        let mut matches = self.findall(filters).await?;

        match matches.len() {
            0 => Err(Error::NotFound(format!(
                "No {} matching {}.",
                self.kind.display_name,
                describe_filters(filters)
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::NotUnique(self.kind.display_name.clone())),
        }
    }

    /// Resolve a resource by identifier or by name
    pub async fn find(&self, lookup: Lookup<'_>) -> Result<Resource> {
        match lookup {
            Lookup::Id(id) => self.get(id).await,
            Lookup::NameOrId(value) if value.is_empty() => Err(Error::Validation(format!(
                "A {} name or UUID is required",
                self.kind.display_name
            ))),
            Lookup::NameOrId(value) if is_uuid_like(value) => self.get(value).await,
            Lookup::NameOrId(value) => {
                tracing::debug!(
                    "Resolving {} by {} = {}",
                    self.kind.display_name,
                    self.kind.name_field,
                    value
                );
                self.findone(&[(self.kind.name_field.as_str(), value)]).await
            }
        }
    }

    // =========================================================================
    // Wire helpers
    // =========================================================================

    async fn send(&self, method: Method, url: &str, body: Body) -> Result<Value> {
        // YAML kinds announce their content type even on bodiless requests
        let mut headers = Vec::new();
        if matches!(body, Body::Empty) && self.kind.format == BodyFormat::Yaml {
            headers.push(("Content-Type", self.kind.format.content_type()));
        }

        let response = self.client.request(method, url, body, &headers).await?;
        self.decode(&response.body)
    }

    fn encode(&self, fields: &Value) -> Result<Body> {
        match self.kind.format {
            BodyFormat::Json => Ok(Body::Json(fields.clone())),
            BodyFormat::Yaml => Ok(self.document(&serde_yaml::to_string(fields)?)),
        }
    }

    fn document(&self, text: &str) -> Body {
        Body::Document {
            content_type: self.kind.format.content_type().to_string(),
            text: text.to_string(),
        }
    }

    fn decode(&self, text: &str) -> Result<Value> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let parsed = match self.kind.format {
            BodyFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            BodyFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        };

        parsed.map_err(|reason| {
            Error::Decode(format!(
                "Could not load {}. Reason: {}",
                self.kind.display_name, reason
            ))
        })
    }

    fn single(&self, body: Value) -> Result<Resource> {
        unwrap_single(body, &self.kind.key).ok_or_else(|| {
            Error::Decode(format!(
                "Could not load {}. Reason: response is not an object",
                self.kind.display_name
            ))
        })
    }
}

/// Normalize a bare list, `{collection_key: [...]}` or `{"values": [...]}`
/// into a flat sequence of resources
pub fn unwrap_collection(body: Value, collection_key: &str) -> Result<Vec<Resource>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(mut map) => {
            let inner = map
                .remove(collection_key)
                .or_else(|| map.remove("values"));
            match inner {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::Decode(format!(
                        "Unexpected response: no '{}' collection",
                        collection_key
                    )))
                }
            }
        }
        other => {
            return Err(Error::Decode(format!(
                "Unexpected response: expected a collection, got {}",
                other
            )))
        }
    };

    items
        .into_iter()
        .filter(|item| !item.is_null())
        .map(|item| {
            Resource::from_value(item)
                .ok_or_else(|| Error::Decode("Unexpected response: collection entry is not an object".to_string()))
        })
        .collect()
}

/// Unwrap `{key: {...}}`, otherwise take the object as-is
pub fn unwrap_single(body: Value, key: &str) -> Option<Resource> {
    match body {
        Value::Object(mut map) if map.len() == 1 && map.get(key).is_some_and(|v| v.is_object()) => {
            map.remove(key).and_then(Resource::from_value)
        }
        other => Resource::from_value(other),
    }
}

/// Keep resources whose attributes all match exactly; resources missing an
/// attribute are dropped
pub fn filter_resources(resources: Vec<Resource>, filters: &[(&str, &str)]) -> Vec<Resource> {
    resources
        .into_iter()
        .filter(|resource| {
            filters
                .iter()
                .all(|(attr, value)| resource.scalar_text(attr).as_deref() == Some(*value))
        })
        .collect()
}

/// True when the value is a UUID in any standard textual form
pub fn is_uuid_like(value: &str) -> bool {
    uuid::Uuid::try_parse(value).is_ok()
}

fn encode_query(filters: &[(&str, &str)]) -> String {
    if filters.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = filters
        .iter()
        .map(|(key, value)| {
            format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
        })
        .collect();

    format!("?{}", parts.join("&"))
}

fn describe_filters(filters: &[(&str, &str)]) -> String {
    filters
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}
