//! HTTP gateway to the remote content store.
//!
//! Every call is one blocking request with the API token in the `token` query
//! parameter. Responses with a status of 300 or above are returned as
//! transport errors carrying the status and body; nothing is retried.

use crate::config::Connection;
use docsync_engine::{
    store::require_id, CollectionName, DocumentStore, EntryQuery, Error, Map, Result, Revision,
    Value,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const LIST_COLLECTIONS: &str = "/api/collections/listCollections";
const GET_ENTRIES: &str = "/api/collections/get/";
const SAVE_ENTRY: &str = "/api/collections/save/";

#[derive(Deserialize)]
struct EntriesResponse {
    #[serde(default)]
    entries: Vec<Value>,
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    data: &'a Value,
}

#[derive(Deserialize)]
struct SaveResponse {
    data: SavedEntry,
}

#[derive(Deserialize)]
struct SavedEntry {
    #[serde(rename = "_modified")]
    modified: Revision,
}

/// [`DocumentStore`] backed by the remote collections API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpStore {
    pub fn new(connection: Connection) -> Result<Self> {
        let base_url = Url::parse(&connection.base_url).map_err(|e| {
            Error::Validation(format!("invalid base URL '{}': {}", connection.base_url, e))
        })?;
        let client = Client::builder()
            .timeout(connection.timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: connection.token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Validation(format!("invalid API path '{}': {}", path, e)))?;
        url.query_pairs_mut().append_pair("token", &self.token);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        tracing::debug!(%method, path, "api request");
        Ok(self.client.request(method, self.endpoint(path)?))
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "api error");
            return Err(Error::Transport(format!(
                "API error {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json()
            .map_err(|e| Error::Transport(format!("invalid response body: {}", e)))
    }
}

/// Request body of an entry query. The filter is left out when empty.
fn query_body(query: &EntryQuery) -> Value {
    let mut body = Map::new();
    if !query.filter.is_empty() {
        let filter: Map = query.filter.iter().cloned().collect();
        body.insert("filter", Value::from(filter));
    }
    if let Some(limit) = query.limit {
        body.insert("limit", Value::from(limit as u64));
    }
    Value::from(body)
}

impl DocumentStore for HttpStore {
    fn list_collections(&self) -> Result<Vec<CollectionName>> {
        self.send(self.request(Method::GET, LIST_COLLECTIONS)?)
    }

    fn fetch_entries(&self, collection: &str, query: &EntryQuery) -> Result<Vec<Value>> {
        let path = format!("{}{}", GET_ENTRIES, collection);
        let request = self.request(Method::POST, &path)?.json(&query_body(query));
        let response: EntriesResponse = self.send(request)?;
        Ok(response.entries)
    }

    fn save_document(&self, collection: &str, content: &Value) -> Result<Revision> {
        require_id(content)?;
        let path = format!("{}{}", SAVE_ENTRY, collection);
        let request = self
            .request(Method::POST, &path)?
            .json(&SaveRequest { data: content });
        let response: SaveResponse = self.send(request)?;
        Ok(response.data.modified)
    }

    fn save_target(&self, collection: &str) -> String {
        format!("{}{}", SAVE_ENTRY, collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store(base_url: &str) -> Result<HttpStore> {
        HttpStore::new(Connection {
            base_url: base_url.into(),
            token: "s3cret".into(),
            timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn endpoint_carries_token() {
        let store = store("https://cms.example.com").unwrap();
        let url = store.endpoint("/api/collections/get/posts").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.example.com/api/collections/get/posts?token=s3cret"
        );
    }

    #[test]
    fn invalid_base_url() {
        assert!(matches!(store("not a url"), Err(Error::Validation(_))));
    }

    #[test]
    fn query_body_shape() {
        let body = query_body(&EntryQuery::by_id("a"));
        assert_eq!(
            body,
            Value::from(serde_json::json!({"filter": {"_id": "a"}, "limit": 1}))
        );
        assert_eq!(
            query_body(&EntryQuery::new()),
            Value::from(serde_json::json!({}))
        );
    }

    #[test]
    fn save_target_is_the_api_path() {
        let store = store("https://cms.example.com").unwrap();
        assert_eq!(store.save_target("posts"), "/api/collections/save/posts");
    }
}
