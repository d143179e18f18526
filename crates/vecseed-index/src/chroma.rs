//! ChromaDB v2 REST backend.

use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::IndexError;
use crate::types::{AddRecords, CollectionInfo, CollectionSpec, DeleteOutcome};
use crate::vector_index::{BoxFuture, VectorIndex};

const API_PREFIX: [&str; 2] = ["api", "v2"];

#[derive(Debug, Clone)]
pub struct ChromaClient {
    client: reqwest::Client,
    base: Url,
    tenant: String,
    database: String,
}

impl ChromaClient {
    /// Create a client for the server at `base_url` scoped to one tenant and database.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn new(
        base_url: &str,
        tenant: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self, IndexError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(IndexError::Other(format!(
                "index URL cannot be a base: {base_url}"
            )));
        }
        Ok(Self {
            client: vecseed_llm::http::default_client(),
            base,
            tenant: tenant.into(),
            database: database.into(),
        })
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, IndexError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| IndexError::Other(format!("index URL cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    fn collections_endpoint(&self, tail: &[&str]) -> Result<Url, IndexError> {
        let mut segments = vec![
            "tenants",
            self.tenant.as_str(),
            "databases",
            self.database.as_str(),
            "collections",
        ];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    async fn read_success(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<String, IndexError> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }
        Err(IndexError::Api {
            operation,
            status: status.as_u16(),
            message: api_error_message(&text),
        })
    }

    async fn heartbeat_inner(&self) -> Result<u64, IndexError> {
        let url = self.endpoint(&["heartbeat"])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(format!("{}: {e}", self.base)))?;
        let text = Self::read_success("heartbeat", response).await?;
        let body: HeartbeatBody = serde_json::from_str(&text)?;
        Ok(body.nanosecond_heartbeat)
    }

    async fn delete_inner(&self, name: &str) -> Result<DeleteOutcome, IndexError> {
        let url = self.collections_endpoint(&[name])?;
        let response = self.client.delete(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            tracing::debug!(collection = name, "collection deleted");
            return Ok(DeleteOutcome::Deleted);
        }
        if status == reqwest::StatusCode::NOT_FOUND || names_missing_collection(&text) {
            return Ok(DeleteOutcome::NotFound);
        }
        Err(IndexError::Api {
            operation: "delete_collection",
            status: status.as_u16(),
            message: api_error_message(&text),
        })
    }

    async fn create_inner(&self, spec: &CollectionSpec) -> Result<CollectionInfo, IndexError> {
        let url = self.collections_endpoint(&[])?;
        let response = self
            .client
            .post(url)
            .json(&create_body(spec))
            .send()
            .await?;
        let text = Self::read_success("create_collection", response).await?;
        let info: CollectionInfo = serde_json::from_str(&text)?;
        tracing::debug!(collection = %info.name, id = %info.id, "collection created");
        Ok(info)
    }

    async fn get_inner(&self, name: &str) -> Result<CollectionInfo, IndexError> {
        let url = self.collections_endpoint(&[name])?;
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IndexError::CollectionNotFound(name.to_owned()));
        }
        let text = Self::read_success("get_collection", response).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn add_inner(
        &self,
        collection: &CollectionInfo,
        records: AddRecords,
    ) -> Result<(), IndexError> {
        records.check()?;
        let id = collection.id.to_string();
        let url = self.collections_endpoint(&[id.as_str(), "add"])?;
        let len = records.len();
        let response = self.client.post(url).json(&records).send().await?;
        Self::read_success("add", response).await?;
        tracing::debug!(collection = %collection.name, records = len, "records added");
        Ok(())
    }

    async fn count_inner(&self, collection: &CollectionInfo) -> Result<u64, IndexError> {
        let id = collection.id.to_string();
        let url = self.collections_endpoint(&[id.as_str(), "count"])?;
        let response = self.client.get(url).send().await?;
        let text = Self::read_success("count", response).await?;
        Ok(serde_json::from_str(text.trim())?)
    }
}

impl VectorIndex for ChromaClient {
    fn heartbeat(&self) -> BoxFuture<'_, Result<u64, IndexError>> {
        Box::pin(self.heartbeat_inner())
    }

    fn delete_collection(&self, name: &str) -> BoxFuture<'_, Result<DeleteOutcome, IndexError>> {
        let name = name.to_owned();
        Box::pin(async move { self.delete_inner(&name).await })
    }

    fn create_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<CollectionInfo, IndexError>> {
        let spec = spec.clone();
        Box::pin(async move { self.create_inner(&spec).await })
    }

    fn get_collection(&self, name: &str) -> BoxFuture<'_, Result<CollectionInfo, IndexError>> {
        let name = name.to_owned();
        Box::pin(async move { self.get_inner(&name).await })
    }

    fn add(
        &self,
        collection: &CollectionInfo,
        records: AddRecords,
    ) -> BoxFuture<'_, Result<(), IndexError>> {
        let collection = collection.clone();
        Box::pin(async move { self.add_inner(&collection, records).await })
    }

    fn count(&self, collection: &CollectionInfo) -> BoxFuture<'_, Result<u64, IndexError>> {
        let collection = collection.clone();
        Box::pin(async move { self.count_inner(&collection).await })
    }
}

fn create_body(spec: &CollectionSpec) -> serde_json::Value {
    json!({
        "name": spec.name,
        "configuration": {
            "hnsw": {
                "space": spec.hnsw.space,
                "ef_construction": spec.hnsw.ef_construction,
                "ef_search": spec.hnsw.ef_search,
            },
            "embedding_function": {
                "type": "known",
                "name": spec.embedding.provider,
                "config": {
                    "api_key_env_var": spec.embedding.api_key_env_var,
                    "model_name": spec.embedding.model,
                },
            },
        },
        "get_or_create": false,
    })
}

/// Chroma reports a missing collection either as 404 or as an error body
/// whose type or message names it.
fn names_missing_collection(body: &str) -> bool {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(b) => {
            b.error.as_deref() == Some("NotFoundError")
                || b.message.as_deref().is_some_and(|m| m.contains("does not exist"))
        }
        Err(_) => body.contains("does not exist"),
    }
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(m), ..
        }) => m,
        Ok(ApiErrorBody { error: Some(e), .. }) => e,
        _ => body.chars().take(200).collect(),
    }
}

#[derive(Deserialize)]
struct HeartbeatBody {
    #[serde(rename = "nanosecond heartbeat")]
    nanosecond_heartbeat: u64,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::types::{DistanceSpace, EmbeddingFunctionSpec, HnswParams};

    const COLLECTIONS: &str = "/api/v2/tenants/default_tenant/databases/default_database/collections";
    const ID: &str = "7c3b1d2e-0f4a-4b5c-9d6e-1a2b3c4d5e6f";

    fn client(server: &MockServer) -> ChromaClient {
        ChromaClient::new(&server.uri(), "default_tenant", "default_database").unwrap()
    }

    fn spec() -> CollectionSpec {
        CollectionSpec {
            name: "docs".into(),
            embedding: EmbeddingFunctionSpec {
                provider: "openai".into(),
                model: "text-embedding-3-small".into(),
                api_key_env_var: "OPENAI_API_KEY".into(),
            },
            hnsw: HnswParams::default(),
        }
    }

    fn info() -> CollectionInfo {
        CollectionInfo {
            id: ID.parse().unwrap(),
            name: "docs".into(),
        }
    }

    fn collection_json() -> serde_json::Value {
        serde_json::json!({
            "id": ID,
            "name": "docs",
            "tenant": "default_tenant",
            "database": "default_database",
            "metadata": null,
            "dimension": null
        })
    }

    #[test]
    fn new_rejects_relative_url() {
        assert!(ChromaClient::new("localhost:8000/x", "t", "d").is_err());
        assert!(ChromaClient::new("not a url", "t", "d").is_err());
    }

    #[test]
    fn endpoint_joins_segments_under_base_path() {
        let c = ChromaClient::new("http://chroma:8000/proxy/", "t", "d").unwrap();
        let url = c.collections_endpoint(&["docs"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://chroma:8000/proxy/api/v2/tenants/t/databases/d/collections/docs"
        );
    }

    #[test]
    fn create_body_matches_chroma_configuration() {
        let mut s = spec();
        s.hnsw.space = DistanceSpace::Ip;
        let body = create_body(&s);
        assert_eq!(body["name"], "docs");
        assert_eq!(body["get_or_create"], false);
        assert_eq!(body["configuration"]["hnsw"]["space"], "ip");
        assert_eq!(body["configuration"]["hnsw"]["ef_construction"], 200);
        assert_eq!(body["configuration"]["embedding_function"]["name"], "openai");
        assert_eq!(
            body["configuration"]["embedding_function"]["config"]["model_name"],
            "text-embedding-3-small"
        );
    }

    #[test]
    fn missing_collection_detection() {
        assert!(names_missing_collection(
            r#"{"error":"NotFoundError","message":"Collection [docs] does not exist"}"#
        ));
        assert!(names_missing_collection(
            r#"{"error":"ValueError","message":"Collection docs does not exist."}"#
        ));
        assert!(!names_missing_collection(
            r#"{"error":"InternalError","message":"disk full"}"#
        ));
        assert!(!names_missing_collection("boom"));
    }

    #[tokio::test]
    async fn heartbeat_reads_nanoseconds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/heartbeat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"nanosecond heartbeat": 1_712_345_678_u64})),
            )
            .mount(&server)
            .await;

        assert_eq!(client(&server).heartbeat().await.unwrap(), 1_712_345_678);
    }

    #[tokio::test]
    async fn heartbeat_connection_refused_is_unavailable() {
        let c = ChromaClient::new("http://127.0.0.1:1", "t", "d").unwrap();
        let err = c.heartbeat().await.unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }

    #[tokio::test]
    async fn heartbeat_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/heartbeat"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).heartbeat().await.unwrap_err();
        assert!(matches!(err, IndexError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn delete_existing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{COLLECTIONS}/docs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server).delete_collection("docs").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn delete_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{COLLECTIONS}/docs")))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "NotFoundError",
                "message": "Collection [docs] does not exist"
            })))
            .mount(&server)
            .await;

        let outcome = client(&server).delete_collection("docs").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn delete_missing_reported_as_bad_request_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "ValueError",
                "message": "Collection docs does not exist."
            })))
            .mount(&server)
            .await;

        let outcome = client(&server).delete_collection("docs").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn delete_500_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "InternalError",
                "message": "disk full"
            })))
            .mount(&server)
            .await;

        let err = client(&server).delete_collection("docs").await.unwrap_err();
        match err {
            IndexError::Api {
                operation,
                status,
                message,
            } => {
                assert_eq!(operation, "delete_collection");
                assert_eq!(status, 500);
                assert_eq!(message, "disk full");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_posts_configuration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COLLECTIONS))
            .and(body_partial_json(serde_json::json!({
                "name": "docs",
                "get_or_create": false,
                "configuration": {
                    "hnsw": {"space": "cosine", "ef_construction": 200, "ef_search": 200},
                    "embedding_function": {
                        "type": "known",
                        "name": "openai",
                        "config": {"api_key_env_var": "OPENAI_API_KEY"}
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection_json()))
            .expect(1)
            .mount(&server)
            .await;

        let created = client(&server).create_collection(&spec()).await.unwrap();
        assert_eq!(created, info());
    }

    #[tokio::test]
    async fn create_conflict_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COLLECTIONS))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": "UniqueConstraintError",
                "message": "Collection docs already exists"
            })))
            .mount(&server)
            .await;

        let err = client(&server).create_collection(&spec()).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::Api {
                operation: "create_collection",
                status: 409,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn get_collection_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{COLLECTIONS}/docs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(collection_json()))
            .mount(&server)
            .await;

        assert_eq!(client(&server).get_collection("docs").await.unwrap(), info());
    }

    #[tokio::test]
    async fn get_missing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).get_collection("docs").await.unwrap_err();
        assert!(matches!(err, IndexError::CollectionNotFound(name) if name == "docs"));
    }

    #[tokio::test]
    async fn add_posts_aligned_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/{ID}/add")))
            .and(body_json(serde_json::json!({
                "ids": ["faq-1"],
                "embeddings": [[0.5, 0.25]],
                "documents": ["Q: a A: b"],
                "metadatas": [{"source": "faq"}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let records = AddRecords {
            ids: vec!["faq-1".into()],
            embeddings: vec![vec![0.5, 0.25]],
            documents: vec!["Q: a A: b".into()],
            metadatas: vec![serde_json::json!({"source": "faq"})],
        };
        client(&server).add(&info(), records).await.unwrap();
    }

    #[tokio::test]
    async fn add_rejects_duplicate_ids_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let records = AddRecords {
            ids: vec!["a".into(), "a".into()],
            embeddings: vec![vec![0.0], vec![0.0]],
            documents: vec!["x".into(), "y".into()],
            metadatas: vec![serde_json::json!({}), serde_json::json!({})],
        };
        let err = client(&server).add(&info(), records).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidBatch(_)));
    }

    #[tokio::test]
    async fn count_parses_bare_integer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{COLLECTIONS}/{ID}/count")))
            .respond_with(ResponseTemplate::new(200).set_body_string("42"))
            .mount(&server)
            .await;

        assert_eq!(client(&server).count(&info()).await.unwrap(), 42);
    }
}
