//! Text encoding over HTTP
//!
//! The engine never runs embedding models itself: dense and sparse encodings
//! are consumed from a text-embeddings-inference style server exposing
//! `/embed` (dense) and `/embed_sparse` (sparse). Inputs longer than the
//! model's window are truncated server-side rather than rejected.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use skillscope_core::{DenseVector, Error, Result, SparseVector};
use skillscope_config::EncodingSettings;

/// Dual-encoding contract the retrieval pipeline depends on.
///
/// Both methods encode one text; hybrid search calls them concurrently.
#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// Encode into the dense semantic space.
    async fn encode_dense(&self, text: &str) -> Result<DenseVector>;

    /// Encode into the sparse lexical space.
    async fn encode_sparse(&self, text: &str) -> Result<SparseVector>;

    /// Dense dimension this encoder produces.
    fn dimension(&self) -> u64;

    /// Probe the encoding backend. Local encoders have nothing to check.
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: Vec<&'a str>,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct SparseEntry {
    index: u32,
    value: f32,
}

/// HTTP encoder backed by a text-embeddings-inference server.
pub struct HttpEncoder {
    client: reqwest::Client,
    base_url: String,
    dimension: u64,
}

impl HttpEncoder {
    /// Build an encoder from settings.
    ///
    /// The request timeout is fixed at client construction; individual
    /// encode calls carry no per-call deadline.
    pub fn new(settings: &EncodingSettings) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(ref api_key) = settings.api_key {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| Error::Encoding(format!("invalid API key header: {e}")))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Encoding(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            dimension: settings.vector_dimension,
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, text: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let body = EmbedRequest {
            inputs: vec![text],
            truncate: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Encoding(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Encoding(format!(
                "embedding server returned {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Encoding(format!("invalid response from {url}: {e}")))
    }
}

#[async_trait]
impl TextEncoder for HttpEncoder {
    async fn encode_dense(&self, text: &str) -> Result<DenseVector> {
        let mut batches: Vec<Vec<f32>> = self.post("/embed", text).await?;
        let values = batches
            .pop()
            .ok_or_else(|| Error::Encoding("empty dense embedding response".to_string()))?;

        if values.len() as u64 != self.dimension {
            return Err(Error::Encoding(format!(
                "server produced dimension {} but {} was configured",
                values.len(),
                self.dimension
            )));
        }

        debug!(dim = values.len(), "dense encoding received");
        Ok(DenseVector::from(values))
    }

    async fn encode_sparse(&self, text: &str) -> Result<SparseVector> {
        let mut batches: Vec<Vec<SparseEntry>> = self.post("/embed_sparse", text).await?;
        let entries = batches
            .pop()
            .ok_or_else(|| Error::Encoding("empty sparse embedding response".to_string()))?;

        let (indices, values): (Vec<u32>, Vec<f32>) =
            entries.into_iter().map(|e| (e.index, e.value)).unzip();
        let vector = SparseVector { indices, values };

        debug!(terms = vector.len(), "sparse encoding received");
        Ok(vector)
    }

    fn dimension(&self) -> u64 {
        self.dimension
    }

    async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Encoding(format!("health probe failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Encoding(format!(
                "embedding server unhealthy: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(url: &str, dimension: u64) -> EncodingSettings {
        EncodingSettings {
            url: url.to_string(),
            api_key: None,
            vector_dimension: dimension,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_encode_dense() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_partial_json(serde_json::json!({"truncate": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![vec![0.1, 0.2, 0.3]]))
            .mount(&server)
            .await;

        let encoder = HttpEncoder::new(&settings(&server.uri(), 3)).unwrap();
        let vector = encoder.encode_dense("welding").await.unwrap();
        assert_eq!(vector.values(), &[0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_encode_sparse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed_sparse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![vec![
                serde_json::json!({"index": 17, "value": 1.5}),
                serde_json::json!({"index": 9120, "value": 0.4}),
            ]]))
            .mount(&server)
            .await;

        let encoder = HttpEncoder::new(&settings(&server.uri(), 3)).unwrap();
        let vector = encoder.encode_sparse("welding").await.unwrap();
        assert_eq!(vector.indices, vec![17, 9120]);
        assert_eq!(vector.values, vec![1.5, 0.4]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_encoding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![vec![0.1, 0.2]]))
            .mount(&server)
            .await;

        let encoder = HttpEncoder::new(&settings(&server.uri(), 3)).unwrap();
        let err = encoder.encode_dense("welding").await.unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_health_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let encoder = HttpEncoder::new(&settings(&server.uri(), 3)).unwrap();
        encoder.health().await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_is_encoding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let encoder = HttpEncoder::new(&settings(&server.uri(), 3)).unwrap();
        let err = encoder.encode_dense("welding").await.unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
