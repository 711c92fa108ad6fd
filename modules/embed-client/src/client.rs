use std::time::Duration;

use tracing::{debug, warn};

use crate::error::EmbedError;
use crate::preprocess;
use crate::similarity::{self, SimilarityResult};

/// Vector length produced by the default inference model. Tied to that
/// model. Changing models requires re-validating this and the duplicate
/// threshold empirically.
pub const DEFAULT_DIMENSION: usize = 384;
/// Default duplicate-decision threshold, likewise model-tied.
pub const DEFAULT_THRESHOLD: f32 = 0.85;

/// Input cap of the inference model, in characters after cleaning.
const MAX_INPUT_CHARS: usize = 2000;
/// Below this the text carries no usable signal.
const MIN_INPUT_CHARS: usize = 10;

/// Items embedded concurrently per batch. Batches run sequentially to
/// stay under the endpoint's rate limits.
const BATCH_SIZE: usize = 8;
const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct EmbedClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    dimension: usize,
    threshold: f32,
    batch_delay: Duration,
}

impl EmbedClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build embedding HTTP client");
        Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            dimension: DEFAULT_DIMENSION,
            threshold: DEFAULT_THRESHOLD,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Pause between batches. Zero disables the pause; the per-batch
    /// concurrency bound stays either way.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Embed one text into a vector of the configured dimension.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let cleaned = preprocess::prepare(text, MAX_INPUT_CHARS);
        let len = cleaned.chars().count();
        if len < MIN_INPUT_CHARS {
            return Err(EmbedError::TooShort {
                len,
                min: MIN_INPUT_CHARS,
            });
        }

        debug!(chars = len, "embedding request");

        let body = serde_json::json!({
            "inputs": [cleaned],
            "options": { "wait_for_model": true, "use_cache": true },
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Upstream {
                code: status.as_u16(),
                message,
            });
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| EmbedError::ShapeMismatch(format!("non-JSON response: {e}")))?;

        let vector = parse_vector(&value)?;
        if vector.len() != self.dimension {
            return Err(EmbedError::ShapeMismatch(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                vector.len()
            )));
        }
        Ok(vector)
    }

    /// Embed many texts. Concurrent within each fixed-size batch,
    /// sequential across batches, and per-item: one failure never aborts
    /// its siblings.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Result<Vec<f32>, EmbedError>> {
        let mut results = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            let outcomes =
                futures::future::join_all(batch.iter().map(|t| self.embed(t))).await;
            for (text, outcome) in batch.iter().zip(outcomes.iter()) {
                if let Err(e) = outcome {
                    warn!(chars = text.len(), error = %e, "batch item failed to embed");
                }
            }
            results.extend(outcomes);
        }

        results
    }

    /// Compare two vectors using the client's configured threshold unless
    /// the caller overrides it.
    pub fn check_similarity(
        &self,
        a: &[f32],
        b: &[f32],
        threshold: Option<f32>,
    ) -> Result<SimilarityResult, EmbedError> {
        similarity::check_similarity(a, b, threshold.unwrap_or(self.threshold))
    }
}

/// Accept either the nested `[[v0..vN]]` single-input form or a flat
/// `[v0..vN]` array.
fn parse_vector(value: &serde_json::Value) -> Result<Vec<f32>, EmbedError> {
    let arr = value
        .as_array()
        .ok_or_else(|| EmbedError::ShapeMismatch("response is not an array".into()))?;

    let numbers = arr.first().and_then(|f| f.as_array()).unwrap_or(arr);

    numbers
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| EmbedError::ShapeMismatch("non-numeric vector entry".into()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_json(dim: usize, nested: bool) -> String {
        let inner: Vec<f32> = (0..dim).map(|i| (i as f32) / dim as f32).collect();
        if nested {
            serde_json::to_string(&vec![inner]).unwrap()
        } else {
            serde_json::to_string(&inner).unwrap()
        }
    }

    const LONG_TEXT: &str =
        "Belediye meclisi yeni ulaşım planını oyladı ve büyük çoğunlukla kabul etti.";

    #[tokio::test]
    async fn accepts_nested_response_shape() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embed")
            .with_status(200)
            .with_body(vector_json(384, true))
            .create_async()
            .await;

        let client = EmbedClient::new(&format!("{}/embed", server.url()), "key");
        let vector = client.embed(LONG_TEXT).await.unwrap();
        assert_eq!(vector.len(), 384);
    }

    #[tokio::test]
    async fn accepts_flat_response_shape() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embed")
            .with_status(200)
            .with_body(vector_json(384, false))
            .create_async()
            .await;

        let client = EmbedClient::new(&format!("{}/embed", server.url()), "key");
        let vector = client.embed(LONG_TEXT).await.unwrap();
        assert_eq!(vector.len(), 384);
    }

    #[tokio::test]
    async fn wrong_dimension_is_a_shape_mismatch() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embed")
            .with_status(200)
            .with_body(vector_json(3, true))
            .create_async()
            .await;

        let client = EmbedClient::new(&format!("{}/embed", server.url()), "key");
        let err = client.embed(LONG_TEXT).await.unwrap_err();
        assert!(matches!(err, EmbedError::ShapeMismatch(_)));
    }

    #[tokio::test]
    async fn short_text_fails_before_any_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embed")
            .expect(0)
            .create_async()
            .await;

        let client = EmbedClient::new(&format!("{}/embed", server.url()), "key");
        let err = client.embed("kısa").await.unwrap_err();
        assert!(matches!(err, EmbedError::TooShort { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embed")
            .with_status(503)
            .with_body("model loading")
            .create_async()
            .await;

        let client = EmbedClient::new(&format!("{}/embed", server.url()), "key");
        let err = client.embed(LONG_TEXT).await.unwrap_err();
        assert!(matches!(err, EmbedError::Upstream { code: 503, .. }));
    }

    #[tokio::test]
    async fn batch_failure_does_not_abort_siblings() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embed")
            .with_status(200)
            .with_body(vector_json(384, true))
            .expect_at_least(2)
            .create_async()
            .await;

        let client = EmbedClient::new(&format!("{}/embed", server.url()), "key")
            .with_batch_delay(Duration::ZERO);
        let texts = vec![
            LONG_TEXT.to_string(),
            "çok kısa".to_string(),
            LONG_TEXT.to_string(),
        ];
        let results = client.embed_batch(&texts).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EmbedError::TooShort { .. })));
        assert!(results[2].is_ok());
    }
}
