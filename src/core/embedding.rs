//! Embedding provider
//!
//! The recall engine treats embeddings as opaque vectors supplied by an
//! external service. `HttpEmbeddingProvider` talks to any OpenAI-compatible
//! `/embeddings` endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::MemoryError;

/// Source of similarity vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn model_name(&self) -> &str;
}

/// Embedding endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL, e.g. `https://api.openai.com/v1/`; unset disables semantic recall
    pub endpoint: Option<String>,
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
    /// Upper bound for a single embedding call during recall
    pub timeout_secs: u64,
    /// Texts per request when backfilling
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "text-embedding-3-small".to_string(),
            api_key_env: "TROVE_EMBEDDING_KEY".to_string(),
            timeout_secs: 5,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// HTTP client for an OpenAI-compatible embeddings API
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: Url,
    model: String,
    token: Option<String>,
}

impl HttpEmbeddingProvider {
    /// Build from config; `Ok(None)` when no endpoint is configured
    pub fn from_config(config: &EmbeddingConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Ok(None);
        };
        let token = std::env::var(&config.api_key_env).ok();
        Self::new(endpoint, &config.model, token, config.timeout_secs).map(Some)
    }

    pub fn new(endpoint: &str, model: &str, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|_| MemoryError::InvalidInput(format!("invalid embedding endpoint: {}", endpoint)))?;
        // Url::join drops the last segment unless the base ends with '/'
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            token,
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self
            .endpoint
            .join("embeddings")
            .context("Invalid embeddings path")?;

        let mut builder = self.client.post(url).json(&EmbeddingRequest {
            model: &self.model,
            input,
        });
        if let Some(ref token) = self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| MemoryError::ProviderUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MemoryError::ProviderUnavailable(format!(
                "embedding request failed: {}",
                resp.status()
            ))
            .into());
        }

        let mut body: EmbeddingResponse = resp
            .json()
            .await
            .context("Failed to parse embedding response")?;
        body.data.sort_by_key(|d| d.index);

        if body.data.len() != input.len() {
            return Err(MemoryError::ProviderUnavailable(format!(
                "expected {} embeddings, got {}",
                input.len(),
                body.data.len()
            ))
            .into());
        }

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| MemoryError::ProviderUnavailable("empty embedding response".into()).into())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Cosine similarity; 0.0 for empty, zero-norm or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let sim = dot / denom;
    if sim.is_nan() {
        0.0
    } else {
        sim.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_from_config_without_endpoint() {
        let provider = HttpEmbeddingProvider::from_config(&EmbeddingConfig::default()).unwrap();
        assert!(provider.is_none());
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = HttpEmbeddingProvider::new("not a url", "m", None, 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MemoryError>(),
            Some(MemoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let provider = HttpEmbeddingProvider::new("http://localhost:8080/v1", "m", None, 5).unwrap();
        assert_eq!(
            provider.endpoint.join("embeddings").unwrap().as_str(),
            "http://localhost:8080/v1/embeddings"
        );
        assert_eq!(provider.model_name(), "m");
    }
}
