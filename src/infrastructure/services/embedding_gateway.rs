//! Embedding gateway: one question in, one fixed-width vector out

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::timeout::bounded;
use crate::domain::{DomainError, EmbeddingProvider, EmbeddingRequest};

#[derive(Debug, Clone)]
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    dimension: usize,
    timeout: Duration,
    /// Cancelled when the model stops producing the configured width
    shutdown: CancellationToken,
}

impl EmbeddingGateway {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            dimension,
            timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Share the process shutdown token: a width mismatch cancels it
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Whether the request must ask the model for shortened vectors
    fn needs_dimension_hint(&self) -> bool {
        self.provider.dimensions(&self.model) != Some(self.dimension)
    }

    /// Embed `text`.
    ///
    /// A vector of the wrong width is a configuration fault, never a cache miss:
    /// it fails the call and cancels the shutdown token so the process stops.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut request = EmbeddingRequest::single(&self.model, text);
        if self.needs_dimension_hint() {
            request = request.with_dimensions(self.dimension);
        }

        let response = bounded("embedding", self.timeout, self.provider.embed(request))
            .await
            .map_err(|e| match e {
                DomainError::Provider { .. } => DomainError::embedding(e.detail()),
                other => other,
            })?;

        let vector = response
            .into_first()
            .ok_or_else(|| DomainError::embedding("No embedding returned"))?;

        if vector.len() != self.dimension {
            error!(
                model = %self.model,
                returned = vector.len(),
                expected = self.dimension,
                "Embedding width does not match the cache; shutting down"
            );
            self.shutdown.cancel();
            return Err(DomainError::configuration(format!(
                "Embedding model {} returned {} dimensions, cache expects {}",
                self.model,
                vector.len(),
                self.dimension
            )));
        }

        debug!(model = %self.model, dimension = vector.len(), "Embedded text");

        Ok(vector)
    }

    /// Startup check: only a width mismatch is fatal, an unreachable provider is not
    pub async fn verify_dimension(&self) -> Result<(), DomainError> {
        match self.embed("dimension check").await {
            Ok(_) => Ok(()),
            Err(e @ DomainError::Configuration { .. }) => Err(e),
            Err(e) => {
                warn!(error = %e, "Embedding provider unreachable at startup; continuing");
                Ok(())
            }
        }
    }
}
