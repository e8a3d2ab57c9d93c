// Translation gateway
//
// Backends perform the actual translation and may fail:
// - Http: POST to a remote translation service
// - Passthrough: local identity transform
//
// The gateway wraps a backend with a timeout and absorbs every failure,
// so callers always get displayable text back.

pub mod gateway;
pub mod http;
pub mod passthrough;

use async_trait::async_trait;
use std::sync::Arc;

pub use gateway::{Translation, TranslationGateway, TranslationStatus};
use crate::config::{BackendKind, TranslateConfig};
use crate::error::Result;
use crate::language::LanguageTag;

/// A service able to translate text into a target language
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate `text` into `target`
    async fn translate(&self, text: &str, target: LanguageTag) -> Result<String>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Factory for creating backend instances
pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend based on the configured kind
    pub fn create_backend(config: &TranslateConfig) -> Result<Arc<dyn TranslationBackend>> {
        match config.backend {
            BackendKind::Http => Ok(Arc::new(http::HttpBackend::new(config)?)),
            BackendKind::Passthrough => Ok(Arc::new(passthrough::PassthroughBackend)),
        }
    }

    /// Create a gateway around the configured backend
    pub fn create_gateway(config: &TranslateConfig) -> Result<TranslationGateway> {
        let backend = Self::create_backend(config)?;
        Ok(TranslationGateway::new(backend, config.timeout()))
    }
}
