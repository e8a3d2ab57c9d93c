use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{CharlaError, Result};
use crate::language::LanguageTag;
use super::TranslationBackend;

#[derive(Debug, Clone, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target: LanguageTag,
}

#[derive(Debug, Clone, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Translation service reached over HTTP.
///
/// Sends `{ "text", "target" }` and expects `{ "text" }` back.
pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            url: config.url(),
        })
    }
}

#[async_trait]
impl TranslationBackend for HttpBackend {
    async fn translate(&self, text: &str, target: LanguageTag) -> Result<String> {
        debug!("Sending translation request to: {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&TranslateRequest { text, target })
            .send()
            .await
            .map_err(|e| CharlaError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CharlaError::Translation(format!(
                "Translation service error {}: {}",
                status, error_text
            )));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| CharlaError::Translation(format!("Failed to parse response: {}", e)))?;

        match body.text {
            Some(translated) if !translated.trim().is_empty() => Ok(translated),
            _ => Err(CharlaError::Translation(
                "Empty translation received".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config_for(server: &mockito::ServerGuard) -> TranslateConfig {
        TranslateConfig {
            endpoint: server.url(),
            ..TranslateConfig::default()
        }
    }

    #[tokio::test]
    async fn test_successful_translation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/tools/translate")
            .match_body(Matcher::Json(serde_json::json!({
                "text": "Hello!",
                "target": "es"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":"¡Hola!"}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&config_for(&server)).unwrap();
        let out = backend.translate("Hello!", LanguageTag::Es).await.unwrap();

        assert_eq!(out, "¡Hola!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_translation_whitespace_is_preserved() {
        let mut server = mockito::Server::new_async().await;
        let _padded = server
            .mock("POST", "/api/tools/translate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":"  ¡Hola!\n"}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&config_for(&server)).unwrap();
        let out = backend.translate("Hello!", LanguageTag::Es).await.unwrap();

        assert_eq!(out, "  ¡Hola!\n");
    }

    #[tokio::test]
    async fn test_blank_translation_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _blank = server
            .mock("POST", "/api/tools/translate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":"   "}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&config_for(&server)).unwrap();
        assert!(backend.translate("Hello!", LanguageTag::Es).await.is_err());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/tools/translate")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let backend = HttpBackend::new(&config_for(&server)).unwrap();
        let err = backend.translate("Hello!", LanguageTag::Es).await.unwrap_err();

        assert!(matches!(err, CharlaError::Translation(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _garbage = server
            .mock("POST", "/api/tools/translate")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let backend = HttpBackend::new(&config_for(&server)).unwrap();
        assert!(backend.translate("Hello!", LanguageTag::Es).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_text_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _empty = server
            .mock("POST", "/api/tools/translate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"ok"}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(&config_for(&server)).unwrap();
        assert!(backend.translate("Hello!", LanguageTag::Es).await.is_err());
    }
}
