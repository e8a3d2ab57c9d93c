use async_trait::async_trait;

use crate::error::Result;
use crate::language::LanguageTag;
use super::TranslationBackend;

/// Returns the text unchanged. Used when no translation service is available.
pub struct PassthroughBackend;

#[async_trait]
impl TranslationBackend for PassthroughBackend {
    async fn translate(&self, text: &str, _target: LanguageTag) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
