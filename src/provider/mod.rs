use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::wire::CompletionRequest;

pub mod anthropic;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub mod scripted;

/// A single chat completion round-trip. Returns the assistant's reply text.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> Result<String>;

    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn Provider>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider> {
    match cfg.provider {
        ProviderKind::OpenAI => {
            let key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow!("OPENAI_API_KEY env var is not set"))?;
            Ok(Arc::new(openai::OpenAIProvider::new(
                key,
                cfg.openai_url.clone(),
                cfg.timeout_secs,
            )))
        }
        ProviderKind::Anthropic => {
            let key = std::env::var("ANTHROPIC_API_KEY")
                .map_err(|_| anyhow!("ANTHROPIC_API_KEY env var is not set"))?;
            Ok(Arc::new(anthropic::Anthropic::new(key, cfg.timeout_secs)))
        }
        ProviderKind::Ollama => Ok(Arc::new(ollama::Ollama::new(
            cfg.ollama_url.clone(),
            cfg.timeout_secs,
        ))),
    }
}
