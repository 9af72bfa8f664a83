use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::wire::{CompletionRequest, Role};
use super::Provider;

pub struct Anthropic {
    pub api_key: String,
    pub timeout: Duration,
    pub api_base: String,
    pub api_version: String,
}

impl Anthropic {
    pub fn new(api_key: String, timeout_secs: u64) -> Self {
        Self {
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            api_base: "https://api.anthropic.com".into(),
            api_version: "2023-06-01".into(),
        }
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

/// The messages API takes the system prompt out of band; everything else keeps
/// its position and role.
fn split_system(req: &CompletionRequest) -> (Option<String>, Vec<Msg<'_>>) {
    let mut system: Option<String> = None;
    let mut rest = Vec::with_capacity(req.messages.len());
    for m in &req.messages {
        if m.role == Role::System {
            match system.as_mut() {
                Some(s) => {
                    s.push_str("\n\n");
                    s.push_str(&m.content);
                }
                None => system = Some(m.content.clone()),
            }
        } else {
            rest.push(Msg { role: m.role.as_str(), content: &m.content });
        }
    }
    (system, rest)
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let client = Client::builder().timeout(self.timeout).build()?;
        let (system, messages) = split_system(req);
        let body = MsgRequest {
            model: &req.model,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
            messages,
            system,
        };

        tracing::debug!(%url, model = %req.model, "anthropic: POST");

        let resp = client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .context("anthropic request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("anthropic read body failed")?;
        tracing::trace!(%status, body = %text, "anthropic: raw response");

        if !status.is_success() {
            return Err(anyhow!("Anthropic API error ({}): {}", status, text));
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("anthropic response parse error: {}", e))?;

        parsed
            .content
            .into_iter()
            .find(|b| b.r#type == "text" || !b.text.is_empty())
            .map(|b| b.text)
            .ok_or_else(|| anyhow!("anthropic: empty content"))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ChatMessage;

    #[test]
    fn system_message_is_lifted_out_of_the_turn_list() {
        let req = CompletionRequest {
            model: "claude".into(),
            messages: vec![
                ChatMessage::new(Role::System, "sys"),
                ChatMessage::new(Role::User, "hi"),
                ChatMessage::new(Role::Assistant, "prior"),
            ],
            max_tokens: 10,
            temperature: 0.0,
        };
        let (system, rest) = split_system(&req);
        assert_eq!(system.as_deref(), Some("sys"));
        let roles: Vec<_> = rest.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant"]);
    }
}
