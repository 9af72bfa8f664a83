use parking_lot::Mutex;

use crate::errors::{GenError, GenResult};
use crate::log::TranscriptLog;
use crate::provider::DynProvider;
use crate::wire::{ChatMessage, CompletionRequest, Role, Stage};

const PREVIEW_CHARS: usize = 50;

/// Estimated token totals for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub calls: usize,
    pub failures: usize,
    pub prompt_tokens: usize,
    pub reply_tokens: usize,
}

/// Rough estimate: ~4 chars per token
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

pub fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().nth(PREVIEW_CHARS).is_some() {
        out.push_str("...");
    }
    out
}

/// System, user, then prior turns. Prior turn roles go by position only:
/// even indices are assistant, odd indices are user.
pub fn build_messages(system: &str, user: &str, prior_turns: &[String]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(prior_turns.len() + 2);
    messages.push(ChatMessage::new(Role::System, system));
    messages.push(ChatMessage::new(Role::User, user));
    for (i, turn) in prior_turns.iter().enumerate() {
        let role = if i % 2 == 0 { Role::Assistant } else { Role::User };
        messages.push(ChatMessage::new(role, turn.as_str()));
    }
    messages
}

/// Wraps the provider with message assembly, fixed decoding parameters and
/// token accounting. Shared by every stage of a run.
pub struct CompletionService {
    provider: DynProvider,
    max_tokens: u32,
    usage: Mutex<Usage>,
    transcripts: Option<TranscriptLog>,
}

impl CompletionService {
    pub fn new(provider: DynProvider, max_tokens: u32) -> Self {
        Self { provider, max_tokens, usage: Mutex::new(Usage::default()), transcripts: None }
    }

    pub fn with_transcripts(mut self, log: TranscriptLog) -> Self {
        self.transcripts = Some(log);
        self
    }

    pub fn usage(&self) -> Usage {
        *self.usage.lock()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn complete(
        &self,
        stage: Stage,
        model: &str,
        system: &str,
        user: &str,
        prior_turns: &[String],
    ) -> GenResult<String> {
        let req = CompletionRequest {
            model: model.to_string(),
            messages: build_messages(system, user, prior_turns),
            max_tokens: self.max_tokens,
            temperature: 0.0,
        };

        let mut prompt_tokens = 0;
        for m in &req.messages {
            let tokens = estimate_tokens(&m.content);
            prompt_tokens += tokens;
            tracing::info!(%stage, role = m.role.as_str(), tokens, preview = %preview(&m.content), "prompt message");
        }

        let result = self.provider.complete(&req).await;

        {
            let mut usage = self.usage.lock();
            usage.calls += 1;
            usage.prompt_tokens += prompt_tokens;
            match &result {
                Ok(reply) => usage.reply_tokens += estimate_tokens(reply),
                Err(_) => usage.failures += 1,
            }
        }

        let reply = result.map_err(|e| GenError::Completion { stage, message: format!("{e:#}") })?;

        if let Some(log) = &self.transcripts {
            if let Err(e) = log.save(stage, &req, &reply) {
                tracing::warn!(error = %e, "could not save transcript");
            }
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::scripted::Scripted;
    use std::sync::Arc;

    #[test]
    fn prior_turns_alternate_starting_with_assistant() {
        let turns = vec!["a0".to_string(), "u1".to_string(), "a2".to_string()];
        let roles: Vec<Role> = build_messages("sys", "usr", &turns).iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(80);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(50)));
    }

    #[tokio::test]
    async fn request_is_deterministic_and_accounted() {
        let provider = Arc::new(Scripted::new().on_system("sys", Ok("reply text")));
        let svc = CompletionService::new(provider.clone(), 1234);

        let reply = svc.complete(Stage::Plan, "gpt-4", "sys", "usr", &[]).await.expect("reply");
        assert_eq!(reply, "reply text");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.0);
        assert_eq!(calls[0].max_tokens, 1234);
        assert_eq!(calls[0].model, "gpt-4");

        let usage = svc.usage();
        assert_eq!(usage.calls, 1);
        assert_eq!(usage.failures, 0);
        assert!(usage.prompt_tokens > 0);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_completion_error() {
        let provider = Arc::new(Scripted::new().on_system("sys", Err("503 upstream")));
        let svc = CompletionService::new(provider.clone(), 100);

        let err = svc.complete(Stage::Dependencies, "gpt-4", "sys", "usr", &[]).await.expect_err("fails");
        match err {
            GenError::Completion { stage, message } => {
                assert_eq!(stage, Stage::Dependencies);
                assert!(message.contains("503 upstream"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(provider.call_count(), 1);
        assert_eq!(svc.usage().failures, 1);
    }
}
