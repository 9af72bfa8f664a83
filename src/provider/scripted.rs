//! In-memory provider for tests. Replies are chosen by the first rule whose
//! needle appears in the request, and every request is recorded.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Provider;
use crate::wire::{CompletionRequest, Role};

enum Field {
    System,
    User,
}

struct Rule {
    field: Field,
    needle: String,
    reply: Result<String, String>,
}

#[derive(Default)]
pub struct Scripted {
    rules: Vec<Rule>,
    calls: Mutex<Vec<CompletionRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_system(mut self, needle: &str, reply: Result<&str, &str>) -> Self {
        self.rules.push(Rule {
            field: Field::System,
            needle: needle.to_string(),
            reply: reply.map(str::to_string).map_err(str::to_string),
        });
        self
    }

    pub fn on_user(mut self, needle: &str, reply: Result<&str, &str>) -> Self {
        self.rules.push(Rule {
            field: Field::User,
            needle: needle.to_string(),
            reply: reply.map(str::to_string).map_err(str::to_string),
        });
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for Scripted {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        self.calls.lock().push(req.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // let sibling tasks start before this one finishes
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let system = req.first(Role::System).unwrap_or_default();
        let user = req.first(Role::User).unwrap_or_default();
        let rule = self.rules.iter().find(|r| match r.field {
            Field::System => system.contains(&r.needle),
            Field::User => user.contains(&r.needle),
        });
        match rule {
            Some(r) => r.reply.clone().map_err(|e| anyhow!(e)),
            None => Err(anyhow!("scripted provider: no rule matched")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
