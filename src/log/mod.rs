use crate::wire::{CompletionRequest, Stage, Transcript};
use chrono::Utc;
use fs_err as fs;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Install the stderr tracing subscriber. `RUST_LOG` wins; otherwise `warn`,
/// or crate-level `debug` when `debug` is set.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "warn,vibe_scaffold=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

pub fn tx_dir(root: &Path, run_id: Uuid) -> PathBuf {
    root.join(".vibe").join("tx").join(run_id.to_string())
}

/// Writes one JSON file per completion into the run's transcript directory.
pub struct TranscriptLog {
    dir: PathBuf,
    run_id: Uuid,
    seq: AtomicUsize,
}

impl TranscriptLog {
    pub fn new(root: &Path, run_id: Uuid) -> Self {
        Self { dir: tx_dir(root, run_id), run_id, seq: AtomicUsize::new(0) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, stage: Stage, request: &CompletionRequest, reply: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let stage_name = match stage {
            Stage::Plan => "plan",
            Stage::Dependencies => "dependencies",
            Stage::File => "file",
        };
        let record = Transcript {
            run_id: self.run_id,
            stage,
            timestamp: Utc::now(),
            request: request.clone(),
            reply: reply.to_string(),
        };
        let p = self.dir.join(format!("{n:03}-{stage_name}.json"));
        fs::write(&p, to_string_pretty(&record)?)?;
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ChatMessage, Role};

    #[test]
    fn transcripts_are_numbered_per_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let run = Uuid::new_v4();
        let log = TranscriptLog::new(temp.path(), run);
        let req = CompletionRequest {
            model: "gpt-4".into(),
            messages: vec![ChatMessage::new(Role::User, "hi")],
            max_tokens: 10,
            temperature: 0.0,
        };

        let first = log.save(Stage::Plan, &req, "['a.js']").expect("save");
        let second = log.save(Stage::File, &req, "code").expect("save");

        assert_eq!(first, tx_dir(temp.path(), run).join("001-plan.json"));
        assert_eq!(second.file_name().and_then(|n| n.to_str()), Some("002-file.json"));
        let saved: Transcript = serde_json::from_str(&std::fs::read_to_string(&first).expect("read")).expect("json");
        assert_eq!(saved.reply, "['a.js']");
        assert_eq!(saved.run_id, run);
    }
}
