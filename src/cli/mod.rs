use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    #[value(alias = "anthropic")]
    Anthropic,
    #[value(alias = "ollama")]
    Ollama,
}

/// File read when no prompt argument is given.
pub const DEFAULT_PROMPT_FILE: &str = "prompt.md";

#[derive(Parser, Debug)]
#[command(name = "vibe_scaffold", version, about = "Generate a whole source tree from a plain-language app description")]
pub struct Args {
    /// App description, or a path to a `.md` file holding it.
    pub prompt: Option<String>,

    /// Target directory. Cleared before a full run.
    pub directory: Option<PathBuf>,

    /// Regenerate only this file (no reset, no dependency synthesis).
    pub file: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Upper bound on concurrent file generations.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// TOML config file. Defaults to `vibe.toml` when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Remove a surrounding ``` fence from generated files.
    #[arg(long, default_value_t = false)]
    pub strip_fences: bool,

    /// Save every request/reply pair under `.vibe/tx/<run-id>/`.
    #[arg(long, default_value_t = false)]
    pub save_transcripts: bool,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

/// Resolve the intent text: an explicit argument, else `prompt.md` in `cwd`.
/// Arguments ending in `.md` are read as plain text.
pub fn resolve_intent(arg: Option<&str>, cwd: &Path) -> Result<String> {
    let prompt = match arg {
        Some(p) => p.to_string(),
        None => {
            let fallback = cwd.join(DEFAULT_PROMPT_FILE);
            if !fallback.exists() {
                bail!("Please provide a prompt");
            }
            fallback.to_string_lossy().into_owned()
        }
    };

    if prompt.ends_with(".md") {
        let path = if Path::new(&prompt).is_absolute() {
            PathBuf::from(&prompt)
        } else {
            cwd.join(&prompt)
        };
        return fs::read_to_string(&path).with_context(|| format!("reading prompt file {}", path.display()));
    }
    Ok(prompt)
}
