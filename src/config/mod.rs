use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Args, ProviderKind};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_DIR: &str = "generated";
pub const MANIFEST_FILE: &str = "shared_dependencies.md";
pub const CONFIG_FILE: &str = "vibe.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    pub max_tokens: u32,
    pub directory: PathBuf,
    pub manifest_file: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub strip_fences: bool,
    pub save_transcripts: bool,
    pub progress: bool,
    pub openai_url: String,
    pub ollama_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            directory: PathBuf::from(DEFAULT_DIR),
            manifest_file: MANIFEST_FILE.into(),
            concurrency: 8,
            timeout_secs: 600,
            strip_fences: false,
            save_transcripts: false,
            progress: true,
            openai_url: "https://api.openai.com/v1".into(),
            ollama_url: "http://localhost:11434".into(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (explicit path, or `vibe.toml` in `cwd`),
    /// then environment, then CLI flags.
    pub fn load(args: &Args, cwd: &Path) -> Result<Self> {
        let file = match &args.config {
            Some(p) => Some(p.clone()),
            None => {
                let p = cwd.join(CONFIG_FILE);
                p.exists().then_some(p)
            }
        };
        let mut cfg = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        cfg.apply_env();
        cfg.apply_args(args);
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.openai_url = url;
        }
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.provider {
            self.provider = p;
        }
        if let Some(m) = &args.model {
            self.model = m.clone();
        }
        if let Some(n) = args.max_tokens {
            self.max_tokens = n;
        }
        if let Some(d) = &args.directory {
            self.directory = d.clone();
        }
        if let Some(n) = args.concurrency {
            self.concurrency = n;
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        self.strip_fences |= args.strip_fences;
        self.save_transcripts |= args.save_transcripts;
        if args.no_progress {
            self.progress = false;
        }
        self.concurrency = self.concurrency.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_flags_override_file_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "model = \"gpt-4o\"\nconcurrency = 4\nstrip_fences = true\n",
        )
        .expect("write config");

        let args = Args::parse_from(["vibe_scaffold", "x", "out", "--concurrency", "2"]);
        let cfg = Config::load(&args, temp.path()).expect("load");
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.concurrency, 2);
        assert!(cfg.strip_fences);
        assert_eq!(cfg.directory, PathBuf::from("out"));
        assert_eq!(cfg.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let args = Args::parse_from(["vibe_scaffold", "x", "--concurrency", "0"]);
        let mut cfg = Config::default();
        cfg.apply_args(&args);
        assert_eq!(cfg.concurrency, 1);
    }
}
