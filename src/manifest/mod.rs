use fs_err as fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::completion::CompletionService;
use crate::errors::{GenError, GenResult};
use crate::plan::FilePlan;
use crate::prompt;
use crate::wire::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// Read from an existing file; synthesis was skipped.
    Stored(PathBuf),
    Synthesized,
    /// Nothing stored and nothing synthesized (single-file runs).
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyManifest {
    pub text: String,
    pub source: ManifestSource,
}

impl DependencyManifest {
    pub fn placeholder() -> Self {
        Self { text: "None".to_string(), source: ManifestSource::Placeholder }
    }
}

pub struct DependencySynthesizer {
    completion: Arc<CompletionService>,
    file_name: String,
    search_dirs: Vec<PathBuf>,
}

impl DependencySynthesizer {
    /// Stored manifests are looked up in `target` first, then `cwd`.
    pub fn new(completion: Arc<CompletionService>, file_name: &str, target: &Path, cwd: &Path) -> Self {
        Self {
            completion,
            file_name: file_name.to_string(),
            search_dirs: vec![target.to_path_buf(), cwd.to_path_buf()],
        }
    }

    /// Existing manifest file, if any. No staleness check against the plan.
    pub fn load_stored(&self) -> GenResult<Option<DependencyManifest>> {
        for dir in &self.search_dirs {
            let p = dir.join(&self.file_name);
            if p.is_file() {
                let text = fs::read_to_string(&p).map_err(|e| GenError::io(&p, e))?;
                tracing::debug!(path = %p.display(), "reusing stored dependency manifest");
                return Ok(Some(DependencyManifest { text, source: ManifestSource::Stored(p) }));
            }
        }
        Ok(None)
    }

    pub async fn synthesize_dependencies(
        &self,
        intent: &str,
        plan: &FilePlan,
        model: &str,
    ) -> GenResult<DependencyManifest> {
        if let Some(stored) = self.load_stored()? {
            return Ok(stored);
        }

        let text = self
            .completion
            .complete(
                Stage::Dependencies,
                model,
                &prompt::system_prompt_dependencies(intent, &plan.raw),
                &prompt::user_prompt_dependencies(intent),
                &[],
            )
            .await?;
        Ok(DependencyManifest { text, source: ManifestSource::Synthesized })
    }
}
