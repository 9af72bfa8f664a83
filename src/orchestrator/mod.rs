//! Pipeline driver.
//!
//! Full run: plan, reset the target directory, resolve the dependency
//! manifest, persist it, then generate every planned file concurrently (at
//! most `concurrency` in flight) and write each success. Per-file failures are
//! collected, never propagated. Single-file run: plan, then generate and write
//! one file; no reset and no manifest synthesis.

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::apply::{self, WriteOutcome};
use crate::completion::CompletionService;
use crate::config::Config;
use crate::errors::{GenError, GenResult};
use crate::generate::{FileArtifact, FileGenerator};
use crate::manifest::{DependencyManifest, DependencySynthesizer};
use crate::plan::{FilePlan, FilePlanner};
use crate::ux;
use crate::wire::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Planning,
    DependencyResolution,
    Generating,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Full,
    SingleFile,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub intent: String,
    pub target_directory: PathBuf,
    pub model: String,
    pub single_file: Option<String>,
}

#[derive(Debug)]
pub struct FileOutcome {
    pub path: String,
    pub result: GenResult<FileArtifact>,
    /// `None` when generation failed and nothing was written.
    pub write: Option<WriteOutcome>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok() && self.write.as_ref().is_some_and(WriteOutcome::is_written)
    }

    pub fn error_message(&self) -> Option<String> {
        if let Err(e) = &self.result {
            return Some(e.to_string());
        }
        self.write.as_ref().and_then(|w| w.to_error(&self.path)).map(|e| e.to_string())
    }
}

#[derive(Debug)]
pub struct PipelineResult {
    pub mode: RunMode,
    pub plan: FilePlan,
    pub manifest: DependencyManifest,
    pub manifest_write: Option<WriteOutcome>,
    /// One entry per generated path, in plan order.
    pub outcomes: Vec<FileOutcome>,
}

impl PipelineResult {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

pub struct Pipeline {
    completion: Arc<CompletionService>,
    planner: FilePlanner,
    generator: FileGenerator,
    manifest_file: String,
    concurrency: usize,
    cwd: PathBuf,
    progress: bool,
    show_content: bool,
    states: Mutex<Vec<PipelineState>>,
}

impl Pipeline {
    pub fn new(cfg: &Config, completion: Arc<CompletionService>, cwd: &Path) -> Self {
        Self {
            planner: FilePlanner::new(completion.clone()),
            generator: FileGenerator::new(completion.clone(), cfg.strip_fences),
            completion,
            manifest_file: cfg.manifest_file.clone(),
            concurrency: cfg.concurrency.max(1),
            cwd: cwd.to_path_buf(),
            progress: cfg.progress,
            show_content: false,
            states: Mutex::new(Vec::new()),
        }
    }

    /// Echo generated file contents to stdout as they are written.
    pub fn show_content(mut self, yes: bool) -> Self {
        self.show_content = yes;
        self
    }

    /// States entered so far, oldest first.
    pub fn states(&self) -> Vec<PipelineState> {
        self.states.lock().clone()
    }

    fn enter(&self, state: PipelineState) {
        tracing::debug!(?state, "pipeline state");
        self.states.lock().push(state);
    }

    pub async fn run(&self, req: &GenerationRequest) -> GenResult<PipelineResult> {
        self.enter(PipelineState::Planning);
        let plan = match self.planner.plan_files(&req.intent, &req.model).await {
            Ok(p) => p,
            Err(e) => {
                self.enter(PipelineState::Failed);
                return Err(e);
            }
        };
        ux::show_plan(&plan);

        let result = match &req.single_file {
            Some(path) => self.run_single(req, plan, path).await,
            None => self.run_full(req, plan).await,
        };
        match &result {
            Ok(_) => self.enter(PipelineState::Done),
            Err(_) => self.enter(PipelineState::Failed),
        }
        result
    }

    async fn run_single(&self, req: &GenerationRequest, plan: FilePlan, path: &str) -> GenResult<PipelineResult> {
        if !plan.contains(path) {
            tracing::warn!(%path, "requested file is not in the plan; generating it anyway");
        }
        let synth = self.synthesizer(req);
        let manifest = synth.load_stored()?.unwrap_or_else(DependencyManifest::placeholder);

        self.enter(PipelineState::Generating);
        let result = self.generator.generate_file(&req.intent, &plan, &manifest, path, &req.model).await;
        let outcome = self.persist(path, result, &req.target_directory);

        Ok(PipelineResult {
            mode: RunMode::SingleFile,
            plan,
            manifest,
            manifest_write: None,
            outcomes: vec![outcome],
        })
    }

    async fn run_full(&self, req: &GenerationRequest, plan: FilePlan) -> GenResult<PipelineResult> {
        self.enter(PipelineState::DependencyResolution);
        let synth = self.synthesizer(req);

        // a stored manifest inside the target must be read before the reset wipes it
        let stored = synth.load_stored()?;
        apply::reset_dir(&req.target_directory, &self.cwd)?;
        let manifest = match stored {
            Some(m) => m,
            None => synth.synthesize_dependencies(&req.intent, &plan, &req.model).await?,
        };
        ux::show_manifest(&manifest);

        let manifest_write = apply::write_file(&self.manifest_file, &manifest.text, &req.target_directory);
        if let Some(e) = manifest_write.to_error(&self.manifest_file) {
            tracing::warn!(error = %e, "dependency manifest not persisted");
        }

        self.enter(PipelineState::Generating);
        let results = self.fan_out(req, &plan, &manifest).await;

        let outcomes = plan
            .paths
            .iter()
            .zip(results)
            .map(|(path, result)| self.persist(path, result, &req.target_directory))
            .collect();

        Ok(PipelineResult {
            mode: RunMode::Full,
            plan,
            manifest,
            manifest_write: Some(manifest_write),
            outcomes,
        })
    }

    /// Generate every planned file with at most `concurrency` calls in flight.
    /// Results come back in plan order no matter which task finished first.
    async fn fan_out(
        &self,
        req: &GenerationRequest,
        plan: &FilePlan,
        manifest: &DependencyManifest,
    ) -> Vec<GenResult<FileArtifact>> {
        let bar = ux::progress_bar(plan.len() as u64, self.progress);

        let tasks = plan.paths.iter().enumerate().map(|(i, path)| async move {
            let result = self.generator.generate_file(&req.intent, plan, manifest, path, &req.model).await;
            (i, result)
        });
        let mut done = stream::iter(tasks).buffer_unordered(self.concurrency);

        let mut slots: Vec<Option<GenResult<FileArtifact>>> = plan.paths.iter().map(|_| None).collect();
        while let Some((i, result)) = done.next().await {
            bar.inc(1);
            if let Err(e) = &result {
                tracing::warn!(path = %plan.paths[i], error = %e, "file generation failed");
            }
            slots[i] = Some(result);
        }
        bar.finish_and_clear();

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(GenError::Completion { stage: Stage::File, message: "task produced no result".into() })
                })
            })
            .collect()
    }

    fn persist(&self, path: &str, result: GenResult<FileArtifact>, dir: &Path) -> FileOutcome {
        let write = match &result {
            Ok(artifact) => {
                ux::print_artifact(&artifact.path, &artifact.content, self.show_content);
                let w = apply::write_file(&artifact.path, &artifact.content, dir);
                if let Some(e) = w.to_error(&artifact.path) {
                    tracing::warn!(error = %e, "artifact not written");
                }
                Some(w)
            }
            Err(_) => None,
        };
        FileOutcome { path: path.to_string(), result, write }
    }

    fn synthesizer(&self, req: &GenerationRequest) -> DependencySynthesizer {
        DependencySynthesizer::new(self.completion.clone(), &self.manifest_file, &req.target_directory, &self.cwd)
    }
}
