use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use uuid::Uuid;

mod apply;
mod cli;
mod completion;
mod config;
mod errors;
mod generate;
mod literal;
mod log;
mod manifest;
mod orchestrator;
mod plan;
mod prompt;
mod provider;
mod safety;
mod ux;
mod wire;

use completion::CompletionService;
use orchestrator::{GenerationRequest, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::Args::parse();
    log::init_tracing(args.debug);

    let cwd = std::env::current_dir().context("reading working directory")?;
    let cfg = config::Config::load(&args, &cwd)?;

    let intent = match cli::resolve_intent(args.prompt.as_deref(), &cwd) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };
    ux::show_intro(&intent);

    let provider = provider::make_provider(&cfg)?;
    let mut completion = CompletionService::new(provider, cfg.max_tokens);
    if cfg.save_transcripts {
        let transcripts = log::TranscriptLog::new(&cwd, Uuid::new_v4());
        tracing::info!(dir = %transcripts.dir().display(), "saving transcripts");
        completion = completion.with_transcripts(transcripts);
    }
    let completion = Arc::new(completion);
    tracing::debug!(provider = completion.provider_name(), model = %cfg.model, "starting run");

    let pipeline = Pipeline::new(&cfg, completion.clone(), &cwd).show_content(args.debug);
    let req = GenerationRequest {
        intent,
        target_directory: cfg.directory.clone(),
        model: cfg.model.clone(),
        single_file: args.file.clone(),
    };

    let code = match pipeline.run(&req).await {
        Ok(result) => {
            ux::print_run_dashboard(&result, &completion.usage());
            if result.failed() == 0 { 0 } else { 1 }
        }
        Err(e) => {
            ux::print_stage_failure(&e);
            if e.is_fatal() { 2 } else { 1 }
        }
    };
    std::process::exit(code);
}
