use colored::Colorize;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};

use crate::apply::WriteOutcome;
use crate::completion::Usage;
use crate::errors::GenError;
use crate::manifest::{DependencyManifest, ManifestSource};
use crate::orchestrator::{PipelineResult, RunMode};
use crate::plan::FilePlan;

pub fn show_intro(intent: &str) {
    println!("hi its me, {} you said you wanted:", "the vibe scaffolder".bold());
    println!("{}", intent.green());
}

pub fn show_plan(plan: &FilePlan) {
    println!("\n=== FILE PLAN ===");
    if plan.is_empty() {
        println!("(no files)");
        return;
    }
    for (i, p) in plan.paths.iter().enumerate() {
        println!("{}. {}", i + 1, p.cyan());
    }
    println!();
}

pub fn show_manifest(manifest: &DependencyManifest) {
    let origin = match &manifest.source {
        ManifestSource::Stored(p) => format!("reused from {}", p.display()),
        ManifestSource::Synthesized => "synthesized".to_string(),
        ManifestSource::Placeholder => "none".to_string(),
    };
    println!("=== SHARED DEPENDENCIES ({}) ===", origin.dimmed());
    println!("{}\n", manifest.text);
}

pub fn print_artifact(path: &str, content: &str, show_content: bool) {
    println!("{}", path.blue());
    if show_content {
        println!("{}", content);
    }
}

pub fn print_stage_failure(err: &GenError) {
    eprintln!("{} {}", "[FAILED]".red().bold(), err);
}

/// Hidden bar when `enabled` is false so callers never branch on it.
pub fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{spinner} generating [{bar:30}] {pos}/{len} {wide_msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

pub fn print_run_dashboard(result: &PipelineResult, usage: &Usage) {
    let ok = result.succeeded();
    let failed = result.failed();
    let bytes: u64 = result
        .outcomes
        .iter()
        .filter_map(|o| match &o.write {
            Some(WriteOutcome::Written { bytes, .. }) => Some(*bytes),
            _ => None,
        })
        .sum();

    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━ Run Results ━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}",
        "Planned".bold(), result.plan.len(),
        "Written".green().bold(), ok,
        "Failed".red().bold(), failed,
        "Bytes".bold(), format_size(bytes, DECIMAL)
    );
    println!(
        "  {}: {}   {}: ~{}   {}: ~{}",
        "LLM calls".cyan().bold(), usage.calls,
        "Prompt tokens".bold(), usage.prompt_tokens,
        "Reply tokens".bold(), usage.reply_tokens
    );
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());

    if matches!(result.mode, RunMode::Full) {
        if let Some(w) = &result.manifest_write {
            if let Some(e) = w.to_error("shared dependencies") {
                println!("{} {}", "[MANIFEST]".yellow().bold(), e);
            }
        }
    }

    for o in &result.outcomes {
        match o.error_message() {
            None => println!("{}  {}", "[OK]".green().bold(), o.path),
            Some(msg) => println!("{}  {}: {}", "[ERR]".red().bold(), o.path, msg),
        }
    }

    if failed == 0 {
        println!("\n{}", "done.".green().bold());
    } else {
        println!("\n{}", format!("finished with {failed} failed file(s).").yellow().bold());
    }
}
