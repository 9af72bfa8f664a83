use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::completion::CompletionService;
use crate::errors::GenResult;
use crate::manifest::DependencyManifest;
use crate::plan::FilePlan;
use crate::prompt;
use crate::wire::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    pub path: String,
    pub content: String,
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\A\s*```[^\n]*\n(.*?)\n?```\s*\z").expect("fence regex is valid")
    })
}

/// Unwrap a reply that is entirely one fenced block. Anything else, including
/// fences in the middle of the text, is returned unchanged.
pub fn strip_fences(content: &str) -> String {
    match fence_re().captures(content).and_then(|c| c.get(1)) {
        Some(body) => {
            let mut s = body.as_str().to_string();
            s.push('\n');
            s
        }
        None => content.to_string(),
    }
}

pub struct FileGenerator {
    completion: Arc<CompletionService>,
    strip_fences: bool,
}

impl FileGenerator {
    pub fn new(completion: Arc<CompletionService>, strip_fences: bool) -> Self {
        Self { completion, strip_fences }
    }

    pub async fn generate_file(
        &self,
        intent: &str,
        plan: &FilePlan,
        manifest: &DependencyManifest,
        path: &str,
        model: &str,
    ) -> GenResult<FileArtifact> {
        let system = prompt::system_prompt_codegen(intent, &plan.raw, &manifest.text);
        let user = prompt::user_prompt_codegen(intent, path);
        let reply = self.completion.complete(Stage::File, model, &system, &user, &[]).await?;

        let content = if self.strip_fences { strip_fences(&reply) } else { reply };
        Ok(FileArtifact { path: path.to_string(), content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::parse_plan;
    use crate::provider::scripted::Scripted;

    #[test]
    fn whole_reply_fence_is_removed() {
        let fenced = "```javascript\nconsole.log(\"hello world\")\n```\n";
        assert_eq!(strip_fences(fenced), "console.log(\"hello world\")\n");
    }

    #[test]
    fn inner_fences_are_left_alone() {
        let md = "# Readme\n\n```sh\nmake\n```\n";
        assert_eq!(strip_fences(md), md);
    }

    #[tokio::test]
    async fn fenced_output_is_kept_as_is_by_default() {
        let fenced = "```html\n<button>go</button>\n```";
        let provider = Arc::new(Scripted::new().on_user("the code for the file index.html", Ok(fenced)));
        let svc = Arc::new(CompletionService::new(provider, 100));
        let plan = parse_plan("['index.html']").expect("plan").0;

        let raw = FileGenerator::new(svc.clone(), false)
            .generate_file("app", &plan, &DependencyManifest::placeholder(), "index.html", "gpt-4")
            .await
            .expect("artifact");
        assert_eq!(raw.content, fenced);

        let stripped = FileGenerator::new(svc, true)
            .generate_file("app", &plan, &DependencyManifest::placeholder(), "index.html", "gpt-4")
            .await
            .expect("artifact");
        assert_eq!(stripped.content, "<button>go</button>\n");
    }
}
