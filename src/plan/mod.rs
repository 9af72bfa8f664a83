use std::collections::HashSet;
use std::sync::Arc;

use crate::completion::CompletionService;
use crate::errors::{GenError, GenResult};
use crate::literal;
use crate::prompt;
use crate::wire::Stage;

/// Ordered, duplicate-free list of relative paths to generate.
///
/// `raw` is the model reply the plan was parsed from. Downstream prompts embed
/// it verbatim so every sibling sees the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    pub raw: String,
    pub paths: Vec<String>,
}

impl FilePlan {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

/// Parse a planner reply. The reply must be a list (or tuple) of strings;
/// anything else is a `PlanParse` error. Repeated paths keep their first
/// position and are reported back as warnings.
pub fn parse_plan(raw: &str) -> GenResult<(FilePlan, Vec<String>)> {
    let fail = |reason: String| GenError::PlanParse { raw: raw.to_string(), reason };

    let value = literal::parse(raw).map_err(|e| fail(e.to_string()))?;
    let items = value
        .as_sequence()
        .ok_or_else(|| fail(format!("expected a list of strings, got a {}", value.kind())))?;

    let mut warnings = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut paths = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = match item {
            literal::Literal::Str(s) => s.as_str(),
            other => return Err(fail(format!("element {i} is a {}, not a string", other.kind()))),
        };
        if seen.insert(path) {
            paths.push(path.to_string());
        } else {
            warnings.push(format!("dropped duplicate entry for {}", path));
        }
    }

    Ok((FilePlan { raw: raw.to_string(), paths }, warnings))
}

pub struct FilePlanner {
    completion: Arc<CompletionService>,
}

impl FilePlanner {
    pub fn new(completion: Arc<CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn plan_files(&self, intent: &str, model: &str) -> GenResult<FilePlan> {
        let raw = self
            .completion
            .complete(Stage::Plan, model, &prompt::system_prompt_plan(), &prompt::user_prompt_plan(intent), &[])
            .await?;

        let (plan, warnings) = parse_plan(&raw)?;
        for w in warnings {
            tracing::warn!("{}", w);
        }
        tracing::debug!(files = plan.len(), "file plan parsed");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::scripted::Scripted;

    #[test]
    fn valid_list_keeps_length_and_order() {
        let (plan, warnings) = parse_plan("['index.html', 'src/app.js', 'styles/main.css']").expect("plan");
        assert_eq!(plan.paths, vec!["index.html", "src/app.js", "styles/main.css"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn tuple_reply_is_accepted() {
        let (plan, _) = parse_plan("('a.py', 'b.py')").expect("plan");
        assert_eq!(plan.paths, vec!["a.py", "b.py"]);
    }

    #[test]
    fn duplicates_are_dropped_in_place() {
        let (plan, warnings) = parse_plan("['a.js', 'b.js', 'a.js']").expect("plan");
        assert_eq!(plan.paths, vec!["a.js", "b.js"]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn non_list_and_non_string_replies_fail() {
        for raw in ["'index.html'", "['a.js', 3]", "Sure! ['a.js']", "[None]", "{}"] {
            match parse_plan(raw) {
                Err(GenError::PlanParse { raw: kept, .. }) => assert_eq!(kept, raw),
                other => panic!("{raw:?} should not parse: {other:?}"),
            }
        }
    }

    #[test]
    fn empty_list_is_a_valid_empty_plan() {
        let (plan, _) = parse_plan("[]").expect("plan");
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn planner_issues_one_call_and_keeps_raw_reply() {
        let provider = Arc::new(Scripted::new().on_system("exhaustive list of filepaths", Ok("['index.html']")));
        let svc = Arc::new(CompletionService::new(provider.clone(), 100));
        let plan = FilePlanner::new(svc).plan_files("a single HTML page with a button", "gpt-4").await.expect("plan");

        assert_eq!(plan.paths, vec!["index.html"]);
        assert_eq!(plan.raw, "['index.html']");
        assert_eq!(provider.call_count(), 1);
    }
}
