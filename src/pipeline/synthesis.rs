//! Compare, resolve, summarize.
//!
//! Three calls, each fed the full output of the one before it.

use super::{PipelineError, RunContext};
use crate::models::{Question, Stage};
use tracing::info;

/// Calls the chain makes regardless of the repetition count.
pub const SYNTHESIS_CALLS: usize = 3;

/// Outputs of the three synthesis steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub comparison: String,
    pub final_answer: String,
    pub summary: String,
}

pub(crate) async fn synthesize(
    ctx: &RunContext<'_>,
    question: &Question,
    aggregated: &str,
) -> Result<Synthesis, PipelineError> {
    let templates = ctx.templates();
    let progress = ctx.progress();

    progress.on_stage(Stage::Comparing);
    let prompt = templates.comparison(ctx.settings().repetitions, question.as_str(), aggregated)?;
    let comparison = ctx.ask(Stage::Comparing, prompt).await?;
    info!("Comparison received");

    progress.on_stage(Stage::Resolving);
    let prompt = templates.final_answer(&comparison)?;
    let final_answer = ctx.ask(Stage::Resolving, prompt).await?;
    info!("Final answer resolved");

    progress.on_stage(Stage::Summarizing);
    let prompt = templates.summary(&final_answer)?;
    let summary = ctx.ask(Stage::Summarizing, prompt).await?;
    info!("Summary ready");

    Ok(Synthesis {
        comparison,
        final_answer,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::ScriptedEndpoint;
    use super::super::{Aggregator, PipelineSettings};
    use crate::prompts::TemplateSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_each_step_receives_previous_output() {
        let endpoint = Arc::new(ScriptedEndpoint::sentinels());
        let result = Aggregator::new(
            endpoint.clone(),
            PipelineSettings::default(),
            TemplateSet::default(),
        )
        .unwrap()
        .run("q")
        .await
        .unwrap()
        .unwrap();

        let prompts = endpoint.prompts();
        let synthesis = &prompts[prompts.len() - 3..];

        assert!(synthesis[0].ends_with("'''raw-0'''checked-0'''raw-1'''checked-1'''"));
        assert!(synthesis[1].ends_with("<<<comparison>>>"));
        assert!(synthesis[2].ends_with(": final"));

        assert_eq!(result.comparison, "comparison");
        assert_eq!(result.final_answer, "final");
        assert_eq!(result.summary, "summary");
    }

    #[tokio::test]
    async fn test_comparison_mentions_repetition_count() {
        let endpoint = Arc::new(ScriptedEndpoint::sentinels());
        let settings = PipelineSettings {
            repetitions: 3,
            ..PipelineSettings::default()
        };
        Aggregator::new(endpoint.clone(), settings, TemplateSet::default())
            .unwrap()
            .run("Why is the sky blue?")
            .await
            .unwrap();

        let prompts = endpoint.prompts();
        let comparison = &prompts[prompts.len() - 3];
        assert!(comparison.contains("investigating the 3 answers"));
        assert!(comparison.contains("[[Why is the sky blue?]]"));
    }
}
