//! The repetition loop: ask, then double-check, R times.

use super::{PipelineError, RunContext};
use crate::models::{Question, RepetitionOutcome, Stage};
use futures::future::try_join_all;
use tracing::info;

/// Produce one outcome per repetition, ordered by repetition index.
///
/// Repetitions never read each other's output. With `parallel` set they run
/// concurrently, and results are still returned by index.
pub(crate) async fn run_repetitions(
    ctx: &RunContext<'_>,
    question: &Question,
) -> Result<Vec<RepetitionOutcome>, PipelineError> {
    let repetitions = ctx.settings().repetitions;

    if ctx.settings().parallel {
        info!("Running {} repetitions concurrently", repetitions);
        for index in 0..repetitions {
            ctx.progress().on_stage(Stage::Repeating(index));
        }
        try_join_all((0..repetitions).map(|index| ask_and_check(ctx, question, index))).await
    } else {
        let mut outcomes = Vec::with_capacity(repetitions);
        for index in 0..repetitions {
            ctx.progress().on_stage(Stage::Repeating(index));
            outcomes.push(ask_and_check(ctx, question, index).await?);
        }
        Ok(outcomes)
    }
}

async fn ask_and_check(
    ctx: &RunContext<'_>,
    question: &Question,
    index: usize,
) -> Result<RepetitionOutcome, PipelineError> {
    let stage = Stage::Repeating(index);
    let templates = ctx.templates();

    let raw = ctx
        .ask(stage, templates.initial(question.as_str())?)
        .await?;
    let checked = ctx
        .ask(stage, templates.double_checker(question.as_str(), &raw)?)
        .await?;

    info!("Repetition {} answered and double-checked", index + 1);

    Ok(RepetitionOutcome {
        index,
        raw,
        checked,
    })
}
