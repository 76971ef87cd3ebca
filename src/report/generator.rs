//! Report generation.
//!
//! This module renders a finished run as Markdown or JSON, and renders
//! the intermediate answer blocks for the terminal.

use crate::cli::OutputFormat;
use crate::models::{RepetitionOutcome, RunMetadata, RunResult};
use anyhow::{Context, Result};
use std::path::Path;

const RULE: &str = "==================================";

/// Separator between answers in the checked-answers block.
const CHECKED_SEPARATOR: &str = "'''\n'''";

/// Render the initial and checked answer blocks the way the diagnostic
/// view shows them, ahead of the summary.
pub fn render_intermediate(result: &RunResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} INITIAL ANSWERS {}\n", RULE, RULE));
    output.push_str(&result.aggregated);
    output.push_str("\n\n");

    output.push_str(&format!("{} CHECKED ANSWERS {}\n", RULE, RULE));
    output.push_str(&result.collection.checked.join(CHECKED_SEPARATOR));
    output.push_str("\n\n");

    output.push_str(&format!("{} ANSWER {}\n", RULE, RULE));

    output
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(result: &RunResult) -> String {
    let mut output = String::new();

    output.push_str("# Smarter GPT Answer\n\n");
    output.push_str(&generate_metadata_section(&result.metadata));

    output.push_str("## Answer\n\n");
    output.push_str(&result.summary);
    output.push_str("\n\n");

    output.push_str(&generate_repetitions_section(&result.repetitions));

    output.push_str("## Comparison\n\n");
    output.push_str(&result.comparison);
    output.push_str("\n\n");

    output.push_str("## Final Answer\n\n");
    output.push_str(&result.final_answer);
    output.push_str("\n\n");

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &RunMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Question:** {}\n", metadata.question));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model));
    section.push_str(&format!(
        "- **Date:** {}\n",
        metadata.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Repetitions:** {}\n", metadata.repetitions));
    section.push_str(&format!(
        "- **Compared Answers:** {}\n",
        metadata.comparison_input
    ));
    section.push_str(&format!(
        "- **Completion Calls:** {}\n",
        metadata.completion_calls
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// One subsection per repetition, raw answer then checked answer.
fn generate_repetitions_section(outcomes: &[RepetitionOutcome]) -> String {
    let mut section = String::new();

    section.push_str("## Repetitions\n\n");

    for outcome in outcomes {
        section.push_str(&format!("### Repetition {}\n\n", outcome.index + 1));
        section.push_str("**Initial answer:**\n\n");
        section.push_str(&quote(&outcome.raw));
        section.push_str("**Double-checked answer:**\n\n");
        section.push_str(&quote(&outcome.checked));
    }

    section
}

fn quote(text: &str) -> String {
    let mut quoted: String = text.lines().map(|line| format!("> {}\n", line)).collect();
    quoted.push('\n');
    quoted
}

fn generate_footer() -> String {
    "---\n\n*Generated by smarter-gpt*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).map_err(Into::into)
}

/// Render `result` in `format` and write it to `path`.
pub fn write_report(result: &RunResult, format: OutputFormat, path: &Path) -> Result<()> {
    let content = match format {
        OutputFormat::Json => generate_json_report(result)?,
        OutputFormat::Markdown => generate_markdown_report(result),
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerCollection, ComparisonInput, ModelChoice, Question};
    use crate::pipeline::aggregator::aggregate;
    use chrono::Utc;

    fn create_test_result() -> RunResult {
        let repetitions: Vec<RepetitionOutcome> = (0..2)
            .map(|i| RepetitionOutcome {
                index: i,
                raw: format!("It is {}.", 4 + i),
                checked: "It is 4.".to_string(),
            })
            .collect();
        let collection = AnswerCollection::from_outcomes(&repetitions, ComparisonInput::All);
        let aggregated = aggregate(&collection.answers);

        RunResult {
            metadata: RunMetadata {
                question: Question::try_new("What is 2+2?").unwrap(),
                model: ModelChoice::Gpt35Turbo,
                repetitions: 2,
                comparison_input: ComparisonInput::All,
                started_at: Utc::now(),
                duration_seconds: 12.5,
                completion_calls: 7,
            },
            repetitions,
            collection,
            aggregated,
            comparison: "Answer 2 is inconsistent.".to_string(),
            final_answer: "2+2 equals 4, a basic arithmetic fact.".to_string(),
            summary: "4".to_string(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_result());

        assert!(markdown.contains("# Smarter GPT Answer"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Question:** What is 2+2?"));
        assert!(markdown.contains("`gpt-3.5-turbo`"));
        assert!(markdown.contains("## Answer\n\n4\n"));
        assert!(markdown.contains("### Repetition 2"));
        assert!(markdown.contains("> It is 5."));
        assert!(markdown.contains("Answer 2 is inconsistent."));
    }

    #[test]
    fn test_render_intermediate_blocks() {
        let text = render_intermediate(&create_test_result());

        assert!(text.contains("INITIAL ANSWERS"));
        assert!(text.contains("'''It is 4.'''It is 4.'''It is 5.'''It is 4.'''"));
        assert!(text.contains("CHECKED ANSWERS"));
        assert!(text.contains("CHECKED ANSWERS ==================================\nIt is 4.'''\n'''It is 4.\n\n"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"], "4");
        assert_eq!(value["metadata"]["model"], "gpt-3.5-turbo");
        assert_eq!(value["metadata"]["comparison_input"], "all");
        assert_eq!(value["metadata"]["question"], "What is 2+2?");
        assert_eq!(value["collection"]["answers"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer.json");

        write_report(&create_test_result(), OutputFormat::Json, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"completion_calls\": 7"));
    }
}
