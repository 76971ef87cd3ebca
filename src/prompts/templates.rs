//! Template definitions and substitution.
//!
//! Placeholders are written `{name}` where `name` is a bare identifier.
//! Any other use of braces is literal text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while validating or rendering a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("{step} template is missing the {{{placeholder}}} placeholder")]
    MissingPlaceholder {
        step: PromptStep,
        placeholder: &'static str,
    },

    #[error("{step} template uses unknown placeholder {{{placeholder}}}")]
    UnknownPlaceholder { step: PromptStep, placeholder: String },

    #[error("no value supplied for {{{placeholder}}} in {step} template")]
    MissingValue {
        step: PromptStep,
        placeholder: &'static str,
    },
}

/// The five fixed prompting steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStep {
    Initial,
    DoubleChecker,
    Comparison,
    FinalAnswer,
    Summary,
}

impl PromptStep {
    pub const ALL: [PromptStep; 5] = [
        PromptStep::Initial,
        PromptStep::DoubleChecker,
        PromptStep::Comparison,
        PromptStep::FinalAnswer,
        PromptStep::Summary,
    ];

    /// Placeholders every template for this step must contain.
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            PromptStep::Initial => &["question"],
            PromptStep::DoubleChecker => &["question", "answer"],
            PromptStep::Comparison => &["repetitions", "question", "answers"],
            PromptStep::FinalAnswer => &["comparison"],
            PromptStep::Summary => &["final_answer"],
        }
    }

    /// Built-in template text.
    pub fn default_template(&self) -> &'static str {
        match self {
            PromptStep::Initial => INITIAL_TEMPLATE,
            PromptStep::DoubleChecker => DOUBLE_CHECKER_TEMPLATE,
            PromptStep::Comparison => COMPARISON_TEMPLATE,
            PromptStep::FinalAnswer => FINAL_ANSWER_TEMPLATE,
            PromptStep::Summary => SUMMARY_TEMPLATE,
        }
    }
}

impl fmt::Display for PromptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStep::Initial => write!(f, "initial"),
            PromptStep::DoubleChecker => write!(f, "double_checker"),
            PromptStep::Comparison => write!(f, "comparison"),
            PromptStep::FinalAnswer => write!(f, "final_answer"),
            PromptStep::Summary => write!(f, "summary"),
        }
    }
}

const INITIAL_TEMPLATE: &str =
    "Answer the following carefully. Reflect on your answer \n Question: {question}";

const DOUBLE_CHECKER_TEMPLATE: &str = "You are given a question and an answer below. \
The answer may be wrong so double check the following question and answer: \
Question: {question} Answer: {answer}";

// Whitespace between sentences is normalized to a single space.
const COMPARISON_TEMPLATE: &str = "You are a researcher investigating the {repetitions} answers \
to the question [[{question}]], each answer delimited by '''. \
Compare and contrast these answers. \
Let's think about this step by step to make sure we find all inconsistencies. {answers}";

const FINAL_ANSWER_TEMPLATE: &str = "You are a resolver tasked to \
1) find the best answer based on a compare-contrast opinion below, delimited by <<< and >>> \
2) Improve on the answer. \
Let's think about this step by step to make sure we have the correct answer. <<<{comparison}>>>";

const SUMMARY_TEMPLATE: &str = "Summarize the following answer to be more concise \
and straight to the point. Remove any unnecessary explanation: {final_answer}";

/// A template bound to its step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    step: PromptStep,
    text: String,
}

impl PromptTemplate {
    /// Build and validate a template.
    pub fn new(step: PromptStep, text: impl Into<String>) -> Result<Self, TemplateError> {
        let template = Self {
            step,
            text: text.into(),
        };
        template.validate()?;
        Ok(template)
    }

    /// Check that the required placeholders are present and no others are used.
    pub fn validate(&self) -> Result<(), TemplateError> {
        let expected = self.step.placeholders();
        let mut seen: Vec<&str> = Vec::new();

        for segment in parse(&self.text) {
            if let Segment::Placeholder(name) = segment {
                if !expected.contains(&name) {
                    return Err(TemplateError::UnknownPlaceholder {
                        step: self.step,
                        placeholder: name.to_string(),
                    });
                }
                seen.push(name);
            }
        }

        for &placeholder in expected {
            if !seen.contains(&placeholder) {
                return Err(TemplateError::MissingPlaceholder {
                    step: self.step,
                    placeholder,
                });
            }
        }

        Ok(())
    }

    /// Substitute `values` into the template in a single pass.
    ///
    /// Substituted text is never scanned again, so values may contain braces.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(self.text.len());

        for segment in parse(&self.text) {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .iter()
                        .find(|(key, _)| *key == name)
                        .map(|(_, value)| *value);

                    match value {
                        Some(value) => output.push_str(value),
                        None => {
                            let placeholder = self
                                .step
                                .placeholders()
                                .iter()
                                .copied()
                                .find(|p| *p == name)
                                .ok_or_else(|| TemplateError::UnknownPlaceholder {
                                    step: self.step,
                                    placeholder: name.to_string(),
                                })?;
                            return Err(TemplateError::MissingValue {
                                step: self.step,
                                placeholder,
                            });
                        }
                    }
                }
            }
        }

        Ok(output)
    }
}

/// The complete, validated set of templates for one run.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: BTreeMap<PromptStep, PromptTemplate>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        let templates = PromptStep::ALL
            .iter()
            .map(|step| {
                (
                    *step,
                    PromptTemplate {
                        step: *step,
                        text: step.default_template().to_string(),
                    },
                )
            })
            .collect();

        Self { templates }
    }
}

impl TemplateSet {
    /// Build a set from the built-ins with optional per-step overrides.
    ///
    /// Every template is validated here so bad overrides fail before any call.
    pub fn with_overrides(overrides: &BTreeMap<PromptStep, String>) -> Result<Self, TemplateError> {
        let mut set = Self::default();

        for (step, text) in overrides {
            set.templates
                .insert(*step, PromptTemplate::new(*step, text.clone())?);
        }

        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        self.templates.values().try_for_each(PromptTemplate::validate)
    }

    fn get(&self, step: PromptStep) -> &PromptTemplate {
        // Default fills every step and overrides only replace entries.
        &self.templates[&step]
    }

    pub fn initial(&self, question: &str) -> Result<String, TemplateError> {
        self.get(PromptStep::Initial)
            .render(&[("question", question)])
    }

    pub fn double_checker(&self, question: &str, answer: &str) -> Result<String, TemplateError> {
        self.get(PromptStep::DoubleChecker)
            .render(&[("question", question), ("answer", answer)])
    }

    pub fn comparison(
        &self,
        repetitions: usize,
        question: &str,
        answers: &str,
    ) -> Result<String, TemplateError> {
        let repetitions = repetitions.to_string();
        self.get(PromptStep::Comparison).render(&[
            ("repetitions", repetitions.as_str()),
            ("question", question),
            ("answers", answers),
        ])
    }

    pub fn final_answer(&self, comparison: &str) -> Result<String, TemplateError> {
        self.get(PromptStep::FinalAnswer)
            .render(&[("comparison", comparison)])
    }

    pub fn summary(&self, final_answer: &str) -> Result<String, TemplateError> {
        self.get(PromptStep::Summary)
            .render(&[("final_answer", final_answer)])
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal text and `{identifier}` placeholders.
fn parse(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('{') {
        let open = cursor + offset;
        let rest = &text[open + 1..];

        match rest.find('}') {
            Some(len) if is_identifier(&rest[..len]) => {
                if literal_start < open {
                    segments.push(Segment::Literal(&text[literal_start..open]));
                }
                segments.push(Segment::Placeholder(&rest[..len]));
                cursor = open + len + 2;
                literal_start = cursor;
            }
            _ => cursor = open + 1,
        }
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }

    segments
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
