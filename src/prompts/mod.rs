//! Prompt templates.
//!
//! This module holds the five built-in templates, their validation and
//! placeholder substitution.

pub mod templates;

pub use templates::{PromptStep, TemplateError, TemplateSet};
