//! Answer aggregation.
//!
//! This module joins the collected answers into the delimited block that
//! the comparison prompt refers to.

use tracing::debug;

/// Delimiter the comparison prompt tells the model to expect.
pub const DELIMITER: &str = "'''";

/// Join answers into `'''a1'''a2'''...'''`.
///
/// The block always starts and ends with [`DELIMITER`]. Answers that
/// themselves contain the delimiter are passed through unchanged, which
/// makes the block ambiguous to the model.
pub fn aggregate<S: AsRef<str>>(answers: &[S]) -> String {
    let mut block = String::from(DELIMITER);

    for (i, answer) in answers.iter().enumerate() {
        let answer = answer.as_ref();
        if answer.contains(DELIMITER) {
            debug!("Answer {} contains the delimiter; aggregated block is ambiguous", i);
        }
        if i > 0 {
            block.push_str(DELIMITER);
        }
        block.push_str(answer);
    }

    block.push_str(DELIMITER);
    block
}

/// Count delimiter occurrences strictly between the leading and trailing one.
#[allow(dead_code)] // Used by tests and diagnostics
pub fn interior_delimiters(block: &str) -> usize {
    block
        .strip_prefix(DELIMITER)
        .and_then(|rest| rest.strip_suffix(DELIMITER))
        .map(|inner| inner.matches(DELIMITER).count())
        .unwrap_or(0)
}
