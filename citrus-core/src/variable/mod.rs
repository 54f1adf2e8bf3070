//! # Variables
//!
//! Scanning of `${name}` placeholders and the helpers shared by the test context
//! and the function resolver.
//!
//! ```text
//! "Hi ${user}, ref=${order.items[0].id}"
//!      |              |
//!      v              v
//!  store lookup   first segment "order" from the store,
//!                 then "items[0]" and "id" through the
//!                 segment extractor chain
//! ```
//!
//! A placeholder whose name is wrapped in escape markers (`${//name//}`) is not
//! looked up. One marker layer is removed and the result is emitted as literal
//! `${name}` text, which lets test data carry placeholder syntax.

pub mod expression;
pub mod extractor;

use serde_json::Value;
use tracing::*;

use crate::{context::TestContext, Result};

/// Opening marker of a variable placeholder.
pub const VARIABLE_PREFIX: &str = "${";
/// Closing marker of a variable placeholder.
pub const VARIABLE_SUFFIX: char = '}';
/// Marker wrapping an escaped variable name, e.g. `${//name//}`.
pub const VARIABLE_ESCAPE: &str = "//";

/// Strips the `${` and `}` markers if the expression carries both.
pub fn cut_off_variables_prefix(expression: &str) -> &str {
    expression
        .strip_prefix(VARIABLE_PREFIX)
        .and_then(|name| name.strip_suffix(VARIABLE_SUFFIX))
        .unwrap_or(expression)
}

/// Strips one layer of escape markers from both ends of a variable name.
pub fn cut_off_variables_escaping(name: &str) -> &str {
    name.strip_prefix(VARIABLE_ESCAPE)
        .and_then(|name| name.strip_suffix(VARIABLE_ESCAPE))
        .unwrap_or(name)
}

/// Whether the variable name is wrapped in escape markers on both ends.
pub fn is_escaped(name: &str) -> bool {
    name.len() >= 2 * VARIABLE_ESCAPE.len()
        && name.starts_with(VARIABLE_ESCAPE)
        && name.ends_with(VARIABLE_ESCAPE)
}

/// Whether the expression is a complete `${...}` placeholder.
pub fn is_variable_name(expression: &str) -> bool {
    expression.starts_with(VARIABLE_PREFIX) && expression.ends_with(VARIABLE_SUFFIX)
}

/// Renders a stored value the way it is spliced into strings: JSON strings as
/// their raw content, anything else as compact JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn push_resolved(output: &mut String, value: &str, enable_quoting: bool) {
    if enable_quoting {
        output.push('\'');
        output.push_str(value);
        output.push('\'');
    } else {
        output.push_str(value);
    }
}

/// Replaces every `${name}` placeholder in `input` with the variable value,
/// optionally wrapping each value in single quotes.
pub fn replace_variables_in_string(
    input: &str,
    context: &TestContext,
    enable_quoting: bool,
) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut start = 0;

    while let Some(found) = input[start..].find(VARIABLE_PREFIX) {
        let search = start + found;
        let name_start = search + VARIABLE_PREFIX.len();
        let (name_end, resume) = scan_variable_name(input, name_start);

        let name = &input[name_start..name_end];
        let value = context.resolve_variable(name)?;
        trace!("resolved variable \"{name}\"");

        output.push_str(&input[start..search]);
        push_resolved(&mut output, &value, enable_quoting);

        start = resume;
    }

    output.push_str(&input[start..]);
    Ok(output)
}

/// Scans a variable name starting right after `${`.
///
/// Returns the end of the name and the index scanning resumes at. Nested `${`
/// openings must be balanced by their own `}`. The final character of the input
/// terminates an unclosed placeholder and is not part of the name.
fn scan_variable_name(input: &str, from: usize) -> (usize, usize) {
    let mut depth = 0usize;
    let mut chars = input[from..].char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let index = from + offset;
        if input[index..].starts_with(VARIABLE_PREFIX) {
            depth += 1;
        }

        if c == VARIABLE_SUFFIX || chars.peek().is_none() {
            if depth == 0 {
                return (index, index + c.len_utf8());
            }
            depth -= 1;
        }
    }

    (input.len(), input.len())
}
