//! Path expressions over variable values, e.g. `order.items[0].jsonPath($.sku)`.
//!
//! The first segment names a variable in the store. Every following segment is
//! evaluated against the value produced so far by the first segment extractor that
//! accepts it.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use tracing::*;

use super::extractor::{index_value, SegmentVariableExtractor};
use crate::{context::TestContext, Error, Result};

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(jsonPath|xpath)\((.*)\)|([^\[\]()]+))(?:\[(\d+)\])?$")
        .expect("segment pattern must compile")
});

/// How a segment addresses its parent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Plain field name, optionally indexed: `items[0]`.
    Name,
    /// `jsonPath(<path>)`.
    JsonPath,
    /// `xpath(<path>)`. Evaluated only by custom extractors.
    XPath,
}

/// One dot separated segment of a variable path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSegment {
    /// The complete path expression this segment belongs to.
    pub variable_expression: String,
    /// Field name, or the path inside `jsonPath(...)` / `xpath(...)`.
    pub expression: String,
    pub kind: SegmentKind,
    pub index: Option<usize>,
    /// Position of the segment, starting at 1.
    pub position: usize,
    pub total: usize,
}

impl fmt::Display for VariableSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SegmentKind::Name => write!(f, "{}", self.expression)?,
            SegmentKind::JsonPath => write!(f, "jsonPath({})", self.expression)?,
            SegmentKind::XPath => write!(f, "xpath({})", self.expression)?,
        }
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// Whether a variable name has to be evaluated as a path expression.
pub fn is_path_expression(name: &str) -> bool {
    name.contains('.') || name.ends_with(']') || name.ends_with(')')
}

/// Splits `expression` on dots outside of parentheses and brackets.
fn split_segments(expression: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in expression.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                segments.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&expression[start..]);
    segments
}

/// Parses a path expression into its segments.
pub fn parse_segments(expression: &str) -> Result<Vec<VariableSegment>> {
    let raw = split_segments(expression);
    let total = raw.len();

    raw.into_iter()
        .enumerate()
        .map(|(i, segment)| {
            let captures = SEGMENT.captures(segment).ok_or_else(|| {
                Error::unresolved(
                    expression,
                    format!("invalid segment \"{segment}\" at position {}", i + 1),
                )
            })?;

            let (kind, text) = match (captures.get(1), captures.get(2), captures.get(3)) {
                (Some(function), Some(path), _) if function.as_str() == "jsonPath" => {
                    (SegmentKind::JsonPath, path.as_str())
                }
                (Some(_), Some(path), _) => (SegmentKind::XPath, path.as_str()),
                (_, _, Some(name)) => (SegmentKind::Name, name.as_str()),
                _ => unreachable!("segment pattern always captures a name or a path"),
            };

            let index = captures
                .get(4)
                .map(|index| index.as_str().parse::<usize>())
                .transpose()
                .map_err(|e| Error::unresolved(expression, e.to_string()))?;

            Ok(VariableSegment {
                variable_expression: expression.to_string(),
                expression: text.to_string(),
                kind,
                index,
                position: i + 1,
                total,
            })
        })
        .collect()
}

/// Evaluates a path expression and returns the value of its last segment.
pub fn last_expression_value(expression: &str, context: &TestContext) -> Result<Value> {
    let segments = parse_segments(expression)?;
    let Some((first, rest)) = segments.split_first() else {
        return Err(Error::unresolved(expression, "empty expression"));
    };

    if first.kind != SegmentKind::Name {
        return Err(Error::unresolved(
            expression,
            format!("first segment \"{first}\" must name a variable"),
        ));
    }

    let root = context.stored_variable(&first.expression).ok_or_else(|| {
        Error::unresolved(
            expression,
            format!("variable \"{}\" is not defined", first.expression),
        )
    })?;
    let mut value = index_value(root, root, first)?;

    for segment in rest {
        let extractor = context
            .segment_extractors()
            .iter()
            .find(|extractor| extractor.can_extract(context, &value, segment))
            .ok_or_else(|| {
                Error::unresolved(
                    expression,
                    format!("no segment extractor accepts segment \"{segment}\""),
                )
            })?;

        value = extractor.extract_value(context, &value, segment)?;
        trace!("evaluated segment \"{segment}\" of \"{expression}\"");
    }

    Ok(value)
}
