//! Segment extractors evaluate one segment of a path expression against the value
//! produced by the previous segments.
use serde_json::Value;
use std::{fmt, sync::Arc};

use super::expression::{SegmentKind, VariableSegment};
use crate::{context::TestContext, Error, Result};

const MAX_RENDERED_LENGTH: usize = 256;

/// Pluggable strategy for evaluating path expression segments.
pub trait SegmentVariableExtractor: Send + Sync {
    /// Whether this extractor is able to evaluate `segment` against `object`.
    fn can_extract(&self, context: &TestContext, object: &Value, segment: &VariableSegment)
        -> bool;

    /// Evaluates `segment` against `object`. Called only after [`Self::can_extract`]
    /// accepted the segment.
    fn extract_value(
        &self,
        context: &TestContext,
        object: &Value,
        segment: &VariableSegment,
    ) -> Result<Value>;
}

/// Ordered extractor chain. The first extractor accepting a segment evaluates it.
#[derive(Clone)]
pub struct SegmentVariableExtractorRegistry {
    extractors: Vec<Arc<dyn SegmentVariableExtractor>>,
}

impl fmt::Debug for SegmentVariableExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentVariableExtractorRegistry")
            .field("extractors", &self.extractors.len())
            .finish()
    }
}

impl Default for SegmentVariableExtractorRegistry {
    fn default() -> Self {
        SegmentVariableExtractorRegistry {
            extractors: vec![
                Arc::new(MapVariableExtractor),
                Arc::new(JsonPathVariableExtractor),
            ],
        }
    }
}

impl SegmentVariableExtractorRegistry {
    /// Appends a custom extractor after the built-in ones.
    pub fn add_extractor(&mut self, extractor: impl SegmentVariableExtractor + 'static) {
        self.extractors.push(Arc::new(extractor));
    }

    pub fn extractors(&self) -> &[Arc<dyn SegmentVariableExtractor>] {
        &self.extractors
    }
}

fn render(object: &Value) -> String {
    let mut rendered = object.to_string();
    if rendered.len() > MAX_RENDERED_LENGTH {
        let mut end = MAX_RENDERED_LENGTH;
        while !rendered.is_char_boundary(end) {
            end -= 1;
        }
        rendered.truncate(end);
        rendered.push_str("...");
    }
    rendered
}

/// Builds the error for a segment an extractor accepted but failed to evaluate.
pub fn segment_error(segment: &VariableSegment, object: &Value, reason: impl fmt::Display) -> Error {
    let mut message = format!(
        "Unable to extract value using expression '{}'!",
        segment.variable_expression
    );
    if segment.total > 1 {
        message.push_str(&format!(
            " Failed at segment '{segment}' ({}/{})",
            segment.position, segment.total
        ));
    }
    message.push_str(&format!("\nReason: {reason}.\nFrom object:\n{}", render(object)));
    Error::SegmentExtraction(message)
}

/// Applies the optional `[index]` of `segment` to `value`. `root` is the object the
/// segment was evaluated against and only appears in error messages.
pub fn index_value(root: &Value, value: &Value, segment: &VariableSegment) -> Result<Value> {
    let Some(index) = segment.index else {
        return Ok(value.clone());
    };

    match value {
        Value::Array(items) => items.get(index).cloned().ok_or_else(|| {
            segment_error(
                segment,
                root,
                format!(
                    "Index {index} out of bounds (array length {}) for segment '{}'",
                    items.len(),
                    segment.expression
                ),
            )
        }),
        Value::Null => Err(segment_error(
            segment,
            root,
            format!(
                "Cannot index into null for segment '{}' (index {index})",
                segment.expression
            ),
        )),
        other => Err(segment_error(
            segment,
            root,
            format!(
                "Expected array for indexed access, but was {} (segment '{}')",
                type_name(other),
                segment.expression
            ),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Looks up object fields, e.g. `customer` or `items[0]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapVariableExtractor;

impl SegmentVariableExtractor for MapVariableExtractor {
    fn can_extract(&self, _: &TestContext, object: &Value, segment: &VariableSegment) -> bool {
        segment.kind == SegmentKind::Name && object.is_object()
    }

    fn extract_value(
        &self,
        _: &TestContext,
        object: &Value,
        segment: &VariableSegment,
    ) -> Result<Value> {
        let Value::Object(map) = object else {
            return Err(segment_error(
                segment,
                object,
                format!(
                    "Expected object for segment '{}' but was {}",
                    segment.expression,
                    type_name(object)
                ),
            ));
        };

        let value = map.get(&segment.expression).ok_or_else(|| {
            segment_error(
                segment,
                object,
                format!("Unknown key '{}' in object", segment.expression),
            )
        })?;
        index_value(object, value, segment)
    }
}

/// Evaluates `jsonPath(...)` segments over JSON values or strings holding JSON.
///
/// Supported syntax: `$`, `.field`, `['field']`, `[n]` and the `*` / `[*]` wildcards.
/// A path containing a wildcard yields an array of all matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathVariableExtractor;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathStep {
    Field(String),
    Index(usize),
    Wildcard,
}

fn parse_json_path(path: &str) -> std::result::Result<Vec<PathStep>, String> {
    let rest = path
        .trim()
        .strip_prefix('$')
        .ok_or_else(|| format!("JSONPath '{path}' must start with '$'"))?;

    let mut steps = Vec::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '.' => {
                if matches!(chars.peek(), Some((_, '.'))) {
                    return Err(format!("recursive descent is not supported in '{path}'"));
                }
                let start = i + 1;
                let mut end = rest.len();
                while let Some(&(j, next)) = chars.peek() {
                    if next == '.' || next == '[' {
                        end = j;
                        break;
                    }
                    chars.next();
                }
                match &rest[start..end] {
                    "" => return Err(format!("empty field name in '{path}'")),
                    "*" => steps.push(PathStep::Wildcard),
                    field => steps.push(PathStep::Field(field.to_string())),
                }
            }
            '[' => {
                let close = rest[i..]
                    .find(']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| format!("unclosed '[' in '{path}'"))?;
                let inner = rest[i + 1..close].trim();
                let step = if inner == "*" {
                    PathStep::Wildcard
                } else if let Some(field) = inner
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
                {
                    PathStep::Field(field.to_string())
                } else {
                    PathStep::Index(
                        inner
                            .parse()
                            .map_err(|_| format!("invalid index '{inner}' in '{path}'"))?,
                    )
                };
                steps.push(step);
                while matches!(chars.peek(), Some(&(j, _)) if j <= close) {
                    chars.next();
                }
            }
            other => return Err(format!("unexpected character '{other}' in '{path}'")),
        }
    }

    Ok(steps)
}

fn evaluate_json_path<'a>(root: &'a Value, steps: &[PathStep]) -> Vec<&'a Value> {
    steps.iter().fold(vec![root], |current, step| {
        current
            .into_iter()
            .flat_map(|value: &'a Value| -> Vec<&'a Value> {
                match (step, value) {
                    (PathStep::Field(name), Value::Object(map)) => map.get(name).into_iter().collect(),
                    (PathStep::Index(index), Value::Array(items)) => {
                        items.get(*index).into_iter().collect()
                    }
                    (PathStep::Wildcard, Value::Object(map)) => map.values().collect(),
                    (PathStep::Wildcard, Value::Array(items)) => items.iter().collect(),
                    _ => Vec::new(),
                }
            })
            .collect()
    })
}

impl SegmentVariableExtractor for JsonPathVariableExtractor {
    fn can_extract(&self, _: &TestContext, _: &Value, segment: &VariableSegment) -> bool {
        segment.kind == SegmentKind::JsonPath
    }

    fn extract_value(
        &self,
        _: &TestContext,
        object: &Value,
        segment: &VariableSegment,
    ) -> Result<Value> {
        let parsed;
        let document = match object {
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text).map_err(|e| {
                    segment_error(segment, object, format!("Value is not valid JSON: {e}"))
                })?;
                &parsed
            }
            other => other,
        };

        let steps = parse_json_path(&segment.expression)
            .map_err(|reason| segment_error(segment, object, reason))?;
        let matches = evaluate_json_path(document, &steps);

        let value = if steps.contains(&PathStep::Wildcard) {
            Value::Array(matches.into_iter().cloned().collect())
        } else {
            matches.first().map(|v| (*v).clone()).ok_or_else(|| {
                segment_error(
                    segment,
                    object,
                    format!("No result for JSONPath '{}'", segment.expression),
                )
            })?
        };
        index_value(object, &value, segment)
    }
}
