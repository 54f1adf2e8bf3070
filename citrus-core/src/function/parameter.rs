//! Splits the raw argument string of a function call into its parameters.
//!
//! Single quotes delimit literal spans in which commas do not split. The rules are
//! not CSV quoting: a quote always toggles the span state, a doubled quote is not an
//! escape, and a quote that shows up in the middle of an unquoted token re-opens the
//! previously emitted parameter, so `'a 'b' c'` stays one parameter.

const QUOTE: char = '\'';
const SEPARATOR: char = ',';

/// Tokenizes `parameter_string` into an ordered list of parameters.
///
/// ```
/// use citrus_core::function::parameter::parameter_list;
///
/// assert_eq!(parameter_list("'Hello', ' World!'"), vec!["Hello", " World!"]);
/// assert_eq!(parameter_list("'a,b',c"), vec!["a,b", "c"]);
/// assert!(parameter_list("").is_empty());
/// ```
pub fn parameter_list(parameter_string: &str) -> Vec<String> {
    let mut parameters = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut between_parameters = true;

    let mut chars = parameter_string.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            SEPARATOR if !in_quotes => {
                between_parameters = true;
                flush(&mut parameters, &mut current, true);
            }
            QUOTE if !in_quotes && !current.trim().is_empty() => {
                in_quotes = true;
                if let Some(last) = parameters.pop() {
                    current = format!("{last}{QUOTE}{current}{QUOTE}");
                }
            }
            QUOTE if !in_quotes => {
                between_parameters = false;
                in_quotes = true;
                current.clear();
            }
            QUOTE => {
                in_quotes = false;
                flush(&mut parameters, &mut current, false);
            }
            _ => {
                if between_parameters && !c.is_whitespace() {
                    between_parameters = false;
                }
                if !between_parameters {
                    current.push(c);
                }
            }
        }

        if chars.peek().is_none() {
            flush(&mut parameters, &mut current, true);
        }
    }

    parameters
}

/// Emits the buffered token with one layer of enclosing quotes removed. Unquoted
/// tokens (flushed by a separator or the end of input) are trimmed first.
fn flush(parameters: &mut Vec<String>, current: &mut String, trim: bool) {
    let token = if trim { current.trim() } else { current.as_str() };
    let token = token.strip_prefix(QUOTE).unwrap_or(token);
    let token = token.strip_suffix(QUOTE).unwrap_or(token);

    if !token.is_empty() {
        parameters.push(token.to_string());
    }
    current.clear();
}
