use regex::Regex;

use super::{expect_parameters, value_error};
use crate::{context::TestContext, Error, Result};

pub fn concat(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "at least one parameter")?;
    Ok(parameters.concat())
}

fn char_index(raw: &str, name: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|e| value_error(format!("invalid {name} index \"{raw}\": {e}")))
}

/// `substring(value, begin[, end])` over char positions.
pub fn substring(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 2, "substring(value, begin[, end])")?;

    let chars: Vec<char> = parameters[0].chars().collect();
    let begin = char_index(&parameters[1], "begin")?;
    let end = match parameters.get(2) {
        Some(raw) => char_index(raw, "end")?,
        None => chars.len(),
    };

    if begin > end || end > chars.len() {
        return Err(Error::InvalidFunctionUsage(format!(
            "substring range {begin}..{end} out of bounds for \"{}\" (length {})",
            parameters[0],
            chars.len()
        )));
    }
    Ok(chars[begin..end].iter().collect())
}

pub fn substring_before(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 2, "substringBefore(value, search)")?;
    let (value, search) = (&parameters[0], &parameters[1]);
    Ok(value
        .find(search.as_str())
        .map_or(value.as_str(), |i| &value[..i])
        .to_string())
}

pub fn substring_after(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 2, "substringAfter(value, search)")?;
    let (value, search) = (&parameters[0], &parameters[1]);
    Ok(value
        .find(search.as_str())
        .map_or(value.as_str(), |i| &value[i + search.len()..])
        .to_string())
}

pub fn string_length(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "stringLength(value)")?;
    Ok(parameters[0].chars().count().to_string())
}

/// `translate(value, regex, replacement)` replaces all matches.
pub fn translate(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 3, "translate(value, regex, replacement)")?;
    let regex = Regex::new(&parameters[1])
        .map_err(|e| value_error(format!("invalid regex \"{}\": {e}", parameters[1])))?;
    Ok(regex
        .replace_all(&parameters[0], parameters[2].as_str())
        .into_owned())
}

pub fn upper_case(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "upperCase(value)")?;
    Ok(parameters[0].to_uppercase())
}

pub fn lower_case(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "lowerCase(value)")?;
    Ok(parameters[0].to_lowercase())
}
