use base64::{engine::general_purpose::STANDARD, Engine as _};
use eyre::WrapErr;
use tracing::*;

use super::{expect_parameters, value_error};
use crate::{context::TestContext, Error, Result};

/// `env(name[, default])` reads a process environment variable.
pub fn env(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "env(name[, default])")?;
    let name = parameters[0].trim();
    match (std::env::var(name), parameters.get(1)) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.clone()),
        (Err(e), None) => Err(value_error(format!(
            "environment variable \"{name}\" is not available: {e}"
        ))),
    }
}

/// `readFile(path[, base64])`.
///
/// Plain text content has its own dynamic content resolved against the calling
/// context, base64 output is returned as is.
pub fn read_file(parameters: &[String], context: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "readFile(path[, base64])")?;
    let path = parameters[0].trim();
    let base64 = match parameters.get(1) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| value_error(format!("invalid boolean \"{raw}\": {e}")))?,
        None => false,
    };

    debug!("reading file resource \"{path}\"");
    let bytes = std::fs::read(path)
        .wrap_err_with(|| format!("failed to read file resource \"{path}\""))
        .map_err(Error::ValueError)?;

    if base64 {
        return Ok(STANDARD.encode(bytes));
    }
    let content = String::from_utf8(bytes)
        .wrap_err_with(|| format!("file resource \"{path}\" is not UTF-8"))
        .map_err(Error::ValueError)?;
    context.replace_dynamic_content(&content)
}
