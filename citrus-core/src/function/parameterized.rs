//! Typed parameters for functions.
//!
//! A [`ParameterizedFunction`] declares a parameter struct which is populated from
//! the tokenized parameter list before the function runs. [`Parameterized`] adapts
//! it to the plain [`Function`] interface so both kinds live in the same library.
//!
//! ```rust,ignore
//! #[derive(FunctionParameters)]
//! struct RepeatParameters {
//!     value: String,
//!     #[param(default = "2")]
//!     times: usize,
//! }
//!
//! struct Repeat;
//!
//! impl ParameterizedFunction for Repeat {
//!     type Parameters = RepeatParameters;
//!
//!     fn execute(&self, p: RepeatParameters, _: &TestContext) -> citrus::Result<String> {
//!         Ok(p.value.repeat(p.times))
//!     }
//! }
//!
//! let library = FunctionLibrary::new("demo", "demo:").with_function("repeat", Parameterized(Repeat));
//! ```
use std::{error::Error as StdError, str::FromStr};

use super::Function;
use crate::{context::TestContext, Error, Result};

/// A parameter struct built from positional function parameters.
///
/// Usually derived with `#[derive(FunctionParameters)]`.
pub trait FunctionParameters: Sized {
    fn from_parameters(parameters: &[String]) -> Result<Self>;
}

/// A function taking a typed parameter struct.
pub trait ParameterizedFunction: Send + Sync {
    type Parameters: FunctionParameters;

    fn execute(&self, parameters: Self::Parameters, context: &TestContext) -> Result<String>;
}

/// Adapts a [`ParameterizedFunction`] to [`Function`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Parameterized<F>(pub F);

impl<F: ParameterizedFunction> Function for Parameterized<F> {
    fn execute(&self, parameters: &[String], context: &TestContext) -> Result<String> {
        let parameters = F::Parameters::from_parameters(parameters)?;
        self.0.execute(parameters, context)
    }
}

/// A parameter which may be given as the literal `null`, meaning "not set".
///
/// Useful for defaulted positional parameters that callers want to skip while
/// still passing a later one, e.g. `advancedRandomNumber(2, null, 10)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Nullable<T>(pub Option<T>);

impl<T> Nullable<T> {
    pub fn unwrap_or(self, default: T) -> T {
        self.0.unwrap_or(default)
    }
}

impl<T: FromStr> FromStr for Nullable<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "null" => Ok(Nullable(None)),
            raw => raw.parse().map(|value| Nullable(Some(value))),
        }
    }
}

/// Short type name used in parse errors, `core::option::Option<f64>` becomes `Option<f64>`.
fn type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let mut name = String::with_capacity(full.len());
    for part in full.split_inclusive(&['<', '>', ',', ' '][..]) {
        name.push_str(part.rsplit("::").next().unwrap_or(part));
    }
    name
}

fn parse<T>(raw: &str, index: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    raw.parse::<T>().map_err(|e| {
        Error::InvalidFunctionUsage(format!(
            "invalid parameter \"{name}\" at index {}: {raw} must be parsable to {} ({e})",
            index + 1,
            type_name::<T>()
        ))
    })
}

/// Parses the parameter at `index`, failing if it is absent.
pub fn required_parameter<T>(parameters: &[String], index: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    let raw = parameters.get(index).ok_or_else(|| {
        Error::InvalidFunctionUsage(format!(
            "missing parameter \"{name}\" at position {}",
            index + 1
        ))
    })?;
    parse(raw, index, name)
}

/// Parses the parameter at `index` if present.
pub fn optional_parameter<T>(parameters: &[String], index: usize, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    parameters
        .get(index)
        .map(|raw| parse(raw, index, name))
        .transpose()
}

/// Parses the parameter at `index`, falling back to parsing `default`.
pub fn defaulted_parameter<T>(
    parameters: &[String],
    index: usize,
    name: &str,
    default: &str,
) -> Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    parse(parameters.get(index).map_or(default, String::as_str), index, name)
}

/// Parses every parameter from `index` on.
pub fn rest_parameters<T>(parameters: &[String], index: usize, name: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    parameters
        .iter()
        .enumerate()
        .skip(index)
        .map(|(i, raw)| parse(raw, i, name))
        .collect()
}
