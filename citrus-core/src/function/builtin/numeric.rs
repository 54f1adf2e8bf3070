use super::{expect_parameters, value_error};
use crate::{context::TestContext, Result};

fn number(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| value_error(format!("invalid number \"{raw}\": {e}")))
}

fn numbers(parameters: &[String], usage: &str) -> Result<Vec<f64>> {
    expect_parameters(parameters, 1, usage)?;
    parameters.iter().map(|raw| number(raw)).collect()
}

/// Renders a double the way test data expects it: integral values keep one
/// fractional digit (`3.0`).
pub(super) fn format_double(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub fn sum(parameters: &[String], _: &TestContext) -> Result<String> {
    let values = numbers(parameters, "sum(number, ...)")?;
    Ok(format_double(values.iter().sum()))
}

pub fn average(parameters: &[String], _: &TestContext) -> Result<String> {
    let values = numbers(parameters, "average(number, ...)")?;
    Ok(format_double(values.iter().sum::<f64>() / values.len() as f64))
}

pub fn min(parameters: &[String], _: &TestContext) -> Result<String> {
    let values = numbers(parameters, "min(number, ...)")?;
    Ok(format_double(values.into_iter().fold(f64::INFINITY, f64::min)))
}

pub fn max(parameters: &[String], _: &TestContext) -> Result<String> {
    let values = numbers(parameters, "max(number, ...)")?;
    Ok(format_double(
        values.into_iter().fold(f64::NEG_INFINITY, f64::max),
    ))
}

pub fn ceiling(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "ceiling(number)")?;
    Ok(format_double(number(&parameters[0])?.ceil()))
}

pub fn floor(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "floor(number)")?;
    Ok(format_double(number(&parameters[0])?.floor()))
}

/// Rounds half up to the nearest integer.
pub fn round(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "round(number)")?;
    let rounded = (number(&parameters[0])? + 0.5).floor();
    Ok(format!("{rounded:.0}"))
}

/// Integer input stays an integer, decimal input renders as a double.
pub fn absolute(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "absolute(number)")?;
    let raw = parameters[0].trim();
    if raw.contains('.') {
        return Ok(format_double(number(raw)?.abs()));
    }

    raw.parse::<i64>()
        .map(|value| value.unsigned_abs().to_string())
        .map_err(|e| value_error(format!("invalid number \"{raw}\": {e}")))
}

#[cfg(test)]
mod test {
    use super::format_double;
    use crate::{Error, TestContext};
    use test_case::test_case;

    fn resolve(expression: &str) -> crate::Result<String> {
        TestContext::default().replace_dynamic_content(expression)
    }

    #[test_case(3.0 => "3.0"; "integral")]
    #[test_case(2.5 => "2.5"; "fraction")]
    #[test_case(-0.25 => "-0.25"; "negative fraction")]
    fn double(value: f64) -> String {
        format_double(value)
    }

    #[test_case("citrus:sum('1', '2')" => "3.0"; "sum")]
    #[test_case("citrus:sum(1.5, 2.25)" => "3.75"; "sum fractions")]
    #[test_case("citrus:average(1, 2, 3, 4)" => "2.5"; "average")]
    #[test_case("citrus:min(3, -1, 2)" => "-1.0"; "min")]
    #[test_case("citrus:max(3, -1, 2.5)" => "3.0"; "max")]
    #[test_case("citrus:ceiling('1.2')" => "2.0"; "ceiling")]
    #[test_case("citrus:floor('1.8')" => "1.0"; "floor")]
    #[test_case("citrus:floor('-1.2')" => "-2.0"; "floor negative")]
    #[test_case("citrus:round('1.5')" => "2"; "round half up")]
    #[test_case("citrus:round('-1.5')" => "-1"; "round negative half")]
    #[test_case("citrus:round('2.4')" => "2"; "round down")]
    #[test_case("citrus:absolute('-3')" => "3"; "absolute integer")]
    #[test_case("citrus:absolute('-3.5')" => "3.5"; "absolute double")]
    fn numeric_functions(expression: &str) -> String {
        resolve(expression).unwrap()
    }

    #[test]
    fn not_a_number() {
        assert!(matches!(
            resolve("citrus:sum('1', 'two')"),
            Err(Error::ValueError(_))
        ));
    }

    #[test]
    fn empty_parameters() {
        assert!(matches!(
            resolve("citrus:average()"),
            Err(Error::InvalidFunctionUsage(_))
        ));
    }
}
