use rand::{distr::Alphanumeric, seq::IndexedRandom, Rng};
use uuid::Uuid;

use super::{decimal_format::DecimalFormat, expect_parameters, value_error};
use crate::{
    context::TestContext,
    function::{parameterized::Nullable, ParameterizedFunction},
    Error, Result,
};

fn length(raw: &str) -> Result<usize> {
    let length: usize = raw
        .trim()
        .parse()
        .map_err(|e| value_error(format!("invalid length \"{raw}\": {e}")))?;
    if length == 0 {
        return Err(Error::InvalidFunctionUsage(
            "length must be greater than zero".into(),
        ));
    }
    Ok(length)
}

fn flag(parameters: &[String], index: usize, default: bool) -> Result<bool> {
    match parameters.get(index) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| value_error(format!("invalid boolean \"{raw}\": {e}"))),
        None => Ok(default),
    }
}

/// `randomNumber(length[, padding])`.
///
/// With padding (the default) the number always has exactly `length` digits.
/// Without it leading zeros are dropped.
pub fn random_number(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "randomNumber(length[, padding])")?;
    let length = length(&parameters[0])?;
    let padding = flag(parameters, 1, true)?;

    let mut rng = rand::rng();
    let digits: String = (0..length)
        .map(|i| {
            let low = if padding && i == 0 { 1 } else { 0 };
            char::from(b'0' + rng.random_range(low..=9u8))
        })
        .collect();

    if padding {
        return Ok(digits);
    }
    let trimmed = digits.trim_start_matches('0');
    Ok(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// `randomString(length[, notation][, includeNumbers])`.
pub fn random_string(parameters: &[String], _: &TestContext) -> Result<String> {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

    expect_parameters(
        parameters,
        1,
        "randomString(length[, notation][, includeNumbers])",
    )?;
    let length = length(&parameters[0])?;
    let notation = parameters
        .get(1)
        .map_or("MIXED".to_string(), |n| n.trim().to_uppercase());
    let numbers = flag(parameters, 2, false)?;

    let mut rng = rand::rng();
    let value: String = if numbers {
        (&mut rng)
            .sample_iter(Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    } else {
        (0..length)
            .map(|_| char::from(LETTERS[rng.random_range(0..LETTERS.len())]))
            .collect()
    };

    match notation.as_str() {
        "MIXED" => Ok(value),
        "UPPERCASE" => Ok(value.to_uppercase()),
        "LOWERCASE" => Ok(value.to_lowercase()),
        other => Err(Error::InvalidFunctionUsage(format!(
            "unknown notation \"{other}\", expected MIXED, UPPERCASE or LOWERCASE"
        ))),
    }
}

pub fn random_uuid(_: &[String], _: &TestContext) -> Result<String> {
    Ok(Uuid::new_v4().to_string())
}

/// Picks one of the given parameters.
pub fn random_enum_value(parameters: &[String], _: &TestContext) -> Result<String> {
    parameters
        .choose(&mut rand::rng())
        .cloned()
        .ok_or_else(|| Error::InvalidFunctionUsage("randomEnumValue needs at least one value".into()))
}

#[derive(Debug, PartialEq, crate::FunctionParameters)]
#[parameters(crate = "crate")]
pub struct AdvancedRandomNumberParameters {
    #[param(default = "2")]
    decimal_places: u32,
    #[param(default = "null")]
    min: Nullable<f64>,
    #[param(default = "null")]
    max: Nullable<f64>,
    #[param(default = "false")]
    exclude_min: bool,
    #[param(default = "false")]
    exclude_max: bool,
    #[param(default = "null")]
    multiple_of: Nullable<f64>,
    #[param(default = "null")]
    format: Nullable<DecimalFormat>,
}

/// `advancedRandomNumber([decimalPlaces][, min][, max][, excludeMin][, excludeMax][, multipleOf][, format])`.
///
/// Draws an integer multiple of `10^-decimalPlaces` so the bounds hold exactly.
/// Bounds too large for that fall back to drawing an `f64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvancedRandomNumber;

const MAX_DECIMAL_PLACES: u32 = 18;
const DEFAULT_MIN: f64 = -1_000_000.0;
const DEFAULT_MAX: f64 = 1_000_000.0;
/// Largest scaled bound drawn as an `i128`, leaving room for steps and exclusion.
const SCALED_LIMIT: f64 = 1e36;
const WIDE_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: f64,
    max: f64,
    exclude_min: bool,
    exclude_max: bool,
}

impl Bounds {
    fn contains(&self, value: f64) -> bool {
        let above = if self.exclude_min { value > self.min } else { value >= self.min };
        let below = if self.exclude_max { value < self.max } else { value <= self.max };
        value.is_finite() && above && below
    }

    fn empty(&self, decimal_places: u32) -> Error {
        Error::InvalidFunctionUsage(format!(
            "empty range between {} and {} with {decimal_places} decimal places",
            self.min, self.max
        ))
    }
}

impl ParameterizedFunction for AdvancedRandomNumber {
    type Parameters = AdvancedRandomNumberParameters;

    fn execute(&self, p: Self::Parameters, _: &TestContext) -> Result<String> {
        if p.decimal_places > MAX_DECIMAL_PLACES {
            return Err(Error::InvalidFunctionUsage(format!(
                "decimalPlaces must not exceed {MAX_DECIMAL_PLACES}"
            )));
        }
        let bounds = Bounds {
            min: p.min.unwrap_or(DEFAULT_MIN),
            max: p.max.unwrap_or(DEFAULT_MAX),
            exclude_min: p.exclude_min,
            exclude_max: p.exclude_max,
        };
        if !bounds.min.is_finite() || !bounds.max.is_finite() {
            return Err(Error::InvalidFunctionUsage("min and max must be finite numbers".into()));
        }
        if bounds.min > bounds.max {
            return Err(Error::InvalidFunctionUsage(format!(
                "min value {} must be less than max value {}",
                bounds.min, bounds.max
            )));
        }
        let step = match p.multiple_of.0 {
            Some(step) if !(step.is_finite() && step > 0.0) => {
                return Err(Error::InvalidFunctionUsage(format!(
                    "multipleOf must be a positive number, got {step}"
                )))
            }
            step => step,
        };

        let scale = 10i128.pow(p.decimal_places);
        let widest = bounds.min.abs().max(bounds.max.abs()) * scale as f64;
        let (value, rendered) = if widest < SCALED_LIMIT {
            draw_scaled(&bounds, scale, step, p.decimal_places)?
        } else {
            draw_wide(&bounds, step, p.decimal_places)?
        };

        Ok(match p.format.0 {
            Some(format) => format.format(value),
            None => rendered,
        })
    }
}

fn scaled_step(step: f64, scale: i128, decimal_places: u32) -> Result<i128> {
    let scaled = step * scale as f64;
    let rounded = scaled.round();
    if rounded < 1.0 || rounded >= SCALED_LIMIT || (scaled - rounded).abs() > 1e-6 * rounded {
        return Err(Error::InvalidFunctionUsage(format!(
            "multipleOf {step} cannot be expressed with {decimal_places} decimal places"
        )));
    }
    Ok(rounded as i128)
}

/// Draws among the multiples of `step / scale` within `bounds`.
fn draw_scaled(
    bounds: &Bounds,
    scale: i128,
    step: Option<f64>,
    decimal_places: u32,
) -> Result<(f64, String)> {
    let (min, max) = (
        snap(bounds.min * scale as f64),
        snap(bounds.max * scale as f64),
    );
    let mut low = min.ceil() as i128;
    let mut high = max.floor() as i128;
    if bounds.exclude_min && low as f64 == min {
        low += 1;
    }
    if bounds.exclude_max && high as f64 == max {
        high -= 1;
    }

    let step = match step {
        Some(step) => scaled_step(step, scale, decimal_places)?,
        None => 1,
    };
    let first = -(-low).div_euclid(step);
    let last = high.div_euclid(step);
    if first > last {
        return Err(bounds.empty(decimal_places));
    }

    let drawn = rand::rng().random_range(first..=last) * step;
    Ok((
        drawn as f64 / scale as f64,
        format_scaled(drawn, scale, decimal_places as usize),
    ))
}

/// Rounds away representation error, `3.1 * 100` is `310.00000000000006`.
fn snap(scaled: f64) -> f64 {
    let rounded = scaled.round();
    if (scaled - rounded).abs() <= 1e-9 * rounded.abs().max(1.0) {
        rounded
    } else {
        scaled
    }
}

/// Draws an `f64` between bounds whose scaled form does not fit an `i128`.
fn draw_wide(bounds: &Bounds, step: Option<f64>, decimal_places: u32) -> Result<(f64, String)> {
    let mut rng = rand::rng();
    for _ in 0..WIDE_ATTEMPTS {
        let r: f64 = rng.random();
        let mut value = (bounds.min * (1.0 - r) + bounds.max * r).clamp(bounds.min, bounds.max);
        if let Some(step) = step {
            value = (value / step).round() * step;
        }
        let rendered = format!("{:.prec$}", value, prec = decimal_places as usize);
        let value: f64 = rendered
            .parse()
            .map_err(|e| value_error(format!("invalid generated number \"{rendered}\": {e}")))?;
        if bounds.contains(value) {
            return Ok((value, rendered));
        }
    }
    Err(bounds.empty(decimal_places))
}

fn format_scaled(value: i128, scale: i128, decimal_places: usize) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let (magnitude, scale) = (value.unsigned_abs(), scale.unsigned_abs());
    let (whole, fraction) = (magnitude / scale, magnitude % scale);
    if decimal_places == 0 {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{fraction:0decimal_places$}")
    }
}
