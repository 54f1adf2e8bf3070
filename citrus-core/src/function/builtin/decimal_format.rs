//! Decimal format patterns for rendering generated numbers.
//!
//! Supported: `#` and `0` digits, `,` grouping, one `.`, and a scientific
//! `E0` exponent with a single integer digit in the mantissa. Any text before or
//! after the number is copied as is.
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("invalid decimal format pattern \"{0}\"")]
pub struct InvalidPattern(String);

#[derive(Debug, Clone, PartialEq)]
pub struct DecimalFormat {
    prefix: String,
    suffix: String,
    min_integer_digits: usize,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
    grouping: Option<usize>,
    min_exponent_digits: Option<usize>,
}

fn is_number_char(c: char) -> bool {
    matches!(c, '#' | '0' | ',' | '.')
}

impl FromStr for DecimalFormat {
    type Err = InvalidPattern;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPattern(pattern.to_string());

        let start = pattern.find(is_number_char).ok_or_else(invalid)?;
        let (prefix, rest) = pattern.split_at(start);
        let end = rest.find(|c| !is_number_char(c)).unwrap_or(rest.len());
        let (number, mut suffix) = rest.split_at(end);

        let mut min_exponent_digits = None;
        if let Some(exponent) = suffix.strip_prefix('E') {
            let zeros = exponent.chars().take_while(|&c| c == '0').count();
            if zeros > 0 {
                min_exponent_digits = Some(zeros);
                suffix = &exponent[zeros..];
            }
        }

        let (integer, fraction) = match number.split_once('.') {
            Some((_, fraction)) if fraction.contains('.') => return Err(invalid()),
            Some((integer, fraction)) => (integer, fraction),
            None => (number, ""),
        };
        if fraction.contains(',') || fraction.trim_start_matches('0').contains('0') {
            return Err(invalid());
        }
        if integer.chars().chain(fraction.chars()).all(|c| c == ',') {
            return Err(invalid());
        }

        let grouping = match integer.rsplit_once(',') {
            Some(_) if min_exponent_digits.is_some() => return Err(invalid()),
            Some((_, "")) => return Err(invalid()),
            Some((_, group)) => Some(group.len()),
            None => None,
        };

        Ok(DecimalFormat {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            min_integer_digits: integer.chars().filter(|&c| c == '0').count(),
            min_fraction_digits: fraction.chars().filter(|&c| c == '0').count(),
            max_fraction_digits: fraction.len(),
            grouping,
            min_exponent_digits,
        })
    }
}

impl DecimalFormat {
    /// Renders `value`, which must be finite.
    pub fn format(&self, value: f64) -> String {
        let number = match self.min_exponent_digits {
            Some(digits) => self.scientific(value.abs(), digits),
            None => self.fixed(value.abs()),
        };
        let sign = if value.is_sign_negative() && number.chars().any(|c| ('1'..='9').contains(&c)) {
            "-"
        } else {
            ""
        };
        format!("{sign}{}{number}{}", self.prefix, self.suffix)
    }

    fn fixed(&self, magnitude: f64) -> String {
        let rendered = format!("{:.prec$}", magnitude, prec = self.max_fraction_digits);
        let (integer, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
        let fraction = self.trim_fraction(fraction);

        let integer = if integer == "0" && self.min_integer_digits == 0 && !fraction.is_empty() {
            ""
        } else {
            integer
        };
        let integer = format!("{:0>width$}", integer, width = self.min_integer_digits);
        let integer = match self.grouping {
            Some(size) => group(&integer, size),
            None => integer,
        };

        if fraction.is_empty() {
            integer
        } else {
            format!("{integer}.{fraction}")
        }
    }

    fn scientific(&self, magnitude: f64, min_exponent_digits: usize) -> String {
        let rendered = format!("{:.prec$e}", magnitude, prec = self.max_fraction_digits);
        let (mantissa, exponent) = rendered.split_once('e').unwrap_or((rendered.as_str(), "0"));
        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let fraction = self.trim_fraction(fraction);

        let (exponent_sign, exponent) = match exponent.strip_prefix('-') {
            Some(exponent) => ("-", exponent),
            None => ("", exponent),
        };
        let exponent = format!("{exponent:0>min_exponent_digits$}");

        if fraction.is_empty() {
            format!("{integer}E{exponent_sign}{exponent}")
        } else {
            format!("{integer}.{fraction}E{exponent_sign}{exponent}")
        }
    }

    /// Drops trailing zeros beyond the minimum fraction digits.
    fn trim_fraction<'a>(&self, fraction: &'a str) -> &'a str {
        let significant = fraction.trim_end_matches('0').len();
        &fraction[..significant.max(self.min_fraction_digits).min(fraction.len())]
    }
}

fn group(digits: &str, size: usize) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / size);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % size == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    fn format(pattern: &str, value: f64) -> String {
        pattern.parse::<DecimalFormat>().unwrap().format(value)
    }

    #[test_case("#,###.000", 1234567.1234 => "1,234,567.123"; "grouping")]
    #[test_case("#,##0", -1234.6 => "-1,235"; "negative grouping")]
    #[test_case("#.000", 1234567.5 => "1234567.500"; "fixed fraction")]
    #[test_case("0.00", 0.5 => "0.50"; "leading zero")]
    #[test_case("#.##", 0.5 => ".5"; "no integer digits")]
    #[test_case("#.##", 2.0 => "2"; "optional fraction dropped")]
    #[test_case("000", 7.0 => "007"; "minimum integer digits")]
    #[test_case("#.###E0", 1234567.0 => "1.235E6"; "scientific")]
    #[test_case("0.###E00", 0.00012 => "1.2E-04"; "negative exponent")]
    #[test_case("$#,##0.00 total", 1234.5 => "$1,234.50 total"; "prefix and suffix")]
    #[test_case("0 EUR", 3.0 => "3 EUR"; "suffix starting with E")]
    #[test_case("0.0", -0.01 => "0.0"; "negative zero")]
    fn format_value(pattern: &str, value: f64) -> String {
        format(pattern, value)
    }

    #[test_case("abc"; "no digits")]
    #[test_case("#.#.#"; "two decimal points")]
    #[test_case("#,.0"; "empty group")]
    #[test_case("0.#0"; "zero after optional fraction digit")]
    #[test_case("#,##0E0"; "grouped scientific")]
    fn invalid(pattern: &str) {
        assert!(pattern.parse::<DecimalFormat>().is_err());
    }
}
