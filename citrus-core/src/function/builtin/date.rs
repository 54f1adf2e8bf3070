use std::fmt::Write;

use chrono::{
    format::{Item, StrftimeItems},
    Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc,
};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{expect_parameters, value_error};
use crate::{context::TestContext, Error, Result};

const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

static OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])?((?:\d+[yMdhms])+)$").expect("valid offset regex"));
static OFFSET_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)([yMdhms])").expect("valid offset part regex"));

fn validated_format(format: &str) -> Result<Vec<Item<'_>>> {
    let items: Vec<_> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(value_error(format!("invalid date format \"{format}\"")));
    }
    Ok(items)
}

fn render(date: NaiveDateTime, format: &str) -> Result<String> {
    let items = validated_format(format)?;
    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.iter()))
        .map_err(|_| value_error(format!("unable to format date with \"{format}\"")))?;
    Ok(out)
}

fn parse_date(raw: &str, format: &str) -> Result<NaiveDateTime> {
    validated_format(format)?;
    NaiveDateTime::parse_from_str(raw, format)
        .or_else(|_| NaiveDate::parse_from_str(raw, format).map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| value_error(format!("unable to parse date \"{raw}\" with \"{format}\": {e}")))
}

/// Applies an offset such as `+1y2M`, `-3d` or `12h30m` to `date`.
fn apply_offset(date: NaiveDateTime, offset: &str) -> Result<NaiveDateTime> {
    let offset = offset.trim();
    let captures = OFFSET.captures(offset).ok_or_else(|| {
        Error::InvalidFunctionUsage(format!(
            "invalid date offset \"{offset}\", expected e.g. +1y2M3d or -4h5m6s"
        ))
    })?;
    let negative = captures.get(1).is_some_and(|sign| sign.as_str() == "-");

    let overflow = || value_error(format!("date offset \"{offset}\" out of range"));
    let mut result = date;
    for part in OFFSET_PART.captures_iter(&captures[2]) {
        let amount: u32 = part[1].parse().map_err(|_| overflow())?;
        result = match &part[2] {
            "y" | "M" => {
                let months = if &part[2] == "y" {
                    amount.checked_mul(12).ok_or_else(overflow)?
                } else {
                    amount
                };
                if negative {
                    result.checked_sub_months(Months::new(months))
                } else {
                    result.checked_add_months(Months::new(months))
                }
            }
            "d" => {
                if negative {
                    result.checked_sub_days(Days::new(amount.into()))
                } else {
                    result.checked_add_days(Days::new(amount.into()))
                }
            }
            unit => {
                let delta = match unit {
                    "h" => TimeDelta::try_hours(amount.into()),
                    "m" => TimeDelta::try_minutes(amount.into()),
                    _ => TimeDelta::try_seconds(amount.into()),
                }
                .ok_or_else(overflow)?;
                if negative {
                    result.checked_sub_signed(delta)
                } else {
                    result.checked_add_signed(delta)
                }
            }
        }
        .ok_or_else(overflow)?;
    }
    Ok(result)
}

/// `currentDate([format][, offset])`, the format uses strftime syntax.
pub fn current_date(parameters: &[String], _: &TestContext) -> Result<String> {
    let format = parameters.first().map_or(DEFAULT_DATE_FORMAT, String::as_str);
    let mut now = Local::now().naive_local();
    if let Some(offset) = parameters.get(1) {
        now = apply_offset(now, offset)?;
    }
    render(now, format)
}

/// `changeDate(date[, offset][, format])`.
pub fn change_date(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "changeDate(date[, offset][, format])")?;
    let format = parameters.get(2).map_or(DEFAULT_DATE_FORMAT, String::as_str);
    let mut date = parse_date(&parameters[0], format)?;
    if let Some(offset) = parameters.get(1) {
        date = apply_offset(date, offset)?;
    }
    render(date, format)
}

/// Seconds since the unix epoch.
pub fn unix_timestamp(_: &[String], _: &TestContext) -> Result<String> {
    Ok(Utc::now().timestamp().to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    fn resolve(expression: &str) -> Result<String> {
        TestContext::default().replace_dynamic_content(expression)
    }

    #[test_case("citrus:changeDate('01.01.2024', '+1d')" => "02.01.2024"; "add day")]
    #[test_case("citrus:changeDate('31.01.2024', '+1M')" => "29.02.2024"; "month end clamps")]
    #[test_case("citrus:changeDate('01.03.2024', '-1y1d')" => "28.02.2023"; "subtract")]
    #[test_case("citrus:changeDate('15.06.2024', '2y')" => "15.06.2026"; "unsigned offset")]
    #[test_case("citrus:changeDate('2024-01-01 23:30', '+45m', '%Y-%m-%d %H:%M')" => "2024-01-02 00:15"; "minutes")]
    #[test_case("citrus:changeDate('2024-01-01', '-1d', '%Y-%m-%d')" => "2023-12-31"; "date only format")]
    fn change(expression: &str) -> String {
        resolve(expression).unwrap()
    }

    #[test]
    fn current_date_default_format() -> eyre::Result<()> {
        let today = Local::now().format(DEFAULT_DATE_FORMAT).to_string();
        let resolved = resolve("citrus:currentDate()")?;
        // the day may roll over between the two reads
        assert!(
            resolved == today || NaiveDate::parse_from_str(&resolved, DEFAULT_DATE_FORMAT).is_ok(),
            "{resolved}"
        );
        Ok(())
    }

    #[test]
    fn current_date_with_offset() -> eyre::Result<()> {
        let resolved = resolve("citrus:currentDate('%Y', '+1y')")?;
        let year: i32 = resolved.parse()?;
        assert!(year > 2000);
        Ok(())
    }

    #[test]
    fn unix_timestamp_is_seconds() -> eyre::Result<()> {
        let before = Utc::now().timestamp();
        let resolved: i64 = resolve("citrus:unixTimestamp()")?.parse()?;
        assert!(resolved >= before && resolved <= before + 5);
        Ok(())
    }

    #[test]
    fn invalid_offset() {
        assert!(matches!(
            resolve("citrus:changeDate('01.01.2024', '+1w')"),
            Err(Error::InvalidFunctionUsage(_))
        ));
    }

    #[test_case("citrus:changeDate('2024/01/01', '+1d')"; "unparsable date")]
    #[test_case("citrus:currentDate('%Q')"; "invalid format")]
    fn value_errors(expression: &str) {
        assert!(matches!(resolve(expression), Err(Error::ValueError(_))));
    }

    #[test]
    fn offset_parts() -> eyre::Result<()> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            apply_offset(date, "+1y1M1d1h1m1s")?,
            NaiveDate::from_ymd_opt(2025, 2, 2)
                .unwrap()
                .and_hms_opt(1, 1, 1)
                .unwrap()
        );
        Ok(())
    }
}
