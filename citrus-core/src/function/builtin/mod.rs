//! The built-in `citrus:` function library.
mod date;
mod decimal_format;
mod encoding;
mod numeric;
mod random;
mod resource;
mod string;

use super::{FunctionLibrary, Parameterized};
use crate::{Error, Result};

/// Name of the built-in library.
pub const CORE_LIBRARY_NAME: &str = "citrus";
/// Prefix of the built-in library.
pub const CORE_LIBRARY_PREFIX: &str = "citrus:";

/// Builds the built-in `citrus:` library.
pub fn library() -> FunctionLibrary {
    FunctionLibrary::new(CORE_LIBRARY_NAME, CORE_LIBRARY_PREFIX)
        .with_function("concat", string::concat)
        .with_function("substring", string::substring)
        .with_function("substringBefore", string::substring_before)
        .with_function("substringAfter", string::substring_after)
        .with_function("stringLength", string::string_length)
        .with_function("translate", string::translate)
        .with_function("upperCase", string::upper_case)
        .with_function("lowerCase", string::lower_case)
        .with_function("randomNumber", random::random_number)
        .with_function("randomString", random::random_string)
        .with_function("randomUUID", random::random_uuid)
        .with_function("randomEnumValue", random::random_enum_value)
        .with_function("advancedRandomNumber", Parameterized(random::AdvancedRandomNumber))
        .with_function("currentDate", date::current_date)
        .with_function("changeDate", date::change_date)
        .with_function("unixTimestamp", date::unix_timestamp)
        .with_function("sum", numeric::sum)
        .with_function("average", numeric::average)
        .with_function("min", numeric::min)
        .with_function("max", numeric::max)
        .with_function("ceiling", numeric::ceiling)
        .with_function("floor", numeric::floor)
        .with_function("round", numeric::round)
        .with_function("absolute", numeric::absolute)
        .with_function("encodeBase64", encoding::encode_base64)
        .with_function("decodeBase64", encoding::decode_base64)
        .with_function("urlEncode", encoding::url_encode)
        .with_function("urlDecode", encoding::url_decode)
        .with_function("escapeXml", encoding::escape_xml)
        .with_function("cdataSection", encoding::cdata_section)
        .with_function("env", resource::env)
        .with_function("systemProperty", resource::env)
        .with_function("readFile", resource::read_file)
}

/// Fails unless at least `min` parameters were passed.
fn expect_parameters(parameters: &[String], min: usize, usage: &str) -> Result<()> {
    if parameters.len() < min {
        return Err(Error::InvalidFunctionUsage(format!(
            "expected {usage}, got {} parameters",
            parameters.len()
        )));
    }
    Ok(())
}

fn value_error(message: String) -> Error {
    Error::ValueError(eyre::eyre!(message))
}

#[cfg(test)]
mod test {
    use crate::TestContext;
    use pretty_assertions::assert_eq;

    #[test]
    fn library_prefix_and_size() {
        let library = super::library();
        assert_eq!(library.prefix(), "citrus:");
        assert!(library.knows_function("citrus:concat('a')"));
        assert!(library.knows_function("citrus:advancedRandomNumber()"));
        assert_eq!(library.len(), 33);
    }

    #[test]
    fn functions_resolve_through_context() -> eyre::Result<()> {
        let context = TestContext::default();
        assert_eq!(
            context.replace_dynamic_content(
                "citrus:concat(citrus:substring('Hello World', 6), citrus:stringLength('abc'))"
            )?,
            "World3"
        );
        Ok(())
    }
}
