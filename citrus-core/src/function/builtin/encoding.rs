use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::percent_decode_str;
use url::form_urlencoded::byte_serialize;

use super::{expect_parameters, value_error};
use crate::{context::TestContext, Result};

pub fn encode_base64(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "encodeBase64(value)")?;
    Ok(STANDARD.encode(parameters[0].as_bytes()))
}

pub fn decode_base64(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "decodeBase64(value)")?;
    let bytes = STANDARD
        .decode(parameters[0].trim())
        .map_err(|e| value_error(format!("invalid base64 \"{}\": {e}", parameters[0])))?;
    String::from_utf8(bytes).map_err(|e| value_error(format!("decoded value is not UTF-8: {e}")))
}

/// Form URL encoding, spaces become `+`.
pub fn url_encode(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "urlEncode(value)")?;
    Ok(byte_serialize(parameters[0].as_bytes()).collect())
}

pub fn url_decode(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "urlDecode(value)")?;
    let value = parameters[0].replace('+', " ");
    percent_decode_str(&value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| value_error(format!("decoded value is not UTF-8: {e}")))
}

pub fn escape_xml(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "escapeXml(value)")?;
    let mut escaped = String::with_capacity(parameters[0].len());
    for c in parameters[0].chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    Ok(escaped)
}

pub fn cdata_section(parameters: &[String], _: &TestContext) -> Result<String> {
    expect_parameters(parameters, 1, "cdataSection(value)")?;
    Ok(format!("<![CDATA[{}]]>", parameters[0]))
}
