//! Sensitive value masking for variable logging.
//!
//! Values of variables whose name looks like it holds a credential are replaced
//! with a mask before they reach the logs.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::variable::value_to_string;

/// The mask string used to replace sensitive values.
const MASK: &str = "****";

/// Global flag for masking, initialised from `[masking] enabled`.
static MASK_SENSITIVE: AtomicBool = AtomicBool::new(true);

/// Sets whether sensitive values should be masked.
pub fn set_mask_sensitive(enabled: bool) {
    MASK_SENSITIVE.store(enabled, Ordering::Relaxed);
}

/// Returns whether sensitive values should be masked.
pub fn should_mask_sensitive() -> bool {
    MASK_SENSITIVE.load(Ordering::Relaxed)
}

/// Name fragments marking a variable as sensitive (case-insensitive comparison).
const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "token",
    "apikey",
    "api_key",
    "credential",
];

/// Whether the variable name contains a sensitive keyword.
pub fn is_sensitive(name: &str) -> bool {
    let name = name.to_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

/// Renders a variable value for logging, masked if the name is sensitive.
///
/// # Examples
///
/// ```
/// use citrus_core::masking::mask_variable;
/// use serde_json::json;
///
/// assert_eq!(mask_variable("userPassword", &json!("hunter2")), "****");
/// assert_eq!(mask_variable("user", &json!("Ann")), "Ann");
/// ```
pub fn mask_variable(name: &str, value: &Value) -> String {
    if should_mask_sensitive() && is_sensitive(name) {
        MASK.to_string()
    } else {
        value_to_string(value)
    }
}
