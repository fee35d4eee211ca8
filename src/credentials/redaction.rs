//! Blanking of secret credential fields before they leave the server, and
//! restoring them when a redacted payload comes back.

use serde_json::{Map, Value};

use super::credential_types::CredentialType;

/// Placeholder for a secret that has a value.
pub const CREDENTIAL_BLANKING_VALUE: &str = "__n8n_BLANK_VALUE_e5362baf-c777-4d57-a609-6eaf1f9e87f6";

/// Placeholder for a secret that is empty.
pub const CREDENTIAL_EMPTY_VALUE: &str = "__n8n_EMPTY_VALUE_7b1af746-3729-4c60-9b9b-e08eb29e58da";

/// Keys that are always blanked, whatever the credential type says.
const ALWAYS_REDACTED: &[&str] = &["oauthTokenData", "csrfSecret"];

/// Copy of `data` with secret fields replaced by placeholders.
///
/// Password properties of `credential_type` are blanked unless they hold an
/// expression (`={{ ... }}`) on a property that allows expressions. Without a
/// known type only the always-secret keys are blanked.
pub fn redact(data: &Map<String, Value>, credential_type: Option<&CredentialType>) -> Map<String, Value> {
    let mut copy = data.clone();

    for (key, value) in copy.iter_mut() {
        if ALWAYS_REDACTED.contains(&key.as_str()) {
            *value = placeholder_for(value);
            continue;
        }

        let Some(property) = credential_type.and_then(|t| t.property(key)) else {
            continue;
        };
        if !property.is_password() {
            continue;
        }
        let is_expression = value.as_str().is_some_and(|s| s.starts_with("={{"));
        if !is_expression || property.no_data_expression {
            *value = placeholder_for(value);
        }
    }

    copy
}

/// Copy of `redacted` with every placeholder replaced by the value stored in
/// `saved` under the same key, recursing into nested objects.
pub fn unredact(redacted: &Map<String, Value>, saved: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = redacted.clone();
    restore_values(&mut merged, saved);
    merged
}

fn restore_values(unmerged: &mut Map<String, Value>, replacement: &Map<String, Value>) {
    for (key, value) in unmerged.iter_mut() {
        if is_placeholder(value) {
            *value = replacement.get(key).cloned().unwrap_or(Value::Null);
            continue;
        }
        if let (Value::Object(nested), Some(Value::Object(saved))) = (value, replacement.get(key)) {
            restore_values(nested, saved);
        }
    }
}

fn placeholder_for(value: &Value) -> Value {
    let is_empty = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if is_empty {
        Value::String(CREDENTIAL_EMPTY_VALUE.to_string())
    } else {
        Value::String(CREDENTIAL_BLANKING_VALUE.to_string())
    }
}

fn is_placeholder(value: &Value) -> bool {
    matches!(value.as_str(), Some(CREDENTIAL_BLANKING_VALUE | CREDENTIAL_EMPTY_VALUE))
}
