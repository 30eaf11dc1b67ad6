//! Tolerant parsing of tool parameters into request-ready values.
//!
//! Tool parameters arrive as an untyped JSON mapping; these helpers accept
//! the loose shapes hosts actually send (strings holding JSON, string
//! booleans, numbers as strings) and normalize them for payload assembly.

use chrono::{Local, LocalResult, TimeZone};
use serde_json::{json, Value};

use crate::error::ParameterError;

/// Parse a parameter that may be structured JSON or a JSON string.
///
/// Arrays and objects pass through unchanged. A non-empty string must parse
/// as JSON. Null and blank strings mean "omit the field".
pub fn parse_json_param(value: Option<&Value>, field: &str) -> Result<Option<Value>, ParameterError> {
    let Some(value) = value else { return Ok(None) };
    match value {
        Value::Null => Ok(None),
        Value::Array(_) | Value::Object(_) => Ok(Some(value.clone())),
        Value::String(s) => {
            let text = s.trim();
            if text.is_empty() {
                return Ok(None);
            }
            serde_json::from_str(text)
                .map(Some)
                .map_err(|_| ParameterError::InvalidJson {
                    field: field.to_string(),
                })
        }
        _ => Err(ParameterError::UnsupportedType {
            field: field.to_string(),
        }),
    }
}

/// Like [`parse_json_param`] but also drops empty results (`[]`, `{}`, `""`),
/// which are omitted from payloads just like absent fields.
pub fn parsed_json_field(params: &Value, field: &str) -> Result<Option<Value>, ParameterError> {
    Ok(parse_json_param(params.get(field), field)?.filter(json_truthy))
}

/// Loose truthiness used when deciding whether an optional field was
/// actually supplied.
#[must_use]
pub fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Tri-state boolean: true/1/yes and false/0/no strings, real booleans, and
/// anything else falls back to the provided default.
#[must_use]
pub fn parse_bool(value: Option<&Value>, default: Option<bool>) -> Option<bool> {
    let Some(value) = value else { return default };
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => default,
        },
        _ => default,
    }
}

/// Build the `watermark_info` payload fragment. A `None` result means the
/// field is omitted entirely, never sent as `false`.
#[must_use]
pub fn build_watermark_info(value: Option<&Value>) -> Option<Value> {
    parse_bool(value, None).map(|flag| json!({ "enabled": flag }))
}

/// Render an epoch-milliseconds value as local "YYYY-MM-DD HH:MM:SS".
/// Anything unusable (null, zero, non-numeric, out of range) renders "N/A".
#[must_use]
pub fn format_timestamp(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };
    let millis: i64 = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    if millis == 0 {
        return "N/A".to_string();
    }
    match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        LocalResult::None => "N/A".to_string(),
    }
}

/// Prefer a trimmed `task_id`, falling back to `external_task_id`.
pub fn resolve_task_id(params: &Value) -> Result<String, ParameterError> {
    let task_id = str_field(params, "task_id").map(|s| s.trim().to_string());
    if let Some(id) = task_id.filter(|s| !s.is_empty()) {
        return Ok(id);
    }
    let external = str_field(params, "external_task_id").map(|s| s.trim().to_string());
    if let Some(id) = external.filter(|s| !s.is_empty()) {
        return Ok(id);
    }
    Err(ParameterError::MissingTaskId)
}

/// Raw string field access.
#[must_use]
pub fn str_field<'a>(params: &'a Value, field: &str) -> Option<&'a str> {
    params.get(field).and_then(Value::as_str)
}

/// Non-empty string field, for optional payload values gated on presence.
#[must_use]
pub fn nonempty_str(params: &Value, field: &str) -> Option<String> {
    str_field(params, field)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trimmed, non-empty string field (prompts, names, ids).
#[must_use]
pub fn trimmed_str(params: &Value, field: &str) -> Option<String> {
    str_field(params, field)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String-boolean flag: any supplied value is rendered to text and compared
/// against "true" (so `true`, `"true"` and `"TRUE"` all enable it, while
/// `"yes"` does not). Absent or null means "leave the field out".
#[must_use]
pub fn string_bool_flag(params: &Value, field: &str) -> Option<bool> {
    let value = params.get(field)?;
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(s.to_lowercase() == "true"),
        other => Some(other.to_string().to_lowercase() == "true"),
    }
}

/// Stringified scalar, used for fields the wire format wants as strings
/// (e.g. `duration`). Gated on loose truthiness.
#[must_use]
pub fn stringified(params: &Value, field: &str) -> Option<String> {
    let value = params.get(field)?;
    if !json_truthy(value) {
        return None;
    }
    Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Optional float, accepting numbers or numeric strings.
pub fn opt_f64(params: &Value, field: &str) -> Result<Option<f64>, ParameterError> {
    let Some(value) = params.get(field) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => s.trim().parse().map(Some).map_err(|_| {
            ParameterError::InvalidNumber {
                field: field.to_string(),
            }
        }),
        _ => Err(ParameterError::InvalidNumber {
            field: field.to_string(),
        }),
    }
}

/// Optional integer, accepting numbers or numeric strings.
pub fn opt_i64(params: &Value, field: &str) -> Result<Option<i64>, ParameterError> {
    let Some(value) = params.get(field) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))),
        Value::String(s) => s.trim().parse().map(Some).map_err(|_| {
            ParameterError::InvalidNumber {
                field: field.to_string(),
            }
        }),
        _ => Err(ParameterError::InvalidNumber {
            field: field.to_string(),
        }),
    }
}
