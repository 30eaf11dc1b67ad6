//! Media input coercion into the wire representation.
//!
//! The API accepts images and masks either as base64 payloads or as plain
//! URLs. Callers resolve their input into an explicit [`MediaInput`] variant
//! up front; there is no runtime type probing.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

use crate::error::ParameterError;

/// A media reference supplied by the caller.
pub enum MediaInput {
    /// Raw bytes, encoded to base64 on resolve.
    Bytes(Vec<u8>),
    /// A readable handle whose contents are encoded to base64.
    Reader(Box<dyn Read + Send>),
    /// A textual reference: data URI, bare URL, or pre-encoded base64.
    Text(String),
}

impl MediaInput {
    /// Build a media input from a tool parameter. Only strings are media
    /// candidates; anything else is treated as absent.
    #[must_use]
    pub fn from_param(value: Option<&Value>) -> Option<Self> {
        value
            .and_then(Value::as_str)
            .map(|s| Self::Text(s.to_string()))
    }

    /// Resolve into the wire representation.
    ///
    /// Bytes and readers are base64-encoded. For text: a blank string means
    /// "absent"; a `data:` URI yields its payload portion verbatim; any other
    /// string passes through unchanged. A bare base64 string and a bare URL
    /// are indistinguishable here — both pass through, and the caller is
    /// responsible for shaping the input.
    pub fn resolve(self) -> Result<Option<String>, ParameterError> {
        match self {
            Self::Bytes(bytes) => Ok(Some(STANDARD.encode(bytes))),
            Self::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|e| ParameterError::MediaRead(e.to_string()))?;
                Ok(Some(STANDARD.encode(bytes)))
            }
            Self::Text(s) => {
                let text = s.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                if text.starts_with("data:") {
                    if let Some((_, payload)) = text.split_once(',') {
                        return Ok(Some(payload.to_string()));
                    }
                }
                Ok(Some(text.to_string()))
            }
        }
    }
}

/// Resolve a single media parameter by field name.
pub fn resolve_media_param(params: &Value, field: &str) -> Result<Option<String>, ParameterError> {
    match MediaInput::from_param(params.get(field)) {
        Some(input) => input.resolve(),
        None => Ok(None),
    }
}

/// Map a sequence of media inputs into `{field: resolved}` entries, skipping
/// anything that resolves to absent.
pub fn resolve_files_to_list(
    files: Vec<MediaInput>,
    field: &str,
) -> Result<Vec<Value>, ParameterError> {
    let mut entries = Vec::new();
    for input in files {
        if let Some(resolved) = input.resolve()? {
            entries.push(json!({ field: resolved }));
        }
    }
    Ok(entries)
}

/// Resolve a JSON array parameter of media references into `{field: ...}`
/// entries. Non-string items are skipped.
pub fn resolve_value_list(items: &[Value], field: &str) -> Result<Vec<Value>, ParameterError> {
    let inputs = items
        .iter()
        .filter_map(|item| MediaInput::from_param(Some(item)))
        .collect();
    resolve_files_to_list(inputs, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bytes_are_base64_encoded() {
        let resolved = MediaInput::Bytes(b"\x00\x01\x02".to_vec()).resolve().unwrap();
        assert_eq!(resolved, Some("AAEC".to_string()));
    }

    #[test]
    fn reader_contents_are_base64_encoded() {
        let reader: Box<dyn std::io::Read + Send> = Box::new(std::io::Cursor::new(b"abc".to_vec()));
        let resolved = MediaInput::Reader(reader).resolve().unwrap();
        assert_eq!(resolved, Some("YWJj".to_string()));
    }

    #[test]
    fn data_uri_payload_passes_verbatim() {
        let input = MediaInput::Text("data:image/png;base64,iVBORw0KGgo=".to_string());
        assert_eq!(input.resolve().unwrap(), Some("iVBORw0KGgo=".to_string()));
    }

    #[test]
    fn plain_urls_pass_through() {
        let input = MediaInput::Text("https://example.com/frame.png".to_string());
        assert_eq!(
            input.resolve().unwrap(),
            Some("https://example.com/frame.png".to_string())
        );
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(MediaInput::Text("   ".to_string()).resolve().unwrap(), None);
        assert_eq!(MediaInput::Text(String::new()).resolve().unwrap(), None);
    }

    #[test]
    fn file_list_skips_absent_entries() {
        let items = vec![
            json!("https://example.com/a.png"),
            json!(""),
            json!(42),
            json!("data:image/png;base64,QUJD"),
        ];
        let entries = resolve_value_list(&items, "image").unwrap();
        assert_eq!(
            entries,
            vec![
                json!({"image": "https://example.com/a.png"}),
                json!({"image": "QUJD"}),
            ]
        );
    }
}
