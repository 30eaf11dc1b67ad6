//! Utility helpers shared across the Kling tool suite.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Truncate a string to a maximum number of characters, without a marker.
/// Used for clipping response bodies in error messages.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Clip a prompt for display, appending "..." when it was longer.
#[must_use]
pub fn preview(s: &str, max_chars: usize) -> String {
    let clipped: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        format!("{clipped}...")
    } else {
        clipped
    }
}

/// Render JSON with pretty formatting, falling back to a compact string on error.
#[must_use]
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_verbatim_when_short() {
        assert_eq!(preview("hello", 80), "hello");
    }

    #[test]
    fn preview_clips_and_marks_long_input() {
        let long = "x".repeat(100);
        let shown = preview(&long, 80);
        assert_eq!(shown.len(), 83);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        let s = "日本語のプロンプト";
        assert_eq!(truncate_chars(s, 3), "日本語");
        assert_eq!(preview(s, 3), "日本語...");
    }
}
