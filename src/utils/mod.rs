//! Utility functions and helpers

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

/// Placeholders understood in output name templates
static NAME_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(name|ext|hash)(?::(\d+))?\]").unwrap()
});

/// Generate a hex hash of the given content, truncated to `len` characters
pub fn hash_content(content: &[u8], len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let mut hash = hex::encode(hasher.finalize());
    hash.truncate(len);
    hash
}

/// Render an output name template such as `[hash:10].[ext]`
///
/// `[hash]` without a length uses the full digest. Unknown placeholders are
/// left untouched.
pub fn render_name(template: &str, path: &Path, content: &[u8]) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    NAME_PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "name" => stem.to_string(),
            "ext" => ext.to_string(),
            _ => {
                let len = caps
                    .get(2)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(64);
                hash_content(content, len)
            }
        })
        .into_owned()
}

/// Get relative path from base to target
pub fn relative_path(from: &Path, to: &Path) -> Option<String> {
    pathdiff::diff_paths(to, from)
        .map(|p| normalize_path(&p))
}

/// Convert a file path to the `/`-separated form matchers are tested against
pub fn normalize_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
}

/// Lowercased file extension, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}
