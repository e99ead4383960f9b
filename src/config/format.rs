//! The `key=value` configuration file format.
//!
//! # Supported Formats
//!
//! - Entries: `key=value`, whitespace around key and value trimmed
//! - Comments: lines starting with `#`
//! - Escapes in values: `\n`, `\r`, `\t`, `\\`, `\"`, `\'`, `\=`
//!
//! Lines without `=` are skipped.

use std::collections::BTreeMap;
use tracing::warn;

/// Header written at the top of every saved file.
pub const FILE_HEADER: &str =
    "# Parallax Configuration File\n# Generated automatically, do not edit manually\n\n";

/// Parse file content into a key/value map.
///
/// ```
/// use parallax_env::config::parse_config;
///
/// let values = parse_config("# comment\nproxy_url = http://127.0.0.1:7890\n");
/// assert_eq!(values.get("proxy_url").map(String::as_str), Some("http://127.0.0.1:7890"));
/// ```
pub fn parse_config(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Some((key, value)) => {
                values.insert(key, value);
            }
            None => warn!("Ignoring malformed config line {}: {}", number + 1, line),
        }
    }

    values
}

/// Render a key/value map as file content, header included.
pub fn render_config(values: &BTreeMap<String, String>) -> String {
    let mut out = String::from(FILE_HEADER);
    for (key, value) in values {
        out.push_str(key);
        out.push('=');
        out.push_str(&escape_value(value));
        out.push('\n');
    }
    out
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim_matches(|c| c == ' ' || c == '\t');
    let value = value.trim_matches(|c| c == ' ' || c == '\t');
    Some((key.to_string(), unescape_value(value)))
}

/// Escape characters that would break a single `key=value` line.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '=' => out.push_str("\\="),
            other => out.push(other),
        }
    }
    out
}

/// Reverse [`escape_value`]. Unknown escapes yield the escaped character;
/// a trailing lone backslash is kept.
pub fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
