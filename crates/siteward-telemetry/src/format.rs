//! Structured log value formatting.
//!
//! Event fields are rendered one key per line, indented two spaces per
//! nesting level:
//!
//! ```text
//!
//!   site_id: 42
//!   hosts:
//!     a.example.com
//!     b.example.com
//!   owners:
//!    -name: alice
//!     role: admin
//! ```

use std::fmt;

const INDENTATION: usize = 2;

/// A structured value attached to a log event.
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Text(String),
    List(Vec<LogValue>),
    Map(Vec<(String, LogValue)>),
}

impl LogValue {
    /// Interpret a field value, expanding JSON objects and arrays into
    /// nested values. Anything else stays text.
    pub fn parse_field(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) {
                return json.into();
            }
        }
        LogValue::Text(raw.to_string())
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => LogValue::Text(s),
            serde_json::Value::Array(items) => {
                LogValue::List(items.into_iter().map(LogValue::from).collect())
            }
            serde_json::Value::Object(map) => LogValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, LogValue::from(value)))
                    .collect(),
            ),
            other => LogValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Text(text) => f.write_str(text),
            LogValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            LogValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Render top-level event fields.
pub fn format_log_values(values: &[(String, LogValue)]) -> String {
    let mut out = String::new();
    write_log_values(&mut out, values, 1, false);
    out
}

/// Append `values` to `out` at nesting `level`. With `bullet` set the
/// first key is marked with `-` in the last indent column.
pub fn write_log_values(out: &mut String, values: &[(String, LogValue)], level: usize, bullet: bool) {
    for (i, (key, value)) in values.iter().enumerate() {
        out.push('\n');
        if bullet && i == 0 {
            indent(out, level * INDENTATION - 1);
            out.push('-');
        } else {
            indent(out, level * INDENTATION);
        }
        out.push_str(key);
        out.push_str(": ");

        match value {
            LogValue::List(items) => {
                for item in items {
                    match item {
                        LogValue::Map(entries) => write_log_values(out, entries, level + 1, true),
                        scalar => {
                            out.push('\n');
                            indent(out, (level + 1) * INDENTATION);
                            out.push_str(&scalar.to_string());
                        }
                    }
                }
            }
            LogValue::Map(entries) => write_log_values(out, entries, level + 1, false),
            LogValue::Text(text) => out.push_str(text),
        }
    }
}

fn indent(out: &mut String, width: usize) {
    out.extend(std::iter::repeat_n(' ', width));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> LogValue {
        LogValue::Text(s.to_string())
    }

    fn entry(key: &str, value: LogValue) -> (String, LogValue) {
        (key.to_string(), value)
    }

    #[test]
    fn flat_fields_one_per_line() {
        let out = format_log_values(&[entry("site", text("s1")), entry("status", text("ok"))]);
        assert_eq!(out, "\n  site: s1\n  status: ok");
    }

    #[test]
    fn scalar_list_items_on_own_lines() {
        let out = format_log_values(&[entry(
            "hosts",
            LogValue::List(vec![text("a.example.com"), text("b.example.com")]),
        )]);
        assert_eq!(out, "\n  hosts: \n    a.example.com\n    b.example.com");
    }

    #[test]
    fn nested_map_indents_without_bullet() {
        let out = format_log_values(&[entry(
            "request",
            LogValue::Map(vec![entry("path", text("/admin")), entry("ip", text("10.0.0.1"))]),
        )]);
        assert_eq!(out, "\n  request: \n    path: /admin\n    ip: 10.0.0.1");
    }

    #[test]
    fn maps_in_lists_are_bulleted() {
        let owner = |name: &str, role: &str| {
            LogValue::Map(vec![entry("name", text(name)), entry("role", text(role))])
        };
        let out = format_log_values(&[entry(
            "owners",
            LogValue::List(vec![owner("alice", "admin"), owner("bob", "editor")]),
        )]);
        assert_eq!(
            out,
            "\n  owners: \n   -name: alice\n    role: admin\n   -name: bob\n    role: editor"
        );
    }

    #[test]
    fn json_fields_are_expanded() {
        assert_eq!(
            LogValue::parse_field(r#"{"a": [1, "x"]}"#),
            LogValue::Map(vec![entry("a", LogValue::List(vec![text("1"), text("x")]))])
        );
        assert_eq!(LogValue::parse_field("{not json"), text("{not json"));
        assert_eq!(LogValue::parse_field("plain"), text("plain"));
    }

    #[test]
    fn nested_list_in_list_renders_inline() {
        let out = format_log_values(&[entry(
            "grid",
            LogValue::List(vec![LogValue::List(vec![text("1"), text("2")])]),
        )]);
        assert_eq!(out, "\n  grid: \n    [1, 2]");
    }
}
