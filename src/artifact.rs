//! Markdown artifact parser
//!
//! Splits a markdown file into its YAML front matter and its body. The body
//! is returned byte-for-byte; only the front-matter block is interpreted.
//!
//! ```text
//! ---
//! date: 2026-02-12
//! topics: [testing, migration]
//! ---
//!
//! # Body (kept verbatim, including the blank line above)
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_yaml::Value;
use tracing::warn;

use crate::error::ParseError;

const MARKER: &str = "---";

/// Result of parsing one artifact.
///
/// When `error` is set the front matter was present but unusable: the map is
/// empty and `body` holds the full file contents.
#[derive(Debug, Clone, Default)]
pub struct ParsedArtifact {
    pub frontmatter: Frontmatter,
    pub body: String,
    pub error: Option<ParseError>,
}

impl ParsedArtifact {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Loosely-typed front-matter map. Consumers pull the fields they care
/// about and apply their own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter(BTreeMap<String, Value>);

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Scalar value rendered as a trimmed string. Empty strings count as
    /// missing.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// List of strings. Accepts a YAML sequence of scalars or a single
    /// comma-separated string. Duplicates are dropped, order is kept.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        let raw: Vec<String> = match self.0.get(key) {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(value) => scalar_to_string(value)
                .map(|s| s.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let mut out: Vec<String> = Vec::with_capacity(raw.len());
        for item in raw {
            let item = item.trim();
            if !item.is_empty() && !out.iter().any(|existing| existing == item) {
                out.push(item.to_string());
            }
        }
        out
    }

    /// Calendar date in `YYYY-MM-DD` form. Datetime strings are accepted and
    /// truncated to their date part.
    pub fn get_date(&self, key: &str) -> Option<NaiveDate> {
        self.get_str(key).and_then(|s| parse_date_prefix(&s))
    }
}

/// Parse a markdown file into front matter and body.
pub fn parse(contents: &str) -> ParsedArtifact {
    let Some((yaml, body)) = split_front_matter(contents) else {
        return ParsedArtifact {
            frontmatter: Frontmatter::default(),
            body: contents.to_string(),
            error: None,
        };
    };

    match parse_yaml(yaml) {
        Ok(frontmatter) => ParsedArtifact {
            frontmatter,
            body: body.to_string(),
            error: None,
        },
        Err(error) => ParsedArtifact {
            frontmatter: Frontmatter::default(),
            body: contents.to_string(),
            error: Some(error),
        },
    }
}

/// First level-one heading in a markdown body, without the `#`.
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Parse a leading `YYYY-MM-DD` from a string such as `2026-02-12-session`
/// or `2026-02-12T10:00:00Z`.
pub fn parse_date_prefix(s: &str) -> Option<NaiveDate> {
    let prefix = s.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Locate the front-matter block. Returns the YAML text and the remainder of
/// the file after the closing marker line. The opening marker must be the
/// very first line; an unterminated block is treated as ordinary content.
fn split_front_matter(contents: &str) -> Option<(&str, &str)> {
    let mut lines = contents.split_inclusive('\n');
    let first = lines.next()?;
    if !is_marker(first) || !first.ends_with('\n') {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if is_marker(line) {
            return Some((&contents[yaml_start..offset], &contents[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn is_marker(line: &str) -> bool {
    line.trim_end() == MARKER
}

fn parse_yaml(yaml: &str) -> Result<Frontmatter, ParseError> {
    let value: Value = serde_yaml::from_str(yaml)?;
    match value {
        Value::Null => Ok(Frontmatter::default()),
        Value::Mapping(mapping) => {
            let mut map = BTreeMap::new();
            for (key, value) in mapping {
                let key = scalar_to_string(&key)
                    .ok_or_else(|| ParseError::new("front matter keys must be scalars"))?;
                map.insert(key, value);
            }
            Ok(Frontmatter(map))
        }
        // Valid YAML that is not a map (prose between two `---` rules, a bare
        // list) carries no metadata; the file still migrates with defaults.
        other => {
            warn!(kind = yaml_kind(&other), "Ignoring front matter that is not a key/value mapping");
            Ok(Frontmatter::default())
        }
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_front_matter_keeps_everything() {
        let input = "# Title\n\nSome text\n";
        let parsed = parse(input);
        assert!(parsed.is_ok());
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, input);
    }

    #[test]
    fn body_starts_right_after_closing_marker() {
        let input = "---\ndate: 2026-02-12\nstatus: complete\n---\n\n# Body\nline\n";
        let parsed = parse(input);
        assert!(parsed.is_ok());
        assert_eq!(parsed.body, "\n# Body\nline\n");
        assert_eq!(parsed.frontmatter.get_str("status").as_deref(), Some("complete"));
        assert_eq!(
            parsed.frontmatter.get_date("date"),
            NaiveDate::from_ymd_opt(2026, 2, 12)
        );
    }

    #[test]
    fn crlf_markers_are_recognized() {
        let input = "---\r\ntitle: Hello\r\n---\r\nbody\r\n";
        let parsed = parse(input);
        assert_eq!(parsed.frontmatter.get_str("title").as_deref(), Some("Hello"));
        assert_eq!(parsed.body, "body\r\n");
    }

    #[test]
    fn marker_not_at_start_is_plain_content() {
        let input = "\n---\ntitle: x\n---\nbody";
        let parsed = parse(input);
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, input);
    }

    #[test]
    fn unterminated_block_is_plain_content() {
        let input = "---\ntitle: x\nno closing marker\n";
        let parsed = parse(input);
        assert!(parsed.is_ok());
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, input);
    }

    #[test]
    fn invalid_yaml_reports_error_and_returns_full_contents() {
        let input = "---\ntopics: [a, b\nstatus: : :\n---\nbody\n";
        let parsed = parse(input);
        assert!(parsed.error.is_some());
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, input);
    }

    #[test]
    fn non_mapping_front_matter_is_ignored() {
        let parsed = parse("---\n- a\n- b\n---\nbody\n");
        assert!(parsed.is_ok());
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, "body\n");

        // A markdown rule around a line of prose parses as a YAML string
        let parsed = parse("---\nQuick intro paragraph\n---\n# Notes\nbody\n");
        assert!(parsed.is_ok());
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, "# Notes\nbody\n");
    }

    #[test]
    fn empty_block_yields_empty_map() {
        let parsed = parse("---\n---\nbody\n");
        assert!(parsed.is_ok());
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, "body\n");
    }

    #[test]
    fn lists_accept_sequences_and_comma_strings() {
        let parsed = parse("---\ntopics:\n  - testing\n  - migration\n  - testing\ntags: a, b ,c\n---\n");
        assert_eq!(parsed.frontmatter.get_list("topics"), vec!["testing", "migration"]);
        assert_eq!(parsed.frontmatter.get_list("tags"), vec!["a", "b", "c"]);
        assert!(parsed.frontmatter.get_list("missing").is_empty());
    }

    #[test]
    fn numeric_and_bool_scalars_stringify() {
        let parsed = parse("---\nversion: 3\ndraft: true\n---\n");
        assert_eq!(parsed.frontmatter.get_str("version").as_deref(), Some("3"));
        assert_eq!(parsed.frontmatter.get_str("draft").as_deref(), Some("true"));
    }

    #[test]
    fn datetime_values_truncate_to_date() {
        let parsed = parse("---\ndate: \"2026-02-12T09:30:00Z\"\n---\n");
        assert_eq!(
            parsed.frontmatter.get_date("date"),
            NaiveDate::from_ymd_opt(2026, 2, 12)
        );
    }

    #[test]
    fn heading_extraction() {
        assert_eq!(first_heading("\n## Sub\n# Main Title\n").as_deref(), Some("Main Title"));
        assert_eq!(first_heading("no heading"), None);
    }
}
