//! Front matter splitting and metadata resolution.
//!
//! A note may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Rust Tips
//! tags: [rust, tips]
//! status: In Progress
//! ---
//! # Body starts here
//! ```
//!
//! The block is optional and unvalidated. Fields are read leniently: numbers
//! and booleans are stringified, `tags`/`aliases` accept a list or a
//! comma-separated string, and unknown keys are ignored. Resolution happens
//! once, here, into a [`Metadata`] record whose fields all have values, so
//! templates never deal with absent data.

use serde_yaml::{Mapping, Value};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

/// Workflow status of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Draft,
    InProgress,
    Complete,
}

impl Status {
    fn parse(raw: &str) -> Option<Self> {
        match normalize(raw).as_str() {
            "draft" => Some(Self::Draft),
            "inprogress" => Some(Self::InProgress),
            "complete" | "completed" | "done" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Class suffix used by the page template (`status-in-progress`).
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Draft => "status-draft",
            Self::InProgress => "status-in-progress",
            Self::Complete => "status-complete",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "Draft",
            Self::InProgress => "In Progress",
            Self::Complete => "Complete",
        })
    }
}

/// Priority of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    fn parse(raw: &str) -> Option<Self> {
        match normalize(raw).as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Low => "priority-low",
            Self::Medium => "priority-medium",
            Self::High => "priority-high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        })
    }
}

/// Lowercase and drop separators so `In Progress`, `in-progress` and
/// `in_progress` compare equal.
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fully-resolved page metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub author: String,
    pub category: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub description: String,
    pub aliases: Vec<String>,
    pub created: String,
    pub modified: String,
    /// Drafts are left out of the build unless explicitly included.
    pub draft: bool,
}

impl Metadata {
    /// Metadata for a note without front matter.
    pub fn untitled(fallback_title: &str) -> Self {
        Self {
            title: default_title(fallback_title),
            date: String::new(),
            tags: Vec::new(),
            author: String::new(),
            category: String::new(),
            status: None,
            priority: None,
            description: String::new(),
            aliases: Vec::new(),
            created: String::new(),
            modified: String::new(),
            draft: false,
        }
    }

    fn from_mapping(map: &Mapping, fallback_title: &str) -> Self {
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| map.get(*key).and_then(scalar_text))
                .unwrap_or_default()
        };
        let title = text(&["title"]);
        Self {
            title: if title.trim().is_empty() {
                default_title(fallback_title)
            } else {
                title
            },
            date: text(&["date"]),
            tags: map.get("tags").map(text_list).unwrap_or_default(),
            author: text(&["author"]),
            category: text(&["category"]),
            status: map
                .get("status")
                .and_then(scalar_text)
                .and_then(|s| Status::parse(&s)),
            priority: map
                .get("priority")
                .and_then(scalar_text)
                .and_then(|s| Priority::parse(&s)),
            description: text(&["description"]),
            aliases: map.get("aliases").map(text_list).unwrap_or_default(),
            created: text(&["created", "createdAt"]),
            modified: text(&["modified", "updatedAt"]),
            draft: map.get("draft").is_some_and(is_truthy),
        }
    }
}

fn default_title(fallback: &str) -> String {
    if fallback.trim().is_empty() {
        "Untitled".to_string()
    } else {
        fallback.to_string()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes"),
        _ => false,
    }
}

/// A note split into its front matter block and Markdown body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// Raw YAML between the fences, if the note has a block.
    pub preamble: Option<&'a str>,
    pub body: &'a str,
}

/// Split off a leading `---` block.
///
/// The closing fence is a line of `---` or `...`. Without one the whole
/// file is treated as body.
pub fn split(content: &str) -> Split<'_> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let no_preamble = Split {
        preamble: None,
        body: content,
    };
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return no_preamble;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if matches!(line.trim_end(), "---" | "...") {
            return Split {
                preamble: Some(&rest[..offset]),
                body: &rest[offset + line.len()..],
            };
        }
        offset += line.len();
    }
    no_preamble
}

/// A parsed note: resolved metadata plus the Markdown body.
#[derive(Debug, Clone)]
pub struct Document {
    pub metadata: Metadata,
    pub body: String,
}

/// Parse a whole note. `fallback_title` is used when no title is given.
pub fn parse_document(content: &str, fallback_title: &str) -> Result<Document, FrontMatterError> {
    let parts = split(content);
    let metadata = match parts.preamble {
        Some(yaml) => parse_metadata(yaml, fallback_title)?,
        None => Metadata::untitled(fallback_title),
    };
    Ok(Document {
        metadata,
        body: parts.body.to_string(),
    })
}

/// Resolve a YAML preamble into metadata.
pub fn parse_metadata(yaml: &str, fallback_title: &str) -> Result<Metadata, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::untitled(fallback_title));
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok(Metadata::from_mapping(&map, fallback_title)),
        Value::Null => Ok(Metadata::untitled(fallback_title)),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_preamble_uses_file_name_and_empty_defaults() {
        let doc = parse_document("# Hello\n\nBody.", "My Note").unwrap();
        assert_eq!(doc.metadata.title, "My Note");
        assert!(doc.metadata.tags.is_empty());
        assert_eq!(doc.metadata.author, "");
        assert_eq!(doc.metadata.date, "");
        assert_eq!(doc.metadata.status, None);
        assert!(!doc.metadata.draft);
        assert_eq!(doc.body, "# Hello\n\nBody.");
    }

    #[test]
    fn empty_fallback_becomes_untitled() {
        let doc = parse_document("text", "").unwrap();
        assert_eq!(doc.metadata.title, "Untitled");
    }

    #[test]
    fn full_preamble_is_resolved() {
        let content = "---\n\
title: Rust Tips\n\
date: 2024-03-01\n\
tags: [rust, tips]\n\
author: Ada\n\
category: programming\n\
status: In Progress\n\
priority: high\n\
description: Small things.\n\
aliases: [rust-notes]\n\
createdAt: 2024-01-01\n\
modified: 2024-02-02\n\
---\n\
Body here\n";
        let doc = parse_document(content, "fallback").unwrap();
        let m = &doc.metadata;
        assert_eq!(m.title, "Rust Tips");
        assert_eq!(m.date, "2024-03-01");
        assert_eq!(m.tags, vec!["rust", "tips"]);
        assert_eq!(m.author, "Ada");
        assert_eq!(m.category, "programming");
        assert_eq!(m.status, Some(Status::InProgress));
        assert_eq!(m.priority, Some(Priority::High));
        assert_eq!(m.description, "Small things.");
        assert_eq!(m.aliases, vec!["rust-notes"]);
        assert_eq!(m.created, "2024-01-01");
        assert_eq!(m.modified, "2024-02-02");
        assert_eq!(doc.body, "Body here\n");
    }

    #[test]
    fn lenient_scalars_and_comma_tags() {
        let doc = parse_document("---\ntitle: 1984\ntags: a, b ,c\n---\n", "x").unwrap();
        assert_eq!(doc.metadata.title, "1984");
        assert_eq!(doc.metadata.tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_enum_values_are_absent() {
        let doc = parse_document("---\nstatus: Someday\npriority: urgent\n---\n", "x").unwrap();
        assert_eq!(doc.metadata.status, None);
        assert_eq!(doc.metadata.priority, None);
    }

    #[test]
    fn draft_flag() {
        let doc = parse_document("---\ndraft: true\n---\nwip", "x").unwrap();
        assert!(doc.metadata.draft);
        let status_only = parse_document("---\nstatus: Draft\n---\nwip", "x").unwrap();
        assert!(!status_only.metadata.draft);
        assert_eq!(status_only.metadata.status, Some(Status::Draft));
    }

    #[test]
    fn empty_preamble_is_allowed() {
        let doc = parse_document("---\n---\nBody", "Note").unwrap();
        assert_eq!(doc.metadata.title, "Note");
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn blank_title_falls_back() {
        let doc = parse_document("---\ntitle: \"  \"\n---\n", "Note").unwrap();
        assert_eq!(doc.metadata.title, "Note");
    }

    #[test]
    fn unclosed_preamble_is_body() {
        let content = "---\ntitle: never closed\n\ntext";
        let doc = parse_document(content, "Note").unwrap();
        assert_eq!(doc.metadata.title, "Note");
        assert_eq!(doc.body, content);
    }

    #[test]
    fn split_handles_crlf_and_dots_fence() {
        let parts = split("---\r\ntitle: a\r\n...\r\nbody");
        assert_eq!(parts.preamble, Some("title: a\r\n"));
        assert_eq!(parts.body, "body");
    }

    #[test]
    fn split_ignores_rule_later_in_document() {
        let parts = split("intro\n---\nmore");
        assert_eq!(parts.preamble, None);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = parse_document("---\ntitle: [unclosed\n---\nbody", "x");
        assert!(matches!(result, Err(FrontMatterError::Yaml(_))));
    }

    #[test]
    fn scalar_preamble_is_an_error() {
        let result = parse_document("---\njust a string\n---\nbody", "x");
        assert!(matches!(result, Err(FrontMatterError::NotAMapping)));
    }

    #[test]
    fn status_display_and_classes() {
        assert_eq!(Status::InProgress.to_string(), "In Progress");
        assert_eq!(Status::InProgress.css_class(), "status-in-progress");
        assert_eq!(Priority::Low.to_string(), "Low");
    }
}
