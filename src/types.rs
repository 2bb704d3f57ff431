//! Shared types used across all pipeline stages.
//!
//! The file tree is serialized into every page for the client-side sidebar,
//! and the search index is fetched by the same script, so both shapes are
//! part of the published output and must stay stable.

use serde::{Deserialize, Serialize};

/// Copied media, relative to the output root.
pub const MEDIA_DIR: &str = "static/media";
pub const STYLESHEET_PATH: &str = "static/styles.css";
pub const SYNTAX_STYLESHEET_PATH: &str = "static/syntax.css";
pub const SCRIPT_PATH: &str = "static/script.js";
pub const SEARCH_INDEX_PATH: &str = "static/search-index.json";
/// Avatar used when no profile picture is configured.
pub const DEFAULT_AVATAR_PATH: &str = "static/media/defaultpfp.svg";

/// Kind of a [`FileNode`], serialized as `"file"` / `"directory"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of the content tree.
///
/// Files are always Markdown files; directories always have at least one
/// file somewhere below them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Entry name as it appears on disk (`Rust Tips.md`).
    pub name: String,
    /// Slash-separated path relative to the content root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<FileNode>,
}

impl FileNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<String>,
        children: Vec<FileNode>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// One searchable page. `content` is the raw Markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexEntry {
    pub title: String,
    pub url: String,
    pub content: String,
}
