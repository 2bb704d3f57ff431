//! Centralized naming rules shared by every pipeline stage.
//!
//! A note's identity is derived from its file name alone, so the tree
//! builder, the link table, the media copier and the embed rewriter all have
//! to agree on a handful of conversions:
//!
//! - `notes/Rust Tips.md` → `notes/Rust Tips.html` (output path)
//! - `Rust Tips.md` → `Rust Tips` (link key and default title)
//! - `my diagram (1).png` → `my-diagram--1-.png` (published media name)
//! - `notes/Rust Tips.html` → `notes/Rust%20Tips.html` (href path)

use std::path::Path;

pub const MARKDOWN_EXTENSION: &str = "md";
pub const HTML_EXTENSION: &str = "html";

/// Whether a file name carries the Markdown extension (case-insensitive).
pub fn is_markdown(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
}

/// Hidden entries start with a dot (`.obsidian`, `.git`, `.DS_Store`).
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// File name with a trailing `.md` removed. Other names are returned as-is.
pub fn page_stem(name: &str) -> &str {
    let len = name.len();
    let ext_len = MARKDOWN_EXTENSION.len() + 1;
    if is_markdown(name) && len > ext_len {
        &name[..len - ext_len]
    } else {
        name
    }
}

/// Key a note is looked up by in `[[...]]` links: the stem, trimmed.
pub fn link_key(name: &str) -> &str {
    page_stem(name).trim()
}

/// Output path for a Markdown source path: `.md` becomes `.html`.
pub fn html_path(relative: &str) -> String {
    if is_markdown(relative) {
        format!("{}.{}", page_stem(relative), HTML_EXTENSION)
    } else {
        relative.to_string()
    }
}

/// Published name of a media file.
///
/// Anything outside `[A-Za-z0-9_.-]` becomes `-`, so names survive URLs
/// without encoding. Both the media copier and the `![[...]]` rewriter go
/// through here.
pub fn asset_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Last component of a slash-separated path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Percent-encode each segment of a slash-separated path, keeping the slashes.
pub fn encode_url_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Slash-normalized form of a relative filesystem path.
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
