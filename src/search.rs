//! Client-side search index.
//!
//! One JSON array written to `static/search-index.json`, with one entry per
//! published note in tree order. `content` is the raw Markdown body with the
//! front matter removed; the browser script matches against it directly.

use crate::frontmatter::Document;
use crate::naming;
use crate::types::SearchIndexEntry;
use std::fs;
use std::io;
use std::path::Path;

/// Build the index from `(relative source path, document)` pairs.
pub fn build_index<'d>(
    docs: impl IntoIterator<Item = (&'d str, &'d Document)>,
) -> Vec<SearchIndexEntry> {
    docs.into_iter()
        .map(|(relative, doc)| SearchIndexEntry {
            title: doc.metadata.title.clone(),
            url: naming::html_path(relative),
            content: doc.body.clone(),
        })
        .collect()
}

/// Serialize `entries` to `path`.
pub fn write_index(entries: &[SearchIndexEntry], path: &Path) -> io::Result<()> {
    let json = serde_json::to_string(entries)?;
    fs::write(path, json)
}
