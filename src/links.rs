//! Name → URL table for `[[wiki links]]`.
//!
//! Built once from the content tree before any page renders and shared
//! read-only afterwards. Keys are note names without `.md` (trimmed); values
//! are output paths relative to the site root.
//!
//! Two notes with the same name in different folders are ambiguous. The
//! shallower one wins (the root `Home.md` over `archive/Home.md`), ties go to
//! tree order, and the collision is logged.

use crate::naming;
use crate::tree;
use crate::types::FileNode;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    entries: BTreeMap<String, String>,
}

impl LinkTable {
    pub fn from_tree(nodes: &[FileNode]) -> Self {
        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        for node in tree::flatten_files(nodes) {
            let key = naming::link_key(&node.name).to_string();
            let url = naming::html_path(&node.path);
            match entries.get(&key) {
                Some(existing) if depth(existing) <= depth(&url) => {
                    log::warn!("Link name '{key}' is ambiguous: using {existing}, not {url}");
                }
                Some(existing) => {
                    log::warn!("Link name '{key}' is ambiguous: using {url}, not {existing}");
                    entries.insert(key, url);
                }
                None => {
                    entries.insert(key, url);
                }
            }
        }
        Self { entries }
    }

    /// Output path for a note name, e.g. `Rust Tips` → `notes/Rust Tips.html`.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let key = naming::link_key(name.trim());
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for LinkTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

/// Root-relative href for an output path, each segment percent-encoded.
pub fn href(output_path: &str) -> String {
    format!("/{}", naming::encode_url_path(output_path))
}
