//! Shared test utilities for the grimoire test suite.
//!
//! Provides fixture setup, content-tree lookups and assertions, and a
//! scripted [`ContentProbe`] so rewriting tests never touch the network.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let nodes = build_file_tree(tmp.path(), Path::new(""), &[]);
//!
//! let tips = find_node(&nodes, "notes/Rust Tips.md");
//! assert_eq!(tips.name, "Rust Tips.md");
//! assert_every_directory_has_a_file(&nodes);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use url::Url;

use crate::probe::ContentProbe;
use crate::types::FileNode;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

// =========================================================================
// Tree lookups (panic with a clear message on miss)
// =========================================================================

/// Find a node anywhere in the tree by its relative path. Panics if not found.
pub fn find_node<'a>(nodes: &'a [FileNode], path: &str) -> &'a FileNode {
    fn search<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
        nodes.iter().find_map(|n| {
            if n.path == path {
                Some(n)
            } else {
                search(&n.children, path)
            }
        })
    }
    search(nodes, path).unwrap_or_else(|| {
        let paths = all_paths(nodes);
        panic!("node '{path}' not found. Available: {paths:?}")
    })
}

/// Sibling names in order.
pub fn node_names(nodes: &[FileNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

/// Every path in the tree, depth-first.
pub fn all_paths(nodes: &[FileNode]) -> Vec<&str> {
    let mut out = Vec::new();
    for node in nodes {
        out.push(node.path.as_str());
        out.extend(all_paths(&node.children));
    }
    out
}

/// Assert that no directory node is empty, at any depth.
pub fn assert_every_directory_has_a_file(nodes: &[FileNode]) {
    for node in nodes {
        if node.is_dir() {
            assert!(
                !node.children.is_empty(),
                "directory '{}' has no children",
                node.path
            );
            assert_every_directory_has_a_file(&node.children);
        } else {
            assert!(
                node.children.is_empty(),
                "file '{}' has children",
                node.path
            );
        }
    }
}

// =========================================================================
// Content probe double
// =========================================================================

/// Probe that answers from a fixed table and records every URL it was asked about.
///
/// URLs missing from the table behave like an unreachable host.
#[derive(Default)]
pub struct ScriptedProbe {
    responses: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, content_type: &str) -> Self {
        self.responses
            .insert(url.to_string(), content_type.to_string());
        self
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentProbe for ScriptedProbe {
    fn content_type(&self, url: &Url) -> Option<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses.get(url.as_str()).cloned()
    }
}
