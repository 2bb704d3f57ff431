//! Content tree discovery.
//!
//! Walks the content directory and produces the ordered [`FileNode`] tree
//! every later stage works from: the sidebar, the link table, the search
//! index and the page renderer.
//!
//! ## Rules
//!
//! - Only `.md` files are included.
//! - Hidden entries (leading `.`) and names listed in `ignorePatterns` are
//!   skipped at every level.
//! - Directories with no qualifying descendants are dropped.
//! - Siblings are ordered directories first, then by case-insensitive name.
//! - Symlinked directories are not followed.
//!
//! An unreadable directory is logged and contributes whatever entries were
//! gathered before the failure, so one bad folder never empties the site.

use crate::naming;
use crate::types::FileNode;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

/// Build the tree for `base/relative`.
///
/// `relative` is the subpath being listed (empty for the content root); node
/// paths are relative to `base`.
pub fn build_file_tree(base: &Path, relative: &Path, ignore: &[String]) -> Vec<FileNode> {
    let dir = base.join(relative);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot read directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut nodes = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error while listing {}: {}", dir.display(), e);
                break;
            }
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if naming::is_hidden(&name) || ignore.iter().any(|pattern| *pattern == name) {
            continue;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let child_relative = relative.join(&name);
        let path = naming::to_url_path(&child_relative);

        if file_type.is_dir() {
            let children = build_file_tree(base, &child_relative, ignore);
            if !children.is_empty() {
                nodes.push(FileNode::directory(name, path, children));
            }
        } else if file_type.is_file() && naming::is_markdown(&name) {
            nodes.push(FileNode::file(name, path));
        }
    }

    nodes.sort_by(compare_nodes);
    nodes
}

/// Directories before files, then case-insensitive name, then exact name.
fn compare_nodes(a: &FileNode, b: &FileNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Remove file nodes rejected by `keep`, dropping directories left empty.
pub fn prune(nodes: Vec<FileNode>, keep: &impl Fn(&FileNode) -> bool) -> Vec<FileNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            if node.is_dir() {
                node.children = prune(node.children, keep);
                (!node.children.is_empty()).then_some(node)
            } else {
                keep(&node).then_some(node)
            }
        })
        .collect()
}

/// All file nodes in tree order (depth-first, directories first).
pub fn flatten_files(nodes: &[FileNode]) -> Vec<&FileNode> {
    let mut files = Vec::new();
    collect_files(nodes, &mut files);
    files
}

fn collect_files<'a>(nodes: &'a [FileNode], out: &mut Vec<&'a FileNode>) {
    for node in nodes {
        if node.is_dir() {
            collect_files(&node.children, out);
        } else {
            out.push(node);
        }
    }
}

/// Number of file nodes in the tree.
pub fn count_files(nodes: &[FileNode]) -> usize {
    nodes
        .iter()
        .map(|n| if n.is_dir() { count_files(&n.children) } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::NodeKind;
    use tempfile::TempDir;

    fn tree_of(root: &Path) -> Vec<FileNode> {
        build_file_tree(root, Path::new(""), &[])
    }

    #[test]
    fn directories_sort_before_files_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "beta.md", "");
        write_file(tmp.path(), "Alpha.md", "");
        write_file(tmp.path(), "zeta/a.md", "");
        write_file(tmp.path(), "Gamma/a.md", "");

        let nodes = tree_of(tmp.path());
        assert_eq!(
            node_names(&nodes),
            vec!["Gamma", "zeta", "Alpha.md", "beta.md"]
        );
        assert_eq!(nodes[0].kind, NodeKind::Directory);
        assert_eq!(nodes[3].kind, NodeKind::File);
    }

    #[test]
    fn only_markdown_files_are_included() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "note.md", "");
        write_file(tmp.path(), "image.png", "");
        write_file(tmp.path(), "data.json", "{}");

        assert_eq!(node_names(&tree_of(tmp.path())), vec!["note.md"]);
    }

    #[test]
    fn empty_and_media_only_directories_are_dropped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("empty/nested")).unwrap();
        write_file(tmp.path(), "images/pic.png", "");
        write_file(tmp.path(), "notes/deep/er/note.md", "");

        let nodes = tree_of(tmp.path());
        assert_eq!(node_names(&nodes), vec!["notes"]);
        let deep = find_node(&nodes, "notes/deep/er/note.md");
        assert_eq!(deep.name, "note.md");
        assert_every_directory_has_a_file(&nodes);
    }

    #[test]
    fn hidden_and_ignored_entries_are_skipped_at_every_level() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), ".obsidian/workspace.md", "");
        write_file(tmp.path(), "notes/.hidden.md", "");
        write_file(tmp.path(), "notes/private/secret.md", "");
        write_file(tmp.path(), "notes/visible.md", "");
        write_file(tmp.path(), "private/also-secret.md", "");

        let nodes = build_file_tree(tmp.path(), Path::new(""), &["private".to_string()]);
        assert_eq!(node_names(&nodes), vec!["notes"]);
        assert_eq!(node_names(&nodes[0].children), vec!["visible.md"]);
    }

    #[test]
    fn paths_are_relative_and_slash_separated() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a/b/Note Name.md", "");

        let nodes = tree_of(tmp.path());
        assert_eq!(nodes[0].path, "a");
        assert_eq!(nodes[0].children[0].path, "a/b");
        assert_eq!(nodes[0].children[0].children[0].path, "a/b/Note Name.md");
    }

    #[test]
    fn subpath_listing_keeps_base_relative_paths() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "notes/a.md", "");

        let nodes = build_file_tree(tmp.path(), Path::new("notes"), &[]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path, "notes/a.md");
    }

    #[test]
    fn missing_directory_yields_empty_tree() {
        let tmp = TempDir::new().unwrap();
        let nodes = build_file_tree(tmp.path(), Path::new("does-not-exist"), &[]);
        assert!(nodes.is_empty());
    }

    #[test]
    fn fixture_tree_shape() {
        let tmp = setup_fixtures();
        let nodes = build_file_tree(tmp.path(), Path::new(""), &["private".to_string()]);
        assert_eq!(
            node_names(&nodes),
            vec!["notes", "Getting Started.md", "index.md"]
        );
        assert_every_directory_has_a_file(&nodes);
    }

    #[test]
    fn prune_drops_emptied_directories() {
        let nodes = vec![
            FileNode::directory(
                "drafts",
                "drafts",
                vec![FileNode::file("wip.md", "drafts/wip.md")],
            ),
            FileNode::file("keep.md", "keep.md"),
        ];
        let pruned = prune(nodes, &|n: &FileNode| n.name != "wip.md");
        assert_eq!(node_names(&pruned), vec!["keep.md"]);
    }

    #[test]
    fn flatten_follows_tree_order() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "b.md", "");
        write_file(tmp.path(), "a/z.md", "");
        write_file(tmp.path(), "a/y.md", "");

        let nodes = tree_of(tmp.path());
        let paths: Vec<&str> = flatten_files(&nodes).iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["a/y.md", "a/z.md", "b.md"]);
        assert_eq!(count_files(&nodes), 3);
    }
}
