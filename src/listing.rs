//! Listing pages for folders that have no `index.md` of their own.
//!
//! A listing is an ordinary [`Document`] at `<folder>/index.md`, so it goes
//! through the same render path as notes and picks up the index template
//! and site layout. Entries follow the published tree order, sub-folders
//! first.

use crate::frontmatter::{Document, Metadata};
use crate::links;
use crate::naming;
use crate::types::FileNode;
use maud::html;
use std::collections::HashMap;

pub const INDEX_FILE: &str = "index.md";

/// Whether a folder's children include its own index note.
pub fn has_index(children: &[FileNode]) -> bool {
    children
        .iter()
        .any(|node| !node.is_dir() && node.name.eq_ignore_ascii_case(INDEX_FILE))
}

/// One listing document per folder in `tree` without an index note, the
/// content root included.
///
/// `titles` maps source paths to note titles; notes missing from it are
/// listed by file stem. The root listing is titled `root_title`.
pub fn listing_documents(
    tree: &[FileNode],
    titles: &HashMap<&str, &str>,
    root_title: &str,
) -> Vec<(String, Document)> {
    let mut listings = Vec::new();
    collect(tree, "", root_title, titles, &mut listings);
    listings
}

fn collect(
    children: &[FileNode],
    folder: &str,
    title: &str,
    titles: &HashMap<&str, &str>,
    out: &mut Vec<(String, Document)>,
) {
    if !has_index(children) {
        out.push((index_source(folder), listing(title, children, titles)));
    }
    for node in children.iter().filter(|n| n.is_dir()) {
        collect(&node.children, &node.path, &node.name, titles, out);
    }
}

/// Source path of a folder's index note (`""` is the content root).
fn index_source(folder: &str) -> String {
    if folder.is_empty() {
        INDEX_FILE.to_string()
    } else {
        format!("{folder}/{INDEX_FILE}")
    }
}

fn listing(title: &str, children: &[FileNode], titles: &HashMap<&str, &str>) -> Document {
    let body = html! {
        h1.page-title { (title) }
        ul.folder-listing {
            @for node in children {
                @if node.is_dir() {
                    li.listing-folder {
                        a href=(links::href(&naming::html_path(&index_source(&node.path)))) {
                            (node.name) "/"
                        }
                    }
                } @else {
                    li {
                        a href=(links::href(&naming::html_path(&node.path))) {
                            (titles
                                .get(node.path.as_str())
                                .copied()
                                .unwrap_or_else(|| naming::page_stem(&node.name)))
                        }
                    }
                }
            }
        }
    };
    Document {
        metadata: Metadata::untitled(title),
        // One line keeps it a single raw HTML block for the Markdown pass.
        body: body.into_string() + "\n",
    }
}
