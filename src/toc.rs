//! Table of contents: heading slugs and the nested `<nav class="toc">`.
//!
//! Headings are collected in document order while the Markdown is rendered
//! ([`crate::markdown`]). Each one gets an id derived from its text, written
//! back onto the heading so the TOC anchors resolve.
//!
//! ## Nesting
//!
//! The list structure follows a nesting counter that starts at level 1.
//! Going deeper opens a list inside the previous item, going shallower closes
//! lists, and a jump of more than one level opens an item with no anchor so
//! the markup stays valid:
//!
//! ```text
//! levels [1, 2, 2, 3, 1]
//! ul
//! ├── li A
//! │   └── ul
//! │       ├── li B
//! │       └── li C
//! │           └── ul
//! │               └── li D
//! └── li E
//! ```
//!
//! The tree is built first ([`build_tree`]) and rendered second
//! ([`render_toc`]), so the structure is testable without parsing HTML.

use maud::{Markup, html};
use std::collections::HashSet;

/// One heading, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub text: String,
    pub id: String,
    /// 1 through 6.
    pub level: u8,
}

/// A list item. `entry` is `None` for items that only hold a deeper list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
    pub entry: Option<TocEntry>,
    pub children: Vec<TocItem>,
}

/// Slug for heading text: lowercase, whitespace runs become `-`, anything
/// outside `[a-z0-9-]` is removed.
///
/// ```
/// # use grimoire::toc::slugify;
/// assert_eq!(slugify("Getting Started"), "getting-started");
/// assert_eq!(slugify("Step 1: Go!"), "step-1-go");
/// ```
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Hands out unique heading ids within one page.
///
/// The first heading keeps its slug; repeats get `-1`, `-2`, … appended,
/// skipping any suffix another heading already produced.
#[derive(Debug, Default)]
pub struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, slug: &str) -> String {
        let base = if slug.is_empty() { "section" } else { slug };
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Arrange headings into nested lists.
pub fn build_tree(entries: &[TocEntry]) -> Vec<TocItem> {
    // stack[i] is the open list at depth i + 1.
    let mut stack: Vec<Vec<TocItem>> = vec![Vec::new()];

    for entry in entries {
        let level = usize::from(entry.level.clamp(1, 6));
        while stack.len() > level {
            close_list(&mut stack);
        }
        while stack.len() < level {
            stack.push(Vec::new());
        }
        if let Some(list) = stack.last_mut() {
            list.push(TocItem {
                entry: Some(entry.clone()),
                children: Vec::new(),
            });
        }
    }
    while stack.len() > 1 {
        close_list(&mut stack);
    }
    stack.pop().unwrap_or_default()
}

/// Pop the innermost list and nest it under the last item of its parent.
fn close_list(stack: &mut Vec<Vec<TocItem>>) {
    let Some(children) = stack.pop() else {
        return;
    };
    let Some(parent) = stack.last_mut() else {
        return;
    };
    match parent.last_mut() {
        Some(item) if item.children.is_empty() => item.children = children,
        _ => parent.push(TocItem {
            entry: None,
            children,
        }),
    }
}

/// Render the table of contents. No headings renders nothing at all.
pub fn render_toc(entries: &[TocEntry]) -> Markup {
    let items = build_tree(entries);
    html! {
        @if !items.is_empty() {
            nav.toc {
                (render_list(&items))
            }
        }
    }
}

fn render_list(items: &[TocItem]) -> Markup {
    html! {
        ul {
            @for item in items {
                li class=[item.entry.as_ref().map(|e| format!("toc-level-{}", e.level))] {
                    @if let Some(entry) = &item.entry {
                        a href={ "#" (entry.id) } { (entry.text) }
                    }
                    @if !item.children.is_empty() {
                        (render_list(&item.children))
                    }
                }
            }
        }
    }
}
