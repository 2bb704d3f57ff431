//! CLI output formatting.
//!
//! Output leads with what a reader of the site sees (note titles, the
//! sidebar hierarchy) and shows file paths as indented context.
//!
//! ## List
//!
//! ```text
//! Notes
//! notes/
//!     001 Rust Tips
//!         Source: notes/Rust Tips.md
//! 001 Getting Started
//!     Source: Getting Started.md
//!
//! 2 notes
//! ```
//!
//! ## Build
//!
//! ```text
//! Pages
//!     notes/Rust Tips.html
//!     index.html
//!
//! Media
//!     diagram.svg: copied
//!     photo.jpg: resized 4000x3000 → 1600x1200
//!
//! Failed
//!     [load] notes/Broken.md: Invalid front matter ...
//!
//! Built 2 pages, 2 media files, 2 search entries (1 draft skipped, 1 failure)
//! ```
//!
//! Each view has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout.

use crate::media::MediaAction;
use crate::naming;
use crate::site::BuildReport;
use crate::tree;
use crate::types::FileNode;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

// ============================================================================
// List output
// ============================================================================

/// Format the content tree as the sidebar will show it.
pub fn format_tree_output(nodes: &[FileNode]) -> Vec<String> {
    let mut lines = vec!["Notes".to_string()];
    walk(nodes, 0, &mut lines);
    lines.push(String::new());
    lines.push(plural(tree::count_files(nodes), "note", "notes"));
    lines
}

fn walk(nodes: &[FileNode], depth: usize, lines: &mut Vec<String>) {
    let base = indent(depth);
    let mut position = 0;
    for node in nodes {
        if node.is_dir() {
            lines.push(format!("{}{}/", base, node.name));
            walk(&node.children, depth + 1, lines);
        } else {
            position += 1;
            lines.push(format!(
                "{}{} {}",
                base,
                format_index(position),
                naming::page_stem(&node.name)
            ));
            lines.push(format!("{}    Source: {}", base, node.path));
        }
    }
}

/// Print the content tree to stdout.
pub fn print_tree_output(nodes: &[FileNode]) {
    for line in format_tree_output(nodes) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a build report: pages, media, failures, and a one-line summary.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Pages".to_string());
    for page in &report.pages {
        lines.push(format!("    {}", page));
    }

    if !report.media.is_empty() {
        lines.push(String::new());
        lines.push("Media".to_string());
        for outcome in &report.media {
            let action = match outcome.action {
                MediaAction::Copied => "copied".to_string(),
                MediaAction::Resized { from, to } => format!(
                    "resized {}x{} \u{2192} {}x{}",
                    from.0, from.1, to.0, to.1
                ),
            };
            lines.push(format!("    {}: {}", outcome.published, action));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for failure in &report.failures {
            lines.push(format!(
                "    [{}] {}: {}",
                failure.stage, failure.item, failure.message
            ));
        }
    }

    let mut notes = Vec::new();
    if report.drafts_skipped > 0 {
        notes.push(format!(
            "{} skipped",
            plural(report.drafts_skipped, "draft", "drafts")
        ));
    }
    if !report.failures.is_empty() {
        notes.push(plural(report.failures.len(), "failure", "failures"));
    }
    let suffix = if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join(", "))
    };

    lines.push(String::new());
    lines.push(format!(
        "Built {}, {}, {}{}",
        plural(report.pages.len(), "page", "pages"),
        plural(report.media.len(), "media file", "media files"),
        plural(report.search_entries, "search entry", "search entries"),
        suffix
    ));
    lines
}

/// Print a build report to stdout.
pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaOutcome;
    use crate::site::{Failure, Stage};

    // =========================================================================
    // List output
    // =========================================================================

    #[test]
    fn tree_output_nests_directories() {
        let tree = vec![
            FileNode::directory(
                "notes",
                "notes",
                vec![FileNode::file("Rust Tips.md", "notes/Rust Tips.md")],
            ),
            FileNode::file("Getting Started.md", "Getting Started.md"),
            FileNode::file("index.md", "index.md"),
        ];
        let lines = format_tree_output(&tree);
        assert_eq!(
            lines,
            vec![
                "Notes",
                "notes/",
                "    001 Rust Tips",
                "        Source: notes/Rust Tips.md",
                "001 Getting Started",
                "    Source: Getting Started.md",
                "002 index",
                "    Source: index.md",
                "",
                "3 notes",
            ]
        );
    }

    #[test]
    fn empty_tree_reports_zero_notes() {
        assert_eq!(format_tree_output(&[]), vec!["Notes", "", "0 notes"]);
    }

    // =========================================================================
    // Build output
    // =========================================================================

    #[test]
    fn clean_report_has_no_failure_section() {
        let report = BuildReport {
            pages: vec!["index.html".into()],
            search_entries: 1,
            ..BuildReport::default()
        };
        let lines = format_build_report(&report);
        assert!(!lines.iter().any(|l| l == "Failed"));
        assert!(!lines.iter().any(|l| l == "Media"));
        assert_eq!(
            lines.last().unwrap(),
            "Built 1 page, 0 media files, 1 search entry"
        );
    }

    #[test]
    fn report_lists_media_failures_and_skips() {
        let report = BuildReport {
            pages: vec!["a.html".into(), "b.html".into()],
            drafts_skipped: 2,
            media: vec![
                MediaOutcome {
                    published: "diagram.svg".into(),
                    action: MediaAction::Copied,
                },
                MediaOutcome {
                    published: "photo.jpg".into(),
                    action: MediaAction::Resized {
                        from: (4000, 3000),
                        to: (1600, 1200),
                    },
                },
            ],
            search_entries: 2,
            failures: vec![Failure {
                stage: Stage::Load,
                item: "Broken.md".into(),
                message: "bad yaml".into(),
            }],
            ..BuildReport::default()
        };
        let lines = format_build_report(&report);

        assert!(lines.contains(&"    diagram.svg: copied".to_string()));
        assert!(lines.contains(&"    photo.jpg: resized 4000x3000 \u{2192} 1600x1200".to_string()));
        assert!(lines.contains(&"    [load] Broken.md: bad yaml".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Built 2 pages, 2 media files, 2 search entries (2 drafts skipped, 1 failure)"
        );
    }
}
