//! # Grimoire
//!
//! A static site generator for folders of Markdown notes: wikis, digital
//! gardens, Obsidian vaults. The content folder is the data source. Every
//! `.md` file becomes one HTML page at the mirrored path, folders become
//! sidebar sections, and `[[Note Name]]` links resolve by file name anywhere
//! in the tree.
//!
//! # Build Pipeline
//!
//! ```text
//! content/  →  file tree  →  front matter + bodies  →  link table
//!           →  static/media/  →  search index  →  rendered pages  →  dist/
//! ```
//!
//! Everything runs in one process over in-memory data; [`site::build`] owns
//! the ordering. Per-file stages (loading notes, copying media, rendering
//! pages) run on a rayon pool and report failures per file instead of
//! aborting the build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Orchestrates a build: output reset, assets, stages, report |
//! | [`tree`] | Walks the content directory into the ordered [`types::FileNode`] tree |
//! | [`frontmatter`] | YAML front matter splitting and typed metadata |
//! | [`markdown`] | pulldown-cmark rendering with heading ids, code blocks, math, embeds |
//! | [`embed`] | `[[links]]`, `![[embeds]]` and bare URL rewriting |
//! | [`links`] | Note name → output URL table, shortest path wins |
//! | [`listing`] | Generated index pages for folders without `index.md` |
//! | [`probe`] | Remote URL classification by `Content-Type` (HTTP or offline) |
//! | [`toc`] | Heading slugs, unique ids, nested table of contents |
//! | [`highlight`] | syntect class-based highlighting and its stylesheet |
//! | [`templates`] | Maud page layout: sidebar, top bar, TOC panel, footer |
//! | [`minify`] | Optional HTML minification |
//! | [`media`] | Media discovery, copy and downscale into `static/media/` |
//! | [`imaging`] | Pure-Rust image backend used by [`media`] |
//! | [`search`] | Client-side search index |
//! | [`tasks`] | Parallel per-item work with collected failures |
//! | [`config`] | `grimoire.config.json` loading, validation, theme CSS |
//! | [`naming`] | File name and URL conventions shared by every stage |
//! | [`types`] | Types serialized into the published site |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), so malformed
//! markup is a compile error and every interpolation is escaped. There is no
//! template directory to ship; the stylesheet and client script are embedded
//! in the binary with `include_str!`.
//!
//! ## Names, Not Paths
//!
//! Notes link to each other by name (`[[Rust Tips]]`), the way note-taking
//! apps do. When two notes share a name, the one closest to the content
//! root wins, which keeps links stable as deeper folders grow.
//!
//! ## One Failure, One Page
//!
//! A note with broken front matter or an unwritable output path is logged,
//! skipped, and listed in the build report. Everything else still builds.
//! Only setup problems (config, content directory, output root) stop a run.

pub mod config;
pub mod embed;
pub mod frontmatter;
pub mod highlight;
pub mod imaging;
pub mod links;
pub mod listing;
pub mod markdown;
pub mod media;
pub mod minify;
pub mod naming;
pub mod output;
pub mod probe;
pub mod search;
pub mod site;
pub mod tasks;
pub mod templates;
pub mod toc;
pub mod tree;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
