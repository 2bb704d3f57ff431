//! Whole-site build.
//!
//! A build runs through fixed stages, each finishing before the next starts:
//!
//! ```text
//! reset output ─► write assets ─► discover content ─► link table
//!     ─► publish media ─► search index ─► render pages
//! ```
//!
//! - **Reset output**: delete and recreate the output root with `static/` and
//!   `static/media/`. An output directory that contains the content directory
//!   is never deleted.
//! - **Write assets**: site stylesheet (theme colors prepended), syntax
//!   stylesheet, client script, default avatar.
//! - **Discover content**: build the file tree once, load every note's front
//!   matter and body in parallel, drop drafts unless asked to keep them.
//! - **Link table**: note name to output URL, from the final tree.
//! - **Publish media**: copy (or downscale) images, video and audio.
//! - **Search index**: one JSON entry per published note.
//! - **Render pages**: Markdown, template, minify, write. Folders without an
//!   `index.md` get a generated listing page; a missing root `index.md` is
//!   also logged as a warning.
//!
//! Problems with the config, the content directory or the output root stop
//! the build. A note or media file that fails is logged and recorded in the
//! [`BuildReport`]; everything else still gets built.

use crate::config::{self, SiteConfig};
use crate::embed::EmbedRewriter;
use crate::frontmatter::Document;
use crate::highlight::{self, HighlightError, Highlighter};
use crate::imaging::{ImageBackend, RustBackend};
use crate::links::LinkTable;
use crate::listing;
use crate::markdown::{self, MarkdownError, RenderContext};
use crate::media::{self, MediaOutcome, MediaSettings};
use crate::minify;
use crate::naming;
use crate::probe::{ContentProbe, HttpProbe, OfflineProbe, ProbeError};
use crate::search;
use crate::tasks::{self, TaskOutcomes};
use crate::templates::Templates;
use crate::tree;
use crate::types::{
    DEFAULT_AVATAR_PATH, FileNode, MEDIA_DIR, SCRIPT_PATH, SEARCH_INDEX_PATH, STYLESHEET_PATH,
    SYNTAX_STYLESHEET_PATH,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const STYLES: &str = include_str!("../static/styles.css");
const SCRIPT: &str = include_str!("../static/script.js");
const DEFAULT_AVATAR: &str = include_str!("../static/defaultpfp.svg");

/// Errors that stop a build.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Content directory not found: {0}")]
    MissingContent(PathBuf),
    #[error("Refusing to reset {output}: it contains the content directory {input}")]
    UnsafeOutput { output: PathBuf, input: PathBuf },
    #[error("Failed to reset output directory {path}: {source}")]
    ResetOutput { path: PathBuf, source: io::Error },
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Highlight(#[from] HighlightError),
    #[error("Failed to serialize file tree: {0}")]
    Tree(#[from] serde_json::Error),
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Errors for a single note. Recorded, never fatal.
#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Load(#[from] MarkdownError),
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Where to read from and write to, and what to include.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub include_drafts: bool,
    /// Never touch the network; remote images render as links.
    pub offline: bool,
}

/// Build stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Media,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Media => "media",
            Self::Render => "render",
        };
        f.write_str(name)
    }
}

/// A recorded per-file failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub stage: Stage,
    pub item: String,
    pub message: String,
}

/// What a build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// Output paths of rendered pages, relative to the output root.
    pub pages: Vec<String>,
    pub drafts_skipped: usize,
    pub media: Vec<MediaOutcome>,
    pub search_entries: usize,
    pub failures: Vec<Failure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record<T, E: fmt::Display>(&mut self, stage: Stage, outcomes: TaskOutcomes<T, E>) -> Vec<T> {
        for failure in outcomes.failed {
            log::error!("[{stage}] {}: {}", failure.item, failure.error);
            self.failures.push(Failure {
                stage,
                item: failure.item,
                message: failure.error.to_string(),
            });
        }
        outcomes.completed
    }
}

/// Build the site with the HTTP probe (or none, when offline) and the
/// pure-Rust image backend.
pub fn build(config: &SiteConfig, options: &BuildOptions) -> Result<BuildReport, BuildError> {
    let probe: Box<dyn ContentProbe> = if options.offline {
        Box::new(OfflineProbe)
    } else {
        Box::new(HttpProbe::new()?)
    };
    build_with(config, options, probe.as_ref(), &RustBackend::new())
}

/// Build the site with explicit collaborators.
pub fn build_with(
    config: &SiteConfig,
    options: &BuildOptions,
    probe: &dyn ContentProbe,
    backend: &impl ImageBackend,
) -> Result<BuildReport, BuildError> {
    let input = options.input_dir.as_path();
    let output = options.output_dir.as_path();
    if !input.is_dir() {
        return Err(BuildError::MissingContent(input.to_path_buf()));
    }
    let mut report = BuildReport {
        output_dir: output.to_path_buf(),
        ..BuildReport::default()
    };

    log::info!("==> Resetting {}", output.display());
    reset_output(input, output)?;

    log::info!("==> Writing assets");
    write_assets(config, output)?;

    log::info!("==> Discovering content in {}", input.display());
    let (docs, site_tree) = discover(input, config, options.include_drafts, &mut report);
    log::info!(
        "Found {} notes ({} drafts skipped)",
        docs.len(),
        report.drafts_skipped
    );

    log::info!("==> Building link table");
    let links = LinkTable::from_tree(&site_tree);
    log::debug!("{} link targets", links.len());

    log::info!("==> Publishing media");
    let media_files = media::discover_media(input, &config.ignore_patterns);
    let copied = media::copy_media(
        backend,
        &media_files,
        &output.join(MEDIA_DIR),
        &MediaSettings::from_config(&config.media),
    );
    report.media = report.record(Stage::Media, copied);

    log::info!("==> Writing search index");
    let index = search::build_index(docs.iter().map(|(path, doc)| (path.as_str(), doc)));
    let index_path = output.join(SEARCH_INDEX_PATH);
    search::write_index(&index, &index_path).map_err(|source| BuildError::Write {
        path: index_path.clone(),
        source,
    })?;
    report.search_entries = index.len();

    if !listing::has_index(&site_tree) {
        log::warn!(
            "{} not found in {}, generating a listing page instead",
            listing::INDEX_FILE,
            input.display()
        );
    }
    let titles: HashMap<&str, &str> = docs
        .iter()
        .map(|(path, doc)| (path.as_str(), doc.metadata.title.as_str()))
        .collect();
    let listings = listing::listing_documents(&site_tree, &titles, &config.page_title);
    let pages: Vec<&(String, Document)> = docs.iter().chain(&listings).collect();

    log::info!("==> Rendering {} pages", pages.len());
    let templates = Templates::new(config, &site_tree)?;
    let highlighter = Highlighter::new();
    let ctx = RenderContext {
        embeds: EmbedRewriter::new(&links, probe),
        highlighter: &highlighter,
    };
    ensure_directories(&site_tree, output);
    let rendered = tasks::run_group(
        &pages,
        |(path, _)| path.clone(),
        |(path, doc)| render_page(path, doc, &ctx, &templates, config.minify, output),
    );
    report.pages = report.record(Stage::Render, rendered);

    log::info!("==> Build complete: {}", output.display());
    Ok(report)
}

/// The tree of notes a build would publish, without building anything.
///
/// Notes that fail to load are logged and left out, like drafts unless
/// `include_drafts` is set.
pub fn published_tree(
    input: &Path,
    config: &SiteConfig,
    include_drafts: bool,
) -> Result<Vec<FileNode>, BuildError> {
    if !input.is_dir() {
        return Err(BuildError::MissingContent(input.to_path_buf()));
    }
    let (_, site_tree) = discover(input, config, include_drafts, &mut BuildReport::default());
    Ok(site_tree)
}

/// Load every note under `input` and prune the tree to the ones that will
/// be published.
fn discover(
    input: &Path,
    config: &SiteConfig,
    include_drafts: bool,
    report: &mut BuildReport,
) -> (Vec<(String, Document)>, Vec<FileNode>) {
    let full_tree = tree::build_file_tree(input, Path::new(""), &config.ignore_patterns);
    let loaded = tasks::run_group(
        &tree::flatten_files(&full_tree),
        |node| node.path.clone(),
        |node| markdown::load_document(&input.join(&node.path)).map(|doc| (node.path.clone(), doc)),
    );
    let mut docs = report.record(Stage::Load, loaded);
    if !include_drafts {
        let before = docs.len();
        docs.retain(|(path, doc)| {
            if doc.metadata.draft {
                log::debug!("Skipping draft {path}");
            }
            !doc.metadata.draft
        });
        report.drafts_skipped = before - docs.len();
    }
    // Only notes that will be published stay in the sidebar and link table.
    let published: HashSet<&str> = docs.iter().map(|(path, _)| path.as_str()).collect();
    let site_tree = tree::prune(full_tree, &|node: &FileNode| {
        published.contains(node.path.as_str())
    });
    (docs, site_tree)
}

/// Delete and recreate the output root and its `static/media/` folder.
fn reset_output(input: &Path, output: &Path) -> Result<(), BuildError> {
    if output.exists() {
        let canonical_input = input.canonicalize().map_err(|source| BuildError::ResetOutput {
            path: input.to_path_buf(),
            source,
        })?;
        let canonical_output = output.canonicalize().map_err(|source| BuildError::ResetOutput {
            path: output.to_path_buf(),
            source,
        })?;
        if canonical_input.starts_with(&canonical_output) {
            return Err(BuildError::UnsafeOutput {
                output: output.to_path_buf(),
                input: input.to_path_buf(),
            });
        }
        fs::remove_dir_all(output).map_err(|source| BuildError::ResetOutput {
            path: output.to_path_buf(),
            source,
        })?;
    }
    let media_dir = output.join(MEDIA_DIR);
    fs::create_dir_all(&media_dir).map_err(|source| BuildError::ResetOutput {
        path: media_dir,
        source,
    })
}

fn write_assets(config: &SiteConfig, output: &Path) -> Result<(), BuildError> {
    let styles = format!("{}\n{}", config::generate_color_css(&config.theme.colors), STYLES);
    let syntax = highlight::stylesheet()?;
    for (relative, contents) in [
        (STYLESHEET_PATH, styles.as_str()),
        (SYNTAX_STYLESHEET_PATH, syntax.as_str()),
        (SCRIPT_PATH, SCRIPT),
        (DEFAULT_AVATAR_PATH, DEFAULT_AVATAR),
    ] {
        let path = output.join(relative);
        fs::write(&path, contents).map_err(|source| BuildError::Write { path, source })?;
    }
    Ok(())
}

/// Create the mirrored directory for every directory node.
///
/// Failures are only logged; the pages inside will report their own errors.
fn ensure_directories(nodes: &[FileNode], output: &Path) {
    for node in nodes.iter().filter(|n| n.is_dir()) {
        let dir = output.join(&node.path);
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("Could not create {}: {e}", dir.display());
        }
        ensure_directories(&node.children, output);
    }
}

fn render_page(
    relative: &str,
    doc: &Document,
    ctx: &RenderContext,
    templates: &Templates,
    minify_enabled: bool,
    output: &Path,
) -> Result<String, PageError> {
    let page = markdown::render_document(doc, ctx);
    let html = templates.render(&page, relative).into_string();
    let html = minify::minify_page(&html, minify_enabled);

    let out_relative = naming::html_path(relative);
    let path = output.join(&out_relative);
    let written = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(&path, html.as_bytes()));
    written.map_err(|source| PageError::Write { path, source })?;
    log::debug!("Wrote {out_relative}");
    Ok(out_relative)
}

/// Remove a previous build.
///
/// Missing directories are not an error. Like a build, refuses to delete a
/// directory that contains `input`.
pub fn clean(output: &Path, input: &Path) -> Result<bool, BuildError> {
    if !output.exists() {
        return Ok(false);
    }
    if let (Ok(out), Ok(inp)) = (output.canonicalize(), input.canonicalize())
        && inp.starts_with(&out)
    {
        return Err(BuildError::UnsafeOutput {
            output: output.to_path_buf(),
            input: input.to_path_buf(),
        });
    }
    fs::remove_dir_all(output).map_err(|source| BuildError::ResetOutput {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(true)
}
