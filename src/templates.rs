//! Page templates.
//!
//! Every page is two layers: a fragment for the note itself ([`PageKind`]
//! decides which) wrapped in the site layout (head metadata, sidebar with
//! search and file tree, topbar, table of contents, footer).
//!
//! [`Templates`] is built once per build from the config and the content
//! tree. It serializes the tree to JSON up front; every page embeds the same
//! string in a `<script type="application/json">` block for the client script
//! to render the sidebar from.
//!
//! HTML is generated with maud, so everything interpolated is escaped unless
//! it is already-rendered markup wrapped in [`PreEscaped`].

use crate::config::SiteConfig;
use crate::frontmatter::Metadata;
use crate::markdown::ProcessedPage;
use crate::naming;
use crate::types::{FileNode, SCRIPT_PATH, STYLESHEET_PATH, SYNTAX_STYLESHEET_PATH};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const MATHJAX_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js";
const MATHJAX_CONFIG: &str =
    r"window.MathJax = { tex: { inlineMath: [['\\(', '\\)']], displayMath: [['\\[', '\\]']] } };";

/// Which fragment template a source file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Page,
    /// `index.md` at any level.
    Index,
}

impl PageKind {
    pub fn for_source(relative: &str) -> Self {
        if naming::base_name(relative).eq_ignore_ascii_case("index.md") {
            Self::Index
        } else {
            Self::Page
        }
    }
}

/// Template context shared by every page of one build.
pub struct Templates<'a> {
    config: &'a SiteConfig,
    file_tree_json: String,
}

impl<'a> Templates<'a> {
    pub fn new(config: &'a SiteConfig, tree: &[FileNode]) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(tree)?;
        Ok(Self {
            config,
            // `</script>` inside a string would end the block early.
            file_tree_json: json.replace("</", "<\\/"),
        })
    }

    pub fn file_tree_json(&self) -> &str {
        &self.file_tree_json
    }

    /// Full HTML document for the note at `relative` (source path).
    pub fn render(&self, page: &ProcessedPage, relative: &str) -> Markup {
        let fragment = match PageKind::for_source(relative) {
            PageKind::Index => index_fragment(page),
            PageKind::Page => page_fragment(page),
        };
        self.layout(page, relative, fragment)
    }

    fn layout(&self, page: &ProcessedPage, relative: &str, fragment: Markup) -> Markup {
        let config = self.config;
        let meta = &page.metadata;
        let page_url = naming::encode_url_path(&naming::html_path(relative));
        let canonical = config.absolute_url(&page_url);
        let og_image = (!config.metadata_image.is_empty()).then(|| {
            config
                .absolute_url(&config.metadata_image)
                .unwrap_or_else(|| config.metadata_image.clone())
        });

        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (meta.title) " | " (config.page_title) }
                    @if !meta.description.is_empty() {
                        meta name="description" content=(meta.description);
                        meta property="og:description" content=(meta.description);
                    }
                    @if !meta.author.is_empty() {
                        meta name="author" content=(meta.author);
                    }
                    @if !meta.tags.is_empty() {
                        meta name="keywords" content=(meta.tags.join(", "));
                    }
                    meta property="og:title" content=(meta.title);
                    meta property="og:type" content="article";
                    meta property="og:site_name" content=(config.page_title);
                    @if let Some(url) = &canonical {
                        link rel="canonical" href=(url);
                        meta property="og:url" content=(url);
                    }
                    @if let Some(image) = &og_image {
                        meta property="og:image" content=(image);
                    }
                    link rel="stylesheet" href={ "/" (STYLESHEET_PATH) };
                    link rel="stylesheet" href={ "/" (SYNTAX_STYLESHEET_PATH) };
                    @if page.has_math {
                        script { (PreEscaped(MATHJAX_CONFIG)) }
                        script src=(MATHJAX_URL) async {}
                    }
                }
                body.light {
                    (self.sidebar())
                    div #main .main {
                        (self.topbar())
                        div.page-layout {
                            main.content { (fragment) }
                            @if !page.toc.is_empty() {
                                aside.toc-panel {
                                    h2.toc-title { "Contents" }
                                    (PreEscaped(&page.toc))
                                }
                            }
                        }
                        (footer(meta, &config.owner))
                    }
                    script #file-tree-data type="application/json" { (PreEscaped(&self.file_tree_json)) }
                    script src={ "/" (SCRIPT_PATH) } defer {}
                }
            }
        }
    }

    fn sidebar(&self) -> Markup {
        let config = self.config;
        html! {
            aside #sidebar .sidebar {
                div.profile {
                    img.profile-picture src=(config.profile_picture()) alt=(config.owner) width="64" height="64";
                    div.profile-text {
                        @if !config.owner.is_empty() {
                            span.owner { (config.owner) }
                        }
                        span #time .clock {}
                    }
                }
                div.search {
                    input #search-input type="search" placeholder="Search notes…" autocomplete="off" aria-label="Search notes";
                    div #search-results .search-results {}
                }
                nav #file-tree .file-tree aria-label="Notes" {}
                div #resize-handle .resize-handle {}
            }
        }
    }

    fn topbar(&self) -> Markup {
        html! {
            header.topbar {
                button #sidebar-toggle type="button" aria-label="Toggle sidebar" { "☰" }
                a.site-title href="/" { (self.config.page_title) }
                button #dark-mode-toggle type="button" aria-label="Toggle dark mode" { "🌒" }
            }
        }
    }
}

fn page_fragment(page: &ProcessedPage) -> Markup {
    let meta = &page.metadata;
    html! {
        article.page {
            header.page-header {
                h1.page-title { (meta.title) }
                (page_details(meta))
            }
            div.page-content { (PreEscaped(&page.content)) }
        }
    }
}

fn index_fragment(page: &ProcessedPage) -> Markup {
    let meta = &page.metadata;
    html! {
        article.page.index-page {
            @if !meta.description.is_empty() {
                p.page-description { (meta.description) }
            }
            div.page-content { (PreEscaped(&page.content)) }
        }
    }
}

/// Date, author, status and priority badges, and tags. Empty fields are skipped.
fn page_details(meta: &Metadata) -> Markup {
    let has_details = !meta.date.is_empty()
        || !meta.author.is_empty()
        || !meta.category.is_empty()
        || meta.status.is_some()
        || meta.priority.is_some()
        || !meta.tags.is_empty();
    html! {
        @if has_details {
            div.page-meta {
                @if !meta.date.is_empty() {
                    time.page-date datetime=(meta.date) { (meta.date) }
                }
                @if !meta.author.is_empty() {
                    span.page-author { (meta.author) }
                }
                @if !meta.category.is_empty() {
                    span.page-category { (meta.category) }
                }
                @if let Some(status) = meta.status {
                    span class={ "badge " (status.css_class()) } { (status.to_string()) }
                }
                @if let Some(priority) = meta.priority {
                    span class={ "badge " (priority.css_class()) } { (priority.to_string()) }
                }
                @if !meta.tags.is_empty() {
                    ul.tags {
                        @for tag in &meta.tags {
                            li.tag { "#" (tag) }
                        }
                    }
                }
            }
        }
    }
}

fn footer(meta: &Metadata, owner: &str) -> Markup {
    html! {
        footer.site-footer {
            @if !meta.modified.is_empty() {
                span.modified { "Last modified " (meta.modified) }
            } @else if !meta.created.is_empty() {
                span.created { "Created " (meta.created) }
            }
            @if !owner.is_empty() {
                span.copyright { "© " (owner) }
            }
        }
    }
}
