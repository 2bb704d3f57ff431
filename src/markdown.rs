//! Markdown to HTML for a single note.
//!
//! The body goes through pulldown-cmark's event stream once:
//!
//! ```text
//! parse ──► merge text runs ──► rewrite pass ──► HTML writer
//! ```
//!
//! The rewrite pass is where everything site-specific happens:
//!
//! - **Headings** get a unique id and are recorded for the table of contents.
//! - **Fenced code** is highlighted server-side and wrapped with a copy button.
//! - **Text runs** outside links go through the [`EmbedRewriter`] (wiki links,
//!   `![[...]]` embeds, bare URLs).
//! - **Highlights** pair `==` delimiters across inline events, so
//!   `==**bold** text==` becomes one `<mark>`. A delimiter left unpaired at
//!   the end of its block stays literal.
//! - **Remote images** are probed and may turn into video, audio or YouTube
//!   embeds.
//! - **Math** becomes TeX-delimited spans for MathJax to typeset in the browser.
//! - **Paragraphs** carry the `paragraph-spacing` class.
//!
//! Raw HTML in the source is passed through verbatim.

use crate::embed::{self, EmbedRewriter};
use crate::frontmatter::{self, Document, FrontMatterError, Metadata};
use crate::highlight::{CODE_CLASS, Highlighter};
use crate::naming;
use crate::toc::{self, IdAllocator, TocEntry};
use maud::{PreEscaped, html};
use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: FrontMatterError,
    },
}

const PARAGRAPH_OPEN: &str = r#"<p class="paragraph-spacing">"#;

/// Per-build collaborators shared by every page render.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub embeds: EmbedRewriter<'a>,
    pub highlighter: &'a Highlighter,
}

/// Output of [`render_markdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocEntry>,
    /// Whether the page needs the math typesetter.
    pub has_math: bool,
}

/// A fully processed note, ready for templating.
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    pub content: String,
    pub metadata: Metadata,
    /// Rendered `<nav class="toc">`, empty when the page has no headings.
    pub toc: String,
    pub toc_entries: Vec<TocEntry>,
    pub has_math: bool,
}

pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_MATH
        | Options::ENABLE_GFM
}

/// Read a note and split it into metadata and body.
pub fn load_document(path: &Path) -> Result<Document, MarkdownError> {
    let source = fs::read_to_string(path).map_err(|source| MarkdownError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    frontmatter::parse_document(&source, naming::page_stem(&file_name)).map_err(|source| {
        MarkdownError::FrontMatter {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Render an already loaded note.
pub fn render_document(doc: &Document, ctx: &RenderContext) -> ProcessedPage {
    let rendered = render_markdown(&doc.body, ctx);
    ProcessedPage {
        toc: toc::render_toc(&rendered.toc).into_string(),
        content: rendered.html,
        metadata: doc.metadata.clone(),
        toc_entries: rendered.toc,
        has_math: rendered.has_math,
    }
}

/// Read, parse and render the note at `path`.
pub fn process_file(path: &Path, ctx: &RenderContext) -> Result<ProcessedPage, MarkdownError> {
    let doc = load_document(path)?;
    Ok(render_document(&doc, ctx))
}

/// Render a Markdown body (front matter already removed).
pub fn render_markdown(body: &str, ctx: &RenderContext) -> RenderedMarkdown {
    let parser = TextMergeStream::new(Parser::new_ext(body, parser_options()));
    let mut pass = RewritePass::new(ctx);
    for event in parser {
        pass.handle(event);
    }

    let mut html = String::with_capacity(body.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, pass.out.into_iter());
    RenderedMarkdown {
        html,
        toc: pass.toc,
        has_math: pass.has_math,
    }
}

struct HeadingCapture<'e> {
    level: HeadingLevel,
    id: Option<CowStr<'e>>,
    classes: Vec<CowStr<'e>>,
    attrs: Vec<(CowStr<'e>, Option<CowStr<'e>>)>,
    text: String,
    events: Vec<Event<'e>>,
}

struct CodeCapture {
    lang: Option<String>,
    code: String,
}

struct ImageCapture<'e> {
    destination: CowStr<'e>,
    alt: String,
    events: Vec<Event<'e>>,
    /// Images open inside the alt text.
    nested: usize,
}

/// An unpaired `==` waiting for its closer.
struct OpenMark {
    /// Position of the placeholder text event in the current sink.
    index: usize,
    depth: usize,
}

/// State for the single rewrite traversal over one document.
struct RewritePass<'c, 'a, 'e> {
    ctx: &'c RenderContext<'a>,
    out: Vec<Event<'e>>,
    ids: IdAllocator,
    toc: Vec<TocEntry>,
    heading: Option<HeadingCapture<'e>>,
    code: Option<CodeCapture>,
    image: Option<ImageCapture<'e>>,
    link_depth: usize,
    /// Emphasis, strong, strikethrough and links currently open.
    inline_depth: usize,
    open_mark: Option<OpenMark>,
    has_math: bool,
}

impl<'c, 'a, 'e> RewritePass<'c, 'a, 'e> {
    fn new(ctx: &'c RenderContext<'a>) -> Self {
        Self {
            ctx,
            out: Vec::new(),
            ids: IdAllocator::new(),
            toc: Vec::new(),
            heading: None,
            code: None,
            image: None,
            link_depth: 0,
            inline_depth: 0,
            open_mark: None,
            has_math: false,
        }
    }

    fn sink(&mut self) -> &mut Vec<Event<'e>> {
        match &mut self.heading {
            Some(heading) => &mut heading.events,
            None => &mut self.out,
        }
    }

    fn emit(&mut self, event: Event<'e>) {
        self.sink().push(event);
    }

    /// Emit plain text, turning each `==` into a highlight boundary.
    fn emit_text(&mut self, text: CowStr<'e>) {
        if !text.contains(embed::MARK_DELIMITER) {
            self.emit(Event::Text(text));
            return;
        }
        for (i, piece) in text.split(embed::MARK_DELIMITER).enumerate() {
            if i > 0 {
                self.toggle_mark();
            }
            if !piece.is_empty() {
                self.emit(Event::Text(CowStr::from(piece.to_string())));
            }
        }
    }

    /// Close the open highlight at this depth, or open a new one.
    ///
    /// An opener is emitted as literal `==` and only swapped for `<mark>`
    /// once its closer shows up.
    fn toggle_mark(&mut self) {
        let depth = self.inline_depth;
        let len = self.sink().len();
        match self.open_mark.take() {
            Some(open) if open.depth == depth && open.index + 1 < len => {
                self.sink()[open.index] = Event::InlineHtml(CowStr::Borrowed("<mark>"));
                self.emit(Event::InlineHtml(CowStr::Borrowed("</mark>")));
            }
            // `====` has nothing to highlight.
            Some(open) if open.depth == depth => {
                self.emit(Event::Text(CowStr::Borrowed(embed::MARK_DELIMITER)));
            }
            _ => {
                self.emit(Event::Text(CowStr::Borrowed(embed::MARK_DELIMITER)));
                self.open_mark = Some(OpenMark { index: len, depth });
            }
        }
    }

    /// Highlights pair only within one inline container of one block.
    fn track_inline(&mut self, event: &Event<'e>) {
        match event {
            Event::Start(Tag::Image { .. }) | Event::End(TagEnd::Image) => {}
            Event::Start(Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. }) => {
                self.inline_depth += 1;
            }
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {
                self.inline_depth = self.inline_depth.saturating_sub(1);
                if self
                    .open_mark
                    .as_ref()
                    .is_some_and(|open| open.depth > self.inline_depth)
                {
                    self.open_mark = None;
                }
            }
            Event::Start(_) | Event::End(_) => {
                self.inline_depth = 0;
                self.open_mark = None;
            }
            _ => {}
        }
    }

    fn handle(&mut self, event: Event<'e>) {
        if let Some(code) = &mut self.code {
            match event {
                Event::Text(text) => code.code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.finish_code_block(),
                _ => {}
            }
            return;
        }
        if let Some(image) = &mut self.image {
            match event {
                Event::Start(Tag::Image { .. }) => {
                    image.nested += 1;
                    image.events.push(event);
                }
                Event::End(TagEnd::Image) if image.nested > 0 => {
                    image.nested -= 1;
                    image.events.push(event);
                }
                Event::End(TagEnd::Image) => self.finish_image(event),
                Event::Text(ref text) | Event::Code(ref text) => {
                    image.alt.push_str(text);
                    image.events.push(event);
                }
                other => image.events.push(other),
            }
            return;
        }

        self.track_inline(&event);
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                self.heading = Some(HeadingCapture {
                    level,
                    id,
                    classes,
                    attrs,
                    text: String::new(),
                    events: Vec::new(),
                });
            }
            Event::End(TagEnd::Heading(_)) => self.finish_heading(),
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => fence_language(&info),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeCapture {
                    lang,
                    code: String::new(),
                });
            }
            Event::Start(Tag::Image { ref dest_url, .. }) if self.link_depth == 0 => {
                self.image = Some(ImageCapture {
                    destination: dest_url.clone(),
                    alt: String::new(),
                    events: vec![event],
                    nested: 0,
                });
            }
            Event::Start(Tag::Link { .. }) => {
                self.link_depth += 1;
                self.emit(event);
            }
            Event::End(TagEnd::Link) => {
                self.link_depth = self.link_depth.saturating_sub(1);
                self.emit(event);
            }
            Event::Start(Tag::Paragraph) => self.emit(Event::Html(CowStr::Borrowed(PARAGRAPH_OPEN))),
            Event::End(TagEnd::Paragraph) => self.emit(Event::Html(CowStr::Borrowed("</p>\n"))),
            Event::Text(text) => {
                if let Some(heading) = &mut self.heading {
                    heading.text.push_str(&embed::plain_text(&text));
                }
                if self.link_depth > 0 {
                    self.emit(Event::Text(text));
                } else {
                    for piece in self.ctx.embeds.rewrite_text(&text) {
                        match piece {
                            Event::Text(plain) => self.emit_text(plain),
                            other => self.emit(other),
                        }
                    }
                }
            }
            Event::Code(code) => {
                if let Some(heading) = &mut self.heading {
                    heading.text.push_str(&code);
                }
                self.emit(Event::Code(code));
            }
            Event::InlineMath(tex) => {
                self.has_math = true;
                let span = html! { span.math.math-inline { "\\(" (&*tex) "\\)" } };
                self.emit(Event::InlineHtml(CowStr::from(span.into_string())));
            }
            Event::DisplayMath(tex) => {
                self.has_math = true;
                let span = html! { span.math.math-display { "\\[" (&*tex) "\\]" } };
                self.emit(Event::InlineHtml(CowStr::from(span.into_string())));
            }
            other => self.emit(other),
        }
    }

    fn finish_heading(&mut self) {
        let Some(heading) = self.heading.take() else {
            return;
        };
        let text = heading.text.trim().to_string();
        let id = match &heading.id {
            Some(explicit) => self.ids.assign(explicit),
            None => self.ids.assign(&toc::slugify(&text)),
        };
        self.toc.push(TocEntry {
            text,
            id: id.clone(),
            level: heading.level as u8,
        });

        self.out.push(Event::Start(Tag::Heading {
            level: heading.level,
            id: Some(CowStr::from(id)),
            classes: heading.classes,
            attrs: heading.attrs,
        }));
        self.out.extend(heading.events);
        self.out.push(Event::End(TagEnd::Heading(heading.level)));
    }

    fn finish_code_block(&mut self) {
        let Some(block) = self.code.take() else {
            return;
        };
        let highlighted = self
            .ctx
            .highlighter
            .highlight(&block.code, block.lang.as_deref());
        let markup = html! {
            div.code-block-wrapper {
                button.copy-button type="button" data-copy-state="copy" { "Copy" }
                pre class=(CODE_CLASS) {
                    code class=[block.lang.as_ref().map(|l| format!("language-{l}"))] {
                        (PreEscaped(highlighted))
                    }
                }
            }
        };
        self.emit(Event::Html(CowStr::from(markup.into_string() + "\n")));
    }

    fn finish_image(&mut self, end: Event<'e>) {
        let Some(mut image) = self.image.take() else {
            return;
        };
        match self.ctx.embeds.remote_embed(&image.alt, &image.destination) {
            Some(markup) => self.emit(Event::InlineHtml(CowStr::from(markup))),
            None => {
                image.events.push(end);
                for event in image.events {
                    self.emit(event);
                }
            }
        }
    }
}

/// Language token of a fence info string (`rust,ignore` → `rust`).
fn fence_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}
