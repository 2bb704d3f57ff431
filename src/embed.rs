//! Wiki-style embeds, internal links and autolinks.
//!
//! Runs inside the Markdown event pass ([`crate::markdown`]) on plain text
//! runs only, so nothing in code spans, code blocks, link text or image alt
//! text is touched. All inline syntaxes are matched by one pattern in a
//! single scan of each run:
//!
//! | Syntax | Result |
//! |---|---|
//! | `![[photo.png]]` | `<img>` from the published media folder |
//! | `![[clip.mp4]]` / `![[memo.mp3]]` | `<video>` / `<audio>` player |
//! | `[[Note]]`, `[[Note\|label]]`, `[[Note#Heading]]` | internal `<a class="internal-link">` |
//! | bare `https://…` | autolink |
//!
//! `==highlight==` delimiters are left in place here: a highlight may wrap
//! emphasis or links, so the Markdown pass pairs them across events using
//! [`MARK_DELIMITER`].
//!
//! Remote Markdown images (`![alt](https://…)`) are handled by
//! [`EmbedRewriter::remote_embed`], which asks the [`ContentProbe`].
//!
//! Anything that cannot be resolved is left exactly as written.

use crate::links::{self, LinkTable};
use crate::media::MediaKind;
use crate::naming;
use crate::probe::{self, ContentProbe, RemoteEmbed};
use crate::toc;
use crate::types::MEDIA_DIR;
use maud::html;
use pulldown_cmark::{CowStr, Event};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

/// Opens and closes a `<mark>` highlight.
pub const MARK_DELIMITER: &str = "==";

static INLINE_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"!\[\[(?P<embed>[^\[\]\n]+)\]\]",
        r"|\[\[(?P<target>[^\[\]|\n]*)(?:\|(?P<display>[^\[\]\n]*))?\]\]",
        r#"|(?P<url>https?://[^\s<>"\[\]]+)"#,
    ))
    .expect("inline syntax pattern is valid")
});

/// Characters dropped from the end of a bare URL, as in GFM autolinks.
const URL_TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', '\'', '"', '*', '_'];

/// Rewrites inline syntax for one build. Cheap to copy; holds only borrows.
#[derive(Clone, Copy)]
pub struct EmbedRewriter<'a> {
    links: &'a LinkTable,
    probe: &'a dyn ContentProbe,
}

impl<'a> EmbedRewriter<'a> {
    pub fn new(links: &'a LinkTable, probe: &'a dyn ContentProbe) -> Self {
        Self { links, probe }
    }

    /// Split a text run into plain text and generated HTML.
    ///
    /// Plain pieces stay `Text` events so the HTML writer escapes them.
    pub fn rewrite_text(&self, text: &str) -> Vec<Event<'static>> {
        let mut pieces = Vec::new();
        let mut last = 0;

        for caps in INLINE_SYNTAX.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() < last {
                continue;
            }
            let (markup, end) = if let Some(name) = caps.name("embed") {
                (self.local_embed(name.as_str()), whole.end())
            } else if let Some(target) = caps.name("target") {
                let display = caps.name("display").map(|d| d.as_str());
                (self.internal_link(target.as_str(), display), whole.end())
            } else if let Some(url) = caps.name("url") {
                let trimmed = trim_url(url.as_str());
                (autolink(trimmed), url.start() + trimmed.len())
            } else {
                (None, whole.end())
            };

            if let Some(markup) = markup {
                if whole.start() > last {
                    pieces.push(Event::Text(CowStr::from(text[last..whole.start()].to_string())));
                }
                pieces.push(Event::InlineHtml(CowStr::from(markup)));
                last = end;
            }
        }

        if last < text.len() {
            pieces.push(Event::Text(CowStr::from(text[last..].to_string())));
        }
        pieces
    }

    /// `![[file.ext]]` → media element. Unknown extensions stay literal.
    fn local_embed(&self, inner: &str) -> Option<String> {
        // `![[photo.png|300]]` carries a display size we don't use.
        let file = inner.split('|').next().unwrap_or(inner).trim();
        let name = naming::base_name(file);
        let kind = MediaKind::from_path(Path::new(name))?;
        let src = format!("/{}/{}", MEDIA_DIR, naming::asset_file_name(name));
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().replace(' ', "-"))
            .unwrap_or_default();

        let markup = match kind {
            MediaKind::Image => html! { img src=(src) alt=(stem) loading="lazy"; },
            MediaKind::Video => html! {
                video controls preload="metadata" title=(stem) {
                    source src=(src) type=[kind.mime_type(name)];
                }
            },
            MediaKind::Audio => html! { audio controls preload="metadata" src=(src) title=(stem) {} },
        };
        Some(markup.into_string())
    }

    /// `[[target|display]]` → anchor, or `None` to keep the literal text.
    fn internal_link(&self, target: &str, display: Option<&str>) -> Option<String> {
        let target = target.trim();
        let (name, fragment) = match target.split_once('#') {
            Some((name, heading)) => (name.trim(), Some(toc::slugify(heading))),
            None => (target, None),
        };
        let anchor = fragment
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| format!("#{f}"))
            .unwrap_or_default();

        let href = if name.is_empty() {
            // `[[#Heading]]` points into the current page.
            if anchor.is_empty() {
                return None;
            }
            anchor.clone()
        } else if let Some(path) = self.links.resolve(name) {
            format!("{}{}", links::href(path), anchor)
        } else if let Some((_, rest)) = name.split_once('/') {
            log::debug!("Unresolved link [[{target}]], using /{rest}");
            format!("/{}{}", naming::encode_url_path(rest), anchor)
        } else {
            log::debug!("Unresolved link [[{target}]] left as text");
            return None;
        };

        let label = link_label(target, display);
        Some(html! { a href=(href) class="internal-link" { (label) } }.into_string())
    }

    /// Markup for a remote `![alt](url)` image, or `None` to render it unchanged.
    ///
    /// Relative and non-HTTP destinations are not probed.
    pub fn remote_embed(&self, alt: &str, destination: &str) -> Option<String> {
        let url = Url::parse(destination).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let markup = match probe::resolve(self.probe, &url) {
            RemoteEmbed::YouTube(id) => {
                let src = format!("https://www.youtube.com/embed/{id}");
                let title = if alt.is_empty() { "YouTube video" } else { alt };
                html! {
                    iframe src=(src) title=(title) width="640" height="360" frameborder="0"
                        allow="accelerometer; clipboard-write; encrypted-media; picture-in-picture"
                        allowfullscreen {}
                }
            }
            RemoteEmbed::Image => html! { img src=(url.as_str()) alt=(alt) loading="lazy"; },
            RemoteEmbed::Video(content_type) => html! {
                video controls preload="metadata" {
                    source src=(url.as_str()) type=(content_type);
                    (alt)
                }
            },
            RemoteEmbed::Audio(content_type) => html! {
                audio controls preload="metadata" {
                    source src=(url.as_str()) type=(content_type);
                    (alt)
                }
            },
            RemoteEmbed::Link => html! {
                a href=(url.as_str()) { @if alt.is_empty() { (url.as_str()) } @else { (alt) } }
            },
            RemoteEmbed::Unrecognized(content_type) => {
                log::debug!("{url} is {content_type}, leaving image as written");
                return None;
            }
        };
        Some(markup.into_string())
    }
}

/// Text of a run as a reader sees it: links reduced to their labels,
/// highlights to their contents, embeds dropped.
///
/// Used for heading text in the table of contents.
pub fn plain_text(text: &str) -> String {
    INLINE_SYNTAX
        .replace_all(text, |caps: &Captures| {
            if let Some(target) = caps.name("target") {
                let display = caps.name("display").map(|d| d.as_str());
                link_label(target.as_str().trim(), display).to_string()
            } else if caps.name("embed").is_some() {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .replace(MARK_DELIMITER, "")
}

/// Visible label of `[[target|display]]`: the display text, else the note's
/// base name, else the raw target for same-page `[[#Heading]]` links.
fn link_label<'t>(target: &'t str, display: Option<&'t str>) -> &'t str {
    let name = target.split('#').next().unwrap_or(target).trim();
    display
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| if name.is_empty() { target } else { naming::base_name(name) })
}

fn autolink(url: &str) -> Option<String> {
    if url.len() <= "https://".len() {
        return None;
    }
    Some(html! { a href=(url) { (url) } }.into_string())
}

/// Drop trailing punctuation and an unbalanced closing parenthesis.
fn trim_url(url: &str) -> &str {
    let mut end = url.len();
    loop {
        let candidate = &url[..end];
        if candidate.ends_with(URL_TRAILING_PUNCTUATION) {
            end -= 1;
        } else if candidate.ends_with(')')
            && candidate.matches(')').count() > candidate.matches('(').count()
        {
            end -= 1;
        } else {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::OfflineProbe;
    use crate::test_helpers::ScriptedProbe;

    fn table() -> LinkTable {
        [
            ("Home".to_string(), "index.html".to_string()),
            ("Rust Tips".to_string(), "notes/Rust Tips.html".to_string()),
        ]
        .into_iter()
        .collect()
    }

    /// Render rewriter output the way the HTML writer would.
    fn rewrite(text: &str) -> String {
        let links = table();
        let rewriter = EmbedRewriter::new(&links, &OfflineProbe);
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, rewriter.rewrite_text(text).into_iter());
        html
    }

    #[test]
    fn resolved_link_becomes_anchor() {
        assert_eq!(
            rewrite("see [[Home]]"),
            r#"see <a href="/index.html" class="internal-link">Home</a>"#
        );
    }

    #[test]
    fn missing_link_stays_literal() {
        assert_eq!(rewrite("see [[Missing]]"), "see [[Missing]]");
    }

    #[test]
    fn display_text_and_encoding() {
        assert_eq!(
            rewrite("[[Rust Tips|tips & tricks]]"),
            r#"<a href="/notes/Rust%20Tips.html" class="internal-link">tips &amp; tricks</a>"#
        );
    }

    #[test]
    fn heading_fragments() {
        assert_eq!(
            rewrite("[[Rust Tips#Error Handling]]"),
            r#"<a href="/notes/Rust%20Tips.html#error-handling" class="internal-link">Rust Tips</a>"#
        );
        assert_eq!(
            rewrite("[[#Getting Started|up]]"),
            r##"<a href="#getting-started" class="internal-link">up</a>"##
        );
    }

    #[test]
    fn unresolved_path_link_uses_rest_of_path() {
        assert_eq!(
            rewrite("[[vault/sub/Other Note]]"),
            r#"<a href="/sub/Other%20Note" class="internal-link">Other Note</a>"#
        );
    }

    #[test]
    fn image_embed_uses_media_folder() {
        assert_eq!(
            rewrite("![[my photo.png]]"),
            r#"<img src="/static/media/my-photo.png" alt="my-photo" loading="lazy">"#
        );
    }

    #[test]
    fn image_embed_ignores_size_suffix() {
        assert!(rewrite("![[chart.svg|300]]").contains(r#"src="/static/media/chart.svg""#));
    }

    #[test]
    fn video_and_audio_embeds() {
        let video = rewrite("![[demo clip.mp4]]");
        assert!(video.starts_with("<video controls"));
        assert!(video.contains(r#"<source src="/static/media/demo-clip.mp4" type="video/mp4">"#));

        let audio = rewrite("![[memo.mp3]]");
        assert!(audio.starts_with("<audio controls"));
        assert!(audio.contains(r#"src="/static/media/memo.mp3""#));
    }

    #[test]
    fn unknown_embed_stays_literal() {
        assert_eq!(rewrite("![[Some Note]]"), "![[Some Note]]");
        assert_eq!(rewrite("![[report.pdf]]"), "![[report.pdf]]");
    }

    #[test]
    fn highlight_delimiters_pass_through() {
        assert_eq!(rewrite("a ==b & c== d"), "a ==b &amp; c== d");
        assert_eq!(
            rewrite("==[[Home]]=="),
            r#"==<a href="/index.html" class="internal-link">Home</a>=="#
        );
    }

    #[test]
    fn plain_text_is_escaped() {
        assert_eq!(rewrite("1 < 2 [[Home]]"), "1 &lt; 2 <a href=\"/index.html\" class=\"internal-link\">Home</a>");
    }

    #[test]
    fn bare_urls_are_autolinked_without_trailing_punctuation() {
        assert_eq!(
            rewrite("Visit https://example.com/a_(b)."),
            r#"Visit <a href="https://example.com/a_(b)">https://example.com/a_(b)</a>."#
        );
        assert_eq!(
            rewrite("(see https://example.com)"),
            r#"(see <a href="https://example.com">https://example.com</a>)"#
        );
    }

    #[test]
    fn several_syntaxes_in_one_run() {
        let html = rewrite("[[Home]] and https://a.example and ![[a.gif]]");
        assert!(html.contains(r#"class="internal-link">Home</a>"#));
        assert!(html.contains(r#"<a href="https://a.example">"#));
        assert!(html.contains(r#"<img src="/static/media/a.gif""#));
    }

    #[test]
    fn plain_text_reduces_syntax_to_labels() {
        assert_eq!(
            plain_text("See [[Rust Tips]] and [[Home|home]] ==now== ![[a.png]]"),
            "See Rust Tips and home now "
        );
        assert_eq!(plain_text("[[notes/Deep Note#Part]]"), "Deep Note");
    }

    // =========================================================================
    // Remote embeds
    // =========================================================================

    fn remote(probe: &dyn ContentProbe, alt: &str, url: &str) -> Option<String> {
        let links = table();
        EmbedRewriter::new(&links, probe).remote_embed(alt, url)
    }

    #[test]
    fn remote_image_video_and_audio() {
        let probe = ScriptedProbe::new()
            .with("https://cdn.example/cat.jpg", "image/jpeg")
            .with("https://cdn.example/clip", "video/webm")
            .with("https://cdn.example/song", "audio/ogg");

        assert_eq!(
            remote(&probe, "cat", "https://cdn.example/cat.jpg").unwrap(),
            r#"<img src="https://cdn.example/cat.jpg" alt="cat" loading="lazy">"#
        );
        let video = remote(&probe, "clip", "https://cdn.example/clip").unwrap();
        assert!(video.contains(r#"<source src="https://cdn.example/clip" type="video/webm">"#));
        let audio = remote(&probe, "song", "https://cdn.example/song").unwrap();
        assert!(audio.starts_with("<audio controls"));
    }

    #[test]
    fn remote_youtube_becomes_iframe_without_probe() {
        let probe = ScriptedProbe::new();
        let html = remote(&probe, "talk", "https://www.youtube.com/watch?v=abc123").unwrap();
        assert!(html.starts_with(r#"<iframe src="https://www.youtube.com/embed/abc123" title="talk""#));
        assert!(probe.recorded_calls().is_empty());
    }

    #[test]
    fn remote_probe_failure_is_anchor() {
        let html = remote(&OfflineProbe, "paper", "https://example.com/paper").unwrap();
        assert_eq!(html, r#"<a href="https://example.com/paper">paper</a>"#);
    }

    #[test]
    fn remote_non_media_and_local_paths_are_unchanged() {
        let probe = ScriptedProbe::new().with("https://example.com/page", "text/html");
        assert_eq!(remote(&probe, "x", "https://example.com/page"), None);
        assert_eq!(remote(&probe, "x", "images/local.png"), None);
        assert_eq!(remote(&probe, "x", "mailto:someone@example.com"), None);
        assert_eq!(probe.recorded_calls(), vec!["https://example.com/page"]);
    }
}
