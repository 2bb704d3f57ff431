//! Server-side syntax highlighting for fenced code blocks.
//!
//! Code is tokenized with syntect's bundled grammars and emitted as
//! `<span class="syn-...">` runs. Colors live in a generated stylesheet
//! (`static/syntax.css`) instead of inline styles, so the light/dark toggle
//! can swap palettes without re-rendering pages.

use maud::html;
use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Highlight theme not bundled: {0}")]
    MissingTheme(&'static str),
    #[error("Syntax highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
}

pub const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "syn-" };
/// Class on `<pre>` that carries the theme's background and base color.
pub const CODE_CLASS: &str = "syn-code";

const LIGHT_THEME: &str = "InspiredGitHub";
const DARK_THEME: &str = "base16-ocean.dark";
const DARK_SCOPE: &str = ".dark";

/// Grammar set loaded once per build and shared by every page render.
pub struct Highlighter {
    syntaxes: SyntaxSet,
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Inner HTML for a `<code>` element.
    ///
    /// Unknown or missing languages fall back to escaped plain text.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .and_then(|l| self.syntaxes.find_syntax_by_token(l));
        let Some(syntax) = syntax else {
            return escape(code);
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                log::debug!("Highlighting {} failed, using plain text: {e}", syntax.name);
                return escape(code);
            }
        }
        generator.finalize()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(code: &str) -> String {
    html! { (code) }.into_string()
}

/// Stylesheet for highlighted code: the light theme unscoped, the dark theme
/// scoped under `.dark`.
pub fn stylesheet() -> Result<String, HighlightError> {
    let themes = ThemeSet::load_defaults();
    let light = themes
        .themes
        .get(LIGHT_THEME)
        .ok_or(HighlightError::MissingTheme(LIGHT_THEME))?;
    let dark = themes
        .themes
        .get(DARK_THEME)
        .ok_or(HighlightError::MissingTheme(DARK_THEME))?;

    let light_css = css_for_theme_with_class_style(light, CLASS_STYLE)?;
    let dark_css = css_for_theme_with_class_style(dark, CLASS_STYLE)?;
    Ok(format!("{}\n{}", light_css, scope_selectors(&dark_css, DARK_SCOPE)))
}

/// Prefix every rule selector in `css` with `scope`.
///
/// Only handles the flat `selector, selector {` rules syntect generates.
fn scope_selectors(css: &str, scope: &str) -> String {
    let mut out = String::with_capacity(css.len() + css.len() / 4);
    for line in css.lines() {
        match line.strip_suffix('{') {
            Some(selectors) if line.starts_with('.') => {
                let scoped: Vec<String> = selectors
                    .split(',')
                    .map(|s| format!("{} {}", scope, s.trim()))
                    .collect();
                out.push_str(&scoped.join(", "));
                out.push_str(" {");
            }
            _ => out.push_str(line),
        }
        out.push('\n');
    }
    out
}
