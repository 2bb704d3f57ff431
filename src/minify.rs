//! HTML minification for rendered pages.
//!
//! Whitespace is collapsed, comments dropped, and inline `<style>`/`<script>`
//! bodies minified. `<pre>` contents are left alone, so highlighted code
//! survives intact. Disabled by `"minify": false` in the config.

use std::borrow::Cow;

fn cfg() -> minify_html::Cfg {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    cfg
}

/// Minify `html` when `enabled`, otherwise hand it back untouched.
pub fn minify_page(html: &str, enabled: bool) -> Cow<'_, str> {
    if !enabled {
        return Cow::Borrowed(html);
    }
    let bytes = minify_html::minify(html.as_bytes(), &cfg());
    match String::from_utf8(bytes) {
        Ok(minified) => Cow::Owned(minified),
        Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}
