//! Remote media probing for `![alt](https://...)` embeds.
//!
//! Whether a remote URL should become an `<img>`, a `<video>`, an `<audio>`
//! player or a plain link depends on what the server says it is. YouTube
//! links are recognized from the URL alone; everything else gets a `HEAD`
//! request with a short timeout.
//!
//! The network sits behind [`ContentProbe`] so offline builds and tests can
//! swap in [`OfflineProbe`] or a scripted double.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Timeout for a single `HEAD` request.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Looks up the `Content-Type` of a remote resource.
///
/// `None` means "unknown": unreachable host, timeout, error status or no
/// header. Implementations never fail the build.
pub trait ContentProbe: Sync {
    fn content_type(&self, url: &Url) -> Option<String>;
}

/// Probe backed by blocking `HEAD` requests.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self, ProbeError> {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("grimoire/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ContentProbe for HttpProbe {
    fn content_type(&self, url: &Url) -> Option<String> {
        let response = match self.client.head(url.as_str()).send() {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Could not probe {url}: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            log::warn!("Probe of {url} returned {}", response.status());
            return None;
        }
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Probe for `--offline` builds: every remote embed becomes a link.
pub struct OfflineProbe;

impl ContentProbe for OfflineProbe {
    fn content_type(&self, _url: &Url) -> Option<String> {
        None
    }
}

/// How a remote embed should be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEmbed {
    /// YouTube video id.
    YouTube(String),
    Image,
    /// Carries the full content type for the `<source type>` attribute.
    Video(String),
    Audio(String),
    /// Probe failed: render a plain anchor.
    Link,
    /// The server answered with something that is not media.
    Unrecognized(String),
}

/// Classify a remote URL, consulting the probe only when needed.
pub fn resolve(probe: &dyn ContentProbe, url: &Url) -> RemoteEmbed {
    if let Some(id) = youtube_video_id(url) {
        return RemoteEmbed::YouTube(id);
    }
    match probe.content_type(url) {
        Some(content_type) => classify(&content_type),
        None => RemoteEmbed::Link,
    }
}

/// Map a `Content-Type` header value to an embed kind.
pub fn classify(content_type: &str) -> RemoteEmbed {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("image", _)) => RemoteEmbed::Image,
        Some(("video", _)) => RemoteEmbed::Video(essence),
        Some(("audio", _)) => RemoteEmbed::Audio(essence),
        _ => RemoteEmbed::Unrecognized(essence),
    }
}

/// Extract the video id from YouTube watch, embed, shorts and `youtu.be` URLs.
pub fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let id = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed") | Some("shorts") | Some("live") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    }?;
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProbe;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn youtube_watch_and_short_links() {
        assert_eq!(
            youtube_video_id(&url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42")),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            youtube_video_id(&url("https://youtu.be/dQw4w9WgXcQ?si=abc")),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            youtube_video_id(&url("https://m.youtube.com/shorts/abc_DEF-123")),
            Some("abc_DEF-123".to_string())
        );
        assert_eq!(
            youtube_video_id(&url("https://youtube.com/embed/xyz")),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn non_video_youtube_pages_are_not_embeds() {
        assert_eq!(youtube_video_id(&url("https://www.youtube.com/")), None);
        assert_eq!(
            youtube_video_id(&url("https://www.youtube.com/@channel")),
            None
        );
        assert_eq!(youtube_video_id(&url("https://example.com/watch?v=abc")), None);
    }

    #[test]
    fn classify_by_primary_type() {
        assert_eq!(classify("image/png"), RemoteEmbed::Image);
        assert_eq!(
            classify("video/webm; codecs=vp9"),
            RemoteEmbed::Video("video/webm".to_string())
        );
        assert_eq!(
            classify("Audio/MPEG"),
            RemoteEmbed::Audio("audio/mpeg".to_string())
        );
        assert_eq!(
            classify("text/html; charset=utf-8"),
            RemoteEmbed::Unrecognized("text/html".to_string())
        );
    }

    #[test]
    fn youtube_is_resolved_without_probing() {
        let probe = ScriptedProbe::new();
        let embed = resolve(&probe, &url("https://youtu.be/abc123"));
        assert_eq!(embed, RemoteEmbed::YouTube("abc123".to_string()));
        assert!(probe.recorded_calls().is_empty());
    }

    #[test]
    fn probe_failure_becomes_link() {
        let probe = ScriptedProbe::new();
        let embed = resolve(&probe, &url("https://unreachable.example/x.png"));
        assert_eq!(embed, RemoteEmbed::Link);
        assert_eq!(
            probe.recorded_calls(),
            vec!["https://unreachable.example/x.png"]
        );
    }

    #[test]
    fn offline_probe_knows_nothing() {
        assert_eq!(
            resolve(&OfflineProbe, &url("https://example.com/cat.jpg")),
            RemoteEmbed::Link
        );
    }

    #[test]
    fn http_probe_builds() {
        assert!(HttpProbe::with_timeout(Duration::from_millis(10)).is_ok());
    }
}
