//! Media discovery and publishing.
//!
//! Every image, video and audio file under the content directory is
//! published flat into `static/media/`, under the sanitized name produced by
//! [`naming::asset_file_name`]. The `![[...]]` rewriter computes the same
//! name, which is what lets a note embed `![[my photo.png]]` from anywhere in
//! the vault.
//!
//! ## Downscaling
//!
//! When `media.maxImageHeight` is set, raster images taller than the limit
//! (JPEG, PNG, WebP) are resized through the [`ImageBackend`] with their
//! aspect ratio kept. Everything else, including GIF and SVG, is copied
//! byte for byte.
//!
//! ## Name collisions
//!
//! Two files that sanitize to the same name cannot both be published. The
//! walk is sorted, so the first one in path order wins and the rest are
//! skipped with a warning.

use crate::config::MediaConfig;
use crate::imaging::{self, BackendError, ImageBackend, Quality, ResizeParams};
use crate::naming;
use crate::tasks::{self, TaskOutcomes};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to copy {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to resize {path}: {source}")]
    Resize {
        path: PathBuf,
        source: BackendError,
    },
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "ogg", "3gp", "flv", "avi", "wmv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "aac"];

/// Broad media category, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = extension(path)?;
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else {
            None
        }
    }

    /// MIME type for a file of this kind, used on `<source type>`.
    ///
    /// `None` when the extension does not belong to this kind.
    pub fn mime_type(self, name: &str) -> Option<&'static str> {
        let ext = extension(Path::new(name))?;
        let mime = match (self, ext.as_str()) {
            (Self::Image, "png") => "image/png",
            (Self::Image, "jpg" | "jpeg") => "image/jpeg",
            (Self::Image, "gif") => "image/gif",
            (Self::Image, "webp") => "image/webp",
            (Self::Image, "svg") => "image/svg+xml",
            (Self::Image, "ico") => "image/x-icon",
            (Self::Video, "mp4") => "video/mp4",
            (Self::Video, "webm") => "video/webm",
            (Self::Video, "mov") => "video/quicktime",
            (Self::Video, "mkv") => "video/x-matroska",
            (Self::Video, "ogg") => "video/ogg",
            (Self::Video, "3gp") => "video/3gpp",
            (Self::Video, "flv") => "video/x-flv",
            (Self::Video, "avi") => "video/x-msvideo",
            (Self::Video, "wmv") => "video/x-ms-wmv",
            (Self::Audio, "mp3") => "audio/mpeg",
            (Self::Audio, "wav") => "audio/wav",
            (Self::Audio, "m4a") => "audio/mp4",
            (Self::Audio, "flac") => "audio/flac",
            (Self::Audio, "aac") => "audio/aac",
            _ => return None,
        };
        Some(mime)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// A media file found under the content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub source: PathBuf,
    /// Slash-separated path relative to the content root.
    pub relative: String,
    /// File name under `static/media/`.
    pub published: String,
    pub kind: MediaKind,
}

/// What happened to one media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaAction {
    Copied,
    Resized { from: (u32, u32), to: (u32, u32) },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaOutcome {
    pub published: String,
    pub action: MediaAction,
}

/// Image settings for the publish pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSettings {
    pub max_image_height: Option<u32>,
    pub quality: Quality,
}

impl MediaSettings {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            max_image_height: config.max_image_height,
            quality: Quality::new(config.quality),
        }
    }
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self::from_config(&MediaConfig::default())
    }
}

/// Find every media file under `root`, skipping hidden and ignored entries.
///
/// Symlinks are not followed. Unreadable entries are logged and skipped.
pub fn discover_media(root: &Path, ignore: &[String]) -> Vec<MediaFile> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !naming::is_hidden(&name) && !ignore.iter().any(|i| i.as_str() == name.as_ref())
        });

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable media entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = MediaKind::from_path(entry.path()) else {
            continue;
        };
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(naming::to_url_path)
            .unwrap_or_else(|_| entry.path().display().to_string());
        let published = naming::asset_file_name(&entry.file_name().to_string_lossy());
        if !seen.insert(published.clone()) {
            log::warn!("Media name collision: {relative} would overwrite {published}, skipping");
            continue;
        }
        files.push(MediaFile {
            source: entry.path().to_path_buf(),
            relative,
            published,
            kind,
        });
    }
    files
}

/// Publish `files` into `dest`, downscaling tall raster images.
///
/// Every file is attempted; failures come back in the outcomes.
pub fn copy_media(
    backend: &impl ImageBackend,
    files: &[MediaFile],
    dest: &Path,
    settings: &MediaSettings,
) -> TaskOutcomes<MediaOutcome, MediaError> {
    tasks::run_group(
        files,
        |file| file.relative.clone(),
        |file| publish(backend, file, dest, settings),
    )
}

fn publish(
    backend: &impl ImageBackend,
    file: &MediaFile,
    dest: &Path,
    settings: &MediaSettings,
) -> Result<MediaOutcome, MediaError> {
    let output = dest.join(&file.published);
    if let Some((from, to)) = downscale_target(backend, file, settings) {
        backend
            .resize(&ResizeParams {
                source: file.source.clone(),
                output,
                width: to.0,
                height: to.1,
                quality: settings.quality,
            })
            .map_err(|source| MediaError::Resize {
                path: file.source.clone(),
                source,
            })?;
        return Ok(MediaOutcome {
            published: file.published.clone(),
            action: MediaAction::Resized { from, to },
        });
    }

    fs::copy(&file.source, &output).map_err(|source| MediaError::Io {
        path: file.source.clone(),
        source,
    })?;
    Ok(MediaOutcome {
        published: file.published.clone(),
        action: MediaAction::Copied,
    })
}

/// Original and target size when `file` needs downscaling.
fn downscale_target(
    backend: &impl ImageBackend,
    file: &MediaFile,
    settings: &MediaSettings,
) -> Option<((u32, u32), (u32, u32))> {
    let max_height = settings.max_image_height?;
    if file.kind != MediaKind::Image || !imaging::is_resizable(&file.source) {
        return None;
    }
    let dims = match backend.identify(&file.source) {
        Ok(dims) => dims,
        Err(e) => {
            log::warn!("Could not read size of {}, copying as-is: {e}", file.relative);
            return None;
        }
    };
    let original = (dims.width, dims.height);
    imaging::fit_to_height(original, max_height).map(|target| (original, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::RustBackend;
    use crate::test_helpers::{setup_fixtures, write_file};
    use tempfile::TempDir;

    // =========================================================================
    // MediaKind
    // =========================================================================

    #[test]
    fn kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a.PNG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("x/clip.webm")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("memo.m4a")), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_path(Path::new("note.md")), None);
        assert_eq!(MediaKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn mime_types_match_kind() {
        assert_eq!(MediaKind::Video.mime_type("clip.MOV"), Some("video/quicktime"));
        assert_eq!(MediaKind::Audio.mime_type("song.mp3"), Some("audio/mpeg"));
        assert_eq!(MediaKind::Image.mime_type("icon.svg"), Some("image/svg+xml"));
        assert_eq!(MediaKind::Audio.mime_type("clip.mp4"), None);
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    #[test]
    fn discovers_fixture_media() {
        let tmp = setup_fixtures();
        let files = discover_media(tmp.path(), &["private".to_string()]);
        let relatives: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(relatives, vec!["notes/attachments/diagram.svg"]);
        assert_eq!(files[0].published, "diagram.svg");
        assert_eq!(files[0].kind, MediaKind::Image);
    }

    #[test]
    fn skips_hidden_and_ignored() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.png", "x");
        write_file(tmp.path(), ".trash/b.png", "x");
        write_file(tmp.path(), "private/c.png", "x");
        write_file(tmp.path(), "templates/d.mp3", "x");

        let files = discover_media(tmp.path(), &["private".into(), "templates".into()]);
        let names: Vec<&str> = files.iter().map(|f| f.published.as_str()).collect();
        assert_eq!(names, vec!["a.png"]);
    }

    #[test]
    fn sanitized_collisions_keep_first() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a/my photo.png", "first");
        write_file(tmp.path(), "b/my-photo.png", "second");

        let files = discover_media(tmp.path(), &[]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "a/my photo.png");
        assert_eq!(files[0].published, "my-photo.png");
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    fn media_file(root: &Path, name: &str) -> MediaFile {
        write_file(root, name, "bytes");
        MediaFile {
            source: root.join(name),
            relative: name.to_string(),
            published: naming::asset_file_name(name),
            kind: MediaKind::from_path(Path::new(name)).unwrap(),
        }
    }

    #[test]
    fn tall_images_are_resized_others_copied() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let files = vec![
            media_file(src.path(), "tall.jpg"),
            media_file(src.path(), "short.png"),
            media_file(src.path(), "anim.gif"),
            media_file(src.path(), "clip.mp4"),
        ];
        let backend = MockBackend::new()
            .with_dimensions("tall.jpg", 3000, 4000)
            .with_dimensions("short.png", 400, 300);
        let settings = MediaSettings {
            max_image_height: Some(1000),
            quality: Quality::new(70),
        };

        let outcomes = copy_media(&backend, &files, dest.path(), &settings);
        assert!(outcomes.is_clean());
        assert_eq!(
            outcomes.completed[0].action,
            MediaAction::Resized { from: (3000, 4000), to: (750, 1000) }
        );
        assert!(outcomes.completed[1..].iter().all(|o| o.action == MediaAction::Copied));

        assert_eq!(
            backend.resizes(),
            vec![RecordedOp::Resize {
                source: src.path().join("tall.jpg").to_string_lossy().to_string(),
                output: dest.path().join("tall.jpg").to_string_lossy().to_string(),
                width: 750,
                height: 1000,
                quality: 70,
            }]
        );
        assert!(dest.path().join("short.png").exists());
        assert!(dest.path().join("anim.gif").exists());
        assert!(dest.path().join("clip.mp4").exists());
    }

    #[test]
    fn no_height_limit_means_no_identify() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let files = vec![media_file(src.path(), "photo.jpg")];
        let backend = MockBackend::new();

        let outcomes = copy_media(&backend, &files, dest.path(), &MediaSettings::default());
        assert!(outcomes.is_clean());
        assert!(backend.get_operations().is_empty());
        assert_eq!(fs::read_to_string(dest.path().join("photo.jpg")).unwrap(), "bytes");
    }

    #[test]
    fn unreadable_dimensions_fall_back_to_copy() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let files = vec![media_file(src.path(), "odd.webp")];
        let settings = MediaSettings {
            max_image_height: Some(10),
            quality: Quality::default(),
        };

        let outcomes = copy_media(&MockBackend::new(), &files, dest.path(), &settings);
        assert_eq!(outcomes.completed[0].action, MediaAction::Copied);
    }

    #[test]
    fn missing_source_is_a_failure_not_a_panic() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let mut gone = media_file(src.path(), "gone.mp3");
        fs::remove_file(&gone.source).unwrap();
        gone.relative = "gone.mp3".into();
        let kept = media_file(src.path(), "kept.mp3");

        let outcomes = copy_media(&RustBackend::new(), &[gone, kept], dest.path(), &MediaSettings::default());
        assert_eq!(outcomes.completed.len(), 1);
        assert_eq!(outcomes.failed.len(), 1);
        assert_eq!(outcomes.failed[0].item, "gone.mp3");
        assert!(matches!(outcomes.failed[0].error, MediaError::Io { .. }));
    }
}
