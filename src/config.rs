//! Site configuration module.
//!
//! Handles loading and validating `grimoire.config.json`, resolving the
//! content directory, and turning the theme palette into CSS custom
//! properties.
//!
//! ## Config File Location
//!
//! The config lives next to the content, in the directory the build is run
//! from:
//!
//! ```text
//! my-notes/
//! ├── grimoire.config.json
//! └── content/
//!     ├── index.md
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```json
//! {
//!   "inputDir": "content",
//!   "owner": "Ada",
//!   "baseURL": "https://notes.example.com",
//!   "pageTitle": "Ada's Grimoire",
//!   "profilePicturePath": "/static/media/avatar.png",
//!   "metadataImage": "/static/media/card.png",
//!   "ignorePatterns": ["private", "templates"],
//!   "theme": {
//!     "colors": {
//!       "lightMode": { "background": "#eff1f5", "text": "#4c4f69" },
//!       "darkMode": { "background": "#1e1e2e", "text": "#cdd6f4" }
//!     }
//!   },
//!   "media": { "maxImageHeight": 1600, "quality": 85 },
//!   "processing": { "maxThreads": 4 },
//!   "minify": true
//! }
//! ```
//!
//! ## Partial Configuration
//!
//! Every key is optional. Missing keys take their defaults and unknown keys
//! are ignored, so configs written for older releases keep loading. A
//! missing file is the same as `{}`. Malformed JSON is an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "grimoire.config.json";

const DEFAULT_INPUT_DIR: &str = "content";
const DEFAULT_PROFILE_PICTURE: &str = "/static/media/defaultpfp.svg";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `grimoire.config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    /// Content directory, relative to the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<String>,
    /// Older name for `inputDir`, used when `inputDir` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<String>,
    /// Site owner, shown in the sidebar and footer.
    pub owner: String,
    /// Public origin of the deployed site, used for canonical URLs.
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Site name, appended to every page title.
    pub page_title: String,
    /// Avatar shown at the top of the sidebar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_path: Option<String>,
    /// Older name for `profilePicturePath`.
    #[serde(rename = "pfpURL", skip_serializing_if = "Option::is_none")]
    pub pfp_url: Option<String>,
    /// Social card image for `og:image`.
    pub metadata_image: String,
    /// File and directory names skipped at every level of the content tree.
    pub ignore_patterns: Vec<String>,
    pub theme: ThemeConfig,
    pub media: MediaConfig,
    pub processing: ProcessingConfig,
    /// Minify rendered HTML.
    pub minify: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            content_dir: None,
            owner: String::new(),
            base_url: String::new(),
            page_title: "Grimoire".to_string(),
            profile_picture_path: None,
            pfp_url: None,
            metadata_image: String::new(),
            ignore_patterns: vec!["private".to_string()],
            theme: ThemeConfig::default(),
            media: MediaConfig::default(),
            processing: ProcessingConfig::default(),
            minify: true,
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.media.quality) {
            return Err(ConfigError::Validation(format!(
                "media.quality must be between 1 and 100, got {}",
                self.media.quality
            )));
        }
        if self.media.max_image_height == Some(0) {
            return Err(ConfigError::Validation(
                "media.maxImageHeight must be greater than 0".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.maxThreads must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Content directory: `inputDir`, then `contentDir`, then `content`.
    pub fn content_root(&self) -> PathBuf {
        let dir = self
            .input_dir
            .as_deref()
            .or(self.content_dir.as_deref())
            .unwrap_or(DEFAULT_INPUT_DIR);
        PathBuf::from(dir)
    }

    /// Sidebar avatar URL: `profilePicturePath`, then `pfpURL`, then the bundled default.
    pub fn profile_picture(&self) -> &str {
        self.profile_picture_path
            .as_deref()
            .or(self.pfp_url.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROFILE_PICTURE)
    }

    /// Absolute URL for a site-relative path, or `None` when no `baseURL` is set.
    pub fn absolute_url(&self, relative: &str) -> Option<String> {
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!("{}/{}", base, relative.trim_start_matches('/')))
    }
}

/// Theme settings. Only colors are configurable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

/// Light and dark palettes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorConfig {
    pub light_mode: ColorScheme,
    pub dark_mode: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light_mode: ColorScheme::default_light(),
            dark_mode: ColorScheme::default_dark(),
        }
    }
}

/// One palette. Each field becomes a `--name` CSS custom property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub background: String,
    /// Sidebar and code block background.
    pub lightbackground: String,
    /// Text drawn on accent backgrounds.
    pub darktext: String,
    pub heading: String,
    pub links: String,
    pub linkshover: String,
    pub text: String,
    /// Muted text: metadata, captions, blockquotes.
    pub comment: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#eff1f5".to_string(),
            lightbackground: "#e6e9ef".to_string(),
            darktext: "#dce0e8".to_string(),
            heading: "#8839ef".to_string(),
            links: "#1e66f5".to_string(),
            linkshover: "#04a5e5".to_string(),
            text: "#4c4f69".to_string(),
            comment: "#8c8fa1".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#1e1e2e".to_string(),
            lightbackground: "#181825".to_string(),
            darktext: "#11111b".to_string(),
            heading: "#cba6f7".to_string(),
            links: "#89b4fa".to_string(),
            linkshover: "#89dceb".to_string(),
            text: "#cdd6f4".to_string(),
            comment: "#7f849c".to_string(),
        }
    }

    fn variables(&self) -> [(&'static str, &str); 8] {
        [
            ("background", &self.background),
            ("lightbackground", &self.lightbackground),
            ("darktext", &self.darktext),
            ("heading", &self.heading),
            ("links", &self.links),
            ("linkshover", &self.linkshover),
            ("text", &self.text),
            ("comment", &self.comment),
        ]
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

/// Media copy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaConfig {
    /// Raster images taller than this are downscaled. `None` copies everything as-is.
    pub max_image_height: Option<u32>,
    /// Lossy encoding quality (1-100) used when downscaling.
    pub quality: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_image_height: None,
            quality: 85,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Load and validate the config at `path`.
///
/// A missing file yields [`SiteConfig::default`]; anything else that goes
/// wrong is an error.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        log::info!(
            "No config at {}, using defaults (see `grimoire gen-config`)",
            path.display()
        );
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SiteConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// The default configuration as pretty-printed JSON, for `gen-config`.
pub fn stock_config_json() -> String {
    let stock = SiteConfig {
        input_dir: Some(DEFAULT_INPUT_DIR.to_string()),
        profile_picture_path: Some(DEFAULT_PROFILE_PICTURE.to_string()),
        ..SiteConfig::default()
    };
    // Serializing plain strings and integers cannot fail.
    serde_json::to_string_pretty(&stock).unwrap_or_default()
}

/// Generate CSS custom properties from the light and dark palettes.
///
/// The palettes are scoped to `.light` and `.dark` classes on `<body>`; the
/// client script flips between them.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    let block = |selector: &str, scheme: &ColorScheme| {
        let vars: Vec<String> = scheme
            .variables()
            .iter()
            .map(|(name, value)| format!("    --{name}: {value};"))
            .collect();
        format!("{selector} {{\n{}\n}}\n", vars.join("\n"))
    };
    format!(
        "{}\n{}",
        block(".light", &colors.light_mode),
        block(".dark", &colors.dark_mode)
    )
}
