use std::path::PathBuf;

use crate::errors::ConfigError;
use crate::sitemap::SitemapOptions;

/// Gravure build configuration. Should be passed to [`etch()`](crate::etch()).
///
/// ## Examples
/// Default values:
/// ```rust,no_run
/// use gravure::{etch, BuildConfig, BuildOutput, Finalizers, RendererRegistry, PipelineError};
///
/// fn main() -> Result<BuildOutput, PipelineError> {
///   etch(
///     RendererRegistry::default(),
///     Finalizers::default(),
///     BuildConfig::new("https://example.com"),
///   )
/// }
/// ```
/// Custom values:
/// ```rust,no_run
/// use gravure::{etch, BuildConfig, BuildOutput, Finalizers, RendererRegistry, PipelineError};
///
/// fn main() -> Result<BuildOutput, PipelineError> {
///   etch(
///     RendererRegistry::default(),
///     Finalizers::default(),
///     BuildConfig {
///       base_path: "/docs".into(),
///       output_root: "public".into(),
///       include_drafts: true,
///       slugify: true,
///       ..BuildConfig::new("https://example.com")
///     },
///   )
/// }
/// ```
pub struct BuildConfig {
    /// Absolute origin of the deployed site, e.g. `https://example.com`.
    /// Required: permalinks and the sitemap need it, so a build without one
    /// fails up front.
    pub site_origin: String,

    /// Prefix under which the site is served, e.g. `/my-project` for GitHub
    /// project pages. Shapes permalinks only; artifacts still land directly
    /// under `output_root`.
    pub base_path: String,

    /// Directory scanned for documents.
    pub content_root: PathBuf,

    /// Directory artifacts are written to.
    pub output_root: PathBuf,

    /// Directory whose files are copied into the output root untouched.
    pub static_dir: PathBuf,

    /// Whether documents marked `draft: true` get routes and artifacts.
    pub include_drafts: bool,

    /// Lowercase and hyphenate every URL segment. Off by default: file names
    /// map to URLs verbatim.
    pub slugify: bool,

    /// Stop after the transform stage if any document failed, instead of
    /// carrying on with the rest and reporting everything at the end.
    pub strict: bool,

    /// Whether to clean the output directory before building.
    ///
    /// Not cleaning may offer a performance improvement at the cost of
    /// potentially serving stale content.
    pub clean_output_dir: bool,

    /// Options for sitemap generation. See [`SitemapOptions`] for configuration.
    pub sitemap: SitemapOptions,
}

impl BuildConfig {
    /// A configuration with the given origin and defaults for everything
    /// else.
    pub fn new(site_origin: impl Into<String>) -> Self {
        Self {
            site_origin: site_origin.into(),
            ..Default::default()
        }
    }

    /// Checks the parts of the configuration that cannot be defaulted.
    /// Called once at the start of every build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_origin.is_empty() {
            return Err(ConfigError::MissingSiteOrigin);
        }

        if !self.site_origin.starts_with("http://") && !self.site_origin.starts_with("https://") {
            return Err(ConfigError::InvalidSiteOrigin {
                origin: self.site_origin.clone(),
            });
        }

        Ok(())
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            site_origin: String::new(),
            base_path: String::new(),
            content_root: "content".into(),
            output_root: "dist".into(),
            static_dir: "static".into(),
            include_drafts: false,
            slugify: false,
            strict: false,
            clean_output_dir: true,
            sitemap: SitemapOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.content_root, PathBuf::from("content"));
        assert_eq!(config.output_root, PathBuf::from("dist"));
        assert_eq!(config.base_path, "");
        assert!(!config.include_drafts);
        assert!(!config.slugify);
        assert!(config.clean_output_dir);
        assert!(config.sitemap.enabled);
    }

    #[test]
    fn test_validate_requires_origin() {
        let config = BuildConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSiteOrigin)
        ));
    }

    #[test]
    fn test_validate_requires_absolute_origin() {
        let config = BuildConfig::new("example.com");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSiteOrigin { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(BuildConfig::new("https://example.com").validate().is_ok());
        assert!(BuildConfig::new("http://localhost:8080").validate().is_ok());
    }
}
