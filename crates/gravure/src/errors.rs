//! Error types for Gravure.
use std::fmt::{self, Debug, Formatter, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::content::DocumentFormat;

macro_rules! impl_debug_for_error {
    ($($t:ty),*) => {
        $(
            impl Debug for $t {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    // Rust uses the Debug trait to show errors when they're returned from main
                    // But, thiserror uses the Display trait to show errors. This redirects Debug to Display, essentially.
                    write!(f, "{}", self)
                }
            }
        )*
    };
}

/// Structural failures while discovering the content tree. Always fatal.
#[derive(Error)]
pub enum ScanError {
    #[error("Content root does not exist: {path}")]
    RootNotFound { path: PathBuf },
    #[error("Content root is not a directory: {path}")]
    RootNotADirectory { path: PathBuf },
    #[error("Failed to read content under: {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures parsing the YAML block between `---` fences at the top of a document.
#[derive(Error)]
pub enum FrontMatterError {
    #[error("Front matter opened but never closed in {path}")]
    Unterminated { path: PathBuf },
    #[error("Invalid front matter in {path}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Front matter in {path} must be a mapping of keys to values")]
    NotAMapping { path: PathBuf },
}

/// Failures turning a document body into HTML.
#[derive(Error)]
pub enum RenderError {
    #[error("No renderer registered for {format} documents (from {path})")]
    NoRenderer {
        path: PathBuf,
        format: DocumentFormat,
    },
    #[error("Component error in {path}: {message}")]
    Component { path: PathBuf, message: String },
    #[error("Failed to highlight a code block in {path}")]
    Highlight {
        path: PathBuf,
        #[source]
        source: syntect::Error,
    },
}

/// Two or more documents derived the same URL path. Always fatal, never
/// resolved by overwriting.
#[derive(Error)]
#[error("{}", describe_collisions(.collisions))]
pub struct RouteCollisionError {
    pub collisions: Vec<RouteCollision>,
}

pub struct RouteCollision {
    pub url_path: String,
    pub sources: Vec<PathBuf>,
}

fn describe_collisions(collisions: &[RouteCollision]) -> String {
    let mut out = format!(
        "{} URL path(s) are claimed by more than one document:",
        collisions.len()
    );
    for collision in collisions {
        let sources = collision
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "\n  `{}` from {}", collision.url_path, sources);
    }
    out
}

/// Filesystem failures while emitting artifacts. Collected per route, never
/// aborting sibling writes.
#[derive(Error)]
pub enum WriteError {
    #[error("Failed to write page `{route}` to file: {path}")]
    Page {
        route: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to copy static file to: {path}")]
    StaticAsset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write sitemap to: {path}")]
    Sitemap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to clean output directory: {path}")]
    CleanOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error)]
pub enum ConfigError {
    #[error("`site_origin` is required to build absolute URLs, but is empty")]
    MissingSiteOrigin,
    #[error("`site_origin` must be an absolute http(s) URL, got `{origin}`")]
    InvalidSiteOrigin { origin: String },
}

/// A failure confined to a single document. These are collected across the
/// whole build and reported together, so one invocation surfaces every
/// problem instead of stopping at the first.
#[derive(Error)]
pub enum DocumentError {
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything that went wrong during a build that was allowed to keep going.
#[derive(Error)]
#[error("{}", describe_failure(.documents, .writes))]
pub struct BuildFailure {
    pub documents: Vec<DocumentError>,
    pub writes: Vec<WriteError>,
}

fn describe_failure(documents: &[DocumentError], writes: &[WriteError]) -> String {
    let mut out = format!(
        "Build failed with {} error(s):",
        documents.len() + writes.len()
    );
    for error in documents {
        let _ = write!(out, "\n  {}", error);
    }
    for error in writes {
        let _ = write!(out, "\n  {}", error);
    }
    out
}

#[derive(Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    RouteCollision(#[from] RouteCollisionError),

    #[error(transparent)]
    Failure(#[from] BuildFailure),
}

impl_debug_for_error!(
    ScanError,
    FrontMatterError,
    RenderError,
    RouteCollisionError,
    WriteError,
    ConfigError,
    DocumentError,
    BuildFailure,
    PipelineError
);

impl DocumentError {
    /// Path of the document the error belongs to.
    pub fn source_path(&self) -> &PathBuf {
        match self {
            DocumentError::FrontMatter(FrontMatterError::Unterminated { path }) => path,
            DocumentError::FrontMatter(FrontMatterError::Invalid { path, .. }) => path,
            DocumentError::FrontMatter(FrontMatterError::NotAMapping { path }) => path,
            DocumentError::Render(RenderError::NoRenderer { path, .. }) => path,
            DocumentError::Render(RenderError::Component { path, .. }) => path,
            DocumentError::Render(RenderError::Highlight { path, .. }) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_error_lists_every_source() {
        let error = RouteCollisionError {
            collisions: vec![RouteCollision {
                url_path: "/a".into(),
                sources: vec![PathBuf::from("content/a.md"), PathBuf::from("content/a/index.md")],
            }],
        };

        let message = error.to_string();
        assert!(message.contains("`/a`"));
        assert!(message.contains("content/a.md"));
        assert!(message.contains("content/a/index.md"));
    }

    #[test]
    fn build_failure_reports_every_error() {
        let failure = BuildFailure {
            documents: vec![DocumentError::FrontMatter(FrontMatterError::Unterminated {
                path: PathBuf::from("content/bad.md"),
            })],
            writes: vec![WriteError::Page {
                route: "/about".into(),
                path: PathBuf::from("dist/about/index.html"),
                source: std::io::Error::other("disk full"),
            }],
        };

        let message = failure.to_string();
        assert!(message.starts_with("Build failed with 2 error(s):"));
        assert!(message.contains("content/bad.md"));
        assert!(message.contains("`/about`"));
    }

    #[test]
    fn debug_matches_display() {
        let error = ScanError::RootNotFound {
            path: PathBuf::from("missing"),
        };
        assert_eq!(format!("{:?}", error), error.to_string());
    }
}
