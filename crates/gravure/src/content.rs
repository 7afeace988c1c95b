//! Core functions and structs to discover and transform the content of your site.
//!
//! The content root is scanned for documents ([`scan_documents`]), each document
//! is rendered to HTML through a [`Renderer`] picked by format
//! ([`transform_document`]), and the resulting pages feed the route table.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

mod frontmatter;
mod highlight;
pub mod markdown;
pub mod shortcodes;

pub use frontmatter::{PageMetadata, RawFrontMatter, parse_front_matter, split_front_matter};
pub use markdown::render_markdown;
pub use shortcodes::{ComponentArgs, ComponentFn, ComponentRegistry, expand_components};

use crate::errors::{DocumentError, RenderError, ScanError};

/// The formats the pipeline knows how to turn into pages, recognized by file
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// `.md` or `.markdown`
    Markdown,
    /// `.mdx`, Markdown with component invocations
    Mdx,
    /// `.html` or `.htm`, emitted as-is
    Static,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "mdx" => Some(Self::Mdx),
            "html" | "htm" => Some(Self::Static),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentFormat::Markdown => "markdown",
            DocumentFormat::Mdx => "mdx",
            DocumentFormat::Static => "static",
        })
    }
}

/// A document found under the content root, read but not yet transformed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Path on disk.
    pub path: PathBuf,
    /// Path relative to the content root. Routes derive from it.
    pub rel_path: PathBuf,
    pub format: DocumentFormat,
    pub raw: String,
}

/// The output of transforming one document: rendered body plus everything the
/// route table and emitter need to know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedPage {
    pub source_path: PathBuf,
    pub rel_path: PathBuf,
    pub format: DocumentFormat,
    pub metadata: PageMetadata,
    /// The raw front matter, for anything the typed metadata does not cover.
    pub fields: RawFrontMatter,
    /// Rendered HTML for Markdown and MDX, the original text for static
    /// documents.
    pub body: String,
}

/// Scans the content root and returns a lazy iterator over the documents in
/// it.
///
/// Hidden files and partials (any path component starting with `.` or `_`)
/// and files without a recognized format are skipped. File contents are read
/// as the iterator advances. Structural problems with the root itself fail
/// here; unreadable entries surface as `Err` items during iteration.
pub fn scan_documents(content_root: &Path) -> Result<DocumentScan, ScanError> {
    let metadata = fs::metadata(content_root).map_err(|_| ScanError::RootNotFound {
        path: content_root.to_path_buf(),
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::RootNotADirectory {
            path: content_root.to_path_buf(),
        });
    }

    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&content_root.to_string_lossy())
    );
    let paths = glob::glob(&pattern).map_err(|e| ScanError::Unreadable {
        path: content_root.to_path_buf(),
        source: std::io::Error::other(e),
    })?;

    Ok(DocumentScan {
        content_root: content_root.to_path_buf(),
        paths,
    })
}

pub struct DocumentScan {
    content_root: PathBuf,
    paths: glob::Paths,
}

impl Iterator for DocumentScan {
    type Item = Result<SourceDocument, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = match self.paths.next()? {
                Ok(path) => path,
                Err(error) => {
                    return Some(Err(ScanError::Unreadable {
                        path: error.path().to_path_buf(),
                        source: error.into_error(),
                    }));
                }
            };

            let Ok(rel_path) = path.strip_prefix(&self.content_root) else {
                continue;
            };
            let rel_path = rel_path.to_path_buf();

            if is_excluded(&rel_path) {
                continue;
            }

            let Some(format) = DocumentFormat::from_path(&rel_path) else {
                continue;
            };

            // A directory can be named like a document.
            if !path.is_file() {
                continue;
            }

            let raw = match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(source) => {
                    return Some(Err(ScanError::Unreadable {
                        path: path.clone(),
                        source,
                    }));
                }
            };

            return Some(Ok(SourceDocument {
                path,
                rel_path,
                format,
                raw,
            }));
        }
    }
}

fn is_excluded(rel_path: &Path) -> bool {
    rel_path.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        name.starts_with('.') || name.starts_with('_')
    })
}

/// Turns a document body into HTML. One renderer is registered per
/// [`DocumentFormat`]; replacing an entry swaps the behavior for that whole
/// format.
pub trait Renderer: Send + Sync {
    fn render(&self, document: &SourceDocument, body: &str) -> Result<String, RenderError>;
}

/// The renderers a build dispatches to, keyed by format.
pub struct RendererRegistry(FxHashMap<DocumentFormat, Box<dyn Renderer>>);

impl RendererRegistry {
    /// An empty registry. Useful when every format should be registered by
    /// hand; most builds want [`RendererRegistry::default`] instead.
    pub fn new() -> Self {
        Self(FxHashMap::default())
    }

    pub fn register<R>(&mut self, format: DocumentFormat, renderer: R)
    where
        R: Renderer + 'static,
    {
        self.0.insert(format, Box::new(renderer));
    }

    pub(crate) fn get(&self, format: DocumentFormat) -> Option<&dyn Renderer> {
        self.0.get(&format).map(|renderer| renderer.as_ref())
    }
}

impl Default for RendererRegistry {
    /// Markdown and MDX through pulldown-cmark with syntax highlighting, MDX
    /// with no components registered, static documents passed through.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(DocumentFormat::Markdown, MarkdownRenderer);
        registry.register(DocumentFormat::Mdx, MdxRenderer::default());
        registry.register(DocumentFormat::Static, StaticRenderer);
        registry
    }
}

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, document: &SourceDocument, body: &str) -> Result<String, RenderError> {
        render_markdown(body).map_err(|source| RenderError::Highlight {
            path: document.path.clone(),
            source,
        })
    }
}

/// MDX documents go through component expansion first, then the Markdown
/// renderer.
#[derive(Default)]
pub struct MdxRenderer {
    pub components: ComponentRegistry,
}

impl MdxRenderer {
    pub fn new(components: ComponentRegistry) -> Self {
        Self { components }
    }
}

impl Renderer for MdxRenderer {
    fn render(&self, document: &SourceDocument, body: &str) -> Result<String, RenderError> {
        let expanded =
            expand_components(body, &self.components).map_err(|message| RenderError::Component {
                path: document.path.clone(),
                message,
            })?;

        render_markdown(&expanded).map_err(|source| RenderError::Highlight {
            path: document.path.clone(),
            source,
        })
    }
}

pub struct StaticRenderer;

impl Renderer for StaticRenderer {
    fn render(&self, _document: &SourceDocument, body: &str) -> Result<String, RenderError> {
        Ok(body.to_string())
    }
}

/// Transforms one document: front matter split off and parsed, body rendered
/// by the renderer registered for the document's format.
///
/// This is a pure function of the document and the registry, so the same
/// document always produces the same page.
pub fn transform_document(
    document: &SourceDocument,
    renderers: &RendererRegistry,
) -> Result<TransformedPage, DocumentError> {
    let (fields, metadata, body) = parse_front_matter(&document.raw, &document.path)?;

    let renderer = renderers
        .get(document.format)
        .ok_or_else(|| RenderError::NoRenderer {
            path: document.path.clone(),
            format: document.format,
        })?;

    let body = renderer.render(document, body)?;

    Ok(TransformedPage {
        source_path: document.path.clone(),
        rel_path: document.rel_path.clone(),
        format: document.format,
        metadata,
        fields,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FrontMatterError;
    use std::fs;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn scan_rel_paths(root: &Path) -> Vec<String> {
        scan_documents(root)
            .unwrap()
            .map(|doc| doc.unwrap().rel_path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.md")),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.markdown")),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.MD")),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.mdx")),
            Some(DocumentFormat::Mdx)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.html")),
            Some(DocumentFormat::Static)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.htm")),
            Some(DocumentFormat::Static)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan_documents(&dir.path().join("nope"));
        assert!(matches!(result, Err(ScanError::RootNotFound { .. })));
    }

    #[test]
    fn test_scan_root_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("content");
        fs::write(&file, "not a dir").unwrap();

        let result = scan_documents(&file);
        assert!(matches!(result, Err(ScanError::RootNotADirectory { .. })));
    }

    #[test]
    fn test_scan_finds_recognized_formats_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "# home");
        write(dir.path(), "about.mdx", "about");
        write(dir.path(), "legacy.html", "<html></html>");
        write(dir.path(), "notes.txt", "skip me");
        write(dir.path(), "data.json", "{}");

        let found = scan_rel_paths(dir.path());
        assert_eq!(found, vec!["about.mdx", "index.md", "legacy.html"]);
    }

    #[test]
    fn test_scan_skips_hidden_and_partial_components() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "page.md", "# page");
        write(dir.path(), "_draft.md", "skip");
        write(dir.path(), ".hidden.md", "skip");
        write(dir.path(), "_partials/common.md", "skip");
        write(dir.path(), ".git/config.md", "skip");
        write(dir.path(), "blog/_inner.md", "skip");
        write(dir.path(), "blog/post.md", "# post");

        let found = scan_rel_paths(dir.path());
        assert_eq!(found, vec!["blog/post.md", "page.md"]);
    }

    #[test]
    fn test_scan_skips_directories_named_like_documents() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("weird.md")).unwrap();
        write(dir.path(), "weird.md/inner.md", "# inner");

        let found = scan_rel_paths(dir.path());
        assert_eq!(found, vec!["weird.md/inner.md"]);
    }

    #[test]
    fn test_scan_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "# hello");

        let docs: Vec<_> = scan_documents(dir.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].raw, "# hello");
        assert_eq!(docs[0].format, DocumentFormat::Markdown);
        assert_eq!(docs[0].path, dir.path().join("a.md"));
    }

    #[test]
    fn test_transform_markdown_document() {
        let document = SourceDocument {
            path: PathBuf::from("content/post.md"),
            rel_path: PathBuf::from("post.md"),
            format: DocumentFormat::Markdown,
            raw: "---\ntitle: Post\n---\n# Hi\n".to_string(),
        };

        let page = transform_document(&document, &RendererRegistry::default()).unwrap();
        assert_eq!(page.metadata.title.as_deref(), Some("Post"));
        assert!(page.body.contains("<h1>Hi</h1>"));
        assert_eq!(page.rel_path, PathBuf::from("post.md"));
    }

    #[test]
    fn test_transform_is_pure() {
        let document = SourceDocument {
            path: PathBuf::from("content/post.md"),
            rel_path: PathBuf::from("post.md"),
            format: DocumentFormat::Markdown,
            raw: "---\ntitle: Post\ntags: [a, b]\n---\nSome **bold** text.\n".to_string(),
        };
        let renderers = RendererRegistry::default();

        let first = transform_document(&document, &renderers).unwrap();
        let second = transform_document(&document, &renderers).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_front_matter_error_carries_path() {
        let document = SourceDocument {
            path: PathBuf::from("content/broken.md"),
            rel_path: PathBuf::from("broken.md"),
            format: DocumentFormat::Markdown,
            raw: "---\ntitle: never closed\n".to_string(),
        };

        let error = transform_document(&document, &RendererRegistry::default()).unwrap_err();
        assert!(matches!(
            error,
            DocumentError::FrontMatter(FrontMatterError::Unterminated { .. })
        ));
        assert_eq!(error.source_path(), &PathBuf::from("content/broken.md"));
    }

    #[test]
    fn test_transform_without_renderer() {
        let document = SourceDocument {
            path: PathBuf::from("content/post.md"),
            rel_path: PathBuf::from("post.md"),
            format: DocumentFormat::Markdown,
            raw: "# Hi".to_string(),
        };

        let error = transform_document(&document, &RendererRegistry::new()).unwrap_err();
        assert!(matches!(
            error,
            DocumentError::Render(RenderError::NoRenderer { .. })
        ));
    }

    #[test]
    fn test_transform_mdx_with_components() {
        let mut components = ComponentRegistry::new();
        components.register("badge", |_| "<span class=\"badge\">new</span>".to_string());

        let mut renderers = RendererRegistry::default();
        renderers.register(DocumentFormat::Mdx, MdxRenderer::new(components));

        let document = SourceDocument {
            path: PathBuf::from("content/page.mdx"),
            rel_path: PathBuf::from("page.mdx"),
            format: DocumentFormat::Mdx,
            raw: "Release {{ badge }}".to_string(),
        };

        let page = transform_document(&document, &renderers).unwrap();
        assert!(page.body.contains("<span class=\"badge\">new</span>"));
    }

    #[test]
    fn test_transform_mdx_unknown_component() {
        let document = SourceDocument {
            path: PathBuf::from("content/page.mdx"),
            rel_path: PathBuf::from("page.mdx"),
            format: DocumentFormat::Mdx,
            raw: "{{ mystery }}".to_string(),
        };

        let error = transform_document(&document, &RendererRegistry::default()).unwrap_err();
        assert!(matches!(
            error,
            DocumentError::Render(RenderError::Component { .. })
        ));
    }

    #[test]
    fn test_transform_static_passthrough() {
        let document = SourceDocument {
            path: PathBuf::from("content/legacy.html"),
            rel_path: PathBuf::from("legacy.html"),
            format: DocumentFormat::Static,
            raw: "<html><head></head><body>old</body></html>".to_string(),
        };

        let page = transform_document(&document, &RendererRegistry::default()).unwrap();
        assert_eq!(page.body, document.raw);
    }

    #[test]
    fn test_transform_static_with_front_matter() {
        let document = SourceDocument {
            path: PathBuf::from("content/legacy.html"),
            rel_path: PathBuf::from("legacy.html"),
            format: DocumentFormat::Static,
            raw: "---\nnoindex: true\n---\n<html><body>old</body></html>".to_string(),
        };

        let page = transform_document(&document, &RendererRegistry::default()).unwrap();
        assert!(page.metadata.noindex);
        assert_eq!(page.body, "<html><body>old</body></html>");
    }
}
