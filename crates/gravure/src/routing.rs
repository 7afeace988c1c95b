use std::path::Path;

/// Derives the canonical URL path for a document from its path relative to
/// the content root.
///
/// The format extension is stripped, an `index` basename collapses into its
/// parent directory and the root maps to `/`. Non-root paths never carry a
/// trailing slash, so every document has exactly one canonical form.
pub fn url_path_from_rel_path(rel_path: &Path, slugify: bool) -> String {
    let mut segments: Vec<String> = Vec::new();

    if let Some(parent) = rel_path.parent() {
        for component in parent.components() {
            segments.push(component.as_os_str().to_string_lossy().into_owned());
        }
    }

    let stem = rel_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    if stem != "index" && !stem.is_empty() {
        segments.push(stem);
    }

    if slugify {
        segments = segments.iter().map(|segment| slug::slugify(segment)).collect();
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Normalizes a base path into either an empty string or `/prefix` with no
/// trailing slash, so it can be glued between the origin and a URL path.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');

    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Builds the absolute URL for a route. `base_path` must already be
/// normalized.
pub fn join_permalink(site_origin: &str, base_path: &str, url_path: &str) -> String {
    format!("{}{}{}", site_origin.trim_end_matches('/'), base_path, url_path)
}
