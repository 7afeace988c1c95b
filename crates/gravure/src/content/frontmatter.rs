//! Front matter parsing for content files.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::errors::FrontMatterError;

/// Typed view over the front matter fields the pipeline itself consumes.
/// Everything else stays available through the raw mapping.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageMetadata {
    /// Page title, used for the document `<title>` when present.
    #[serde(default)]
    pub title: Option<String>,

    /// Publication date, used as the sitemap `<lastmod>`.
    #[serde(default)]
    pub date: Option<NaiveDate>,

    /// Drafts are skipped unless the build includes them. Absent means
    /// published.
    #[serde(default)]
    pub draft: bool,

    /// Tags for the page.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Keeps the page out of the sitemap. Independent from `draft`.
    #[serde(default)]
    pub noindex: bool,
}

/// Raw front matter, key to YAML value.
pub type RawFrontMatter = FxHashMap<String, serde_yaml::Value>;

/// Splits a document into its front matter block and body.
///
/// The block opens with a first line of exactly `---` and closes with the
/// next such line. Returns `Ok(None)` when the document has no front matter,
/// and fails when the opening fence is never closed. The scan is line-based;
/// only a line consisting of `---` closes the block, a `---` embedded in a
/// longer line never does.
pub fn split_front_matter<'a>(
    content: &'a str,
    path: &Path,
) -> Result<Option<(&'a str, &'a str)>, FrontMatterError> {
    let Some(first_newline) = content.find('\n') else {
        if content.trim_end_matches('\r') == "---" {
            return Err(FrontMatterError::Unterminated {
                path: path.to_path_buf(),
            });
        }
        return Ok(None);
    };

    if content[..first_newline].trim_end_matches('\r') != "---" {
        return Ok(None);
    }

    let rest = &content[first_newline + 1..];
    let mut cursor = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches('\n').trim_end_matches('\r') == "---" {
            let raw = &rest[..cursor];
            let body = &rest[cursor + line.len()..];
            return Ok(Some((raw, body)));
        }
        cursor += line.len();
    }

    Err(FrontMatterError::Unterminated {
        path: path.to_path_buf(),
    })
}

/// Parses a document's front matter into the raw mapping and the typed
/// metadata, returning the body alongside. A document without a front matter
/// block gets defaults and its full content as body.
pub fn parse_front_matter<'a>(
    content: &'a str,
    path: &Path,
) -> Result<(RawFrontMatter, PageMetadata, &'a str), FrontMatterError> {
    let Some((raw, body)) = split_front_matter(content, path)? else {
        return Ok((RawFrontMatter::default(), PageMetadata::default(), content));
    };

    if raw.trim().is_empty() {
        return Ok((RawFrontMatter::default(), PageMetadata::default(), body));
    }

    let value: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|source| FrontMatterError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

    let serde_yaml::Value::Mapping(mapping) = value else {
        return Err(FrontMatterError::NotAMapping {
            path: path.to_path_buf(),
        });
    };

    let mut fields = RawFrontMatter::default();
    for (key, value) in mapping {
        let serde_yaml::Value::String(key) = key else {
            return Err(FrontMatterError::NotAMapping {
                path: path.to_path_buf(),
            });
        };
        fields.insert(key, value);
    }

    let metadata: PageMetadata = serde_yaml::from_str(raw).map_err(|source| {
        FrontMatterError::Invalid {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok((fields, metadata, body))
}
