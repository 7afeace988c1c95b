//! Routes and the route table.
//!
//! A [`Route`] is a transformed page bound to its canonical URL. The
//! [`RouteTable`] owns every route of a build in a stable order and is the
//! single source of truth for the emitter and the sitemap.
use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::build::options::BuildConfig;
use crate::content::{DocumentFormat, PageMetadata, RawFrontMatter, TransformedPage};
use crate::errors::{RouteCollision, RouteCollisionError};
use crate::routing::{join_permalink, normalize_base_path, url_path_from_rel_path};

#[derive(Debug, Clone)]
pub struct Route {
    /// Site-relative URL path: `/` for the root, otherwise `/a/b` with no
    /// trailing slash.
    pub url_path: String,
    /// Absolute URL, origin and base path included.
    pub permalink: String,
    /// Where the artifact lands, relative to the output root.
    pub output_rel_path: PathBuf,
    pub source_path: PathBuf,
    pub format: DocumentFormat,
    pub metadata: PageMetadata,
    pub fields: RawFrontMatter,
    pub body: String,
}

/// Maps a URL path to its output file, following the `index.html` convention:
/// `/` becomes `index.html` and `/about` becomes `about/index.html`.
pub(crate) fn output_rel_path(url_path: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in url_path.split('/').filter(|segment| !segment.is_empty()) {
        path.push(segment);
    }
    path.push("index.html");
    path
}

/// Every route of a build, in document scan order. Read-only once built.
pub struct RouteTable {
    routes: Vec<Route>,
    by_url: FxHashMap<String, usize>,
}

impl RouteTable {
    /// Derives a URL for every page and indexes the result.
    ///
    /// Drafts are dropped here (unless the build includes them), before
    /// collision detection, so an excluded draft can never contest a URL.
    /// When two or more pages derive the same URL path the whole build fails,
    /// naming every offender; nothing is ever silently overwritten.
    pub fn build(
        pages: Vec<TransformedPage>,
        config: &BuildConfig,
    ) -> Result<RouteTable, RouteCollisionError> {
        let base_path = normalize_base_path(&config.base_path);

        let mut routes: Vec<Route> = Vec::new();
        let mut by_url: FxHashMap<String, usize> = FxHashMap::default();
        let mut collisions: Vec<RouteCollision> = Vec::new();
        let mut collision_index: FxHashMap<String, usize> = FxHashMap::default();

        for page in pages {
            if page.metadata.draft && !config.include_drafts {
                continue;
            }

            let url_path = url_path_from_rel_path(&page.rel_path, config.slugify);

            if let Some(&existing) = by_url.get(&url_path) {
                match collision_index.get(&url_path) {
                    Some(&index) => collisions[index].sources.push(page.source_path),
                    None => {
                        collision_index.insert(url_path.clone(), collisions.len());
                        collisions.push(RouteCollision {
                            url_path: url_path.clone(),
                            sources: vec![
                                routes[existing].source_path.clone(),
                                page.source_path,
                            ],
                        });
                    }
                }
                continue;
            }

            let permalink = join_permalink(&config.site_origin, &base_path, &url_path);
            let output_rel_path = output_rel_path(&url_path);

            by_url.insert(url_path.clone(), routes.len());
            routes.push(Route {
                url_path,
                permalink,
                output_rel_path,
                source_path: page.source_path,
                format: page.format,
                metadata: page.metadata,
                fields: page.fields,
                body: page.body,
            });
        }

        if !collisions.is_empty() {
            return Err(RouteCollisionError { collisions });
        }

        Ok(RouteTable { routes, by_url })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn get(&self, url_path: &str) -> Option<&Route> {
        self.by_url.get(url_path).map(|&index| &self.routes[index])
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
