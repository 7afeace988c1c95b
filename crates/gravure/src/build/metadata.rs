use std::{path::PathBuf, process::Termination, time::Instant};

/// Metadata returned by [`etch()`](crate::etch) for a single page after a successful build.
#[derive(Debug)]
pub struct PageOutput {
    pub route: String,
    pub file_path: String,
    pub source_path: String,
}

/// Metadata returned by [`etch()`](crate::etch) for a single static asset after a successful build.
///
/// A static asset is a file that is copied to the output directory without any processing.
#[derive(Debug)]
pub struct StaticAssetOutput {
    pub file_path: String,
    pub original_path: String,
}

/// Metadata returned by [`etch()`](crate::etch) after a successful build.
#[derive(Debug)]
pub struct BuildOutput {
    pub start_time: Instant,
    pub pages: Vec<PageOutput>,
    pub static_files: Vec<StaticAssetOutput>,
    pub sitemaps: Vec<PathBuf>,
}

impl BuildOutput {
    pub fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            pages: Vec::new(),
            static_files: Vec::new(),
            sitemaps: Vec::new(),
        }
    }

    pub(crate) fn add_page(&mut self, route: String, file_path: String, source_path: String) {
        self.pages.push(PageOutput {
            route,
            file_path,
            source_path,
        });
    }

    pub(crate) fn add_static_file(&mut self, file_path: String, original_path: String) {
        self.static_files.push(StaticAssetOutput {
            file_path,
            original_path,
        });
    }

    pub(crate) fn add_sitemap(&mut self, file_path: PathBuf) {
        self.sitemaps.push(file_path);
    }
}

impl Default for BuildOutput {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Termination for BuildOutput {
    fn report(self) -> std::process::ExitCode {
        0.into()
    }
}
