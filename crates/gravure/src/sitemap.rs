use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::build::options::BuildConfig;
use crate::errors::WriteError;
use crate::route::RouteTable;
use crate::routing::normalize_base_path;

/// Consumes the completed route table after every artifact is on disk and
/// emits something derived from it. The sitemap generator is the built-in
/// implementation; swapping [`Finalizers`] replaces or extends it.
pub trait Finalizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns the paths of the files written, relative to nothing in
    /// particular; they are reported in the build output as-is.
    fn finalize(&self, table: &RouteTable, config: &BuildConfig)
    -> Result<Vec<PathBuf>, WriteError>;
}

/// The finalizers a build runs once emission is complete, in order.
pub struct Finalizers(pub Vec<Box<dyn Finalizer>>);

impl Finalizers {
    /// No finalizers at all, not even the sitemap.
    pub fn none() -> Self {
        Self(Vec::new())
    }
}

impl Default for Finalizers {
    fn default() -> Self {
        Self(vec![Box::new(SitemapGenerator)])
    }
}

/// Options for sitemap generation.
#[derive(Debug, Clone)]
pub struct SitemapOptions {
    /// Whether to generate a sitemap. Default: `true`
    pub enabled: bool,
    /// The filename for the sitemap index. Default: `"sitemap.xml"`
    ///
    /// If multiple sitemaps are needed, individual sitemap files will be named `sitemap-1.xml`, `sitemap-2.xml`, etc.
    pub filename: String,
    /// Maximum number of URLs per sitemap file. Default: `10000`
    ///
    /// Note that search engines will often ignore sitemaps with more than 50,000 URLs,
    /// so it's recommended to keep this value at or below that limit.
    pub max_urls_per_sitemap: usize,
    /// Default change frequency for pages. Default: `None`
    ///
    /// Note that changefreq is often ignored by search engines nowadays.
    pub default_changefreq: Option<ChangeFreq>,
    /// Default priority for pages. Default: `None`
    ///
    /// Note that priority is often ignored by search engines nowadays.
    pub default_priority: Option<f32>,
    /// Optional XSL stylesheet URL for styling the sitemap. Default: `None`
    ///
    /// If the value starts with `http(s)://` it will be used as-is (ex: your stylesheet might be coming from a CDN).
    ///
    /// Otherwise, the path is appended to the site URL. For example, `/sitemap.xsl` with origin
    /// `https://example.com` becomes `https://example.com/sitemap.xsl`.
    pub stylesheet: Option<String>,
}

impl Default for SitemapOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            filename: "sitemap.xml".to_string(),
            max_urls_per_sitemap: 10000,
            default_changefreq: None,
            default_priority: None,
            stylesheet: None,
        }
    }
}

/// Change frequency values for sitemap entries.
///
/// See: https://www.sitemaps.org/protocol.html#changefreqdef for more details.
/// This property is often ignored by search engines nowadays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    fn as_str(&self) -> &str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

/// Represents a single URL entry in the sitemap.
#[derive(Debug)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: Option<ChangeFreq>,
    pub priority: Option<f32>,
}

impl SitemapEntry {
    fn to_xml(&self) -> String {
        let mut xml = String::from("<url>");
        xml.push_str(&format!("<loc>{}</loc>", escape_xml(&self.loc)));

        if let Some(ref lastmod) = self.lastmod {
            xml.push_str(&format!("<lastmod>{}</lastmod>", lastmod));
        }

        if let Some(changefreq) = self.changefreq {
            xml.push_str(&format!("<changefreq>{}</changefreq>", changefreq.as_str()));
        }

        if let Some(priority) = self.priority {
            xml.push_str(&format!("<priority>{:.1}</priority>", priority));
        }

        xml.push_str("</url>");
        xml
    }
}

/// Represents a sitemap file reference in a sitemap index.
#[derive(Debug)]
struct SitemapReference {
    loc: String,
}

impl SitemapReference {
    fn to_xml(&self) -> String {
        format!("<sitemap><loc>{}</loc></sitemap>", escape_xml(&self.loc))
    }
}

/// The built-in [`Finalizer`]: one sitemap entry per indexable route, in
/// route table order.
pub struct SitemapGenerator;

impl Finalizer for SitemapGenerator {
    fn name(&self) -> &str {
        "sitemap"
    }

    fn finalize(
        &self,
        table: &RouteTable,
        config: &BuildConfig,
    ) -> Result<Vec<PathBuf>, WriteError> {
        let site_url = format!(
            "{}{}",
            config.site_origin.trim_end_matches('/'),
            normalize_base_path(&config.base_path)
        );

        generate_sitemap(
            entries_for_routes(table, &config.sitemap),
            &site_url,
            &config.output_root,
            &config.sitemap,
        )
    }
}

/// Builds the sitemap entries for a route table. Routes marked `noindex` are
/// left out; everything else keeps the table's order.
pub fn entries_for_routes(table: &RouteTable, options: &SitemapOptions) -> Vec<SitemapEntry> {
    table
        .iter()
        .filter(|route| !route.metadata.noindex)
        .map(|route| SitemapEntry {
            loc: route.permalink.clone(),
            lastmod: route
                .metadata
                .date
                .map(|date| date.format("%Y-%m-%d").to_string()),
            changefreq: options.default_changefreq,
            priority: options.default_priority,
        })
        .collect()
}

/// Escapes XML special characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Resolves a stylesheet path to a full URL.
/// If the path starts with http:// or https://, it's used as-is.
/// Otherwise, it's appended to the site URL.
fn resolve_stylesheet_url(site_url: &str, stylesheet_path: &str) -> String {
    if stylesheet_path.starts_with("http://") || stylesheet_path.starts_with("https://") {
        stylesheet_path.to_string()
    } else {
        format!("{}{}", site_url.trim_end_matches('/'), stylesheet_path)
    }
}

/// Writes the sitemap files for the given entries and returns their paths.
///
/// Entries are written in the order given. Builds over
/// `max_urls_per_sitemap` entries get chunked `sitemap-N.xml` files plus an
/// index at the configured filename.
pub fn generate_sitemap(
    entries: Vec<SitemapEntry>,
    site_url: &str,
    output_dir: &Path,
    options: &SitemapOptions,
) -> Result<Vec<PathBuf>, WriteError> {
    if !options.enabled || entries.is_empty() {
        return Ok(Vec::new());
    }

    let total_entries = entries.len();

    if total_entries <= options.max_urls_per_sitemap {
        let path = generate_single_sitemap(
            &entries,
            output_dir,
            &options.filename,
            site_url,
            options.stylesheet.as_deref(),
        )?;

        log::info!(
            target: "sitemap",
            "Generated sitemap with {} URLs at {}",
            total_entries,
            path.display()
        );

        return Ok(vec![path]);
    }

    let chunks: Vec<&[SitemapEntry]> = entries.chunks(options.max_urls_per_sitemap).collect();

    let num_sitemaps = chunks.len();
    let mut written = Vec::new();
    let mut sitemap_refs = Vec::new();

    for (i, chunk) in chunks.iter().enumerate() {
        let sitemap_filename = format!("sitemap-{}.xml", i + 1);

        written.push(generate_single_sitemap(
            chunk,
            output_dir,
            &sitemap_filename,
            site_url,
            options.stylesheet.as_deref(),
        )?);

        sitemap_refs.push(SitemapReference {
            loc: format!("{}/{}", site_url.trim_end_matches('/'), sitemap_filename),
        });
    }

    written.push(generate_sitemap_index(
        &sitemap_refs,
        output_dir,
        &options.filename,
        site_url,
        options.stylesheet.as_deref(),
    )?);

    log::info!(
        target: "sitemap",
        "Generated sitemap index with {} sitemaps ({} total URLs) at {}",
        num_sitemaps,
        total_entries,
        output_dir.join(&options.filename).display()
    );

    Ok(written)
}

/// Generates a single sitemap file.
fn generate_single_sitemap(
    entries: &[SitemapEntry],
    output_dir: &Path,
    filename: &str,
    site_url: &str,
    stylesheet: Option<&str>,
) -> Result<PathBuf, WriteError> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    if let Some(stylesheet_path) = stylesheet {
        let stylesheet_url = resolve_stylesheet_url(site_url, stylesheet_path);
        xml.push_str(&format!(
            "<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>\n",
            escape_xml(&stylesheet_url)
        ));
    }

    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">");

    for entry in entries {
        xml.push_str(&entry.to_xml());
    }

    xml.push_str("</urlset>");

    let sitemap_path = output_dir.join(filename);
    write_sitemap_file(&sitemap_path, &xml)?;

    Ok(sitemap_path)
}

/// Generates a sitemap index file.
fn generate_sitemap_index(
    sitemaps: &[SitemapReference],
    output_dir: &Path,
    filename: &str,
    site_url: &str,
    stylesheet: Option<&str>,
) -> Result<PathBuf, WriteError> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    if let Some(stylesheet_path) = stylesheet {
        let stylesheet_url = resolve_stylesheet_url(site_url, stylesheet_path);
        xml.push_str(&format!(
            "<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>\n",
            escape_xml(&stylesheet_url)
        ));
    }

    xml.push_str("<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">");

    for sitemap in sitemaps {
        xml.push_str(&sitemap.to_xml());
    }

    xml.push_str("</sitemapindex>");

    let index_path = output_dir.join(filename);
    write_sitemap_file(&index_path, &xml)?;

    Ok(index_path)
}

fn write_sitemap_file(path: &Path, xml: &str) -> Result<(), WriteError> {
    let mut file = fs::File::create(path).map_err(|source| WriteError::Sitemap {
        path: path.to_path_buf(),
        source,
    })?;

    file.write_all(xml.as_bytes())
        .map_err(|source| WriteError::Sitemap {
            path: path.to_path_buf(),
            source,
        })
}
