use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use colored::{ColoredString, Colorize};
use log::info;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use rayon::prelude::*;

use crate::GENERATOR;
use crate::build::metadata::BuildOutput;
use crate::build::options::BuildConfig;
use crate::content::DocumentFormat;
use crate::errors::WriteError;
use crate::logging::{FormatElapsedTimeOptions, format_elapsed_time};
use crate::route::{Route, RouteTable};

/// Removes the output directory so stale files from a previous build don't
/// linger next to the new ones.
pub(crate) fn clean_output_dir(output_root: &Path) -> Result<(), WriteError> {
    if !output_root.exists() {
        return Ok(());
    }

    fs::remove_dir_all(output_root).map_err(|source| WriteError::CleanOutputDir {
        path: output_root.to_path_buf(),
        source,
    })
}

/// Writes every route to its output file. Failed writes are collected and
/// returned, they never stop the other routes from being written.
pub(crate) fn emit_routes(
    table: &RouteTable,
    config: &BuildConfig,
    output: &mut BuildOutput,
) -> Vec<WriteError> {
    let route_format_options = FormatElapsedTimeOptions {
        additional_fn: Some(&|msg: ColoredString| {
            let formatted_msg = format!("(+{})", msg);
            if msg.fgcolor().is_none() {
                formatted_msg.dimmed()
            } else {
                formatted_msg.into()
            }
        }),
        ..Default::default()
    };

    let results: Vec<Result<(String, String, String), WriteError>> = table
        .routes()
        .par_iter()
        .map(|route| {
            let route_start = Instant::now();
            let file_path = config.output_root.join(&route.output_rel_path);

            let page_error = |source: io::Error| WriteError::Page {
                route: route.url_path.clone(),
                path: file_path.clone(),
                source,
            };

            let content = finish_page(route).map_err(page_error)?;
            write_page_file(&content, &file_path).map_err(page_error)?;

            info!(
                target: "pages",
                "{} -> {} {}",
                route.url_path,
                file_path.to_string_lossy().dimmed(),
                format_elapsed_time(route_start.elapsed(), &route_format_options)
            );

            Ok((
                route.url_path.clone(),
                file_path.to_string_lossy().to_string(),
                route.source_path.to_string_lossy().to_string(),
            ))
        })
        .collect();

    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok((route, file_path, source_path)) => output.add_page(route, file_path, source_path),
            Err(error) => failures.push(error),
        }
    }

    failures
}

/// Turns a route's rendered body into the final HTML document.
///
/// Markdown and MDX bodies are fragments and get wrapped in a document
/// shell. Static documents already are full documents and only get the
/// canonical link and generator tag appended to their `<head>`.
pub(crate) fn finish_page(route: &Route) -> Result<String, io::Error> {
    match route.format {
        DocumentFormat::Markdown | DocumentFormat::Mdx => Ok(page_shell(route)),
        DocumentFormat::Static => inject_head(&route.body, &head_additions(route)),
    }
}

fn page_shell(route: &Route) -> String {
    let robots = if route.metadata.noindex {
        "<meta name=\"robots\" content=\"noindex\">\n"
    } else {
        ""
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n{}{}</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(&page_title(route)),
        head_additions(route),
        robots,
        route.body,
    )
}

fn head_additions(route: &Route) -> String {
    format!(
        "<meta name=\"generator\" content=\"{}\">\n<link rel=\"canonical\" href=\"{}\">\n",
        GENERATOR,
        escape_html(&route.permalink)
    )
}

fn page_title(route: &Route) -> String {
    match &route.metadata.title {
        Some(title) => title.clone(),
        None => route
            .source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn inject_head(html: &str, additions: &str) -> Result<String, io::Error> {
    let element_content_handlers = vec![element!("head", |el| {
        el.append(additions, lol_html::html_content::ContentType::Html);
        Ok(())
    })];

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(io::Error::other)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_page_file(content: &str, file_path: &Path) -> Result<(), io::Error> {
    // Create the parent directories if it doesn't exist
    if let Some(parent_dir) = file_path.parent() {
        fs::create_dir_all(parent_dir)?
    }

    fs::write(file_path, content)
}

/// Copies the static directory into the output directory, recording every
/// copied file. Failures are collected like page write failures.
pub(crate) fn copy_static_files(config: &BuildConfig, output: &mut BuildOutput) -> Vec<WriteError> {
    if !config.static_dir.exists() {
        return Vec::new();
    }

    let mut failures = Vec::new();
    copy_recursively(
        &config.static_dir,
        &config.output_root,
        output,
        &mut failures,
    );
    failures
}

fn copy_recursively(
    source: &Path,
    destination: &Path,
    output: &mut BuildOutput,
    failures: &mut Vec<WriteError>,
) {
    if let Err(error) = fs::create_dir_all(destination) {
        failures.push(WriteError::StaticAsset {
            path: destination.to_path_buf(),
            source: error,
        });
        return;
    }

    let entries = match fs::read_dir(source) {
        Ok(entries) => entries,
        Err(error) => {
            failures.push(WriteError::StaticAsset {
                path: source.to_path_buf(),
                source: error,
            });
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                failures.push(WriteError::StaticAsset {
                    path: source.to_path_buf(),
                    source: error,
                });
                continue;
            }
        };

        let dest_path = destination.join(entry.file_name());

        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => {
                copy_recursively(&entry.path(), &dest_path, output, failures);
            }
            Ok(_) => match fs::copy(entry.path(), &dest_path) {
                Ok(_) => output.add_static_file(
                    dest_path.to_string_lossy().to_string(),
                    entry.path().to_string_lossy().to_string(),
                ),
                Err(error) => failures.push(WriteError::StaticAsset {
                    path: dest_path,
                    source: error,
                }),
            },
            Err(error) => failures.push(WriteError::StaticAsset {
                path: entry.path(),
                source: error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{PageMetadata, RawFrontMatter, TransformedPage};
    use std::path::PathBuf;
    use std::time::Instant;

    fn page(rel_path: &str, body: &str) -> TransformedPage {
        TransformedPage {
            source_path: Path::new("content").join(rel_path),
            rel_path: PathBuf::from(rel_path),
            format: DocumentFormat::Markdown,
            metadata: PageMetadata::default(),
            fields: RawFrontMatter::default(),
            body: body.to_string(),
        }
    }

    fn config_for(dir: &Path) -> BuildConfig {
        BuildConfig {
            output_root: dir.join("dist"),
            static_dir: dir.join("static"),
            ..BuildConfig::new("https://example.com")
        }
    }

    #[test]
    fn emits_one_file_per_route() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let table = RouteTable::build(
            vec![page("index.md", "<h1>Home</h1>\n"), page("about.md", "<p>Hi</p>\n")],
            &config,
        )
        .unwrap();

        let mut output = BuildOutput::new(Instant::now());
        let failures = emit_routes(&table, &config, &mut output);

        assert!(failures.is_empty());
        assert_eq!(output.pages.len(), 2);

        let home = std::fs::read_to_string(config.output_root.join("index.html")).unwrap();
        assert!(home.contains("<h1>Home</h1>"));
        assert!(home.contains("<link rel=\"canonical\" href=\"https://example.com/\">"));
        assert!(home.contains(&format!("<meta name=\"generator\" content=\"{}\">", GENERATOR)));

        let about =
            std::fs::read_to_string(config.output_root.join("about").join("index.html")).unwrap();
        assert!(about.contains("<p>Hi</p>"));
        assert!(about.contains("href=\"https://example.com/about\""));
    }

    #[test]
    fn failed_write_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let table = RouteTable::build(
            vec![page("index.md", "home"), page("about.md", "about")],
            &config,
        )
        .unwrap();

        // A file where the `about` directory has to go makes that single
        // write fail, even when running as root.
        std::fs::create_dir_all(&config.output_root).unwrap();
        std::fs::write(config.output_root.join("about"), "in the way").unwrap();

        let mut output = BuildOutput::new(Instant::now());
        let failures = emit_routes(&table, &config, &mut output);

        assert_eq!(failures.len(), 1);
        match &failures[0] {
            WriteError::Page { route, .. } => assert_eq!(route, "/about"),
            other => panic!("unexpected error: {}", other),
        }

        assert_eq!(output.pages.len(), 1);
        assert!(config.output_root.join("index.html").exists());
    }

    #[test]
    fn markdown_shell_uses_title_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let mut home = page("index.md", "<h1>Home</h1>\n");
        home.metadata.title = Some("Welcome & more".to_string());
        let table = RouteTable::build(vec![home], &config).unwrap();

        let html = finish_page(&table.routes()[0]).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Welcome &amp; more</title>"));
    }

    #[test]
    fn markdown_shell_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let table = RouteTable::build(vec![page("notes/setup.md", "body")], &config).unwrap();

        let html = finish_page(&table.routes()[0]).unwrap();
        assert!(html.contains("<title>setup</title>"));
    }

    #[test]
    fn noindex_page_gets_a_robots_tag() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let mut hidden = page("hidden.md", "body");
        hidden.metadata.noindex = true;
        let table = RouteTable::build(vec![hidden], &config).unwrap();

        let html = finish_page(&table.routes()[0]).unwrap();
        assert!(html.contains("<meta name=\"robots\" content=\"noindex\">"));
    }

    #[test]
    fn static_document_keeps_its_markup_and_gains_head_tags() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let mut legacy = page("legacy.md", "");
        legacy.format = DocumentFormat::Static;
        legacy.body =
            "<!DOCTYPE html><html><head><title>Old</title></head><body>kept</body></html>"
                .to_string();
        let table = RouteTable::build(vec![legacy], &config).unwrap();

        let html = finish_page(&table.routes()[0]).unwrap();
        assert!(html.contains("<title>Old</title>"));
        assert!(html.contains("kept"));
        assert!(html.contains("<link rel=\"canonical\" href=\"https://example.com/legacy\">"));
        assert!(html.contains(&format!("content=\"{}\"", GENERATOR)));
        // The additions land inside the existing head.
        let head_end = html.find("</head>").unwrap();
        assert!(html.find("rel=\"canonical\"").unwrap() < head_end);
    }

    #[test]
    fn clean_output_dir_removes_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let output_root = dir.path().join("dist");
        std::fs::create_dir_all(output_root.join("old")).unwrap();
        std::fs::write(output_root.join("old").join("stale.html"), "stale").unwrap();

        clean_output_dir(&output_root).unwrap();
        assert!(!output_root.exists());

        // A missing output directory is fine.
        clean_output_dir(&output_root).unwrap();
    }

    #[test]
    fn copies_the_static_directory_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        std::fs::create_dir_all(config.static_dir.join("css")).unwrap();
        std::fs::write(config.static_dir.join("robots.txt"), "User-agent: *").unwrap();
        std::fs::write(config.static_dir.join("css").join("site.css"), "body{}").unwrap();

        let mut output = BuildOutput::new(Instant::now());
        let failures = copy_static_files(&config, &mut output);

        assert!(failures.is_empty());
        assert_eq!(output.static_files.len(), 2);
        assert!(config.output_root.join("robots.txt").exists());
        assert!(config.output_root.join("css").join("site.css").exists());
    }

    #[test]
    fn missing_static_directory_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        let mut output = BuildOutput::new(Instant::now());
        let failures = copy_static_files(&config, &mut output);

        assert!(failures.is_empty());
        assert!(output.static_files.is_empty());
    }
}
