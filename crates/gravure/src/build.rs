use std::time::Instant;

use colored::Colorize;
use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::build::metadata::BuildOutput;
use crate::build::options::BuildConfig;
use crate::content::{RendererRegistry, TransformedPage, scan_documents, transform_document};
use crate::emit::{clean_output_dir, copy_static_files, emit_routes};
use crate::errors::{BuildFailure, DocumentError, PipelineError, WriteError};
use crate::logging::{FormatElapsedTimeOptions, format_elapsed_time, print_title};
use crate::route::RouteTable;
use crate::sitemap::Finalizers;

pub mod metadata;
pub mod options;

/// The phase a build is currently in. A build moves through the phases in
/// order and only ever leaves the track by entering `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuildStage {
    Idle,
    Scanning,
    Transforming,
    RouteBuilding,
    Emitting,
    SitemapGenerating,
    Done,
    Failed,
}

impl BuildStage {
    fn title(&self) -> Option<&'static str> {
        match self {
            BuildStage::Scanning => Some("scanning content"),
            BuildStage::Transforming => Some("transforming documents"),
            BuildStage::RouteBuilding => Some("building routes"),
            BuildStage::Emitting => Some("generating pages"),
            BuildStage::SitemapGenerating => Some("finalizing"),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildStage::Idle => "idle",
            BuildStage::Scanning => "scanning",
            BuildStage::Transforming => "transforming",
            BuildStage::RouteBuilding => "route building",
            BuildStage::Emitting => "emitting",
            BuildStage::SitemapGenerating => "sitemap generation",
            BuildStage::Done => "done",
            BuildStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn transition(stage: &mut BuildStage, next: BuildStage) {
    debug!(target: "build", "{} -> {}", stage, next);
    *stage = next;

    if let Some(title) = next.title() {
        print_title(title);
    }
}

fn log_errors(documents: &[DocumentError], writes: &[WriteError]) {
    for error in documents {
        error!(target: "build", "{}", error);
    }
    for error in writes {
        error!(target: "build", "{}", error);
    }
}

pub(crate) fn execute_build(
    renderers: &RendererRegistry,
    finalizers: &Finalizers,
    config: &BuildConfig,
) -> Result<BuildOutput, PipelineError> {
    config.validate()?;

    let build_start = Instant::now();
    let mut output = BuildOutput::new(build_start);
    let mut stage = BuildStage::Idle;

    let section_format_options = FormatElapsedTimeOptions {
        sec_red_threshold: 5,
        sec_yellow_threshold: 1,
        millis_red_threshold: None,
        millis_yellow_threshold: None,
        ..Default::default()
    };

    info!(target: "build", "Output directory: {}", config.output_root.display());

    if config.clean_output_dir {
        if let Err(error) = clean_output_dir(&config.output_root) {
            transition(&mut stage, BuildStage::Failed);
            return Err(BuildFailure {
                documents: Vec::new(),
                writes: vec![error],
            }
            .into());
        }
    }

    // Scanning. Anything wrong with the content tree itself is fatal, there
    // is no point in building half a site off an unreadable tree.
    transition(&mut stage, BuildStage::Scanning);
    let scan_start = Instant::now();

    let scan = match scan_documents(&config.content_root) {
        Ok(scan) => scan,
        Err(error) => {
            transition(&mut stage, BuildStage::Failed);
            return Err(error.into());
        }
    };

    let mut documents = Vec::new();
    for document in scan {
        match document {
            Ok(document) => documents.push(document),
            Err(error) => {
                transition(&mut stage, BuildStage::Failed);
                return Err(error.into());
            }
        }
    }

    // Scan order depends on the filesystem, the pipeline does not.
    documents.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    if documents.is_empty() {
        warn!(
            target: "build",
            "No documents found in {}",
            config.content_root.display()
        );
    }

    info!(
        target: "content",
        "{}",
        format!(
            "Discovered {} documents in {}",
            documents.len(),
            format_elapsed_time(scan_start.elapsed(), &FormatElapsedTimeOptions::default())
        )
        .bold()
    );

    // Transforming. Each document is independent of the others, so a broken
    // one is recorded and skipped rather than taking the build down with it.
    transition(&mut stage, BuildStage::Transforming);
    let transform_start = Instant::now();

    let results: Vec<Result<TransformedPage, DocumentError>> = documents
        .par_iter()
        .map(|document| transform_document(document, renderers))
        .collect();

    let mut pages = Vec::new();
    let mut document_errors = Vec::new();
    for result in results {
        match result {
            Ok(page) => pages.push(page),
            Err(error) => document_errors.push(error),
        }
    }

    pages.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    info!(
        target: "content",
        "{}",
        format!(
            "Transformed {} documents in {}",
            pages.len(),
            format_elapsed_time(transform_start.elapsed(), &FormatElapsedTimeOptions::default())
        )
        .bold()
    );

    if config.strict && !document_errors.is_empty() {
        log_errors(&document_errors, &[]);
        transition(&mut stage, BuildStage::Failed);
        return Err(BuildFailure {
            documents: document_errors,
            writes: Vec::new(),
        }
        .into());
    }

    // Route building. A collision means two documents want the same output
    // file, which no ordering of writes can make right.
    transition(&mut stage, BuildStage::RouteBuilding);

    let table = match RouteTable::build(pages, config) {
        Ok(table) => table,
        Err(collision) => {
            log_errors(&document_errors, &[]);
            transition(&mut stage, BuildStage::Failed);
            return Err(collision.into());
        }
    };

    info!(target: "build", "Built {} routes", table.len());

    // Emitting.
    transition(&mut stage, BuildStage::Emitting);
    let emit_start = Instant::now();

    let mut write_errors = emit_routes(&table, config, &mut output);
    write_errors.extend(copy_static_files(config, &mut output));

    info!(
        target: "pages",
        "{}",
        format!(
            "Generated {} pages in {}",
            output.pages.len(),
            format_elapsed_time(emit_start.elapsed(), &section_format_options)
        )
        .bold()
    );

    // Finalizing. Every write above has completed or failed by now, so the
    // finalizers see the site exactly as it landed on disk.
    transition(&mut stage, BuildStage::SitemapGenerating);

    for finalizer in &finalizers.0 {
        let finalize_start = Instant::now();

        match finalizer.finalize(&table, config) {
            Ok(paths) => {
                for path in paths {
                    output.add_sitemap(path);
                }

                info!(
                    target: "build",
                    "{} finished in {}",
                    finalizer.name(),
                    format_elapsed_time(finalize_start.elapsed(), &FormatElapsedTimeOptions::default())
                );
            }
            Err(error) => write_errors.push(error),
        }
    }

    info!(target: "SKIP_FORMAT", "{}", "");

    if document_errors.is_empty() && write_errors.is_empty() {
        transition(&mut stage, BuildStage::Done);
        info!(
            target: "build",
            "{}",
            format!(
                "Build completed in {}",
                format_elapsed_time(build_start.elapsed(), &section_format_options)
            )
            .bold()
        );

        Ok(output)
    } else {
        log_errors(&document_errors, &write_errors);
        transition(&mut stage, BuildStage::Failed);

        Err(BuildFailure {
            documents: document_errors,
            writes: write_errors,
        }
        .into())
    }
}
