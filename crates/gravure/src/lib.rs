#![doc = include_str!("../README.md")]

// Modules the end-user will interact directly or indirectly with
pub mod content;
pub mod errors;
pub mod route;
pub mod sitemap;

mod routing;

// Exports for end-users
pub use build::metadata::{BuildOutput, PageOutput, StaticAssetOutput};
pub use build::options::BuildConfig;
pub use content::RendererRegistry;
pub use errors::PipelineError;
pub use sitemap::{Finalizer, Finalizers, SitemapOptions};

mod build;
mod emit;

// Internal modules
mod logging;

use build::execute_build;
use logging::init_logging;

/// The version of Gravure being used.
///
/// Can be used to create a generator tag in the output HTML.
///
/// ## Example
/// ```rust
/// use gravure::GENERATOR;
///
/// format!("<meta name=\"generator\" content=\"{}\">", GENERATOR);
/// ```
pub const GENERATOR: &str = concat!("Gravure v", env!("CARGO_PKG_VERSION"));

/// 🪶 Gravure entrypoint. Builds the site and generates the output files.
///
/// ## Example
/// Should be called from the main function of the binary crate.
/// ```rust,no_run
/// use gravure::{etch, BuildConfig, BuildOutput, Finalizers, PipelineError, RendererRegistry};
///
/// fn main() -> Result<BuildOutput, PipelineError> {
///   etch(
///     RendererRegistry::default(),
///     Finalizers::default(),
///     BuildConfig::new("https://example.com"),
///   )
/// }
/// ```
pub fn etch(
    renderers: RendererRegistry,
    finalizers: Finalizers,
    config: BuildConfig,
) -> Result<BuildOutput, PipelineError> {
    init_logging();

    execute_build(&renderers, &finalizers, &config)
}
