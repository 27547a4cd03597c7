//! Core extraction orchestration.
//!
//! - **Entry points**: [`Extractor`] for blocking calls, [`extractor`] for async and batch calls
//! - **Routing**: extension-based dispatch to the format parsers
//! - **Fallback**: ordered strategy chains shared by the PDF, `.msg` and attachment paths
//! - **Pool**: bounded, index-ordered page workers with a join deadline
//! - **Capabilities**: external tools and compiled-in formats, resolved once
//! - **Configuration**: loading and discovery of `postfach.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use postfach::core::config::ExtractorConfig;
//! use postfach::Extractor;
//!
//! # fn example() -> postfach::Result<()> {
//! let extractor = Extractor::new(ExtractorConfig::default());
//! let result = extractor.extract_path("export.pdf")?;
//! println!("{} emails", result.email_count());
//! # Ok(())
//! # }
//! ```

pub mod capabilities;
pub mod config;
#[cfg(feature = "tokio-runtime")]
pub mod extractor;
pub mod fallback;
pub mod io;
pub mod pipeline;
pub mod pool;
pub mod router;

pub use capabilities::{Capabilities, StaticToolDiscovery, SystemToolDiscovery, ToolDiscovery};
pub use config::{AttachmentConfig, ExtractorConfig, OcrConfig};
pub use fallback::{ChainRun, FallbackChain, Strategy};
pub use pipeline::Extractor;
pub use pool::{TaskOutcome, WorkerPool};
pub use router::FormatRouter;
