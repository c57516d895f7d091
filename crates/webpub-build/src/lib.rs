//! Workspace cleanup, bundler invocation, and template relocation for webpub.
//!
//! # Compile pipeline
//!
//! ```text
//! webpub compile
//!   1. Resolve    ── NODE_ENV → Environment, load webpack.config.<env>.json
//!   2. Clean      ── remove view directory and build output
//!   3. Manifest   ── prefix process.json app names with the package name
//!   4. Build      ── Bundler::compile() → BuildStats
//!   5. Templates  ── move build/**/*.html → view directory
//!   6. Publish    ── static asset upload (test / production only)
//! ```
//!
//! Stages 2, 4 and 5 live in this crate; the manifest rewrite is in
//! `webpub-core` and publishing in `webpub-deploy`.

pub mod bundler;
pub mod clean;
pub mod invoke;
pub mod stats;
pub mod templates;

pub use bundler::{Bundler, BundlerError, CommandBundler};
pub use clean::{CleanError, clean_workspace};
pub use invoke::{BuildError, BuildInvoker, BuildSummary, format_seconds};
pub use stats::{AssetInfo, BuildStats, ReportOptions, StatsMessage};
pub use templates::{RelocateError, TemplateRelocator};
