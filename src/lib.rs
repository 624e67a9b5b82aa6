//! Library crate for `sentry-event-exporter`.
//!
//! Streams issues (and optionally their events) from a Sentry-compatible
//! service into a flat tabular format, one page at a time. The pieces:
//!
//! - [`model`] - remote domain objects and the flat export record
//! - [`render`] - the renderer lifecycle contract and the CSV renderer
//! - [`client`] - the paginated API collaborator and its HTTP implementation
//! - [`export`] - the pipeline driving pages through the renderer
//! - [`cli`] - argument surface and search-query assembly

pub mod cli;
pub mod client;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod render;

pub use error::{ExportError, Result};
