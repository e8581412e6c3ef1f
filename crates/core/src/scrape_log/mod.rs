//! Append-only log of scrape failures.
//!
//! Failures are sent through a [`ScrapeLogHandle`] and written by a
//! background [`ScrapeLogWriter`], so recording one never blocks or fails a
//! scrape.

mod handle;
mod sqlite;
mod store;
mod types;
mod writer;

pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use types::*;
pub use writer::*;
