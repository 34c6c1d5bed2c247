//! Per-chart tile archives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              ArchiveStore               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              HandleCache                │
//! │ (one handle per chart, singleflight)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          ArchiveSource Trait            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     MbtilesSource / MbtilesArchive      │
//! │   ({dir}/{chart}.mbtiles via sqlx)      │
//! └─────────────────────────────────────────┘
//! ```

mod cache;
mod mbtiles;
mod source;

pub use cache::{HandleCache, DEFAULT_OPEN_RETRY_BACKOFF, DEFAULT_OPEN_TIMEOUT};
pub use mbtiles::{MbtilesArchive, MbtilesSource, DEFAULT_ARCHIVE_EXTENSION};
pub use source::{ArchiveHandle, ArchiveSource};
