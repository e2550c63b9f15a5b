//! m4bforge-common: shared error type, time normalization, and chapter handling.
//!
//! - **Time**: [`time::normalize`] turns `390`, `"390.5"` or `"6:30"` into seconds
//! - **Chapters**: [`chapter::derive_intervals`] sorts chapters and fills end times
//! - **Errors**: [`Error`] with HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use m4bforge_common::{derive_intervals, Chapter};
//!
//! let chapters = derive_intervals(vec![
//!     Chapter::parse("Chapter 1", "6:30")?,
//!     Chapter::parse("Intro", 0.0)?,
//! ]);
//! assert_eq!(chapters[0].title, "Intro");
//! assert_eq!(chapters[0].end_time, Some(390.0));
//! assert_eq!(chapters[1].end_time, None);
//! # Ok::<(), m4bforge_common::Error>(())
//! ```

pub mod chapter;
pub mod error;
pub mod time;

pub use chapter::{derive_intervals, parse_chapters_json, Chapter};
pub use error::{Error, Result};
pub use time::{normalize, TimeInput};
