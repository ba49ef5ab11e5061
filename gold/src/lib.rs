//! Golden-file testing helper.
//!
//! A [`Runner`] either compares program output against reference files stored
//! on disk (check mode) or records new reference files (update mode). Before
//! either happens, the output is passed through a chain of [`Filter`]s that
//! normalize volatile substrings such as timestamps, hashes and identifiers,
//! so golden files stay stable from one run to the next.
//!
//! # Example
//!
//! ```no_run
//! use gold::filter::{TimeRfc3339, Uuids};
//! use gold::{Runner, RunnerConfig};
//!
//! # fn main() -> Result<(), gold::Error> {
//! let update = std::env::args().any(|arg| arg == "--update");
//!
//! let runner = Runner::from_config(
//!     RunnerConfig::new("testdata")
//!         .with_update(update)
//!         .with_filter(TimeRfc3339)
//!         .with_filter(Uuids),
//! );
//!
//! runner.prepare()?;
//! runner.test("greeting.txt", b"hello at 2024-05-06T07:08:09Z")?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod filter;
mod runner;
pub mod trace_categories;

pub use config::{DEFAULT_DIRECTORY, RunnerConfig};
pub use error::{ComparisonError, Error};
pub use filter::{Filter, try_format_json};
pub use runner::Runner;
