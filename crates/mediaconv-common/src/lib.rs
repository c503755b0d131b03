//! mediaconv-common: shared types used across the mediaconv crates.
//!
//! - **Error handling**: the workspace-wide [`Error`] enum, its [`ErrorCategory`]
//!   and the [`Result`] alias
//! - **Media description**: [`MediaInfo`] and friends, the structured result of
//!   probing a source file
//!
//! # Examples
//!
//! ```
//! use mediaconv_common::{Error, ErrorCategory, Result, StreamKind};
//!
//! fn lookup(name: &str) -> Result<()> {
//!     Err(Error::unknown_codec(StreamKind::Audio, name))
//! }
//!
//! let err = lookup("opus").unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::Configuration);
//! ```

pub mod error;
pub mod media;

pub use error::{Error, ErrorCategory, Result};
pub use media::{MediaFormatInfo, MediaInfo, MediaStreamInfo, StreamKind};
