//! Text processing for user-visible output.
//!
//! Everything the console sends passes through here: ANSI stripping,
//! secret redaction and pagination, in that order.

pub mod ansi;
pub mod code;
pub mod pager;
pub mod sanitize;

pub use ansi::strip_ansi;
pub use code::{cleanup_code, is_quit};
pub use pager::{Pagify, PagifyOptions, pagify};
pub use sanitize::{DEFAULT_PLACEHOLDER, Sanitizer, sanitize};
