//! Foundation utilities shared by the object store crates.
//!
//! Holds the abstract file I/O layer every reader is written against, the
//! signature/date parser used by commit and tag bodies, the single-flight
//! helper backing the shared caches, and the error classification common to
//! all crates.

pub mod date;
pub mod error;
pub mod flight;
pub mod io;

// Re-export core types at crate root for convenience
pub use bstr::{BStr, BString, ByteSlice};
pub use error::{ErrorKind, UtilError};

pub type Result<T> = std::result::Result<T, UtilError>;
