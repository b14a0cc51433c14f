//! Object identity for the object store readers.
//!
//! Provides the 20-byte [`ObjectId`], hex encoding and decoding, SHA-1
//! object hashing with collision detection, and the pack index fan-out
//! table.

mod error;
pub mod fanout;
pub mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use oid::ObjectId;

/// Length of a raw object id in bytes.
pub const OID_LEN: usize = 20;
/// Length of an object id in hex characters.
pub const OID_HEX_LEN: usize = 40;
