//! Checksum combination for CRC-32 and Adler-32.
//!
//! Given the checksums of two adjacent byte ranges and the length of the
//! second range, compute the checksum of their concatenation without
//! touching the original bytes. The [`gzip`] module builds on this to
//! splice a pre-compressed fragment in front of a gzip member and patch
//! its trailer.

pub mod adler32;
pub mod crc32;
pub mod gzip;

pub mod ffi;

#[cfg(test)]
mod validation;

pub use adler32::adler32_combine;
pub use crc32::{crc32_combine, Crc32CombineOp};

/// Error types for pzcombine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PzError {
    /// Output buffer is too small to hold the result.
    BufferTooSmall,
    /// Input data is invalid or corrupt.
    InvalidInput,
    /// The requested operation is not supported.
    Unsupported,
}

impl std::fmt::Display for PzError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "output buffer too small"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Unsupported => write!(f, "unsupported operation"),
        }
    }
}

impl std::error::Error for PzError {}

pub type PzResult<T> = Result<T, PzError>;
