use thiserror::Error;

use crate::types::ArrayValue;

/// Failure while decoding a single field, value, or the header.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("invalid GGUF magic: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unexpected end of data at offset {offset}: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: u64,
        remaining: usize,
    },

    #[error("unknown value type tag: {0}")]
    UnknownValueType(u32),

    #[error("string length {len} exceeds limit of {max} bytes")]
    StringTooLong { len: u64, max: usize },

    #[error("array nesting depth {depth} exceeds limit of {max}")]
    NestingTooDeep { depth: usize, max: usize },

    /// An element of an array failed; `partial` holds the elements that
    /// were materialized before the failure.
    #[error("array element {index} failed: {source}")]
    ArrayElement {
        index: u64,
        partial: Box<ArrayValue>,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Innermost error, unwrapping any array element context.
    pub fn root(&self) -> &DecodeError {
        let mut err = self;
        while let DecodeError::ArrayElement { source, .. } = err {
            err = source;
        }
        err
    }
}

/// A metadata entry that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("metadata entry {index} at offset {offset}: {error}")]
pub struct EntryError {
    /// Zero-based entry index within the metadata table.
    pub index: u64,
    /// Byte offset at which the entry started.
    pub offset: usize,
    /// Key of the entry, if it was read before the failure.
    pub key: Option<String>,
    #[source]
    pub error: DecodeError,
}

pub type Result<T> = std::result::Result<T, DecodeError>;
