//! Pure-Rust GGUF header and metadata decoder.
//!
//! Decodes the container header and the metadata key/value table from an
//! in-memory byte source. All reads are bounds-checked: corrupt or hostile
//! length fields produce errors instead of large allocations, and a failed
//! pass still returns every entry decoded before the failure.
//!
//! * [`decode_header`] reads the magic, version, counts and (v3+) alignment.
//! * [`decode_metadata`] decodes the table that follows the header, with
//!   array capping, nesting limits and strict/lenient recovery configured
//!   through [`DecodeOptions`].
//! * [`decode_file`] does both, reporting progress to a [`DecodeSink`].

pub mod cursor;
pub mod error;
pub mod reader;
pub mod sink;
pub mod types;
pub mod value;

pub use cursor::ByteCursor;
pub use error::{DecodeError, EntryError, Result};
pub use reader::{
    DecodedFile, decode_file, decode_header, decode_metadata, decode_metadata_with, decode_table,
    read_header,
};
pub use sink::{DecodeEvent, DecodeSink, NullSink, TracingSink};
pub use types::{
    ArrayValue, DecodeOptions, GGUF_MAGIC, Header, MetadataEntry, MetadataTable, Value, ValueTag,
};
pub use value::{decode_tagged, decode_value, read_value_string, skip_value};
