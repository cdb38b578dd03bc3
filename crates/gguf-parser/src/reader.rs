//! GGUF reader — container header and metadata key/value table.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, EntryError, Result};
use crate::sink::{DecodeEvent, DecodeSink, NullSink};
use crate::types::*;
use crate::value::{decode_value, skip_value};

//  Public result types

/// Header plus metadata decoded from one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedFile {
    pub header: Header,
    pub metadata: MetadataTable,
    /// Why the metadata table ended before `header.metadata_count` entries.
    #[serde(skip)]
    pub error: Option<EntryError>,
}

impl DecodedFile {
    /// True when every entry the header announced (or the entry limit
    /// allowed) was decoded and none were skipped.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.metadata.skipped.is_empty()
    }
}

//  Header

/// Decode the header at the start of `bytes`.
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    read_header(&mut ByteCursor::new(bytes))
}

/// Read the header at the cursor, leaving it on the first metadata entry.
pub fn read_header(cursor: &mut ByteCursor<'_>) -> Result<Header> {
    let magic = cursor.read_bytes(4)?;
    if magic != GGUF_MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(DecodeError::BadMagic(found));
    }

    let version = cursor.read_u32()?;
    let tensor_count = cursor.read_u64()?;
    let metadata_count = cursor.read_u64()?;
    let alignment = if version >= ALIGNMENT_MIN_VERSION {
        Some(cursor.read_u32()?)
    } else {
        None
    };

    Ok(Header {
        version,
        tensor_count,
        metadata_count,
        alignment,
    })
}

//  Metadata

/// Decode the metadata table that follows `header` in `bytes`.
///
/// Never fails outright: the returned table holds every entry decoded
/// before the first unrecoverable error, which is returned alongside it.
pub fn decode_metadata(
    bytes: &[u8],
    header: &Header,
    opts: &DecodeOptions,
) -> (MetadataTable, Option<EntryError>) {
    decode_metadata_with(bytes, header, opts, &mut NullSink)
}

/// [`decode_metadata`], reporting progress to `sink`.
pub fn decode_metadata_with(
    bytes: &[u8],
    header: &Header,
    opts: &DecodeOptions,
    sink: &mut dyn DecodeSink,
) -> (MetadataTable, Option<EntryError>) {
    let mut cursor = ByteCursor::with_position(bytes, header.encoded_len());
    decode_table(&mut cursor, header.metadata_count, opts, sink)
}

/// Decode header and metadata in one pass. Only header errors fail.
pub fn decode_file(bytes: &[u8], opts: &DecodeOptions, sink: &mut dyn DecodeSink) -> Result<DecodedFile> {
    let mut cursor = ByteCursor::new(bytes);
    let header = read_header(&mut cursor)?;
    sink.event(DecodeEvent::Header(&header));
    let (metadata, error) = decode_table(&mut cursor, header.metadata_count, opts, sink);
    Ok(DecodedFile {
        header,
        metadata,
        error,
    })
}

/// Decode up to `metadata_count` entries (capped by `opts.max_entries`).
pub fn decode_table(
    cursor: &mut ByteCursor<'_>,
    metadata_count: u64,
    opts: &DecodeOptions,
    sink: &mut dyn DecodeSink,
) -> (MetadataTable, Option<EntryError>) {
    let count = match opts.max_entries {
        Some(limit) => metadata_count.min(limit as u64),
        None => metadata_count,
    };

    let mut table = MetadataTable::default();
    let mut stopped = None;

    for index in 0..count {
        let offset = cursor.position();
        sink.event(DecodeEvent::EntryStart { index, offset });

        match decode_entry(cursor, opts) {
            Ok(entry) => {
                sink.event(DecodeEvent::Entry {
                    index,
                    offset,
                    entry: &entry,
                });
                table.entries.push(entry);
            }
            Err(failure) => {
                let err = EntryError {
                    index,
                    offset,
                    key: failure.key,
                    error: failure.error,
                };
                if failure.skipped {
                    sink.event(DecodeEvent::EntrySkipped(&err));
                    table.skipped.push(err);
                    continue;
                }
                sink.event(DecodeEvent::Stopped(&err));
                stopped = Some(err);
                break;
            }
        }
    }

    table.end_offset = cursor.position();
    sink.event(DecodeEvent::Finished {
        entries: table.entries.len(),
        end_offset: table.end_offset,
    });
    (table, stopped)
}

//  Internal helpers

struct EntryFailure {
    key: Option<String>,
    error: DecodeError,
    /// The entry was consumed and the cursor sits on the next one.
    skipped: bool,
}

impl EntryFailure {
    fn fatal(key: Option<String>, error: DecodeError) -> Self {
        Self {
            key,
            error,
            skipped: false,
        }
    }
}

fn decode_entry(cursor: &mut ByteCursor<'_>, opts: &DecodeOptions) -> std::result::Result<MetadataEntry, EntryFailure> {
    let key = match read_key(cursor, opts.max_key_string_len) {
        Ok(key) => key,
        Err(DecodeError::StringTooLong { len, max }) if !opts.strict => {
            let error = DecodeError::StringTooLong { len, max };
            return Err(match skip_oversized_entry(cursor, len, opts) {
                Ok(()) => EntryFailure {
                    key: None,
                    error,
                    skipped: true,
                },
                Err(_) => EntryFailure::fatal(None, error),
            });
        }
        Err(error) => return Err(EntryFailure::fatal(None, error)),
    };

    let tag = cursor
        .read_u32()
        .and_then(ValueTag::try_from)
        .map_err(|e| EntryFailure::fatal(Some(key.clone()), e))?;
    let value = decode_value(cursor, tag, opts).map_err(|e| EntryFailure::fatal(Some(key.clone()), e))?;

    Ok(MetadataEntry { key, value })
}

/// Read a metadata key: `u32` length prefix, lossy UTF-8.
fn read_key(cursor: &mut ByteCursor<'_>, max_len: usize) -> Result<String> {
    let len = cursor.read_u32()?;
    if len as usize > max_len {
        return Err(DecodeError::StringTooLong {
            len: u64::from(len),
            max: max_len,
        });
    }
    let bytes = cursor.read_bytes(len as usize)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Consume the remainder of an entry whose key length was rejected.
fn skip_oversized_entry(cursor: &mut ByteCursor<'_>, key_len: u64, opts: &DecodeOptions) -> Result<()> {
    cursor.skip(key_len)?;
    let tag = ValueTag::try_from(cursor.read_u32()?)?;
    skip_value(cursor, tag, opts)
}
