//! Structured progress events emitted while decoding.
//!
//! The decoder never prints; callers that want a trace of the pass supply a
//! [`DecodeSink`]. Closures taking a [`DecodeEvent`] are sinks too.

use tracing::{debug, trace, warn};

use crate::error::EntryError;
use crate::types::{Header, MetadataEntry};

#[derive(Debug, Clone, Copy)]
pub enum DecodeEvent<'a> {
    Header(&'a Header),
    EntryStart {
        index: u64,
        offset: usize,
    },
    Entry {
        index: u64,
        offset: usize,
        entry: &'a MetadataEntry,
    },
    /// Entry dropped in non-strict mode; decoding continues.
    EntrySkipped(&'a EntryError),
    /// Decoding of the table ended early.
    Stopped(&'a EntryError),
    Finished {
        entries: usize,
        end_offset: usize,
    },
}

pub trait DecodeSink {
    fn event(&mut self, event: DecodeEvent<'_>);
}

impl<F> DecodeSink for F
where
    F: FnMut(DecodeEvent<'_>),
{
    fn event(&mut self, event: DecodeEvent<'_>) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DecodeSink for NullSink {
    fn event(&mut self, _event: DecodeEvent<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DecodeSink for TracingSink {
    fn event(&mut self, event: DecodeEvent<'_>) {
        match event {
            DecodeEvent::Header(h) => debug!(
                version = h.version,
                tensor_count = h.tensor_count,
                metadata_count = h.metadata_count,
                alignment = ?h.alignment,
                metadata_offset = h.encoded_len(),
                "decoded GGUF header"
            ),
            DecodeEvent::EntryStart { index, offset } => {
                trace!(index, offset, "reading metadata entry")
            }
            DecodeEvent::Entry {
                index,
                offset,
                entry,
            } => debug!(index, offset, key = %entry.key, value = %entry.value, "metadata entry"),
            DecodeEvent::EntrySkipped(e) => warn!(
                index = e.index,
                offset = e.offset,
                error = %e.error,
                "skipped corrupt metadata entry"
            ),
            DecodeEvent::Stopped(e) => warn!(
                index = e.index,
                offset = e.offset,
                key = ?e.key,
                error = %e.error,
                "metadata decoding stopped"
            ),
            DecodeEvent::Finished {
                entries,
                end_offset,
            } => debug!(entries, end_offset, "metadata decoded"),
        }
    }
}
