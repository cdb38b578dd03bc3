//! Recursive decoder for tagged metadata values.
//!
//! Arrays are materialized up to [`DecodeOptions::max_elements_per_array`]
//! elements; the remainder of the declared length is still consumed so the
//! cursor lands on the next entry. Nesting is bounded by
//! [`DecodeOptions::max_nesting_depth`].

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::types::{ArrayValue, DecodeOptions, Value, ValueTag};

/// Decode one value of type `tag` at the cursor.
pub fn decode_value(cursor: &mut ByteCursor<'_>, tag: ValueTag, opts: &DecodeOptions) -> Result<Value> {
    decode_at_depth(cursor, tag, opts, 0)
}

/// Decode a value from its raw wire tag. Unknown tags fail before any read.
pub fn decode_tagged(cursor: &mut ByteCursor<'_>, raw_tag: u32, opts: &DecodeOptions) -> Result<Value> {
    let tag = ValueTag::try_from(raw_tag)?;
    decode_value(cursor, tag, opts)
}

/// Consume one value of type `tag` without materializing it.
pub fn skip_value(cursor: &mut ByteCursor<'_>, tag: ValueTag, opts: &DecodeOptions) -> Result<()> {
    skip_at_depth(cursor, tag, opts, 0)
}

/// Read a value-context string: `u64` length prefix, lossy UTF-8.
pub fn read_value_string(cursor: &mut ByteCursor<'_>) -> Result<String> {
    let len = cursor.read_u64()?;
    let n = usize::try_from(len).map_err(|_| cursor.eof(len))?;
    let bytes = cursor.read_bytes(n)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn decode_at_depth(
    cursor: &mut ByteCursor<'_>,
    tag: ValueTag,
    opts: &DecodeOptions,
    depth: usize,
) -> Result<Value> {
    Ok(match tag {
        ValueTag::UInt8 => Value::UInt8(cursor.read_u8()?),
        ValueTag::Int8 => Value::Int8(cursor.read_i8()?),
        ValueTag::UInt16 => Value::UInt16(cursor.read_u16()?),
        ValueTag::Int16 => Value::Int16(cursor.read_i16()?),
        ValueTag::UInt32 => Value::UInt32(cursor.read_u32()?),
        ValueTag::Int32 => Value::Int32(cursor.read_i32()?),
        ValueTag::UInt64 => Value::UInt64(cursor.read_u64()?),
        ValueTag::Int64 => Value::Int64(cursor.read_i64()?),
        ValueTag::Float32 => Value::Float32(cursor.read_f32()?),
        ValueTag::Float64 => Value::Float64(cursor.read_f64()?),
        ValueTag::Bool => Value::Bool(cursor.read_u8()? != 0),
        ValueTag::String => Value::String(read_value_string(cursor)?),
        ValueTag::Array => Value::Array(decode_array(cursor, opts, depth)?),
    })
}

/// Check the nesting limit for an array opened inside `depth` enclosing arrays.
fn enter_array(opts: &DecodeOptions, depth: usize) -> Result<()> {
    if depth >= opts.max_nesting_depth {
        return Err(DecodeError::NestingTooDeep {
            depth: depth + 1,
            max: opts.max_nesting_depth,
        });
    }
    Ok(())
}

fn read_array_header(cursor: &mut ByteCursor<'_>) -> Result<ArrayValue> {
    let element_tag = ValueTag::try_from(cursor.read_u32()?)?;
    let declared_length = cursor.read_u64()?;
    Ok(ArrayValue::new(element_tag, declared_length))
}

fn decode_array(cursor: &mut ByteCursor<'_>, opts: &DecodeOptions, depth: usize) -> Result<ArrayValue> {
    enter_array(opts, depth)?;
    let mut array = read_array_header(cursor)?;
    if array.declared_length == 0 {
        return Ok(array);
    }

    let materialize = array
        .declared_length
        .min(opts.max_elements_per_array as u64);
    // Every element occupies at least one byte.
    let capacity = materialize.min(cursor.remaining() as u64) as usize;
    array.elements.reserve(capacity);

    for index in 0..materialize {
        match decode_at_depth(cursor, array.element_tag, opts, depth + 1) {
            Ok(v) => array.elements.push(v),
            Err(source) => {
                return Err(DecodeError::ArrayElement {
                    index,
                    partial: Box::new(array),
                    source: Box::new(source),
                });
            }
        }
    }

    let rest = array.declared_length - materialize;
    if let Err((skipped, source)) = skip_elements(cursor, array.element_tag, rest, opts, depth + 1) {
        return Err(DecodeError::ArrayElement {
            index: materialize + skipped,
            partial: Box::new(array),
            source: Box::new(source),
        });
    }
    Ok(array)
}

fn skip_at_depth(
    cursor: &mut ByteCursor<'_>,
    tag: ValueTag,
    opts: &DecodeOptions,
    depth: usize,
) -> Result<()> {
    match tag {
        ValueTag::String => {
            let len = cursor.read_u64()?;
            cursor.skip(len)
        }
        ValueTag::Array => {
            enter_array(opts, depth)?;
            let header = read_array_header(cursor)?;
            skip_elements(cursor, header.element_tag, header.declared_length, opts, depth + 1).map_err(
                |(index, source)| DecodeError::ArrayElement {
                    index,
                    partial: Box::new(header),
                    source: Box::new(source),
                },
            )
        }
        fixed => cursor.skip(fixed.fixed_size().unwrap_or_default()),
    }
}

/// Consume `count` elements of type `tag`. On failure, returns the index
/// (relative to the first skipped element) of the element that failed.
fn skip_elements(
    cursor: &mut ByteCursor<'_>,
    tag: ValueTag,
    count: u64,
    opts: &DecodeOptions,
    depth: usize,
) -> std::result::Result<(), (u64, DecodeError)> {
    if count == 0 {
        return Ok(());
    }
    if let Some(size) = tag.fixed_size() {
        return match count.checked_mul(size) {
            Some(total) if total <= cursor.remaining() as u64 => cursor.skip(total).map_err(|e| (0, e)),
            _ => {
                // Report the first element that does not fit.
                let fit = cursor.remaining() as u64 / size;
                let skipped = fit * size;
                cursor.skip(skipped).map_err(|e| (0, e))?;
                Err((fit, cursor.eof(size)))
            }
        };
    }
    // Each string or array element is at least eight bytes; a bogus count hits EOF first.
    for index in 0..count {
        skip_at_depth(cursor, tag, opts, depth).map_err(|e| (index, e))?;
    }
    Ok(())
}
