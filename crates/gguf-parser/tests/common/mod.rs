//! Reference encoder for building GGUF fixtures in tests.

#![allow(dead_code)]

use gguf_parser::{ArrayValue, MetadataEntry, Value, ValueTag};

/// Header bytes; the alignment field is written for `version >= 3`.
pub fn header(version: u32, tensor_count: u64, metadata_count: u64, alignment: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(28);
    buf.extend_from_slice(b"GGUF");
    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(&tensor_count.to_le_bytes());
    buf.extend_from_slice(&metadata_count.to_le_bytes());
    if version >= 3 {
        buf.extend_from_slice(&alignment.to_le_bytes());
    }
    buf
}

/// Metadata key: `u32` length prefix.
pub fn put_key(buf: &mut Vec<u8>, key: &str) {
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(key.as_bytes());
}

/// In-value string: `u64` length prefix.
pub fn put_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Value payload without its tag. Arrays write every element they hold
/// and must therefore be complete.
pub fn put_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::UInt8(v) => buf.push(*v),
        Value::Int8(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::UInt16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Int16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::UInt32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Int32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::UInt64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Int64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Float32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Float64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Bool(v) => buf.push(u8::from(*v)),
        Value::String(s) => put_string(buf, s),
        Value::Array(a) => {
            assert!(a.is_complete(), "reference encoder needs complete arrays");
            buf.extend_from_slice(&(a.element_tag as u32).to_le_bytes());
            buf.extend_from_slice(&a.declared_length.to_le_bytes());
            for e in &a.elements {
                put_value(buf, e);
            }
        }
    }
}

/// Key, tag and value of one entry.
pub fn put_entry(buf: &mut Vec<u8>, key: &str, value: &Value) {
    put_key(buf, key);
    buf.extend_from_slice(&(value.tag() as u32).to_le_bytes());
    put_value(buf, value);
}

/// Complete file prefix: header followed by all entries.
pub fn encode_file(version: u32, entries: &[MetadataEntry]) -> Vec<u8> {
    let mut buf = header(version, 0, entries.len() as u64, 32);
    for e in entries {
        put_entry(&mut buf, &e.key, &e.value);
    }
    buf
}

pub fn entry(key: &str, value: Value) -> MetadataEntry {
    MetadataEntry {
        key: key.into(),
        value,
    }
}

pub fn array(element_tag: ValueTag, elements: Vec<Value>) -> Value {
    Value::Array(ArrayValue {
        element_tag,
        declared_length: elements.len() as u64,
        elements,
    })
}
