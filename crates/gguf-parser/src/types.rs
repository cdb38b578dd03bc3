//! GGUF format types and constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EntryError};

/// Magic bytes at the start of every GGUF file.
pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";

/// First version whose header carries an alignment field.
pub const ALIGNMENT_MIN_VERSION: u32 = 3;

/// Header length without the alignment field.
pub const HEADER_LEN: usize = 24;

//  Value type tag

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ValueTag {
    UInt8 = 1,
    Int8 = 2,
    UInt16 = 3,
    Int16 = 4,
    UInt32 = 5,
    Int32 = 6,
    UInt64 = 7,
    Int64 = 8,
    Float32 = 9,
    Float64 = 10,
    Bool = 11,
    String = 12,
    Array = 13,
}

impl TryFrom<u32> for ValueTag {
    type Error = DecodeError;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::UInt8),
            2 => Ok(Self::Int8),
            3 => Ok(Self::UInt16),
            4 => Ok(Self::Int16),
            5 => Ok(Self::UInt32),
            6 => Ok(Self::Int32),
            7 => Ok(Self::UInt64),
            8 => Ok(Self::Int64),
            9 => Ok(Self::Float32),
            10 => Ok(Self::Float64),
            11 => Ok(Self::Bool),
            12 => Ok(Self::String),
            13 => Ok(Self::Array),
            _ => Err(DecodeError::UnknownValueType(v)),
        }
    }
}

impl ValueTag {
    /// Encoded width of a value of this type, `None` for strings and arrays.
    pub fn fixed_size(self) -> Option<u64> {
        match self {
            Self::UInt8 | Self::Int8 | Self::Bool => Some(1),
            Self::UInt16 | Self::Int16 => Some(2),
            Self::UInt32 | Self::Int32 | Self::Float32 => Some(4),
            Self::UInt64 | Self::Int64 | Self::Float64 => Some(8),
            Self::String | Self::Array => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::Int8 => "int8",
            Self::UInt16 => "uint16",
            Self::Int16 => "int16",
            Self::UInt32 => "uint32",
            Self::Int32 => "int32",
            Self::UInt64 => "uint64",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//  Header

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub tensor_count: u64,
    pub metadata_count: u64,
    /// Present iff `version >= 3`.
    pub alignment: Option<u32>,
}

impl Header {
    /// Encoded size of the header, i.e. the offset of the first metadata entry.
    pub fn encoded_len(&self) -> usize {
        if self.alignment.is_some() {
            HEADER_LEN + 4
        } else {
            HEADER_LEN
        }
    }
}

//  Values

/// A decoded array. `elements` may hold fewer items than `declared_length`
/// when the array was capped or decoding failed partway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub element_tag: ValueTag,
    pub declared_length: u64,
    pub elements: Vec<Value>,
}

impl ArrayValue {
    pub fn new(element_tag: ValueTag, declared_length: u64) -> Self {
        Self {
            element_tag,
            declared_length,
            elements: Vec::new(),
        }
    }

    /// Whether every declared element was materialized.
    pub fn is_complete(&self) -> bool {
        self.elements.len() as u64 == self.declared_length
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    String(String),
    Array(ArrayValue),
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Self::UInt8(_) => ValueTag::UInt8,
            Self::Int8(_) => ValueTag::Int8,
            Self::UInt16(_) => ValueTag::UInt16,
            Self::Int16(_) => ValueTag::Int16,
            Self::UInt32(_) => ValueTag::UInt32,
            Self::Int32(_) => ValueTag::Int32,
            Self::UInt64(_) => ValueTag::UInt64,
            Self::Int64(_) => ValueTag::Int64,
            Self::Float32(_) => ValueTag::Float32,
            Self::Float64(_) => ValueTag::Float64,
            Self::Bool(_) => ValueTag::Bool,
            Self::String(_) => ValueTag::String,
            Self::Array(_) => ValueTag::Array,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt8(v) => Some(u32::from(*v)),
            Self::UInt16(v) => Some(u32::from(*v)),
            Self::UInt32(v) => Some(*v),
            Self::Int32(v) => u32::try_from(*v).ok(),
            Self::UInt64(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt64(v) => Some(*v),
            Self::Int64(v) => u64::try_from(*v).ok(),
            other => other.as_u32().map(u64::from),
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float32(v) => Some(*v),
            Self::Float64(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// Elements shown by the array summary before eliding the rest.
const SUMMARY_ELEMENTS: usize = 5;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt8(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(a) => write!(f, "{a}"),
        }
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Array[{}] type={}: [",
            self.declared_length, self.element_tag
        )?;
        for (i, v) in self.elements.iter().take(SUMMARY_ELEMENTS).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")?;
        if self.declared_length > SUMMARY_ELEMENTS as u64 {
            f.write_str("...")?;
        }
        Ok(())
    }
}

//  Metadata

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: Value,
}

/// Decoded metadata table in file order. Duplicate keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataTable {
    pub entries: Vec<MetadataEntry>,
    /// Entries dropped in non-strict mode; decoding continued after each.
    #[serde(skip)]
    pub skipped: Vec<EntryError>,
    /// Cursor offset after the last entry that was read.
    pub end_offset: usize,
}

impl MetadataTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetadataEntry> {
        self.entries.iter()
    }

    /// Look up `key`; when it occurs more than once the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Entries whose key mentions `token` or `vocab` (case-insensitive).
    pub fn tokenizer_entries(&self) -> impl Iterator<Item = &MetadataEntry> {
        self.entries.iter().filter(|e| {
            let key = e.key.to_lowercase();
            key.contains("token") || key.contains("vocab")
        })
    }
}

impl<'a> IntoIterator for &'a MetadataTable {
    type Item = &'a MetadataEntry;
    type IntoIter = std::slice::Iter<'a, MetadataEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//  Options

/// Limits and recovery policy for a decode pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Array elements materialized per array; the rest are consumed and dropped.
    pub max_elements_per_array: usize,
    /// Longest accepted metadata key, in bytes.
    pub max_key_string_len: usize,
    /// Stop after this many metadata entries.
    pub max_entries: Option<usize>,
    /// Abort on the first error instead of skipping recoverable entries.
    pub strict: bool,
    /// Deepest accepted array-of-array nesting.
    pub max_nesting_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_elements_per_array: 10,
            max_key_string_len: 1000,
            max_entries: None,
            strict: false,
            max_nesting_depth: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_array(declared: u64, items: &[u32]) -> Value {
        Value::Array(ArrayValue {
            element_tag: ValueTag::UInt32,
            declared_length: declared,
            elements: items.iter().copied().map(Value::UInt32).collect(),
        })
    }

    #[test]
    fn tag_numbers_match_wire_values() {
        for raw in 1..=13u32 {
            let tag = ValueTag::try_from(raw).unwrap();
            assert_eq!(tag as u32, raw);
        }
        assert_eq!(ValueTag::try_from(0), Err(DecodeError::UnknownValueType(0)));
        assert_eq!(ValueTag::try_from(14), Err(DecodeError::UnknownValueType(14)));
    }

    #[test]
    fn header_len_depends_on_alignment() {
        let mut h = Header {
            version: 2,
            tensor_count: 0,
            metadata_count: 0,
            alignment: None,
        };
        assert_eq!(h.encoded_len(), 24);
        h.version = 3;
        h.alignment = Some(32);
        assert_eq!(h.encoded_len(), 28);
    }

    #[test]
    fn array_summary_shows_first_five() {
        let v = u32_array(1000, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(v.to_string(), "Array[1000] type=uint32: [1, 2, 3, 4, 5]...");
        let short = u32_array(2, &[7, 8]);
        assert_eq!(short.to_string(), "Array[2] type=uint32: [7, 8]");
        assert_eq!(Value::String("llama".into()).to_string(), "\"llama\"");
    }

    #[test]
    fn get_prefers_last_duplicate() {
        let table = MetadataTable {
            entries: vec![
                MetadataEntry {
                    key: "general.name".into(),
                    value: Value::String("first".into()),
                },
                MetadataEntry {
                    key: "general.name".into(),
                    value: Value::String("second".into()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("general.name").and_then(Value::as_str), Some("second"));
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn tokenizer_filter_matches_token_and_vocab() {
        let entry = |key: &str| MetadataEntry {
            key: key.into(),
            value: Value::Bool(true),
        };
        let table = MetadataTable {
            entries: vec![
                entry("general.name"),
                entry("tokenizer.ggml.tokens"),
                entry("llama.vocab_size"),
                entry("Tokenizer.Model"),
            ],
            ..Default::default()
        };
        let keys: Vec<_> = table.tokenizer_entries().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            ["tokenizer.ggml.tokens", "llama.vocab_size", "Tokenizer.Model"]
        );
    }

    #[test]
    fn numeric_accessors_reject_lossy_conversions() {
        assert_eq!(Value::Int32(-1).as_u32(), None);
        assert_eq!(Value::UInt64(u64::MAX).as_u32(), None);
        assert_eq!(Value::UInt16(4096).as_u64(), Some(4096));
        assert_eq!(Value::Float64(0.5).as_f32(), Some(0.5));
    }
}
