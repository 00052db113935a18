//! Decoding of single IFD entries and their values

use std::fmt;

use crate::cursor::{ByteCursor, ByteOrder};
use crate::error::{Malformed, WalkResult};
use crate::tags::Type;

/// Size of one directory entry in bytes.
pub const ENTRY_LEN: u64 = 12;

/// A decoded value element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Value {
    Byte(u8),
    Short(u16),
    Unsigned(u32),
    Signed(i32),
    Rational(u32, u32),
    SRational(i32, i32),
    /// The text up to the first NUL byte, `truncated` if only its start is kept.
    Ascii { text: String, truncated: bool },
    /// Leading bytes of an opaque run, `truncated` if the run is longer.
    Undefined { bytes: Vec<u8>, truncated: bool },
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(e) => write!(f, "{e}"),
            Value::Short(e) => write!(f, "{e}"),
            Value::Unsigned(e) => write!(f, "{e}"),
            Value::Signed(e) => write!(f, "{e}"),
            Value::Rational(n, d) => write!(f, "{n}/{d}"),
            Value::SRational(n, d) => write!(f, "{n}/{d}"),
            Value::Ascii { text, truncated } => {
                write!(f, "\"{}\"", text.escape_default())?;
                if *truncated {
                    f.write_str(" ...")?;
                }
                Ok(())
            }
            Value::Undefined { bytes, truncated } => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                if *truncated {
                    f.write_str(" ...")?;
                }
                Ok(())
            }
        }
    }
}

/// Where the values of an entry are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Packed into the value slot of the entry itself, at this offset.
    Inline(u64),
    /// Stored at this offset from the TIFF header, as read from the value slot.
    External(u32),
}

/// One 12 byte directory entry.
// Tag   2 bytes
// Type  2 bytes
// Count 4 bytes
// Value 4 bytes, either the value itself or an offset to it
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Position of the entry relative to the TIFF header.
    pub offset: u64,
    pub tag: u16,
    pub type_code: u16,
    pub count: u32,
    slot: [u8; 4],
}

impl fmt::Debug for Entry {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&format!(
            "Entry {{ tag: 0x{:04x}, type: {}, count: {}, slot: {:?} }}",
            self.tag, self.type_code, self.count, &self.slot
        ))
    }
}

impl Entry {
    pub fn read(cursor: &ByteCursor<'_>, offset: u64) -> WalkResult<Entry> {
        let tag = cursor.read_u16(offset)?;
        let type_code = cursor.read_u16(offset + 2)?;
        let count = cursor.read_u32(offset + 4)?;
        let mut slot = [0; 4];
        slot.copy_from_slice(cursor.bytes(offset + 8, 4)?);

        Ok(Entry {
            offset,
            tag,
            type_code,
            count,
            slot,
        })
    }

    /// The field type, `None` for codes outside of the type table.
    pub fn field_type(&self) -> Option<Type> {
        Type::from_u16(self.type_code)
    }

    /// Size of one value element, zero for an unknown type.
    pub fn element_size(&self) -> u8 {
        Type::element_size(self.type_code)
    }

    /// Offset of the 4 byte value slot.
    pub fn slot_offset(&self) -> u64 {
        self.offset + 8
    }

    /// The value slot interpreted as a 32-bit unsigned integer.
    pub fn slot_u32(&self, byte_order: ByteOrder) -> u32 {
        match byte_order {
            ByteOrder::LittleEndian => u32::from_le_bytes(self.slot),
            ByteOrder::BigEndian => u32::from_be_bytes(self.slot),
        }
    }

    /// Apply the TIFF value placement rule.
    ///
    /// Values that fit into the 4 bytes of the slot are stored there, left-packed. Anything larger
    /// lives elsewhere and the slot holds its offset. Values of an unknown type are always taken
    /// to live elsewhere.
    pub fn placement(&self, byte_order: ByteOrder) -> Placement {
        let size = u32::from(self.element_size());
        if size == 0 || 4 / size < self.count {
            Placement::External(self.slot_u32(byte_order))
        } else {
            Placement::Inline(self.slot_offset())
        }
    }

    /// Resolve the offset of the first value byte, checking an external offset against the end
    /// of the TIFF data.
    pub fn value_start(&self, cursor: &ByteCursor<'_>) -> WalkResult<u64> {
        match self.placement(cursor.byte_order()) {
            Placement::Inline(at) => Ok(at),
            Placement::External(at) if (at as usize) < cursor.len() => Ok(at.into()),
            Placement::External(at) => Err(Malformed::InvalidValueOffset(at)),
        }
    }
}

/// Decode one element of a numeric type at `offset`.
pub(crate) fn read_element(cursor: &ByteCursor<'_>, ty: Type, offset: u64) -> WalkResult<Value> {
    Ok(match ty {
        Type::BYTE => Value::Byte(cursor.read_u8(offset)?),
        Type::SHORT => Value::Short(cursor.read_u16(offset)?),
        Type::LONG => Value::Unsigned(cursor.read_u32(offset)?),
        Type::SLONG => Value::Signed(cursor.read_i32(offset)?),
        Type::RATIONAL => Value::Rational(cursor.read_u32(offset)?, cursor.read_u32(offset + 4)?),
        Type::SRATIONAL => Value::SRational(cursor.read_i32(offset)?, cursor.read_i32(offset + 4)?),
        Type::ASCII | Type::UNDEFINED => {
            return read_run(cursor, ty, offset, 1, usize::MAX);
        }
    })
}

/// Decode a run of `count` bytes at `offset` as a single value, keeping at most `keep` bytes of
/// it.
pub(crate) fn read_run(
    cursor: &ByteCursor<'_>,
    ty: Type,
    offset: u64,
    count: u32,
    keep: usize,
) -> WalkResult<Value> {
    let bytes = cursor.bytes(offset, count.into())?;

    Ok(match ty {
        Type::ASCII => {
            // Strings may be null-terminated, so we trim anything downstream of the null byte
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Value::Ascii {
                text: String::from_utf8_lossy(&bytes[..end.min(keep)]).into_owned(),
                truncated: end > keep,
            }
        }
        _ => Value::Undefined {
            bytes: bytes[..bytes.len().min(keep)].to_vec(),
            truncated: bytes.len() > keep,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_bytes(tag: u16, ty: u16, count: u32, slot: [u8; 4]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&tag.to_le_bytes());
        v.extend_from_slice(&ty.to_le_bytes());
        v.extend_from_slice(&count.to_le_bytes());
        v.extend_from_slice(&slot);
        v
    }

    fn le(data: &[u8]) -> ByteCursor<'_> {
        ByteCursor::new(data).with_byte_order(ByteOrder::LittleEndian)
    }

    #[test]
    fn decodes_fields() {
        let data = entry_bytes(0x0112, 3, 1, [1, 0, 0, 0]);
        let entry = Entry::read(&le(&data), 0).unwrap();

        assert_eq!(entry.tag, 0x0112);
        assert_eq!(entry.field_type(), Some(Type::SHORT));
        assert_eq!(entry.count, 1);
        assert_eq!(entry.slot_offset(), 8);
        assert_eq!(entry.slot_u32(ByteOrder::LittleEndian), 1);
        assert_eq!(entry.slot_u32(ByteOrder::BigEndian), 0x0100_0000);
    }

    #[test]
    fn two_shorts_are_inline() {
        let mut data = vec![0; 4];
        data.extend(entry_bytes(0x0212, 3, 2, [2, 0, 1, 0]));
        let cursor = le(&data);
        let entry = Entry::read(&cursor, 4).unwrap();

        assert_eq!(
            entry.placement(ByteOrder::LittleEndian),
            Placement::Inline(12)
        );
        let start = entry.value_start(&cursor).unwrap();
        assert_eq!(read_element(&cursor, Type::SHORT, start), Ok(Value::Short(2)));
        assert_eq!(read_element(&cursor, Type::SHORT, start + 2), Ok(Value::Short(1)));
    }

    #[test]
    fn three_shorts_are_external() {
        let mut data = entry_bytes(0x0102, 3, 3, [12, 0, 0, 0]);
        data.extend_from_slice(&[8, 0, 9, 0, 10, 0]);
        let cursor = le(&data);
        let entry = Entry::read(&cursor, 0).unwrap();

        assert_eq!(
            entry.placement(ByteOrder::LittleEndian),
            Placement::External(12)
        );
        let start = entry.value_start(&cursor).unwrap();
        assert_eq!(start, 12);
        assert_eq!(read_element(&cursor, Type::SHORT, 16), Ok(Value::Short(10)));
    }

    #[test]
    fn rationals_are_always_external() {
        let data = entry_bytes(0x011A, 5, 1, [200, 0, 0, 0]);
        let cursor = le(&data);
        let entry = Entry::read(&cursor, 0).unwrap();

        assert_eq!(
            entry.placement(ByteOrder::LittleEndian),
            Placement::External(200)
        );
        assert_eq!(
            entry.value_start(&cursor),
            Err(Malformed::InvalidValueOffset(200))
        );
    }

    #[test]
    fn offset_equal_to_length_is_invalid() {
        let data = entry_bytes(0x010F, 2, 6, [12, 0, 0, 0]);
        let cursor = le(&data);
        let entry = Entry::read(&cursor, 0).unwrap();

        assert_eq!(
            entry.value_start(&cursor),
            Err(Malformed::InvalidValueOffset(12))
        );
    }

    #[test]
    fn unknown_type_is_external() {
        let mut data = entry_bytes(0x0001, 11, 1, [12, 0, 0, 0]);
        data.push(0);
        let cursor = le(&data);
        let entry = Entry::read(&cursor, 0).unwrap();

        assert_eq!(entry.field_type(), None);
        assert_eq!(entry.element_size(), 0);
        assert_eq!(
            entry.placement(ByteOrder::LittleEndian),
            Placement::External(12)
        );
        assert_eq!(entry.value_start(&cursor), Ok(12));

        let data = entry_bytes(0x0001, 11, 0, [0xef, 0xbe, 0xad, 0xde]);
        let cursor = le(&data);
        let entry = Entry::read(&cursor, 0).unwrap();
        assert_eq!(
            entry.value_start(&cursor),
            Err(Malformed::InvalidValueOffset(0xdead_beef))
        );
    }

    #[test]
    fn runs() {
        let data = *b"Canon\0\x01\x02\x03";
        let cursor = le(&data);

        assert_eq!(
            read_run(&cursor, Type::ASCII, 0, 6, usize::MAX),
            Ok(Value::Ascii {
                text: "Canon".into(),
                truncated: false
            })
        );
        let undefined = read_run(&cursor, Type::UNDEFINED, 6, 3, 2).unwrap();
        assert_eq!(undefined.to_string(), "01 02 ...");
        assert!(read_run(&cursor, Type::UNDEFINED, 6, 4, 2).is_err());
    }

    #[test]
    fn long_text_is_cut_at_limit() {
        let data = *b"Canon EOS\0";
        let cursor = le(&data);

        let text = read_run(&cursor, Type::ASCII, 0, 10, 5).unwrap();
        assert_eq!(
            text,
            Value::Ascii {
                text: "Canon".into(),
                truncated: true
            }
        );
        assert_eq!(text.to_string(), "\"Canon\" ...");

        // The limit applies after the terminator is stripped.
        let text = read_run(&cursor, Type::ASCII, 0, 10, 9).unwrap();
        assert_eq!(text.to_string(), "\"Canon EOS\"");
    }

    #[test]
    fn rational_display() {
        let data = [1, 0, 0, 0, 3, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 2, 0, 0, 0];
        let cursor = le(&data);
        assert_eq!(
            read_element(&cursor, Type::RATIONAL, 0).unwrap().to_string(),
            "1/3"
        );
        assert_eq!(
            read_element(&cursor, Type::SRATIONAL, 8).unwrap().to_string(),
            "-1/2"
        );
    }
}
