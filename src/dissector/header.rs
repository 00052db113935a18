use std::ops::Range;

use crate::cursor::{ByteCursor, ByteOrder};
use crate::error::{Malformed, WalkResult};
use crate::tree::Item;

/// Size of the TIFF header, and so the lowest valid first IFD offset.
pub const HEADER_LEN: u64 = 8;

/// The value conventionally stored after the byte order marker.
pub const TIFF_MAGIC: u16 = 42;

/// The 8 byte prologue of a TIFF structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    /// The fixed value, read but not checked by [`TiffHeader::parse`].
    pub magic: u16,
    pub first_ifd: u32,
}

impl TiffHeader {
    /// Parse the header at the start of `cursor`.
    pub fn parse(cursor: &ByteCursor<'_>) -> WalkResult<TiffHeader> {
        let mut scratch = Item::new("", 0..0);
        Self::read_into(cursor, &mut scratch)
    }

    /// Parse the header, labelling each field in `item` as soon as it has been read.
    pub(crate) fn read_into(cursor: &ByteCursor<'_>, item: &mut Item) -> WalkResult<TiffHeader> {
        let marker = cursor.bytes(0, 2)?;
        let marker = [marker[0], marker[1]];
        let byte_order = match ByteOrder::from_marker(marker) {
            Some(byte_order) => byte_order,
            None => {
                item.push(Item::new(
                    format!("Byte order: invalid (0x{:04x})", u16::from_be_bytes(marker)),
                    cursor.absolute(0, 2),
                ));
                return Err(Malformed::InvalidEndianness(u16::from_be_bytes(marker)));
            }
        };
        item.push(Item::new(
            format!("Byte order: {}", byte_order.name()),
            cursor.absolute(0, 2),
        ));

        let cursor = cursor.with_byte_order(byte_order);
        let magic = cursor.read_u16(2)?;
        item.push(Item::new(
            format!("Fixed value: {magic}"),
            cursor.absolute(2, 2),
        ));

        let first_ifd = cursor.read_u32(4)?;
        item.push(Item::new(
            format!("Offset of IFD #0: {first_ifd}"),
            cursor.absolute(4, 4),
        ));

        if u64::from(first_ifd) < HEADER_LEN {
            return Err(Malformed::BogusFirstIfdOffset(first_ifd));
        }

        Ok(TiffHeader {
            byte_order,
            magic,
            first_ifd,
        })
    }

    /// The stricter variant of parsing, requiring the fixed value to be 42.
    pub fn check_magic(&self) -> WalkResult<()> {
        if self.magic == TIFF_MAGIC {
            Ok(())
        } else {
            Err(Malformed::InvalidMagic(self.magic))
        }
    }
}

/// The header field a header finding is attached to, relative to the header.
pub(crate) fn field_of(kind: &Malformed) -> Range<u64> {
    match kind {
        Malformed::InvalidEndianness(_) => 0..2,
        Malformed::InvalidMagic(_) => 2..4,
        Malformed::BogusFirstIfdOffset(_) => 4..8,
        Malformed::Truncated { offset, len, .. } => *offset..offset.saturating_add(*len),
        _ => 0..HEADER_LEN,
    }
}
