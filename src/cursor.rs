//! Bounded, byte order aware reads over an immutable buffer

use std::ops::Range;

use crate::error::{Malformed, WalkResult};

/// Byte order of the TIFF structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// little endian byte order (`II`)
    LittleEndian,
    /// big endian byte order (`MM`)
    BigEndian,
}

impl ByteOrder {
    /// Decide the byte order from the two marker bytes at the start of a TIFF header.
    pub fn from_marker(marker: [u8; 2]) -> Option<ByteOrder> {
        match &marker {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little endian (II)",
            ByteOrder::BigEndian => "Big endian (MM)",
        }
    }
}

macro_rules! read_fn {
    ($name:ident, $type:ty) => {
        /// Reads a
        #[doc = stringify!($type)]
        /// at `offset` in the byte order of the cursor.
        #[inline(always)]
        pub fn $name(&self, offset: u64) -> WalkResult<$type> {
            const LEN: usize = std::mem::size_of::<$type>();
            let mut n = [0u8; LEN];
            n.copy_from_slice(self.bytes(offset, LEN as u64)?);
            Ok(match self.byte_order {
                ByteOrder::LittleEndian => <$type>::from_le_bytes(n),
                ByteOrder::BigEndian => <$type>::from_be_bytes(n),
            })
        }
    };
}

/// A view over a byte buffer that remembers where it sits in the outermost buffer.
///
/// Offsets passed to the read functions are relative to the start of the view. The `origin`
/// translates them into absolute positions for labelling, so that a TIFF structure nested in an
/// APP1 segment nested in a file is still reported at its place in the file.
#[derive(Clone, Copy, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    origin: usize,
    byte_order: ByteOrder,
}

impl<'a> ByteCursor<'a> {
    /// Wraps a buffer. Multi-byte reads default to big endian, as JPEG framing is.
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor {
            data,
            origin: 0,
            byte_order: ByteOrder::BigEndian,
        }
    }

    pub fn with_byte_order(self, byte_order: ByteOrder) -> Self {
        ByteCursor { byte_order, ..self }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Absolute position of the first byte of this view.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// A fresh, self-relative view starting at `start` and keeping the byte order.
    pub fn subview(&self, start: usize) -> WalkResult<ByteCursor<'a>> {
        let data = self.data.get(start..).ok_or(Malformed::Truncated {
            offset: start as u64,
            len: 0,
            available: self.data.len(),
        })?;

        Ok(ByteCursor {
            data,
            origin: self.origin + start,
            byte_order: self.byte_order,
        })
    }

    /// A view of `len` bytes at `start`.
    pub fn window(&self, start: usize, len: usize) -> WalkResult<ByteCursor<'a>> {
        let bytes = self.bytes(start as u64, len as u64)?;
        Ok(ByteCursor {
            data: bytes,
            origin: self.origin + start,
            byte_order: self.byte_order,
        })
    }

    /// Translate a relative range into an absolute one, clamped to the view.
    pub fn absolute(&self, offset: u64, len: u64) -> Range<usize> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        let end = usize::try_from(offset.saturating_add(len))
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        self.origin + start..self.origin + end
    }

    /// Borrow `len` bytes at `offset`.
    pub fn bytes(&self, offset: u64, len: u64) -> WalkResult<&'a [u8]> {
        let truncated = || Malformed::Truncated {
            offset,
            len,
            available: self.data.len(),
        };

        let start = usize::try_from(offset).map_err(|_| truncated())?;
        let len = usize::try_from(len).map_err(|_| truncated())?;
        let end = start.checked_add(len).ok_or_else(truncated)?;
        self.data.get(start..end).ok_or_else(truncated)
    }

    pub fn read_u8(&self, offset: u64) -> WalkResult<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    read_fn!(read_u16, u16);
    read_fn!(read_u32, u32);
    read_fn!(read_i32, i32);

    /// Reads a NUL terminated string starting at `offset`, without the terminator.
    pub fn read_stringz(&self, offset: u64) -> WalkResult<&'a [u8]> {
        let rest = usize::try_from(offset)
            .ok()
            .and_then(|start| self.data.get(start..))
            .ok_or(Malformed::Truncated {
                offset,
                len: 1,
                available: self.data.len(),
            })?;

        match rest.iter().position(|&b| b == 0) {
            Some(end) => Ok(&rest[..end]),
            None => Err(Malformed::Truncated {
                offset,
                len: rest.len() as u64 + 1,
                available: self.data.len(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_follow_byte_order() {
        let data = [0x01, 0x00, 0x00, 0x00];
        let le = ByteCursor::new(&data).with_byte_order(ByteOrder::LittleEndian);
        let be = ByteCursor::new(&data).with_byte_order(ByteOrder::BigEndian);

        assert_eq!(le.read_u32(0).unwrap(), 1);
        assert_eq!(be.read_u32(0).unwrap(), 16_777_216);
        assert_eq!(le.read_u16(0).unwrap(), 1);
        assert_eq!(be.read_u16(0).unwrap(), 0x0100);
    }

    #[test]
    fn out_of_bounds_is_truncation() {
        let data = [0u8; 6];
        let cursor = ByteCursor::new(&data);

        assert!(cursor.read_u32(2).is_ok());
        assert_eq!(
            cursor.read_u32(3),
            Err(Malformed::Truncated {
                offset: 3,
                len: 4,
                available: 6
            })
        );
        assert!(cursor.read_u16(u64::MAX).is_err());
    }

    #[test]
    fn subview_translates_ranges() {
        let data = *b"Exif\0\0II*\0";
        let cursor = ByteCursor::new(&data);
        let tiff = cursor.subview(6).unwrap();

        assert_eq!(tiff.len(), 4);
        assert_eq!(tiff.origin(), 6);
        assert_eq!(tiff.absolute(2, 2), 8..10);
        // Clamped to the end of the view.
        assert_eq!(tiff.absolute(2, 100), 8..10);
        assert!(cursor.subview(11).is_err());
    }

    #[test]
    fn stringz() {
        let data = *b"Exif\0\0";
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_stringz(0).unwrap(), b"Exif");
        assert_eq!(cursor.read_stringz(4).unwrap(), b"");
        assert!(ByteCursor::new(b"Exif").read_stringz(0).is_err());
    }

    #[test]
    fn marker() {
        assert_eq!(ByteOrder::from_marker(*b"II"), Some(ByteOrder::LittleEndian));
        assert_eq!(ByteOrder::from_marker(*b"MM"), Some(ByteOrder::BigEndian));
        assert_eq!(ByteOrder::from_marker(*b"IM"), None);
    }
}
