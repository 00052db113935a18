use quick_error::quick_error;

quick_error! {
    /// Malformations detected while walking an Exif segment.
    ///
    /// None of these abort the enclosing dissection. Each one is attached to the byte range it
    /// was found at as a [`Finding`](crate::Finding) and only stops the sub-walk it occurred in.
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum Malformed {
        /// The byte order marker is neither `II` nor `MM`.
        InvalidEndianness(marker: u16) {
            display("Invalid TIFF byte order marker 0x{:04x}", marker)
        }
        /// The fixed header value is not 42. Only raised when the check is enabled.
        InvalidMagic(value: u16) {
            display("Invalid TIFF fixed value {} (expected 42)", value)
        }
        /// The first IFD would start inside the 8 byte header.
        BogusFirstIfdOffset(offset: u32) {
            display("Bogus first IFD offset {}, must be at least 8", offset)
        }
        /// A next-IFD pointer does not point past its own field.
        InvalidNextIfdOffset { offset: u32, field: u64 } {
            display("Invalid next IFD offset {} at {}, must point forward", offset, field)
        }
        /// A sub-IFD pointer lies outside of the segment.
        InvalidSubIfdOffset { tag: u16, offset: u32 } {
            display("Invalid offset {} for sub-IFD pointer 0x{:04x}", offset, tag)
        }
        /// An external value lies outside of the segment.
        InvalidValueOffset(offset: u32) {
            display("Invalid value offset {}", offset)
        }
        /// A directory was reached a second time. Only raised when the guard is enabled.
        RevisitedIfd(offset: u64) {
            display("IFD at offset {} was already visited", offset)
        }
        /// A read ran past the end of the buffer.
        Truncated { offset: u64, len: u64, available: usize } {
            display("Truncated: {} bytes at {} exceed buffer of {} bytes", len, offset, available)
        }
        /// The buffer does not start with an SOI marker.
        NotJpeg {
            display("Missing JPEG start of image marker")
        }
    }
}

impl Malformed {
    /// Whether the finding describes broken framing rather than a bad value.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Malformed::Truncated { .. } | Malformed::NotJpeg)
    }
}

/// Result of one step of the walk.
pub type WalkResult<T> = Result<T, Malformed>;

#[cfg(test)]
mod tests {
    use super::Malformed;

    #[test]
    fn display_names_offsets() {
        let err = Malformed::InvalidNextIfdOffset {
            offset: 4,
            field: 26,
        };
        assert_eq!(
            err.to_string(),
            "Invalid next IFD offset 4 at 26, must point forward"
        );
        assert_eq!(
            Malformed::InvalidEndianness(0x4949 ^ 0xff).to_string(),
            "Invalid TIFF byte order marker 0x49b6"
        );
    }

    #[test]
    fn truncation_kinds() {
        let truncated = Malformed::Truncated {
            offset: 8,
            len: 2,
            available: 9,
        };
        assert!(truncated.is_truncation());
        assert!(!Malformed::InvalidValueOffset(100).is_truncation());
    }
}
