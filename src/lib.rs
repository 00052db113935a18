//! Dissection of Exif metadata
//!
//! Exif metadata is a TIFF structure, a chain of Image File Directories, carried in the APP1
//! segment of a JPEG file. This crate walks that structure and labels every byte range it
//! understands, the way a protocol analyzer presents a packet. It does not build a metadata
//! object from the values it reads.
//!
//! Malformed input is expected. Every problem is attached to the byte range it was found at as a
//! [`Finding`] and only stops the part of the walk it occurred in.
//!
//! ```
//! use exif_dissect::ExifDissector;
//!
//! let segment = b"Exif\0\0II\x2a\x00\x08\x00\x00\x00\
//!     \x01\x00\x12\x01\x03\x00\x01\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x00";
//! let dissection = ExifDissector::new().dissect_app1(segment);
//!
//! assert!(dissection.is_clean());
//! assert_eq!(dissection.find("Orientation").unwrap().range, 16..28);
//! ```
//!
//! # Related Links
//! * <https://web.archive.org/web/20210108073850/https://www.adobe.io/open/standards/TIFF.html> - The TIFF specification
//! * <https://www.cipa.jp/std/documents/e/DC-008-2012_E.pdf> - Exif 2.3

mod cursor;
pub mod dissector;
mod error;
pub mod jpeg;
pub mod tags;
mod tree;

pub use self::cursor::{ByteCursor, ByteOrder};
pub use self::dissector::{ExifDissector, Limits};
pub use self::error::{Malformed, WalkResult};
pub use self::tree::{Dissection, Finding, Item, Iter, Severity};
