//! Dissection of Exif segments and the TIFF structures inside of them

use crate::cursor::ByteCursor;
use crate::tags::Vocabulary;
use crate::tree::{Dissection, Item};

use self::header::field_of;
use self::walker::IfdWalker;

mod entry;
mod header;
mod walker;

pub use self::entry::{Entry, Placement, Value, ENTRY_LEN};
pub use self::header::{TiffHeader, HEADER_LEN, TIFF_MAGIC};

/// The identifier an APP1 segment carries when its payload is Exif.
pub const EXIF_IDENTIFIER: &[u8] = b"Exif";

/// Rendering limits
#[derive(Clone, Debug)]
pub struct Limits {
    /// The maximum number of value elements rendered for one entry, the default is 1024. Further
    /// elements are summarised by one item. For byte runs this bounds the number of bytes shown.
    pub rendered_values: usize,
    /// The purpose of this is to prevent all the fields of the struct from
    /// being public, as this would make adding new fields a major version
    /// bump.
    _non_exhaustive: (),
}

impl Limits {
    /// A configuration that renders every value.
    pub fn unlimited() -> Limits {
        Limits {
            rendered_values: usize::MAX,
            _non_exhaustive: (),
        }
    }

    /// The default limits with a different bound on rendered values.
    pub fn with_rendered_values(mut self, rendered_values: usize) -> Limits {
        self.rendered_values = rendered_values;
        self
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            rendered_values: 1024,
            _non_exhaustive: (),
        }
    }
}

/// The representation of an Exif dissector
///
/// One dissector can be reused for any number of buffers, each call produces a fresh
/// [`Dissection`]. Malformed input never fails a call, it is reported as findings instead.
#[derive(Clone, Debug, Default)]
pub struct ExifDissector {
    limits: Limits,
    check_magic: bool,
    revisit_guard: bool,
}

impl ExifDissector {
    pub fn new() -> ExifDissector {
        ExifDissector::default()
    }

    pub fn with_limits(mut self, limits: Limits) -> ExifDissector {
        self.limits = limits;
        self
    }

    /// Require the TIFF fixed value to be 42, stopping at the header otherwise.
    pub fn with_magic_check(mut self, check_magic: bool) -> ExifDissector {
        self.check_magic = check_magic;
        self
    }

    /// Track the directories visited within one TIFF structure and stop any branch that reaches
    /// one of them again.
    pub fn with_revisit_guard(mut self, revisit_guard: bool) -> ExifDissector {
        self.revisit_guard = revisit_guard;
        self
    }

    /// Dissect the payload of an APP1 segment, starting with its identifier.
    pub fn dissect_app1(&self, data: &[u8]) -> Dissection {
        let mut out = Dissection::new();
        let mut items = Vec::new();
        self.app1_into(ByteCursor::new(data), &mut items, &mut out);
        out.items = items;
        out
    }

    /// Dissect a bare TIFF structure, starting with its header.
    pub fn dissect_tiff(&self, data: &[u8]) -> Dissection {
        let mut out = Dissection::new();
        let mut items = Vec::new();
        self.tiff_into(ByteCursor::new(data), &mut items, &mut out);
        out.items = items;
        out
    }

    /// Dissect a JPEG file, handing every APP1 segment to [`ExifDissector::dissect_app1`].
    pub fn dissect_jpeg(&self, data: &[u8]) -> Dissection {
        let mut out = Dissection::new();
        let mut items = Vec::new();
        crate::jpeg::frame(self, ByteCursor::new(data), &mut items, &mut out);
        out.items = items;
        out
    }

    /// Append the items of an APP1 payload to `level`.
    pub(crate) fn app1_into(
        &self,
        cursor: ByteCursor<'_>,
        level: &mut Vec<Item>,
        out: &mut Dissection,
    ) {
        let identifier = match cursor.read_stringz(0) {
            Ok(identifier) => identifier,
            Err(kind) => {
                out.report(kind, cursor.absolute(0, cursor.len() as u64));
                return;
            }
        };

        if identifier != EXIF_IDENTIFIER {
            let end = identifier.len() as u64 + 1;
            level.push(Item::new(
                format!(
                    "Unknown identifier: {}",
                    String::from_utf8_lossy(identifier).escape_default()
                ),
                cursor.absolute(0, end),
            ));
            if (end as usize) < cursor.len() {
                level.push(Item::new(
                    "Remaining segment data",
                    cursor.absolute(end, cursor.len() as u64 - end),
                ));
            }
            return;
        }

        level.push(Item::new("Identifier: Exif", cursor.absolute(0, 5)));
        match cursor.read_u8(5) {
            Ok(reserved) => level.push(Item::new(
                format!("Reserved: 0x{reserved:02x}"),
                cursor.absolute(5, 1),
            )),
            Err(kind) => {
                out.report(kind, cursor.absolute(5, 1));
                return;
            }
        }

        match cursor.subview(6) {
            Ok(tiff) => self.tiff_into(tiff, level, out),
            Err(kind) => out.report(kind, cursor.absolute(6, 0)),
        }
    }

    /// Append the items of a TIFF structure to `level`. Offsets within it are relative to the
    /// start of `cursor`.
    pub(crate) fn tiff_into(
        &self,
        cursor: ByteCursor<'_>,
        level: &mut Vec<Item>,
        out: &mut Dissection,
    ) {
        let mut item = Item::new("TIFF Header", cursor.absolute(0, HEADER_LEN));
        let header = TiffHeader::read_into(&cursor, &mut item).and_then(|header| {
            if self.check_magic {
                header.check_magic()?;
            }
            Ok(header)
        });
        level.push(item);

        let header = match header {
            Ok(header) => header,
            Err(kind) => {
                let field = field_of(&kind);
                let range = cursor.absolute(field.start, field.end - field.start);
                out.report(kind, range);
                return;
            }
        };

        tracing::debug!(
            byte_order = ?header.byte_order,
            first_ifd = header.first_ifd,
            "tiff header"
        );
        out.byte_order = Some(header.byte_order);

        let cursor = cursor.with_byte_order(header.byte_order);
        let mut walker = IfdWalker::new(cursor, &self.limits, out, self.revisit_guard);
        walker.walk_chain(level, header.first_ifd.into(), Vocabulary::Tiff);
    }
}
