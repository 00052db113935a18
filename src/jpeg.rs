//! Marker segment framing of JPEG files
//!
//! Only enough of the format is understood to find the APP1 segments. Everything else is
//! labelled by marker and length, and entropy-coded data is skipped over as one opaque range.

use crate::cursor::ByteCursor;
use crate::dissector::ExifDissector;
use crate::error::Malformed;
use crate::tree::{Dissection, Item};

pub mod marker {
    /// The first byte of a marker.
    pub const P: u8 = 0xff;
    /// Not a marker but a stuffed zero byte within entropy-coded data.
    pub const Z: u8 = 0x00;
    pub const TEM: u8 = 0x01;
    pub const RST0: u8 = 0xd0;
    pub const RST7: u8 = 0xd7;
    pub const SOI: u8 = 0xd8;
    pub const EOI: u8 = 0xd9;
    pub const SOS: u8 = 0xda;
    pub const APP1: u8 = 0xe1;
}

const APP: [&str; 16] = [
    "APP0", "APP1", "APP2", "APP3", "APP4", "APP5", "APP6", "APP7", "APP8", "APP9", "APP10",
    "APP11", "APP12", "APP13", "APP14", "APP15",
];

const RST: [&str; 8] = ["RST0", "RST1", "RST2", "RST3", "RST4", "RST5", "RST6", "RST7"];

/// The short name of a marker code, the byte following `0xFF`.
pub fn marker_name(code: u8) -> &'static str {
    match code {
        marker::TEM => "TEM",
        0xc0 => "SOF0",
        0xc1 => "SOF1",
        0xc2 => "SOF2",
        0xc3 => "SOF3",
        0xc4 => "DHT",
        0xc5 => "SOF5",
        0xc6 => "SOF6",
        0xc7 => "SOF7",
        0xc8 => "JPG",
        0xc9 => "SOF9",
        0xca => "SOF10",
        0xcb => "SOF11",
        0xcc => "DAC",
        0xcd => "SOF13",
        0xce => "SOF14",
        0xcf => "SOF15",
        marker::RST0..=marker::RST7 => RST[usize::from(code - marker::RST0)],
        marker::SOI => "SOI",
        marker::EOI => "EOI",
        marker::SOS => "SOS",
        0xdb => "DQT",
        0xdc => "DNL",
        0xdd => "DRI",
        0xde => "DHP",
        0xdf => "EXP",
        0xe0..=0xef => APP[usize::from(code - 0xe0)],
        0xfe => "COM",
        0xf0..=0xfd => "JPGn",
        _ => "RES",
    }
}

/// Markers without a length field.
fn is_standalone(code: u8) -> bool {
    matches!(code, marker::TEM | marker::RST0..=marker::RST7 | marker::SOI)
}

/// Append the marker segments of the JPEG file in `cursor` to `level`.
pub(crate) fn frame(
    dissector: &ExifDissector,
    cursor: ByteCursor<'_>,
    level: &mut Vec<Item>,
    out: &mut Dissection,
) {
    if cursor.bytes(0, 2).ok() != Some(&[marker::P, marker::SOI][..]) {
        out.report(Malformed::NotJpeg, cursor.absolute(0, 2));
        return;
    }
    level.push(Item::new("Start of Image", cursor.absolute(0, 2)));

    let len = cursor.len() as u64;
    let mut pos = 2u64;

    while pos < len {
        // Anything that is not a marker at this point is out of sync.
        let sync = scan(&cursor, pos, |code| code != marker::Z);
        if sync > pos {
            level.push(Item::new("Unexpected data", cursor.absolute(pos, sync - pos)));
        }

        // Fill bytes may precede the marker code.
        let mut at = sync + 1;
        while cursor.read_u8(at).ok() == Some(marker::P) {
            at += 1;
        }
        let code = match cursor.read_u8(at) {
            Ok(code) => code,
            Err(kind) => {
                report(out, &cursor, kind);
                return;
            }
        };
        let start = sync;
        let name = marker_name(code);
        tracing::trace!(offset = start, name, "marker");

        if code == marker::EOI {
            level.push(Item::new("End of Image", cursor.absolute(start, at + 1 - start)));
            return;
        }
        if is_standalone(code) {
            level.push(Item::new(
                format!("Marker: {name} (0xFF{code:02X})"),
                cursor.absolute(start, at + 1 - start),
            ));
            pos = at + 1;
            continue;
        }

        let length_at = at + 1;
        let length = match cursor.read_u16(length_at) {
            Ok(length) => u64::from(length),
            Err(kind) => {
                report(out, &cursor, kind);
                return;
            }
        };
        let end = length_at + length;

        let mut segment = Item::new(
            format!("Marker segment: {name} (0xFF{code:02X})"),
            cursor.absolute(start, end - start),
        );
        segment.push(Item::new(
            format!("Length: {length}"),
            cursor.absolute(length_at, 2),
        ));

        if length < 2 || end > len {
            level.push(segment);
            out.report(
                Malformed::Truncated {
                    offset: length_at,
                    len: length,
                    available: cursor.len(),
                },
                cursor.absolute(length_at, 2),
            );
            return;
        }

        let payload_at = length_at + 2;
        let payload_len = length - 2;
        match cursor.window(payload_at as usize, payload_len as usize) {
            Ok(payload) if code == marker::APP1 => {
                dissector.app1_into(payload, &mut segment.children, out);
            }
            Ok(_) if payload_len > 0 => {
                segment.push(Item::new(
                    "Segment data",
                    cursor.absolute(payload_at, payload_len),
                ));
            }
            Ok(_) => {}
            Err(kind) => out.report(kind, cursor.absolute(payload_at, payload_len)),
        }
        level.push(segment);
        pos = end;

        if code == marker::SOS {
            // Entropy-coded data runs up to the next marker other than a stuffed zero or restart.
            let data_end = scan(&cursor, pos, |code| {
                !matches!(code, marker::Z | marker::RST0..=marker::RST7)
            });
            if data_end > pos {
                level.push(Item::new(
                    "Entropy-coded segment",
                    cursor.absolute(pos, data_end - pos),
                ));
            }
            pos = data_end;
        }
    }

    out.report(
        Malformed::Truncated {
            offset: len,
            len: 2,
            available: cursor.len(),
        },
        cursor.absolute(len, 0),
    );
}

/// Find the first marker at or after `from` whose code is accepted by `is_marker`, or the end of
/// the data. A marker starts with its fill bytes.
fn scan(cursor: &ByteCursor<'_>, from: u64, is_marker: impl Fn(u8) -> bool) -> u64 {
    let data = cursor
        .bytes(from, (cursor.len() as u64).saturating_sub(from))
        .unwrap_or(&[]);
    data.windows(2)
        .position(|pair| pair[0] == marker::P && pair[1] != marker::P && is_marker(pair[1]))
        .map(|mut at| {
            // Include the fill bytes before the marker.
            while at > 0 && data[at - 1] == marker::P {
                at -= 1;
            }
            at
        })
        .or_else(|| {
            // A trailing 0xFF, or a run of them, still starts a marker.
            data.iter()
                .rposition(|&b| b != marker::P)
                .map_or(Some(0), |last| (last + 1 < data.len()).then_some(last + 1))
        })
        .map_or(cursor.len() as u64, |at| from + at as u64)
}

fn report(out: &mut Dissection, cursor: &ByteCursor<'_>, kind: Malformed) {
    let range = match kind {
        Malformed::Truncated { offset, len, .. } => cursor.absolute(offset, len),
        _ => cursor.absolute(0, 0),
    };
    out.report(kind, range);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(marker_name(0xd8), "SOI");
        assert_eq!(marker_name(0xe1), "APP1");
        assert_eq!(marker_name(0xef), "APP15");
        assert_eq!(marker_name(0xd3), "RST3");
        assert_eq!(marker_name(0xc4), "DHT");
        assert_eq!(marker_name(0xc2), "SOF2");
        assert_eq!(marker_name(0xfe), "COM");
    }

    #[test]
    fn scan_skips_stuffing() {
        let data = [0x12, 0xff, 0x00, 0x34, 0xff, 0xd0, 0x56, 0xff, 0xff, 0xd9];
        let cursor = ByteCursor::new(&data);

        assert_eq!(scan(&cursor, 0, |_| true), 1);
        assert_eq!(
            scan(&cursor, 0, |code| !matches!(code, marker::Z | marker::RST0..=marker::RST7)),
            7
        );
        assert_eq!(scan(&cursor, 3, |code| code == 0xaa), 10);
    }
}
