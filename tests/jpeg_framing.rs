use exif_dissect::{ExifDissector, Item, Malformed, Severity};

/// A marker segment with its length field.
fn segment(code: u8, payload: &[u8]) -> Vec<u8> {
    let mut data = vec![0xff, code];
    data.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
    data.extend_from_slice(payload);
    data
}

fn jpeg(parts: &[&[u8]]) -> Vec<u8> {
    let mut data = vec![0xff, 0xd8];
    for part in parts {
        data.extend_from_slice(part);
    }
    data
}

fn labels(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}

const JFIF: &[u8] = b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00";

/// An Exif payload with a little endian IFD0 holding one Orientation entry.
const EXIF: &[u8] = b"Exif\0\0II\x2a\x00\x08\x00\x00\x00\
    \x01\x00\x12\x01\x03\x00\x01\x00\x00\x00\x06\x00\x00\x00\x00\x00\x00\x00";

#[test]
fn segments_of_a_baseline_file() {
    let data = jpeg(&[
        &segment(0xe0, JFIF),
        &segment(0xe1, EXIF),
        &segment(0xda, &[1, 1, 0, 0, 0x3f, 0]),
        &[0x12, 0xff, 0x00, 0x34, 0xff, 0xd0, 0x56],
        &[0xff, 0xd9],
    ]);
    let out = ExifDissector::new().dissect_jpeg(&data);

    assert!(out.is_clean(), "{out}");
    assert_eq!(
        labels(&out.items),
        [
            "Start of Image",
            "Marker segment: APP0 (0xFFE0)",
            "Marker segment: APP1 (0xFFE1)",
            "Marker segment: SOS (0xFFDA)",
            "Entropy-coded segment",
            "End of Image"
        ]
    );

    let app0 = &out.items[1];
    assert_eq!(app0.range, 2..20);
    assert_eq!(labels(&app0.children), ["Length: 16", "Segment data"]);

    let app1 = &out.items[2];
    assert_eq!(app1.range, 20..56);
    assert_eq!(
        labels(&app1.children),
        [
            "Length: 34",
            "Identifier: Exif",
            "Reserved: 0x00",
            "TIFF Header",
            "Image File Directory #0"
        ]
    );

    // Ranges inside the segment are absolute within the file.
    let orientation = out.find("Orientation").unwrap();
    assert_eq!(orientation.range, 40..52);
    assert_eq!(orientation.child("Value: 6").unwrap().range, 48..50);

    assert_eq!(out.items[4].range, 66..73);
    assert_eq!(out.items[5].range, 73..75);
}

#[test]
fn not_a_jpeg() {
    let out = ExifDissector::new().dissect_jpeg(b"II\x2a\x00\x08\x00\x00\x00");

    assert!(out.items.is_empty());
    assert_eq!(out.findings.len(), 1);
    assert_eq!(out.findings[0].kind, Malformed::NotJpeg);
    assert_eq!(out.findings[0].severity, Severity::Error);
    assert_eq!(out.findings[0].range, 0..2);
}

#[test]
fn fill_bytes_before_markers() {
    let out = ExifDissector::new().dissect_jpeg(b"\xff\xd8\xff\xff\xff\xd9");

    assert!(out.is_clean(), "{out}");
    assert_eq!(labels(&out.items), ["Start of Image", "End of Image"]);
    assert_eq!(out.items[1].range, 2..6);
}

#[test]
fn standalone_markers() {
    let out = ExifDissector::new().dissect_jpeg(b"\xff\xd8\xff\xd0\xff\x01\xff\xd9");

    assert!(out.is_clean(), "{out}");
    assert_eq!(
        labels(&out.items),
        [
            "Start of Image",
            "Marker: RST0 (0xFFD0)",
            "Marker: TEM (0xFF01)",
            "End of Image"
        ]
    );
}

#[test]
fn segment_past_end_of_file() {
    let out = ExifDissector::new().dissect_jpeg(b"\xff\xd8\xff\xe1\x00\x40Exif\0\0");

    assert_eq!(out.items.len(), 2);
    assert_eq!(out.items[1].range, 2..12);
    assert!(matches!(
        out.findings[..],
        [ref finding] if matches!(finding.kind, Malformed::Truncated { offset: 4, len: 64, .. })
    ));
    assert_eq!(out.findings[0].range, 4..6);
}

#[test]
fn segment_length_below_two() {
    let out = ExifDissector::new().dissect_jpeg(b"\xff\xd8\xff\xfe\x00\x01\xff\xd9");

    assert_eq!(out.findings.len(), 1);
    assert!(out.findings[0].kind.is_truncation());
    assert!(out.find("End of Image").is_none());
}

#[test]
fn missing_end_of_image() {
    let data = jpeg(&[&segment(0xfe, b"hi")]);
    let out = ExifDissector::new().dissect_jpeg(&data);

    assert_eq!(
        labels(&out.items),
        ["Start of Image", "Marker segment: COM (0xFFFE)"]
    );
    assert!(matches!(
        out.findings[0].kind,
        Malformed::Truncated {
            offset: 8,
            len: 2,
            ..
        }
    ));
}

#[test]
fn other_app1_payloads() {
    let data = jpeg(&[
        &segment(0xe1, b"http://ns.adobe.com/xap/1.0/\0<x:xmpmeta/>"),
        &[0xff, 0xd9],
    ]);
    let out = ExifDissector::new().dissect_jpeg(&data);

    assert!(out.is_clean(), "{out}");
    let app1 = &out.items[1];
    assert_eq!(
        labels(&app1.children),
        [
            "Length: 43",
            "Unknown identifier: http://ns.adobe.com/xap/1.0/",
            "Remaining segment data"
        ]
    );
}

#[test]
fn broken_exif_does_not_stop_framing() {
    let data = jpeg(&[
        &segment(0xe1, b"Exif\0\0XX\x2a\x00\x08\x00\x00\x00"),
        &segment(0xfe, b"comment"),
        &[0xff, 0xd9],
    ]);
    let out = ExifDissector::new().dissect_jpeg(&data);

    assert_eq!(out.findings.len(), 1);
    assert_eq!(out.findings[0].kind, Malformed::InvalidEndianness(0x5858));
    assert_eq!(out.findings[0].range, 12..14);
    assert_eq!(
        labels(&out.items),
        [
            "Start of Image",
            "Marker segment: APP1 (0xFFE1)",
            "Marker segment: COM (0xFFFE)",
            "End of Image"
        ]
    );
}

#[test]
fn every_exif_segment_is_dissected() {
    let data = jpeg(&[&segment(0xe1, EXIF), &segment(0xe1, EXIF), &[0xff, 0xd9]]);
    let out = ExifDissector::new().dissect_jpeg(&data);

    assert!(out.is_clean(), "{out}");
    let ranges: Vec<_> = out
        .find_all("Orientation")
        .map(|item| item.range.clone())
        .collect();
    assert_eq!(ranges, [22..34, 58..70]);
}
