#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let dissector = exif_dissect::ExifDissector::new()
        .with_limits(exif_dissect::Limits::default().with_rendered_values(64));

    let dissection = dissector.dissect_jpeg(data);
    for item in dissection.iter() {
        assert!(item.range.start <= item.range.end);
        assert!(item.range.end <= data.len());
    }
});
