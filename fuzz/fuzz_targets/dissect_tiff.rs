#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let dissector = exif_dissect::ExifDissector::new()
        .with_limits(exif_dissect::Limits::default().with_rendered_values(64))
        .with_revisit_guard(true);

    let _ = dissector.dissect_tiff(data);
});
