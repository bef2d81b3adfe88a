#![no_main]

use container::{parse_header, BodyDecoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut lines = text.lines();
    let Ok(header) = parse_header(&mut lines) else {
        return;
    };

    let mut body = BodyDecoder::new(&header);
    for line in lines.take(4096) {
        if body.feed(line).is_err() || body.is_finished() {
            return;
        }
    }
    let _ = body.finish();
});
