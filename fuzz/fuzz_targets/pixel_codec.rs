#![no_main]

use codec::{channel_values, decode_payload, BitsPerPixel};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let bits = BitsPerPixel::SUPPORTED[usize::from(selector) % BitsPerPixel::SUPPORTED.len()];
    let Ok(mode) = BitsPerPixel::new(bits) else {
        return;
    };

    // Arbitrary channel bytes must decode without panicking.
    let _ = decode_payload(payload, mode);

    // Encoded payloads decode back to themselves up to trailing zeros.
    let channels = channel_values(payload, mode);
    let decoded = decode_payload(&channels, mode);
    if !mode.is_monochrome() {
        let trimmed = payload.len() - payload.iter().rev().take_while(|&&b| b == 0).count();
        assert_eq!(&decoded[..trimmed.min(decoded.len())], &payload[..trimmed.min(decoded.len())]);
    }
});
