use bitstream::BitCursor;

#[test]
fn walking_past_end_never_panics() {
    let payload = [0xFFu8];
    let mut cursor = BitCursor::new();
    for _ in 0..32 {
        let _ = cursor.masked_bit(&payload);
        cursor.advance(1);
    }
    assert!(cursor.is_at_end(payload.len()));
    assert_eq!(cursor.bits_remaining(payload.len()), 0);
}

#[test]
fn threaded_through_helper_by_reference() {
    fn take_nibble(data: &[u8], cursor: &mut BitCursor) -> u8 {
        let mut value = 0;
        for _ in 0..4 {
            match cursor.masked_bit(data) {
                Some(bit) => value |= bit,
                None => break,
            }
            cursor.advance(1);
        }
        value
    }

    let payload = [0xAB];
    let mut cursor = BitCursor::new();
    assert_eq!(take_nibble(&payload, &mut cursor), 0xA0);
    assert_eq!(take_nibble(&payload, &mut cursor), 0x0B);
    assert_eq!(take_nibble(&payload, &mut cursor), 0x00);
    assert!(cursor.is_at_end(payload.len()));
}
