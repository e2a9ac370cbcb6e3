//! Decoders for the data of leaf elements.

/// Big-endian unsigned integer of any width up to 8 bytes.
pub fn read_uint(data: &[u8]) -> Option<u64> {
    if data.len() > 8 {
        return None;
    }

    Some(
        data.iter()
            .fold(0u64, |value, &byte| (value << 8) | byte as u64),
    )
}

/// IEEE 754 float of 4 or 8 bytes, an empty element means 0.
pub fn read_float(data: &[u8]) -> Option<f64> {
    match data.len() {
        0 => Some(0.0),
        4 => Some(f32::from_be_bytes(data.try_into().ok()?) as f64),
        8 => Some(f64::from_be_bytes(data.try_into().ok()?)),
        _ => None,
    }
}

/// String element, stopping at the first null byte padding it.
pub fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&byte| byte == 0).unwrap_or(data.len());

    String::from_utf8_lossy(&data[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint() {
        assert_eq!(read_uint(&[]), Some(0));
        assert_eq!(read_uint(&[0x02]), Some(2));
        assert_eq!(read_uint(&[0xBB, 0x80]), Some(48000));
        assert_eq!(read_uint(&[0; 9]), None);
    }

    #[test]
    fn test_float() {
        assert_eq!(read_float(&48000f32.to_be_bytes()), Some(48000.0));
        assert_eq!(read_float(&44100f64.to_be_bytes()), Some(44100.0));
        assert_eq!(read_float(&[1, 2, 3]), None);
    }

    #[test]
    fn test_string() {
        assert_eq!(read_string(b"A_OPUS"), "A_OPUS");
        assert_eq!(read_string(b"A_OPUS\0\0"), "A_OPUS");
        assert_eq!(read_string(b""), "");
    }
}
