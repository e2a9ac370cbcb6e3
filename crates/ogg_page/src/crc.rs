/// Generator polynomial used by Ogg, processed MSB-first.
const POLYNOMIAL: u32 = 0x04c1_1db7;

/// Lookup table, one entry per possible byte value.
static TABLE: [u32; 256] = table();

const fn table() -> [u32; 256] {
    let mut table = [0u32; 256];

    let mut i = 0;
    while i < 256 {
        let mut r = (i as u32) << 24;

        let mut bit = 0;
        while bit < 8 {
            r = if r & 0x8000_0000 != 0 {
                (r << 1) ^ POLYNOMIAL
            } else {
                r << 1
            };
            bit += 1;
        }

        table[i] = r;
        i += 1;
    }

    table
}

/// Calculate the Ogg CRC32 of the bytes.
///
/// Zero initial value and no final xor, so the checksum of a page must be calculated with its
/// checksum field set to zero.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32_update(0, bytes)
}

/// Continue a checksum over more bytes.
pub fn crc32_update(crc: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(crc, |crc, &byte| {
        (crc << 8) ^ TABLE[((crc >> 24) as u8 ^ byte) as usize]
    })
}

#[cfg(test)]
mod tests {
    use super::{crc32, crc32_update, TABLE};

    #[test]
    fn test_table() {
        assert_eq!(TABLE[0], 0);
        assert_eq!(TABLE[1], 0x04c1_1db7);
        assert_eq!(TABLE[255], 0xb1f7_40b4);
    }

    #[test]
    fn test_check_value() {
        // CRC-32/CKSUM parameters without the final inversion
        assert_eq!(crc32(b"123456789"), !0x765e_7680);
    }

    #[test]
    fn test_update_in_parts() {
        assert_eq!(crc32_update(crc32(b"1234"), b"56789"), crc32(b"123456789"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(crc32(&[]), 0);
    }
}
