use nom::{
    bytes::complete::take,
    error::{context, VerboseError, VerboseErrorKind},
    number::complete::u8,
    Err, IResult,
};

use crate::error::{EbmlError, Result};

/// Widest variable length integer EBML allows.
pub const MAX_WIDTH: usize = 8;

/// Decoded variable length integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vint {
    /// Amount of bytes the integer occupies.
    pub width: usize,
    /// Raw value, for IDs including the marker bit.
    pub value: u64,
    /// All value bits are set, which means "unknown length" for sizes.
    pub unknown: bool,
}

impl Vint {
    /// The value unless it encodes the reserved unknown length.
    pub fn known(&self) -> Option<u64> {
        if self.unknown {
            None
        } else {
            Some(self.value)
        }
    }

    /// Interpret as a signed integer, biased by half the range of the width.
    ///
    /// Used by the size differences in EBML lacing.
    pub fn signed(&self) -> i64 {
        let bias = (1i64 << (7 * self.width - 1)) - 1;

        self.value as i64 - bias
    }
}

/// Nom parser for an element ID, keeping the marker bit.
pub fn id_vint(i: &[u8]) -> IResult<&[u8], Vint, VerboseError<&[u8]>> {
    vint(i, true)
}

/// Nom parser for a size or value, clearing the marker bit.
pub fn size_vint(i: &[u8]) -> IResult<&[u8], Vint, VerboseError<&[u8]>> {
    vint(i, false)
}

/// Nom parser for a variable length integer.
///
/// The width is the amount of leading zero bits of the first byte plus one. For IDs the marker
/// bit is part of the value, for sizes and other values it's cleared. A width above 8 is a
/// [`Err::Failure`] so it can be told apart from input that simply ran out.
fn vint(input: &[u8], is_id: bool) -> IResult<&[u8], Vint, VerboseError<&[u8]>> {
    let (i, first) = context("vint length descriptor", u8)(input)?;

    let width = first.leading_zeros() as usize + 1;
    if width > MAX_WIDTH {
        return Err(Err::Failure(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context("vint width"))],
        }));
    }

    let (i, rest) = context("vint data", take(width - 1))(i)?;

    let first = if is_id {
        first
    } else {
        first & !(0x80 >> (width - 1))
    };
    let value = rest
        .iter()
        .fold(first as u64, |value, &byte| (value << 8) | byte as u64);

    let unknown = !is_id && value == (1u64 << (7 * width)) - 1;

    Ok((
        i,
        Vint {
            width,
            value,
            unknown,
        },
    ))
}

/// Read a variable length integer at the offset.
///
/// `Ok(None)` when the buffer ends before the integer does.
pub fn read_vint(bytes: &[u8], offset: usize, is_id: bool) -> Result<Option<Vint>> {
    let i = match bytes.get(offset..) {
        Some(i) => i,
        None => return Ok(None),
    };

    match vint(i, is_id) {
        Ok((_, vint)) => Ok(Some(vint)),
        Err(Err::Failure(_)) => Err(EbmlError::InvalidVintWidth { offset }),
        Err(_) => Ok(None),
    }
}

/// Read an element ID, keeping the marker bit.
pub fn read_id(bytes: &[u8], offset: usize) -> Result<Option<Vint>> {
    read_vint(bytes, offset, true)
}

/// Read an element data size.
pub fn read_size(bytes: &[u8], offset: usize) -> Result<Option<Vint>> {
    read_vint(bytes, offset, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte() {
        let vint = read_size(&[0x81], 0).unwrap().unwrap();
        assert_eq!(vint.width, 1);
        assert_eq!(vint.value, 1);
        assert_eq!(vint.known(), Some(1));
    }

    #[test]
    fn test_size_vs_id() {
        let size = read_size(&[0x40, 0x7B], 0).unwrap().unwrap();
        assert_eq!(size.width, 2);
        assert_eq!(size.value, 123);

        let id = read_id(&[0x40, 0x7B], 0).unwrap().unwrap();
        assert_eq!(id.width, 2);
        assert_eq!(id.value, 0x407B);
        assert!(!id.unknown);
    }

    #[test]
    fn test_four_byte_id() {
        let id = read_id(&[0x1A, 0x45, 0xDF, 0xA3], 0).unwrap().unwrap();
        assert_eq!(id.width, 4);
        assert_eq!(id.value, crate::ids::EBML);
    }

    #[test]
    fn test_unknown_length() {
        let size = read_size(&[0xFF], 0).unwrap().unwrap();
        assert!(size.unknown);
        assert_eq!(size.known(), None);

        let size = read_size(&[0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF], 0)
            .unwrap()
            .unwrap();
        assert_eq!(size.width, 8);
        assert!(size.unknown);

        // One below all ones is a regular value
        let size = read_size(&[0x7F, 0xFE], 0).unwrap().unwrap();
        assert!(!size.unknown);
        assert_eq!(size.value, 0x3FFE);
    }

    #[test]
    fn test_invalid_width() {
        assert!(matches!(
            read_size(&[0x00, 0x01], 0),
            Err(EbmlError::InvalidVintWidth { offset: 0 })
        ));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(read_size(&[0x40], 0).unwrap(), None);
        assert_eq!(read_size(&[], 0).unwrap(), None);
        assert_eq!(read_size(&[0x81], 5).unwrap(), None);
    }

    #[test]
    fn test_offset() {
        let size = read_size(&[0xAA, 0xBB, 0x82], 2).unwrap().unwrap();
        assert_eq!(size.value, 2);
    }

    #[test]
    fn test_signed() {
        // Width 1 has a bias of 63
        let vint = read_size(&[0x80 | 63], 0).unwrap().unwrap();
        assert_eq!(vint.signed(), 0);
        let vint = read_size(&[0x80 | 60], 0).unwrap().unwrap();
        assert_eq!(vint.signed(), -3);

        // Width 2 has a bias of 8191
        let vint = read_size(&[0x60, 0x00], 0).unwrap().unwrap();
        assert_eq!(vint.signed(), 0x2000 - 8191);
    }
}
