use byteorder::{ByteOrder, LittleEndian};
use nom::{
    bytes::complete::tag,
    error::{context, VerboseError},
    number::complete::{le_i16, le_u16, le_u32, u8},
    IResult,
};

use crate::{error::Result, flags, write_page};

/// Vendor string written into the generated comment header.
pub const VENDOR: &str = "ogg-opus-concat";

const HEAD_MAGIC: &[u8; 8] = b"OpusHead";
const TAGS_MAGIC: &[u8; 8] = b"OpusTags";

/// Opus identification header as carried in the first page of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    pub version: u8,
    pub channels: u8,
    /// Samples at 48kHz to discard from the decoder output at the start.
    pub pre_skip: u16,
    /// Sample rate of the original input, informational only.
    pub sample_rate: u32,
    pub output_gain: i16,
    pub mapping_family: u8,
}

impl OpusHead {
    /// Size of the header with channel mapping family 0.
    pub const SIZE: usize = 19;

    /// Header with gain 0 and mapping family 0.
    pub fn new(channels: u8, pre_skip: u16, sample_rate: u32) -> Self {
        Self {
            version: 1,
            channels,
            pre_skip,
            sample_rate,
            output_gain: 0,
            mapping_family: 0,
        }
    }

    /// Parse the identification header from a packet.
    pub fn parse(packet: &[u8]) -> Result<Self> {
        let (_, head) = opus_head(packet)?;

        Ok(head)
    }

    /// Serialize into the 19 byte packet.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0; Self::SIZE];
        out[..8].copy_from_slice(HEAD_MAGIC);
        out[8] = self.version;
        out[9] = self.channels;
        LittleEndian::write_u16(&mut out[10..12], self.pre_skip);
        LittleEndian::write_u32(&mut out[12..16], self.sample_rate);
        LittleEndian::write_i16(&mut out[16..18], self.output_gain);
        out[18] = self.mapping_family;

        out
    }
}

/// Beginning-of-stream page with the identification header, sequence and granule 0.
pub fn make_opus_head_page(serial: u32, channels: u8, pre_skip: u16, sample_rate: u32) -> Vec<u8> {
    let body = OpusHead::new(channels, pre_skip, sample_rate).to_bytes();

    write_page(flags::BOS, 0, serial, 0, &body)
}

/// Comment header page containing only the vendor string and no comments.
pub fn make_minimal_tags_page(serial: u32, sequence: u32) -> Vec<u8> {
    let vendor_end = TAGS_MAGIC.len() + 4 + VENDOR.len();

    // Zeroed user comment list length at the end
    let mut body = vec![0; vendor_end + 4];
    body[..TAGS_MAGIC.len()].copy_from_slice(TAGS_MAGIC);
    LittleEndian::write_u32(
        &mut body[TAGS_MAGIC.len()..TAGS_MAGIC.len() + 4],
        VENDOR.len() as u32,
    );
    body[TAGS_MAGIC.len() + 4..vendor_end].copy_from_slice(VENDOR.as_bytes());

    write_page(0, 0, serial, sequence, &body)
}

fn opus_head(i: &[u8]) -> IResult<&[u8], OpusHead, VerboseError<&[u8]>> {
    let (i, _) = context("opus head magic", tag(&HEAD_MAGIC[..]))(i)?;
    let (i, version) = context("opus head version", u8)(i)?;
    let (i, channels) = context("opus head channel count", u8)(i)?;
    let (i, pre_skip) = context("opus head pre-skip", le_u16)(i)?;
    let (i, sample_rate) = context("opus head input sample rate", le_u32)(i)?;
    let (i, output_gain) = context("opus head output gain", le_i16)(i)?;
    let (i, mapping_family) = context("opus head channel mapping family", u8)(i)?;

    Ok((
        i,
        OpusHead {
            version,
            channels,
            pre_skip,
            sample_rate,
            output_gain,
            mapping_family,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_page, verify_checksum};

    #[test]
    fn test_opus_head_page() {
        let bytes = make_opus_head_page(1234, 2, 312, 48000);
        let page = parse_page(&bytes, 0).unwrap();

        assert!(page.is_bos());
        assert_eq!(page.sequence, 0);
        assert_eq!(page.granule, 0);
        assert_eq!(page.serial, 1234);
        assert_eq!(page.body_size, OpusHead::SIZE);
        assert!(verify_checksum(&bytes));

        let body = page.body(&bytes);
        assert_eq!(&body[..8], b"OpusHead");
        assert_eq!(body[8], 1);
        assert_eq!(body[9], 2);
        assert_eq!(LittleEndian::read_u16(&body[10..12]), 312);
        assert_eq!(LittleEndian::read_u32(&body[12..16]), 48000);
        assert_eq!(&body[16..19], &[0, 0, 0]);

        assert_eq!(OpusHead::parse(body).unwrap(), OpusHead::new(2, 312, 48000));
    }

    #[test]
    fn test_tags_page() {
        let bytes = make_minimal_tags_page(1234, 1);
        let page = parse_page(&bytes, 0).unwrap();

        assert_eq!(page.header_type, 0);
        assert_eq!(page.sequence, 1);
        assert_eq!(page.granule, 0);

        let body = page.body(&bytes);
        assert_eq!(&body[..8], b"OpusTags");
        assert_eq!(LittleEndian::read_u32(&body[8..12]), VENDOR.len() as u32);
        assert_eq!(&body[12..27], VENDOR.as_bytes());
        assert_eq!(&body[27..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_parse_invalid_head() {
        assert!(OpusHead::parse(b"OpusTags\x01\x02").is_err());
        assert!(OpusHead::parse(b"OpusHead\x01\x02").is_err());
    }
}
