mod crc;
mod error;
mod opus;

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
pub use crc::{crc32, crc32_update};
pub use error::{PageError, Result};
use nom::{
    bytes::complete::{tag, take},
    error::{context, VerboseError},
    number::complete::{le_i64, le_u32, u8},
    IResult,
};
pub use opus::{make_minimal_tags_page, make_opus_head_page, OpusHead, VENDOR};

/// Capture pattern every page starts with.
pub const MAGIC: &[u8; 4] = b"OggS";
/// Size of the fixed part of the page header, before the segment table.
pub const HEADER_SIZE: usize = 27;
/// Largest body a single page can describe with its segment table.
pub const MAX_BODY_SIZE: usize = 255 * 255;

const GRANULE: Range<usize> = 6..14;
const SERIAL: Range<usize> = 14..18;
const SEQUENCE: Range<usize> = 18..22;
const CHECKSUM: Range<usize> = 22..26;
const HEADER_TYPE: usize = 5;

/// Header type flags.
pub mod flags {
    /// Page starts with the continuation of a packet from the previous page.
    pub const CONTINUATION: u8 = 0x01;
    /// Beginning of stream.
    pub const BOS: u8 = 0x02;
    /// End of stream.
    pub const EOS: u8 = 0x04;
}

/// Parsed view of a page inside a scanned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Stream structure version, always 0 for valid streams.
    pub version: u8,
    /// Header type flag bits.
    pub header_type: u8,
    /// Absolute granule position, -1 when no packet finishes on this page.
    pub granule: i64,
    /// Logical bitstream serial number.
    pub serial: u32,
    /// Page sequence number.
    pub sequence: u32,
    /// Checksum as stored in the page.
    pub checksum: u32,
    /// Amount of entries in the segment table.
    pub segments: u8,
    /// Sum of all segment table entries.
    pub body_size: usize,
    /// Header, segment table and body combined.
    pub page_size: usize,
    /// Where the page starts in the scanned buffer.
    pub offset: usize,
}

impl Page {
    /// Whether this is the first page of a logical bitstream.
    pub fn is_bos(&self) -> bool {
        self.header_type & flags::BOS != 0
    }

    /// Whether this is the last page of a logical bitstream.
    pub fn is_eos(&self) -> bool {
        self.header_type & flags::EOS != 0
    }

    /// Whether the body continues a packet from the previous page.
    pub fn is_continuation(&self) -> bool {
        self.header_type & flags::CONTINUATION != 0
    }

    /// Range of the whole page in the scanned buffer.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.page_size
    }

    /// Range of the body in the scanned buffer.
    pub fn body_range(&self) -> Range<usize> {
        let start = self.offset + HEADER_SIZE + self.segments as usize;

        start..start + self.body_size
    }

    /// The raw bytes of the page, the buffer must be the one it was parsed from.
    pub fn bytes<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.range()]
    }

    /// The body of the page, the buffer must be the one it was parsed from.
    pub fn body<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.body_range()]
    }
}

/// Find the offset of the first capture pattern.
pub fn find_start(bytes: &[u8]) -> Option<usize> {
    bytes.windows(MAGIC.len()).position(|window| window == MAGIC)
}

/// Parse the page starting at the offset.
///
/// `None` when the capture pattern doesn't match or when the buffer ends before the page does,
/// which is how a scan over the buffer terminates.
pub fn parse_page(bytes: &[u8], offset: usize) -> Option<Page> {
    let i = bytes.get(offset..)?;

    match page(i) {
        Ok((_, header)) => Some(Page {
            version: header.version,
            header_type: header.header_type,
            granule: header.granule,
            serial: header.serial,
            sequence: header.sequence,
            checksum: header.checksum,
            segments: header.segments,
            body_size: header.body_size,
            page_size: HEADER_SIZE + header.segments as usize + header.body_size,
            offset,
        }),
        Err(err) => {
            log::trace!("no page at offset {}: {:?}", offset, err);

            None
        }
    }
}

/// Iterate over all consecutive pages starting at the first capture pattern.
pub fn pages(bytes: &[u8]) -> Pages<'_> {
    Pages {
        bytes,
        offset: find_start(bytes),
    }
}

/// Iterator over consecutive pages, see [`pages`].
#[derive(Debug, Clone)]
pub struct Pages<'a> {
    bytes: &'a [u8],
    offset: Option<usize>,
}

impl<'a> Iterator for Pages<'a> {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let page = parse_page(self.bytes, self.offset?);
        self.offset = page.map(|page| page.offset + page.page_size);

        page
    }
}

/// Serialize a complete page with a valid checksum.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn serialize_page(
    header_type: u8,
    granule: i64,
    serial: u32,
    sequence: u32,
    body: &[u8],
) -> Result<Vec<u8>> {
    if body.len() > MAX_BODY_SIZE {
        return Err(PageError::BodyTooLarge(body.len()));
    }

    Ok(write_page(header_type, granule, serial, sequence, body))
}

/// Copy a page out of the buffer while renumbering it into another logical bitstream.
///
/// The granule position is only replaced when one is passed. The end-of-stream flag is always
/// cleared so the result can be appended to.
pub fn rewrite_page(
    buffer: &[u8],
    page: &Page,
    serial: u32,
    sequence: u32,
    granule: Option<i64>,
) -> Vec<u8> {
    let mut out = page.bytes(buffer).to_vec();

    LittleEndian::write_u32(&mut out[SERIAL], serial);
    LittleEndian::write_u32(&mut out[SEQUENCE], sequence);
    if let Some(granule) = granule {
        LittleEndian::write_i64(&mut out[GRANULE], granule);
    }
    out[HEADER_TYPE] &= !flags::EOS;

    update_checksum(&mut out);

    out
}

/// Whether the checksum stored in the raw page matches its contents.
pub fn verify_checksum(page: &[u8]) -> bool {
    if page.len() < HEADER_SIZE {
        return false;
    }

    let stored = LittleEndian::read_u32(&page[CHECKSUM]);

    let mut zeroed = page.to_vec();
    zeroed[CHECKSUM].fill(0);

    crc32(&zeroed) == stored
}

/// Segment table for a body, every entry is 255 except for the last one.
pub fn segment_table(body_size: usize) -> Vec<u8> {
    let segments = (body_size + 254) / 255;

    (0..segments)
        .map(|index| (body_size - index * 255).min(255) as u8)
        .collect()
}

/// Write the page, the body must not be larger than [`MAX_BODY_SIZE`].
pub(crate) fn write_page(
    header_type: u8,
    granule: i64,
    serial: u32,
    sequence: u32,
    body: &[u8],
) -> Vec<u8> {
    debug_assert!(body.len() <= MAX_BODY_SIZE);

    let segments = segment_table(body.len());

    let mut out = vec![0u8; HEADER_SIZE];
    out[..4].copy_from_slice(MAGIC);
    // Version stays 0
    out[HEADER_TYPE] = header_type;
    LittleEndian::write_i64(&mut out[GRANULE], granule);
    LittleEndian::write_u32(&mut out[SERIAL], serial);
    LittleEndian::write_u32(&mut out[SEQUENCE], sequence);
    out[HEADER_SIZE - 1] = segments.len() as u8;

    out.reserve(segments.len() + body.len());
    out.extend_from_slice(&segments);
    out.extend_from_slice(body);

    update_checksum(&mut out);

    out
}

/// Zero the checksum field, then fill it with the checksum of the whole page.
fn update_checksum(page: &mut [u8]) {
    page[CHECKSUM].fill(0);
    let checksum = crc32(page);
    LittleEndian::write_u32(&mut page[CHECKSUM], checksum);
}

/// Fields of the page header that need parsing.
struct RawHeader {
    version: u8,
    header_type: u8,
    granule: i64,
    serial: u32,
    sequence: u32,
    checksum: u32,
    segments: u8,
    body_size: usize,
}

/// Parse a full page, including the presence of the whole body.
fn page(i: &[u8]) -> IResult<&[u8], RawHeader, VerboseError<&[u8]>> {
    let (i, _) = context("capture pattern", tag(&MAGIC[..]))(i)?;
    let (i, version) = context("stream structure version", u8)(i)?;
    let (i, header_type) = context("header type", u8)(i)?;
    let (i, granule) = context("granule position", le_i64)(i)?;
    let (i, serial) = context("serial number", le_u32)(i)?;
    let (i, sequence) = context("page sequence", le_u32)(i)?;
    let (i, checksum) = context("checksum", le_u32)(i)?;
    let (i, segments) = context("page segments", u8)(i)?;
    let (i, segment_table) = context("segment table", take(segments))(i)?;

    let body_size = segment_table.iter().map(|&size| size as usize).sum();
    let (i, _) = context("page body", take(body_size))(i)?;

    Ok((
        i,
        RawHeader {
            version,
            header_type,
            granule,
            serial,
            sequence,
            checksum,
            segments,
            body_size,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_start() {
        assert_eq!(find_start(b"OggS"), Some(0));
        assert_eq!(find_start(b"junkOggS"), Some(4));
        assert_eq!(find_start(b"Ogg"), None);
        assert_eq!(find_start(b""), None);
    }

    #[test]
    fn test_segment_table() {
        assert!(segment_table(0).is_empty());
        assert_eq!(segment_table(1), vec![1]);
        assert_eq!(segment_table(255), vec![255]);
        assert_eq!(segment_table(256), vec![255, 1]);
        assert_eq!(segment_table(600), vec![255, 255, 90]);
        assert_eq!(segment_table(MAX_BODY_SIZE).len(), 255);
    }

    #[test]
    fn test_serialize_parse() {
        let body = vec![7u8; 300];
        let bytes = serialize_page(flags::BOS, 960, 0xdead_beef, 3, &body).unwrap();

        let page = parse_page(&bytes, 0).unwrap();
        assert_eq!(page.version, 0);
        assert!(page.is_bos());
        assert!(!page.is_eos());
        assert_eq!(page.granule, 960);
        assert_eq!(page.serial, 0xdead_beef);
        assert_eq!(page.sequence, 3);
        assert_eq!(page.segments, 2);
        assert_eq!(page.body_size, 300);
        assert_eq!(page.page_size, HEADER_SIZE + 2 + 300);
        assert_eq!(page.page_size, bytes.len());
        assert_eq!(page.body(&bytes), &body[..]);
        assert!(verify_checksum(&bytes));
    }

    #[test]
    fn test_empty_body() {
        let bytes = serialize_page(0, 0, 1, 0, &[]).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let page = parse_page(&bytes, 0).unwrap();
        assert_eq!(page.segments, 0);
        assert_eq!(page.body_size, 0);
    }

    #[test]
    fn test_body_too_large() {
        let body = vec![0u8; MAX_BODY_SIZE + 1];

        assert!(matches!(
            serialize_page(0, 0, 0, 0, &body),
            Err(PageError::BodyTooLarge(size)) if size == MAX_BODY_SIZE + 1
        ));
    }

    #[test]
    fn test_parse_truncated() {
        let bytes = serialize_page(0, 0, 1, 0, &[1, 2, 3, 4]).unwrap();

        // Header cut off
        assert!(parse_page(&bytes[..20], 0).is_none());
        // Body cut off
        assert!(parse_page(&bytes[..bytes.len() - 1], 0).is_none());
        // Offset past the end
        assert!(parse_page(&bytes, bytes.len() + 10).is_none());
    }

    #[test]
    fn test_parse_bad_magic() {
        let mut bytes = serialize_page(0, 0, 1, 0, &[1]).unwrap();
        bytes[0] = b'X';

        assert!(parse_page(&bytes, 0).is_none());
    }

    #[test]
    fn test_rewrite_page() {
        let bytes = serialize_page(flags::EOS, 4800, 1, 7, &[9; 10]).unwrap();
        let page = parse_page(&bytes, 0).unwrap();

        let rewritten = rewrite_page(&bytes, &page, 42, 11, None);
        let new = parse_page(&rewritten, 0).unwrap();
        assert_eq!(new.serial, 42);
        assert_eq!(new.sequence, 11);
        assert_eq!(new.granule, 4800);
        assert!(!new.is_eos());
        assert_eq!(new.body(&rewritten), page.body(&bytes));
        assert!(verify_checksum(&rewritten));

        let rewritten = rewrite_page(&bytes, &page, 42, 11, Some(9600));
        assert_eq!(parse_page(&rewritten, 0).unwrap().granule, 9600);
    }

    #[test]
    fn test_checksum_idempotent() {
        let bytes = serialize_page(0, 1, 2, 3, b"hello").unwrap();
        let page = parse_page(&bytes, 0).unwrap();

        let mut recomputed = bytes.clone();
        update_checksum(&mut recomputed);
        assert_eq!(recomputed, bytes);

        update_checksum(&mut recomputed);
        assert_eq!(recomputed, bytes);
        assert_eq!(page.checksum, LittleEndian::read_u32(&bytes[CHECKSUM]));
    }

    #[test]
    fn test_corrupted_checksum() {
        let mut bytes = serialize_page(0, 1, 2, 3, b"hello").unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        assert!(!verify_checksum(&bytes));
    }

    #[test]
    fn test_pages_iter() {
        let mut bytes = b"garbage".to_vec();
        for sequence in 0..3 {
            bytes.extend(serialize_page(0, sequence as i64 * 960, 5, sequence, &[1; 20]).unwrap());
        }
        // Trailing partial page ends the scan
        bytes.extend_from_slice(b"OggS\0");

        let sequences = pages(&bytes).map(|page| page.sequence).collect::<Vec<_>>();
        assert_eq!(sequences, vec![0, 1, 2]);
    }
}
