use nom::{
    error::{context, VerboseError},
    number::complete::{be_i16, u8},
    IResult,
};

use crate::{
    error::{EbmlError, Result},
    vint::size_vint,
};

/// How multiple frames are packed into the data of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lacing {
    /// A single frame.
    None,
    /// Sizes as runs of 255 terminated by a smaller byte.
    Xiph,
    /// All frames have the same size.
    FixedSize,
    /// First size as a variable length integer, the others as signed differences.
    Ebml,
}

impl Lacing {
    /// Lacing selected by bits 1-2 of the block flags.
    pub fn from_flags(flags: u8) -> Self {
        match (flags & 0x06) >> 1 {
            0 => Self::None,
            1 => Self::Xiph,
            2 => Self::FixedSize,
            _ => Self::Ebml,
        }
    }
}

/// Header shared by SimpleBlock and Block elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub track: u64,
    /// Relative to the timecode of the cluster.
    pub timecode: i16,
    pub flags: u8,
    pub lacing: Lacing,
}

impl BlockHeader {
    /// Parse the header, returning it with the laced payload after it.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        let (payload, header) = block_header(data)?;

        Ok((header, payload))
    }

    /// Only meaningful for SimpleBlocks.
    pub fn is_keyframe(&self) -> bool {
        self.flags & 0x80 != 0
    }
}

/// Split the payload of a block into its frames.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn split_frames(payload: &[u8], lacing: Lacing) -> Result<Vec<&[u8]>> {
    let (data, sizes) = match lacing {
        Lacing::None => return Ok(vec![payload]),
        Lacing::FixedSize => {
            let (count, data) = frame_count(payload)?;

            // Trailing bytes that don't divide evenly are dropped
            (data, vec![data.len() / count; count])
        }
        Lacing::Xiph => {
            let (count, laced) = frame_count(payload)?;
            let (data, sizes) = xiph_lace_sizes(laced, count - 1)?;

            (data, with_remainder(data, sizes)?)
        }
        Lacing::Ebml => {
            let (count, laced) = frame_count(payload)?;
            let (data, sizes) = ebml_lace_sizes(laced, count - 1)?;

            (data, with_remainder(data, sizes)?)
        }
    };

    let mut frames = Vec::with_capacity(sizes.len());
    let mut offset = 0usize;
    for size in sizes {
        let frame = offset
            .checked_add(size)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| {
                EbmlError::InvalidLacing(format!("frame of {} bytes runs past the block", size))
            })?;
        frames.push(frame);
        offset += size;
    }

    Ok(frames)
}

/// Read the sizes of Xiph laced frames, the amount excludes the last frame.
///
/// Returns the data after the lace headers with the sizes.
pub fn xiph_lace_sizes(data: &[u8], amount: usize) -> Result<(&[u8], Vec<usize>)> {
    let mut i = data;
    let mut sizes = Vec::with_capacity(amount + 1);

    for _ in 0..amount {
        let mut size = 0;
        loop {
            let (&byte, rest) = i.split_first().ok_or_else(|| {
                EbmlError::InvalidLacing("xiph lace size runs past the block".to_string())
            })?;
            i = rest;

            size += byte as usize;
            if byte < 255 {
                break;
            }
        }

        sizes.push(size);
    }

    Ok((i, sizes))
}

/// Read the sizes of EBML laced frames, the amount excludes the last frame.
///
/// Returns the data after the lace headers with the sizes.
pub fn ebml_lace_sizes(data: &[u8], amount: usize) -> Result<(&[u8], Vec<usize>)> {
    let mut sizes = Vec::with_capacity(amount + 1);
    if amount == 0 {
        return Ok((data, sizes));
    }

    let (mut i, first) = context("ebml lace first size", size_vint)(data)?;
    let mut previous = first.value as i64;
    sizes.push(first.value as usize);

    for _ in 1..amount {
        let difference;
        (i, difference) = context("ebml lace size difference", size_vint)(i)?;

        let size = previous.checked_add(difference.signed()).ok_or_else(|| {
            EbmlError::InvalidLacing("ebml lace size out of range".to_string())
        })?;
        if size < 0 {
            return Err(EbmlError::InvalidLacing(format!(
                "negative frame size {}",
                size
            )));
        }

        sizes.push(size as usize);
        previous = size;
    }

    Ok((i, sizes))
}

/// First byte of laced data holds the amount of frames minus one.
fn frame_count(payload: &[u8]) -> Result<(usize, &[u8])> {
    match payload.split_first() {
        Some((&count, rest)) => Ok((count as usize + 1, rest)),
        None => Err(EbmlError::InvalidLacing("missing frame count".to_string())),
    }
}

/// The last frame takes whatever is left after all other frames.
fn with_remainder(data: &[u8], mut sizes: Vec<usize>) -> Result<Vec<usize>> {
    let known = sizes
        .iter()
        .try_fold(0usize, |total, &size| total.checked_add(size))
        .ok_or_else(|| EbmlError::InvalidLacing("lace sizes overflow".to_string()))?;
    let last = data.len().checked_sub(known).ok_or_else(|| {
        EbmlError::InvalidLacing(format!(
            "lace sizes of {} bytes exceed the {} bytes in the block",
            known,
            data.len()
        ))
    })?;
    sizes.push(last);

    Ok(sizes)
}

fn block_header(i: &[u8]) -> IResult<&[u8], BlockHeader, VerboseError<&[u8]>> {
    let (i, track) = context("block track number", size_vint)(i)?;
    let (i, timecode) = context("block timecode", be_i16)(i)?;
    let (i, flags) = context("block flags", u8)(i)?;

    Ok((
        i,
        BlockHeader {
            track: track.value,
            timecode,
            flags,
            lacing: Lacing::from_flags(flags),
        },
    ))
}
