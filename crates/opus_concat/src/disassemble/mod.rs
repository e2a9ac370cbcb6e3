mod ogg;
mod webm;

use crate::{
    error::{ConcatError, Result},
    format::{detect_format, ContainerFormat},
    trace::TraceEvent,
    Concatenator,
};

/// Channel count when the input doesn't describe it.
pub const DEFAULT_CHANNELS: u8 = 2;
/// Pre-skip when the input doesn't describe it, the usual encoder delay.
pub const DEFAULT_PRE_SKIP: u16 = 312;
/// Sample rate when the input doesn't describe it.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Opaque Opus payload with its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    /// Duration in samples at 48kHz.
    pub samples: u32,
}

/// Frames of a single input with the metadata needed for the stream headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusStream {
    pub frames: Vec<Frame>,
    pub channels: u8,
    pub pre_skip: u16,
    pub sample_rate: u32,
    /// Serial number of the source Ogg stream.
    pub serial: Option<u32>,
}

impl OpusStream {
    /// Empty stream with the default metadata.
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            channels: DEFAULT_CHANNELS,
            pre_skip: DEFAULT_PRE_SKIP,
            sample_rate: DEFAULT_SAMPLE_RATE,
            serial: None,
        }
    }

    /// Sum of the durations of all frames.
    pub fn total_samples(&self) -> u64 {
        self.frames.iter().map(|frame| frame.samples as u64).sum()
    }
}

impl Default for OpusStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a container into frames.
///
/// Without an override the format is detected and the input must be a complete container. With
/// an override the input is treated as a headerless chunk of that format.
#[profiling::function]
pub(crate) fn disassemble(
    concat: &Concatenator,
    bytes: &[u8],
    format_override: Option<ContainerFormat>,
) -> Result<OpusStream> {
    let (format, chunk) = match format_override {
        Some(format) => (format, true),
        None => (detect_format(bytes).ok_or(ConcatError::UnknownFormat)?, false),
    };
    concat.emit(TraceEvent::FormatDetected { format, chunk });

    let stream = match format {
        ContainerFormat::Ogg => ogg::disassemble(concat, bytes, chunk)?,
        ContainerFormat::WebM => webm::disassemble(concat, bytes, chunk)?,
    };
    concat.emit(TraceEvent::Disassembled {
        format,
        frames: stream.frames.len(),
        samples: stream.total_samples(),
    });

    Ok(stream)
}
