use log::Level;

use crate::format::ContainerFormat;

/// Diagnostic event observed while concatenating.
///
/// Events are also written to the `log` facade, page and element level events at `trace`, the
/// others at `debug`.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// Container of an input, `chunk` when header metadata isn't expected.
    FormatDetected { format: ContainerFormat, chunk: bool },
    /// Page found while disassembling an Ogg input.
    PageScanned {
        sequence: u32,
        granule: i64,
        body_size: usize,
    },
    /// Page written to the output.
    PageWritten {
        sequence: u32,
        granule: i64,
        body_size: usize,
    },
    /// EBML container that is walked into.
    ContainerEntered { id: u64, depth: usize },
    /// EBML element that isn't needed.
    ElementSkipped { id: u64, size: usize },
    /// Track carrying Opus in a WebM input.
    OpusTrack {
        track: u64,
        channels: u8,
        sample_rate: u32,
        pre_skip: u16,
    },
    /// Block of the Opus track split into frames.
    BlockDecoded { track: u64, frames: usize },
    /// Input turned into frames.
    Disassembled {
        format: ContainerFormat,
        frames: usize,
        samples: u64,
    },
    /// First input written with the stream headers.
    Prepared {
        serial: u32,
        last_sequence: u32,
        granule: i64,
    },
    /// Input written after the accumulator.
    InputAppended {
        index: usize,
        pages: u32,
        granule: i64,
    },
}

impl TraceEvent {
    /// Level the event is logged at.
    pub fn level(&self) -> Level {
        match self {
            Self::PageScanned { .. }
            | Self::PageWritten { .. }
            | Self::ContainerEntered { .. }
            | Self::ElementSkipped { .. }
            | Self::BlockDecoded { .. } => Level::Trace,
            _ => Level::Debug,
        }
    }
}
