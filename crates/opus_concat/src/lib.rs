//! Concatenate Opus audio from Ogg and WebM containers into a single Ogg Opus stream that can
//! always be appended to, without touching the audio payloads.
//!
//! ```no_run
//! # fn main() -> opus_concat::Result<()> {
//! # let (first, second, third) = (Vec::<u8>::new(), Vec::<u8>::new(), Vec::<u8>::new());
//! // Everything at once
//! let merged = opus_concat::concat_all(&[&first, &second])?;
//!
//! // Or incrementally, keeping the state between calls
//! let prepared = opus_concat::prepare(&first)?;
//! let appended = opus_concat::append(&prepared.bytes, &[&second], prepared.state, None)?;
//! let appended = opus_concat::append(&appended.bytes, &[&third], appended.state, None)?;
//! # Ok(())
//! # }
//! ```

mod accumulator;
mod assemble;
mod disassemble;
mod error;
mod format;
mod toc;
mod trace;

use std::fmt::{Debug, Formatter};

pub use accumulator::{Accumulated, ContinuationState};
pub use assemble::{AssembleOptions, Assembled, MAX_PAGE_BODY};
pub use disassemble::{
    Frame, OpusStream, DEFAULT_CHANNELS, DEFAULT_PRE_SKIP, DEFAULT_SAMPLE_RATE,
};
pub use error::{ConcatError, Result};
pub use format::{detect_format, ContainerFormat};
pub use ogg_page::VENDOR;
pub use toc::{packet_samples, FALLBACK_SAMPLES};
pub use trace::TraceEvent;

/// Entry point for all operations, optionally observing them through a trace callback.
///
/// The callback only observes, the output is the same with or without it.
#[derive(Clone, Copy, Default)]
pub struct Concatenator<'a> {
    trace: Option<&'a dyn Fn(&TraceEvent)>,
}

impl<'a> Concatenator<'a> {
    /// Concatenator without a trace callback.
    pub fn new() -> Self {
        Self { trace: None }
    }

    /// Concatenator calling the function for every diagnostic event.
    pub fn with_trace(trace: &'a dyn Fn(&TraceEvent)) -> Self {
        Self { trace: Some(trace) }
    }

    /// Detect the container of the input.
    pub fn detect_format(&self, bytes: &[u8]) -> Option<ContainerFormat> {
        detect_format(bytes)
    }

    /// Extract the frames and metadata from an input.
    ///
    /// Without an override the format is detected and the input must be a complete container,
    /// with one it's treated as a chunk of that format without any headers.
    pub fn disassemble(
        &self,
        bytes: &[u8],
        format_override: Option<ContainerFormat>,
    ) -> Result<OpusStream> {
        disassemble::disassemble(self, bytes, format_override)
    }

    /// Mux frames into Ogg pages.
    pub fn assemble(&self, stream: &OpusStream, options: AssembleOptions) -> Result<Assembled> {
        assemble::assemble(self, stream, options)
    }

    /// Start an accumulated stream from a complete container.
    pub fn prepare(&self, input: &[u8]) -> Result<Accumulated> {
        accumulator::prepare(self, input)
    }

    /// Append inputs to an accumulated stream.
    ///
    /// The override is required for chunks without container headers.
    pub fn append<I>(
        &self,
        acc: &[u8],
        inputs: &[I],
        state: ContinuationState,
        format_override: Option<ContainerFormat>,
    ) -> Result<Accumulated>
    where
        I: AsRef<[u8]>,
    {
        accumulator::append(self, acc, inputs, state, format_override)
    }

    /// Concatenate all inputs into a single stream.
    pub fn concat_all<I>(&self, inputs: &[I]) -> Result<Vec<u8>>
    where
        I: AsRef<[u8]>,
    {
        accumulator::concat_all(self, inputs)
    }

    /// Log the event and pass it to the trace callback.
    pub(crate) fn emit(&self, event: TraceEvent) {
        log::log!(event.level(), "{:?}", event);

        if let Some(trace) = self.trace {
            trace(&event);
        }
    }
}

impl<'a> Debug for Concatenator<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Concatenator")
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

/// Extract the frames and metadata from an input, see [`Concatenator::disassemble`].
pub fn disassemble(bytes: &[u8], format_override: Option<ContainerFormat>) -> Result<OpusStream> {
    Concatenator::new().disassemble(bytes, format_override)
}

/// Mux frames into Ogg pages, see [`Concatenator::assemble`].
pub fn assemble(stream: &OpusStream, options: AssembleOptions) -> Result<Assembled> {
    Concatenator::new().assemble(stream, options)
}

/// Start an accumulated stream, see [`Concatenator::prepare`].
pub fn prepare(input: &[u8]) -> Result<Accumulated> {
    Concatenator::new().prepare(input)
}

/// Append inputs to an accumulated stream, see [`Concatenator::append`].
pub fn append<I>(
    acc: &[u8],
    inputs: &[I],
    state: ContinuationState,
    format_override: Option<ContainerFormat>,
) -> Result<Accumulated>
where
    I: AsRef<[u8]>,
{
    Concatenator::new().append(acc, inputs, state, format_override)
}

/// Concatenate all inputs into a single stream, see [`Concatenator::concat_all`].
pub fn concat_all<I>(inputs: &[I]) -> Result<Vec<u8>>
where
    I: AsRef<[u8]>,
{
    Concatenator::new().concat_all(inputs)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use ogg_page::{make_minimal_tags_page, make_opus_head_page, serialize_page};

    use super::*;

    #[test]
    fn test_trace_does_not_change_output() {
        let mut input = make_opus_head_page(8, 2, 312, 48000);
        input.extend(make_minimal_tags_page(8, 1));
        input.extend(serialize_page(0, 960, 8, 2, &[0xFC; 30]).unwrap());

        let events = RefCell::new(Vec::new());
        let sink = |event: &TraceEvent| events.borrow_mut().push(event.clone());
        let traced = Concatenator::with_trace(&sink)
            .concat_all(&[&input, &input])
            .unwrap();

        assert_eq!(traced, concat_all(&[&input, &input]).unwrap());

        let events = events.into_inner();
        assert!(events.contains(&TraceEvent::FormatDetected {
            format: ContainerFormat::Ogg,
            chunk: false
        }));
        assert!(events
            .iter()
            .any(|event| matches!(event, TraceEvent::InputAppended { index: 0, pages: 1, .. })));
    }
}
