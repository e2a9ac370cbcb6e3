use crate::{
    assemble::{assemble, AssembleOptions},
    disassemble::disassemble,
    error::{ConcatError, Result},
    format::ContainerFormat,
    trace::TraceEvent,
    Concatenator,
};

/// Everything needed to append more pages to an accumulated stream.
///
/// Returned by every call and passed back into the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContinuationState {
    /// Serial number shared by every page of the logical stream.
    pub serial: u32,
    /// Sequence number of the last page written.
    pub last_sequence: u32,
    /// Granule position of the last page written.
    pub granule: i64,
    /// Size of the accumulated stream in bytes.
    pub total_size: u64,
}

impl ContinuationState {
    /// Read the state back from an accumulated stream.
    ///
    /// `None` when the bytes contain no complete page.
    pub fn scan(bytes: &[u8]) -> Option<Self> {
        let mut pages = ogg_page::pages(bytes);
        let first = pages.next()?;

        let state = pages.fold(
            Self {
                serial: first.serial,
                last_sequence: first.sequence,
                granule: first.granule,
                total_size: bytes.len() as u64,
            },
            |state, page| Self {
                last_sequence: page.sequence,
                granule: state.granule.max(page.granule),
                ..state
            },
        );

        Some(state)
    }
}

/// Accumulated stream with the state to continue it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulated {
    pub bytes: Vec<u8>,
    pub state: ContinuationState,
}

/// Start an accumulator from a complete container.
///
/// The state is read back from the written pages instead of trusting the assembler.
#[profiling::function]
pub(crate) fn prepare(concat: &Concatenator, input: &[u8]) -> Result<Accumulated> {
    let stream = disassemble(concat, input, None)?;
    let assembled = assemble(concat, &stream, AssembleOptions::WithHeaders { serial: None })?;

    let state = ContinuationState::scan(&assembled.bytes).ok_or_else(|| {
        ConcatError::MalformedContainer("prepared stream contains no pages".to_string())
    })?;
    concat.emit(TraceEvent::Prepared {
        serial: state.serial,
        last_sequence: state.last_sequence,
        granule: state.granule,
    });

    Ok(Accumulated {
        bytes: assembled.bytes,
        state,
    })
}

/// Append the inputs, in order, to the accumulator.
///
/// Nothing is returned when any input fails.
#[profiling::function]
pub(crate) fn append<I>(
    concat: &Concatenator,
    acc: &[u8],
    inputs: &[I],
    state: ContinuationState,
    format_override: Option<ContainerFormat>,
) -> Result<Accumulated>
where
    I: AsRef<[u8]>,
{
    let mut bytes = acc.to_vec();
    let mut state = state;

    for (index, input) in inputs.iter().enumerate() {
        let stream = disassemble(concat, input.as_ref(), format_override)?;
        let assembled = assemble(
            concat,
            &stream,
            AssembleOptions::Continuation {
                serial: state.serial,
                next_sequence: state.last_sequence.wrapping_add(1),
                granule: state.granule,
            },
        )?;

        bytes.extend_from_slice(&assembled.bytes);
        state.last_sequence = state.last_sequence.wrapping_add(assembled.page_count);
        state.granule = assembled.final_granule;

        concat.emit(TraceEvent::InputAppended {
            index,
            pages: assembled.page_count,
            granule: state.granule,
        });
    }
    state.total_size = bytes.len() as u64;

    Ok(Accumulated { bytes, state })
}

/// Prepare the first input and append all others.
#[profiling::function]
pub(crate) fn concat_all<I>(concat: &Concatenator, inputs: &[I]) -> Result<Vec<u8>>
where
    I: AsRef<[u8]>,
{
    let (first, rest) = inputs.split_first().ok_or(ConcatError::EmptyInput)?;

    let prepared = prepare(concat, first.as_ref())?;
    if rest.is_empty() {
        return Ok(prepared.bytes);
    }

    let appended = append(concat, &prepared.bytes, rest, prepared.state, None)?;

    Ok(appended.bytes)
}
