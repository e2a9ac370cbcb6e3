use ogg_page::{crc32_update, make_minimal_tags_page, make_opus_head_page, serialize_page};

use crate::{disassemble::OpusStream, error::Result, trace::TraceEvent, Concatenator};

/// Frames are packed into pages until the body would grow beyond this.
pub const MAX_PAGE_BODY: usize = 4000;

/// Where the assembled pages start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleOptions {
    /// New logical stream starting with the OpusHead and OpusTags pages.
    ///
    /// Without a serial the one of the input is used, or one derived from the frames.
    WithHeaders { serial: Option<u32> },
    /// Data pages continuing an existing logical stream.
    Continuation {
        serial: u32,
        next_sequence: u32,
        granule: i64,
    },
}

/// Result of assembling a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub bytes: Vec<u8>,
    /// Every page written, including the header pages.
    pub page_count: u32,
    /// Granule position of the last page written.
    pub final_granule: i64,
}

/// Appends numbered pages of a single logical stream.
struct PageWriter<'a, 'c> {
    concat: &'a Concatenator<'c>,
    serial: u32,
    sequence: u32,
    granule: i64,
    bytes: Vec<u8>,
    page_count: u32,
}

impl<'a, 'c> PageWriter<'a, 'c> {
    /// Add a page that is already serialized and numbered.
    fn push_serialized(&mut self, page: Vec<u8>) {
        self.bytes.extend(page);
        self.sequence = self.sequence.wrapping_add(1);
        self.page_count += 1;
    }

    /// Write a data page, moving the granule position forward by the samples in it.
    fn write(&mut self, body: &[u8], samples: u64) -> Result<()> {
        self.granule = self
            .granule
            .saturating_add(i64::try_from(samples).unwrap_or(i64::MAX));

        let page = serialize_page(0, self.granule, self.serial, self.sequence, body)?;
        self.concat.emit(TraceEvent::PageWritten {
            sequence: self.sequence,
            granule: self.granule,
            body_size: body.len(),
        });
        self.push_serialized(page);

        Ok(())
    }

    fn finish(self) -> Assembled {
        Assembled {
            bytes: self.bytes,
            page_count: self.page_count,
            final_granule: self.granule,
        }
    }
}

/// Mux the frames into Ogg pages.
///
/// A frame joins the current page when it fits, otherwise the page is written first. Pages never
/// carry the end-of-stream flag so more can be appended later.
#[profiling::function]
pub(crate) fn assemble(
    concat: &Concatenator,
    stream: &OpusStream,
    options: AssembleOptions,
) -> Result<Assembled> {
    let mut writer = match options {
        AssembleOptions::WithHeaders { serial } => {
            let serial = serial
                .or(stream.serial)
                .unwrap_or_else(|| derive_serial(stream));

            let mut writer = PageWriter {
                concat,
                serial,
                sequence: 0,
                granule: 0,
                bytes: Vec::new(),
                page_count: 0,
            };
            writer.push_serialized(make_opus_head_page(
                serial,
                stream.channels,
                stream.pre_skip,
                stream.sample_rate,
            ));
            writer.push_serialized(make_minimal_tags_page(serial, writer.sequence));

            writer
        }
        AssembleOptions::Continuation {
            serial,
            next_sequence,
            granule,
        } => PageWriter {
            concat,
            serial,
            sequence: next_sequence,
            granule,
            bytes: Vec::new(),
            page_count: 0,
        },
    };

    let mut body = Vec::with_capacity(MAX_PAGE_BODY);
    let mut samples = 0;
    let mut pending = 0;
    for frame in &stream.frames {
        if pending > 0 && body.len() + frame.data.len() > MAX_PAGE_BODY {
            writer.write(&body, samples)?;

            body.clear();
            samples = 0;
            pending = 0;
        }

        body.extend_from_slice(&frame.data);
        samples += frame.samples as u64;
        pending += 1;
    }
    if pending > 0 {
        writer.write(&body, samples)?;
    }

    Ok(writer.finish())
}

/// Serial number for a stream without one, stable for the same frames.
fn derive_serial(stream: &OpusStream) -> u32 {
    stream
        .frames
        .iter()
        .fold(0, |crc, frame| crc32_update(crc, &frame.data))
}
