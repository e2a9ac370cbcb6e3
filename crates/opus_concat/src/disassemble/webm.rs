use ebml::{
    ids, read_float, read_string, read_uint, split_frames, BlockHeader, Element, ElementSize,
    Walker,
};
use ogg_page::OpusHead;

use crate::{
    disassemble::{Frame, OpusStream},
    error::Result,
    toc,
    trace::TraceEvent,
    Concatenator,
};

/// Codec ID of Opus tracks.
const OPUS_CODEC_ID: &str = "A_OPUS";

/// Fields of a TrackEntry needed to recognize and describe the Opus track.
#[derive(Debug, Default, Clone, PartialEq)]
struct TrackEntry {
    number: Option<u64>,
    codec_id: String,
    channels: Option<u8>,
    sampling_frequency: Option<f64>,
    codec_private: Option<OpusHead>,
}

impl TrackEntry {
    fn is_opus(&self) -> bool {
        self.codec_id == OPUS_CODEC_ID
    }

    /// Prefer the ChannelCount element over the channels in the codec private data.
    fn channels(&self) -> Option<u8> {
        self.channels
            .or_else(|| self.codec_private.map(|head| head.channels))
    }

    fn sample_rate(&self) -> Option<u32> {
        self.sampling_frequency
            .filter(|frequency| frequency.is_finite() && *frequency >= 1.0)
            .map(|frequency| frequency.round() as u32)
    }
}

/// Walk the element tree and collect the frames of all blocks of the Opus track.
///
/// Chunks are often cut from the middle of a live recording without a Tracks element, so their
/// blocks are taken regardless of the track number.
#[profiling::function]
pub(crate) fn disassemble(concat: &Concatenator, bytes: &[u8], chunk: bool) -> Result<OpusStream> {
    let mut stream = OpusStream::new();
    let mut opus_track: Option<TrackEntry> = None;

    let mut walker = Walker::new(bytes);
    while let Some(element) = walker.next_element()? {
        match element.id {
            ids::EBML | ids::SEGMENT | ids::TRACKS | ids::CLUSTER | ids::BLOCK_GROUP => {
                enter(concat, &mut walker, &element);
            }
            ids::TRACK_ENTRY => {
                let entry = track_entry(element.data(bytes))?;
                if !entry.is_opus() {
                    log::debug!("skipping track {:?} with codec {}", entry.number, entry.codec_id);
                    continue;
                }
                if opus_track.is_some() {
                    log::warn!("ignoring extra opus track {:?}", entry.number);
                    continue;
                }

                if let Some(channels) = entry.channels() {
                    stream.channels = channels;
                }
                if let Some(sample_rate) = entry.sample_rate() {
                    stream.sample_rate = sample_rate;
                }
                if let Some(head) = entry.codec_private {
                    stream.pre_skip = head.pre_skip;
                }
                concat.emit(TraceEvent::OpusTrack {
                    track: entry.number.unwrap_or_default(),
                    channels: stream.channels,
                    sample_rate: stream.sample_rate,
                    pre_skip: stream.pre_skip,
                });

                opus_track = Some(entry);
            }
            ids::SIMPLE_BLOCK | ids::BLOCK => {
                if element.truncated {
                    log::warn!("block at {} runs past the end of the data", element.offset);
                    break;
                }

                let accept = |track| {
                    chunk
                        || opus_track
                            .as_ref()
                            .map_or(false, |opus| opus.number == Some(track))
                };
                block_frames(concat, element.data(bytes), accept, &mut stream.frames)?;
            }
            // Can't be skipped without knowing where it ends
            _ if element.size == ElementSize::Unknown => {
                enter(concat, &mut walker, &element);
            }
            _ => {
                if element.truncated {
                    log::warn!(
                        "element 0x{:X} at {} runs past the end of the data",
                        element.id,
                        element.offset
                    );
                    break;
                }

                concat.emit(TraceEvent::ElementSkipped {
                    id: element.id,
                    size: element.data_end - element.data_start,
                });
            }
        }
    }

    if opus_track.is_none() && !chunk {
        log::warn!("no opus track found in webm input");
    }

    Ok(stream)
}

fn enter(concat: &Concatenator, walker: &mut Walker, element: &Element) {
    concat.emit(TraceEvent::ContainerEntered {
        id: element.id,
        depth: element.depth,
    });

    walker.enter(element);
}

/// Decode a SimpleBlock or Block, appending the frames when its track is accepted.
fn block_frames(
    concat: &Concatenator,
    data: &[u8],
    accept: impl Fn(u64) -> bool,
    frames: &mut Vec<Frame>,
) -> Result<()> {
    let (header, payload) = BlockHeader::parse(data)?;
    if !accept(header.track) {
        return Ok(());
    }

    let laced = split_frames(payload, header.lacing)?;
    concat.emit(TraceEvent::BlockDecoded {
        track: header.track,
        frames: laced.len(),
    });

    frames.extend(laced.into_iter().map(|frame| Frame {
        samples: toc::packet_samples(frame),
        data: frame.to_vec(),
    }));

    Ok(())
}

/// Read the children of a TrackEntry.
fn track_entry(data: &[u8]) -> Result<TrackEntry> {
    let mut entry = TrackEntry::default();

    let mut walker = Walker::new(data);
    while let Some(element) = walker.next_element()? {
        let value = element.data(data);

        match element.id {
            ids::AUDIO => walker.enter(&element),
            ids::TRACK_NUMBER => entry.number = read_uint(value),
            ids::CODEC_ID => entry.codec_id = read_string(value),
            ids::CODEC_PRIVATE => entry.codec_private = OpusHead::parse(value).ok(),
            ids::CHANNEL_COUNT => {
                entry.channels = read_uint(value).and_then(|channels| u8::try_from(channels).ok())
            }
            ids::SAMPLING_FREQUENCY => entry.sampling_frequency = read_float(value),
            _ => (),
        }
    }

    Ok(entry)
}
