use ogg_page::{OpusHead, Page};

use crate::{
    disassemble::{Frame, OpusStream},
    error::{ConcatError, Result},
    trace::TraceEvent,
    Concatenator,
};

/// Every page body becomes a single frame, its duration is the granule difference with the page
/// before it.
///
/// Complete streams start with the identification and comment header pages, chunks don't.
pub(crate) fn disassemble(concat: &Concatenator, bytes: &[u8], chunk: bool) -> Result<OpusStream> {
    if ogg_page::find_start(bytes).is_none() {
        return Err(ConcatError::MalformedContainer(
            "no ogg capture pattern found".to_string(),
        ));
    }

    let mut pages = ogg_page::pages(bytes).inspect(|page| {
        concat.emit(TraceEvent::PageScanned {
            sequence: page.sequence,
            granule: page.granule,
            body_size: page.body_size,
        })
    });
    let mut stream = OpusStream::new();

    if !chunk {
        let head_page = pages.next().ok_or_else(|| {
            ConcatError::MalformedContainer("no complete ogg page found".to_string())
        })?;
        let head = OpusHead::parse(head_page.body(bytes)).map_err(|err| {
            ConcatError::MalformedContainer(format!("first page is not an OpusHead: {}", err))
        })?;
        log::debug!(
            "stream {} with {} channels, pre-skip {} and input rate {}",
            head_page.serial,
            head.channels,
            head.pre_skip,
            head.sample_rate
        );

        stream.channels = head.channels;
        stream.pre_skip = head.pre_skip;
        stream.sample_rate = head.sample_rate;
        stream.serial = Some(head_page.serial);

        // The comment header is replaced by our own
        if pages.next().is_none() {
            log::warn!("ogg stream ends after the identification header");
        }
    }

    let mut previous = 0;
    stream.frames = pages
        .map(|page| Frame {
            data: page.body(bytes).to_vec(),
            samples: page_samples(&page, &mut previous),
        })
        .collect();

    Ok(stream)
}

/// Duration of the page, moving the previous granule position along.
fn page_samples(page: &Page, previous: &mut i64) -> u32 {
    // No packet finishes on this page
    if page.granule < 0 {
        return 0;
    }

    let delta = page.granule.saturating_sub(*previous).max(0);
    *previous = page.granule;

    u32::try_from(delta).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use ogg_page::{make_minimal_tags_page, make_opus_head_page, serialize_page};

    use super::*;

    fn stream_with_headers(serial: u32, pages: &[(i64, Vec<u8>)]) -> Vec<u8> {
        let mut bytes = make_opus_head_page(serial, 1, 3840, 44100);
        bytes.extend(make_minimal_tags_page(serial, 1));
        for (index, (granule, body)) in pages.iter().enumerate() {
            bytes.extend(serialize_page(0, *granule, serial, index as u32 + 2, body).unwrap());
        }

        bytes
    }

    #[test]
    fn test_full_stream() {
        let bytes = stream_with_headers(77, &[(960, vec![1; 10]), (2880, vec![2; 20])]);
        let stream = disassemble(&Concatenator::new(), &bytes, false).unwrap();

        assert_eq!(stream.serial, Some(77));
        assert_eq!(stream.channels, 1);
        assert_eq!(stream.pre_skip, 3840);
        assert_eq!(stream.sample_rate, 44100);
        assert_eq!(stream.frames.len(), 2);
        assert_eq!(stream.frames[0], Frame { data: vec![1; 10], samples: 960 });
        assert_eq!(stream.frames[1].samples, 1920);
    }

    #[test]
    fn test_chunk_keeps_every_page() {
        let mut bytes = serialize_page(0, 480, 5, 0, &[1]).unwrap();
        bytes.extend(serialize_page(0, 1440, 5, 1, &[2]).unwrap());

        let stream = disassemble(&Concatenator::new(), &bytes, true).unwrap();
        assert_eq!(stream.serial, None);
        assert_eq!(
            stream.frames.iter().map(|frame| frame.samples).collect::<Vec<_>>(),
            vec![480, 960]
        );
    }

    #[test]
    fn test_unfinished_packet_granule() {
        let bytes = stream_with_headers(
            1,
            &[(960, vec![1]), (-1, vec![2]), (2880, vec![3]), (1920, vec![4])],
        );
        let stream = disassemble(&Concatenator::new(), &bytes, false).unwrap();

        assert_eq!(
            stream.frames.iter().map(|frame| frame.samples).collect::<Vec<_>>(),
            vec![960, 0, 1920, 0]
        );
    }

    #[test]
    fn test_missing_head() {
        let bytes = serialize_page(0, 0, 1, 0, b"OpusTags").unwrap();
        let err = disassemble(&Concatenator::new(), &bytes, false).unwrap_err();

        assert!(matches!(err, ConcatError::MalformedContainer(_)));
    }

    #[test]
    fn test_chunk_without_capture_pattern() {
        let err = disassemble(&Concatenator::new(), b"no pages in here", true).unwrap_err();

        assert!(matches!(err, ConcatError::MalformedContainer(_)));
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        let mut bytes = stream_with_headers(1, &[(960, vec![1; 50])]);
        let extra = serialize_page(0, 1920, 1, 3, &[2; 50]).unwrap();
        bytes.extend_from_slice(&extra[..40]);

        let stream = disassemble(&Concatenator::new(), &bytes, false).unwrap();
        assert_eq!(stream.frames.len(), 1);
    }
}
