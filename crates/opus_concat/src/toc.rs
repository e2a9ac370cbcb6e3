/// Duration used when a packet has no TOC byte.
pub const FALLBACK_SAMPLES: u32 = 960;

/// Samples at 48kHz per frame, indexed by the configuration number in the TOC byte.
const SAMPLES: [u32; 32] = [
    // SILK narrowband, mediumband and wideband, 10/20/40/60 ms
    480, 960, 1920, 2880, //
    480, 960, 1920, 2880, //
    480, 960, 1920, 2880, //
    // Hybrid super wideband and fullband, 10/20 ms
    480, 960, //
    480, 960, //
    // CELT narrowband, wideband, super wideband and fullband, 2.5/5/10/20 ms
    120, 240, 480, 960, //
    120, 240, 480, 960, //
    120, 240, 480, 960, //
    120, 240, 480, 960,
];

/// Estimate the duration of an Opus packet from the configuration in its TOC byte.
pub fn packet_samples(packet: &[u8]) -> u32 {
    packet
        .first()
        .and_then(|toc| SAMPLES.get((toc >> 3) as usize))
        .copied()
        .unwrap_or(FALLBACK_SAMPLES)
}
