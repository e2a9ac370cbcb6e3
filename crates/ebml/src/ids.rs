//! Element IDs, with their marker bits, used when reading WebM audio.

/// EBML header, also the magic number at the start of every file.
pub const EBML: u64 = 0x1A45_DFA3;
pub const SEGMENT: u64 = 0x1853_8067;
pub const TRACKS: u64 = 0x1654_AE6B;
pub const TRACK_ENTRY: u64 = 0xAE;
pub const TRACK_NUMBER: u64 = 0xD7;
pub const CODEC_ID: u64 = 0x86;
pub const CODEC_PRIVATE: u64 = 0x63A2;
pub const AUDIO: u64 = 0xE1;
pub const CHANNEL_COUNT: u64 = 0x9F;
pub const SAMPLING_FREQUENCY: u64 = 0xB5;
pub const CLUSTER: u64 = 0x1F43_B675;
pub const TIMECODE: u64 = 0xE7;
pub const SIMPLE_BLOCK: u64 = 0xA3;
pub const BLOCK_GROUP: u64 = 0xA0;
pub const BLOCK: u64 = 0xA1;

/// The first four bytes of every EBML document.
pub const MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
