//! Just enough EBML to pull audio frames out of WebM and Matroska buffers.

mod block;
mod error;
pub mod ids;
mod values;
mod vint;
mod walker;

pub use block::{ebml_lace_sizes, split_frames, xiph_lace_sizes, BlockHeader, Lacing};
pub use error::{EbmlError, Result};
pub use values::{read_float, read_string, read_uint};
pub use vint::{id_vint, read_id, read_size, read_vint, size_vint, Vint, MAX_WIDTH};
pub use walker::{Element, ElementSize, Walker};

/// Whether the buffer starts with the EBML magic number.
pub fn is_ebml(bytes: &[u8]) -> bool {
    bytes.starts_with(&ids::MAGIC)
}
