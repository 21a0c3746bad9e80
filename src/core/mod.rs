//! Core module: Byte Storage Primitives
//!
//! Prinsip desain:
//! - Little-Endian: Semua scalar fixed-width, LE, bit-exact
//! - Absolute offsets: Tidak ada pointer, hanya integer position ke byte arena
//! - Zero-Copy: Finished buffer bisa langsung di-mmap dan dibaca di tempat

mod byte_buffer;
mod mapped;
mod scalar;

pub use byte_buffer::ByteBuffer;
pub use mapped::MappedBuffer;
pub use scalar::{decode_utf8, encode_utf8, read_scalar_at, utf16_len, write_scalar_at, Scalar};
