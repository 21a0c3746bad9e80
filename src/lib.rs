//! Flatwire - Zero-Copy, Schema-Evolvable Binary Object Format
//!
//! Arsitektur:
//! - Builder: Backward-growing encoder dengan vtable dedup
//! - Accessors: Zero-copy read langsung dari finished buffer
//! - Verifier: Bounded validation untuk buffer dari sumber tidak dipercaya
//! - Storage: Little-endian byte primitives + mmap untuk finished buffer
//!
//! Alur pemakaian:
//! ```text
//! Builder ──finish──> &[u8] ──verify_buffer──> root_verified() ──> Table accessors
//! ```

pub mod core;
pub mod protocol;
pub mod verify;

pub use crate::core::MappedBuffer;
pub use crate::protocol::{field_slot, root_table, Builder, Offset, Table, Vector};
pub use crate::verify::{root_verified, verify_buffer, InvalidBuffer, Verifiable, VerifierOptions};
