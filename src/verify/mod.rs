//! Verify Layer: Bounded Untrusted-Input Verification
//!
//! Prinsip desain:
//! - Verify once, read many: accessor tidak pernah re-check, verifier yang jaga
//! - Bounded: depth, jumlah table, dan apparent size punya ceiling
//! - Typed errors: setiap penolakan punya alasan + path ke lokasi rusak

mod error;
mod options;
mod verifier;

pub use error::{ErrorTrace, InvalidBuffer, Result, TraceDetail};
pub use options::VerifierOptions;
pub use verifier::{
    root_verified, size_prefixed_root_verified, verify_buffer, verify_size_prefixed_buffer,
    TableVerifier, Verifiable, Verifier,
};
