//! Verifier error types
//!
//! Dua kelompok:
//! - Data errors: buffer rusak/malicious, membawa [`ErrorTrace`] (path field)
//! - Resource limits: depth/table/size ceiling terlampaui, tanpa trace

use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// Satu langkah di path menuju lokasi error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceDetail {
    TableField {
        field: &'static str,
        position: usize,
    },
    VectorElement {
        index: usize,
        position: usize,
    },
    UnionVariant {
        variant: &'static str,
        position: usize,
    },
}

/// Path dari lokasi error ke root (innermost dulu)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTrace(Vec<TraceDetail>);

impl ErrorTrace {
    pub fn details(&self) -> &[TraceDetail] {
        &self.0
    }
}

impl fmt::Display for ErrorTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for detail in &self.0 {
            match detail {
                TraceDetail::TableField { field, position } => {
                    writeln!(f, "\twhile verifying table field `{}` at position {}", field, position)?
                }
                TraceDetail::VectorElement { index, position } => writeln!(
                    f,
                    "\twhile verifying vector element {} at position {}",
                    index, position
                )?,
                TraceDetail::UnionVariant { variant, position } => writeln!(
                    f,
                    "\twhile verifying union variant `{}` at position {}",
                    variant, position
                )?,
            }
        }
        Ok(())
    }
}

/// Alasan sebuah buffer ditolak. Buffer yang ditolak harus dibuang utuh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidBuffer {
    #[error("missing required field `{field}`\n{trace}")]
    MissingRequiredField {
        field: &'static str,
        trace: ErrorTrace,
    },

    #[error("`{type_name}` at position {position} is unaligned\n{trace}")]
    Unaligned {
        position: usize,
        type_name: &'static str,
        trace: ErrorTrace,
    },

    #[error("range [{}, {}) is out of bounds\n{trace}", range.start, range.end)]
    RangeOutOfBounds {
        range: Range<usize>,
        trace: ErrorTrace,
    },

    #[error("signed offset {soffset} at position {position} points out of bounds\n{trace}")]
    SignedOffsetOutOfBounds {
        soffset: i32,
        position: usize,
        trace: ErrorTrace,
    },

    #[error("offset {offset} at position {position} is not a valid forward offset\n{trace}")]
    InvalidOffset {
        offset: u32,
        position: usize,
        trace: ErrorTrace,
    },

    #[error("vector at position {position} declares {count} elements, beyond the format limit\n{trace}")]
    VectorTooLarge {
        position: usize,
        count: usize,
        trace: ErrorTrace,
    },

    #[error("string in [{}, {}) is missing its NUL terminator\n{trace}", range.start, range.end)]
    MissingNullTerminator {
        range: Range<usize>,
        trace: ErrorTrace,
    },

    #[error("string in [{}, {}) is not valid UTF-8: {source}\n{trace}", range.start, range.end)]
    Utf8Error {
        source: std::str::Utf8Error,
        range: Range<usize>,
        trace: ErrorTrace,
    },

    #[error("file identifier does not match `{expected}`")]
    FileIdentifierMismatch { expected: String },

    #[error("size prefix {declared} does not match buffer length {actual}")]
    SizePrefixMismatch { declared: usize, actual: usize },

    #[error("nested table depth limit reached")]
    DepthLimitReached,

    #[error("too many tables")]
    TooManyTables,

    #[error("apparent size too large")]
    ApparentSizeTooLarge,
}

pub type Result<T> = std::result::Result<T, InvalidBuffer>;

impl InvalidBuffer {
    /// `true` untuk penolakan karena ceiling di [`VerifierOptions`](super::VerifierOptions).
    ///
    /// Bisa berarti serangan, atau input besar yang sah: verifikasi ulang
    /// dengan options yang lebih longgar selalu aman.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            Self::DepthLimitReached | Self::TooManyTables | Self::ApparentSizeTooLarge
        )
    }

    pub fn trace(&self) -> Option<&ErrorTrace> {
        match self {
            Self::MissingRequiredField { trace, .. }
            | Self::Unaligned { trace, .. }
            | Self::RangeOutOfBounds { trace, .. }
            | Self::SignedOffsetOutOfBounds { trace, .. }
            | Self::InvalidOffset { trace, .. }
            | Self::VectorTooLarge { trace, .. }
            | Self::MissingNullTerminator { trace, .. }
            | Self::Utf8Error { trace, .. } => Some(trace),
            _ => None,
        }
    }

    fn trace_mut(&mut self) -> Option<&mut ErrorTrace> {
        match self {
            Self::MissingRequiredField { trace, .. }
            | Self::Unaligned { trace, .. }
            | Self::RangeOutOfBounds { trace, .. }
            | Self::SignedOffsetOutOfBounds { trace, .. }
            | Self::InvalidOffset { trace, .. }
            | Self::VectorTooLarge { trace, .. }
            | Self::MissingNullTerminator { trace, .. }
            | Self::Utf8Error { trace, .. } => Some(trace),
            _ => None,
        }
    }

    pub(crate) fn out_of_bounds<T>(start: usize, end: usize) -> Result<T> {
        Err(Self::RangeOutOfBounds {
            range: start..end,
            trace: ErrorTrace::default(),
        })
    }

    pub(crate) fn missing_required<T>(field: &'static str) -> Result<T> {
        Err(Self::MissingRequiredField {
            field,
            trace: ErrorTrace::default(),
        })
    }
}

/// Tambahkan langkah path jika `res` adalah data error
pub(crate) fn append_trace<T>(mut res: Result<T>, detail: TraceDetail) -> Result<T> {
    if let Err(e) = res.as_mut() {
        if let Some(trace) = e.trace_mut() {
            trace.0.push(detail);
        }
    }
    res
}

#[inline]
pub(crate) fn trace_field<T>(res: Result<T>, field: &'static str, position: usize) -> Result<T> {
    append_trace(res, TraceDetail::TableField { field, position })
}

#[inline]
pub(crate) fn trace_elem<T>(res: Result<T>, index: usize, position: usize) -> Result<T> {
    append_trace(res, TraceDetail::VectorElement { index, position })
}
