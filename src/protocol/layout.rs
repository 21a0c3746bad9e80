//! Binary Layout Constants & Typed Offsets
//!
//! Layout (semua integer little-endian):
//! ┌──────────────────────────────────────────────────────────────┐
//! │ [size_prefix: u32]? [root: u32] [file_identifier: 4 bytes]?  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Arena: tables, vtables, vectors, strings, inline structs     │
//! └──────────────────────────────────────────────────────────────┘
//!
//! Table:  `[soffset: i32 -> vtable][field data]`
//! VTable: `[vtable_len: u16][table_len: u16][field_offset: u16]*`
//! Vector: `[count: u32][element]*`, string = byte vector + NUL implisit.

use std::fmt;
use std::marker::PhantomData;

/// Offset unsigned, selalu menunjuk ke depan (alamat lebih tinggi)
pub type UOffset = u32;
/// Offset signed dari table ke vtable-nya
pub type SOffset = i32;
/// Offset 16-bit di dalam vtable
pub type VOffset = u16;

pub const SIZE_UOFFSET: usize = 4;
pub const SIZE_SOFFSET: usize = 4;
pub const SIZE_VOFFSET: usize = 2;
pub const SIZE_SIZE_PREFIX: usize = 4;
pub const FILE_IDENTIFIER_LENGTH: usize = 4;

/// Offset 32-bit signed-safe: buffer max 2 GiB - 1
pub const MAX_BUFFER_SIZE: usize = (1usize << 31) - 1;

/// vtable_len + table_len di awal setiap vtable
pub const VTABLE_METADATA_FIELDS: usize = 2;

/// Slot (vtable byte offset) untuk field index ke-`index`
#[inline(always)]
pub const fn field_slot(index: VOffset) -> VOffset {
    (index + VTABLE_METADATA_FIELDS as VOffset) * SIZE_VOFFSET as VOffset
}

/// Kebalikan dari [`field_slot`]
#[inline(always)]
pub const fn slot_index(slot: VOffset) -> VOffset {
    slot / SIZE_VOFFSET as VOffset - VTABLE_METADATA_FIELDS as VOffset
}

/// Padding supaya `buf_size` jadi kelipatan `scalar_size` (power of 2)
#[inline(always)]
pub const fn padding_bytes(buf_size: usize, scalar_size: usize) -> usize {
    (!buf_size).wrapping_add(1) & scalar_size.wrapping_sub(1)
}

/// Jenis payload yang ditunjuk oleh sebuah [`Offset`]
pub mod kind {
    /// Table yang sudah di-`end_table`
    pub enum Table {}
    /// String (byte vector + NUL)
    pub enum String {}
    /// Vector apa saja
    pub enum Vector {}
    /// Inline struct, hanya valid tepat di posisi cursor
    pub enum Struct {}
    /// Payload union (table atau string)
    pub enum Union {}
}

/// Posisi di dalam Builder, diukur dari ujung buffer (bytes yang sudah dipakai).
///
/// Karena buffer tumbuh ke belakang, nilai ini stabil walaupun buffer di-grow.
pub struct Offset<K> {
    value: UOffset,
    _kind: PhantomData<K>,
}

impl<K> Offset<K> {
    #[inline(always)]
    pub const fn new(value: UOffset) -> Self {
        Self {
            value,
            _kind: PhantomData,
        }
    }

    #[inline(always)]
    pub fn value(self) -> UOffset {
        self.value
    }

    /// Pakai offset ini sebagai jenis lain (mis. table sebagai payload union)
    #[inline(always)]
    pub fn cast<J>(self) -> Offset<J> {
        Offset::new(self.value)
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self.value == 0
    }
}

impl<K> Clone for Offset<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Offset<K> {}

impl<K> PartialEq for Offset<K> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<K> Eq for Offset<K> {}

impl<K> fmt::Debug for Offset<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset({})", self.value)
    }
}

/// Record fixed-layout yang disimpan inline (tanpa vtable, tanpa indirection).
///
/// Implementasi biasanya datang dari generated code: `SIZE` sudah termasuk
/// padding internal, `ALIGN` = alignment field terbesar.
pub trait InlineStruct: Sized {
    const SIZE: usize;
    const ALIGN: usize;

    /// Serialize ke `dst[..SIZE]` (urutan forward, bukan backward)
    fn write_to(&self, dst: &mut [u8]);

    /// Deserialize dari `src[..SIZE]`
    fn read_from(src: &[u8]) -> Self;
}
