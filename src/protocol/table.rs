//! Zero-Copy Table Accessor
//!
//! Semua resolusi field lewat vtable indirection:
//! `table_pos -> soffset -> vtable -> field_offset -> field_pos`.
//!
//! Slot yang tidak tercatat di vtable (writer dengan schema lebih lama)
//! otomatis dianggap absent, jadi reader bisa pakai default value.
//! Inilah yang membuat schema bisa berevolusi maju-mundur.

use crate::core::{decode_utf8, read_scalar_at, Scalar};

use super::layout::{
    InlineStruct, SOffset, UOffset, VOffset, FILE_IDENTIFIER_LENGTH, SIZE_SIZE_PREFIX,
    SIZE_UOFFSET, SIZE_VOFFSET,
};
use super::vector::{Follow, Vector};

/// Ikuti satu forward offset: `pos + u32 di pos`
#[inline(always)]
pub fn indirect(buf: &[u8], pos: usize) -> usize {
    pos + read_scalar_at::<UOffset>(buf, pos) as usize
}

/// Jumlah elemen vector di `vec_pos`
#[inline(always)]
pub fn vector_len(buf: &[u8], vec_pos: usize) -> usize {
    read_scalar_at::<UOffset>(buf, vec_pos) as usize
}

/// Posisi elemen pertama (setelah length prefix)
#[inline(always)]
pub fn vector_start(vec_pos: usize) -> usize {
    vec_pos + SIZE_UOFFSET
}

/// Bytes payload string/byte-vector di `vec_pos` (tanpa NUL)
#[inline(always)]
pub fn vector_bytes(buf: &[u8], vec_pos: usize) -> &[u8] {
    let start = vector_start(vec_pos);
    &buf[start..start + vector_len(buf, vec_pos)]
}

/// Root table dari finished buffer
#[inline]
pub fn root_table(buf: &[u8]) -> Table<'_> {
    Table::new(buf, indirect(buf, 0))
}

/// Root table dari buffer yang diawali 4-byte size prefix
#[inline]
pub fn size_prefixed_root_table(buf: &[u8]) -> Table<'_> {
    Table::new(buf, indirect(buf, SIZE_SIZE_PREFIX))
}

/// Baca size prefix (panjang buffer setelah prefix)
#[inline]
pub fn read_size_prefix(buf: &[u8]) -> UOffset {
    read_scalar_at(buf, 0)
}

/// Cek file identifier yang ada tepat setelah root offset
pub fn buffer_has_identifier(buf: &[u8], identifier: &str, size_prefixed: bool) -> bool {
    let start = if size_prefixed { SIZE_SIZE_PREFIX } else { 0 } + SIZE_UOFFSET;
    identifier.len() == FILE_IDENTIFIER_LENGTH
        && buf.len() >= start + FILE_IDENTIFIER_LENGTH
        && &buf[start..start + FILE_IDENTIFIER_LENGTH] == identifier.as_bytes()
}

/// View ke vtable sebuah table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTable<'a> {
    buf: &'a [u8],
    loc: usize,
}

impl<'a> VTable<'a> {
    #[inline(always)]
    pub fn new(buf: &'a [u8], loc: usize) -> Self {
        Self { buf, loc }
    }

    #[inline(always)]
    pub fn loc(&self) -> usize {
        self.loc
    }

    /// Panjang vtable dalam bytes (termasuk 2 metadata field)
    #[inline(always)]
    pub fn len(&self) -> usize {
        read_scalar_at::<VOffset>(self.buf, self.loc) as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.num_fields() == 0
    }

    /// Ukuran inline table (termasuk soffset) dalam bytes
    #[inline(always)]
    pub fn table_size(&self) -> usize {
        read_scalar_at::<VOffset>(self.buf, self.loc + SIZE_VOFFSET) as usize
    }

    /// Jumlah slot field yang tercatat (setelah trailing zero di-trim)
    #[inline(always)]
    pub fn num_fields(&self) -> usize {
        (self.len() / SIZE_VOFFSET).saturating_sub(2)
    }

    /// Offset field relatif ke table, 0 jika absent atau slot di luar vtable
    #[inline(always)]
    pub fn get(&self, slot: VOffset) -> VOffset {
        if (slot as usize) < self.len() {
            read_scalar_at(self.buf, self.loc + slot as usize)
        } else {
            0
        }
    }

    /// Raw bytes vtable, dipakai untuk perbandingan isi
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.buf[self.loc..self.loc + self.len()]
    }
}

/// Accessor table: posisi absolut + buffer yang di-share (Copy, tanpa alokasi)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table<'a> {
    buf: &'a [u8],
    loc: usize,
}

impl<'a> Table<'a> {
    /// Table di absolute position `loc`.
    ///
    /// Tidak ada validasi di sini: buffer dari luar harus lolos Verifier dulu.
    /// Buffer invalid hanya bisa memicu panic bounds-check, tidak pernah UB.
    #[inline(always)]
    pub fn new(buf: &'a [u8], loc: usize) -> Self {
        Self { buf, loc }
    }

    #[inline(always)]
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    #[inline(always)]
    pub fn loc(&self) -> usize {
        self.loc
    }

    #[inline]
    pub fn vtable(&self) -> VTable<'a> {
        let soffset = read_scalar_at::<SOffset>(self.buf, self.loc) as isize;
        VTable::new(self.buf, (self.loc as isize - soffset) as usize)
    }

    /// Absolute position field di `slot`, atau 0 jika absent
    #[inline]
    pub fn field_pos(&self, slot: VOffset) -> usize {
        match self.vtable().get(slot) {
            0 => 0,
            off => self.loc + off as usize,
        }
    }

    /// Scalar field dengan schema default untuk kasus absent
    #[inline]
    pub fn get<T: Scalar>(&self, slot: VOffset, default: T) -> T {
        self.get_optional(slot).unwrap_or(default)
    }

    #[inline]
    pub fn get_optional<T: Scalar>(&self, slot: VOffset) -> Option<T> {
        match self.field_pos(slot) {
            0 => None,
            pos => Some(read_scalar_at(self.buf, pos)),
        }
    }

    /// Absolute position target offset field di `slot`
    #[inline]
    fn follow_field(&self, slot: VOffset) -> Option<usize> {
        match self.field_pos(slot) {
            0 => None,
            pos => Some(indirect(self.buf, pos)),
        }
    }

    /// Sub-table yang direferensikan field di `slot`
    #[inline]
    pub fn get_table(&self, slot: VOffset) -> Option<Table<'a>> {
        self.follow_field(slot).map(|pos| Table::new(self.buf, pos))
    }

    /// Raw bytes string / byte vector (tanpa NUL terminator)
    #[inline]
    pub fn get_bytes(&self, slot: VOffset) -> Option<&'a [u8]> {
        self.follow_field(slot).map(|pos| vector_bytes(self.buf, pos))
    }

    /// String field, `None` jika absent atau bukan UTF-8 valid.
    ///
    /// Elemen `Vector<&str>` yang invalid dibaca sebagai `""`, lihat [`Follow`].
    #[inline]
    pub fn get_str(&self, slot: VOffset) -> Option<&'a str> {
        self.get_bytes(slot).and_then(|b| decode_utf8(b).ok())
    }

    #[inline]
    pub fn get_vector<T: Follow<'a>>(&self, slot: VOffset) -> Option<Vector<'a, T>> {
        self.follow_field(slot).map(|pos| Vector::new(self.buf, pos))
    }

    /// Inline struct (disalin keluar, ukurannya kecil dan fixed)
    #[inline]
    pub fn get_struct<S: InlineStruct>(&self, slot: VOffset) -> Option<S> {
        match self.field_pos(slot) {
            0 => None,
            pos => Some(S::read_from(&self.buf[pos..pos + S::SIZE])),
        }
    }

    /// Discriminant union, 0 (NONE) jika absent
    #[inline]
    pub fn get_union_type(&self, type_slot: VOffset) -> u8 {
        self.get(type_slot, 0u8)
    }

    /// Payload union sebagai table, reposisi accessor ke offset di `value_slot`
    #[inline]
    pub fn get_union(&self, value_slot: VOffset) -> Option<Table<'a>> {
        self.get_table(value_slot)
    }

    /// Payload union berupa string
    #[inline]
    pub fn get_union_str(&self, value_slot: VOffset) -> Option<&'a str> {
        self.get_str(value_slot)
    }
}
