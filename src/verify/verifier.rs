//! Untrusted-Input Verifier
//!
//! Prinsip desain:
//! - Tidak ada offset yang dipercaya sebelum di-range-check dan di-align-check
//! - Space bounded: O(depth) stack + O(1) counter, tidak pernah alokasi
//!   sebesar ukuran yang dideklarasikan buffer
//! - Pure result: gagal = buang seluruh buffer, verifikasi ulang selalu aman
//!
//! Tipe per-schema menyuntikkan logikanya lewat trait [`Verifiable`];
//! core tidak pernah tahu tipe konkret.

use std::ops::Range;

use crate::core::{decode_utf8, read_scalar_at, Scalar};
use crate::protocol::{
    Table, SOffset, UOffset, VOffset, FILE_IDENTIFIER_LENGTH, MAX_BUFFER_SIZE, SIZE_SIZE_PREFIX,
    SIZE_UOFFSET, SIZE_VOFFSET,
};

use super::error::{
    append_trace, trace_elem, trace_field, InvalidBuffer, Result, TraceDetail,
};
use super::options::VerifierOptions;

/// Kapabilitas verifikasi untuk satu tipe (biasanya dari generated code)
pub trait Verifiable {
    /// Verifikasi objek tipe ini yang ada di absolute position `pos`
    fn run_verifier(v: &mut Verifier<'_, '_>, pos: usize) -> Result<()>;
}

/// State verifikasi satu buffer. Counter di-reset setiap top-level run.
#[derive(Debug)]
pub struct Verifier<'opts, 'buf> {
    buf: &'buf [u8],
    opts: &'opts VerifierOptions,
    depth: usize,
    num_tables: usize,
    apparent_size: usize,
}

impl<'opts, 'buf> Verifier<'opts, 'buf> {
    pub fn new(opts: &'opts VerifierOptions, buf: &'buf [u8]) -> Self {
        Self {
            buf,
            opts,
            depth: 0,
            num_tables: 0,
            apparent_size: 0,
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.depth = 0;
        self.num_tables = 0;
        self.apparent_size = 0;
    }

    #[inline(always)]
    pub fn buffer(&self) -> &'buf [u8] {
        self.buf
    }

    #[inline(always)]
    pub fn options(&self) -> &'opts VerifierOptions {
        self.opts
    }

    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline(always)]
    pub fn num_tables(&self) -> usize {
        self.num_tables
    }

    /// Alignment relatif ke awal buffer (bukan alamat memory)
    #[inline]
    fn is_aligned(&self, pos: usize, align: usize, type_name: &'static str) -> Result<()> {
        if !self.opts.check_alignment || align <= 1 || pos % align == 0 {
            return Ok(());
        }
        Err(InvalidBuffer::Unaligned {
            position: pos,
            type_name,
            trace: Default::default(),
        })
    }

    #[inline]
    fn range_in_buffer(&mut self, pos: usize, size: usize) -> Result<()> {
        let end = pos.saturating_add(size);
        if end > self.buf.len() {
            return InvalidBuffer::out_of_bounds(pos, end);
        }
        self.apparent_size = self.apparent_size.saturating_add(size);
        if self.apparent_size > self.opts.max_apparent_size {
            return Err(InvalidBuffer::ApparentSizeTooLarge);
        }
        Ok(())
    }

    /// Pastikan ada `T` utuh dan aligned di `pos`
    #[inline]
    pub fn in_buffer<T: Scalar>(&mut self, pos: usize) -> Result<()> {
        self.is_aligned(pos, T::SIZE, std::any::type_name::<T>())?;
        self.range_in_buffer(pos, T::SIZE)
    }

    #[inline]
    fn read<T: Scalar>(&mut self, pos: usize) -> Result<T> {
        self.in_buffer::<T>(pos)?;
        Ok(read_scalar_at(self.buf, pos))
    }

    /// Resolve soffset table -> posisi vtable
    fn deref_soffset(&mut self, pos: usize) -> Result<usize> {
        let soffset = self.read::<SOffset>(pos)?;

        // vtable = pos - soffset; soffset negatif berarti vtable di depan
        let target = if soffset >= 0 {
            pos.checked_sub(soffset as usize)
        } else {
            pos.checked_add(soffset.unsigned_abs() as usize)
        };

        match target {
            Some(t) if t < self.buf.len() => Ok(t),
            _ => Err(InvalidBuffer::SignedOffsetOutOfBounds {
                soffset,
                position: pos,
                trace: Default::default(),
            }),
        }
    }

    /// Baca forward offset di `pos` dan kembalikan target absolutnya.
    ///
    /// Offset harus nonzero, < 2^31 (supaya `pos + offset` tidak overflow),
    /// dan target harus menunjuk minimal satu byte di dalam buffer.
    pub fn check_indirect(&mut self, pos: usize) -> Result<usize> {
        let offset = self.read::<UOffset>(pos)?;

        if offset == 0 || offset as usize > MAX_BUFFER_SIZE {
            return Err(InvalidBuffer::InvalidOffset {
                offset,
                position: pos,
                trace: Default::default(),
            });
        }

        let target = pos + offset as usize;
        if target >= self.buf.len() {
            return InvalidBuffer::out_of_bounds(target, target + 1);
        }
        Ok(target)
    }

    /// Masuk ke table di `pos`: cek ceiling, soffset, dan seluruh vtable.
    ///
    /// Setiap `visit_table` sukses harus ditutup dengan [`TableVerifier::finish`].
    pub fn visit_table<'ver>(&'ver mut self, pos: usize) -> Result<TableVerifier<'ver, 'opts, 'buf>> {
        self.depth += 1;
        self.num_tables += 1;
        if self.depth > self.opts.max_depth {
            return Err(InvalidBuffer::DepthLimitReached);
        }
        if self.num_tables > self.opts.max_tables {
            return Err(InvalidBuffer::TooManyTables);
        }

        let vtable = self.deref_soffset(pos)?;
        let vtable_len = self.read::<VOffset>(vtable)? as usize;
        // vtable_len harus genap, dan vtable utuh ada di buffer
        self.is_aligned(vtable_len, SIZE_VOFFSET, "vtable length")?;
        self.range_in_buffer(vtable, vtable_len)?;

        Ok(TableVerifier {
            pos,
            vtable,
            vtable_len,
            verifier: self,
        })
    }

    /// Cek length prefix + region elemen, kembalikan range elemen
    fn verify_vector_range(
        &mut self,
        pos: usize,
        elem_size: usize,
        elem_align: usize,
    ) -> Result<Range<usize>> {
        let count = self.read::<UOffset>(pos)? as usize;

        // count * elem_size tidak boleh melewati batas format
        if count >= MAX_BUFFER_SIZE / elem_size.max(1) {
            return Err(InvalidBuffer::VectorTooLarge {
                position: pos,
                count,
                trace: Default::default(),
            });
        }

        let start = pos + SIZE_UOFFSET;
        self.is_aligned(start, elem_align, "vector element")?;
        let size = count * elem_size;
        self.range_in_buffer(start, size)?;
        Ok(start..start + size)
    }

    /// Vector scalar di `pos`
    pub fn verify_vector<T: Scalar>(&mut self, pos: usize) -> Result<Range<usize>> {
        self.verify_vector_range(pos, T::SIZE, T::SIZE)
    }

    /// Vector inline struct di `pos`
    pub fn verify_vector_of_structs(
        &mut self,
        pos: usize,
        size: usize,
        align: usize,
    ) -> Result<Range<usize>> {
        self.verify_vector_range(pos, size, align)
    }

    /// String di `pos`: bounds, NUL terminator (opsional), UTF-8
    pub fn verify_string(&mut self, pos: usize) -> Result<()> {
        let range = self.verify_vector_range(pos, 1, 1)?;

        if self.opts.check_string_terminator && self.buf.get(range.end) != Some(&0) {
            return Err(InvalidBuffer::MissingNullTerminator {
                range,
                trace: Default::default(),
            });
        }

        if let Err(source) = decode_utf8(&self.buf[range.clone()]) {
            return Err(InvalidBuffer::Utf8Error {
                source,
                range,
                trace: Default::default(),
            });
        }
        Ok(())
    }

    pub fn verify_vector_of_strings(&mut self, pos: usize) -> Result<()> {
        let range = self.verify_vector_range(pos, SIZE_UOFFSET, SIZE_UOFFSET)?;
        for (i, elem) in range.step_by(SIZE_UOFFSET).enumerate() {
            let target = trace_elem(self.check_indirect(elem), i, elem)?;
            trace_elem(self.verify_string(target), i, elem)?;
        }
        Ok(())
    }

    pub fn verify_vector_of_tables<T: Verifiable>(&mut self, pos: usize) -> Result<()> {
        let range = self.verify_vector_range(pos, SIZE_UOFFSET, SIZE_UOFFSET)?;
        for (i, elem) in range.step_by(SIZE_UOFFSET).enumerate() {
            let target = trace_elem(self.check_indirect(elem), i, elem)?;
            trace_elem(T::run_verifier(self, target), i, elem)?;
        }
        Ok(())
    }

    /// Byte vector berisi buffer lengkap lain: diverifikasi dengan
    /// Verifier baru (counter fresh, tanpa syarat file identifier).
    ///
    /// Depth TIDAK fresh: verifier dalam mulai dari depth parent, jadi
    /// rantai nested buffer tetap dibatasi `max_depth`.
    pub fn verify_nested_buffer<T: Verifiable>(&mut self, pos: usize) -> Result<()> {
        let range = self.verify_vector::<u8>(pos)?;
        let nested = &self.buf[range];
        let mut inner = Verifier::new(self.opts, nested);
        inner.depth = self.depth;
        inner.check_root::<T>(None, false).map(|_| ())
    }

    /// Variant union berupa table. `None` = value absent, diterima.
    pub fn verify_union_variant<T: Verifiable>(
        &mut self,
        variant: &'static str,
        pos: Option<usize>,
    ) -> Result<()> {
        match pos {
            Some(p) => append_trace(
                T::run_verifier(self, p),
                TraceDetail::UnionVariant {
                    variant,
                    position: p,
                },
            ),
            None => Ok(()),
        }
    }

    /// Variant union berupa string. `None` = value absent, diterima.
    pub fn verify_union_string(&mut self, variant: &'static str, pos: Option<usize>) -> Result<()> {
        match pos {
            Some(p) => append_trace(
                self.verify_string(p),
                TraceDetail::UnionVariant {
                    variant,
                    position: p,
                },
            ),
            None => Ok(()),
        }
    }

    /// Top-level: size prefix, file identifier, root offset, root table.
    ///
    /// Mengembalikan absolute position root table.
    pub fn verify_root<T: Verifiable>(
        &mut self,
        identifier: Option<&str>,
        size_prefixed: bool,
    ) -> Result<usize> {
        self.reset();
        self.check_root::<T>(identifier, size_prefixed)
    }

    fn check_root<T: Verifiable>(
        &mut self,
        identifier: Option<&str>,
        size_prefixed: bool,
    ) -> Result<usize> {
        let start = if size_prefixed {
            let declared = self.read::<UOffset>(0)? as usize;
            let actual = self.buf.len() - SIZE_SIZE_PREFIX;
            if declared != actual {
                return Err(InvalidBuffer::SizePrefixMismatch { declared, actual });
            }
            SIZE_SIZE_PREFIX
        } else {
            0
        };

        if let Some(ident) = identifier {
            let at = start + SIZE_UOFFSET;
            let matches = self.buf.len() >= at + FILE_IDENTIFIER_LENGTH
                && &self.buf[at..at + FILE_IDENTIFIER_LENGTH] == ident.as_bytes();
            if !matches {
                return Err(InvalidBuffer::FileIdentifierMismatch {
                    expected: ident.to_owned(),
                });
            }
        }

        let root = self.check_indirect(start)?;
        T::run_verifier(self, root)?;
        Ok(root)
    }
}

/// Verifikasi field-field satu table. Dibuat oleh [`Verifier::visit_table`].
pub struct TableVerifier<'ver, 'opts, 'buf> {
    pos: usize,
    vtable: usize,
    vtable_len: usize,
    verifier: &'ver mut Verifier<'opts, 'buf>,
}

impl<'ver, 'opts, 'buf> TableVerifier<'ver, 'opts, 'buf> {
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Posisi absolut field di `slot`, `None` jika absent
    fn deref(&mut self, slot: VOffset) -> Result<Option<usize>> {
        let slot = slot as usize;
        if slot < self.vtable_len {
            let field_offset = self.verifier.read::<VOffset>(self.vtable + slot)?;
            if field_offset > 0 {
                return Ok(Some(self.pos + field_offset as usize));
            }
        }
        Ok(None)
    }

    fn absent(self, field: &'static str, required: bool) -> Result<Self> {
        if required {
            InvalidBuffer::missing_required(field)
        } else {
            Ok(self)
        }
    }

    /// Field yang berupa forward offset: cek offset, kembalikan target
    fn deref_indirect(&mut self, field: &'static str, slot: VOffset) -> Result<Option<usize>> {
        match self.deref(slot)? {
            Some(pos) => trace_field(self.verifier.check_indirect(pos), field, pos).map(Some),
            None => Ok(None),
        }
    }

    /// Scalar field
    pub fn visit_field<T: Scalar>(
        mut self,
        field: &'static str,
        slot: VOffset,
        required: bool,
    ) -> Result<Self> {
        match self.deref(slot)? {
            Some(pos) => {
                trace_field(self.verifier.in_buffer::<T>(pos), field, pos)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    /// Inline struct field (`size` bytes, aligned ke `align`)
    pub fn visit_struct(
        mut self,
        field: &'static str,
        slot: VOffset,
        size: usize,
        align: usize,
        required: bool,
    ) -> Result<Self> {
        match self.deref(slot)? {
            Some(pos) => {
                let res = self
                    .verifier
                    .is_aligned(pos, align, field)
                    .and_then(|_| self.verifier.range_in_buffer(pos, size));
                trace_field(res, field, pos)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    pub fn visit_string(
        mut self,
        field: &'static str,
        slot: VOffset,
        required: bool,
    ) -> Result<Self> {
        match self.deref_indirect(field, slot)? {
            Some(target) => {
                trace_field(self.verifier.verify_string(target), field, target)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    /// Sub-table field, diverifikasi oleh `T`
    pub fn visit_table<T: Verifiable>(
        mut self,
        field: &'static str,
        slot: VOffset,
        required: bool,
    ) -> Result<Self> {
        match self.deref_indirect(field, slot)? {
            Some(target) => {
                trace_field(T::run_verifier(self.verifier, target), field, target)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    pub fn visit_vector<T: Scalar>(
        mut self,
        field: &'static str,
        slot: VOffset,
        required: bool,
    ) -> Result<Self> {
        match self.deref_indirect(field, slot)? {
            Some(target) => {
                trace_field(self.verifier.verify_vector::<T>(target), field, target)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    pub fn visit_vector_of_structs(
        mut self,
        field: &'static str,
        slot: VOffset,
        size: usize,
        align: usize,
        required: bool,
    ) -> Result<Self> {
        match self.deref_indirect(field, slot)? {
            Some(target) => {
                let res = self.verifier.verify_vector_of_structs(target, size, align);
                trace_field(res, field, target)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    pub fn visit_vector_of_strings(
        mut self,
        field: &'static str,
        slot: VOffset,
        required: bool,
    ) -> Result<Self> {
        match self.deref_indirect(field, slot)? {
            Some(target) => {
                trace_field(self.verifier.verify_vector_of_strings(target), field, target)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    pub fn visit_vector_of_tables<T: Verifiable>(
        mut self,
        field: &'static str,
        slot: VOffset,
        required: bool,
    ) -> Result<Self> {
        match self.deref_indirect(field, slot)? {
            Some(target) => {
                trace_field(self.verifier.verify_vector_of_tables::<T>(target), field, target)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    /// Byte vector berisi nested buffer dengan root type `T`
    pub fn visit_nested_buffer<T: Verifiable>(
        mut self,
        field: &'static str,
        slot: VOffset,
        required: bool,
    ) -> Result<Self> {
        match self.deref_indirect(field, slot)? {
            Some(target) => {
                trace_field(self.verifier.verify_nested_buffer::<T>(target), field, target)?;
                Ok(self)
            }
            None => self.absent(field, required),
        }
    }

    /// Union: cek type byte (absent = 0/NONE), cek offset value, lalu
    /// dispatch ke `verify_variant(type_id, verifier, value_pos)`.
    ///
    /// `value_pos == None` berarti value absent; callback tetap dipanggil
    /// supaya semantik required/optional untuk type tertentu tetap benar.
    pub fn visit_union<F>(
        mut self,
        type_field: &'static str,
        type_slot: VOffset,
        value_field: &'static str,
        value_slot: VOffset,
        required: bool,
        verify_variant: F,
    ) -> Result<Self>
    where
        F: FnOnce(u8, &mut Verifier<'opts, 'buf>, Option<usize>) -> Result<()>,
    {
        let type_id = match self.deref(type_slot)? {
            Some(pos) => {
                trace_field(self.verifier.in_buffer::<u8>(pos), type_field, pos)?;
                self.verifier.buf[pos]
            }
            None => 0,
        };

        let value = self.deref_indirect(value_field, value_slot)?;
        if value.is_none() && required {
            return InvalidBuffer::missing_required(value_field);
        }

        let res = verify_variant(type_id, self.verifier, value);
        trace_field(res, value_field, value.unwrap_or(self.pos))?;
        Ok(self)
    }

    /// Tutup table, kembalikan verifier ke parent
    pub fn finish(self) -> &'ver mut Verifier<'opts, 'buf> {
        self.verifier.depth -= 1;
        self.verifier
    }
}

/// Verifikasi buffer dengan root type `T`
pub fn verify_buffer<T: Verifiable>(
    opts: &VerifierOptions,
    buf: &[u8],
    identifier: Option<&str>,
) -> Result<()> {
    root_verified::<T>(opts, buf, identifier).map(|_| ())
}

/// Verifikasi buffer yang diawali 4-byte size prefix
pub fn verify_size_prefixed_buffer<T: Verifiable>(
    opts: &VerifierOptions,
    buf: &[u8],
    identifier: Option<&str>,
) -> Result<()> {
    size_prefixed_root_verified::<T>(opts, buf, identifier).map(|_| ())
}

/// Verifikasi lalu kembalikan accessor root table
pub fn root_verified<'buf, T: Verifiable>(
    opts: &VerifierOptions,
    buf: &'buf [u8],
    identifier: Option<&str>,
) -> Result<Table<'buf>> {
    run_top_level::<T>(opts, buf, identifier, false)
}

pub fn size_prefixed_root_verified<'buf, T: Verifiable>(
    opts: &VerifierOptions,
    buf: &'buf [u8],
    identifier: Option<&str>,
) -> Result<Table<'buf>> {
    run_top_level::<T>(opts, buf, identifier, true)
}

fn run_top_level<'buf, T: Verifiable>(
    opts: &VerifierOptions,
    buf: &'buf [u8],
    identifier: Option<&str>,
    size_prefixed: bool,
) -> Result<Table<'buf>> {
    let mut verifier = Verifier::new(opts, buf);
    match verifier.verify_root::<T>(identifier, size_prefixed) {
        Ok(root) => Ok(Table::new(buf, root)),
        Err(e) => {
            log::debug!("rejected {}-byte buffer: {}", buf.len(), e);
            Err(e)
        }
    }
}
