//! Backward-Growing Buffer Builder
//!
//! Buffer diisi dari alamat tinggi ke rendah. Konsekuensinya:
//! - Semua offset yang sudah dihitung diukur dari UJUNG buffer, jadi
//!   tetap valid ketika buffer di-grow (isi lama pindah ke tail)
//! - Child object selalu ditulis sebelum parent, sehingga setiap
//!   offset yang disimpan menunjuk ke depan
//! - Vector ditulis body dulu, length prefix terakhir
//!
//! Builder tidak reentrant: satu instance = satu encode pada satu waktu.

use std::cmp::max;
use std::collections::HashMap;

use crate::core::{encode_utf8, ByteBuffer, Scalar};

use super::layout::{
    kind, padding_bytes, slot_index, InlineStruct, Offset, SOffset, UOffset, VOffset,
    FILE_IDENTIFIER_LENGTH, MAX_BUFFER_SIZE, SIZE_UOFFSET, VTABLE_METADATA_FIELDS, SIZE_VOFFSET,
};
use super::table::Table;

/// Kapasitas awal default (akan di-double sesuai kebutuhan)
pub const DEFAULT_CAPACITY: usize = 1024;

/// Stateful encoder: table, vector, string, struct -> satu finished buffer
#[derive(Debug)]
pub struct Builder {
    buf: ByteBuffer,
    // Index byte pertama yang terpakai; free space = [0, head)
    head: usize,
    min_align: usize,

    // Scratch vtable table yang sedang dibangun: per field index,
    // offset field (koordinat Builder) atau 0 jika absent
    vtable: Vec<UOffset>,
    object_start: UOffset,
    // Offset semua vtable yang sudah ditulis, urut penulisan
    written_vtables: Vec<UOffset>,

    nested: bool,
    finished: bool,
    force_defaults: bool,

    shared_strings: HashMap<String, Offset<kind::String>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Membuat builder dengan kapasitas awal tertentu
    ///
    /// # Panics
    /// Panic jika `capacity` melebihi batas format (2 GiB)
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity <= MAX_BUFFER_SIZE,
            "cannot initialize buffer bigger than 2 gigabytes"
        );

        Self {
            buf: ByteBuffer::allocate(capacity),
            head: capacity,
            min_align: 1,
            vtable: Vec::new(),
            object_start: 0,
            written_vtables: Vec::new(),
            nested: false,
            finished: false,
            force_defaults: false,
            shared_strings: HashMap::new(),
        }
    }

    /// Reset builder untuk reuse. Kapasitas dipertahankan.
    pub fn clear(&mut self) {
        let capacity = self.buf.capacity();
        self.buf.fill_zero(self.head..capacity);
        self.head = capacity;
        self.min_align = 1;
        self.vtable.clear();
        self.object_start = 0;
        self.written_vtables.clear();
        self.nested = false;
        self.finished = false;
        self.shared_strings.clear();
    }

    /// Tulis field walaupun nilainya sama dengan default
    pub fn force_defaults(&mut self, force: bool) {
        self.force_defaults = force;
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Bytes yang sudah dipakai, koordinat semua [`Offset`]
    #[inline(always)]
    pub fn offset(&self) -> UOffset {
        (self.buf.capacity() - self.head) as UOffset
    }

    /// Jumlah vtable unik yang sudah ditulis sejak `clear()` terakhir
    #[inline(always)]
    pub fn num_written_vtables(&self) -> usize {
        self.written_vtables.len()
    }

    /// Double kapasitas, isi lama pindah ke tail
    fn grow(&mut self) {
        let old_capacity = self.buf.capacity();
        assert!(
            old_capacity < MAX_BUFFER_SIZE,
            "cannot grow buffer beyond 2 gigabytes"
        );

        let new_capacity = max(1, old_capacity * 2).min(MAX_BUFFER_SIZE);
        self.buf.grow_front(new_capacity);
        self.head += new_capacity - old_capacity;

        log::trace!("builder grew {} -> {} bytes", old_capacity, new_capacity);
    }

    #[inline(always)]
    fn ensure_space(&mut self, want: usize) {
        while self.head < want {
            self.grow();
        }
    }

    /// Siapkan tempat untuk scalar `size` bytes setelah `additional` bytes
    /// lain ditulis, dengan padding supaya scalar itu aligned.
    ///
    /// Alignment dihitung dari ujung buffer (buffer tumbuh ke belakang).
    #[inline]
    pub fn prep(&mut self, size: usize, additional: usize) {
        self.min_align = max(self.min_align, size);

        let align_size = padding_bytes(self.offset() as usize + additional, size);
        self.ensure_space(align_size + size + additional);
        self.pad(align_size);
    }

    /// Tulis `n` zero bytes
    #[inline]
    pub fn pad(&mut self, n: usize) {
        self.ensure_space(n);
        self.head -= n;
        self.buf.fill_zero(self.head..self.head + n);
    }

    /// Tulis scalar tanpa alignment. Caller wajib sudah `prep`.
    #[inline(always)]
    pub fn place<T: Scalar>(&mut self, value: T) {
        self.head -= T::SIZE;
        self.buf.put(self.head, value);
    }

    /// Tulis raw bytes tanpa alignment. Caller wajib sudah `prep`.
    #[inline(always)]
    pub fn place_bytes(&mut self, bytes: &[u8]) {
        self.head -= bytes.len();
        self.buf.put_bytes(self.head, bytes);
    }

    /// Tulis scalar dengan alignment natural-nya
    #[inline]
    pub fn push<T: Scalar>(&mut self, value: T) -> UOffset {
        self.prep(T::SIZE, 0);
        self.place(value);
        self.offset()
    }

    /// Tulis forward offset ke `target` (relatif ke posisi offset itu sendiri)
    ///
    /// # Panics
    /// Panic jika `target` belum ditulis (menunjuk ke belakang)
    #[inline]
    pub fn push_offset<K>(&mut self, target: Offset<K>) -> UOffset {
        self.prep(SIZE_UOFFSET, 0);
        assert!(
            target.value() <= self.offset(),
            "offset must point to data already written"
        );
        let relative = self.offset() - target.value() + SIZE_UOFFSET as UOffset;
        self.place(relative);
        self.offset()
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Mulai table baru dengan `num_fields` slot (boleh bertambah lewat `slot`)
    ///
    /// # Panics
    /// Panic jika table/vector lain masih terbuka
    pub fn start_table(&mut self, num_fields: usize) {
        self.assert_not_nested(
            "start_table can not be called when a table or vector is under construction",
        );
        self.vtable.clear();
        self.vtable.resize(num_fields, 0);
        self.nested = true;
        self.object_start = self.offset();
    }

    /// Catat bahwa field di `slot` baru saja ditulis di posisi cursor
    #[inline]
    pub fn slot(&mut self, slot: VOffset) {
        self.assert_nested("slot");
        assert!(
            slot as usize >= VTABLE_METADATA_FIELDS * SIZE_VOFFSET && slot % 2 == 0,
            "invalid field slot {}",
            slot
        );

        let idx = slot_index(slot) as usize;
        if idx >= self.vtable.len() {
            self.vtable.resize(idx + 1, 0);
        }
        self.vtable[idx] = self.offset();
    }

    /// Scalar field; dilewati jika sama dengan default (kecuali `force_defaults`)
    #[inline]
    pub fn push_slot<T: Scalar>(&mut self, slot: VOffset, value: T, default: T) {
        if self.force_defaults || value != default {
            self.push_slot_always(slot, value);
        }
    }

    #[inline]
    pub fn push_slot_always<T: Scalar>(&mut self, slot: VOffset, value: T) {
        self.assert_nested("push_slot_always");
        self.push(value);
        self.slot(slot);
    }

    /// Offset field (string/vector/table/union value). Null offset dilewati.
    #[inline]
    pub fn push_slot_offset<K>(&mut self, slot: VOffset, target: Offset<K>) {
        self.assert_nested("push_slot_offset");
        if !target.is_null() {
            self.push_offset(target);
            self.slot(slot);
        }
    }

    /// Inline struct field. Struct harus baru saja ditulis tepat di cursor.
    ///
    /// # Panics
    /// Panic jika ada write lain di antara struct dan pemanggilan ini
    #[inline]
    pub fn push_slot_struct(&mut self, slot: VOffset, value: Offset<kind::Struct>) {
        self.assert_nested("push_slot_struct");
        assert_eq!(
            value.value(),
            self.offset(),
            "struct must be serialized inline"
        );
        self.slot(slot);
    }

    /// Union: discriminant byte + offset payload
    #[inline]
    pub fn push_slot_union<K>(
        &mut self,
        type_slot: VOffset,
        value_slot: VOffset,
        type_id: u8,
        value: Offset<K>,
    ) {
        self.push_slot(type_slot, type_id, 0);
        self.push_slot_offset(value_slot, value);
    }

    /// Tutup table: tulis soffset + vtable (trim trailing zero), lalu
    /// dedup terhadap vtable yang sudah ada berdasarkan isi byte.
    ///
    /// # Panics
    /// Panic tanpa `start_table`, atau jika inline size table > 64 KiB
    pub fn end_table(&mut self) -> Offset<kind::Table> {
        self.assert_nested("end_table");

        // Placeholder soffset, di-patch setelah vtable final diketahui
        self.push::<SOffset>(0);
        let object_offset = self.offset();

        let table_size = object_offset - self.object_start;
        assert!(
            table_size <= VOffset::MAX as UOffset,
            "table is too large for 16-bit vtable offsets"
        );

        let trimmed = self
            .vtable
            .iter()
            .rposition(|&off| off != 0)
            .map_or(0, |i| i + 1);
        let vtable_len = (trimmed + VTABLE_METADATA_FIELDS) * SIZE_VOFFSET;

        for i in (0..trimmed).rev() {
            let field_offset = match self.vtable[i] {
                0 => 0,
                off => object_offset - off,
            };
            self.push::<VOffset>(field_offset as VOffset);
        }
        self.push::<VOffset>(table_size as VOffset);
        self.push::<VOffset>(vtable_len as VOffset);

        let capacity = self.buf.capacity();
        let vtable_pos = self.head;

        // Backward linear scan: vtable terbaru paling mungkin match
        let existing = {
            let data = self.buf.as_slice();
            let candidate = &data[vtable_pos..vtable_pos + vtable_len];
            // Byte pertama vtable = panjangnya, jadi prefix match = exact match
            self.written_vtables
                .iter()
                .rev()
                .copied()
                .find(|&old| data[capacity - old as usize..].starts_with(candidate))
        };

        let vtable_offset = match existing {
            Some(old) => {
                // Rewind copy yang baru ditulis
                self.buf.fill_zero(vtable_pos..vtable_pos + vtable_len);
                self.head = capacity - object_offset as usize;
                log::trace!("reusing vtable at offset {}", old);
                old
            }
            None => {
                let off = self.offset();
                self.written_vtables.push(off);
                off
            }
        };

        let table_pos = capacity - object_offset as usize;
        self.buf.put::<SOffset>(
            table_pos,
            vtable_offset as SOffset - object_offset as SOffset,
        );

        self.nested = false;
        self.vtable.clear();
        Offset::new(object_offset)
    }

    /// Pastikan field `required` ada di table yang sudah di-`end_table`
    ///
    /// # Panics
    /// Panic jika field absent
    pub fn required(&self, table: Offset<kind::Table>, slot: VOffset, field_name: &str) {
        let table_pos = self.buf.capacity() - table.value() as usize;
        let present = Table::new(self.buf.as_slice(), table_pos).vtable().get(slot) != 0;
        assert!(present, "missing required field {}", field_name);
    }

    // ------------------------------------------------------------------
    // Vectors & strings
    // ------------------------------------------------------------------

    /// Mulai vector; elemen ditulis dari yang TERAKHIR
    ///
    /// # Panics
    /// Panic jika table/vector lain masih terbuka
    pub fn start_vector(&mut self, elem_size: usize, num_elems: usize, alignment: usize) {
        self.assert_not_nested(
            "start_vector can not be called when a table or vector is under construction",
        );
        self.nested = true;
        let body = elem_size * num_elems;
        self.prep(SIZE_UOFFSET, body);
        self.prep(alignment, body);
    }

    /// Tutup vector dengan menulis length prefix
    pub fn end_vector(&mut self, num_elems: usize) -> Offset<kind::Vector> {
        self.assert_nested("end_vector");
        self.nested = false;
        Offset::new(self.push::<UOffset>(num_elems as UOffset))
    }

    pub fn create_vector<T: Scalar>(&mut self, items: &[T]) -> Offset<kind::Vector> {
        self.start_vector(T::SIZE, items.len(), T::SIZE);
        for &item in items.iter().rev() {
            self.place(item);
        }
        self.end_vector(items.len())
    }

    pub fn create_byte_vector(&mut self, bytes: &[u8]) -> Offset<kind::Vector> {
        self.start_vector(1, bytes.len(), 1);
        self.place_bytes(bytes);
        self.end_vector(bytes.len())
    }

    /// Byte vector berisi buffer lain (nested buffer), data di-align ke
    /// `alignment` supaya scalar di dalamnya tetap aligned
    ///
    /// # Panics
    /// Panic jika `alignment` bukan power of 2
    pub fn create_nested_buffer(&mut self, bytes: &[u8], alignment: usize) -> Offset<kind::Vector> {
        assert!(
            alignment.is_power_of_two(),
            "nested buffer alignment must be a power of 2, got {}",
            alignment
        );
        self.start_vector(1, bytes.len(), alignment);
        self.place_bytes(bytes);
        self.end_vector(bytes.len())
    }

    pub fn create_vector_of_offsets<K>(&mut self, items: &[Offset<K>]) -> Offset<kind::Vector> {
        self.start_vector(SIZE_UOFFSET, items.len(), SIZE_UOFFSET);
        for &item in items.iter().rev() {
            self.push_offset(item);
        }
        self.end_vector(items.len())
    }

    pub fn create_vector_of_strings(&mut self, items: &[&str]) -> Offset<kind::Vector> {
        let offsets: Vec<Offset<kind::String>> =
            items.iter().map(|s| self.create_string(s)).collect();
        self.create_vector_of_offsets(&offsets)
    }

    pub fn create_vector_of_structs<S: InlineStruct>(&mut self, items: &[S]) -> Offset<kind::Vector> {
        self.start_vector(S::SIZE, items.len(), S::ALIGN);
        for item in items.iter().rev() {
            self.head -= S::SIZE;
            let head = self.head;
            item.write_to(&mut self.buf.as_mut_slice()[head..head + S::SIZE]);
        }
        self.end_vector(items.len())
    }

    /// String UTF-8: `[len: u32][bytes][0x00]`
    pub fn create_string(&mut self, s: &str) -> Offset<kind::String> {
        self.create_byte_string(encode_utf8(s))
    }

    /// # Panics
    /// Panic jika table/vector masih terbuka
    pub fn create_byte_string(&mut self, bytes: &[u8]) -> Offset<kind::String> {
        self.assert_not_nested(
            "create_string can not be called when a table or vector is under construction",
        );
        self.prep(SIZE_UOFFSET, bytes.len() + 1);
        self.place(0u8);
        self.place_bytes(bytes);
        self.place(bytes.len() as UOffset);
        Offset::new(self.offset())
    }

    /// Seperti `create_string`, tapi string dengan isi sama hanya ditulis
    /// sekali selama umur builder ini (sampai `clear()`)
    pub fn create_shared_string(&mut self, s: &str) -> Offset<kind::String> {
        self.assert_not_nested(
            "create_shared_string can not be called when a table or vector is under construction",
        );
        if let Some(&off) = self.shared_strings.get(s) {
            return off;
        }
        let off = self.create_string(s);
        self.shared_strings.insert(s.to_owned(), off);
        off
    }

    // ------------------------------------------------------------------
    // Structs
    // ------------------------------------------------------------------

    /// Siapkan inline struct `size` bytes; field ditulis mundur via `place`/`pad`
    #[inline]
    pub fn start_struct(&mut self, size: usize, alignment: usize) {
        self.prep(alignment, size);
    }

    /// Offset struct yang baru selesai ditulis
    #[inline(always)]
    pub fn end_struct(&self) -> Offset<kind::Struct> {
        Offset::new(self.offset())
    }

    pub fn create_struct<S: InlineStruct>(&mut self, value: &S) -> Offset<kind::Struct> {
        self.start_struct(S::SIZE, S::ALIGN);
        self.head -= S::SIZE;
        let head = self.head;
        value.write_to(&mut self.buf.as_mut_slice()[head..head + S::SIZE]);
        self.end_struct()
    }

    // ------------------------------------------------------------------
    // Finish
    // ------------------------------------------------------------------

    /// Tulis root offset (+ file identifier opsional)
    ///
    /// # Panics
    /// Panic jika sudah finished, masih nested, atau identifier bukan 4 bytes
    pub fn finish<K>(&mut self, root: Offset<K>, file_identifier: Option<&str>) {
        self.finish_with_opts(root, file_identifier, false);
    }

    /// Seperti `finish`, plus 4-byte total size prefix di depan
    pub fn finish_size_prefixed<K>(&mut self, root: Offset<K>, file_identifier: Option<&str>) {
        self.finish_with_opts(root, file_identifier, true);
    }

    pub fn finish_minimal<K>(&mut self, root: Offset<K>) {
        self.finish_with_opts(root, None, false);
    }

    fn finish_with_opts<K>(
        &mut self,
        root: Offset<K>,
        file_identifier: Option<&str>,
        size_prefixed: bool,
    ) {
        assert!(
            !self.finished,
            "buffer cannot be finished when it is already finished"
        );
        self.assert_not_nested(
            "buffer cannot be finished when a table or vector is under construction",
        );
        if let Some(ident) = file_identifier {
            assert_eq!(
                ident.len(),
                FILE_IDENTIFIER_LENGTH,
                "file identifier must be exactly 4 bytes"
            );
        }

        let prefix_len = if size_prefixed { SIZE_UOFFSET } else { 0 };
        let ident_len = file_identifier.map_or(0, |_| FILE_IDENTIFIER_LENGTH);
        let root_align = max(self.min_align, SIZE_UOFFSET);
        self.prep(root_align, SIZE_UOFFSET + prefix_len + ident_len);

        if let Some(ident) = file_identifier {
            self.place_bytes(ident.as_bytes());
        }
        self.push_offset(root);

        if size_prefixed {
            let size = self.offset();
            self.push::<UOffset>(size);
        }

        self.written_vtables.clear();
        self.finished = true;
    }

    /// Finished buffer, siap dibaca/dikirim
    ///
    /// # Panics
    /// Panic jika belum `finish`
    #[inline]
    pub fn finished_data(&self) -> &[u8] {
        assert!(
            self.finished,
            "finished_data cannot be called when the buffer is not yet finished"
        );
        &self.buf.as_slice()[self.head..]
    }

    /// Bytes yang sudah ditulis (boleh belum finished)
    #[inline]
    pub fn unfinished_data(&self) -> &[u8] {
        &self.buf.as_slice()[self.head..]
    }

    /// Ambil storage mentah + index awal data valid
    pub fn collapse(self) -> (Vec<u8>, usize) {
        let head = self.head;
        (self.buf.into_vec(), head)
    }

    /// Finished buffer sebagai `Vec<u8>` milik sendiri
    ///
    /// # Panics
    /// Panic jika belum `finish`
    pub fn into_finished_vec(self) -> Vec<u8> {
        assert!(
            self.finished,
            "into_finished_vec cannot be called when the buffer is not yet finished"
        );
        let (mut data, head) = self.collapse();
        data.drain(..head);
        data
    }

    #[inline(always)]
    fn assert_nested(&self, fn_name: &'static str) {
        assert!(
            self.nested,
            "incorrect builder usage: {} must be called while in a table or vector",
            fn_name
        );
    }

    #[inline(always)]
    fn assert_not_nested(&self, msg: &'static str) {
        assert!(!self.nested, "{}", msg);
    }
}
