//! Protocol Layer: Zero-Copy Binary Object Format
//!
//! Prinsip desain:
//! - Flat Binary: Finished buffer dibaca langsung tanpa parsing/unpacking
//! - Schema evolution: Field di-resolve lewat vtable, field baru = slot baru
//! - Backward build: Builder menulis dari ujung buffer, child sebelum parent

mod builder;
mod layout;
mod table;
mod vector;

pub use builder::{Builder, DEFAULT_CAPACITY};
pub use layout::{
    field_slot, kind, padding_bytes, slot_index, InlineStruct, Offset, SOffset, UOffset, VOffset,
    FILE_IDENTIFIER_LENGTH, MAX_BUFFER_SIZE, SIZE_SIZE_PREFIX, SIZE_SOFFSET, SIZE_UOFFSET,
    SIZE_VOFFSET, VTABLE_METADATA_FIELDS,
};
pub use table::{
    buffer_has_identifier, indirect, read_size_prefix, root_table, size_prefixed_root_table,
    vector_bytes, vector_len, vector_start, Table, VTable,
};
pub use vector::{Follow, StructElem, Vector, VectorIter};
