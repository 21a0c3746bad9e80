//! Zero-Copy Vector Accessor
//!
//! Layout: `[count: u32][element]*`. Elemen bisa scalar, inline struct,
//! atau forward offset ke table/string.

use std::marker::PhantomData;

use crate::core::{decode_utf8, read_scalar_at};

use super::layout::{InlineStruct, SIZE_UOFFSET};
use super::table::{indirect, vector_bytes, vector_len, vector_start, Table};

/// Cara membaca satu elemen dari posisi absolut di buffer
pub trait Follow<'a> {
    type Inner;
    /// Ukuran slot elemen di dalam vector
    const SIZE: usize;

    fn follow(buf: &'a [u8], loc: usize) -> Self::Inner;
}

macro_rules! impl_follow_scalar {
    ($($ty:ty),*) => {
        $(
            impl<'a> Follow<'a> for $ty {
                type Inner = $ty;
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline(always)]
                fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                    read_scalar_at(buf, loc)
                }
            }
        )*
    };
}

impl_follow_scalar!(bool, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl<'a> Follow<'a> for Table<'a> {
    type Inner = Table<'a>;
    const SIZE: usize = SIZE_UOFFSET;

    #[inline(always)]
    fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Table::new(buf, indirect(buf, loc))
    }
}

impl<'a> Follow<'a> for &'a str {
    type Inner = &'a str;
    const SIZE: usize = SIZE_UOFFSET;

    /// String yang bukan UTF-8 valid dibaca sebagai `""`.
    ///
    /// Beda dengan [`Table::get_str`] yang mengembalikan `None`: elemen
    /// vector selalu ada, jadi tidak ada slot untuk "absent". Buffer yang
    /// lolos Verifier tidak pernah kena kasus ini.
    #[inline(always)]
    fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        decode_utf8(vector_bytes(buf, indirect(buf, loc))).unwrap_or_default()
    }
}

/// Marker elemen inline struct: `Vector<'a, StructElem<Vec3>>`
pub struct StructElem<S>(PhantomData<S>);

impl<'a, S: InlineStruct> Follow<'a> for StructElem<S> {
    type Inner = S;
    const SIZE: usize = S::SIZE;

    #[inline(always)]
    fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        S::read_from(&buf[loc..loc + S::SIZE])
    }
}

/// View ke vector di dalam buffer
pub struct Vector<'a, T> {
    buf: &'a [u8],
    loc: usize,
    _elem: PhantomData<T>,
}

impl<'a, T> Clone for Vector<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Vector<'a, T> {}

impl<'a, T> std::fmt::Debug for Vector<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("loc", &self.loc)
            .field("len", &vector_len(self.buf, self.loc))
            .finish()
    }
}

impl<'a, T: Follow<'a>> Vector<'a, T> {
    /// Vector yang length prefix-nya ada di `loc`
    #[inline(always)]
    pub fn new(buf: &'a [u8], loc: usize) -> Self {
        Self {
            buf,
            loc,
            _elem: PhantomData,
        }
    }

    #[inline(always)]
    pub fn loc(&self) -> usize {
        self.loc
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        vector_len(self.buf, self.loc)
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elemen ke-`idx`
    ///
    /// # Panics
    /// Panic jika `idx >= len()`
    #[inline]
    pub fn get(&self, idx: usize) -> T::Inner {
        assert!(idx < self.len(), "vector index {} out of range", idx);
        T::follow(self.buf, vector_start(self.loc) + idx * T::SIZE)
    }

    /// Region elemen mentah (tanpa length prefix)
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        let start = vector_start(self.loc);
        &self.buf[start..start + self.len() * T::SIZE]
    }

    #[inline]
    pub fn iter(&self) -> VectorIter<'a, T> {
        VectorIter {
            buf: self.buf,
            pos: vector_start(self.loc),
            remaining: self.len(),
            _elem: PhantomData,
        }
    }
}

impl<'a, T: Follow<'a>> IntoIterator for Vector<'a, T> {
    type Item = T::Inner;
    type IntoIter = VectorIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator elemen vector (zero-copy)
pub struct VectorIter<'a, T> {
    buf: &'a [u8],
    pos: usize,
    remaining: usize,
    _elem: PhantomData<T>,
}

impl<'a, T: Follow<'a>> Iterator for VectorIter<'a, T> {
    type Item = T::Inner;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = T::follow(self.buf, self.pos);
        self.pos += T::SIZE;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T: Follow<'a>> ExactSizeIterator for VectorIter<'a, T> {}
