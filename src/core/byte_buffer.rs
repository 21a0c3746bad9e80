//! Growable Byte Storage dengan cursor
//!
//! Backing storage untuk Builder. Semua akses pakai absolute offset,
//! plus satu cursor (`position`) untuk pembacaan/penulisan sekuensial.

use std::ops::Range;

use super::scalar::{read_scalar_at, write_scalar_at, Scalar};

/// Byte array milik sendiri + read/write cursor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    position: usize,
}

impl ByteBuffer {
    /// Alokasi buffer zero-filled dengan kapasitas tertentu
    pub fn allocate(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            position: 0,
        }
    }

    /// Bungkus `Vec<u8>` yang sudah ada (cursor di 0)
    pub fn wrap(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline(always)]
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Sisa bytes dari cursor sampai akhir buffer
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    #[inline(always)]
    pub fn get<T: Scalar>(&self, pos: usize) -> T {
        read_scalar_at(&self.data, pos)
    }

    #[inline(always)]
    pub fn put<T: Scalar>(&mut self, pos: usize, value: T) {
        write_scalar_at(&mut self.data, pos, value);
    }

    #[inline(always)]
    pub fn get_bytes(&self, pos: usize, len: usize) -> &[u8] {
        &self.data[pos..pos + len]
    }

    #[inline(always)]
    pub fn put_bytes(&mut self, pos: usize, bytes: &[u8]) {
        self.data[pos..pos + bytes.len()].copy_from_slice(bytes);
    }

    /// Baca scalar di cursor lalu majukan cursor
    #[inline(always)]
    pub fn read<T: Scalar>(&mut self) -> T {
        let v = self.get(self.position);
        self.position += T::SIZE;
        v
    }

    /// Tulis scalar di cursor lalu majukan cursor
    #[inline(always)]
    pub fn write<T: Scalar>(&mut self, value: T) {
        self.put(self.position, value);
        self.position += T::SIZE;
    }

    pub fn fill_zero(&mut self, range: Range<usize>) {
        self.data[range].fill(0);
    }

    /// Perbesar buffer ke `new_capacity`, isi lama dipindah ke TAIL.
    ///
    /// Builder mengisi buffer dari belakang, jadi semua offset yang diukur
    /// dari ujung buffer tetap valid setelah grow. Bagian depan zero-filled.
    ///
    /// # Panics
    /// Panic jika `new_capacity` lebih kecil dari kapasitas sekarang
    pub fn grow_front(&mut self, new_capacity: usize) {
        let old_capacity = self.data.len();
        assert!(
            new_capacity >= old_capacity,
            "grow_front cannot shrink the buffer"
        );

        let diff = new_capacity - old_capacity;
        self.data.resize(new_capacity, 0);
        if old_capacity > 0 && diff > 0 {
            self.data.copy_within(0..old_capacity, diff);
            self.data[..diff].fill(0);
        }
        self.position += diff;
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
