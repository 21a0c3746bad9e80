//! Memory-Mapped Buffer untuk Zero-Copy load dari disk
//!
//! Finished buffer bisa di-persist ke file lalu di-mmap read-only:
//! - Zero-copy read: accessor langsung baca dari page cache
//! - Verifier jalan di atas mapping yang sama, tanpa copy ke heap
//! - Mapping immutable, aman di-share ke banyak reader

use memmap2::{Mmap, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Finished buffer yang di-back oleh read-only mmap
pub struct MappedBuffer {
    mmap: Option<Mmap>,
}

impl MappedBuffer {
    /// Membuka file dan mmap seluruh isinya (read-only)
    ///
    /// File kosong tidak bisa di-mmap di semua platform, jadi kita
    /// representasikan sebagai buffer kosong.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        if len == 0 {
            return Ok(Self { mmap: None });
        }

        // SAFETY: Mapping read-only; caller tidak boleh truncate file
        // selama MappedBuffer masih hidup
        let mmap = unsafe { MmapOptions::new().len(len as usize).map(&file)? };

        log::trace!("mapped {} bytes read-only", len);
        Ok(Self { mmap: Some(mmap) })
    }

    /// Tulis finished buffer ke file (truncate + sync)
    pub fn persist<P: AsRef<Path>>(path: P, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(data)?;
        file.sync_all()
    }

    /// Bytes hasil mapping (zero-copy)
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.mmap {
            Some(m) => &m[..],
            None => &[],
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AsRef<[u8]> for MappedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
