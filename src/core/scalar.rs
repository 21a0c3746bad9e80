//! Little-Endian Scalar Primitives
//!
//! Semua scalar di format ini disimpan little-endian, tanpa peduli
//! endianness host. Float di-reinterpret lewat integer word (`to_bits`),
//! jadi hasilnya bit-exact di semua platform.

/// Tipe fixed-width yang bisa dibaca/ditulis langsung dari byte buffer.
pub trait Scalar: Copy + PartialEq + Sized {
    /// Ukuran dalam bytes (juga alignment-nya di dalam buffer)
    const SIZE: usize;

    /// Baca dari `src[..SIZE]`
    fn read_le(src: &[u8]) -> Self;

    /// Tulis ke `dst[..SIZE]`
    fn write_le(self, dst: &mut [u8]);
}

macro_rules! impl_scalar_int {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline(always)]
                fn read_le(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..Self::SIZE]);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline(always)]
                fn write_le(self, dst: &mut [u8]) {
                    dst[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_scalar_int!(u8, i8, u16, i16, u32, i32, u64, i64);

impl Scalar for bool {
    const SIZE: usize = 1;

    #[inline(always)]
    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }

    #[inline(always)]
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }
}

impl Scalar for f32 {
    const SIZE: usize = 4;

    #[inline(always)]
    fn read_le(src: &[u8]) -> Self {
        f32::from_bits(u32::read_le(src))
    }

    #[inline(always)]
    fn write_le(self, dst: &mut [u8]) {
        self.to_bits().write_le(dst);
    }
}

impl Scalar for f64 {
    const SIZE: usize = 8;

    #[inline(always)]
    fn read_le(src: &[u8]) -> Self {
        f64::from_bits(u64::read_le(src))
    }

    #[inline(always)]
    fn write_le(self, dst: &mut [u8]) {
        self.to_bits().write_le(dst);
    }
}

/// Baca scalar di absolute position `pos`.
///
/// Jalur trusted: hanya dilindungi slice bounds check bawaan Rust,
/// tidak ada validasi alignment. Untuk input dari luar, lewati Verifier dulu.
#[inline(always)]
pub fn read_scalar_at<T: Scalar>(buf: &[u8], pos: usize) -> T {
    T::read_le(&buf[pos..pos + T::SIZE])
}

/// Tulis scalar di absolute position `pos`.
#[inline(always)]
pub fn write_scalar_at<T: Scalar>(buf: &mut [u8], pos: usize, value: T) {
    value.write_le(&mut buf[pos..pos + T::SIZE]);
}

/// Bytes UTF-8 untuk disimpan sebagai payload string (identity di Rust)
#[inline(always)]
pub fn encode_utf8(s: &str) -> &[u8] {
    s.as_bytes()
}

/// Decode payload UTF-8 (checked).
#[inline]
pub fn decode_utf8(bytes: &[u8]) -> Result<&str, std::str::Utf8Error> {
    std::str::from_utf8(bytes)
}

/// Jumlah UTF-16 code unit untuk string ini.
///
/// Code point di atas BMP dihitung dua (surrogate pair), untuk consumer
/// yang menjembatani ke runtime berbasis UTF-16.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}
