//! Verifier configuration

/// Batas-batas verifikasi. Ceiling ini yang membuat biaya verifikasi
/// bounded, tidak tergantung ukuran yang dideklarasikan attacker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierOptions {
    /// Kedalaman nesting table maksimum
    pub max_depth: usize,
    /// Jumlah table maksimum di seluruh buffer
    pub max_tables: usize,
    /// Ukuran "apparent" maksimum jika DAG di-expand jadi tree
    pub max_apparent_size: usize,
    /// Wajibkan NUL terminator setelah setiap string
    pub check_string_terminator: bool,
    /// Wajibkan setiap scalar aligned terhadap awal buffer
    pub check_alignment: bool,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_tables: 1_000_000,
            max_apparent_size: 1 << 31,
            check_string_terminator: true,
            check_alignment: true,
        }
    }
}
