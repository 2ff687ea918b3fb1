use unicode_normalization::UnicodeNormalization;

/// Brings a password into Unicode NFKC form.
///
/// Composed and decomposed spellings of the same text ("é" versus "e" plus a
/// combining accent) then hash to the same value. Hashes of passwords that
/// were never normalized will not verify against normalized input, so callers
/// must apply this consistently on both sides.
pub fn normalize_password(password: &str) -> String {
    password.nfkc().collect()
}
