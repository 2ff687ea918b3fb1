use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{P_INIT, S_INIT};

const ROUNDS: usize = 16;
const SUBKEYS: usize = ROUNDS + 2;

/// Blowfish key schedule and block encryption.
///
/// Every hash or verify call builds its own instance, so the tables are never
/// shared between threads. The state is wiped when the instance is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Blowfish {
    p: [u32; SUBKEYS],
    s: [[u32; 256]; 4],
}

impl Blowfish {
    /// A cipher loaded with the canonical pi-derived subkeys and S-boxes.
    pub fn new() -> Self {
        Blowfish {
            p: P_INIT,
            s: S_INIT,
        }
    }

    /// Mixes `key` into the subkeys, then regenerates every subkey and S-box
    /// entry by encrypting a running block that has `salt` XORed into it
    /// before each encryption.
    ///
    /// `key` and `salt` are read cyclically as big-endian words. Empty input
    /// reads as zeros, so an empty salt gives the stock Blowfish key schedule.
    pub fn expand_key(&mut self, key: &[u8], salt: &[u8]) {
        let mut key_words = WordStream::new(key);
        for subkey in self.p.iter_mut() {
            *subkey ^= key_words.next_word();
        }

        let mut salt_words = WordStream::new(salt);
        let mut left = 0u32;
        let mut right = 0u32;

        for i in (0..SUBKEYS).step_by(2) {
            left ^= salt_words.next_word();
            right ^= salt_words.next_word();
            (left, right) = self.encrypt_block(left, right);
            self.p[i] = left;
            self.p[i + 1] = right;
        }

        for sbox in 0..4 {
            for i in (0..256).step_by(2) {
                left ^= salt_words.next_word();
                right ^= salt_words.next_word();
                (left, right) = self.encrypt_block(left, right);
                self.s[sbox][i] = left;
                self.s[sbox][i + 1] = right;
            }
        }
    }

    /// Encrypts one 64-bit block given as its two big-endian halves.
    pub fn encrypt_block(&self, mut left: u32, mut right: u32) -> (u32, u32) {
        for i in 0..ROUNDS {
            left ^= self.p[i];
            right ^= self.f(left);
            std::mem::swap(&mut left, &mut right);
        }
        std::mem::swap(&mut left, &mut right);

        right ^= self.p[ROUNDS];
        left ^= self.p[ROUNDS + 1];

        (left, right)
    }

    fn f(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();

        let h = self.s[0][a as usize].wrapping_add(self.s[1][b as usize]);
        (h ^ self.s[2][c as usize]).wrapping_add(self.s[3][d as usize])
    }
}

impl Default for Blowfish {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Blowfish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blowfish").finish_non_exhaustive()
    }
}

/// Reads a byte slice as an endless sequence of big-endian words, wrapping
/// around at the end.
struct WordStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WordStream<'a> {
    fn new(data: &'a [u8]) -> Self {
        WordStream { data, pos: 0 }
    }

    fn next_word(&mut self) -> u32 {
        if self.data.is_empty() {
            return 0;
        }

        let mut word = 0u32;
        for _ in 0..4 {
            word = (word << 8) | u32::from(self.data[self.pos]);
            self.pos = (self.pos + 1) % self.data.len();
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Eric Young's Blowfish test vectors, keyed with the stock schedule.
    fn keyed(key: &[u8]) -> Blowfish {
        let mut cipher = Blowfish::new();
        cipher.expand_key(key, &[]);
        cipher
    }

    #[test]
    fn test_zero_key_vector() {
        let cipher = keyed(&[0; 8]);
        assert_eq!(cipher.encrypt_block(0, 0), (0x4ef99745, 0x6198dd78));
    }

    #[test]
    fn test_all_ones_key_vector() {
        let cipher = keyed(&[0xff; 8]);
        assert_eq!(
            cipher.encrypt_block(0xffffffff, 0xffffffff),
            (0x51866fd5, 0xb85ecb8a)
        );
    }

    #[test]
    fn test_mixed_key_vector() {
        let cipher = keyed(&[0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            cipher.encrypt_block(0x10000000, 0x00000001),
            (0x7d856f9a, 0x613063f2)
        );
    }

    #[test]
    fn test_empty_key_matches_zero_key() {
        let empty = keyed(&[]);
        let zero = keyed(&[0; 4]);
        assert_eq!(empty.encrypt_block(1, 2), zero.encrypt_block(1, 2));
    }

    #[test]
    fn test_empty_salt_matches_zero_salt() {
        let mut empty = Blowfish::new();
        empty.expand_key(b"key", &[]);
        let mut zero = Blowfish::new();
        zero.expand_key(b"key", &[0; 16]);
        assert_eq!(empty.encrypt_block(7, 9), zero.encrypt_block(7, 9));
    }

    #[test]
    fn test_salt_changes_schedule() {
        let mut plain = Blowfish::new();
        plain.expand_key(b"key", &[0; 16]);
        let mut salted = Blowfish::new();
        salted.expand_key(b"key", &[1; 16]);
        assert_ne!(plain.encrypt_block(0, 0), salted.encrypt_block(0, 0));
    }

    #[test]
    fn test_word_stream_wraps() {
        let mut words = WordStream::new(&[0x01, 0x02, 0x03]);
        assert_eq!(words.next_word(), 0x01020301);
        assert_eq!(words.next_word(), 0x02030102);
        assert_eq!(words.next_word(), 0x03010203);
    }

    #[test]
    fn test_word_stream_empty_is_zero() {
        let mut words = WordStream::new(&[]);
        assert_eq!(words.next_word(), 0);
        assert_eq!(words.next_word(), 0);
    }
}
