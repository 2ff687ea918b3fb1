use zeroize::Zeroizing;

use crate::blowfish::Blowfish;
use crate::eks::{self, Cost, SALT_LEN};

/// The number of digest bytes kept in a bcrypt hash.
pub const DIGEST_LEN: usize = 23;

/// The longest key bcrypt reads, including the trailing NUL.
pub const KEY_LEN_MAX: usize = 72;

const MAGIC: &[u8; 24] = b"OrpheanBeholderScryDoubt";

/// Encrypts "OrpheanBeholderScryDoubt" 64 times in ECB mode and keeps the
/// first 23 of the 24 resulting bytes.
pub fn digest(cipher: Blowfish) -> [u8; DIGEST_LEN] {
    let mut ctext = [0u32; 6];
    for (word, bytes) in ctext.iter_mut().zip(MAGIC.chunks_exact(4)) {
        *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    for _ in 0..64 {
        for block in ctext.chunks_exact_mut(2) {
            let (left, right) = cipher.encrypt_block(block[0], block[1]);
            block[0] = left;
            block[1] = right;
        }
    }

    let mut full = [0u8; 24];
    for (bytes, word) in full.chunks_exact_mut(4).zip(ctext) {
        bytes.copy_from_slice(&word.to_be_bytes());
    }

    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&full[..DIGEST_LEN]);
    out
}

/// The raw bcrypt function: key setup and digest for one password.
///
/// The password is NUL-terminated and cut to 72 bytes before key setup, the
/// way OpenBSD and the other `$2a$`/`$2b$` implementations do it.
pub fn bcrypt(cost: Cost, salt: &[u8; SALT_LEN], password: &[u8]) -> [u8; DIGEST_LEN] {
    let key = prepare_key(password);
    digest(eks::setup(cost, salt, &key))
}

fn prepare_key(password: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(password.len() + 1));
    key.extend_from_slice(password);
    key.push(0);
    key.truncate(KEY_LEN_MAX);
    key
}
