//! bcrypt's own base64 flavour.
//!
//! Bits are packed exactly like RFC 4648 base64, six per symbol, but the
//! alphabet starts with `.` and `/` and there is no padding.

use crate::error::{BCryptError, BCryptResult};

pub const ALPHABET: &[u8; 64] =
    b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const INVALID: u8 = 0xff;

const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < 64 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Encodes `bytes` and keeps at most `out_len` symbols.
///
/// A trailing group of one or two bytes produces two or three symbols, so 16
/// bytes encode to 22 symbols and 23 bytes to 31.
pub fn encode(bytes: &[u8], out_len: usize) -> String {
    let mut out = String::with_capacity((bytes.len() * 4 + 2) / 3);

    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        let sextets = [
            b0 >> 2,
            ((b0 & 0x03) << 4) | (b1 >> 4),
            ((b1 & 0x0f) << 2) | (b2 >> 6),
            b2 & 0x3f,
        ];

        for &sextet in &sextets[..chunk.len() + 1] {
            out.push(ALPHABET[sextet as usize] as char);
        }
    }

    out.truncate(out_len);
    out
}

/// Decodes at most `max_bytes` bytes from `encoded`.
///
/// Stops early when the input runs out. A symbol outside the alphabet is an
/// error rather than being read as `.`.
pub fn decode(encoded: &str, max_bytes: usize) -> BCryptResult<Vec<u8>> {
    let sextets = encoded
        .bytes()
        .enumerate()
        .map(|(offset, symbol)| sextet(symbol, offset))
        .collect::<BCryptResult<Vec<u8>>>()?;

    let mut out = Vec::with_capacity(max_bytes);

    for group in sextets.chunks(4) {
        // a lone trailing symbol carries fewer than eight bits
        if group.len() < 2 {
            break;
        }

        let c0 = group[0];
        let c1 = group[1];
        let c2 = group.get(2).copied().unwrap_or(0);
        let c3 = group.get(3).copied().unwrap_or(0);

        let bytes = [
            (c0 << 2) | ((c1 & 0x30) >> 4),
            ((c1 & 0x0f) << 4) | ((c2 & 0x3c) >> 2),
            ((c2 & 0x03) << 6) | c3,
        ];

        for &byte in &bytes[..group.len() - 1] {
            if out.len() == max_bytes {
                return Ok(out);
            }
            out.push(byte);
        }
    }

    out.truncate(max_bytes);
    Ok(out)
}

fn sextet(symbol: u8, offset: usize) -> BCryptResult<u8> {
    match DECODE_TABLE[symbol as usize] {
        INVALID => Err(BCryptError::MalformedEncoding(format!(
            "invalid radix-64 symbol {:?} at offset {}",
            symbol as char, offset
        ))),
        value => Ok(value),
    }
}
