//! bcrypt's radix-64 encoding.
//!
//! Same bit grouping as standard base64 (three bytes to four characters,
//! most significant bits first), but with the alphabet `./A-Za-z0-9` and no
//! padding. A trailing partial group produces two or three characters.

use crate::error::{BCryptError, Result};

// BCrypt's custom base64 alphabet
const BCRYPT_BASE64: &[u8; 64] = b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const INVALID: u8 = 0xff;

static DECODE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < BCRYPT_BASE64.len() {
        table[BCRYPT_BASE64[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Length of the encoding of `n` bytes.
pub const fn encoded_len(n: usize) -> usize {
    (n * 4 + 2) / 3
}

pub fn encode(input: &[u8]) -> String {
    let mut output = String::with_capacity(encoded_len(input.len()));

    for chunk in input.chunks(3) {
        let b1 = u32::from(chunk[0]);
        let b2 = chunk.get(1).copied().map_or(0, u32::from);
        let b3 = chunk.get(2).copied().map_or(0, u32::from);

        let triple = (b1 << 16) | (b2 << 8) | b3;

        output.push(char::from(BCRYPT_BASE64[(triple >> 18) as usize]));
        output.push(char::from(BCRYPT_BASE64[(triple >> 12 & 0x3f) as usize]));

        if chunk.len() > 1 {
            output.push(char::from(BCRYPT_BASE64[(triple >> 6 & 0x3f) as usize]));
        }
        if chunk.len() > 2 {
            output.push(char::from(BCRYPT_BASE64[(triple & 0x3f) as usize]));
        }
    }

    output
}

/// Decodes radix-64 text.
///
/// Only canonical encodings are accepted: the unused low bits of a final
/// partial group must be zero, so `encode(decode(s)?) == s` always holds.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    if input.len() % 4 == 1 {
        return Err(BCryptError::InvalidLength(input.len()));
    }

    let mut sextets = Vec::with_capacity(input.len());
    for (position, character) in input.char_indices() {
        let value = u8::try_from(character)
            .ok()
            .map(|b| DECODE[usize::from(b)])
            .filter(|&v| v != INVALID)
            .ok_or(BCryptError::InvalidCharacter {
                character,
                position,
            })?;
        sextets.push(value);
    }

    let mut output = Vec::with_capacity(input.len() * 3 / 4);
    for group in sextets.chunks(4) {
        let mut acc = 0u32;
        for &s in group {
            acc = (acc << 6) | u32::from(s);
        }
        // left-align the group in 24 bits
        acc <<= 6 * (4 - group.len());

        let bytes = group.len() - 1;
        let spare = acc & (0x00ff_ffff >> (8 * bytes));
        if spare != 0 {
            let position = input.len() - 1;
            return Err(BCryptError::InvalidCharacter {
                character: char::from(input.as_bytes()[position]),
                position,
            });
        }

        output.extend_from_slice(&acc.to_be_bytes()[1..=bytes]);
    }

    Ok(output)
}

/// Decodes exactly `N` bytes.
pub(crate) fn decode_array<const N: usize>(input: &str) -> Result<[u8; N]> {
    if input.len() != encoded_len(N) {
        return Err(BCryptError::InvalidLength(input.len()));
    }
    let bytes = decode(input)?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| BCryptError::InvalidLength(v.len()))
}
