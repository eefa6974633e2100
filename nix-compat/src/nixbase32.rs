//! Implements the "base32" encoding Nix uses for digests in store paths and
//! hash strings.
//!
//! The alphabet omits `e`, `o`, `u` and `t`, there is no padding, and the
//! characters are emitted starting from the most significant 5-bit group,
//! which is at the *end* of the input. That makes it incompatible with
//! RFC4648 and `data_encoding::Encoding`.

use thiserror::Error;

pub const ALPHABET: &[u8; 32] = b"0123456789abcdfghijklmnpqrsvwxyz";

/// Errors that can occur while decoding nixbase32-encoded data.
#[derive(Debug, Eq, PartialEq, Error)]
pub enum Nixbase32DecodeError {
    #[error("character {0:x} not in alphabet")]
    CharacterNotInAlphabet(u8),
    #[error("nonzero carry")]
    NonzeroCarry,
    #[error("invalid length: {0}")]
    InvalidLength(usize),
}

/// Returns the nixbase32 encoding of `input`.
pub fn encode(input: &[u8]) -> String {
    let output_len = encode_len(input.len());
    let mut output = String::with_capacity(output_len);

    for n in (0..output_len).rev() {
        let bit_offset = n * 5;
        let i = bit_offset / 8;
        let j = bit_offset % 8;

        // The 5-bit group may straddle into the next byte. Shifting in u16
        // keeps the left shift by up to 8 bits well-defined.
        let mut group = (input[i] >> j) as u16;
        if let Some(next) = input.get(i + 1) {
            group |= (*next as u16) << (8 - j);
        }

        output.push(ALPHABET[(group & 0x1f) as usize] as char);
    }

    output
}

/// Maps a nixbase32 character to its 5-bit value, which is its index in
/// [ALPHABET].
fn decode_char(c: u8) -> Option<u8> {
    Some(match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'd' => c - b'a' + 10,
        b'f'..=b'n' => c - b'f' + 14,
        b'p'..=b's' => c - b'p' + 23,
        b'v'..=b'z' => c - b'v' + 27,
        _ => return None,
    })
}

/// Decodes nixbase32-encoded `input`.
///
/// Inputs whose length can't be produced by [encode], and inputs that encode
/// more bits than fit into the output, are rejected.
pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, Nixbase32DecodeError> {
    let input = input.as_ref();
    let output_len = decode_len(input.len());

    if encode_len(output_len) != input.len() {
        return Err(Nixbase32DecodeError::InvalidLength(input.len()));
    }

    let mut output = vec![0u8; output_len];

    for (n, c) in input.iter().rev().enumerate() {
        let value = decode_char(*c).ok_or(Nixbase32DecodeError::CharacterNotInAlphabet(*c))?;

        let bit_offset = n * 5;
        let i = bit_offset / 8;
        let j = bit_offset % 8;

        let shifted = (value as u16) << j;
        output[i] |= (shifted & 0xff) as u8;
        let carry = (shifted >> 8) as u8;

        if i + 1 < output_len {
            output[i + 1] |= carry;
        } else if carry != 0 {
            return Err(Nixbase32DecodeError::NonzeroCarry);
        }
    }

    Ok(output)
}

/// Decodes `input` into a digest of exactly `K` bytes.
pub fn decode_fixed<const K: usize>(
    input: impl AsRef<[u8]>,
) -> Result<[u8; K], Nixbase32DecodeError> {
    let input = input.as_ref();
    if input.len() != encode_len(K) {
        return Err(Nixbase32DecodeError::InvalidLength(input.len()));
    }

    decode(input)?
        .try_into()
        .map_err(|v: Vec<u8>| Nixbase32DecodeError::InvalidLength(v.len()))
}

/// Returns the number of bytes an encoded input of `len` characters decodes to.
pub const fn decode_len(len: usize) -> usize {
    (len * 5) / 8
}

/// Returns the number of characters `len` bytes encode to.
pub const fn encode_len(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (len * 8 - 1) / 5 + 1
}
