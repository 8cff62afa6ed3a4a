//! Reed-Solomon style base32 codec for pool account addresses.
//!
//! Encodes a 64-bit account id into the dash-grouped address format used
//! throughout the pool (`8KLL-PBYV-6DBC-AM942`) and decodes it back, rejecting
//! addresses whose checksum codeword doesn't validate.

mod tables;

use tables::{ALPHABET, CODEWORD_MAP, GEXP, GOLG, INITIAL_CODEWORD};
use thiserror::Error;

const BASE10_LEN: usize = 20;
const BASE32_LEN: usize = 13;
const INITIAL_CODEWORD_LEN: usize = 17;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressCodecError {
    #[error("codeword too long for address")]
    CodewordTooLong,

    #[error("codeword invalid")]
    CodewordInvalid,

    #[error("decoded value is not a valid u64")]
    NotANumber,
}

fn gmult(x: usize, y: usize) -> usize {
    if x == 0 || y == 0 {
        return 0;
    }
    let i = (GOLG[x] + GOLG[y]) % 31;
    GEXP[i]
}

/// Encodes an account id to burst address format `8KLL-PBYV-6DBC-AM942`.
pub fn encode(account_id: u64) -> String {
    let plain_string = account_id.to_string();
    let mut length = plain_string.len();

    let mut plain_string10 = [0usize; BASE10_LEN];
    for (i, c) in plain_string.bytes().enumerate() {
        plain_string10[i] = (c - b'0') as usize;
    }

    let mut codeword = [0usize; INITIAL_CODEWORD_LEN];
    let mut codeword_length = 0;
    loop {
        let mut new_length = 0;
        let mut digit32 = 0usize;

        for i in 0..length {
            digit32 = digit32 * 10 + plain_string10[i];

            if digit32 >= 32 {
                plain_string10[new_length] = digit32 >> 5;
                digit32 &= 31;
                new_length += 1;
            } else if new_length > 0 {
                plain_string10[new_length] = 0;
                new_length += 1;
            }
        }
        length = new_length;
        codeword[codeword_length] = digit32;
        codeword_length += 1;

        if length == 0 {
            break;
        }
    }

    let mut p = [0usize; 4];
    for i in (0..BASE32_LEN).rev() {
        let fb = codeword[i] ^ p[3];
        p[3] = p[2] ^ gmult(30, fb);
        p[2] = p[1] ^ gmult(6, fb);
        p[1] = p[0] ^ gmult(9, fb);
        p[0] = gmult(17, fb);
    }
    codeword[BASE32_LEN..BASE32_LEN + p.len()].copy_from_slice(&p);

    let mut buf = Vec::with_capacity(20);
    let mut i = 0;
    while i < INITIAL_CODEWORD_LEN {
        let codeword_index = CODEWORD_MAP[i];
        let alphabet_index = codeword[codeword_index];
        buf.push(ALPHABET[alphabet_index]);

        if (i & 3) == 3 && i < 13 {
            buf.push(b'-');
        }
        i += 1;
    }

    String::from_utf8(buf).expect("alphabet is ASCII")
}

/// Decodes a burst address back to an account id, rejecting malformed or
/// checksum-invalid input.
pub fn decode(address: &str) -> Result<u64, AddressCodecError> {
    let mut codeword = INITIAL_CODEWORD;

    let mut codeword_length = 0usize;
    for c in address.bytes() {
        let position_in_alphabet = match ALPHABET.iter().position(|&a| a == c) {
            Some(pos) => pos,
            None => continue,
        };

        if codeword_length > 16 {
            return Err(AddressCodecError::CodewordTooLong);
        }

        let codeword_index = CODEWORD_MAP[codeword_length];
        codeword[codeword_index] = position_in_alphabet;
        codeword_length += 1;
    }

    if codeword_length != INITIAL_CODEWORD_LEN || !is_codeword_valid(&codeword) {
        return Err(AddressCodecError::CodewordInvalid);
    }

    let mut length = BASE32_LEN;
    let mut cypher_string32 = [0usize; BASE32_LEN];
    for i in 0..length {
        cypher_string32[i] = codeword[length - i - 1];
    }

    let mut plain_parts = [b'0'; 20];
    let mut plain_parts_len = 0usize;
    loop {
        let mut new_length = 0;
        let mut digit10 = 0usize;

        for j in 0..length {
            digit10 = digit10 * 32 + cypher_string32[j];

            if digit10 >= 10 {
                cypher_string32[new_length] = digit10 / 10;
                digit10 %= 10;
                new_length += 1;
            } else if new_length > 0 {
                cypher_string32[new_length] = 0;
                new_length += 1;
            }
        }
        length = new_length;
        plain_parts[19 - plain_parts_len] = b'0' + (digit10 as u8);
        plain_parts_len += 1;

        if length == 0 {
            break;
        }
    }

    let digits = &plain_parts[20 - plain_parts_len..];
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or(AddressCodecError::NotANumber)
}

fn is_codeword_valid(codeword: &[usize; INITIAL_CODEWORD_LEN]) -> bool {
    let mut sum = 0usize;
    for i in 1..5 {
        let mut t = 0usize;

        for j in 0..31 {
            if j > 12 && j < 27 {
                continue;
            }

            let pos = if j > 26 { j - 14 } else { j };
            t ^= gmult(codeword[pos], GEXP[(i * j) % 31]);
        }

        sum |= t;
    }

    sum == 0
}
