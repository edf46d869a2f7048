//! De-obfuscation of `audio_api_unavailable` URLs.
//!
//! When the site does not hand out a direct URL it sends a placeholder of
//! the form:
//!
//! ```text
//! https://m.vk.com/mp3/audio_api_unavailable.mp3?extra=<data>#<ops>
//! ```
//!
//! Both `<data>` and `<ops>` are encoded with a base64 variant whose
//! alphabet starts with the lowercase letters. `<ops>` decodes to a
//! tab-separated list of operations, each an op code optionally followed by
//! a vertical tab and an argument. Applying them in reverse order to
//! `<data>` yields the playable URL.
//!
//! # Operations
//!
//! * `v` - reverse
//! * `r <n>` - rotate every alphabet character back by `n`
//! * `x <c>` - xor every character with `c`
//! * `s <n>` - seeded shuffle
//! * `i <n>` - seeded shuffle with `n ^ user_id` as seed

use thiserror::Error;

use crate::{error::Result, protocol::UserId};

/// Base64 alphabet of the site's audio player. Note `0` and `O` trade places.
const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMN0PQRSTUVWXYZO123456789+/=";

const EXTRA_MARKER: &str = "?extra=";
const OPS_SEPARATOR: char = '\t';
const ARG_SEPARATOR: char = '\u{0b}';

/// URL de-obfuscation failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("url has no extra payload")]
    MissingExtra,

    #[error("url has no operations section")]
    MissingOps,

    #[error("unknown decode operation {0:?}")]
    UnknownOp(String),

    #[error("operation {0:?} requires an argument")]
    MissingArgument(String),

    #[error("operation {op:?} has invalid argument {arg:?}")]
    InvalidArgument { op: String, arg: String },

    #[error("decoded data contains an invalid character")]
    InvalidChar,
}

/// Decodes an obfuscated audio URL for the session of `user_id`.
///
/// # Errors
///
/// Returns [`DecodeError`] if the URL does not follow the known scheme.
pub fn decode(url: &str, user_id: UserId) -> Result<String> {
    let (_, extra) = url.split_once(EXTRA_MARKER).ok_or(DecodeError::MissingExtra)?;
    let mut sections = extra.split('#');
    let data = sections.next().unwrap_or_default();
    let ops = sections.next().ok_or(DecodeError::MissingOps)?;

    let mut chars = decode_base64(data);
    let ops: String = decode_base64(ops).into_iter().collect();

    for op in ops.split(OPS_SEPARATOR).rev() {
        let (cmd, arg) = match op.split_once(ARG_SEPARATOR) {
            Some((cmd, arg)) => (cmd, Some(arg)),
            None => (op, None),
        };

        match cmd {
            "v" => chars.reverse(),
            "r" => rotate(&mut chars, integer(cmd, arg)?),
            "x" => {
                let key = arg
                    .and_then(|arg| arg.chars().next())
                    .ok_or_else(|| DecodeError::MissingArgument(cmd.to_owned()))?;
                xor(&mut chars, key)?;
            }
            "s" => shuffle(&mut chars, integer(cmd, arg)?),
            "i" => shuffle(&mut chars, integer(cmd, arg)? ^ user_id),
            other => return Err(DecodeError::UnknownOp(other.to_owned()).into()),
        }
    }

    Ok(chars.into_iter().collect())
}

fn integer(op: &str, arg: Option<&str>) -> std::result::Result<i64, DecodeError> {
    let arg = arg.ok_or_else(|| DecodeError::MissingArgument(op.to_owned()))?;
    arg.trim()
        .parse()
        .map_err(|_| DecodeError::InvalidArgument {
            op: op.to_owned(),
            arg: arg.to_owned(),
        })
}

/// Base64 with the site's alphabet. Characters outside the alphabet are
/// skipped, every decoded byte becomes one `char`.
fn decode_base64(input: &str) -> Vec<char> {
    let mut output = Vec::with_capacity(input.len() * 3 / 4);
    let mut accumulator: u32 = 0;
    let mut count: i64 = 0;

    for symbol in input.chars().filter_map(|chr| ALPHABET.find(chr)) {
        #[expect(clippy::cast_possible_truncation)]
        let symbol = symbol as u32;
        if count % 4 == 0 {
            accumulator = symbol;
            count += 1;
        } else {
            accumulator = (accumulator << 6) + symbol;
            count += 1;
            let shift = (-2 * count) & 6;
            output.push(char::from((accumulator >> shift) as u8));
        }
    }

    output
}

fn rotate(chars: &mut [char], by: i64) {
    let doubled: Vec<char> = ALPHABET.chars().chain(ALPHABET.chars()).collect();
    #[expect(clippy::cast_possible_wrap)]
    let len = doubled.len() as i64;

    for chr in chars.iter_mut() {
        if let Some(index) = doubled.iter().position(|c| c == chr) {
            #[expect(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
            let offset = (index as i64 - by).rem_euclid(len) as usize;
            *chr = doubled[offset];
        }
    }
}

fn xor(chars: &mut [char], key: char) -> std::result::Result<(), DecodeError> {
    let key = u32::from(key);
    for chr in chars.iter_mut() {
        *chr = char::from_u32(u32::from(*chr) ^ key).ok_or(DecodeError::InvalidChar)?;
    }

    Ok(())
}

/// Swap positions derived from `seed`.
#[expect(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]
fn shuffle_indices(len: usize, seed: i64) -> Vec<usize> {
    let n = len as i64;
    let mut seed = seed;
    let mut indices: Vec<usize> = (0..n)
        .rev()
        .map(|a| {
            seed = ((n * (a + 1)) ^ (seed + a)).rem_euclid(n);
            seed as usize
        })
        .collect();
    indices.reverse();
    indices
}

fn shuffle(chars: &mut [char], seed: i64) {
    let len = chars.len();
    if len == 0 {
        return;
    }

    let indices = shuffle_indices(len, seed);
    for a in 1..len {
        chars.swap(a, indices[len - 1 - a]);
    }
}

#[cfg(test)]
mod tests {
    use base64::{
        alphabet::Alphabet,
        engine::{general_purpose::NO_PAD, GeneralPurpose},
        Engine,
    };

    use super::*;

    fn encode(input: &str) -> String {
        let alphabet =
            Alphabet::new(ALPHABET.trim_end_matches('=')).unwrap();
        GeneralPurpose::new(&alphabet, NO_PAD).encode(input)
    }

    fn obfuscated(data: &str, ops: &str) -> String {
        format!(
            "https://m.vk.com/mp3/audio_api_unavailable.mp3?extra={}#{}",
            encode(data),
            encode(ops)
        )
    }

    #[test]
    fn base64_variant_matches_reference_encoding() {
        let chars = decode_base64(&encode("https://cs1.example/a.mp3"));
        assert_eq!(chars.into_iter().collect::<String>(), "https://cs1.example/a.mp3");
    }

    #[test]
    fn zero_and_capital_o_are_swapped() {
        assert_eq!(ALPHABET.find('0'), Some(40));
        assert_eq!(ALPHABET.find('O'), Some(52));

        let plain = "https://cs1-40v4.vkuseraudio.net/p1/O0a.mp3";
        let data = encode(plain);
        assert!(data.contains('0') || data.contains('O'));
        assert_eq!(decode(&obfuscated(plain, "v\tv"), 1).unwrap(), plain);
    }

    #[test]
    fn reverse_op() {
        let url = obfuscated("3pm.a/elpmaxe.1sc//:sptth", "v");
        assert_eq!(decode(&url, 1).unwrap(), "https://cs1.example/a.mp3");
    }

    #[test]
    fn xor_op_is_its_own_inverse() {
        let plain = "https://cs1.example/a.mp3";
        let scrambled: String = plain.chars().map(|c| char::from(c as u8 ^ b'A')).collect();
        let url = obfuscated(&scrambled, "x\u{0b}A");
        assert_eq!(decode(&url, 1).unwrap(), plain);
    }

    #[test]
    fn ops_apply_in_reverse_order() {
        // `x` runs first, then `v`.
        let plain = "abc";
        let scrambled: String = plain
            .chars()
            .rev()
            .map(|c| char::from(c as u8 ^ 3))
            .collect();
        let url = obfuscated(&scrambled, "v\tx\u{0b}\u{03}");
        assert_eq!(decode(&url, 1).unwrap(), "abc");
    }

    #[test]
    fn user_seeded_shuffle_matches_plain_shuffle() {
        let user_id = 123_456;
        let seeded = decode(&obfuscated("https://cs1.example/a.mp3", "i\u{0b}42"), user_id).unwrap();
        let plain = decode(&obfuscated("https://cs1.example/a.mp3", &format!("s\u{0b}{}", 42 ^ user_id)), 0).unwrap();
        assert_eq!(seeded, plain);
        assert_eq!(seeded.len(), "https://cs1.example/a.mp3".len());
    }

    #[test]
    fn rotate_wraps_around() {
        let mut chars = vec!['a', 'b', '-'];
        rotate(&mut chars, 1);
        assert_eq!(chars, vec!['=', 'a', '-']);
    }

    #[test]
    fn unknown_scheme_fails() {
        let err = decode(&obfuscated("abc", "q\u{0b}1"), 1).unwrap_err();
        assert_eq!(
            err.downcast::<DecodeError>(),
            Some(&DecodeError::UnknownOp("q".to_owned()))
        );

        let err = decode("https://m.vk.com/mp3/audio_api_unavailable.mp3", 1).unwrap_err();
        assert_eq!(err.downcast::<DecodeError>(), Some(&DecodeError::MissingExtra));

        let err = decode(&obfuscated("abc", "r"), 1).unwrap_err();
        assert_eq!(
            err.downcast::<DecodeError>(),
            Some(&DecodeError::MissingArgument("r".to_owned()))
        );
    }
}
