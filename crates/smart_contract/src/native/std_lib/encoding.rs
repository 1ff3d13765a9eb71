//
// encoding.rs - number and text encodings of StdLib
//

use super::*;
use base64::{engine::general_purpose, Engine as _};
use neo_core::hashing::hash256;
use num_bigint::{BigInt, Sign};
use num_traits::{Num, Zero};

const CHECKSUM_LENGTH: usize = 4;

impl StdLib {
    pub(super) fn atoi(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let value = args.string(0)?;
        ensure_max_input_len(value.as_bytes(), "atoi")?;
        Ok(match optional_base(args)? {
            10 => parse_decimal(&value)?,
            16 => parse_hex_twos_complement(&value)?,
            base => return Err(Error::invalid_argument(format!("invalid base {base}"))),
        }
        .into())
    }

    pub(super) fn itoa(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let value = args.integer(0)?;
        Ok(match optional_base(args)? {
            10 => value.to_string(),
            16 => format_hex_twos_complement(&value),
            base => return Err(Error::invalid_argument(format!("invalid base {base}"))),
        }
        .into())
    }

    pub(super) fn base64_encode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let data = args.bytes(0)?;
        ensure_max_input_len(&data, "base64Encode")?;
        Ok(general_purpose::STANDARD.encode(data).into())
    }

    pub(super) fn base64_decode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let text = args.string(0)?;
        ensure_max_input_len(text.as_bytes(), "base64Decode")?;
        let normalized: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        general_purpose::STANDARD
            .decode(normalized)
            .map(NativeValue::from)
            .map_err(|e| Error::invalid_argument(format!("invalid base64 data: {e}")))
    }

    pub(super) fn base64_url_encode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let text = args.string(0)?;
        ensure_max_input_len(text.as_bytes(), "base64UrlEncode")?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(text).into())
    }

    pub(super) fn base64_url_decode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let text = args.string(0)?;
        ensure_max_input_len(text.as_bytes(), "base64UrlDecode")?;
        let normalized: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .trim_end_matches('=')
            .to_string();
        let decoded = general_purpose::URL_SAFE_NO_PAD
            .decode(normalized)
            .map_err(|e| Error::invalid_argument(format!("invalid base64url data: {e}")))?;
        String::from_utf8(decoded)
            .map(NativeValue::from)
            .map_err(|_| Error::invalid_argument("decoded base64url data is not UTF-8"))
    }

    pub(super) fn base58_encode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let data = args.bytes(0)?;
        ensure_max_input_len(&data, "base58Encode")?;
        Ok(bs58::encode(data).into_string().into())
    }

    pub(super) fn base58_decode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let text = args.string(0)?;
        ensure_max_input_len(text.as_bytes(), "base58Decode")?;
        Ok(base58_decode(&text)?.into())
    }

    pub(super) fn base58_check_encode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let data = args.bytes(0)?;
        ensure_max_input_len(&data, "base58CheckEncode")?;
        Ok(base58_check_encode(&data).into())
    }

    pub(super) fn base58_check_decode(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let text = args.string(0)?;
        ensure_max_input_len(text.as_bytes(), "base58CheckDecode")?;
        Ok(base58_check_decode(&text)?.into())
    }
}

fn optional_base(args: &NativeArgs) -> Result<i64> {
    if args.len() > 1 {
        args.i64(1)
    } else {
        Ok(10)
    }
}

fn parse_decimal(text: &str) -> Result<BigInt> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_argument(format!("invalid decimal number {text:?}")));
    }
    BigInt::from_str_radix(text, 10)
        .map_err(|_| Error::invalid_argument(format!("invalid decimal number {text:?}")))
}

/// Parses hex digits as a two's-complement number: a leading digit of 8 or
/// above makes the value negative.
pub fn parse_hex_twos_complement(text: &str) -> Result<BigInt> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::invalid_argument(format!("invalid hex number {text:?}")));
    }
    let unsigned = BigInt::from_str_radix(text, 16)
        .map_err(|_| Error::invalid_argument(format!("invalid hex number {text:?}")))?;
    let bits = text.len() * 4;
    let sign_bit = BigInt::from(1) << (bits - 1);
    if (&unsigned & &sign_bit).is_zero() {
        Ok(unsigned)
    } else {
        Ok(unsigned - (BigInt::from(1) << bits))
    }
}

/// Formats `value` as the shortest two's-complement hex string that
/// round-trips through [`parse_hex_twos_complement`].
pub fn format_hex_twos_complement(value: &BigInt) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    if value.sign() != Sign::Minus {
        let hex = value.to_str_radix(16);
        return if hex.as_bytes()[0] >= b'8' {
            format!("0{hex}")
        } else {
            hex
        };
    }
    // Smallest nibble count whose range reaches down to `value`.
    let mut nibbles: usize = 1;
    while -(BigInt::from(1) << (nibbles * 4 - 1)) > *value {
        nibbles += 1;
    }
    let unsigned = (BigInt::from(1) << (nibbles * 4)) + value;
    format!("{:0>width$}", unsigned.to_str_radix(16), width = nibbles)
}

fn base58_decode(text: &str) -> Result<Vec<u8>> {
    bs58::decode(text)
        .into_vec()
        .map_err(|e| Error::invalid_argument(format!("invalid base58 data: {e}")))
}

/// Base58 of `data` followed by the first four bytes of its double SHA-256.
pub fn base58_check_encode(data: &[u8]) -> String {
    let mut buffer = data.to_vec();
    buffer.extend_from_slice(&hash256(data)[..CHECKSUM_LENGTH]);
    bs58::encode(buffer).into_string()
}

pub fn base58_check_decode(text: &str) -> Result<Vec<u8>> {
    let mut buffer = base58_decode(text)?;
    if buffer.len() < CHECKSUM_LENGTH {
        return Err(Error::invalid_argument("base58check data is too short"));
    }
    let checksum = buffer.split_off(buffer.len() - CHECKSUM_LENGTH);
    if hash256(&buffer)[..CHECKSUM_LENGTH] != checksum[..] {
        return Err(Error::invalid_argument("base58check checksum mismatch"));
    }
    Ok(buffer)
}
