//! Fixed-width encoding helpers.

use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};

use oraclex_relayer_utils::{Error, Result};

/// Parses a decimal or `0x` hex quantity into its minimal big-endian bytes.
///
/// Zero is the empty slice; leading zero bytes are dropped, so the result
/// is the shortest representation of the value.
pub fn parse_quantity(field: &'static str, value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    let invalid = || Error::InvalidQuantity {
        field,
        value: value.to_string(),
    };
    let bytes = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(digits) => {
            let digits = if digits.len() % 2 == 1 {
                format!("0{digits}")
            } else {
                digits.to_string()
            };
            hex::decode(digits).map_err(|_| invalid())?
        }
        None => {
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let n = U256::from_dec_str(value).map_err(|_| invalid())?;
            let mut word = [0u8; 32];
            n.to_big_endian(&mut word);
            word.to_vec()
        }
    };
    Ok(trim_leading_zeros(&bytes).to_vec())
}

/// Strips leading zero bytes.
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// Left-pads `bytes` with zeros to exactly `N` bytes.
///
/// Values wider than `N` are rejected, never truncated.
pub fn left_pad<const N: usize>(
    field: &'static str,
    bytes: &[u8],
) -> Result<[u8; N]> {
    if bytes.len() > N {
        return Err(Error::FieldOverflow {
            field,
            width: N,
            len: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out[N - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

/// Parses a `0x` prefixed address.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address> {
    value.trim().parse().map_err(|_| Error::InvalidQuantity {
        field,
        value: value.to_string(),
    })
}

/// `abi.encode(uint256 value)`
pub fn abi_uint256(value: u64) -> Bytes {
    ethers::abi::encode(&[Token::Uint(U256::from(value))]).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_are_minimal() {
        assert_eq!(parse_quantity("id", "42").unwrap(), vec![0x2a]);
        assert_eq!(parse_quantity("id", "0x2a").unwrap(), vec![0x2a]);
        assert_eq!(parse_quantity("id", "0x0002a").unwrap(), vec![0x2a]);
        assert_eq!(parse_quantity("id", "256").unwrap(), vec![0x01, 0x00]);
        assert!(parse_quantity("id", "0").unwrap().is_empty());
        assert!(parse_quantity("id", "0x").unwrap().is_empty());
    }

    #[test]
    fn wide_decimal_quantities_are_exact() {
        let max = U256::MAX.to_string();
        assert_eq!(parse_quantity("id", &max).unwrap(), vec![0xff; 32]);
    }

    #[test]
    fn garbage_is_rejected() {
        for bad in ["", "-1", "12a", "0xzz", "1.5"] {
            assert!(
                matches!(
                    parse_quantity("id", bad),
                    Err(Error::InvalidQuantity { field: "id", .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn padding_rejects_oversized_values() {
        assert_eq!(left_pad::<4>("x", &[1, 2]).unwrap(), [0, 0, 1, 2]);
        assert_eq!(left_pad::<2>("x", &[]).unwrap(), [0, 0]);
        assert!(matches!(
            left_pad::<8>("gas", &[1; 9]),
            Err(Error::FieldOverflow {
                field: "gas",
                width: 8,
                len: 9
            })
        ));
    }

    #[test]
    fn uint256_payload_is_one_word() {
        let encoded = abi_uint256(2);
        assert_eq!(encoded.len(), 32);
        assert_eq!(encoded[31], 2);
        assert!(encoded[..31].iter().all(|b| *b == 0));
    }
}
