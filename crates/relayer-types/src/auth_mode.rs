use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The authentication scheme a subscription demands for its commitment.
///
/// Decoded from the single auth-mode byte carried by every contract event.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMode {
    /// `0x00`: a single oracle signature.
    #[display(fmt = "SIGNATURE")]
    Signature,
    /// `0x01`: several oracle signatures.
    #[display(fmt = "MULTISIG")]
    Multisig,
    /// `0x02`: a zero-knowledge proof.
    #[display(fmt = "PROOF")]
    Proof,
    /// Any other byte.
    #[display(fmt = "UNKNOWN")]
    Unknown,
}

impl AuthMode {
    /// Maps a raw auth-mode byte to its mode.
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Signature,
            0x01 => Self::Multisig,
            0x02 => Self::Proof,
            _ => Self::Unknown,
        }
    }

    /// Decodes an auth mode from a byte slice.
    ///
    /// Exactly one byte is expected, anything else (including an empty
    /// slice) is [`AuthMode::Unknown`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            [byte] => Self::from_byte(*byte),
            _ => Self::Unknown,
        }
    }
}
