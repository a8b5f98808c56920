use bip39::{Language, Mnemonic as BipMnemonic};
use serde::Deserialize;

/// Mnemonic represents the seed phrase the oracle signer is derived from.
///
/// The value in the config is one of:
/// 1. a 12 or 24 word phrase: `"word two three ..."`.
/// 2. `$NAME`, read from the environment variable `NAME`.
#[derive(Clone)]
pub struct Mnemonic(BipMnemonic);

impl Mnemonic {
    /// Parses an English seed phrase.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        BipMnemonic::from_phrase(phrase, Language::English)
            .ok()
            .map(Self)
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("mnemonic").finish()
    }
}

impl std::ops::Deref for Mnemonic {
    type Target = BipMnemonic;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Mnemonic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct MnemonicVistor;
        impl<'de> serde::de::Visitor<'de> for MnemonicVistor {
            type Value = BipMnemonic;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str("12 or 24 word mnemonic seed phrase")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let str_value = if value.starts_with("0x") {
                    // hex value
                    return Err(serde::de::Error::custom(format!(
                        "got {value} but expected a 12/24 word list "
                    )));
                } else if let Some(var) = value.strip_prefix('$') {
                    // env
                    tracing::trace!("Reading {} from env", var);
                    std::env::var(var).map_err(|e| {
                        serde::de::Error::custom(format!(
                            "error while loading this env {var}: {e}",
                        ))
                    })?
                } else {
                    value.to_string()
                };
                // never echo the phrase back in the error.
                BipMnemonic::from_phrase(str_value.trim(), Language::English)
                    .map_err(|_| {
                        serde::de::Error::custom(
                            "Cannot get the mnemonic from the given string",
                        )
                    })
            }
        }

        let mnemonic = deserializer.deserialize_str(MnemonicVistor)?;
        Ok(Self(mnemonic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str =
        "test test test test test test test test test test test junk";

    #[test]
    fn parses_a_plain_phrase() {
        let m: Mnemonic =
            serde_json::from_str(&format!("\"{PHRASE}\"")).unwrap();
        assert_eq!(m.phrase(), PHRASE);
    }

    #[test]
    fn reads_the_phrase_from_env() {
        std::env::set_var("ORACLEX_TEST_MNEMONIC_TYPES", PHRASE);
        let m: Mnemonic =
            serde_json::from_str("\"$ORACLEX_TEST_MNEMONIC_TYPES\"").unwrap();
        assert_eq!(m.phrase(), PHRASE);
    }

    #[test]
    fn rejects_hex_and_garbage() {
        assert!(serde_json::from_str::<Mnemonic>("\"0xdeadbeef\"").is_err());
        assert!(serde_json::from_str::<Mnemonic>("\"not a phrase\"").is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let m = Mnemonic::from_phrase(PHRASE).unwrap();
        assert_eq!(format!("{m:?}"), "mnemonic");
    }
}
