use serde::{Deserialize, Serialize};

/// An RPC URL Wrapper around [`url::Url`] to support the `serde` deserialization
/// from environment variables.
///
/// `"$NAME"` reads the URL from the environment variable `NAME`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RpcUrl(url::Url);

impl RpcUrl {
    /// Returns the inner [`url::Url`].
    pub fn as_url(&self) -> &url::Url {
        &self.0
    }

    fn resolve(value: &str) -> Result<url::Url, String> {
        let raw = match value.strip_prefix('$') {
            Some(var) => {
                tracing::trace!("Reading {} from env", var);
                std::env::var(var).map_err(|e| {
                    format!("error while loading this env {var}: {e}")
                })?
            }
            None => value.to_string(),
        };
        url::Url::parse(raw.trim()).map_err(|e| format!("{e}: {raw}"))
    }
}

impl std::fmt::Display for RpcUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

// Endpoints may embed API keys in the path, so only the origin is printed.
impl std::fmt::Debug for RpcUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcUrl({})", self.0.origin().ascii_serialization())
    }
}

impl From<RpcUrl> for url::Url {
    fn from(rpc_url: RpcUrl) -> Self {
        rpc_url.0
    }
}

impl From<url::Url> for RpcUrl {
    fn from(url: url::Url) -> Self {
        RpcUrl(url)
    }
}

impl std::ops::Deref for RpcUrl {
    type Target = url::Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RpcUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::resolve(&value)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Endpoint {
        url: RpcUrl,
    }

    #[test]
    fn parses_literal_urls() {
        let e: Endpoint =
            serde_json::from_str(r#"{"url":"http://127.0.0.1:8545"}"#)
                .unwrap();
        assert_eq!(e.url.to_string(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn parses_urls_from_env() {
        std::env::set_var(
            "ORACLEX_TEST_RPC_URL",
            "https://rpc.example.org/v1/secret-key",
        );
        let e: Endpoint =
            serde_json::from_str(r#"{"url":"$ORACLEX_TEST_RPC_URL"}"#)
                .unwrap();
        assert_eq!(e.url.host_str(), Some("rpc.example.org"));
        assert_eq!(format!("{:?}", e.url), "RpcUrl(https://rpc.example.org)");
    }

    #[test]
    fn rejects_invalid_urls() {
        assert!(serde_json::from_str::<Endpoint>(r#"{"url":"not a url"}"#)
            .is_err());
        assert!(serde_json::from_str::<Endpoint>(
            r#"{"url":"$ORACLEX_TEST_RPC_URL_MISSING"}"#
        )
        .is_err());
    }
}
