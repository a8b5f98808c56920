use std::time::Duration;

use ethers::providers::{HttpClientError, JsonRpcError, RetryPolicy, RpcError};

/// Implements [RetryPolicy] that will retry requests that errored with
/// status code 429 i.e. TOO_MANY_REQUESTS
///
/// Public endpoints often fail with a `"header not found"` rpc error which is
/// apparently linked to load balancing, which are retried as well.
#[derive(Debug)]
pub struct OracleXHttpRetryPolicy {
    err_regex: Option<regex::Regex>,
}

impl OracleXHttpRetryPolicy {
    /// Creates a new retry policy.
    pub fn new() -> Self {
        Self {
            err_regex: rate_limit_regex(),
        }
    }

    /// Boxed policy, as expected by the retry client builder.
    pub fn boxed() -> Box<Self> {
        Box::new(Self::new())
    }
}

impl Default for OracleXHttpRetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

fn rate_limit_regex() -> Option<regex::Regex> {
    regex::Regex::new(r"(?mixU)\b(?:rate|limit|429|Too \s Many \s Requests)\b")
        .ok()
}

fn should_retry_json_rpc_error(err: &JsonRpcError) -> bool {
    let JsonRpcError { code, message, .. } = err;
    // alchemy throws it this way
    if *code == 429 {
        return true;
    }

    // This is an infura error code for `exceeded project rate limit`
    if *code == -32005 {
        return true;
    }

    // alternative alchemy error for specific IPs
    if *code == -32016 && message.contains("rate limit") {
        return true;
    }

    matches!(
        message.as_str(),
        "header not found"
            | "daily request count exceeded, request rate limited"
    )
}

// check json rpc error in a response body that failed to deserialize
fn should_retry_json_rpc_error_from_text(
    text: &str,
    err_regex: Option<&regex::Regex>,
) -> bool {
    // some providers send invalid JSON RPC in the error case (no `id:u64`), but the
    // text should be a `JsonRpcError`
    #[derive(serde::Deserialize)]
    struct Resp {
        error: JsonRpcError,
    }

    if let Ok(resp) = serde_json::from_str::<Resp>(text) {
        return should_retry_json_rpc_error(&resp.error);
    }

    let err_text = text.to_lowercase();

    // last resort, some providers send the error message in the text
    // and the text itself is not a valid json response either.
    let should_retry = err_regex.map_or(false, |r| r.is_match(&err_text));

    tracing::event!(
        target: oraclex_relayer_utils::probe::TARGET,
        tracing::Level::DEBUG,
        kind = %oraclex_relayer_utils::probe::Kind::Retry,
        should_retry = should_retry,
        error = %err_text,
    );
    should_retry
}

impl RetryPolicy<HttpClientError> for OracleXHttpRetryPolicy {
    fn should_retry(&self, error: &HttpClientError) -> bool {
        tracing::debug!("should_retry: {:?}", error);
        match error {
            HttpClientError::ReqwestError(err) => {
                err.status().map(|s| s.as_u16()) == Some(429)
            }
            HttpClientError::JsonRpcError(err) => {
                should_retry_json_rpc_error(err)
            }
            HttpClientError::SerdeJson { text, .. } => {
                should_retry_json_rpc_error_from_text(
                    text,
                    self.err_regex.as_ref(),
                )
            }
        }
    }

    fn backoff_hint(&self, error: &HttpClientError) -> Option<Duration> {
        const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

        let Some(data) =
            error.as_error_response().and_then(|e| e.data.as_ref())
        else {
            return Some(DEFAULT_BACKOFF);
        };
        // if daily rate limit exceeded, infura returns the requested backoff in the error
        // response
        let Some(backoff_seconds) =
            data.get("rate").and_then(|v| v.get("backoff_seconds"))
        else {
            return Some(DEFAULT_BACKOFF);
        };
        if let Some(seconds) = backoff_seconds.as_u64() {
            return Some(Duration::from_secs(seconds));
        }
        if let Some(seconds) = backoff_seconds.as_f64() {
            return Some(Duration::from_secs(seconds as u64 + 1));
        }
        Some(DEFAULT_BACKOFF)
    }
}
