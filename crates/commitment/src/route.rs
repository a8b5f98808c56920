use derive_more::Display;

use oraclex_relayer_types::{AuthMode, NormalizedEvent};

/// How a subscription gets its commitment.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// A single oracle signature over the commitment hash.
    #[display(fmt = "signature")]
    Signature,
    /// Several oracle signatures. Recognized, not serviced.
    #[display(fmt = "multisig")]
    Multisig,
    /// A packed public input for the proof verifier.
    #[display(fmt = "proof")]
    Proof,
    /// No path can service this subscription.
    #[display(fmt = "unsupported")]
    Unsupported,
}

/// Which commitment task services a route.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// The signature task.
    #[display(fmt = "fast")]
    Fast,
    /// The proof task.
    #[display(fmt = "slow")]
    Slow,
}

impl Route {
    /// The task that services this route.
    pub fn cadence(self) -> Cadence {
        match self {
            Route::Proof => Cadence::Slow,
            Route::Signature | Route::Multisig | Route::Unsupported => {
                Cadence::Fast
            }
        }
    }
}

/// Picks the commitment path for a registry event.
///
/// Active subscriptions are answered by signature, passive requests by
/// proof. An active subscription asking for a proof still goes to the proof
/// path, which rejects it for lack of callback metadata.
pub fn route(event: &NormalizedEvent) -> Route {
    match (event, event.auth_mode()) {
        (_, AuthMode::Multisig) => Route::Multisig,
        (_, AuthMode::Unknown) => Route::Unsupported,
        (NormalizedEvent::ActiveModeQuery(_), AuthMode::Signature) => {
            Route::Signature
        }
        (NormalizedEvent::ActiveModeQuery(_), AuthMode::Proof) => Route::Proof,
        (NormalizedEvent::PassiveModeQuery(_), AuthMode::Signature) => {
            Route::Unsupported
        }
        (NormalizedEvent::PassiveModeQuery(_), AuthMode::Proof) => Route::Proof,
        (
            NormalizedEvent::ActiveModeCommitment(_)
            | NormalizedEvent::PassiveModeCommitment(_),
            _,
        ) => Route::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraclex_relayer_types::{
        ActiveModeCommitment, ActiveModeQuery, PassiveModeQuery,
    };

    fn active(auth_mode: AuthMode) -> NormalizedEvent {
        NormalizedEvent::ActiveModeQuery(ActiveModeQuery {
            subscription_id: "1".into(),
            auth_mode,
            manager_address: "0x00000000000000000000000000000000000000aa"
                .into(),
            extra_params: "0x".into(),
        })
    }

    fn passive(auth_mode: AuthMode) -> NormalizedEvent {
        NormalizedEvent::PassiveModeQuery(PassiveModeQuery {
            request_id: "1".into(),
            nonce: "0".into(),
            subscription_id: "1".into(),
            auth_mode,
            callback_address: "0x00000000000000000000000000000000000000cc"
                .into(),
            manager_address: "0x00000000000000000000000000000000000000aa"
                .into(),
            callback_gas_limit: "100000".into(),
            extra_params: "0x".into(),
        })
    }

    #[test]
    fn routing_table() {
        use AuthMode::*;
        let cases = [
            (active(Signature), Route::Signature),
            (active(Multisig), Route::Multisig),
            (active(Proof), Route::Proof),
            (active(Unknown), Route::Unsupported),
            (passive(Signature), Route::Unsupported),
            (passive(Multisig), Route::Multisig),
            (passive(Proof), Route::Proof),
            (passive(Unknown), Route::Unsupported),
        ];
        for (event, expected) in cases {
            assert_eq!(route(&event), expected, "{event:?}");
        }
    }

    #[test]
    fn only_proofs_are_slow() {
        assert_eq!(Route::Proof.cadence(), Cadence::Slow);
        assert_eq!(Route::Signature.cadence(), Cadence::Fast);
        assert_eq!(Route::Multisig.cadence(), Cadence::Fast);
        assert_eq!(Route::Unsupported.cadence(), Cadence::Fast);
    }

    #[test]
    fn commitment_events_are_never_routed() {
        let event =
            NormalizedEvent::ActiveModeCommitment(ActiveModeCommitment {
                sub_id: "1".into(),
                auth_mode: AuthMode::Signature,
            });
        assert_eq!(route(&event), Route::Unsupported);
    }
}
