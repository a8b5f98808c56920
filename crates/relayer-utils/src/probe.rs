use derive_more::Display;
/// Target for logger
pub const TARGET: &str = "oraclex_probe";

/// The Kind of the Probe.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// When the Lifecycle of the Relayer changes, like starting or shutting down.
    #[display(fmt = "lifecycle")]
    Lifecycle,
    /// Relayer block scanning state.
    #[display(fmt = "sync")]
    Sync,
    /// A subscription entered or changed state in the registry.
    #[display(fmt = "registry")]
    Registry,
    /// The local nonce counter was reset to the network value.
    #[display(fmt = "nonce")]
    Nonce,
    /// A data commitment was built for a subscription.
    #[display(fmt = "commitment")]
    Commitment,
    /// Relayer Transaction submission state.
    #[display(fmt = "tx_queue")]
    TxQueue,
    /// When the relayer will retry to do something.
    #[display(fmt = "retry")]
    Retry,
}
