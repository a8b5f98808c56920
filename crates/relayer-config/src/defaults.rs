//! Default values used when a key is absent from the config files.

/// Human readable chain name.
pub fn chain_name() -> String {
    String::from("localhost")
}
/// BIP-44 path of the first Ethereum account.
pub fn derivation_path() -> String {
    String::from("m/44'/60'/0'/0/0")
}
/// Deadline for a single RPC call, in milliseconds.
pub const fn rpc_timeout() -> u64 {
    30_000
}
/// The block scanner polls every second.
pub const fn scan_polling_interval() -> u64 {
    1_000
}
/// Blocks per `eth_getLogs` window; kept small to bound the response size.
pub const fn max_blocks_per_step() -> u64 {
    2
}
/// The print progress interval is set to `7_000` by default.
pub const fn print_progress_interval() -> u64 {
    7_000
}
/// A failed commitment is retried at most this many times in total.
pub const fn max_attempts() -> u32 {
    3
}
/// The signature path runs every 10 seconds.
pub const fn signature_polling_interval() -> u64 {
    10_000
}
/// The `uint256` value committed by the signature path.
pub const fn signature_payload() -> u64 {
    2
}
/// The proof path runs every 30 seconds.
pub const fn proof_polling_interval() -> u64 {
    30_000
}
/// Gas limit attached to proof commitments.
pub const fn proof_gas_limit() -> u64 {
    500_000
}
/// Callback selector embedded in the proof public input.
pub fn callback_selector() -> String {
    String::from("0x1103ada8")
}
/// The nonce counter is reconciled every 500ms.
pub const fn reconcile_interval() -> u64 {
    500
}
/// How far the local nonce may run ahead of the network before it is reset.
pub const fn drift_threshold() -> u64 {
    20
}
/// `true`
pub const fn enabled() -> bool {
    true
}
/// `false`
pub const fn disabled() -> bool {
    false
}
