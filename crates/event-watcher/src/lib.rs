#![warn(missing_docs)]
//! # OracleX Event Watcher 🕸️
//!
//! Watches the OracleX contract: the [`scanner::BlockScanner`] walks the chain
//! in small windows, [`decoder`] normalizes the four contract events and
//! queries land in the subscription registry.

/// The contract event schema.
pub mod abi;
/// Event decoding.
pub mod decoder;
/// The block scanner and its cursor.
pub mod scanner;

pub use decoder::{decode_event, decode_log};
pub use scanner::{BlockScanner, ScanCursor, ScanReport, ScanWindow};
