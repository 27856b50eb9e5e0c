//! Ledger-facing plumbing: JSON-RPC client, fee oracle, payment codec,
//! and signing.

pub mod client;
pub mod codec;
pub mod fees;
pub mod signer;
