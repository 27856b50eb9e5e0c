//! AETHERBORN SWARM: single-wallet trade-planning and settlement
//! pipeline for the XRP Ledger.
//!
//! One invocation is one cycle: load credentials, snapshot the ledger,
//! size a transfer under risk and reserve constraints, record intent,
//! then simulate or submit.

pub mod audit;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod sizing;
pub mod transfer;
pub mod wallet;
pub mod xrpl;
