//! Runtime configuration.
//!
//! Everything the pipeline needs is read from the process environment
//! once, materialized into a `Settings` value, and passed down
//! explicitly. `.env` files are honored by the binary before this runs.

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use url::Url;

use crate::sizing::DROPS_PER_XRP;

const DEFAULT_RPC_URL: &str = "https://s1.ripple.com:51234/";

/// Execution mode for one run. Paper is the default: plan, record,
/// submit nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Paper,
    Live,
}

impl RunMode {
    /// Anything other than an explicit LIVE stays paper.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LIVE" => RunMode::Live,
            _ => RunMode::Paper,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Paper => "PAPER",
            RunMode::Live => "LIVE",
        }
    }
}

/// Four-level risk tier. Unrecognized input falls back to Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Aggressive,
    Moderate,
    Conservative,
    UltraConservative,
}

impl RiskTier {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" | "AGGRESSIVE" => RiskTier::Aggressive,
            "B" | "MODERATE" => RiskTier::Moderate,
            "C" | "CONSERVATIVE" => RiskTier::Conservative,
            "D" | "ULTRA" | "ULTRA_CONSERVATIVE" => RiskTier::UltraConservative,
            _ => RiskTier::Moderate,
        }
    }

    /// Fraction of the deployable balance committed per cycle, in
    /// basis points.
    pub fn deploy_bps(&self) -> u64 {
        match self {
            RiskTier::Aggressive => 2_500,
            RiskTier::Moderate => 500,
            RiskTier::Conservative => 250,
            RiskTier::UltraConservative => 100,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RiskTier::Aggressive => "A",
            RiskTier::Moderate => "B",
            RiskTier::Conservative => "C",
            RiskTier::UltraConservative => "D",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Aggressive => "Aggressive",
            RiskTier::Moderate => "Moderate",
            RiskTier::Conservative => "Conservative",
            RiskTier::UltraConservative => "Ultra-Conservative",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: RunMode,
    pub risk: RiskTier,
    pub rpc_url: Url,
    pub source_wallet_path: PathBuf,
    pub vault_wallet_path: PathBuf,
    pub outbox_path: PathBuf,
    /// Balance never allocated to trades, in drops.
    pub reserve_drops: u64,
    pub log_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let rpc_url = env::var("XRPL_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.into());
        let rpc_url =
            Url::parse(&rpc_url).with_context(|| format!("invalid XRPL_RPC_URL: {rpc_url}"))?;

        let reserve_xrp: u64 = env::var("AETHERBORN_RESERVE_XRP")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("AETHERBORN_RESERVE_XRP must be a whole XRP amount")?
            .unwrap_or(10);

        Ok(Self {
            mode: RunMode::parse(&env::var("AETHERBORN_MODE").unwrap_or_default()),
            risk: RiskTier::parse(&env::var("AETHERBORN_RISK").unwrap_or_default()),
            rpc_url,
            source_wallet_path: env::var("AETHERBORN_WALLET")
                .unwrap_or_else(|_| "config/governor_wallet.json".into())
                .into(),
            vault_wallet_path: env::var("AETHERBORN_VAULT_WALLET")
                .unwrap_or_else(|_| "config/governor_vault_wallet.json".into())
                .into(),
            outbox_path: env::var("AETHERBORN_OUTBOX")
                .unwrap_or_else(|_| "config/iso20022_outbox.jsonl".into())
                .into(),
            reserve_drops: reserve_xrp * DROPS_PER_XRP,
            log_dir: env::var("AETHERBORN_LOG_DIR").unwrap_or_else(|_| "logs".into()).into(),
        })
    }
}
