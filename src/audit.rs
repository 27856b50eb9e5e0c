//! Settlement records and the append-only outbox.
//!
//! One pacs.008-like JSON line per executing cycle, appended before any
//! submission is attempted: the record captures intent, not
//! confirmation. Lines are never rewritten or deleted; growth is
//! unbounded (known limitation).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::settings::{RiskTier, RunMode};
use crate::sizing::{drops_to_xrp, PROTOCOL_FEE_BPS};
use crate::transfer::{PlannedTransfer, TransferPurpose};
use crate::xrpl::client::LedgerSnapshot;
use crate::xrpl::fees::FeeSnapshot;

pub const RECORD_SCHEMA: &str = "AETHERBORN-ISO20022-v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub id: String,
    pub rail_hint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferLine {
    pub purpose: TransferPurpose,
    pub currency: String,
    /// Major-unit value at six-decimal display scale.
    pub value: String,
    pub value_drops: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charges {
    pub network_fee_estimate_drops: u64,
    pub protocol_fee_bps: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordContext {
    pub ledger_seq: Option<u32>,
    pub load_factor: Option<f64>,
    pub server_state: Option<String>,
    pub mode: String,
    pub risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub msg_type: String,
    pub schema: String,
    pub timestamp: String,
    pub debtor: Party,
    pub creditor: Party,
    pub transfers: Vec<TransferLine>,
    pub charges: Charges,
    pub context: RecordContext,
    pub end_to_end_id: String,
}

impl SettlementRecord {
    /// Assemble the record for one cycle at the given instant. Pure:
    /// identical inputs produce identical records.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        source: &str,
        destination: &str,
        transfers: &[PlannedTransfer],
        snapshot: &LedgerSnapshot,
        fees: &FeeSnapshot,
        mode: RunMode,
        risk: RiskTier,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            msg_type: "pacs.008-like".into(),
            schema: RECORD_SCHEMA.into(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            debtor: Party {
                name: "Governor AETHERBORN Source".into(),
                id: source.into(),
                rail_hint: "XRPL".into(),
            },
            creditor: Party {
                name: "Governor AETHERBORN Vault".into(),
                id: destination.into(),
                rail_hint: "XRPL".into(),
            },
            transfers: transfers
                .iter()
                .map(|t| TransferLine {
                    purpose: t.purpose,
                    currency: "XRP".into(),
                    value: drops_to_xrp(t.amount_drops).to_string(),
                    value_drops: t.amount_drops,
                })
                .collect(),
            charges: Charges {
                network_fee_estimate_drops: fees.recommended_drops(),
                protocol_fee_bps: PROTOCOL_FEE_BPS,
            },
            context: RecordContext {
                ledger_seq: snapshot.ledger_sequence,
                load_factor: snapshot.load_factor,
                server_state: snapshot.server_state.clone(),
                mode: mode.as_str().into(),
                risk: risk.code().into(),
            },
            end_to_end_id: end_to_end_id(source, snapshot.ledger_sequence, now),
        }
    }
}

/// Correlation id: ledger sequence plus wall clock, with an address tail
/// so outboxes of different sources stay distinguishable.
pub fn end_to_end_id(source: &str, ledger_seq: Option<u32>, now: DateTime<Utc>) -> String {
    let tail = &source[source.len().saturating_sub(4)..];
    format!(
        "AETHER-{tail}-{}-{}",
        ledger_seq.unwrap_or(0),
        now.timestamp()
    )
}

/// Append-only outbox.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single JSON line, creating the file and
    /// its parent directory on first use.
    pub fn append(&self, record: &SettlementRecord) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut line = serde_json::to_string(record)
            .map_err(|e| PipelineError::Audit(std::io::Error::other(e)))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::plan_trade;
    use crate::sizing::DROPS_PER_XRP;
    use crate::transfer::plan_transfers;
    use chrono::TimeZone;

    const SRC: &str = "rEXdG3Rh9Ejb3NKXoxb16xge4d3BHskJUP";
    const DST: &str = "rK7BKKcayjcbwAdYBj1XnAy1hR2zesTqQZ";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn sample_record() -> SettlementRecord {
        let plan = plan_trade(110 * DROPS_PER_XRP, 10 * DROPS_PER_XRP, RiskTier::Moderate)
            .expect("plan");
        let transfers = plan_transfers(SRC, DST, &plan).expect("legs");
        let snapshot = LedgerSnapshot {
            ledger_sequence: Some(90_000_123),
            load_factor: Some(1.0),
            peer_count: Some(21),
            server_state: Some("full".into()),
        };
        SettlementRecord::build(
            SRC,
            DST,
            &transfers,
            &snapshot,
            &FeeSnapshot::default(),
            RunMode::Paper,
            RiskTier::Moderate,
            fixed_now(),
        )
    }

    #[test]
    fn test_record_fields() {
        let record = sample_record();
        assert_eq!(record.debtor.id, SRC);
        assert_eq!(record.creditor.id, DST);
        assert_eq!(record.transfers.len(), 2);
        assert_eq!(record.transfers[0].purpose, TransferPurpose::Principal);
        assert_eq!(record.transfers[0].value, "5.000000");
        assert_eq!(record.transfers[0].value_drops, 5 * DROPS_PER_XRP);
        assert_eq!(record.transfers[1].value_drops, 2_500);
        assert_eq!(record.charges.protocol_fee_bps, 5);
        assert_eq!(record.context.mode, "PAPER");
        assert_eq!(record.context.risk, "B");
    }

    #[test]
    fn test_build_is_idempotent() {
        // Same inputs, same instant: byte-identical records.
        assert_eq!(sample_record(), sample_record());
    }

    #[test]
    fn test_serde_round_trip() {
        let record = sample_record();
        let line = serde_json::to_string(&record).expect("serialize");
        assert!(!line.contains('\n'));
        let parsed: SettlementRecord = serde_json::from_str(&line).expect("parse");
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_end_to_end_id_shape() {
        let id = end_to_end_id(SRC, Some(90_000_123), fixed_now());
        assert_eq!(id, format!("AETHER-kJUP-90000123-{}", fixed_now().timestamp()));
        let degraded = end_to_end_id(SRC, None, fixed_now());
        assert!(degraded.starts_with("AETHER-kJUP-0-"));
    }

    #[test]
    fn test_append_creates_parents_and_appends() {
        let dir = std::env::temp_dir().join(format!("aetherborn-audit-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let log = AuditLog::new(dir.join("nested").join("outbox.jsonl"));

        let record = sample_record();
        log.append(&record).expect("first append");
        log.append(&record).expect("second append");

        let contents = fs::read_to_string(log.path()).expect("read back");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: SettlementRecord = serde_json::from_str(line).expect("each line parses");
            assert_eq!(parsed, record);
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
