//! Minimal ledger JSON-RPC client.
//!
//! One round trip per call, no retries. Critical lookups (balance,
//! submission) surface `LedgerQuery`/`Submission` errors; advisory
//! lookups (server status, fee) degrade to defaults and log a warning.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::PipelineError;
use crate::xrpl::fees::FeeSnapshot;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated-ledger horizon granted to a submitted transaction.
pub const LEDGER_HORIZON: u32 = 20;

const FINALITY_POLL_INTERVAL: Duration = Duration::from_secs(3);
const MAX_FINALITY_POLLS: u32 = 20;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: [Value; 1],
    id: u64,
}

/// Advisory ledger/server status. Absent fields mean the status lookup
/// degraded; the trade decision does not depend on them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub ledger_sequence: Option<u32>,
    pub load_factor: Option<f64>,
    pub peer_count: Option<u32>,
    pub server_state: Option<String>,
}

impl LedgerSnapshot {
    fn from_rpc(result: &Value) -> Self {
        let info = result.get("info").cloned().unwrap_or(Value::Null);
        Self {
            ledger_sequence: info
                .pointer("/validated_ledger/seq")
                .and_then(Value::as_u64)
                .map(|v| v as u32),
            load_factor: info.get("load_factor").and_then(Value::as_f64),
            peer_count: info.get("peers").and_then(Value::as_u64).map(|v| v as u32),
            server_state: info
                .get("server_state")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Confirmed account state from the validated ledger.
#[derive(Debug, Clone, Copy)]
pub struct AccountState {
    pub balance_drops: u64,
    pub sequence: u32,
    pub ledger_index: u32,
}

fn parse_account_state(result: &Value) -> Result<AccountState, String> {
    let data = result
        .get("account_data")
        .ok_or("response missing `account_data`")?;
    let balance_drops = data
        .get("Balance")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or("unparseable `Balance`")?;
    let sequence = data
        .get("Sequence")
        .and_then(Value::as_u64)
        .ok_or("unparseable `Sequence`")? as u32;
    let ledger_index = result
        .get("ledger_index")
        .and_then(Value::as_u64)
        .ok_or("missing `ledger_index`")? as u32;
    Ok(AccountState {
        balance_drops,
        sequence,
        ledger_index,
    })
}

/// Tentative result of a `submit` call.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub engine_result: String,
    pub engine_result_message: String,
}

/// Provisional engine results that can still reach a validated ledger.
fn engine_result_accepted(code: &str) -> bool {
    code == "tesSUCCESS" || code.starts_with("ter")
}

/// Status of a transaction as far as the ledger knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxFinality {
    Pending,
    Validated { result: String },
}

pub struct LedgerClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl LedgerClient {
    pub fn new(url: Url) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::LedgerQuery {
                method: "client",
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    /// One JSON-RPC round trip. Transport failures, non-2xx responses,
    /// and ledger-side `status: error` all map to `LedgerQuery`.
    async fn request(&self, method: &'static str, params: Value) -> Result<Value, PipelineError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            method,
            params: [params],
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let resp = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::LedgerQuery {
                method,
                reason: format!("transport: {e}"),
            })?;

        if !resp.status().is_success() {
            return Err(PipelineError::LedgerQuery {
                method,
                reason: format!("HTTP {}", resp.status()),
            });
        }

        let data: Value = resp.json().await.map_err(|e| PipelineError::LedgerQuery {
            method,
            reason: format!("malformed body: {e}"),
        })?;

        let result = data
            .get("result")
            .cloned()
            .ok_or_else(|| PipelineError::LedgerQuery {
                method,
                reason: "response missing `result`".into(),
            })?;

        if result.get("status").and_then(Value::as_str) == Some("error") {
            let err = result
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknownError");
            let msg = result
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("");
            return Err(PipelineError::LedgerQuery {
                method,
                reason: format!("{err} {msg}").trim().to_string(),
            });
        }

        Ok(result)
    }

    /// Confirmed balance, sequence, and validated ledger index. Fatal
    /// for the run when it fails.
    pub async fn account_state(&self, address: &str) -> Result<AccountState, PipelineError> {
        let result = self
            .request(
                "account_info",
                json!({
                    "account": address,
                    "ledger_index": "validated",
                    "strict": true,
                }),
            )
            .await?;
        parse_account_state(&result).map_err(|reason| PipelineError::LedgerQuery {
            method: "account_info",
            reason,
        })
    }

    /// Whether the account exists in the validated ledger.
    pub async fn account_exists(&self, address: &str) -> Result<bool, PipelineError> {
        match self.account_state(address).await {
            Ok(_) => Ok(true),
            Err(PipelineError::LedgerQuery { reason, .. }) if reason.contains("actNotFound") => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Advisory status lookup. Never fails; absent fields mean degraded.
    pub async fn server_snapshot(&self) -> LedgerSnapshot {
        match self.request("server_info", json!({})).await {
            Ok(result) => LedgerSnapshot::from_rpc(&result),
            Err(e) => {
                warn!("status lookup degraded: {e}");
                LedgerSnapshot::default()
            }
        }
    }

    /// Advisory fee lookup; degrades to protocol defaults.
    pub async fn fee_snapshot(&self) -> FeeSnapshot {
        match self.request("fee", json!({})).await {
            Ok(result) => FeeSnapshot::from_rpc(&result),
            Err(e) => {
                warn!("fee lookup degraded, using defaults: {e}");
                FeeSnapshot::default()
            }
        }
    }

    /// Submit a signed blob. The engine result is tentative until the
    /// transaction appears in a validated ledger.
    pub async fn submit(&self, tx_blob_hex: &str) -> Result<SubmitOutcome, PipelineError> {
        let result = self
            .request("submit", json!({ "tx_blob": tx_blob_hex }))
            .await?;
        Ok(SubmitOutcome {
            engine_result: result
                .get("engine_result")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            engine_result_message: result
                .get("engine_result_message")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        })
    }

    /// One `tx` poll for a submitted hash.
    pub async fn tx_finality(&self, tx_hash: &str) -> Result<TxFinality, PipelineError> {
        let result = match self.request("tx", json!({ "transaction": tx_hash })).await {
            Ok(r) => r,
            // Not yet in any ledger the server knows about.
            Err(PipelineError::LedgerQuery { reason, .. }) if reason.contains("txnNotFound") => {
                return Ok(TxFinality::Pending);
            }
            Err(e) => return Err(e),
        };

        if result.get("validated").and_then(Value::as_bool) == Some(true) {
            let tx_result = result
                .pointer("/meta/TransactionResult")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Ok(TxFinality::Validated { result: tx_result });
        }
        Ok(TxFinality::Pending)
    }

    /// Submit and block until the ledger validates the transaction or
    /// the last-ledger horizon passes.
    pub async fn submit_and_wait(
        &self,
        tx_blob_hex: &str,
        tx_hash: &str,
        last_ledger_sequence: u32,
        leg: &'static str,
    ) -> Result<String, PipelineError> {
        let outcome = self.submit(tx_blob_hex).await?;
        debug!(leg, engine_result = %outcome.engine_result, "submitted");

        if !engine_result_accepted(&outcome.engine_result) {
            return Err(PipelineError::Submission {
                leg,
                reason: format!(
                    "{}: {}",
                    outcome.engine_result, outcome.engine_result_message
                ),
            });
        }

        for _ in 0..MAX_FINALITY_POLLS {
            tokio::time::sleep(FINALITY_POLL_INTERVAL).await;

            match self.tx_finality(tx_hash).await? {
                TxFinality::Validated { result } if result == "tesSUCCESS" => return Ok(result),
                TxFinality::Validated { result } => {
                    return Err(PipelineError::Submission {
                        leg,
                        reason: format!("validated with {result}"),
                    });
                }
                TxFinality::Pending => {}
            }

            // Once the validated ledger passes LastLedgerSequence the
            // transaction can never succeed.
            if let Some(seq) = self.server_snapshot().await.ledger_sequence {
                if seq > last_ledger_sequence {
                    return Err(PipelineError::Submission {
                        leg,
                        reason: format!("expired unvalidated past ledger {last_ledger_sequence}"),
                    });
                }
            }
        }

        Err(PipelineError::Submission {
            leg,
            reason: "finality polling timed out".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_state() {
        let result = json!({
            "account_data": { "Balance": "110000000", "Sequence": 42 },
            "ledger_index": 90000000,
        });
        let state = parse_account_state(&result).expect("state");
        assert_eq!(state.balance_drops, 110_000_000);
        assert_eq!(state.sequence, 42);
        assert_eq!(state.ledger_index, 90_000_000);
    }

    #[test]
    fn test_parse_account_state_rejects_missing_fields() {
        assert!(parse_account_state(&json!({})).is_err());
        let no_balance = json!({
            "account_data": { "Sequence": 42 },
            "ledger_index": 1,
        });
        assert!(parse_account_state(&no_balance).is_err());
    }

    #[test]
    fn test_server_snapshot_parsing() {
        let result = json!({
            "info": {
                "validated_ledger": { "seq": 90000123 },
                "load_factor": 1.0,
                "peers": 21,
                "server_state": "full",
            }
        });
        let snap = LedgerSnapshot::from_rpc(&result);
        assert_eq!(snap.ledger_sequence, Some(90_000_123));
        assert_eq!(snap.load_factor, Some(1.0));
        assert_eq!(snap.peer_count, Some(21));
        assert_eq!(snap.server_state.as_deref(), Some("full"));
    }

    #[test]
    fn test_degraded_snapshot_has_absent_fields() {
        let snap = LedgerSnapshot::from_rpc(&json!({}));
        assert_eq!(snap, LedgerSnapshot::default());
        assert_eq!(snap.ledger_sequence, None);
    }

    #[test]
    fn test_engine_result_classification() {
        assert!(engine_result_accepted("tesSUCCESS"));
        assert!(engine_result_accepted("terQUEUED"));
        assert!(!engine_result_accepted("tecUNFUNDED_PAYMENT"));
        assert!(!engine_result_accepted("temBAD_FEE"));
        assert!(!engine_result_accepted("tefPAST_SEQ"));
    }
}
