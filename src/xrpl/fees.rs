//! Network fee oracle.
//!
//! Reads the ledger's `fee` RPC and exposes a padded recommendation.
//! Advisory: when the RPC degrades the caller falls back to `Default`,
//! which is the protocol's 10-drop base fee.

use serde_json::Value;

/// Ledger fee readings, in drops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSnapshot {
    pub base_drops: u64,
    pub median_drops: u64,
    pub open_ledger_drops: u64,
    pub load_factor: f64,
}

impl Default for FeeSnapshot {
    fn default() -> Self {
        Self {
            base_drops: 10,
            median_drops: 10,
            open_ledger_drops: 10,
            load_factor: 1.0,
        }
    }
}

impl FeeSnapshot {
    /// Parse a `fee` RPC result. Missing readings cascade down to the
    /// base fee rather than failing.
    pub fn from_rpc(result: &Value) -> Self {
        let drops = result.get("drops").cloned().unwrap_or(Value::Null);
        let read = |key: &str, fallback: u64| -> u64 {
            drops
                .get(key)
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback)
        };

        let base = read("base_fee", 10);
        let median = read("median_fee", base);
        let open_ledger = read("open_ledger_fee", median);
        let load_factor = result.get("load_factor").and_then(Value::as_f64).unwrap_or(1.0);

        Self {
            base_drops: base,
            median_drops: median,
            open_ledger_drops: open_ledger,
            load_factor,
        }
    }

    /// Open-ledger fee padded 20%, never below the median.
    pub fn recommended_drops(&self) -> u64 {
        (self.open_ledger_drops * 12 / 10).max(self.median_drops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_reading() {
        let result = json!({
            "drops": {
                "base_fee": "10",
                "median_fee": "5000",
                "open_ledger_fee": "12000",
            },
            "load_factor": 256.0,
        });
        let snap = FeeSnapshot::from_rpc(&result);
        assert_eq!(snap.base_drops, 10);
        assert_eq!(snap.median_drops, 5_000);
        assert_eq!(snap.open_ledger_drops, 12_000);
        assert_eq!(snap.load_factor, 256.0);
    }

    #[test]
    fn test_missing_readings_cascade() {
        let snap = FeeSnapshot::from_rpc(&json!({ "drops": { "base_fee": "12" } }));
        assert_eq!(snap.base_drops, 12);
        assert_eq!(snap.median_drops, 12);
        assert_eq!(snap.open_ledger_drops, 12);
        assert_eq!(snap.load_factor, 1.0);
    }

    #[test]
    fn test_empty_result_is_default() {
        assert_eq!(FeeSnapshot::from_rpc(&json!({})), FeeSnapshot::default());
    }

    #[test]
    fn test_recommendation_pads_open_ledger() {
        let snap = FeeSnapshot {
            base_drops: 10,
            median_drops: 10,
            open_ledger_drops: 100,
            load_factor: 1.0,
        };
        assert_eq!(snap.recommended_drops(), 120);
    }

    #[test]
    fn test_recommendation_never_below_median() {
        let snap = FeeSnapshot {
            base_drops: 10,
            median_drops: 5_000,
            open_ledger_drops: 10,
            load_factor: 1.0,
        };
        assert_eq!(snap.recommended_drops(), 5_000);
    }
}
