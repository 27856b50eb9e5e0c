//! Planned transfers.
//!
//! Two immutable legs per executing cycle. Construction re-checks what
//! the sizer already guarantees; a rejection here means an upstream bug,
//! not an operator mistake.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::sizing::TradePlan;

/// What a leg is for. Serialized into the settlement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPurpose {
    Principal,
    ProtocolFee,
}

impl TransferPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPurpose::Principal => "principal",
            TransferPurpose::ProtocolFee => "protocol_fee",
        }
    }
}

/// One payment leg. Created by planning, consumed by the submitter and
/// the audit recorder; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTransfer {
    pub source: String,
    pub destination: String,
    pub amount_drops: u64,
    pub purpose: TransferPurpose,
}

impl PlannedTransfer {
    pub fn new(
        source: &str,
        destination: &str,
        amount_drops: u64,
        purpose: TransferPurpose,
    ) -> Result<Self, PipelineError> {
        if source == destination {
            return Err(PipelineError::InvalidTransfer(format!(
                "source and destination are the same account ({source})"
            )));
        }
        if amount_drops == 0 {
            return Err(PipelineError::InvalidTransfer(format!(
                "{} leg amount is zero",
                purpose.as_str()
            )));
        }
        Ok(Self {
            source: source.to_string(),
            destination: destination.to_string(),
            amount_drops,
            purpose,
        })
    }
}

/// Expand a sized cycle into its two legs, principal first.
pub fn plan_transfers(
    source: &str,
    vault: &str,
    plan: &TradePlan,
) -> Result<[PlannedTransfer; 2], PipelineError> {
    Ok([
        PlannedTransfer::new(source, vault, plan.trade_drops, TransferPurpose::Principal)?,
        PlannedTransfer::new(source, vault, plan.fee_drops, TransferPurpose::ProtocolFee)?,
    ])
}
