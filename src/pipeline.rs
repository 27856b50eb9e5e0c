//! The one linear run.
//!
//! load credentials → snapshot the ledger → confirm source state → size
//! the cycle → plan both legs → write-ahead settlement record → paper or
//! live execution → realized-delta report. No retries, no loops, no
//! state carried between invocations.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::audit::{AuditLog, SettlementRecord};
use crate::error::PipelineError;
use crate::settings::{RunMode, Settings};
use crate::sizing::{self, drops_to_xrp};
use crate::transfer::{plan_transfers, PlannedTransfer};
use crate::wallet::WalletCredential;
use crate::xrpl::client::{AccountState, LedgerClient, LEDGER_HORIZON};
use crate::xrpl::codec::{decode_account_id, Payment};
use crate::xrpl::signer::{prefixed_public_key, sign_payment};

/// How one run ended. Every variant exits zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Not enough deployable balance; nothing built, recorded, or sent.
    StandDown,
    /// Paper mode: planned and recorded, nothing sent, zero delta.
    Simulated,
    /// Live mode, but the vault could not be confirmed on-ledger; the
    /// record was written and submission skipped.
    LiveDry,
    /// Live submission ran to completion.
    Live {
        fee_leg_failed: bool,
        delta_drops: i64,
    },
}

pub async fn run(settings: &Settings) -> Result<RunOutcome, PipelineError> {
    // Credentials first: both files validated before any network call.
    let source = WalletCredential::load(&settings.source_wallet_path)?;
    let vault = WalletCredential::load(&settings.vault_wallet_path)?;
    info!("source account: {}", source.address);
    info!("vault  account: {}", vault.address);

    let client = LedgerClient::new(settings.rpc_url.clone())?;

    // Advisory status snapshot; the run proceeds even when degraded.
    let snapshot = client.server_snapshot().await;
    info!(
        ledger_seq = ?snapshot.ledger_sequence,
        load_factor = ?snapshot.load_factor,
        peers = ?snapshot.peer_count,
        state = ?snapshot.server_state,
        "ledger status"
    );

    // Confirmed source state. Fatal on failure, before anything is planned.
    let account = client.account_state(&source.address).await?;
    info!("live balance: {} XRP", drops_to_xrp(account.balance_drops));

    let Some(plan) = sizing::plan_trade(account.balance_drops, settings.reserve_drops, settings.risk)
    else {
        info!("deployable balance too small above reserve, standing down");
        return Ok(RunOutcome::StandDown);
    };
    info!(
        "planned principal leg: {} drops ({} XRP, {} bps of deployable)",
        plan.trade_drops,
        drops_to_xrp(plan.trade_drops),
        plan.tier.deploy_bps()
    );
    info!(
        "protocol fee leg: {} drops ({} XRP)",
        plan.fee_drops,
        drops_to_xrp(plan.fee_drops)
    );

    // Construction re-checks the sizer's guarantees.
    let transfers = plan_transfers(&source.address, &vault.address, &plan)?;

    // Write-ahead settlement record: intent is durable even if live
    // submission fails after this point.
    let fees = client.fee_snapshot().await;
    let record = SettlementRecord::build(
        &source.address,
        &vault.address,
        &transfers,
        &snapshot,
        &fees,
        settings.mode,
        settings.risk,
        Utc::now(),
    );
    let outbox = AuditLog::new(&settings.outbox_path);
    outbox.append(&record)?;
    info!(
        "settlement record {} appended to {}",
        record.end_to_end_id,
        outbox.path().display()
    );

    match settings.mode {
        RunMode::Paper => {
            debug!(?transfers, "paper mode, unsigned instructions");
            info!("paper mode, not submitting");
            info!("post-cycle delta: 0.000000 XRP (simulation only)");
            Ok(RunOutcome::Simulated)
        }
        RunMode::Live => {
            run_live(
                settings,
                &client,
                &source,
                &vault,
                &transfers,
                account,
                fees.recommended_drops(),
            )
            .await
        }
    }
}

async fn run_live(
    settings: &Settings,
    client: &LedgerClient,
    source: &WalletCredential,
    vault: &WalletCredential,
    transfers: &[PlannedTransfer; 2],
    account: AccountState,
    network_fee_drops: u64,
) -> Result<RunOutcome, PipelineError> {
    // The vault must exist on-ledger before anything irreversible happens.
    match client.account_exists(&vault.address).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("vault account not found on-ledger, skipping submission");
            return Ok(RunOutcome::LiveDry);
        }
        Err(e) => {
            warn!("vault lookup failed ({e}), skipping submission");
            return Ok(RunOutcome::LiveDry);
        }
    }

    let signing_key =
        source
            .signing_key()
            .map_err(|reason| PipelineError::InvalidCredential {
                path: settings.source_wallet_path.clone(),
                reason,
            })?;
    let signing_pub_key = prefixed_public_key(&signing_key);

    let account_id = decode_account_id(&source.address).map_err(PipelineError::InvalidTransfer)?;
    let destination_id =
        decode_account_id(&vault.address).map_err(PipelineError::InvalidTransfer)?;

    let last_ledger_sequence = account.ledger_index + LEDGER_HORIZON;

    // Principal first. A principal failure aborts the run before the fee
    // leg; a validated principal advances the account sequence by one.
    let mut fee_leg_failed = false;
    for (offset, transfer) in transfers.iter().enumerate() {
        let payment = Payment {
            account: account_id,
            destination: destination_id,
            amount_drops: transfer.amount_drops,
            fee_drops: network_fee_drops,
            sequence: account.sequence + offset as u32,
            last_ledger_sequence,
            signing_pub_key: signing_pub_key.clone(),
        };
        let signed = sign_payment(&payment, &signing_key);
        info!(
            "{} leg: submitting tx {}",
            transfer.purpose.as_str(),
            signed.hash_hex
        );

        match client
            .submit_and_wait(
                &signed.blob_hex,
                &signed.hash_hex,
                last_ledger_sequence,
                transfer.purpose.as_str(),
            )
            .await
        {
            Ok(result) => info!("{} leg validated: {result}", transfer.purpose.as_str()),
            Err(e) if offset == 0 => return Err(e),
            Err(e) => {
                // Partial completion is accepted: no rollback, no retry,
                // surfaced to the operator as a warning.
                warn!("fee leg failed after settled principal leg: {e}");
                fee_leg_failed = true;
            }
        }
    }

    // Realized delta for the cycle.
    let after = client.account_state(&source.address).await?;
    let delta = after.balance_drops as i64 - account.balance_drops as i64;
    info!("post-cycle delta: {} XRP", Decimal::new(delta, 6));

    Ok(RunOutcome::Live {
        fee_leg_failed,
        delta_drops: delta,
    })
}
