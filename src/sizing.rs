//! Trade sizing.
//!
//! Pure integer arithmetic over drops. The sizer either produces a
//! two-leg plan (principal + protocol fee) or stands the run down;
//! nothing downstream runs on a stand-down.

use rust_decimal::Decimal;

use crate::settings::RiskTier;

/// Minor units per XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Protocol fee rate in basis points (5 = 0.05%).
pub const PROTOCOL_FEE_BPS: u64 = 5;

/// Minimum protocol fee charge, in drops.
pub const MIN_FEE_DROPS: u64 = 10;

/// Trades below this are noise relative to network fee granularity.
pub const MIN_TRADE_DROPS: u64 = 10;

/// A sized cycle: amounts for both legs plus the inputs that produced
/// them. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradePlan {
    pub deployable_drops: u64,
    pub trade_drops: u64,
    pub fee_drops: u64,
    pub tier: RiskTier,
}

/// Size one cycle. `None` means stand down: nothing is built, recorded,
/// or submitted for this run.
pub fn plan_trade(balance_drops: u64, reserve_drops: u64, tier: RiskTier) -> Option<TradePlan> {
    let deployable = balance_drops.saturating_sub(reserve_drops);
    if deployable == 0 {
        return None;
    }

    let trade = (deployable as u128 * tier.deploy_bps() as u128 / 10_000) as u64;
    if trade < MIN_TRADE_DROPS {
        return None;
    }

    let fee = protocol_fee(trade);

    // Both legs must clear the reserve floor together.
    if trade + fee > deployable {
        return None;
    }

    Some(TradePlan {
        deployable_drops: deployable,
        trade_drops: trade,
        fee_drops: fee,
        tier,
    })
}

/// `max(floor(trade * bps / 10_000), floor)`. u128 intermediate so large
/// balances cannot overflow the product.
pub fn protocol_fee(trade_drops: u64) -> u64 {
    let fee = (trade_drops as u128 * PROTOCOL_FEE_BPS as u128 / 10_000) as u64;
    fee.max(MIN_FEE_DROPS)
}

/// Drops rendered as XRP at six-decimal display scale.
pub fn drops_to_xrp(drops: u64) -> Decimal {
    Decimal::new(drops as i64, 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stand_down_at_or_below_reserve() {
        let reserve = 10 * DROPS_PER_XRP;
        assert_eq!(plan_trade(0, reserve, RiskTier::Moderate), None);
        assert_eq!(plan_trade(reserve - 1, reserve, RiskTier::Moderate), None);
        assert_eq!(plan_trade(reserve, reserve, RiskTier::Moderate), None);
    }

    #[test]
    fn test_stand_down_on_dust_above_reserve() {
        // 10.000010 XRP against a 10 XRP reserve: 10 deployable drops,
        // 5% of which floors to zero.
        let reserve = 10 * DROPS_PER_XRP;
        assert_eq!(plan_trade(reserve + 10, reserve, RiskTier::Moderate), None);
    }

    #[test]
    fn test_moderate_tier_sizing() {
        // 110 XRP balance, 10 XRP reserve -> 100 XRP deployable,
        // 5% -> 5 XRP principal, fee = max(2500, 10) drops.
        let plan = plan_trade(110 * DROPS_PER_XRP, 10 * DROPS_PER_XRP, RiskTier::Moderate)
            .expect("plan");
        assert_eq!(plan.deployable_drops, 100 * DROPS_PER_XRP);
        assert_eq!(plan.trade_drops, 5 * DROPS_PER_XRP);
        assert_eq!(plan.fee_drops, 2_500);
    }

    #[test]
    fn test_tier_fractions_apply() {
        let balance = 110 * DROPS_PER_XRP;
        let reserve = 10 * DROPS_PER_XRP;
        let trade = |tier| plan_trade(balance, reserve, tier).expect("plan").trade_drops;
        assert_eq!(trade(RiskTier::Aggressive), 25 * DROPS_PER_XRP);
        assert_eq!(trade(RiskTier::Moderate), 5 * DROPS_PER_XRP);
        assert_eq!(trade(RiskTier::Conservative), 2_500_000);
        assert_eq!(trade(RiskTier::UltraConservative), DROPS_PER_XRP);
    }

    #[test]
    fn test_fee_floor() {
        // 5 bps of 10_000 drops is 5, below the 10-drop floor.
        assert_eq!(protocol_fee(10_000), MIN_FEE_DROPS);
        // 5 bps of 1 XRP is 500 drops.
        assert_eq!(protocol_fee(DROPS_PER_XRP), 500);
        assert!(protocol_fee(0) >= MIN_FEE_DROPS);
    }

    #[test]
    fn test_legs_never_exceed_deployable() {
        for balance in [11, 12, 50, 1_000, 1_000_000u64].map(|x| x * DROPS_PER_XRP) {
            for tier in [
                RiskTier::Aggressive,
                RiskTier::Moderate,
                RiskTier::Conservative,
                RiskTier::UltraConservative,
            ] {
                if let Some(plan) = plan_trade(balance, 10 * DROPS_PER_XRP, tier) {
                    assert!(plan.trade_drops + plan.fee_drops <= plan.deployable_drops);
                    assert!(plan.trade_drops > 0);
                }
            }
        }
    }

    #[test]
    fn test_drops_display_scale() {
        assert_eq!(drops_to_xrp(5 * DROPS_PER_XRP), dec!(5.000000));
        assert_eq!(drops_to_xrp(10).to_string(), "0.000010");
        assert_eq!(drops_to_xrp(0).to_string(), "0.000000");
    }
}
