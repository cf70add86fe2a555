use cosmwasm_std::{Decimal, Uint128};

use crate::error::ContractError;
use crate::state::Config;

/// Native base units per whole native coin (9 decimals).
pub const NATIVE_UNIT: u128 = 1_000_000_000;
/// External base units per whole external unit (6 decimals).
pub const EXTERNAL_UNIT: u128 = 1_000_000;

/// Fees are computed in units of 0.01 native coin.
pub const FEE_SCALE: u128 = 10_000_000;
/// 0.01 external unit, the external-side fee precision.
pub const EXTERNAL_SCALE: u128 = 10_000;

/// Rates are per mille: a rate of 12 charges 1.2%.
pub const RATE_DENOM: u128 = 1_000;

pub fn native_min_fee(min_fee: u64) -> Uint128 {
    Uint128::from(min_fee as u128 * NATIVE_UNIT)
}

pub fn external_min_fee(min_fee: u64) -> Uint128 {
    Uint128::from(min_fee as u128 * EXTERNAL_UNIT)
}

/// Snapshot of the tier parameters a fee computation depends on. The result is
/// re-derivable from these fields and the two inputs alone.
#[derive(Clone, Debug, PartialEq)]
pub struct FeeSchedule {
    /// tier boundaries in fee units, common < whale
    pub common_bound: u128,
    pub whale_bound: u128,
    pub common_rate: u64,
    pub fish_rate: u64,
    pub whale_rate: u64,
    /// floor in whole units
    pub min_fee: u64,
}

impl FeeSchedule {
    pub fn from_config(config: &Config) -> Self {
        FeeSchedule {
            common_bound: config.common_bound,
            whale_bound: config.whale_bound,
            common_rate: config.common_fee_rate,
            fish_rate: config.fish_fee_rate,
            whale_rate: config.whale_fee_rate,
            min_fee: config.min_fee,
        }
    }

    /// Marginal tiered fee for a trade of `amount` by a party whose cumulative
    /// settled volume is `traded`, both in native base units.
    ///
    /// Whales pay a flat rate on the whole trade. Everyone else pays per slice:
    /// the trade is cut at the tier boundaries it crosses, starting from the
    /// party's current volume, and each slice is charged at its tier's rate.
    /// Rounded half-up once, at fee-unit precision, then floored at `min_fee`.
    pub fn native_fee(&self, traded: Uint128, amount: Uint128) -> Uint128 {
        let t = traded.u128() / FEE_SCALE;
        let a = amount.u128() / FEE_SCALE;

        let scaled = if t >= self.whale_bound || a >= self.whale_bound {
            a * self.whale_rate as u128
        } else {
            let end = t + a;
            // overlap of [t, end) with each tier band; empty slices contribute 0
            let common = end.min(self.common_bound).saturating_sub(t);
            let fish = end
                .min(self.whale_bound)
                .saturating_sub(t.max(self.common_bound));
            let whale = end.saturating_sub(self.whale_bound);

            common * self.common_rate as u128
                + fish * self.fish_rate as u128
                + whale * self.whale_rate as u128
        };

        let fee = (scaled + RATE_DENOM / 2) / RATE_DENOM * FEE_SCALE;
        Uint128::from(fee).max(native_min_fee(self.min_fee))
    }
}

/// Converts a native fee into external units at `rate` (external per native),
/// rounding half-up at 0.01 external precision and flooring at the external
/// minimum fee.
pub fn external_fee(
    native_fee: Uint128,
    rate: Decimal,
    min_fee: u64,
) -> Result<Uint128, ContractError> {
    let fee_units = Decimal::from_ratio(native_fee.u128() / FEE_SCALE, 1u128);
    let ext_units = (rate.checked_mul(fee_units)? + Decimal::percent(50)).to_uint_floor();
    let ext = ext_units * Uint128::from(EXTERNAL_SCALE);
    Ok(ext.max(external_min_fee(min_fee)))
}
