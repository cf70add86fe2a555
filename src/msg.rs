use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Decimal, Timestamp, Uint128};

use crate::state::Deal;

#[cw_serde]
pub struct InstantiateMsg {
    /// native denom escrowed by deals
    pub denom: String,
    /// defaults to the instantiator
    pub owner: Option<String>,
    /// address whose balance seeds the lottery draw
    pub decider: String,
    /// deferred-call service used by ScheduleDraw
    pub scheduler: String,
    pub min_value: Option<Uint128>,
    pub deal_time_limit: Option<u64>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Escrows `value + fee` native coin from the seller against an off-chain
    /// settlement of `external_value` at `rate` external units per native.
    OpenDeal {
        value: Uint128,
        fee: Uint128,
        seller_external: String,
        buyer: String,
        buyer_external: String,
        rate: Decimal,
        external_value: Uint128,
        external_fee: Uint128,
    },
    /// Owner attests the off-chain payment arrived; releases coin to the buyer.
    SettleDeal {
        deal_id: u64,
    },
    /// Owner returns an expired deal's escrow to the seller, minus the
    /// handling charge.
    RefundDeal {
        deal_id: u64,
    },
    /// Registers a one-shot future Draw invocation with the scheduler.
    ScheduleDraw {},
    /// Pays the lottery bank to a pseudo-randomly selected past participant.
    Draw {},
    SetRandomnessDecider {
        address: String,
    },
    SetFees {
        min_value: Uint128,
        common_fee_rate: u64,
        fish_fee_rate: u64,
        whale_fee_rate: u64,
        min_fee: u64,
        deal_time_limit: u64,
    },
    Withdraw {
        amount: Uint128,
    },
}

/// Wire format of the deferred-call service. Delivery is best effort and
/// there is no cancellation.
#[cw_serde]
pub enum SchedulerMsg {
    ScheduleCallback {
        /// message to execute back on the sender
        msg: Binary,
        execute_not_before: Timestamp,
    },
}

#[cw_serde]
pub enum QueryMsg {
    Config {},
    Deal { deal_id: u64 },
    OpenDeals {},
    FeePreview { address: String, amount: Uint128 },
    TradedVolume { address: String },
    Owner {},
    LotteryBank {},
    LifetimeTradedAmount {},
    LotteryParticipants {},
}

#[cw_serde]
pub struct ConfigResponse {
    pub owner: String,
    pub denom: String,
    pub min_value: Uint128,
    pub max_fee_rate: u64,
    pub common_fee_rate: u64,
    pub fish_fee_rate: u64,
    pub whale_fee_rate: u64,
    pub min_fee: u64,
    pub deal_time_limit: u64,
    pub decider: String,
    pub scheduler: String,
}

#[cw_serde]
pub struct DealResponse {
    pub deal_id: u64,
    pub deal: Deal,
}

#[cw_serde]
pub struct OpenDealsResponse {
    pub deal_ids: Vec<u64>,
}

#[cw_serde]
pub struct FeePreviewResponse {
    pub fee: Uint128,
}

#[cw_serde]
pub struct TradedVolumeResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct OwnerResponse {
    pub owner: String,
}

#[cw_serde]
pub struct LotteryBankResponse {
    pub bank: Uint128,
}

#[cw_serde]
pub struct LifetimeTradedAmountResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct LotteryParticipantsResponse {
    pub participants: Vec<Addr>,
}
