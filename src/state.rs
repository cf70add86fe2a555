use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Storage, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

use crate::error::ContractError;

#[cw_serde]
pub struct Deal {
    pub seller: Addr,
    pub seller_external: String,
    pub buyer: Addr,
    pub buyer_external: String,
    pub value: Uint128,
    pub fee: Uint128,
    pub external_value: Uint128,
    pub external_fee: Uint128,
    /// external units per native unit
    pub rate: Decimal,
    pub expires_at: Timestamp,
}

#[cw_serde]
pub struct Config {
    pub owner: Addr,
    pub denom: String,
    /// smallest escrowable deal value, in native base units
    pub min_value: Uint128,
    /// immutable ceiling for the three rates below, per mille
    pub max_fee_rate: u64,
    pub common_fee_rate: u64,
    pub fish_fee_rate: u64,
    pub whale_fee_rate: u64,
    /// floor for every charged fee, in whole units (scaled per denomination at use sites)
    pub min_fee: u64,
    /// tier boundaries in fee units, common < whale
    pub common_bound: u128,
    pub whale_bound: u128,
    /// seconds from open to expiry
    pub deal_time_limit: u64,
    /// address whose balance seeds the lottery draw
    pub decider: Addr,
    /// deferred-call service that re-invokes Draw
    pub scheduler: Addr,
}

pub const CONFIG: Item<Config> = Item::new("config");

// increments on every deal open, ids are never reused
pub const LAST_DEAL_ID: Item<u64> = Item::new("last_deal_id");

// maps deal_id => deal
pub const DEALS: Map<u64, Deal> = Map::new("deals");

// ids with no terminal transition yet, in open order
pub const OPEN_DEAL_IDS: Item<Vec<u64>> = Item::new("open_deal_ids");

// cumulative settled native amount per address, created lazily, never deleted
pub const TRADED_VOLUME: Map<&Addr, Uint128> = Map::new("traded_volume");

pub const LIFETIME_TRADED: Item<Uint128> = Item::new("lifetime_traded");

pub const LOTTERY_BANK: Item<Uint128> = Item::new("lottery_bank");

// append-only, both counterparties per settlement, duplicates allowed
pub const PARTICIPANTS: Item<Vec<Addr>> = Item::new("lottery_participants");

pub fn allocate_deal_id(storage: &mut dyn Storage) -> Result<u64, ContractError> {
    let id = LAST_DEAL_ID.load(storage)? + 1;
    LAST_DEAL_ID.save(storage, &id)?;
    Ok(id)
}

pub fn put_deal(storage: &mut dyn Storage, id: u64, deal: &Deal) -> Result<(), ContractError> {
    // ids are allocated monotonically, so this can only fire on a registry bug
    if DEALS.has(storage, id) {
        return Err(ContractError::DealAlreadyExists { id });
    }
    DEALS.save(storage, id, deal)?;

    let mut open_ids = OPEN_DEAL_IDS.load(storage)?;
    open_ids.push(id);
    OPEN_DEAL_IDS.save(storage, &open_ids)?;
    Ok(())
}

pub fn load_deal(storage: &dyn Storage, id: u64) -> Result<Deal, ContractError> {
    DEALS
        .may_load(storage, id)?
        .ok_or(ContractError::DealNotFound {})
}

/// Deletes the record and drops the id from the open-deal index. Called exactly
/// once per deal, by either settle or refund.
pub fn remove_deal(storage: &mut dyn Storage, id: u64) -> Result<(), ContractError> {
    DEALS.remove(storage, id);

    let mut open_ids = OPEN_DEAL_IDS.load(storage)?;
    let pos = open_ids
        .iter()
        .position(|&open| open == id)
        .ok_or(ContractError::NotInOpenIndex { id })?;
    open_ids.remove(pos);
    OPEN_DEAL_IDS.save(storage, &open_ids)?;
    Ok(())
}

pub fn traded_volume(storage: &dyn Storage, address: &Addr) -> Result<Uint128, ContractError> {
    Ok(TRADED_VOLUME
        .may_load(storage, address)?
        .unwrap_or_default())
}

pub fn add_traded_volume(
    storage: &mut dyn Storage,
    address: &Addr,
    value: Uint128,
) -> Result<(), ContractError> {
    let prev = traded_volume(storage, address)?;
    TRADED_VOLUME.save(storage, address, &(prev + value))?;
    Ok(())
}
