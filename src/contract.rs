#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;

use crate::error::ContractError;
use crate::fee::{self, FeeSchedule, NATIVE_UNIT};
use crate::lottery;
use crate::msg::{
    ConfigResponse, DealResponse, ExecuteMsg, FeePreviewResponse, InstantiateMsg,
    LifetimeTradedAmountResponse, LotteryBankResponse, LotteryParticipantsResponse,
    OpenDealsResponse, OwnerResponse, QueryMsg, SchedulerMsg, TradedVolumeResponse,
};
use crate::state::{
    add_traded_volume, allocate_deal_id, load_deal, put_deal, remove_deal, traded_volume, Config,
    Deal, CONFIG, DEALS, LAST_DEAL_ID, LIFETIME_TRADED, LOTTERY_BANK, OPEN_DEAL_IDS, PARTICIPANTS,
    TRADED_VOLUME,
};

use cw2::set_contract_version;

use cosmwasm_std::{
    to_json_binary, Addr, BankMsg, Binary, Coin, Decimal, Deps, DepsMut, Env, MessageInfo,
    QuerierWrapper, Response, StdResult, Uint128, WasmMsg,
};

const CONTRACT_NAME: &str = "crates.io:otc-escrow";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

// deployment defaults; SetFees can change all but the ceiling and boundaries
const DEFAULT_MIN_VALUE: u128 = 10 * NATIVE_UNIT;
const DEFAULT_DEAL_TIME_LIMIT: u64 = 90 * 60;
const MAX_FEE_RATE: u64 = 12;
const DEFAULT_COMMON_FEE_RATE: u64 = 12;
const DEFAULT_FISH_FEE_RATE: u64 = 7;
const DEFAULT_WHALE_FEE_RATE: u64 = 4;
const DEFAULT_MIN_FEE: u64 = 1;
const COMMON_BOUND: u128 = 999_999;
const WHALE_BOUND: u128 = 3_000_000;

// one twentieth of every settlement fee goes to the lottery bank
const BANK_DIVIDER: u128 = 20;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = msg
        .owner
        .map(|addr| deps.api.addr_validate(&addr))
        .transpose()?
        .unwrap_or(info.sender);

    let config = Config {
        owner,
        denom: msg.denom,
        min_value: msg.min_value.unwrap_or(Uint128::from(DEFAULT_MIN_VALUE)),
        max_fee_rate: MAX_FEE_RATE,
        common_fee_rate: DEFAULT_COMMON_FEE_RATE,
        fish_fee_rate: DEFAULT_FISH_FEE_RATE,
        whale_fee_rate: DEFAULT_WHALE_FEE_RATE,
        min_fee: DEFAULT_MIN_FEE,
        common_bound: COMMON_BOUND,
        whale_bound: WHALE_BOUND,
        deal_time_limit: msg.deal_time_limit.unwrap_or(DEFAULT_DEAL_TIME_LIMIT),
        decider: deps.api.addr_validate(&msg.decider)?,
        scheduler: deps.api.addr_validate(&msg.scheduler)?,
    };
    CONFIG.save(deps.storage, &config)?;

    LAST_DEAL_ID.save(deps.storage, &0)?;
    OPEN_DEAL_IDS.save(deps.storage, &vec![])?;
    LOTTERY_BANK.save(deps.storage, &Uint128::zero())?;
    LIFETIME_TRADED.save(deps.storage, &Uint128::zero())?;
    PARTICIPANTS.save(deps.storage, &vec![])?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("owner", config.owner)
        .add_attribute("denom", config.denom))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::OpenDeal {
            value,
            fee,
            seller_external,
            buyer,
            buyer_external,
            rate,
            external_value,
            external_fee,
        } => try_open_deal(
            deps,
            env,
            info,
            value,
            fee,
            seller_external,
            buyer,
            buyer_external,
            rate,
            external_value,
            external_fee,
        ),
        ExecuteMsg::SettleDeal { deal_id } => try_settle_deal(deps, env, info, deal_id),
        ExecuteMsg::RefundDeal { deal_id } => try_refund_deal(deps, env, info, deal_id),
        ExecuteMsg::ScheduleDraw {} => try_schedule_draw(deps, env, info),
        ExecuteMsg::Draw {} => try_draw(deps, env, info),
        ExecuteMsg::SetRandomnessDecider { address } => try_set_decider(deps, info, address),
        ExecuteMsg::SetFees {
            min_value,
            common_fee_rate,
            fish_fee_rate,
            whale_fee_rate,
            min_fee,
            deal_time_limit,
        } => try_set_fees(
            deps,
            info,
            min_value,
            common_fee_rate,
            fish_fee_rate,
            whale_fee_rate,
            min_fee,
            deal_time_limit,
        ),
        ExecuteMsg::Withdraw { amount } => try_withdraw(deps, info, amount),
    }
}

fn ensure_owner(config: &Config, info: &MessageInfo) -> Result<(), ContractError> {
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }
    Ok(())
}

// the contract-info query only succeeds for instantiated contracts
fn is_contract(querier: &QuerierWrapper, address: &Addr) -> bool {
    querier.query_wasm_contract_info(address).is_ok()
}

// settlement-rail addresses are 20-byte hex with a 0x prefix
fn validate_external_address(address: &str) -> Result<(), ContractError> {
    if address.len() != 42 || !address.starts_with("0x") {
        return Err(ContractError::InvalidSettlementAddress {
            address: address.to_string(),
        });
    }
    Ok(())
}

fn send_coin(denom: &str, to: &Addr, amount: Uint128) -> BankMsg {
    BankMsg::Send {
        to_address: to.to_string(),
        amount: vec![Coin {
            denom: denom.to_string(),
            amount,
        }],
    }
}

#[allow(clippy::too_many_arguments)]
fn try_open_deal(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    value: Uint128,
    fee: Uint128,
    seller_external: String,
    buyer: String,
    buyer_external: String,
    rate: Decimal,
    external_value: Uint128,
    external_fee: Uint128,
) -> Result<Response, ContractError> {
    if is_contract(&deps.querier, &info.sender) {
        return Err(ContractError::ContractsNotAllowed {});
    }

    let buyer = deps.api.addr_validate(&buyer)?;
    if is_contract(&deps.querier, &buyer) {
        return Err(ContractError::ContractsNotAllowed {});
    }
    if info.sender == buyer {
        return Err(ContractError::SameCounterparty {});
    }

    validate_external_address(&seller_external)?;
    validate_external_address(&buyer_external)?;
    if seller_external == buyer_external {
        return Err(ContractError::SameSettlementAddress {});
    }

    let config = CONFIG.load(deps.storage)?;

    if value < config.min_value {
        return Err(ContractError::ValueBelowMinimum {
            min: config.min_value,
        });
    }
    let min_native_fee = fee::native_min_fee(config.min_fee);
    if fee < min_native_fee {
        return Err(ContractError::FeeBelowMinimum { min: min_native_fee });
    }
    let min_external_fee = fee::external_min_fee(config.min_fee);
    if external_fee < min_external_fee {
        return Err(ContractError::FeeBelowMinimum {
            min: min_external_fee,
        });
    }

    if info.funds.len() != 1 {
        return Err(ContractError::InvalidFundsLength {});
    }
    if info.funds[0].denom != config.denom {
        return Err(ContractError::InvalidFundsDenom {});
    }
    if info.funds[0].amount != value + fee {
        return Err(ContractError::InvalidFundsAmount {});
    }

    let schedule = FeeSchedule::from_config(&config);
    let computed = schedule.native_fee(traded_volume(deps.storage, &info.sender)?, value);
    if computed != fee {
        return Err(ContractError::FeeMismatch {
            declared: fee,
            computed,
        });
    }

    // the external side is re-derived from the buyer's tier, rate-converted
    let buyer_fee = schedule.native_fee(traded_volume(deps.storage, &buyer)?, value);
    let computed_external = fee::external_fee(buyer_fee, rate, config.min_fee)?;
    if computed_external != external_fee {
        return Err(ContractError::ExternalFeeMismatch {
            declared: external_fee,
            computed: computed_external,
        });
    }

    let deal_id = allocate_deal_id(deps.storage)?;
    let deal = Deal {
        seller: info.sender,
        seller_external,
        buyer,
        buyer_external,
        value,
        fee,
        external_value,
        external_fee,
        rate,
        expires_at: env.block.time.plus_seconds(config.deal_time_limit),
    };
    put_deal(deps.storage, deal_id, &deal)?;

    Ok(Response::new()
        .add_attribute("action", "open_deal")
        .add_attribute("deal_id", deal_id.to_string())
        .add_attribute("seller", deal.seller)
        .add_attribute("buyer", deal.buyer)
        .add_attribute("value", value.to_string())
        .add_attribute("fee", fee.to_string())
        .add_attribute("external_value", external_value.to_string())
        .add_attribute("external_fee", external_fee.to_string())
        .add_attribute("rate", rate.to_string())
        .add_attribute("expires_at", deal.expires_at.to_string()))
}

/// The owner attests the off-chain payment happened. No expiry check: a late
/// settlement is still a settlement.
fn try_settle_deal(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    deal_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let deal = load_deal(deps.storage, deal_id)?;

    let bank_skim = Uint128::from(deal.fee.u128() / BANK_DIVIDER);

    LOTTERY_BANK.update(deps.storage, |bank| -> StdResult<_> {
        Ok(bank + bank_skim)
    })?;
    LIFETIME_TRADED.update(deps.storage, |total| -> StdResult<_> {
        Ok(total + deal.value)
    })?;

    add_traded_volume(deps.storage, &deal.seller, deal.value)?;
    add_traded_volume(deps.storage, &deal.buyer, deal.value)?;

    let mut participants = PARTICIPANTS.load(deps.storage)?;
    participants.push(deal.seller.clone());
    participants.push(deal.buyer.clone());
    PARTICIPANTS.save(deps.storage, &participants)?;

    remove_deal(deps.storage, deal_id)?;

    let to_buyer = send_coin(&config.denom, &deal.buyer, deal.value);
    let to_owner = send_coin(&config.denom, &config.owner, deal.fee - bank_skim);

    Ok(Response::new()
        .add_attribute("action", "settle_deal")
        .add_attribute("deal_id", deal_id.to_string())
        .add_attribute("buyer", deal.buyer)
        .add_attribute("value", deal.value.to_string())
        .add_attribute("fee", deal.fee.to_string())
        .add_attribute("bank_skim", bank_skim.to_string())
        .add_message(to_buyer)
        .add_message(to_owner))
}

/// Returns an expired deal's escrow to the seller, keeping the minimum fee as
/// a handling charge.
fn try_refund_deal(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    deal_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let deal = load_deal(deps.storage, deal_id)?;
    if deal.expires_at >= env.block.time {
        return Err(ContractError::DealNotExpired {});
    }

    let handling_charge = fee::native_min_fee(config.min_fee);
    let to_refund = (deal.value + deal.fee).checked_sub(handling_charge)?;

    remove_deal(deps.storage, deal_id)?;

    let to_seller = send_coin(&config.denom, &deal.seller, to_refund);
    let to_owner = send_coin(&config.denom, &config.owner, handling_charge);

    Ok(Response::new()
        .add_attribute("action", "refund_deal")
        .add_attribute("deal_id", deal_id.to_string())
        .add_attribute("seller", deal.seller)
        .add_attribute("refunded", to_refund.to_string())
        .add_message(to_seller)
        .add_message(to_owner))
}

/// Fire-and-forget request to the deferred-call service: invoke Draw on this
/// contract at a pseudo-random slot within the next 31. Nothing confirms the
/// window was honored; the bank just keeps accruing until a draw lands.
fn try_schedule_draw(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let execute_not_before = lottery::draw_time(&env);
    let callback = WasmMsg::Execute {
        contract_addr: config.scheduler.to_string(),
        msg: to_json_binary(&SchedulerMsg::ScheduleCallback {
            msg: to_json_binary(&ExecuteMsg::Draw {})?,
            execute_not_before,
        })?,
        funds: vec![],
    };

    Ok(Response::new()
        .add_attribute("action", "schedule_draw")
        .add_attribute("execute_not_before", execute_not_before.to_string())
        .add_message(callback))
}

fn try_draw(deps: DepsMut, _env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    // normally reached via the scheduled callback, but the owner can trigger
    // a draw by hand as well
    if info.sender != config.owner && info.sender != config.scheduler {
        return Err(ContractError::Unauthorized {});
    }

    let participants = PARTICIPANTS.load(deps.storage)?;
    let prize = LOTTERY_BANK.load(deps.storage)?;
    if prize.is_zero() {
        return Err(ContractError::EmptyLotteryBank {});
    }

    let balance = deps
        .querier
        .query_balance(&config.decider, &config.denom)?
        .amount;
    let seed = lottery::winner_seed(balance);
    let (winner_index, winner) = lottery::pick_winner(&participants, &config.owner, seed)?;

    let payout = send_coin(&config.denom, winner, prize);
    LOTTERY_BANK.save(deps.storage, &Uint128::zero())?;
    // the participant list is kept: repeated participation keeps weighting
    // future draws

    Ok(Response::new()
        .add_attribute("action", "draw")
        .add_attribute("winner", winner.to_string())
        .add_attribute("winner_index", winner_index.to_string())
        .add_attribute("prize", prize.to_string())
        .add_message(payout))
}

fn try_set_decider(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    config.decider = deps.api.addr_validate(&address)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "set_randomness_decider")
        .add_attribute("decider", config.decider))
}

#[allow(clippy::too_many_arguments)]
fn try_set_fees(
    deps: DepsMut,
    info: MessageInfo,
    min_value: Uint128,
    common_fee_rate: u64,
    fish_fee_rate: u64,
    whale_fee_rate: u64,
    min_fee: u64,
    deal_time_limit: u64,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    for rate in [common_fee_rate, fish_fee_rate, whale_fee_rate] {
        if rate > config.max_fee_rate {
            return Err(ContractError::FeeRateTooHigh {
                rate,
                max: config.max_fee_rate,
            });
        }
    }

    config.min_value = min_value;
    config.common_fee_rate = common_fee_rate;
    config.fish_fee_rate = fish_fee_rate;
    config.whale_fee_rate = whale_fee_rate;
    config.min_fee = min_fee;
    config.deal_time_limit = deal_time_limit;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "set_fees")
        .add_attribute("min_value", min_value.to_string())
        .add_attribute("common_fee_rate", common_fee_rate.to_string())
        .add_attribute("fish_fee_rate", fish_fee_rate.to_string())
        .add_attribute("whale_fee_rate", whale_fee_rate.to_string())
        .add_attribute("min_fee", min_fee.to_string())
        .add_attribute("deal_time_limit", deal_time_limit.to_string()))
}

/// Sweeps accumulated fees to the owner, but only once every deal is closed
/// and the lottery has been paid out.
fn try_withdraw(deps: DepsMut, info: MessageInfo, amount: Uint128) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    if !OPEN_DEAL_IDS.load(deps.storage)?.is_empty() {
        return Err(ContractError::OpenDealsPending {});
    }
    if !LOTTERY_BANK.load(deps.storage)?.is_zero() {
        return Err(ContractError::LotteryBankNotEmpty {});
    }

    let to_owner = send_coin(&config.denom, &config.owner, amount);

    Ok(Response::new()
        .add_attribute("action", "withdraw")
        .add_attribute("amount", amount.to_string())
        .add_message(to_owner))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Deal { deal_id } => to_json_binary(&query_deal(deps, deal_id)?),
        QueryMsg::OpenDeals {} => to_json_binary(&query_open_deals(deps)?),
        QueryMsg::FeePreview { address, amount } => {
            to_json_binary(&query_fee_preview(deps, address, amount)?)
        }
        QueryMsg::TradedVolume { address } => {
            to_json_binary(&query_traded_volume(deps, address)?)
        }
        QueryMsg::Owner {} => to_json_binary(&OwnerResponse {
            owner: CONFIG.load(deps.storage)?.owner.to_string(),
        }),
        QueryMsg::LotteryBank {} => to_json_binary(&LotteryBankResponse {
            bank: LOTTERY_BANK.load(deps.storage)?,
        }),
        QueryMsg::LifetimeTradedAmount {} => to_json_binary(&LifetimeTradedAmountResponse {
            amount: LIFETIME_TRADED.load(deps.storage)?,
        }),
        QueryMsg::LotteryParticipants {} => to_json_binary(&LotteryParticipantsResponse {
            participants: PARTICIPANTS.load(deps.storage)?,
        }),
    }
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        owner: config.owner.to_string(),
        denom: config.denom,
        min_value: config.min_value,
        max_fee_rate: config.max_fee_rate,
        common_fee_rate: config.common_fee_rate,
        fish_fee_rate: config.fish_fee_rate,
        whale_fee_rate: config.whale_fee_rate,
        min_fee: config.min_fee,
        deal_time_limit: config.deal_time_limit,
        decider: config.decider.to_string(),
        scheduler: config.scheduler.to_string(),
    })
}

fn query_deal(deps: Deps, deal_id: u64) -> StdResult<DealResponse> {
    let deal = DEALS.load(deps.storage, deal_id)?;
    Ok(DealResponse { deal_id, deal })
}

fn query_open_deals(deps: Deps) -> StdResult<OpenDealsResponse> {
    Ok(OpenDealsResponse {
        deal_ids: OPEN_DEAL_IDS.load(deps.storage)?,
    })
}

fn query_fee_preview(deps: Deps, address: String, amount: Uint128) -> StdResult<FeePreviewResponse> {
    let config = CONFIG.load(deps.storage)?;
    let address = deps.api.addr_validate(&address)?;
    let volume = TRADED_VOLUME
        .may_load(deps.storage, &address)?
        .unwrap_or_default();
    Ok(FeePreviewResponse {
        fee: FeeSchedule::from_config(&config).native_fee(volume, amount),
    })
}

fn query_traded_volume(deps: Deps, address: String) -> StdResult<TradedVolumeResponse> {
    let address = deps.api.addr_validate(&address)?;
    Ok(TradedVolumeResponse {
        amount: TRADED_VOLUME
            .may_load(deps.storage, &address)?
            .unwrap_or_default(),
    })
}
