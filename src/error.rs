use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("Standard error: {0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    OverflowError(#[from] OverflowError),

    #[error("Unauthorized")]
    Unauthorized {},
    #[error("Contract accounts may not take part in deals")]
    ContractsNotAllowed {},
    #[error("Must send exactly one coin")]
    InvalidFundsLength {},
    #[error("Invalid funds denom")]
    InvalidFundsDenom {},
    #[error("Attached funds must equal value plus fee")]
    InvalidFundsAmount {},
    #[error("{address} is not a valid settlement address")]
    InvalidSettlementAddress { address: String },
    #[error("Seller and buyer settlement addresses must be different")]
    SameSettlementAddress {},
    #[error("Seller and buyer must be different accounts")]
    SameCounterparty {},
    #[error("Deal value must be at least {min}")]
    ValueBelowMinimum { min: Uint128 },
    #[error("Fee must be at least {min}")]
    FeeBelowMinimum { min: Uint128 },
    #[error("Declared fee {declared} does not match computed fee {computed}")]
    FeeMismatch { declared: Uint128, computed: Uint128 },
    #[error("Declared external fee {declared} does not match computed fee {computed}")]
    ExternalFeeMismatch { declared: Uint128, computed: Uint128 },
    #[error("Deal #{id} already exists")]
    DealAlreadyExists { id: u64 },
    #[error("Deal not found")]
    DealNotFound {},
    #[error("Deal not expired")]
    DealNotExpired {},
    #[error("Deal #{id} is not in the open-deal index")]
    NotInOpenIndex { id: u64 },
    #[error("No lottery participants")]
    NoParticipants {},
    #[error("No eligible lottery winner")]
    NoEligibleWinner {},
    #[error("Lottery bank is empty")]
    EmptyLotteryBank {},
    #[error("Open deals pending")]
    OpenDealsPending {},
    #[error("Lottery bank must be drained first")]
    LotteryBankNotEmpty {},
    #[error("Fee rate {rate} exceeds the maximum of {max}")]
    FeeRateTooHigh { rate: u64, max: u64 },
}
