pub mod contract;
mod error;
pub mod fee;
pub mod lottery;
pub mod msg;
pub mod state;

pub use crate::error::ContractError;
